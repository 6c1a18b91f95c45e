//! 갱신 주기와 조회 엔진 통합 테스트.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use mixer_collector::{RefreshOutcome, Refresher};
use mixer_core::{
    CurrencyPair, PairUniverse, ProviderError, ProviderHistory, ProviderQuote, QueryEngine,
    RateObservation, RateProvider, RateStore, RefreshConfig,
};
use std::sync::Arc;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 22, 0, 0).unwrap()
}

/// 모든 통화쌍에 대해 10일치 일봉을 반환합니다. AUD가 포함된 쌍은 실패합니다.
struct DailyProvider;

#[async_trait]
impl RateProvider for DailyProvider {
    fn name(&self) -> &str {
        "daily"
    }

    async fn fetch_current(&self, pair: &CurrencyPair) -> Result<ProviderQuote, ProviderError> {
        Err(ProviderError::EmptyPayload(pair.to_string()))
    }

    async fn fetch_history(&self, pair: &CurrencyPair) -> Result<ProviderHistory, ProviderError> {
        if pair.base.as_str() == "AUD" || pair.target.as_str() == "AUD" {
            return Err(ProviderError::Network("connection reset".to_string()));
        }
        Ok(ProviderHistory {
            observations: (0..10)
                .map(|d| RateObservation::new(t0() + Duration::days(d), 1.0 + d as f64 / 100.0))
                .collect(),
            generated_at: t0(),
            generated_by: "daily".to_string(),
        })
    }
}

#[tokio::test]
async fn test_refresh_then_query() {
    let universe = Arc::new(PairUniverse::from_codes(&["EUR", "GBP", "AUD", "USD"]).unwrap());
    let store = Arc::new(RateStore::new());
    let refresher = Refresher::new(
        Arc::clone(&universe),
        Arc::clone(&store),
        Arc::new(DailyProvider),
        RefreshConfig {
            max_concurrent_fetches: 4,
            ..Default::default()
        },
    );

    let RefreshOutcome::Completed(stats) = refresher.refresh_all().await else {
        panic!("expected completed cycle");
    };
    assert_eq!(stats.total, 6);
    assert_eq!(stats.errors, 3);
    assert_eq!(stats.success, 3);
    assert_eq!(stats.observations, 30);

    let engine = QueryEngine::new(store);
    let usd_eur: CurrencyPair = "USD/EUR".parse().unwrap();

    let quote = engine.find_rate_on_day(&usd_eur, t0() + Duration::days(3) + Duration::hours(5));
    assert!((quote.rate.unwrap() - 1.0 / 1.03).abs() < 1e-12);
    assert_eq!(quote.meta.generated_by, "cached-derived-from-daily");
    assert_eq!(quote.meta.date_of_rate, Some(t0() + Duration::days(3)));

    let range = engine
        .query_rates_over_time(&usd_eur, t0(), t0() + Duration::days(4))
        .unwrap();
    assert_eq!(range.len(), 4);

    let missing = engine.find_rate_on_day(&"EUR/AUD".parse().unwrap(), t0());
    assert!(missing.is_not_found());
}
