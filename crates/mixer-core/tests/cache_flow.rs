//! 저장소와 조회 엔진을 함께 사용하는 통합 테스트.

use chrono::{DateTime, Duration, TimeZone, Utc};
use mixer_core::{
    CurrencyPair, MixerError, PairUniverse, ProviderHistory, QueryEngine, QueryWindow,
    RateObservation, RateStore,
};
use std::sync::Arc;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 22, 0, 0).unwrap()
}

fn history(points: &[(i64, f64)]) -> ProviderHistory {
    ProviderHistory {
        observations: points
            .iter()
            .map(|(d, r)| RateObservation::new(t0() + Duration::days(*d), *r))
            .collect(),
        generated_at: t0(),
        generated_by: "oanda".to_string(),
    }
}

#[test]
fn test_every_universe_pair_is_queryable_in_both_directions() {
    let universe = PairUniverse::default();
    let store = Arc::new(RateStore::new());

    for (i, pair) in universe.pairs().iter().enumerate() {
        store.put(*pair, history(&[(0, 1.0 + i as f64)]).into_series());
    }
    let engine = QueryEngine::new(Arc::clone(&store));

    assert_eq!(store.len(), universe.pairs().len() * 2);
    for pair in universe.pairs() {
        let forward = engine.find_rate_on_day(pair, t0()).rate.unwrap();
        let inverse = engine.find_rate_on_day(&pair.swap(), t0()).rate.unwrap();
        assert!((forward * inverse - 1.0).abs() < 1e-12);
    }
}

#[test]
fn test_failed_refresh_keeps_previous_series() {
    let store = Arc::new(RateStore::new());
    let engine = QueryEngine::new(Arc::clone(&store));
    let eur_gbp: CurrencyPair = "EUR/GBP".parse().unwrap();
    let eur_aud: CurrencyPair = "EUR/AUD".parse().unwrap();

    store.put(eur_gbp, history(&[(0, 0.85)]).into_series());
    store.put(eur_aud, history(&[(0, 1.60)]).into_series());

    // EUR/AUD 조회가 실패한 주기: EUR/GBP만 교체
    store.put(eur_gbp, history(&[(0, 0.85), (1, 0.86)]).into_series());

    let day1 = t0() + Duration::days(1);
    assert_eq!(engine.find_rate_on_day(&eur_gbp, day1).rate, Some(0.86));
    assert_eq!(engine.find_rate_on_day(&eur_aud, day1).rate, Some(1.60));
}

#[test]
fn test_query_and_compose_over_cached_history() {
    let store = Arc::new(RateStore::new());
    let usd_nzd: CurrencyPair = "USD/NZD".parse().unwrap();
    store.put(
        usd_nzd,
        history(&[(-10, 1.18), (-5, 1.19), (0, 1.20)]).into_series(),
    );
    let engine = QueryEngine::new(store);

    let observations = engine
        .query_rates_over_time(&usd_nzd, t0() - Duration::days(10), t0())
        .unwrap();
    assert_eq!(observations.len(), 2);

    let composed = engine
        .compose_rates(
            &[usd_nzd.swap()],
            QueryWindow::with_defaults(None, Some(t0() + Duration::days(1)), t0()),
        )
        .unwrap();
    // 기본 시작 시점은 모든 데이터보다 앞서므로 결과 없음
    assert!(composed.is_empty());

    let err = engine
        .query_rates_over_time(&usd_nzd, t0(), t0() - Duration::days(1))
        .unwrap_err();
    assert!(matches!(err, MixerError::InvalidRange { .. }));
}
