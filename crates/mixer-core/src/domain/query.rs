//! 환율 캐시 조회 알고리즘.
//!
//! `RateStore`를 읽기만 합니다:
//! - 단일 시점 floor 조회 (`find_rate_on_day`)
//! - 반개구간 기간 조회 (`query_rates_over_time`)
//! - 다중 통화쌍 조합 (`compose_rates`, `latest_rates`)

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error};

use crate::domain::store::RateStore;
use crate::error::{MixerError, MixerResult};
use crate::types::{CurrencyPair, RateObservation, RateQuote};

/// 기간 조회 기본 시작 시점 (현재로부터 일 수).
///
/// 업스트림이 제공할 수 있는 최대 이력 길이에 맞춘 값입니다.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 4900;

/// 날짜 → base → target → 환율.
pub type ComposedRates = BTreeMap<DateTime<Utc>, BTreeMap<String, BTreeMap<String, f64>>>;

/// base → target → 환율.
pub type LatestRates = BTreeMap<String, BTreeMap<String, f64>>;

/// 기간 조회 범위.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl QueryWindow {
    /// 생략된 경계를 기본값으로 채웁니다.
    ///
    /// - `to` 기본값: `now`
    /// - `from` 기본값: `now - 4900일`
    pub fn with_defaults(
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            from: from.unwrap_or_else(|| now - Duration::days(DEFAULT_LOOKBACK_DAYS)),
            to: to.unwrap_or(now),
        }
    }
}

/// 읽기 전용 조회 엔진.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    store: Arc<RateStore>,
}

impl QueryEngine {
    pub fn new(store: Arc<RateStore>) -> Self {
        Self { store }
    }

    /// 조회 대상 저장소.
    pub fn store(&self) -> &Arc<RateStore> {
        &self.store
    }

    /// `day` 이하의 가장 최근 환율을 조회합니다.
    ///
    /// 데이터가 없거나 `day`가 모든 관측값보다 앞서면 `RateQuote::not_found()`를 반환합니다.
    /// 에러를 반환하지 않습니다.
    pub fn find_rate_on_day(&self, pair: &CurrencyPair, day: DateTime<Utc>) -> RateQuote {
        let Some(series) = self.store.get(pair) else {
            debug!(pair = %pair, "캐시에 없는 통화쌍");
            return RateQuote::not_found();
        };

        match series.floor(day) {
            Some(observation) => RateQuote::found(observation, series.meta()),
            None => {
                debug!(pair = %pair, day = %day, "Couldn't find close key");
                RateQuote::not_found()
            }
        }
    }

    /// 기간 내 환율 시계열을 조회합니다.
    ///
    /// `floor(from)` 이상 `floor(to)` 미만의 관측값을 반환합니다 (반개구간).
    ///
    /// # Errors
    ///
    /// - `to < from`이면 [`MixerError::InvalidRange`]
    /// - `floor(to) < floor(from)`이면 [`MixerError::InvariantViolation`] (도달 불가능해야 함)
    pub fn query_rates_over_time(
        &self,
        pair: &CurrencyPair,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> MixerResult<Vec<RateObservation>> {
        if to < from {
            return Err(MixerError::InvalidRange { from, to });
        }

        let Some(series) = self.store.get(pair) else {
            return Ok(Vec::new());
        };

        let (Some(floor_from), Some(floor_to)) = (series.floor(from), series.floor(to)) else {
            return Ok(Vec::new());
        };

        if floor_to.timestamp < floor_from.timestamp {
            error!(
                pair = %pair,
                floor_from = %floor_from.timestamp,
                floor_to = %floor_to.timestamp,
                "floor 단조성 위반"
            );
            return Err(MixerError::InvariantViolation(format!(
                "Invalid time state, trying to index from {} to {}",
                floor_from.timestamp, floor_to.timestamp
            )));
        }

        Ok(series
            .range(floor_from.timestamp, floor_to.timestamp)
            .collect())
    }

    /// 여러 통화쌍의 기간 조회 결과를 날짜별로 조합합니다.
    ///
    /// 각 (base, target) 관측값 (t, r)마다 `rates[t][base][target] = r`과
    /// `rates[t][target][base] = 1/r`을 함께 기록합니다.
    pub fn compose_rates(
        &self,
        instruments: &[CurrencyPair],
        window: QueryWindow,
    ) -> MixerResult<ComposedRates> {
        let mut composed = ComposedRates::new();

        for pair in instruments {
            let observations = self.query_rates_over_time(pair, window.from, window.to)?;

            for obs in observations {
                let by_base = composed.entry(obs.timestamp).or_default();
                by_base
                    .entry(pair.base.to_string())
                    .or_default()
                    .insert(pair.target.to_string(), obs.rate);
                by_base
                    .entry(pair.target.to_string())
                    .or_default()
                    .insert(pair.base.to_string(), 1.0 / obs.rate);
            }
        }

        Ok(composed)
    }

    /// 여러 통화쌍의 `at` 시점 환율을 base → target 맵으로 반환합니다.
    ///
    /// 데이터가 없는 쌍은 건너뜁니다.
    pub fn latest_rates(&self, instruments: &[CurrencyPair], at: DateTime<Utc>) -> LatestRates {
        let mut latest = LatestRates::new();

        for pair in instruments {
            if let Some(rate) = self.find_rate_on_day(pair, at).rate {
                latest
                    .entry(pair.base.to_string())
                    .or_default()
                    .insert(pair.target.to_string(), rate);
            }
        }

        latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RateMeta, RateSeries};
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    fn pair(s: &str) -> CurrencyPair {
        s.parse().unwrap()
    }

    fn engine_with(pair_str: &str, points: &[(i64, f64)]) -> QueryEngine {
        let store = Arc::new(RateStore::new());
        store.put(
            pair(pair_str),
            RateSeries::from_observations(
                points
                    .iter()
                    .map(|(d, r)| RateObservation::new(t0() + Duration::days(*d), *r)),
                RateMeta::new(t0(), "cached-oanda"),
            ),
        );
        QueryEngine::new(store)
    }

    #[test]
    fn test_find_rate_on_day_absent_pair() {
        let engine = QueryEngine::new(Arc::new(RateStore::new()));
        let quote = engine.find_rate_on_day(&pair("EUR/GBP"), t0());
        assert!(quote.is_not_found());
    }

    #[test]
    fn test_find_rate_on_day_floor() {
        let engine = engine_with("EUR/GBP", &[(-10, 0.84), (0, 0.85), (5, 0.86)]);

        let exact = engine.find_rate_on_day(&pair("EUR/GBP"), t0());
        assert_eq!(exact.rate, Some(0.85));
        assert_eq!(exact.meta.date_of_rate, Some(t0()));

        let between = engine.find_rate_on_day(&pair("EUR/GBP"), t0() + Duration::days(3));
        assert_eq!(between.rate, Some(0.85));

        let after = engine.find_rate_on_day(&pair("EUR/GBP"), t0() + Duration::days(400));
        assert_eq!(after.rate, Some(0.86));
        assert_eq!(after.meta.generated_by, "cached-oanda");
    }

    #[test]
    fn test_find_rate_on_day_before_all_data() {
        let engine = engine_with("EUR/GBP", &[(0, 0.85)]);
        let quote = engine.find_rate_on_day(&pair("EUR/GBP"), t0() - Duration::seconds(1));
        assert!(quote.is_not_found());
    }

    #[test]
    fn test_find_rate_on_day_reciprocal_orientation() {
        let engine = engine_with("EUR/GBP", &[(0, 0.8)]);
        let quote = engine.find_rate_on_day(&pair("GBP/EUR"), t0());
        assert!((quote.rate.unwrap() - 1.25).abs() < 1e-12);
        assert_eq!(quote.meta.generated_by, "cached-derived-from-oanda");
    }

    #[test]
    fn test_query_rejects_backwards_range() {
        let engine = engine_with("EUR/GBP", &[(0, 0.85)]);
        let err = engine
            .query_rates_over_time(&pair("EUR/GBP"), t0(), t0() - Duration::days(1))
            .unwrap_err();
        assert!(matches!(err, MixerError::InvalidRange { .. }));
    }

    #[test]
    fn test_query_absent_pair_is_empty() {
        let engine = engine_with("EUR/GBP", &[(0, 0.85)]);
        let got = engine
            .query_rates_over_time(&pair("EUR/AUD"), t0(), t0() + Duration::days(1))
            .unwrap();
        assert!(got.is_empty());
    }

    #[test]
    fn test_query_excludes_floor_of_upper_bound() {
        let engine = engine_with("EUR/GBP", &[(-10, 0.84), (0, 0.85)]);
        let got = engine
            .query_rates_over_time(&pair("EUR/GBP"), t0() - Duration::days(10), t0())
            .unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].timestamp, t0() - Duration::days(10));
        assert_eq!(got[0].rate, 0.84);
    }

    #[test]
    fn test_query_includes_floor_of_lower_bound() {
        let engine = engine_with("EUR/GBP", &[(0, 0.85), (1, 0.86), (2, 0.87), (3, 0.88)]);
        // from은 day 0과 1 사이 → floor(from) = day 0
        let got = engine
            .query_rates_over_time(
                &pair("EUR/GBP"),
                t0() + Duration::hours(12),
                t0() + Duration::days(2) + Duration::hours(12),
            )
            .unwrap();
        let days: Vec<_> = got.iter().map(|o| (o.timestamp - t0()).num_days()).collect();
        assert_eq!(days, vec![0, 1]);
    }

    #[test]
    fn test_query_from_before_all_data_is_empty() {
        let engine = engine_with("EUR/GBP", &[(0, 0.85), (1, 0.86)]);
        let got = engine
            .query_rates_over_time(
                &pair("EUR/GBP"),
                t0() - Duration::days(1),
                t0() + Duration::days(5),
            )
            .unwrap();
        assert!(got.is_empty());
    }

    #[test]
    fn test_query_same_floor_is_empty() {
        let engine = engine_with("EUR/GBP", &[(0, 0.85), (10, 0.86)]);
        let got = engine
            .query_rates_over_time(
                &pair("EUR/GBP"),
                t0() + Duration::days(1),
                t0() + Duration::days(2),
            )
            .unwrap();
        assert!(got.is_empty());
    }

    #[test]
    fn test_compose_rates_reciprocates_swapped_direction() {
        let store = Arc::new(RateStore::new());
        let meta = RateMeta::new(t0(), "cached-oanda");
        store.put(
            pair("USD/NZD"),
            RateSeries::from_observations(
                [
                    RateObservation::new(t0(), 1.1840905592459712),
                    RateObservation::new(t0() + Duration::days(1), 1.19),
                ],
                meta.clone(),
            ),
        );
        store.put(
            pair("NZD/HKD"),
            RateSeries::from_observations(
                [
                    RateObservation::new(t0(), 6.57779),
                    RateObservation::new(t0() + Duration::days(1), 6.58),
                ],
                meta,
            ),
        );
        let engine = QueryEngine::new(store);

        let composed = engine
            .compose_rates(
                &[pair("USD/NZD"), pair("NZD/HKD")],
                QueryWindow {
                    from: t0(),
                    to: t0() + Duration::days(1),
                },
            )
            .unwrap();

        assert_eq!(composed.len(), 1);
        let day = &composed[&t0()];
        assert_eq!(day["USD"]["NZD"], 1.1840905592459712);
        assert!((day["NZD"]["USD"] - 0.84453).abs() < 1e-5);
        assert_eq!(day["NZD"]["HKD"], 6.57779);
        assert!((day["HKD"]["NZD"] - 1.0 / 6.57779).abs() < 1e-12);
        assert_ne!(day["NZD"]["USD"], day["USD"]["NZD"]);
    }

    #[test]
    fn test_compose_rates_propagates_invalid_range() {
        let engine = engine_with("EUR/GBP", &[(0, 0.85)]);
        let result = engine.compose_rates(
            &[pair("EUR/GBP")],
            QueryWindow {
                from: t0(),
                to: t0() - Duration::days(1),
            },
        );
        assert!(matches!(result, Err(MixerError::InvalidRange { .. })));
    }

    #[test]
    fn test_latest_rates_skips_missing_pairs() {
        let engine = engine_with("EUR/GBP", &[(0, 0.85)]);
        let latest = engine.latest_rates(&[pair("EUR/GBP"), pair("EUR/AUD")], t0());
        assert_eq!(latest.len(), 1);
        assert_eq!(latest["EUR"]["GBP"], 0.85);
    }

    #[test]
    fn test_query_window_defaults() {
        let now = t0();
        let window = QueryWindow::with_defaults(None, None, now);
        assert_eq!(window.to, now);
        assert_eq!(window.from, now - Duration::days(4900));

        let explicit = QueryWindow::with_defaults(Some(now - Duration::days(1)), None, now);
        assert_eq!(explicit.from, now - Duration::days(1));
    }
}
