//! 통화쌍별 환율 시계열 저장소.
//!
//! # 불변식
//!
//! - 시계열이 저장된 모든 쌍 P에 대해 `swap(P)`도 저장되어 있습니다.
//! - P의 관측값 (t, r)마다 `swap(P)`에 (t, 1/r)이 있으며, 출처는
//!   `cached-derived-from-<source>`입니다.
//! - 쓰기는 한 쌍의 시계열 전체를 교체하며, 정방향과 역방향이 하나의 쓰기 잠금 안에서
//!   함께 반영됩니다. 읽기는 한쪽만 갱신된 상태를 관찰할 수 없습니다.
//!
//! 읽기는 동기식이며 `Arc` 복제 외에는 할당하지 않습니다.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error};

use crate::types::{CurrencyPair, RateSeries};

/// 저장소 상태 요약.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// 저장된 쌍 수 (양방향 포함)
    pub pairs: usize,
    /// 전체 관측값 수
    pub observations: usize,
    /// 가장 최근 데이터 생성 시각
    pub newest_generated_at: Option<DateTime<Utc>>,
}

/// 동시성 안전 환율 캐시.
#[derive(Debug, Default)]
pub struct RateStore {
    inner: RwLock<HashMap<CurrencyPair, Arc<RateSeries>>>,
}

impl RateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `pair`의 시계열과 `swap(pair)`의 역수 시계열을 함께 저장합니다.
    ///
    /// 역수 계산은 잠금 밖에서 끝내고, 두 항목은 하나의 쓰기 잠금 안에서 교체됩니다.
    pub fn put(&self, pair: CurrencyPair, series: RateSeries) {
        let reciprocal = Arc::new(series.reciprocal());
        let canonical = Arc::new(series);
        let observations = canonical.len();

        {
            let mut map = self.write();
            map.insert(pair, canonical);
            map.insert(pair.swap(), reciprocal);
        }

        debug!(pair = %pair, observations, "환율 시계열 저장");
    }

    /// 요청한 방향의 시계열. 저장된 적이 없으면 `None`.
    pub fn get(&self, pair: &CurrencyPair) -> Option<Arc<RateSeries>> {
        self.read().get(pair).cloned()
    }

    /// 저장된 쌍 수 (양방향 포함).
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// 저장된 쌍 목록 스냅샷.
    pub fn pairs(&self) -> Vec<CurrencyPair> {
        self.read().keys().copied().collect()
    }

    /// 상태 요약.
    pub fn snapshot_stats(&self) -> StoreStats {
        let map = self.read();
        StoreStats {
            pairs: map.len(),
            observations: map.values().map(|s| s.len()).sum(),
            newest_generated_at: map.values().map(|s| s.meta().generated_at).max(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<CurrencyPair, Arc<RateSeries>>> {
        match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("RateStore RwLock poisoned (read), recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<CurrencyPair, Arc<RateSeries>>> {
        match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("RateStore RwLock poisoned (write), recovering");
                poisoned.into_inner()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RateMeta, RateObservation};
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;
    use std::thread;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2011, 9, 3, 21, 0, 0).unwrap()
    }

    fn pair(s: &str) -> CurrencyPair {
        s.parse().unwrap()
    }

    #[test]
    fn test_get_absent_pair() {
        let store = RateStore::new();
        assert!(store.get(&pair("EUR/GBP")).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_put_stores_reciprocal() {
        let store = RateStore::new();
        let series = RateSeries::single(
            t0(),
            1.1840905592459712,
            RateMeta::new(t0(), "cached-oanda"),
        );
        store.put(pair("USD/NZD"), series);

        let forward = store.get(&pair("USD/NZD")).unwrap();
        assert_eq!(forward.get(&t0()), Some(1.1840905592459712));
        assert_eq!(forward.meta().generated_by, "cached-oanda");

        let inverse = store.get(&pair("NZD/USD")).unwrap();
        let rate = inverse.get(&t0()).unwrap();
        assert!((rate - 0.84453).abs() < 1e-5);
        assert_eq!(inverse.meta().generated_by, "cached-derived-from-oanda");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_put_replaces_whole_series() {
        let store = RateStore::new();
        let meta = RateMeta::new(t0(), "cached-oanda");
        store.put(
            pair("EUR/GBP"),
            RateSeries::from_observations(
                [
                    RateObservation::new(t0() - Duration::days(1), 0.85),
                    RateObservation::new(t0(), 0.86),
                ],
                meta.clone(),
            ),
        );
        store.put(
            pair("EUR/GBP"),
            RateSeries::single(t0() + Duration::days(1), 0.87, meta),
        );

        let forward = store.get(&pair("EUR/GBP")).unwrap();
        assert_eq!(forward.len(), 1);
        assert_eq!(forward.get(&t0()), None);
        assert_eq!(store.get(&pair("GBP/EUR")).unwrap().len(), 1);
    }

    #[test]
    fn test_snapshot_stats() {
        let store = RateStore::new();
        let meta = RateMeta::new(t0(), "cached-oanda");
        store.put(pair("EUR/GBP"), RateSeries::single(t0(), 0.85, meta.clone()));
        store.put(
            pair("EUR/AUD"),
            RateSeries::single(t0(), 1.6, RateMeta::new(t0() + Duration::hours(1), "cached-oanda")),
        );

        let stats = store.snapshot_stats();
        assert_eq!(stats.pairs, 4);
        assert_eq!(stats.observations, 4);
        assert_eq!(stats.newest_generated_at, Some(t0() + Duration::hours(1)));
    }

    #[test]
    fn test_readers_never_observe_half_update() {
        let store = Arc::new(RateStore::new());
        let forward = pair("EUR/USD");
        let meta = RateMeta::new(t0(), "cached-oanda");
        store.put(forward, RateSeries::single(t0(), 1.0, meta.clone()));

        let writer = {
            let store = Arc::clone(&store);
            let meta = meta.clone();
            thread::spawn(move || {
                for i in 1..500 {
                    store.put(forward, RateSeries::single(t0(), 1.0 + i as f64, meta.clone()));
                }
            })
        };

        let reader = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..500 {
                    // 한 번의 읽기 잠금 안에서 두 방향을 비교
                    let map = store.read();
                    let a = map.get(&forward).and_then(|s| s.get(&t0())).unwrap();
                    let b = map.get(&forward.swap()).and_then(|s| s.get(&t0())).unwrap();
                    assert!((a * b - 1.0).abs() < 1e-9);
                }
            })
        };

        writer.join().unwrap();
        reader.join().unwrap();
    }

    proptest! {
        #[test]
        fn prop_reciprocal_invariant_holds_after_put(
            rates in proptest::collection::vec(1e-6f64..1e6, 1..50)
        ) {
            let store = RateStore::new();
            let p = pair("GBP/HKD");
            let series = RateSeries::from_observations(
                rates.iter().enumerate().map(|(i, r)| {
                    RateObservation::new(t0() + Duration::days(i as i64), *r)
                }),
                RateMeta::new(t0(), "cached-oanda"),
            );
            store.put(p, series);

            let forward = store.get(&p).unwrap();
            let inverse = store.get(&p.swap()).unwrap();
            prop_assert_eq!(forward.len(), inverse.len());
            for obs in forward.observations() {
                let inv = inverse.get(&obs.timestamp).unwrap();
                prop_assert!((inv - 1.0 / obs.rate).abs() <= f64::EPSILON * inv.abs().max(1.0));
            }
        }
    }
}
