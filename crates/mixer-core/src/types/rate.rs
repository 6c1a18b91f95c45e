//! 환율 관측값과 시계열.
//!
//! - `RateObservation` - (시각, 환율) 한 건
//! - `RateMeta` - 출처(provenance) 메타데이터
//! - `RateSeries` - 시각 기준 정렬, 시각 중복 없는 관측값 모음
//! - `RateQuote` - 단일 시점 조회 응답 (데이터 없음 센티널 포함)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 데이터 없음 응답의 `generatedBy` 값.
pub const NOT_FOUND_SOURCE: &str = "error";

/// 캐시된 정방향 시계열의 출처 접두사.
pub const CACHED_PREFIX: &str = "cached-";

/// 역수로 계산된 시계열의 출처 접두사.
pub const DERIVED_PREFIX: &str = "cached-derived-from-";

/// 환율 관측값.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct RateObservation {
    /// 관측 시각
    pub timestamp: DateTime<Utc>,
    /// base 1단위당 target 수량 (양수)
    pub rate: f64,
}

impl RateObservation {
    /// 새 관측값을 생성합니다.
    pub fn new(timestamp: DateTime<Utc>, rate: f64) -> Self {
        Self { timestamp, rate }
    }

    /// 저장 가능한 환율인지 확인합니다 (유한한 양수).
    pub fn is_valid(&self) -> bool {
        is_valid_rate(self.rate)
    }
}

fn is_valid_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

/// 출처 메타데이터.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct RateMeta {
    /// 데이터 생성 시각
    pub generated_at: DateTime<Utc>,
    /// 데이터 출처 (예: "oanda", "cached-oanda", "error")
    pub generated_by: String,
    /// 조회된 환율의 기준 시각
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_rate: Option<DateTime<Utc>>,
}

impl RateMeta {
    /// 새 메타데이터를 생성합니다.
    pub fn new(generated_at: DateTime<Utc>, generated_by: impl Into<String>) -> Self {
        Self {
            generated_at,
            generated_by: generated_by.into(),
            date_of_rate: None,
        }
    }

    /// 캐시 출처로 태그합니다 (`cached-<source>`).
    pub fn cached(&self) -> Self {
        Self {
            generated_by: format!("{}{}", CACHED_PREFIX, self.source()),
            ..self.clone()
        }
    }

    /// 역수 시계열의 출처로 태그합니다 (`cached-derived-from-<source>`).
    pub fn derived(&self) -> Self {
        Self {
            generated_by: format!("{}{}", DERIVED_PREFIX, self.source()),
            ..self.clone()
        }
    }

    /// 접두사를 제외한 원 출처.
    pub fn source(&self) -> &str {
        let by = self.generated_by.as_str();
        by.strip_prefix(DERIVED_PREFIX)
            .or_else(|| by.strip_prefix(CACHED_PREFIX))
            .unwrap_or(by)
    }
}

/// 시각 기준 정렬된 환율 시계열.
///
/// 같은 시각의 관측값은 하나만 유지되며, 유효하지 않은 환율(0 이하, NaN, 무한대)은
/// 저장되지 않습니다.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSeries {
    rates: BTreeMap<DateTime<Utc>, f64>,
    meta: RateMeta,
}

impl RateSeries {
    /// 빈 시계열을 생성합니다.
    pub fn new(meta: RateMeta) -> Self {
        Self {
            rates: BTreeMap::new(),
            meta,
        }
    }

    /// 관측값 목록으로 시계열을 생성합니다.
    ///
    /// 유효하지 않은 환율은 건너뛰고, 같은 시각은 나중 값이 우선합니다.
    pub fn from_observations(
        observations: impl IntoIterator<Item = RateObservation>,
        meta: RateMeta,
    ) -> Self {
        let mut series = Self::new(meta);
        for obs in observations {
            series.insert(obs.timestamp, obs.rate);
        }
        series
    }

    /// 단일 시세를 길이 1 시계열로 표현합니다.
    pub fn single(timestamp: DateTime<Utc>, rate: f64, meta: RateMeta) -> Self {
        Self::from_observations([RateObservation::new(timestamp, rate)], meta)
    }

    /// 관측값을 추가합니다. 유효하지 않은 환율이면 `false`.
    pub fn insert(&mut self, timestamp: DateTime<Utc>, rate: f64) -> bool {
        if !is_valid_rate(rate) {
            return false;
        }
        self.rates.insert(timestamp, rate);
        true
    }

    /// 메타데이터.
    pub fn meta(&self) -> &RateMeta {
        &self.meta
    }

    /// 메타데이터를 교체한 시계열을 반환합니다.
    pub fn with_meta(mut self, meta: RateMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// 정확히 해당 시각의 환율.
    pub fn get(&self, timestamp: &DateTime<Utc>) -> Option<f64> {
        self.rates.get(timestamp).copied()
    }

    /// 가장 이른 관측값.
    pub fn first(&self) -> Option<RateObservation> {
        self.rates
            .first_key_value()
            .map(|(ts, rate)| RateObservation::new(*ts, *rate))
    }

    /// 가장 최근 관측값.
    pub fn last(&self) -> Option<RateObservation> {
        self.rates
            .last_key_value()
            .map(|(ts, rate)| RateObservation::new(*ts, *rate))
    }

    /// 시각 순서대로 모든 관측값.
    pub fn observations(&self) -> impl Iterator<Item = RateObservation> + '_ {
        self.rates
            .iter()
            .map(|(ts, rate)| RateObservation::new(*ts, *rate))
    }

    /// floor 검색: `at` 이하인 가장 큰 시각의 관측값.
    ///
    /// `at` 이후 시각의 값은 절대 반환하지 않습니다. O(log n).
    pub fn floor(&self, at: DateTime<Utc>) -> Option<RateObservation> {
        self.rates
            .range(..=at)
            .next_back()
            .map(|(ts, rate)| RateObservation::new(*ts, *rate))
    }

    /// 반개구간 `[from, to)`의 관측값.
    ///
    /// `from >= to`이면 비어 있습니다.
    pub fn range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Iterator<Item = RateObservation> + '_ {
        let window = if from < to {
            Some(self.rates.range(from..to))
        } else {
            None
        };
        window
            .into_iter()
            .flatten()
            .map(|(ts, rate)| RateObservation::new(*ts, *rate))
    }

    /// 역방향 시계열: 같은 시각, 환율은 `1/rate`, 출처는 derived로 태그.
    pub fn reciprocal(&self) -> Self {
        Self {
            rates: self
                .rates
                .iter()
                .map(|(ts, rate)| (*ts, 1.0 / rate))
                .collect(),
            meta: self.meta.derived(),
        }
    }
}

/// 단일 시점 환율 조회 응답.
///
/// 데이터가 없으면 `rate = null`, `generatedBy = "error"` 센티널을 반환하여
/// 호출자는 항상 구조적으로 유효한 응답을 받습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct RateQuote {
    /// 메타데이터
    pub meta: RateMeta,
    /// 환율 (데이터 없음이면 null)
    pub rate: Option<f64>,
}

impl RateQuote {
    /// 조회 성공 응답.
    pub fn found(observation: RateObservation, series_meta: &RateMeta) -> Self {
        Self {
            meta: RateMeta {
                generated_at: series_meta.generated_at,
                generated_by: series_meta.generated_by.clone(),
                date_of_rate: Some(observation.timestamp),
            },
            rate: Some(observation.rate),
        }
    }

    /// 데이터 없음 센티널.
    pub fn not_found() -> Self {
        let now = Utc::now();
        Self {
            meta: RateMeta {
                generated_at: now,
                generated_by: NOT_FOUND_SOURCE.to_string(),
                date_of_rate: Some(now),
            },
            rate: None,
        }
    }

    /// 센티널 응답인지 확인합니다.
    pub fn is_not_found(&self) -> bool {
        self.rate.is_none() && self.meta.generated_by == NOT_FOUND_SOURCE
    }
}
