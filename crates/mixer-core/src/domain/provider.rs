//! 환율 제공자 추상화.
//!
//! 업스트림 환율 소스(OANDA 등)로부터 통화쌍의 현재 시세와 일별 이력을 조회하기 위한
//! 제공자 중립적인 인터페이스를 제공합니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{MixerError, ProviderError};
use crate::types::{CurrencyPair, RateMeta, RateObservation, RateSeries};

// =============================================================================
// 조회 결과
// =============================================================================

/// 단일 현재 시세.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderQuote {
    pub rate: f64,
    pub generated_at: DateTime<Utc>,
    pub generated_by: String,
}

impl ProviderQuote {
    /// 캐시 저장용 시계열로 변환합니다.
    ///
    /// 관측 시각은 `generated_at`이며 출처는 `cached-<source>`로 태그됩니다.
    pub fn into_series(self) -> RateSeries {
        let meta = RateMeta::new(self.generated_at, self.generated_by).cached();
        RateSeries::single(self.generated_at, self.rate, meta)
    }
}

/// 일별 이력 시세.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderHistory {
    pub observations: Vec<RateObservation>,
    pub generated_at: DateTime<Utc>,
    pub generated_by: String,
}

impl ProviderHistory {
    /// 캐시 저장용 시계열로 변환합니다.
    pub fn into_series(self) -> RateSeries {
        let meta = RateMeta::new(self.generated_at, self.generated_by).cached();
        RateSeries::from_observations(self.observations, meta)
    }
}

// =============================================================================
// 조회 모드
// =============================================================================

/// 갱신 시 사용할 조회 모드.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// 일별 이력 전체
    #[default]
    History,
    /// 최신 시세 1건
    Current,
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchMode::History => write!(f, "history"),
            FetchMode::Current => write!(f, "current"),
        }
    }
}

impl FromStr for FetchMode {
    type Err = MixerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "history" => Ok(FetchMode::History),
            "current" => Ok(FetchMode::Current),
            other => Err(MixerError::Config(format!("알 수 없는 갱신 모드: {}", other))),
        }
    }
}

// =============================================================================
// RateProvider Trait
// =============================================================================

/// 환율 제공자 trait.
///
/// 각 업스트림별로 이 trait를 구현합니다. 구현체는 `Arc<dyn RateProvider>`로 공유되므로
/// 내부 상태 없이 동시 호출을 허용해야 합니다.
///
/// # 구현 예시
///
/// ```ignore
/// pub struct FixedProvider;
///
/// #[async_trait]
/// impl RateProvider for FixedProvider {
///     fn name(&self) -> &str { "fixed" }
///
///     async fn fetch_current(&self, pair: &CurrencyPair) -> Result<ProviderQuote, ProviderError> {
///         // 업스트림 호출 및 변환
///     }
///
///     // ...
/// }
/// ```
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// 제공자 이름 (`generatedBy` 기본값 및 로깅용).
    fn name(&self) -> &str;

    /// 최신 시세 조회.
    ///
    /// # Errors
    ///
    /// - `ProviderError::Network`: 연결 실패
    /// - `ProviderError::Status`: 2xx가 아닌 응답
    /// - `ProviderError::EmptyPayload`: 사용할 수 있는 시세 없음
    async fn fetch_current(&self, pair: &CurrencyPair) -> Result<ProviderQuote, ProviderError>;

    /// 일별 이력 조회.
    ///
    /// # Errors
    ///
    /// `fetch_current`와 동일합니다.
    async fn fetch_history(&self, pair: &CurrencyPair) -> Result<ProviderHistory, ProviderError>;

    /// 모드에 따라 조회하여 캐시 저장용 시계열로 반환합니다.
    async fn fetch(
        &self,
        pair: &CurrencyPair,
        mode: FetchMode,
    ) -> Result<RateSeries, ProviderError> {
        let series = match mode {
            FetchMode::History => self.fetch_history(pair).await?.into_series(),
            FetchMode::Current => self.fetch_current(pair).await?.into_series(),
        };

        if series.is_empty() {
            return Err(ProviderError::EmptyPayload(format!(
                "{}: 유효한 관측값 없음",
                pair
            )));
        }
        Ok(series)
    }
}
