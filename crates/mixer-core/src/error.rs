//! 환율 캐시의 에러 타입.
//!
//! 이 모듈은 캐시, 조회, 갱신 전반에서 사용되는 에러 타입을 정의합니다.
//! "데이터 없음"은 에러가 아니며 [`crate::RateQuote::not_found`] 센티널로 표현됩니다.

use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

/// 업스트림 환율 제공자 호출 에러.
///
/// Refresher가 로컬에서 복구하며 호출자에게 노출되지 않습니다.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// 네트워크/연결 에러
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 2xx가 아닌 응답
    #[error("업스트림 응답 실패 (status {status}): {message}")]
    Status { status: u16, message: String },

    /// 응답 본문이 비어 있거나 사용할 수 있는 데이터가 없음
    #[error("빈 응답: {0}")]
    EmptyPayload(String),

    /// 응답 파싱 실패
    #[error("파싱 에러: {0}")]
    Parse(String),

    /// 요청 타임아웃
    #[error("요청 타임아웃 ({0:?})")]
    Timeout(Duration),
}

impl ProviderError {
    /// 재시도 가능한 에러인지 확인합니다.
    ///
    /// 네트워크 오류, 타임아웃, 429, 5xx 응답만 재시도 대상입니다.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Network(_) | ProviderError::Timeout(_) => true,
            ProviderError::Status { status, .. } => *status == 429 || *status >= 500,
            ProviderError::EmptyPayload(_) | ProviderError::Parse(_) => false,
        }
    }
}

/// 핵심 캐시 에러.
#[derive(Debug, Error)]
pub enum MixerError {
    /// 잘못된 통화 코드
    #[error("잘못된 통화 코드: {0}")]
    InvalidCurrency(String),

    /// 역방향 기간 조회 (`to < from`)
    #[error("Cannot search rates backwards from {from} to {to}")]
    InvalidRange {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },

    /// 내부 불변식 위반 (도달 불가능해야 함)
    #[error("내부 불변식 위반: {0}")]
    InvariantViolation(String),

    /// 업스트림 조회 실패
    #[error("업스트림 에러: {0}")]
    Upstream(#[from] ProviderError),

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 이미 갱신 주기가 진행 중
    #[error("갱신 주기가 이미 진행 중입니다")]
    RefreshInProgress,
}

/// 캐시 작업을 위한 Result 타입.
pub type MixerResult<T> = Result<T, MixerError>;

impl From<config::ConfigError> for MixerError {
    fn from(err: config::ConfigError) -> Self {
        MixerError::Config(err.to_string())
    }
}
