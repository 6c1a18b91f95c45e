//! 통합 API 에러 응답 타입.
//!
//! 모든 API 엔드포인트에서 일관된 에러 형식을 제공합니다.
//!
//! | 코드 | 상태 |
//! |------|------|
//! | `INVALID_CURRENCY` | 400 |
//! | `INVALID_DATE` | 400 |
//! | `INVALID_RANGE` | 400 |
//! | `INTERNAL_INVARIANT` | 500 |

use axum::http::StatusCode;
use axum::Json;
use mixer_core::MixerError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

/// 통합 API 에러 응답.
///
/// # 예시
///
/// ```json
/// {
///   "code": "INVALID_RANGE",
///   "message": "Cannot search rates backwards from 2024-01-02T00:00:00Z to 2024-01-01T00:00:00Z",
///   "timestamp": 1738300800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "INVALID_CURRENCY", "INVALID_RANGE")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp, 선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    ///
    /// ```
    /// use mixer_api::error::ApiErrorResponse;
    ///
    /// let error = ApiErrorResponse::new("INVALID_CURRENCY", "잘못된 통화 코드: EU");
    /// assert_eq!(error.code, "INVALID_CURRENCY");
    /// ```
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }

    /// 상세 정보 포함 에러 생성.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            details: Some(details),
            ..Self::new(code, message)
        }
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

/// 핸들러 에러.
///
/// `?`로 전파하면 [`ApiResult`]의 에러 응답으로 변환됩니다.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("잘못된 통화 코드: {0}")]
    InvalidCurrency(String),

    #[error("잘못된 날짜 형식: {0}")]
    InvalidDate(String),

    #[error("{0}")]
    InvalidRange(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// 에러 코드.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidCurrency(_) => "INVALID_CURRENCY",
            ApiError::InvalidDate(_) => "INVALID_DATE",
            ApiError::InvalidRange(_) => "INVALID_RANGE",
            ApiError::Internal(_) => "INTERNAL_INVARIANT",
        }
    }

    /// HTTP 상태 코드.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<MixerError> for ApiError {
    fn from(err: MixerError) -> Self {
        match err {
            MixerError::InvalidCurrency(code) => ApiError::InvalidCurrency(code),
            MixerError::InvalidRange { .. } => ApiError::InvalidRange(err.to_string()),
            other => {
                error!(error = %other, "요청 처리 중 내부 에러");
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl From<ApiError> for (StatusCode, Json<ApiErrorResponse>) {
    fn from(err: ApiError) -> Self {
        (
            err.status(),
            Json(ApiErrorResponse::new(err.code(), err.to_string())),
        )
    }
}

/// API 핸들러 Result 타입 별칭.
///
/// # Example
///
/// ```ignore
/// async fn get_rate(
///     Path((base, target)): Path<(String, String)>,
///     State(state): State<Arc<AppState>>,
/// ) -> ApiResult<Json<RateQuote>> {
///     let pair = CurrencyPair::from_codes(&base, &target).map_err(ApiError::from)?;
///     Ok(Json(state.query.find_rate_on_day(&pair, Utc::now())))
/// }
/// ```
pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiErrorResponse>)>;
