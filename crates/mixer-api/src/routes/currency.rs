//! 환율 조회 endpoint.
//!
//! 캐시에 저장된 환율을 조회합니다. 모든 경로는 캐시만 읽으며 업스트림을 호출하지 않습니다.
//!
//! # 엔드포인트
//!
//! - `GET /currency/{base}/{target}` - 현재 시점 환율
//! - `GET /currency/{base}/{target}/{date}` - 특정 시점 환율
//! - `POST /currency/query` - 여러 통화쌍의 기간 환율
//! - `POST /currency/bulk` - 여러 통화쌍의 현재 환율

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use mixer_core::{ComposedRates, CurrencyPair, LatestRates, QueryWindow, RateQuote};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use utoipa::ToSchema;

use crate::error::{ApiError, ApiErrorResponse, ApiResult};
use crate::state::AppState;

// ==================== 요청/응답 타입 ====================

/// 통화쌍 지정.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InstrumentRequest {
    /// 기준 통화 (예: "USD")
    pub base: String,
    /// 대상 통화 (예: "NZD")
    pub target: String,
}

impl InstrumentRequest {
    fn to_pair(&self) -> Result<CurrencyPair, ApiError> {
        CurrencyPair::from_codes(&self.base, &self.target).map_err(ApiError::from)
    }
}

/// 기간 조회 요청.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryRatesRequest {
    /// 조회할 통화쌍 목록
    pub instruments: Vec<InstrumentRequest>,
    /// 시작 시점 (RFC 3339 또는 YYYY-MM-DD, 기본값: 현재 - 4900일)
    #[serde(default)]
    pub start_date: Option<String>,
    /// 종료 시점 (RFC 3339 또는 YYYY-MM-DD, 기본값: 현재)
    #[serde(default)]
    pub end_date: Option<String>,
}

/// 기간 조회 응답.
///
/// `rates[시각][base][target] = 환율`. 각 통화쌍의 역방향도 함께 포함됩니다.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QueryRatesResponse {
    #[schema(value_type = Object)]
    pub rates: ComposedRates,
}

/// 현재 환율 일괄 조회 요청.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkRatesRequest {
    pub rates: Vec<InstrumentRequest>,
}

/// 현재 환율 일괄 조회 응답 (`rates[base][target] = 환율`).
///
/// 캐시에 데이터가 없는 통화쌍은 생략됩니다.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkRatesResponse {
    #[schema(value_type = Object)]
    pub rates: LatestRates,
}

// ==================== 파싱 헬퍼 ====================

fn parse_pair(base: &str, target: &str) -> Result<CurrencyPair, ApiError> {
    CurrencyPair::from_codes(base, target).map_err(ApiError::from)
}

/// RFC 3339 또는 `YYYY-MM-DD`(UTC 자정)를 파싱합니다.
pub fn parse_date(input: &str) -> Result<DateTime<Utc>, ApiError> {
    let trimmed = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ApiError::InvalidDate(input.to_string()))
}

fn parse_optional_date(input: Option<&str>) -> Result<Option<DateTime<Utc>>, ApiError> {
    input.map(parse_date).transpose()
}

// ==================== 핸들러 ====================

/// 현재 시점 환율 조회.
///
/// 캐시에 데이터가 없으면 `rate = null`, `generatedBy = "error"` 응답을 반환합니다.
#[utoipa::path(
    get,
    path = "/currency/{base}/{target}",
    params(
        ("base" = String, Path, description = "기준 통화 (예: USD)"),
        ("target" = String, Path, description = "대상 통화 (예: NZD)")
    ),
    responses(
        (status = 200, description = "환율 (데이터 없음 포함)", body = RateQuote),
        (status = 400, description = "잘못된 통화 코드", body = ApiErrorResponse)
    ),
    tag = "currency"
)]
pub async fn get_current_rate(
    State(state): State<Arc<AppState>>,
    Path((base, target)): Path<(String, String)>,
) -> ApiResult<Json<RateQuote>> {
    let pair = parse_pair(&base, &target)?;
    Ok(Json(state.query.find_rate_on_day(&pair, Utc::now())))
}

/// 특정 시점 환율 조회.
///
/// 해당 시점 이하의 가장 최근 관측값을 반환합니다.
#[utoipa::path(
    get,
    path = "/currency/{base}/{target}/{date}",
    params(
        ("base" = String, Path, description = "기준 통화 (예: USD)"),
        ("target" = String, Path, description = "대상 통화 (예: NZD)"),
        ("date" = String, Path, description = "시점 (RFC 3339 또는 YYYY-MM-DD)")
    ),
    responses(
        (status = 200, description = "환율 (데이터 없음 포함)", body = RateQuote),
        (status = 400, description = "잘못된 통화 코드 또는 날짜", body = ApiErrorResponse)
    ),
    tag = "currency"
)]
pub async fn get_rate_on_date(
    State(state): State<Arc<AppState>>,
    Path((base, target, date)): Path<(String, String, String)>,
) -> ApiResult<Json<RateQuote>> {
    let pair = parse_pair(&base, &target)?;
    let day = parse_date(&date)?;
    Ok(Json(state.query.find_rate_on_day(&pair, day)))
}

/// 여러 통화쌍의 기간 환율 조회.
#[utoipa::path(
    post,
    path = "/currency/query",
    request_body = QueryRatesRequest,
    responses(
        (status = 200, description = "날짜별 환율", body = QueryRatesResponse),
        (status = 400, description = "잘못된 통화 코드, 날짜 또는 역방향 기간", body = ApiErrorResponse),
        (status = 500, description = "내부 불변식 위반", body = ApiErrorResponse)
    ),
    tag = "currency"
)]
pub async fn query_rates(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRatesRequest>,
) -> ApiResult<Json<QueryRatesResponse>> {
    let instruments = request
        .instruments
        .iter()
        .map(InstrumentRequest::to_pair)
        .collect::<Result<Vec<_>, _>>()?;

    let window = QueryWindow::with_defaults(
        parse_optional_date(request.start_date.as_deref())?,
        parse_optional_date(request.end_date.as_deref())?,
        Utc::now(),
    );
    debug!(
        instruments = instruments.len(),
        from = %window.from,
        to = %window.to,
        "기간 환율 조회"
    );

    let rates = state
        .query
        .compose_rates(&instruments, window)
        .map_err(ApiError::from)?;
    Ok(Json(QueryRatesResponse { rates }))
}

/// 여러 통화쌍의 현재 환율 일괄 조회.
#[utoipa::path(
    post,
    path = "/currency/bulk",
    request_body = BulkRatesRequest,
    responses(
        (status = 200, description = "base → target → 환율", body = BulkRatesResponse),
        (status = 400, description = "잘못된 통화 코드", body = ApiErrorResponse)
    ),
    tag = "currency"
)]
pub async fn bulk_rates(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BulkRatesRequest>,
) -> ApiResult<Json<BulkRatesResponse>> {
    let instruments = request
        .rates
        .iter()
        .map(InstrumentRequest::to_pair)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(BulkRatesResponse {
        rates: state.query.latest_rates(&instruments, Utc::now()),
    }))
}

/// 환율 라우터 생성.
pub fn currency_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/query", post(query_rates))
        .route("/bulk", post(bulk_rates))
        .route("/{base}/{target}", get(get_current_rate))
        .route("/{base}/{target}/{date}", get(get_rate_on_date))
}
