//! 헬스 체크 endpoint.
//!
//! 로드밸런서나 오케스트레이션 시스템(Kubernetes 등)에서 사용됩니다.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use mixer_collector::RefreshStats;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::state::AppState;

/// 헬스 체크 응답 구조체.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// 전체 서비스 상태 ("healthy" | "degraded")
    pub status: String,

    /// API 버전
    pub version: String,

    /// 서버 업타임(초)
    pub uptime_secs: i64,

    /// 현재 시간 (ISO 8601)
    pub timestamp: String,

    /// 캐시 상태
    pub cache: CacheHealth,

    /// 갱신기 상태
    pub refresher: ComponentStatus,
}

/// 캐시 상태.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CacheHealth {
    /// 추적 대상 정규 통화쌍 수
    pub tracked_pairs: usize,
    /// 저장된 통화쌍 수 (양방향 포함)
    pub cached_pairs: usize,
    /// 저장된 전체 관측값 수
    pub observations: usize,
    /// 가장 최근 데이터 생성 시각
    pub newest_generated_at: Option<DateTime<Utc>>,
}

/// 컴포넌트 상태.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComponentStatus {
    /// 상태 ("up" | "refreshing" | "not_configured")
    pub status: String,

    /// 마지막으로 완료된 갱신 주기
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub last_refresh: Option<RefreshStats>,
}

impl ComponentStatus {
    pub fn not_configured() -> Self {
        Self {
            status: "not_configured".to_string(),
            last_refresh: None,
        }
    }
}

/// 간단한 헬스 체크 (liveness probe용).
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "서버 응답 가능")),
    tag = "health"
)]
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// 상세 헬스 체크 (readiness probe용).
///
/// 캐시가 비어 있으면 `degraded`를 반환합니다. 상태 코드는 항상 200입니다.
#[utoipa::path(
    get,
    path = "/health/ready",
    responses((status = 200, description = "캐시 및 갱신기 상태", body = HealthResponse)),
    tag = "health"
)]
pub async fn health_ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stats = state.store.snapshot_stats();

    let refresher = match &state.refresher {
        Some(refresher) => ComponentStatus {
            status: if refresher.is_running() {
                "refreshing".to_string()
            } else {
                "up".to_string()
            },
            last_refresh: refresher.last_stats(),
        },
        None => ComponentStatus::not_configured(),
    };

    let overall_status = if stats.pairs == 0 { "degraded" } else { "healthy" };

    let response = HealthResponse {
        status: overall_status.to_string(),
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
        timestamp: Utc::now().to_rfc3339(),
        cache: CacheHealth {
            tracked_pairs: state.universe.pairs().len(),
            cached_pairs: stats.pairs,
            observations: stats.observations,
            newest_generated_at: stats.newest_generated_at,
        },
        refresher,
    };

    (StatusCode::OK, Json(response))
}

/// 헬스 체크 라우터 생성.
pub fn health_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(health_ready))
}
