//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)
//! - `/currency` - 환율 조회

pub mod currency;
pub mod health;

pub use currency::{
    currency_router, BulkRatesRequest, BulkRatesResponse, InstrumentRequest, QueryRatesRequest,
    QueryRatesResponse,
};
pub use health::{health_router, CacheHealth, ComponentStatus, HealthResponse};

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// 전체 API 라우터 생성.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .nest("/currency", currency_router())
}
