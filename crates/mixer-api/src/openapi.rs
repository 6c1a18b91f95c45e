//! OpenAPI 문서화 설정.
//!
//! utoipa를 사용하여 REST API의 OpenAPI 3.0 스펙을 생성합니다.
//! Swagger UI는 `/swagger-ui` 경로에서 사용 가능합니다.
//!
//! 새로운 엔드포인트를 추가할 때:
//!
//! 1. 응답/요청 타입에 `#[derive(ToSchema)]` 추가
//! 2. 핸들러에 `#[utoipa::path(...)]` 어노테이션 추가
//! 3. 이 파일의 `components(schemas(...))` 및 `paths(...)` 섹션에 추가

use axum::Router;
use mixer_core::{RateMeta, RateQuote};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ApiErrorResponse;
use crate::routes::{
    BulkRatesRequest, BulkRatesResponse, CacheHealth, ComponentStatus, HealthResponse,
    InstrumentRequest, QueryRatesRequest, QueryRatesResponse,
};

/// Mixer API 문서.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Mixer FX Rate API",
        version = "0.1.0",
        description = r#"
# Mixer 환율 캐시 REST API

업스트림 제공자로부터 주기적으로 갱신되는 환율 캐시를 조회합니다.

## 주요 기능

- **시점 조회**: 지정 시점 이하의 가장 최근 환율
- **기간 조회**: 여러 통화쌍의 날짜별 환율 (역방향 포함)
- **일괄 조회**: 여러 통화쌍의 현재 환율

캐시에 데이터가 없으면 `rate = null`, `generatedBy = "error"` 응답을 반환합니다.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT"),
    ),
    servers(
        (url = "http://localhost:8080", description = "로컬 개발 서버"),
    ),
    tags(
        (name = "health", description = "헬스 체크 - 서버 및 캐시 상태 확인"),
        (name = "currency", description = "환율 - 캐시된 환율 조회")
    ),
    components(
        schemas(
            // ===== Health =====
            HealthResponse,
            CacheHealth,
            ComponentStatus,

            // ===== Common =====
            ApiErrorResponse,

            // ===== Currency =====
            RateQuote,
            RateMeta,
            InstrumentRequest,
            QueryRatesRequest,
            QueryRatesResponse,
            BulkRatesRequest,
            BulkRatesResponse,
        )
    ),
    paths(
        // ===== Health =====
        crate::routes::health::health_check,
        crate::routes::health::health_ready,

        // ===== Currency =====
        crate::routes::currency::get_current_rate,
        crate::routes::currency::get_rate_on_date,
        crate::routes::currency::query_rates,
        crate::routes::currency::bulk_rates,
    )
)]
pub struct ApiDoc;

/// Swagger UI 라우터 생성.
///
/// - `/swagger-ui` - Swagger UI 대화형 문서
/// - `/api-docs/openapi.json` - OpenAPI JSON 스펙
pub fn swagger_ui_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_valid() {
        let spec = ApiDoc::openapi();
        let json = serde_json::to_string_pretty(&spec).unwrap();

        assert!(json.contains("Mixer FX Rate API"));
        assert!(json.contains("/health/ready"));
        assert!(json.contains("/currency/{base}/{target}"));
        assert!(json.contains("/currency/{base}/{target}/{date}"));
        assert!(json.contains("/currency/query"));
        assert!(json.contains("/currency/bulk"));
        assert!(json.contains("RateQuote"));
        assert!(json.contains("ApiErrorResponse"));
    }

    #[test]
    fn test_swagger_ui_router_creates() {
        let _router: Router<()> = swagger_ui_router();
    }
}
