//! Mixer 환율 캐시 API 서버.
//!
//! 설정을 로드하고 백그라운드 갱신기를 시작한 뒤 Axum REST API를 제공합니다.

use std::sync::Arc;

use axum::{http::StatusCode, Router};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use mixer_api::openapi::swagger_ui_router;
use mixer_api::routes::create_api_router;
use mixer_api::state::AppState;
use mixer_collector::Refresher;
use mixer_core::{init_logging, AppConfig, LogConfig, PairUniverse, RateStore};

/// CORS 레이어 생성.
///
/// `CORS_ORIGINS` 환경변수(쉼표 구분)가 설정되면 해당 origin만 허용합니다.
fn cors_layer() -> CorsLayer {
    let allow_origin = match std::env::var("CORS_ORIGINS") {
        Ok(origins) if !origins.is_empty() => {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();

            if origins.is_empty() {
                warn!("CORS_ORIGINS에 유효한 origin이 없어 모든 origin을 허용합니다");
                AllowOrigin::any()
            } else {
                info!(count = origins.len(), "CORS 허용 origin 설정");
                AllowOrigin::list(origins)
            }
        }
        _ => {
            warn!("CORS_ORIGINS 미설정, 모든 origin 허용 (개발 모드)");
            AllowOrigin::any()
        }
    };

    // 조회 전용 API
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
}

/// `--export-openapi` 플래그 또는 `EXPORT_OPENAPI=1`이면 스펙을 stdout으로 출력하고 종료합니다.
fn handle_export_openapi() -> anyhow::Result<()> {
    use mixer_api::openapi::ApiDoc;
    use utoipa::OpenApi as _;

    let export_flag = std::env::args().any(|arg| arg == "--export-openapi");
    let export_env = std::env::var("EXPORT_OPENAPI")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    if export_flag || export_env {
        let json = serde_json::to_string_pretty(&ApiDoc::openapi())?;
        println!("{}", json);
        std::process::exit(0);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    handle_export_openapi()?;

    let config = AppConfig::load_default()?;
    init_logging(LogConfig::from(&config.logging))
        .map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    info!(version = env!("CARGO_PKG_VERSION"), "Mixer API 서버 초기화");

    let universe = Arc::new(PairUniverse::from_codes(&config.currency.currencies)?);
    let store = Arc::new(RateStore::new());
    info!(
        currencies = universe.currencies().len(),
        pairs = universe.pairs().len(),
        "통화쌍 구성 완료"
    );

    let mut state = AppState::new(Arc::clone(&universe), Arc::clone(&store));

    // 제공자 구성에 실패하면 빈 캐시로 서비스합니다 (조회는 not-found 응답).
    match mixer_upstream::create_provider(&config.currency, config.refresh.fetch_timeout()) {
        Ok(provider) => {
            info!(
                provider = provider.name(),
                mode = %config.refresh.mode,
                interval_secs = config.refresh.interval_secs,
                "환율 갱신기 구성 완료"
            );
            let refresher = Arc::new(Refresher::new(
                universe,
                store,
                provider,
                config.refresh.clone(),
            ));
            state = state.with_refresher(refresher);
        }
        Err(e) => {
            error!(error = %e, "환율 제공자 구성 실패, 갱신기 없이 시작합니다");
        }
    }

    let state = Arc::new(state);

    // Graceful shutdown 토큰
    let shutdown_token = CancellationToken::new();
    let refresher_handle = state.start_refresher(shutdown_token.clone());

    let app = Router::new()
        .merge(create_api_router().with_state(Arc::clone(&state)))
        .merge(swagger_ui_router())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.server.request_timeout(),
        ))
        .layer(cors_layer());

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        error!(addr = %addr, error = %e, "소켓 바인딩 실패. MIXER__SERVER__HOST, MIXER__SERVER__PORT 설정을 확인하세요.");
        e
    })?;
    info!(addr = %addr, "Mixer API 서버 시작 (Swagger UI: /swagger-ui)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_token.clone()))
        .await?;

    shutdown_token.cancel();
    if let Some(handle) = refresher_handle {
        if let Err(e) = handle.await {
            error!(error = %e, "갱신기 태스크 종료 실패");
        }
    }

    info!("Mixer API 서버 종료 완료");
    Ok(())
}

/// Ctrl+C 또는 SIGTERM 수신 시 토큰을 취소합니다.
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Ctrl+C 핸들러 등록 실패");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "SIGTERM 핸들러 등록 실패");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Ctrl+C 수신, 서버 종료 시작");
        }
        _ = terminate => {
            warn!("SIGTERM 수신, 서버 종료 시작");
        }
    }

    shutdown_token.cancel();
    info!("백그라운드 작업에 종료 신호 전파");
}
