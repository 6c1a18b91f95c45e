//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 Arc로 래핑되어 여러 요청 간에 공유됩니다.
//! 핸들러는 `query`를 통해 캐시를 읽기만 하며, 쓰기는 백그라운드 `Refresher`만 수행합니다.

use chrono::{DateTime, Utc};
use mixer_collector::Refresher;
use mixer_core::{PairUniverse, QueryEngine, RateStore};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 추적 대상 통화쌍
    pub universe: Arc<PairUniverse>,

    /// 환율 캐시
    pub store: Arc<RateStore>,

    /// 읽기 전용 조회 엔진
    pub query: QueryEngine,

    /// 백그라운드 갱신기. 설정되지 않으면 캐시는 비어 있는 상태로 유지됩니다.
    pub refresher: Option<Arc<Refresher>>,

    /// 서버 시작 시각
    pub started_at: DateTime<Utc>,

    /// 버전
    pub version: String,
}

impl AppState {
    pub fn new(universe: Arc<PairUniverse>, store: Arc<RateStore>) -> Self {
        Self {
            universe,
            query: QueryEngine::new(Arc::clone(&store)),
            store,
            refresher: None,
            started_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 갱신기 설정.
    pub fn with_refresher(mut self, refresher: Arc<Refresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// 갱신기를 백그라운드 태스크로 시작합니다.
    ///
    /// # Returns
    ///
    /// 백그라운드 태스크의 JoinHandle. None이면 갱신기가 설정되지 않은 것입니다.
    pub fn start_refresher(
        &self,
        shutdown: CancellationToken,
    ) -> Option<tokio::task::JoinHandle<()>> {
        let refresher = self.refresher.clone()?;
        Some(tokio::spawn(refresher.run(shutdown)))
    }

    /// 서버 업타임(초).
    pub fn uptime_secs(&self) -> i64 {
        Utc::now().signed_duration_since(self.started_at).num_seconds()
    }
}

/// 테스트용 AppState 생성 헬퍼.
///
/// 기본 통화 목록과 빈 캐시로 구성되며 갱신기는 포함되지 않습니다.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> AppState {
    AppState::new(
        Arc::new(PairUniverse::default()),
        Arc::new(RateStore::new()),
    )
}
