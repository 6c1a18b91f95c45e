//! 환율 캐시 갱신기.
//!
//! 이 crate는 업스트림 제공자로부터 환율을 주기적으로 가져와 캐시에 저장합니다:
//! - 정규 통화쌍별 조회 및 양방향 저장 (`Refresher`)
//! - 갱신 주기 통계 (`RefreshStats`)
//!
//! API 서버는 이 crate의 `Refresher`를 백그라운드 작업으로 실행하며,
//! `mixer-collector` 바이너리는 단발성 갱신과 통화쌍 확인에 사용됩니다.

pub mod refresher;
pub mod stats;

pub use refresher::{RefreshOutcome, Refresher};
pub use stats::RefreshStats;
