//! # Mixer Core
//!
//! 환율 캐시의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 서비스 전반에서 사용되는 기본 타입을 제공합니다:
//! - 통화, 통화쌍, 환율 시계열 타입
//! - 추적 대상 통화쌍 집합 (`PairUniverse`)
//! - 양방향 환율 저장소 (`RateStore`)
//! - floor/기간 조회 엔진 (`QueryEngine`)
//! - 업스트림 제공자 추상화 (`RateProvider`)
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
