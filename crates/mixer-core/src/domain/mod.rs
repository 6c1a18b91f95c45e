//! 환율 캐시 도메인 모델.

mod provider;
mod query;
mod store;
mod universe;

pub use provider::*;
pub use query::*;
pub use store::*;
pub use universe::*;
