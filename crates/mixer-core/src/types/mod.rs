//! 캐시 전반에서 사용되는 공통 타입.

mod currency;
mod rate;

pub use currency::*;
pub use rate::*;
