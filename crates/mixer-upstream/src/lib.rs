//! # Mixer Upstream
//!
//! 업스트림 환율 제공자 구현.
//!
//! 설정의 `currency.provider` 이름으로 [`create_provider`]가 구현체를 선택합니다.
//! 현재 지원하는 제공자:
//! - `oanda` - OANDA v20 REST API

pub mod oanda;

pub use oanda::*;

use mixer_core::{CurrencyConfig, MixerError, MixerResult, RateProvider};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// 설정에 맞는 제공자를 생성합니다.
///
/// # Errors
///
/// - 알 수 없는 제공자 이름
/// - 토큰 미설정
pub fn create_provider(
    config: &CurrencyConfig,
    timeout: Duration,
) -> MixerResult<Arc<dyn RateProvider>> {
    match config.provider.trim().to_lowercase().as_str() {
        OANDA_PROVIDER_NAME => {
            let token = config.token.clone().ok_or_else(|| {
                MixerError::Config("currency.token이 설정되지 않았습니다".to_string())
            })?;
            let provider = OandaRateProvider::new(&config.base_url, token, timeout)?;
            info!(provider = OANDA_PROVIDER_NAME, base_url = %config.base_url, "환율 제공자 생성");
            Ok(Arc::new(provider))
        }
        other => Err(MixerError::Config(format!(
            "지원하지 않는 환율 제공자: {}",
            other
        ))),
    }
}
