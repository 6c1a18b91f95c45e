//! 설정 관리.
//!
//! 설정은 다음 순서로 병합됩니다 (뒤가 우선):
//! 1. 코드 기본값
//! 2. `config/default.toml` (없으면 건너뜀)
//! 3. 환경 변수 `MIXER__<SECTION>__<KEY>` (예: `MIXER__REFRESH__MODE=current`)

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::time::Duration;

use crate::domain::{FetchMode, DEFAULT_CURRENCIES};
use crate::error::MixerResult;

/// 환경 변수 접두사.
pub const ENV_PREFIX: &str = "MIXER";

/// 기본 설정 파일 경로.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 서버 설정
    pub server: ServerConfig,
    /// 업스트림 제공자 설정
    pub currency: CurrencyConfig,
    /// 갱신 주기 설정
    pub refresh: RefreshConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    /// `host:port` 바인딩 주소.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// 업스트림 환율 제공자 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CurrencyConfig {
    /// 제공자 이름 (현재 `oanda`만 지원)
    pub provider: String,
    /// API 토큰. Debug 출력에서 가려집니다.
    #[serde(deserialize_with = "deserialize_secret")]
    pub token: Option<SecretString>,
    /// REST API 기본 URL
    pub base_url: String,
    /// 추적할 통화 목록 (순서가 정규 방향을 결정)
    pub currencies: Vec<String>,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            provider: "oanda".to_string(),
            token: None,
            base_url: "https://api-fxtrade.oanda.com".to_string(),
            currencies: DEFAULT_CURRENCIES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .filter(|token| !token.trim().is_empty())
        .map(SecretString::from))
}

/// 갱신 주기 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// 조회 모드 (history, current)
    pub mode: FetchMode,
    /// 주기 시작 간격 (초)
    pub interval_secs: u64,
    /// 프로세스 시작 후 첫 주기까지 대기 (밀리초)
    pub initial_delay_ms: u64,
    /// 통화쌍별 조회 타임아웃 (초)
    pub fetch_timeout_secs: u64,
    /// 재시도 가능한 실패의 최대 재시도 횟수
    pub max_retries: u32,
    /// 재시도 간 대기 (밀리초)
    pub retry_delay_ms: u64,
    /// 동시 조회 수
    pub max_concurrent_fetches: usize,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            mode: FetchMode::History,
            interval_secs: 3600,
            initial_delay_ms: 1000,
            fetch_timeout_secs: 30,
            max_retries: 0,
            retry_delay_ms: 500,
            max_concurrent_fetches: 1,
        }
    }
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// 0이면 1로 보정합니다.
    pub fn concurrency(&self) -> usize {
        self.max_concurrent_fetches.max(1)
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없으면 기본값과 환경 변수만 사용합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> MixerResult<Self> {
        let builder = config::Config::builder()
            // 파일에서 로드 (선택)
            .add_source(config::File::from(path.as_ref()).required(false))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("currency.currencies")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> MixerResult<Self> {
        Self::load(DEFAULT_CONFIG_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.currency.provider, "oanda");
        assert_eq!(config.currency.currencies.len(), 6);
        assert!(config.currency.token.is_none());
        assert_eq!(config.refresh.mode, FetchMode::History);
        assert_eq!(config.refresh.interval(), Duration::from_secs(3600));
        assert_eq!(config.refresh.initial_delay(), Duration::from_secs(1));
        assert_eq!(config.refresh.concurrency(), 1);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = AppConfig::load("does/not/exist.toml").unwrap();
        assert_eq!(config.refresh.fetch_timeout_secs, 30);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join(format!("mixer-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("mixer.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[currency]
token = "abc-123"
currencies = ["USD", "NZD"]

[refresh]
mode = "current"
max_concurrent_fetches = 0
"#
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.currency.currencies, vec!["USD", "NZD"]);
        assert_eq!(
            config.currency.token.as_ref().map(|t| t.expose_secret().to_string()),
            Some("abc-123".to_string())
        );
        assert_eq!(config.refresh.mode, FetchMode::Current);
        assert_eq!(config.refresh.concurrency(), 1);
        assert_eq!(config.server.port, 8080);

        // 토큰은 Debug 출력에 노출되지 않음
        assert!(!format!("{:?}", config.currency).contains("abc-123"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
