//! tracing 기반 로깅 초기화.
//!
//! 필터 우선순위는 `RUST_LOG` 환경 변수, 설정의 `logging.level` 순입니다.
//! 형식은 `pretty`(개발), `json`(로그 수집), `compact` 중 하나입니다.

use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::config::LoggingConfig;

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            other => Err(format!("알 수 없는 로그 형식: {}", other)),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// `EnvFilter` 지시문 (예: "info", "mixer_collector=debug,tower_http=info")
    pub level: String,
    pub format: LogFormat,
    /// 파일명/줄 번호 출력 여부
    pub with_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new("info")
    }
}

impl LogConfig {
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            format: LogFormat::Pretty,
            with_location: false,
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_location(mut self, enabled: bool) -> Self {
        self.with_location = enabled;
        self
    }

    /// `RUST_LOG`, `LOG_FORMAT` 환경 변수로 설정을 만듭니다.
    pub fn from_env() -> Self {
        let level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let format = std::env::var("LOG_FORMAT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();
        Self::new(level).with_format(format)
    }

    fn filter(&self) -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&self.level))
    }

    fn fmt_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let base = fmt::layer()
            .with_file(self.with_location)
            .with_line_number(self.with_location);

        match self.format {
            LogFormat::Pretty => base.pretty().boxed(),
            // 수집기에서 필드 검색이 가능하도록 span 목록 포함
            LogFormat::Json => base.json().with_span_list(true).boxed(),
            LogFormat::Compact => base.compact().with_target(false).boxed(),
        }
    }
}

impl From<&LoggingConfig> for LogConfig {
    /// 알 수 없는 형식은 pretty로 처리합니다.
    fn from(config: &LoggingConfig) -> Self {
        Self::new(config.level.clone()).with_format(config.format.parse().unwrap_or_default())
    }
}

/// 전역 tracing subscriber를 설치합니다.
///
/// 이미 설치되어 있거나 필터 지시문이 잘못되었으면 에러를 반환합니다.
///
/// ```no_run
/// use mixer_core::logging::{init_logging, LogConfig, LogFormat};
///
/// init_logging(LogConfig::new("mixer_api=debug").with_format(LogFormat::Json)).unwrap();
/// ```
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter = config.filter()?;

    tracing_subscriber::registry()
        .with(config.fmt_layer())
        .with(filter)
        .try_init()?;

    tracing::info!(format = ?config.format, level = %config.level, "로깅 초기화 완료");
    Ok(())
}
