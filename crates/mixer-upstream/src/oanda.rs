//! OANDA v20 REST API 환율 제공자.
//!
//! `GET {base_url}/v3/instruments/{BASE}_{TARGET}/candles`의 중간가(mid) 종가를 사용합니다.
//!
//! # 사용 예제
//!
//! ```rust,ignore
//! use mixer_upstream::OandaRateProvider;
//!
//! let provider = OandaRateProvider::new(
//!     "https://api-fxtrade.oanda.com",
//!     SecretString::from("TOKEN"),
//!     Duration::from_secs(30),
//! )?;
//! let history = provider.fetch_history(&"EUR/GBP".parse()?).await?;
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mixer_core::{
    CurrencyPair, ProviderError, ProviderHistory, ProviderQuote, RateObservation, RateProvider,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 제공자 이름 (`generatedBy`).
pub const OANDA_PROVIDER_NAME: &str = "oanda";

/// 기본 REST API URL.
pub const OANDA_DEFAULT_BASE_URL: &str = "https://api-fxtrade.oanda.com";

/// 이력 조회 시 요청할 일봉 수.
pub const HISTORY_CANDLE_COUNT: u32 = 4950;

/// 캔들 응답.
#[derive(Debug, Deserialize)]
struct CandlesResponse {
    #[serde(default)]
    candles: Vec<Candle>,
}

#[derive(Debug, Deserialize)]
struct Candle {
    time: DateTime<Utc>,
    #[serde(default)]
    mid: Option<CandleMid>,
}

/// OANDA는 가격을 문자열로 인코딩합니다.
#[derive(Debug, Deserialize)]
struct CandleMid {
    c: PriceValue,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PriceValue {
    Text(String),
    Number(f64),
}

impl PriceValue {
    fn to_f64(&self) -> Result<f64, ProviderError> {
        match self {
            PriceValue::Number(n) => Ok(*n),
            PriceValue::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| ProviderError::Parse(format!("잘못된 가격 '{}': {}", s, e))),
        }
    }
}

impl Candle {
    fn close(&self) -> Result<Option<RateObservation>, ProviderError> {
        match &self.mid {
            Some(mid) => Ok(Some(RateObservation::new(self.time, mid.c.to_f64()?))),
            None => Ok(None),
        }
    }
}

/// OANDA 환율 제공자.
pub struct OandaRateProvider {
    client: reqwest::Client,
    base_url: String,
    token: SecretString,
    timeout: Duration,
}

impl std::fmt::Debug for OandaRateProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OandaRateProvider")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl OandaRateProvider {
    /// 새 제공자를 생성합니다.
    ///
    /// `timeout`은 HTTP 요청 단위 타임아웃입니다.
    pub fn new(
        base_url: impl Into<String>,
        token: SecretString,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Network(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            timeout,
        })
    }

    fn candles_url(&self, pair: &CurrencyPair) -> String {
        format!(
            "{}/v3/instruments/{}_{}/candles",
            self.base_url, pair.base, pair.target
        )
    }

    async fn fetch_candles(
        &self,
        pair: &CurrencyPair,
        query: &[(&str, String)],
    ) -> Result<Vec<Candle>, ProviderError> {
        let url = self.candles_url(pair);
        debug!(pair = %pair, url = %url, "OANDA 캔들 요청");

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.token.expose_secret())
            .query(query)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(pair = %pair, status = status.as_u16(), "OANDA 응답 실패");
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.map_request_error(e))?;
        if body.trim().is_empty() {
            return Err(ProviderError::EmptyPayload(format!("{}: 빈 응답 본문", pair)));
        }

        let parsed: CandlesResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::Parse(format!("{}: {}", pair, e)))?;

        if parsed.candles.is_empty() {
            return Err(ProviderError::EmptyPayload(format!("{}: 캔들 없음", pair)));
        }
        Ok(parsed.candles)
    }

    fn map_request_error(&self, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout(self.timeout)
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl RateProvider for OandaRateProvider {
    fn name(&self) -> &str {
        OANDA_PROVIDER_NAME
    }

    async fn fetch_current(&self, pair: &CurrencyPair) -> Result<ProviderQuote, ProviderError> {
        info!(pair = %pair, "Fetching exchange rate");

        let candles = self.fetch_candles(pair, &[("count", "1".to_string())]).await?;
        let latest = candles
            .iter()
            .rev()
            .find_map(|c| c.close().transpose())
            .transpose()?
            .ok_or_else(|| ProviderError::EmptyPayload(format!("{}: mid 가격 없음", pair)))?;

        info!(pair = %pair, rate = latest.rate, "Established exchange rate");
        Ok(ProviderQuote {
            rate: latest.rate,
            generated_at: Utc::now(),
            generated_by: OANDA_PROVIDER_NAME.to_string(),
        })
    }

    async fn fetch_history(&self, pair: &CurrencyPair) -> Result<ProviderHistory, ProviderError> {
        info!(pair = %pair, "Fetching exchange rate history");

        let candles = self
            .fetch_candles(
                pair,
                &[
                    ("granularity", "D".to_string()),
                    ("count", HISTORY_CANDLE_COUNT.to_string()),
                    ("price", "M".to_string()),
                ],
            )
            .await?;

        let mut observations = Vec::with_capacity(candles.len());
        for candle in &candles {
            if let Some(obs) = candle.close()? {
                observations.push(obs);
            }
        }

        info!(
            pair = %pair,
            candles = candles.len(),
            observations = observations.len(),
            "Established exchange rate history"
        );

        Ok(ProviderHistory {
            observations,
            generated_at: Utc::now(),
            generated_by: OANDA_PROVIDER_NAME.to_string(),
        })
    }
}
