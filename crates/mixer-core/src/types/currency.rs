//! 통화 및 통화쌍 정의.
//!
//! - `Currency` - 3자리 통화 코드 (예: EUR, NZD)
//! - `CurrencyPair` - (base, target) 순서쌍

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MixerError;

/// 3자리 ISO 통화 코드.
///
/// 생성 시 대문자로 정규화되며, 영문자 3개가 아니면 거부됩니다.
/// 정렬 순서(정규 방향)는 코드 자체가 아니라 설정된 통화 목록의 순위로 결정됩니다
/// ([`crate::PairUniverse::rank`] 참고).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
#[cfg_attr(
    feature = "utoipa-support",
    derive(utoipa::ToSchema),
    schema(value_type = String, example = "EUR")
)]
pub struct Currency([u8; 3]);

impl Currency {
    /// 통화 코드를 검증하여 생성합니다.
    pub fn new(code: &str) -> Result<Self, MixerError> {
        let trimmed = code.trim();
        let bytes = trimmed.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(MixerError::InvalidCurrency(code.to_string()));
        }

        let mut upper = [0u8; 3];
        for (dst, src) in upper.iter_mut().zip(bytes) {
            *dst = src.to_ascii_uppercase();
        }
        Ok(Self(upper))
    }

    /// 코드 문자열을 반환합니다.
    pub fn as_str(&self) -> &str {
        // 생성 시 ASCII 영문자만 허용
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Currency({})", self.as_str())
    }
}

impl FromStr for Currency {
    type Err = MixerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Currency {
    type Error = MixerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.as_str().to_string()
    }
}

/// 통화쌍 (base, target).
///
/// 환율은 base 1단위당 target 수량입니다. `(A, B)`와 `(B, A)`는 서로 다른 캐시 키지만
/// 저장소에는 항상 함께 저장됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct CurrencyPair {
    /// 기준 통화
    pub base: Currency,
    /// 대상 통화
    pub target: Currency,
}

impl CurrencyPair {
    /// 새 통화쌍을 생성합니다.
    pub fn new(base: Currency, target: Currency) -> Self {
        Self { base, target }
    }

    /// 문자열 코드로부터 통화쌍을 생성합니다.
    pub fn from_codes(base: &str, target: &str) -> Result<Self, MixerError> {
        Ok(Self::new(Currency::new(base)?, Currency::new(target)?))
    }

    /// 방향을 뒤집은 통화쌍 (target, base).
    pub fn swap(&self) -> Self {
        Self {
            base: self.target,
            target: self.base,
        }
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.target)
    }
}

impl FromStr for CurrencyPair {
    type Err = MixerError;

    /// "BASE/TARGET" 또는 "BASE_TARGET" 형식을 파싱합니다.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (base, target) = s
            .split_once('/')
            .or_else(|| s.split_once('_'))
            .ok_or_else(|| MixerError::InvalidCurrency(s.to_string()))?;
        Self::from_codes(base, target)
    }
}
