//! 추적 대상 통화쌍 집합.
//!
//! 설정된 통화 목록에서 정규 방향 통화쌍을 생성합니다. 프로세스 시작 시 한 번 계산되어
//! `Arc`로 공유되며 이후 변경되지 않습니다.

use crate::types::{Currency, CurrencyPair};

/// 기본 통화 목록.
pub const DEFAULT_CURRENCIES: [&str; 6] = ["EUR", "GBP", "AUD", "NZD", "USD", "HKD"];

/// 정규 방향 통화쌍을 생성합니다.
///
/// N개의 서로 다른 통화에 대해 정확히 N·(N−1)/2개의 쌍을 만들며,
/// (첫 통화 순위, 두 번째 통화 순위) 오름차순으로 정렬됩니다.
/// 중복 통화는 첫 번째 등장만 사용합니다.
///
/// # 예제
///
/// ```
/// use mixer_core::{generate_pairs, Currency};
///
/// let currencies: Vec<Currency> = ["EUR", "GBP", "AUD"]
///     .iter()
///     .map(|c| c.parse().unwrap())
///     .collect();
/// let pairs: Vec<String> = generate_pairs(&currencies)
///     .iter()
///     .map(|p| p.to_string())
///     .collect();
/// assert_eq!(pairs, vec!["EUR/GBP", "EUR/AUD", "GBP/AUD"]);
/// ```
pub fn generate_pairs(currencies: &[Currency]) -> Vec<CurrencyPair> {
    let distinct = dedup_preserving_order(currencies);

    distinct
        .iter()
        .enumerate()
        .flat_map(|(index, base)| {
            distinct[index + 1..]
                .iter()
                .map(move |target| CurrencyPair::new(*base, *target))
        })
        .collect()
}

fn dedup_preserving_order(currencies: &[Currency]) -> Vec<Currency> {
    let mut distinct: Vec<Currency> = Vec::with_capacity(currencies.len());
    for currency in currencies {
        if !distinct.contains(currency) {
            distinct.push(*currency);
        }
    }
    distinct
}

/// 설정된 통화 목록과 그로부터 생성된 정규 통화쌍.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairUniverse {
    currencies: Vec<Currency>,
    pairs: Vec<CurrencyPair>,
}

impl PairUniverse {
    /// 통화 목록으로 유니버스를 생성합니다.
    pub fn new(currencies: &[Currency]) -> Self {
        Self {
            currencies: dedup_preserving_order(currencies),
            pairs: generate_pairs(currencies),
        }
    }

    /// 문자열 코드 목록으로 유니버스를 생성합니다.
    pub fn from_codes<S: AsRef<str>>(codes: &[S]) -> Result<Self, crate::MixerError> {
        let currencies = codes
            .iter()
            .map(|c| Currency::new(c.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(&currencies))
    }

    /// 순위 순서의 통화 목록.
    pub fn currencies(&self) -> &[Currency] {
        &self.currencies
    }

    /// 정규 방향 통화쌍 목록.
    pub fn pairs(&self) -> &[CurrencyPair] {
        &self.pairs
    }

    /// 설정 목록에서의 순위 (0부터).
    pub fn rank(&self, currency: &Currency) -> Option<usize> {
        self.currencies.iter().position(|c| c == currency)
    }

    /// 어느 방향으로든 유니버스에 포함된 쌍인지 확인합니다.
    pub fn contains(&self, pair: &CurrencyPair) -> bool {
        self.canonical(pair).is_some()
    }

    /// 정규 방향(낮은 순위, 높은 순위)으로 변환합니다.
    ///
    /// 유니버스 밖의 통화가 포함되었거나 base와 target이 같으면 `None`.
    pub fn canonical(&self, pair: &CurrencyPair) -> Option<CurrencyPair> {
        let base_rank = self.rank(&pair.base)?;
        let target_rank = self.rank(&pair.target)?;
        match base_rank.cmp(&target_rank) {
            std::cmp::Ordering::Less => Some(*pair),
            std::cmp::Ordering::Greater => Some(pair.swap()),
            std::cmp::Ordering::Equal => None,
        }
    }
}

impl Default for PairUniverse {
    fn default() -> Self {
        Self::from_codes(&DEFAULT_CURRENCIES).unwrap_or_else(|_| Self::new(&[]))
    }
}
