//! 금액 값 타입과 USD 환산
// region:    --- Imports
use crate::error::{CatalogError, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
// endregion: --- Imports

// region:    --- Monetary Amount
/// 금액 + 통화 코드
/// 단일 컬럼에는 "1.0 USD" 형태의 문자열로 저장된다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonetaryAmount {
    pub value: Decimal,
    pub currency: String,
}

impl MonetaryAmount {
    pub fn new(value: Decimal, currency: &str) -> Result<Self> {
        let currency = currency.trim();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CatalogError::InvalidMonetaryAmount(format!(
                "통화 코드는 3자리 알파벳이어야 합니다: {}",
                currency
            )));
        }
        Ok(Self {
            value,
            currency: currency.to_ascii_uppercase(),
        })
    }

    pub fn usd(value: Decimal) -> Self {
        Self {
            value,
            currency: "USD".to_string(),
        }
    }
}

impl fmt::Display for MonetaryAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.currency)
    }
}

impl FromStr for MonetaryAmount {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split_whitespace();
        let (Some(value), Some(currency), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(CatalogError::InvalidMonetaryAmount(s.to_string()));
        };
        let value = Decimal::from_str(value)
            .map_err(|_| CatalogError::InvalidMonetaryAmount(s.to_string()))?;
        Self::new(value, currency)
    }
}

impl TryFrom<String> for MonetaryAmount {
    type Error = CatalogError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<MonetaryAmount> for String {
    fn from(amount: MonetaryAmount) -> Self {
        amount.to_string()
    }
}
// endregion: --- Monetary Amount

// region:    --- USD Converter
/// 금액을 USD 로 환산한다. (통화 -> 1 단위당 USD)
#[derive(Debug, Clone, Default)]
pub struct UsdConverter {
    rates: HashMap<String, Decimal>,
}

impl UsdConverter {
    pub fn new(rates: HashMap<String, Decimal>) -> Self {
        Self { rates }
    }

    pub fn to_usd(&self, amount: &MonetaryAmount) -> Result<MonetaryAmount> {
        let rate = if amount.currency == "USD" {
            Decimal::ONE
        } else {
            *self
                .rates
                .get(&amount.currency)
                .ok_or_else(|| CatalogError::UnknownCurrency(amount.currency.clone()))?
        };
        let value = amount
            .value
            .checked_mul(rate)
            .ok_or_else(|| CatalogError::InvalidMonetaryAmount(amount.to_string()))?
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        Ok(MonetaryAmount::usd(value))
    }
}
// endregion: --- USD Converter
