//! Type-safe price representation using decimal arithmetic.
//!
//! Catalog prices are decimal amounts in the currency's standard unit
//! (dollars, pesos). Payment processors want integer minor units (cents), so
//! [`Price::minor_units`] is the single place where that conversion happens.

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minor units per standard unit for every supported currency.
const MINOR_UNITS_PER_UNIT: Decimal = Decimal::ONE_HUNDRED;

/// Errors converting an amount to minor units.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("amount cannot be negative: {0}")]
    Negative(Decimal),
    #[error("amount is too large: {0}")]
    Overflow(Decimal),
}

/// Unknown or unsupported currency code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported currency: {0}")]
pub struct CurrencyError(pub String);

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Amount in integer minor units, rounded half away from zero.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Negative` for negative amounts and
    /// `MoneyError::Overflow` if the result does not fit in an `i64`.
    pub fn minor_units(&self) -> Result<i64, MoneyError> {
        if self.amount.is_sign_negative() && !self.amount.is_zero() {
            return Err(MoneyError::Negative(self.amount));
        }

        self.amount
            .checked_mul(MINOR_UNITS_PER_UNIT)
            .map(|cents| cents.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|cents| cents.to_i64())
            .ok_or(MoneyError::Overflow(self.amount))
    }
}

/// ISO 4217 currency codes accepted by the checkout flow.
///
/// Serialized lower-case (`"usd"`), which is what the payment processor expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyCode {
    #[default]
    USD,
    MXN,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Lower-case ISO code as sent to the payment processor.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::USD => "usd",
            Self::MXN => "mxn",
            Self::EUR => "eur",
            Self::GBP => "gbp",
            Self::CAD => "cad",
            Self::AUD => "aud",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CurrencyCode {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "usd" => Ok(Self::USD),
            "mxn" => Ok(Self::MXN),
            "eur" => Ok(Self::EUR),
            "gbp" => Ok(Self::GBP),
            "cad" => Ok(Self::CAD),
            "aud" => Ok(Self::AUD),
            _ => Err(CurrencyError(s.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn usd(amount: &str) -> Price {
        Price::new(amount.parse().unwrap(), CurrencyCode::USD)
    }

    #[test]
    fn test_minor_units_whole_and_fractional() {
        assert_eq!(usd("0").minor_units(), Ok(0));
        assert_eq!(usd("12").minor_units(), Ok(1200));
        assert_eq!(usd("19.99").minor_units(), Ok(1999));
    }

    #[test]
    fn test_minor_units_rounds_half_away_from_zero() {
        assert_eq!(usd("0.005").minor_units(), Ok(1));
        assert_eq!(usd("10.004").minor_units(), Ok(1000));
    }

    #[test]
    fn test_minor_units_rejects_negative() {
        assert!(matches!(
            usd("-1.00").minor_units(),
            Err(MoneyError::Negative(_))
        ));
    }

    #[test]
    fn test_minor_units_overflow() {
        let huge = Price::new(Decimal::MAX, CurrencyCode::USD);
        assert!(matches!(huge.minor_units(), Err(MoneyError::Overflow(_))));
    }

    #[test]
    fn test_currency_code_parse_is_case_insensitive() {
        assert_eq!("USD".parse::<CurrencyCode>().unwrap(), CurrencyCode::USD);
        assert_eq!(" mxn ".parse::<CurrencyCode>().unwrap(), CurrencyCode::MXN);
        assert_eq!(
            "xyz".parse::<CurrencyCode>().unwrap_err().to_string(),
            "Unsupported currency: xyz"
        );
    }

    #[test]
    fn test_currency_code_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&CurrencyCode::EUR).unwrap(),
            "\"eur\""
        );
    }
}
