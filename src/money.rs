use std::convert::TryFrom;
use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MoneyError {
    #[error("amount {amount} has more decimal places than {currency} allows ({precision})")]
    Precision {
        amount: Decimal,
        currency: String,
        precision: u32,
    },
    #[error("amount {amount} {currency} is out of range")]
    OutOfRange { amount: Decimal, currency: String },
}

/// A monetary value held as a signed count of the currency's minor units.
///
/// It is never represented as floating point. `Display` renders it as a
/// fixed-point decimal string at the currency's precision.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Money {
    pub minor_units: i64,
    pub currency: String,
}

impl Money {
    pub fn new<S: Into<String>>(minor_units: i64, currency: S) -> Self {
        Self {
            minor_units,
            currency: currency.into(),
        }
    }

    /// Converts a decimal amount into minor units of `currency`. Amounts that
    /// would lose precision are rejected rather than rounded. The result
    /// always has a representable magnitude.
    pub fn from_decimal<S: Into<String>>(amount: Decimal, currency: S) -> Result<Self, MoneyError> {
        let currency = currency.into();
        let precision = currency_precision(&currency);
        let mut scaled = amount;
        scaled.rescale(precision);
        if scaled != amount {
            return Err(MoneyError::Precision {
                amount,
                currency,
                precision,
            });
        }
        let minor_units = i64::try_from(scaled.mantissa())
            .ok()
            .filter(|units| *units != i64::MIN)
            .ok_or_else(|| MoneyError::OutOfRange {
                amount,
                currency: currency.clone(),
            })?;
        Ok(Self {
            minor_units,
            currency,
        })
    }

    pub fn precision(&self) -> u32 {
        currency_precision(&self.currency)
    }

    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.minor_units, self.precision())
    }

    pub fn is_positive(&self) -> bool {
        self.minor_units > 0
    }

    pub fn negated(&self) -> Self {
        Self {
            minor_units: -self.minor_units,
            currency: self.currency.clone(),
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{}", self.to_decimal())
    }
}

/// Formats an optional amount. Absence renders as the empty string, never as
/// zero.
pub fn format_opt(money: Option<&Money>) -> String {
    money.map(Money::to_string).unwrap_or_default()
}

/// Number of minor-unit decimal places for an ISO 4217 currency code.
pub fn currency_precision(code: &str) -> u32 {
    match code {
        "BIF" | "CLP" | "DJF" | "GNF" | "ISK" | "JPY" | "KMF" | "KRW" | "PYG" | "RWF" | "UGX"
        | "UYI" | "VND" | "VUV" | "XAF" | "XOF" | "XPF" => 0,
        "BHD" | "IQD" | "JOD" | "KWD" | "LYD" | "OMR" | "TND" => 3,
        "CLF" | "UYW" => 4,
        _ => 2,
    }
}
