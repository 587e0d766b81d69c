//! Currencies
//!
//! The store's currencies are configured, not ISO-defined: each carries a tag
//! and a ratio against one implicit base unit (ratio `1.0` for the base
//! currency). Catalog prices are denominated in the base unit and converted
//! to the active currency at the pricing boundary.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors related to currency lookup or conversion.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CurrencyError {
    /// The requested tag is not part of the configured currency set.
    #[error("currency {0:?} is not configured")]
    UnknownCurrency(String),

    /// A configured currency has a zero or negative ratio.
    #[error("currency {0:?} has a non-positive ratio")]
    InvalidRatio(String),
}

/// A configured currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// Currency tag, e.g. `"USD"`.
    pub tag: String,

    /// Display symbol prepended to formatted prices.
    #[serde(default)]
    pub symbol: Option<String>,

    /// Ratio against the implicit base unit (`1.0` for the base currency).
    pub ratio: Decimal,
}

/// The set of currencies configured for the store.
#[derive(Debug, Clone, Default)]
pub struct CurrencySet {
    currencies: Vec<Currency>,
}

impl CurrencySet {
    /// Create a new currency set.
    pub fn new(currencies: impl Into<Vec<Currency>>) -> Self {
        CurrencySet {
            currencies: currencies.into(),
        }
    }

    /// Look up a currency by tag.
    pub fn get(&self, tag: &str) -> Option<&Currency> {
        self.currencies.iter().find(|currency| currency.tag == tag)
    }

    /// Look up a currency by tag, validating its ratio.
    ///
    /// # Errors
    ///
    /// - [`CurrencyError::UnknownCurrency`]: the tag is not configured.
    /// - [`CurrencyError::InvalidRatio`]: the configured ratio is not positive.
    pub fn checked(&self, tag: &str) -> Result<&Currency, CurrencyError> {
        let currency = self
            .get(tag)
            .ok_or_else(|| CurrencyError::UnknownCurrency(tag.to_owned()))?;

        if currency.ratio <= Decimal::ZERO {
            return Err(CurrencyError::InvalidRatio(tag.to_owned()));
        }

        Ok(currency)
    }

    /// Convert an amount between two configured currencies.
    ///
    /// Conversion is `amount * (to.ratio / from.ratio)`; the result keeps full
    /// precision and is not rounded here.
    ///
    /// # Errors
    ///
    /// - [`CurrencyError::UnknownCurrency`]: either tag is not configured.
    /// - [`CurrencyError::InvalidRatio`]: either ratio is not positive.
    pub fn convert(&self, amount: Decimal, from: &str, to: &str) -> Result<Decimal, CurrencyError> {
        let from = self.checked(from)?;
        let to = self.checked(to)?;

        Ok(amount * (to.ratio / from.ratio))
    }

    /// Convert an amount from the implicit base unit to a configured currency.
    ///
    /// # Errors
    ///
    /// - [`CurrencyError::UnknownCurrency`]: the tag is not configured.
    /// - [`CurrencyError::InvalidRatio`]: the configured ratio is not positive.
    pub fn from_base(&self, amount: Decimal, to: &str) -> Result<Decimal, CurrencyError> {
        Ok(amount * self.checked(to)?.ratio)
    }
}
