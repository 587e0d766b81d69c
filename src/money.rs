//! Money
//!
//! Fixed-point helpers for monetary amounts. All internal arithmetic keeps
//! full [`Decimal`] precision; rounding to two decimal places happens only on
//! the figures a cart total or order actually emits.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round a monetary amount to 2 decimal places, half-up.
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format a monetary amount as a decimal string fixed to 2 places.
pub fn price_string(amount: Decimal) -> String {
    format!("{:.2}", round2(amount))
}

/// Serialize a monetary field as a decimal string fixed to 2 places.
pub mod serde_price {
    use rust_decimal::Decimal;
    use serde::Serializer;

    /// Serialize the amount as e.g. `"210.00"`.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(amount: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::price_string(*amount))
    }
}

/// Serialize an optional monetary field as a decimal string fixed to 2 places.
pub mod serde_price_opt {
    use rust_decimal::Decimal;
    use serde::Serializer;

    /// Serialize the amount as e.g. `"210.00"`, or `null` when absent.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(
        amount: &Option<Decimal>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match amount {
            Some(amount) => serializer.serialize_str(&super::price_string(*amount)),
            None => serializer.serialize_none(),
        }
    }
}
