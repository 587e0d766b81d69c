//! Cart
//!
//! Client-submitted cart payloads and their normalization. All truncation and
//! drop rules for untrusted input live in [`sanitize_lines`]; nothing
//! downstream re-checks them.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Maximum number of distinct attribute keys per line; larger maps are
/// discarded wholesale.
pub const MAX_PICKED_ATTRIBUTES: usize = 1000;

/// Maximum number of selected values per attribute key; longer lists are
/// dropped.
pub const MAX_PICKED_VALUES: usize = 1000;

/// A full cart submission from the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSubmission {
    /// Cart lines.
    #[serde(default)]
    pub cart: Vec<CartLine>,

    /// Coupon codes, in the order the customer entered them.
    #[serde(default)]
    pub coupon_codes: Vec<String>,

    /// Active currency tag for this request; `None` keeps the base unit.
    #[serde(default)]
    pub currency: Option<String>,
}

/// One product reference plus quantity and selected attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Referenced product id.
    pub product_id: String,

    /// Quantity; lines with `0` are dropped during sanitization.
    pub amount: u32,

    /// Selected attribute values, keyed by attribute key.
    #[serde(default)]
    pub picked_attributes: FxHashMap<String, Vec<String>>,
}

/// Normalize raw cart lines into validated ones.
///
/// This is a total mapping: it never fails, it drops. Rules:
///
/// - lines with a zero quantity are dropped;
/// - a picked-attribute map with more than [`MAX_PICKED_ATTRIBUTES`] keys is
///   discarded entirely;
/// - attribute entries with no selected values, or more than
///   [`MAX_PICKED_VALUES`] of them, are dropped.
pub fn sanitize_lines(lines: Vec<CartLine>) -> Vec<CartLine> {
    lines
        .into_iter()
        .filter(|line| {
            if line.amount == 0 {
                debug!(product_id = %line.product_id, "dropping zero-quantity cart line");
                return false;
            }
            true
        })
        .map(|mut line| {
            if line.picked_attributes.len() > MAX_PICKED_ATTRIBUTES {
                debug!(
                    product_id = %line.product_id,
                    keys = line.picked_attributes.len(),
                    "discarding oversized picked-attribute map"
                );
                line.picked_attributes.clear();
            }

            line.picked_attributes
                .retain(|key, values| match values.len() {
                    0 => {
                        debug!(%key, "dropping attribute entry with no selected values");
                        false
                    }
                    n if n > MAX_PICKED_VALUES => {
                        debug!(%key, values = n, "dropping oversized attribute entry");
                        false
                    }
                    _ => true,
                });

            line
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(amount: u32, picked: &[(&str, &[&str])]) -> CartLine {
        CartLine {
            product_id: "p1".into(),
            amount,
            picked_attributes: picked
                .iter()
                .map(|(key, values)| {
                    (
                        (*key).to_owned(),
                        values.iter().map(|v| (*v).to_owned()).collect(),
                    )
                })
                .collect(),
        }
    }

    #[test]
    fn zero_quantity_lines_are_dropped() {
        let lines = sanitize_lines(vec![line(0, &[]), line(2, &[])]);

        assert_eq!(lines.len(), 1);
        assert_eq!(lines.first().map(|l| l.amount), Some(2));
    }

    #[test]
    fn empty_value_lists_are_dropped() {
        let lines = sanitize_lines(vec![line(1, &[("color", &["red"]), ("size", &[])])]);

        let keys = lines.first().map(|l| l.picked_attributes.len());

        assert_eq!(keys, Some(1));
    }

    #[test]
    fn oversized_attribute_map_is_discarded() {
        let picked = (0..=MAX_PICKED_ATTRIBUTES)
            .map(|i| (format!("key{i}"), vec!["v".to_owned()]))
            .collect();

        let lines = sanitize_lines(vec![CartLine {
            product_id: "p1".into(),
            amount: 1,
            picked_attributes: picked,
        }]);

        assert_eq!(
            lines.first().map(|l| l.picked_attributes.is_empty()),
            Some(true)
        );
    }

    #[test]
    fn oversized_value_list_is_dropped() {
        let values: Vec<String> = (0..=MAX_PICKED_VALUES).map(|i| format!("v{i}")).collect();
        let mut picked = FxHashMap::default();
        picked.insert("color".to_owned(), values);

        let lines = sanitize_lines(vec![CartLine {
            product_id: "p1".into(),
            amount: 1,
            picked_attributes: picked,
        }]);

        assert_eq!(
            lines.first().map(|l| l.picked_attributes.is_empty()),
            Some(true)
        );
    }

    #[test]
    fn submission_deserializes_camel_case() -> testresult::TestResult {
        let submission: CartSubmission = serde_json::from_str(
            r#"{
                "cart": [{"productId": "p1", "amount": 2, "pickedAttributes": {"color": ["red"]}}],
                "couponCodes": ["SAVE10"],
                "currency": "EUR"
            }"#,
        )?;

        assert_eq!(submission.cart.len(), 1);
        assert_eq!(submission.coupon_codes, vec!["SAVE10".to_owned()]);
        assert_eq!(submission.currency.as_deref(), Some("EUR"));

        Ok(())
    }
}
