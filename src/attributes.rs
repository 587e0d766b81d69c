//! Attribute resolution
//!
//! Resolves a product plus the customer's picked attribute values into the
//! effective line variant. Overrides apply field-by-field, never as a whole
//! record, and iteration follows the product's declared schema order so the
//! outcome is independent of the client map's insertion order.

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::Serialize;
use thiserror::Error;

use crate::{
    cart::CartLine,
    catalog::{Attribute, AttributeType, CategorySummary, Product, StockStatus},
};

/// How to treat picked attribute keys or values that are not part of the
/// product's schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AttributePolicy {
    /// Drop invalid entries and price the line from what remains.
    #[default]
    Lenient,

    /// Fail the request with [`AttributeError::InvalidAttributeSelection`].
    Strict,
}

/// Errors raised while resolving a line's attributes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AttributeError {
    /// A picked key or value is not part of the product's schema.
    #[error("selection {key:?} is not valid for product {product_id}")]
    InvalidAttributeSelection {
        /// Product whose schema rejected the selection.
        product_id: String,

        /// Offending attribute key.
        key: String,

        /// Offending value, if the key itself was valid.
        value: Option<String>,
    },
}

/// A priced cart line: the effective variant after attribute resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLine {
    /// Referenced product id.
    pub product_id: String,

    /// Effective name.
    pub name: String,

    /// Stock-keeping unit.
    pub sku: Option<String>,

    /// Effective main image.
    pub main_image: Option<String>,

    /// Effective image list.
    pub images: Vec<String>,

    /// Effective description.
    pub description: Option<String>,

    /// Denormalized category summaries.
    pub categories: Vec<CategorySummary>,

    /// Stock availability at resolution time.
    pub stock_status: StockStatus,

    /// Units in stock at resolution time, if tracked.
    pub stock_amount: Option<u32>,

    /// Quantity.
    pub amount: u32,

    /// Selections that survived resolution, as stored on the order.
    pub picked_attributes: FxHashMap<String, Vec<String>>,

    /// Effective charged unit price.
    #[serde(with = "crate::money::serde_price")]
    pub unit_price: Decimal,

    /// Effective "was" unit price, display only.
    #[serde(with = "crate::money::serde_price_opt")]
    pub unit_old_price: Option<Decimal>,

    /// `unit_price * amount`, full precision.
    #[serde(with = "crate::money::serde_price")]
    pub line_total: Decimal,

    /// `"was" unit price * amount`; falls back to `unit_price` when the
    /// product has no old price.
    #[serde(with = "crate::money::serde_price")]
    pub line_total_old: Decimal,
}

impl ResolvedLine {
    /// Scale every monetary field by a currency ratio.
    pub(crate) fn scale_prices(&mut self, rate: Decimal) {
        self.unit_price *= rate;
        self.unit_old_price = self.unit_old_price.map(|price| price * rate);
        self.line_total *= rate;
        self.line_total_old *= rate;
    }
}

/// Resolve a sanitized cart line against a product's attribute schema.
///
/// Iterates the product's declared attribute order; within an attribute, the
/// instance's declared value order. Later overrides win per field. Attributes
/// declared `Radio` contribute at most their first selected value (in
/// declared order); surplus radio selections are dropped in both policies.
///
/// # Errors
///
/// - [`AttributeError::InvalidAttributeSelection`]: under
///   [`AttributePolicy::Strict`], a picked key or value is absent from the
///   product's schema.
pub fn resolve_line(
    product: &Product,
    line: &CartLine,
    definitions: &[Attribute],
    policy: AttributePolicy,
) -> Result<ResolvedLine, AttributeError> {
    let mut resolved = ResolvedLine {
        product_id: product.id.clone(),
        name: product.name.clone(),
        sku: product.sku.clone(),
        main_image: product.main_image.clone(),
        images: product.images.clone(),
        description: product.description.clone(),
        categories: product.categories.clone(),
        stock_status: product.stock_status,
        stock_amount: product.stock_amount,
        amount: line.amount,
        picked_attributes: FxHashMap::default(),
        unit_price: product.price,
        unit_old_price: product.old_price,
        line_total: Decimal::ZERO,
        line_total_old: Decimal::ZERO,
    };

    if policy == AttributePolicy::Strict {
        for key in line.picked_attributes.keys() {
            if product.attribute(key).is_none() {
                return Err(AttributeError::InvalidAttributeSelection {
                    product_id: product.id.clone(),
                    key: key.clone(),
                    value: None,
                });
            }
        }
    }

    for instance in &product.attributes {
        let Some(picked) = line.picked_attributes.get(&instance.key) else {
            continue;
        };

        if policy == AttributePolicy::Strict {
            if let Some(invalid) = picked.iter().find(|value| instance.value(value).is_none()) {
                return Err(AttributeError::InvalidAttributeSelection {
                    product_id: product.id.clone(),
                    key: instance.key.clone(),
                    value: Some(invalid.clone()),
                });
            }
        }

        let single_choice = definitions
            .iter()
            .find(|definition| definition.key == instance.key)
            .is_some_and(|definition| definition.kind == AttributeType::Radio);

        let mut kept: Vec<String> = Vec::new();

        // Declared value order, not the client's list order.
        for value in &instance.values {
            if !picked.contains(&value.value) {
                continue;
            }
            if single_choice && !kept.is_empty() {
                break;
            }
            kept.push(value.value.clone());

            if let Some(variant) = &value.product_variant {
                if let Some(name) = &variant.name {
                    resolved.name = name.clone();
                }
                if let Some(price) = variant.price {
                    resolved.unit_price = price;
                }
                if let Some(old_price) = variant.old_price {
                    resolved.unit_old_price = Some(old_price);
                }
                if let Some(main_image) = &variant.main_image {
                    resolved.main_image = Some(main_image.clone());
                }
                if let Some(images) = &variant.images {
                    resolved.images = images.clone();
                }
                if let Some(description) = &variant.description {
                    resolved.description = Some(description.clone());
                }
            }
        }

        if !kept.is_empty() {
            resolved.picked_attributes.insert(instance.key.clone(), kept);
        }
    }

    let amount = Decimal::from(line.amount);
    resolved.line_total = resolved.unit_price * amount;
    resolved.line_total_old = resolved.unit_old_price.unwrap_or(resolved.unit_price) * amount;

    Ok(resolved)
}
