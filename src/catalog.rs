//! Catalog
//!
//! Read-only product and attribute data as the engine sees it. The engine
//! never owns this data: it is loaded per request through
//! [`CatalogSource`](crate::store::CatalogSource) and treated as a snapshot.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Stock availability of a product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockStatus {
    /// Product can be purchased.
    #[default]
    #[serde(rename = "In stock")]
    InStock,

    /// Product cannot be purchased.
    #[serde(rename = "Out of stock")]
    OutOfStock,

    /// Product can be purchased but will ship later.
    #[serde(rename = "On backorder")]
    OnBackorder,
}

/// Denormalized category reference stored on priced lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    /// Category id.
    pub id: String,

    /// Category name.
    pub name: String,
}

/// A catalog product.
///
/// `price` is always the charged price; `old_price` is the pre-sale "was"
/// price shown for display only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product id.
    pub id: String,

    /// Product name.
    pub name: String,

    /// Stock-keeping unit.
    #[serde(default)]
    pub sku: Option<String>,

    /// Charged unit price, in the base currency unit.
    pub price: Decimal,

    /// Pre-sale price, display only.
    #[serde(default)]
    pub old_price: Option<Decimal>,

    /// Href of the main image.
    #[serde(default)]
    pub main_image: Option<String>,

    /// Hrefs of all images.
    #[serde(default)]
    pub images: Vec<String>,

    /// Description, HTML allowed.
    #[serde(default)]
    pub description: Option<String>,

    /// Units in stock, if tracked.
    #[serde(default)]
    pub stock_amount: Option<u32>,

    /// Stock availability.
    #[serde(default)]
    pub stock_status: StockStatus,

    /// Main category id.
    #[serde(default)]
    pub main_category_id: Option<String>,

    /// Denormalized category summaries.
    #[serde(default)]
    pub categories: Vec<CategorySummary>,

    /// Attribute schema: which attributes this product exposes, in declared
    /// order, with any per-value variant overrides.
    #[serde(default)]
    pub attributes: Vec<AttributeInstance>,
}

impl Product {
    /// Find the product's attribute instance for a key.
    pub fn attribute(&self, key: &str) -> Option<&AttributeInstance> {
        self.attributes.iter().find(|instance| instance.key == key)
    }
}

/// Selection arity of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    /// Single-choice: at most one selected value takes effect.
    Radio,

    /// Multi-choice.
    Checkbox,
}

/// A globally defined attribute, e.g. "color".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute key.
    pub key: String,

    /// Selection arity.
    #[serde(rename = "type")]
    pub kind: AttributeType,

    /// Ordered set of allowed values.
    pub values: Vec<AttributeValue>,
}

/// An allowed value of a global attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeValue {
    /// The value itself.
    pub value: String,

    /// Href of an icon shown next to the value.
    #[serde(default)]
    pub icon: Option<String>,
}

/// A product's use of a global attribute: the subset of values it offers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeInstance {
    /// Attribute key.
    pub key: String,

    /// Offered values, in declared order.
    pub values: Vec<AttributeInstanceValue>,
}

impl AttributeInstance {
    /// Find the instance value matching a selected value.
    pub fn value(&self, value: &str) -> Option<&AttributeInstanceValue> {
        self.values.iter().find(|v| v.value == value)
    }
}

/// One offered value of a product attribute, with an optional variant
/// override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeInstanceValue {
    /// The value itself.
    pub value: String,

    /// Field-by-field product override applied when this value is selected.
    #[serde(default)]
    pub product_variant: Option<VariantOverride>,
}

/// Attribute-value-specific replacement for one or more product fields.
///
/// Each field overrides independently; `None` leaves the corresponding
/// product (or earlier override) field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantOverride {
    /// Replacement name.
    #[serde(default)]
    pub name: Option<String>,

    /// Replacement charged price, in the base currency unit.
    #[serde(default)]
    pub price: Option<Decimal>,

    /// Replacement "was" price.
    #[serde(default)]
    pub old_price: Option<Decimal>,

    /// Replacement main image.
    #[serde(default)]
    pub main_image: Option<String>,

    /// Replacement image list.
    #[serde(default)]
    pub images: Option<Vec<String>>,

    /// Replacement description.
    #[serde(default)]
    pub description: Option<String>,
}
