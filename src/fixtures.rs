//! Fixtures
//!
//! A small sample catalog, coupon set, and currency configuration shared by
//! the unit and integration test suites.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal_macros::dec;

use crate::{
    catalog::{
        Attribute, AttributeInstance, AttributeInstanceValue, AttributeType, AttributeValue,
        CategorySummary, Product, StockStatus, VariantOverride,
    },
    coupons::{Coupon, CouponDiscount},
    currency::{Currency, CurrencySet},
    store::MemoryStore,
};

/// A fixed instant so coupon expiry checks are reproducible.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

/// USD as base plus EUR at ratio 0.8.
pub fn currencies() -> CurrencySet {
    CurrencySet::new([
        Currency {
            tag: "USD".into(),
            symbol: Some("$".into()),
            ratio: dec!(1),
        },
        Currency {
            tag: "EUR".into(),
            symbol: Some("€".into()),
            ratio: dec!(0.8),
        },
    ])
}

/// A plain product: price 100, pre-sale price 150.
pub fn mug() -> Product {
    Product {
        id: "mug".into(),
        name: "Mug".into(),
        sku: Some("MUG-1".into()),
        price: dec!(100),
        old_price: Some(dec!(150)),
        main_image: Some("/mug.png".into()),
        images: vec!["/mug.png".into()],
        description: None,
        stock_amount: Some(10),
        stock_status: StockStatus::InStock,
        main_category_id: Some("kitchen".into()),
        categories: vec![CategorySummary {
            id: "kitchen".into(),
            name: "Kitchen".into(),
        }],
        attributes: Vec::new(),
    }
}

/// A product with a price-overriding color and an image-overriding print.
pub fn tshirt() -> Product {
    Product {
        id: "tshirt".into(),
        name: "T-Shirt".into(),
        sku: Some("TS-1".into()),
        price: dec!(50),
        old_price: None,
        main_image: Some("/tshirt.png".into()),
        images: vec!["/tshirt.png".into()],
        description: Some("Plain tee".into()),
        stock_amount: Some(20),
        stock_status: StockStatus::InStock,
        main_category_id: None,
        categories: Vec::new(),
        attributes: vec![
            AttributeInstance {
                key: "color".into(),
                values: vec![
                    AttributeInstanceValue {
                        value: "black".into(),
                        product_variant: None,
                    },
                    AttributeInstanceValue {
                        value: "glow".into(),
                        product_variant: Some(VariantOverride {
                            price: Some(dec!(65)),
                            ..VariantOverride::default()
                        }),
                    },
                ],
            },
            AttributeInstance {
                key: "print".into(),
                values: vec![AttributeInstanceValue {
                    value: "logo".into(),
                    product_variant: Some(VariantOverride {
                        main_image: Some("/tshirt-logo.png".into()),
                        ..VariantOverride::default()
                    }),
                }],
            },
        ],
    }
}

/// An out-of-stock product.
pub fn poster() -> Product {
    Product {
        id: "poster".into(),
        name: "Poster".into(),
        sku: None,
        price: dec!(15),
        old_price: None,
        main_image: None,
        images: Vec::new(),
        description: None,
        stock_amount: Some(0),
        stock_status: StockStatus::OutOfStock,
        main_category_id: None,
        categories: Vec::new(),
        attributes: Vec::new(),
    }
}

/// Global attribute definitions matching the fixture products.
pub fn attributes() -> Vec<Attribute> {
    vec![
        Attribute {
            key: "color".into(),
            kind: AttributeType::Radio,
            values: vec![
                AttributeValue {
                    value: "black".into(),
                    icon: None,
                },
                AttributeValue {
                    value: "glow".into(),
                    icon: None,
                },
            ],
        },
        Attribute {
            key: "print".into(),
            kind: AttributeType::Checkbox,
            values: vec![AttributeValue {
                value: "logo".into(),
                icon: None,
            }],
        },
    ]
}

/// Coupon set: a percentage, a small and an oversized fixed amount, a
/// single-use code, and an expired one.
pub fn coupons() -> Vec<Coupon> {
    vec![
        Coupon {
            code: "SAVE10".into(),
            discount: CouponDiscount::Percentage(dec!(10)),
            usage_limit: None,
            used_times: 0,
            expiry_date: None,
            minimum_cart_total: None,
        },
        Coupon {
            code: "FLAT5".into(),
            discount: CouponDiscount::FixedAmount(dec!(5)),
            usage_limit: None,
            used_times: 0,
            expiry_date: None,
            minimum_cart_total: None,
        },
        Coupon {
            code: "BIG50".into(),
            discount: CouponDiscount::FixedAmount(dec!(500)),
            usage_limit: None,
            used_times: 0,
            expiry_date: None,
            minimum_cart_total: None,
        },
        Coupon {
            code: "ONCE".into(),
            discount: CouponDiscount::FixedAmount(dec!(20)),
            usage_limit: Some(1),
            used_times: 0,
            expiry_date: None,
            minimum_cart_total: None,
        },
        Coupon {
            code: "BYGONE".into(),
            discount: CouponDiscount::Percentage(dec!(50)),
            usage_limit: None,
            used_times: 0,
            expiry_date: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).single(),
            minimum_cart_total: None,
        },
    ]
}

/// A populated in-memory store.
pub fn store() -> MemoryStore {
    MemoryStore::new()
        .with_products([mug(), tshirt(), poster()])
        .with_attributes(attributes())
        .with_coupons(coupons())
}
