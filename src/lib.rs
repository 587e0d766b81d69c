//! Till
//!
//! Till is a cart pricing and coupon resolution engine for storefront
//! checkouts: it resolves a client-submitted cart into priced line items,
//! applies attribute-driven variant overrides, stacks coupon discounts,
//! converts to the active currency, and materializes immutable orders.

pub mod attributes;
pub mod cart;
pub mod catalog;
pub mod coupons;
pub mod currency;
pub mod fixtures;
pub mod money;
pub mod order;
pub mod prelude;
pub mod store;
pub mod totals;
