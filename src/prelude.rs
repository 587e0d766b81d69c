//! Till prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    attributes::{AttributeError, AttributePolicy, ResolvedLine},
    cart::{CartLine, CartSubmission},
    catalog::{Attribute, AttributeInstance, Product, StockStatus, VariantOverride},
    coupons::{Coupon, CouponDiscount, CouponOutcome},
    currency::{Currency, CurrencyError, CurrencySet},
    order::{
        CustomerFields, ExhaustedCouponPolicy, Order, OrderStatus, PlaceOrderError, place_order,
    },
    store::{CatalogSource, MemoryStore, OrderStore, OrderStoreError, StoreError},
    totals::{CartTotal, FlatShipping, Pricer, ShippingPolicy, TotalError},
};
