//! Orders
//!
//! Freezes a computed cart total plus customer and payment fields into an
//! immutable order record. The total is always recomputed from a fresh
//! catalog/coupon snapshot immediately before commit, so a preview gone stale
//! (price change, stock change, concurrently exhausted coupon) can never be
//! charged.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{
    attributes::ResolvedLine,
    cart::CartSubmission,
    catalog::StockStatus,
    store::{CatalogSource, OrderStore, OrderStoreError, StoreError},
    totals::{CartTotal, Pricer, ShippingPolicy, TotalError},
};

/// Errors raised while placing an order.
#[derive(Debug, Error)]
pub enum PlaceOrderError {
    /// After re-validation, no submitted line resolved to a product.
    #[error("cart is empty or no product could be resolved")]
    CartEmpty,

    /// A resolved product is out of stock at placement time.
    #[error("product {0} is unavailable")]
    ProductUnavailable(String),

    /// An applied coupon's usage limit was reached by a concurrent placement
    /// and the configured policy is to fail.
    #[error("coupon {0:?} has reached its usage limit")]
    CouponExhausted(String),

    /// Re-validation failed.
    #[error(transparent)]
    Total(#[from] TotalError),

    /// Order persistence failed at the transport level.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What to do when a coupon turns out exhausted between preview and commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExhaustedCouponPolicy {
    /// Fail the placement with [`PlaceOrderError::CouponExhausted`].
    #[default]
    Fail,

    /// Drop the code and re-price; the order goes through without that
    /// discount.
    Drop,
}

/// Customer and payment fields captured at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerFields {
    /// Account id, if the customer is signed in.
    #[serde(default)]
    pub user_id: Option<String>,

    /// Customer name.
    #[serde(default)]
    pub customer_name: Option<String>,

    /// Customer phone.
    #[serde(default)]
    pub customer_phone: Option<String>,

    /// Customer e-mail.
    #[serde(default)]
    pub customer_email: Option<String>,

    /// Delivery address.
    #[serde(default)]
    pub customer_address: Option<String>,

    /// Free-form comment.
    #[serde(default)]
    pub customer_comment: Option<String>,

    /// Chosen shipping method.
    #[serde(default)]
    pub shipping_method: Option<String>,

    /// Chosen payment method.
    #[serde(default)]
    pub payment_method: Option<String>,

    /// Storefront URL the order came from.
    #[serde(default)]
    pub from_url: Option<String>,
}

/// Fulfillment status of an order. Owned by fulfillment after creation; the
/// materializer only ever writes [`OrderStatus::Pending`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Newly placed.
    #[default]
    Pending,

    /// Paid, not yet shipped.
    #[serde(rename = "Awaiting shipment")]
    AwaitingShipment,

    /// Shipped.
    Shipped,

    /// Completed.
    Completed,

    /// Cancelled.
    Cancelled,

    /// Refunded.
    Refunded,
}

/// An immutable order snapshot.
///
/// Denormalized copies of the priced lines plus the cart total figures at the
/// moment of placement; never mutated afterwards except for `status`, which
/// fulfillment owns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Priced lines at placement.
    pub cart: Vec<ResolvedLine>,

    /// Pre-sale cart total, for savings display.
    #[serde(with = "crate::money::serde_price")]
    pub cart_old_total_price: Decimal,

    /// Cart subtotal after discounts, before shipping.
    #[serde(with = "crate::money::serde_price")]
    pub cart_total_price: Decimal,

    /// Total coupon discount.
    #[serde(with = "crate::money::serde_price")]
    pub discount: Decimal,

    /// Shipping price.
    #[serde(with = "crate::money::serde_price")]
    pub shipping_price: Decimal,

    /// Grand total charged.
    #[serde(with = "crate::money::serde_price")]
    pub order_total_price: Decimal,

    /// Total quantity across all lines.
    pub total_qnt: u32,

    /// Coupon codes that reduced this order's total, in submission order.
    pub coupon_codes: Vec<String>,

    /// Fulfillment status; created as [`OrderStatus::Pending`].
    pub status: OrderStatus,

    /// Currency the order is denominated in, if one was requested.
    pub currency: Option<String>,

    /// Customer and payment fields.
    #[serde(flatten)]
    pub customer: CustomerFields,

    /// Placement instant.
    pub create_date: DateTime<Utc>,
}

impl Order {
    /// Materialize an order from a freshly computed total.
    fn from_total(total: &CartTotal, customer: CustomerFields, now: DateTime<Utc>) -> Self {
        Order {
            cart: total.cart.clone(),
            cart_old_total_price: total.subtotal_old,
            cart_total_price: (total.subtotal - total.discount).max(Decimal::ZERO),
            discount: total.discount,
            shipping_price: total.shipping_price,
            order_total_price: total.grand_total,
            total_qnt: total.quantity_total,
            coupon_codes: total.applied_coupons.iter().cloned().collect(),
            status: OrderStatus::Pending,
            currency: total.currency.clone(),
            customer,
            create_date: now,
        }
    }
}

/// Place an order: re-validate, materialize, and commit.
///
/// The total is recomputed from the live store, never reused from a preview.
/// Commit and coupon usage accounting are one atomic operation inside
/// [`OrderStore::create_order`]; if a coupon was exhausted by a concurrent
/// placement the outcome follows `policy`.
///
/// # Errors
///
/// - [`PlaceOrderError::CartEmpty`]: no line resolved to a product.
/// - [`PlaceOrderError::ProductUnavailable`]: a resolved product is out of
///   stock.
/// - [`PlaceOrderError::CouponExhausted`]: an applied coupon ran out and the
///   policy is [`ExhaustedCouponPolicy::Fail`].
/// - [`PlaceOrderError::Total`] / [`PlaceOrderError::Store`]: re-validation
///   or persistence failed.
pub fn place_order<S, P, O>(
    pricer: &Pricer<'_, S, P>,
    orders: &O,
    submission: &CartSubmission,
    customer: CustomerFields,
    policy: ExhaustedCouponPolicy,
    now: DateTime<Utc>,
) -> Result<Order, PlaceOrderError>
where
    S: CatalogSource + ?Sized,
    P: ShippingPolicy,
    O: OrderStore + ?Sized,
{
    let mut submission = submission.clone();

    loop {
        let total = pricer.compute_total(&submission, now)?;

        if total.cart.is_empty() {
            return Err(PlaceOrderError::CartEmpty);
        }

        if let Some(line) = total
            .cart
            .iter()
            .find(|line| line.stock_status == StockStatus::OutOfStock)
        {
            return Err(PlaceOrderError::ProductUnavailable(line.product_id.clone()));
        }

        let order = Order::from_total(&total, customer.clone(), now);

        match orders.create_order(&order) {
            Ok(()) => return Ok(order),
            Err(OrderStoreError::CouponExhausted(code)) => match policy {
                ExhaustedCouponPolicy::Fail => {
                    return Err(PlaceOrderError::CouponExhausted(code));
                }
                ExhaustedCouponPolicy::Drop => {
                    debug!(%code, "coupon exhausted by concurrent placement, re-pricing without it");
                    let folded = code.to_lowercase();
                    submission
                        .coupon_codes
                        .retain(|c| c.to_lowercase() != folded);
                }
            },
            Err(OrderStoreError::Store(error)) => return Err(error.into()),
        }
    }
}
