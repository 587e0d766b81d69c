//! Cart totals
//!
//! The orchestrator: sanitizes the submitted cart, prices each line through
//! attribute resolution, resolves coupons, applies shipping, and converts the
//! result to the active currency. [`Pricer::compute_total`] is pure and
//! re-entrant: identical inputs against an unchanged catalog/coupon snapshot
//! produce identical output, and it performs no writes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use smallvec::SmallVec;
use thiserror::Error;
use tracing::debug;

use crate::{
    attributes::{AttributeError, AttributePolicy, ResolvedLine, resolve_line},
    cart::{CartSubmission, sanitize_lines},
    coupons::{apply_coupons, dedup_codes},
    currency::{CurrencyError, CurrencySet},
    money::round2,
    store::{CatalogSource, StoreError},
};

/// Errors raised while computing a cart total.
#[derive(Debug, Error)]
pub enum TotalError {
    /// The requested active currency is unknown or misconfigured.
    #[error(transparent)]
    Currency(#[from] CurrencyError),

    /// A picked attribute was rejected under the strict policy.
    #[error(transparent)]
    Attribute(#[from] AttributeError),

    /// Catalog or coupon lookup failed at the transport level.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Computes the shipping price for a priced cart.
///
/// Injected so cart-level or line-level shipping overrides stay outside the
/// engine; the default store configuration is a flat price.
pub trait ShippingPolicy {
    /// Shipping price, in the base currency unit.
    fn shipping_price(&self, lines: &[ResolvedLine], subtotal: Decimal) -> Decimal;
}

/// Flat shipping price from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlatShipping(pub Decimal);

impl ShippingPolicy for FlatShipping {
    fn shipping_price(&self, _lines: &[ResolvedLine], _subtotal: Decimal) -> Decimal {
        self.0
    }
}

/// A computed cart total.
///
/// Derived value only; recomputed whenever the cart, attributes, or coupons
/// change. Monetary fields are denominated in the active currency and
/// serialize as decimal strings fixed to 2 places.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotal {
    /// Priced lines; submitted lines whose product could not be resolved are
    /// excluded.
    pub cart: Vec<ResolvedLine>,

    /// Sum of "was" line totals, for savings display.
    #[serde(with = "crate::money::serde_price")]
    pub subtotal_old: Decimal,

    /// Sum of line totals before discounts and shipping.
    #[serde(with = "crate::money::serde_price")]
    pub subtotal: Decimal,

    /// Total coupon discount.
    #[serde(with = "crate::money::serde_price")]
    pub discount: Decimal,

    /// Shipping price.
    #[serde(with = "crate::money::serde_price")]
    pub shipping_price: Decimal,

    /// `max(0, subtotal - discount) + shipping_price`, rounded to 2 places.
    #[serde(with = "crate::money::serde_price")]
    pub grand_total: Decimal,

    /// Total quantity across all lines.
    pub quantity_total: u32,

    /// Codes of coupons that actually reduced the total, in submission order.
    pub applied_coupons: SmallVec<[String; 4]>,

    /// Active currency tag, if one was requested.
    pub currency: Option<String>,
}

/// The cart total engine.
///
/// Holds the injected collaborators for one pricing request; owns no cart
/// state between calls.
#[derive(Debug)]
pub struct Pricer<'a, S: CatalogSource + ?Sized, P: ShippingPolicy> {
    store: &'a S,
    currencies: &'a CurrencySet,
    attribute_policy: AttributePolicy,
    shipping: P,
}

impl<'a, S: CatalogSource + ?Sized, P: ShippingPolicy> Pricer<'a, S, P> {
    /// Create a pricer over the given collaborators.
    pub fn new(
        store: &'a S,
        currencies: &'a CurrencySet,
        attribute_policy: AttributePolicy,
        shipping: P,
    ) -> Self {
        Pricer {
            store,
            currencies,
            attribute_policy,
            shipping,
        }
    }

    /// Compute the total for a submitted cart.
    ///
    /// `now` is the instant coupon expiry is judged against; threading it in
    /// keeps the computation a pure function of its inputs.
    ///
    /// # Errors
    ///
    /// - [`TotalError::Currency`]: the requested currency tag is not
    ///   configured or has an invalid ratio.
    /// - [`TotalError::Attribute`]: a picked attribute was rejected under the
    ///   strict policy.
    /// - [`TotalError::Store`]: a lookup failed at the transport level;
    ///   propagated uninterpreted, never retried here.
    pub fn compute_total(
        &self,
        submission: &CartSubmission,
        now: DateTime<Utc>,
    ) -> Result<CartTotal, TotalError> {
        // Resolve the currency up front so an unknown tag fails before any
        // pricing work.
        let rate = match submission.currency.as_deref() {
            Some(tag) => self.currencies.checked(tag)?.ratio,
            None => Decimal::ONE,
        };

        let lines = sanitize_lines(submission.cart.clone());
        let definitions = self.store.attributes()?;

        let mut priced: Vec<ResolvedLine> = Vec::with_capacity(lines.len());
        for line in &lines {
            let Some(product) = self.store.product_by_id(&line.product_id)? else {
                debug!(product_id = %line.product_id, "excluding unresolvable cart line");
                continue;
            };

            priced.push(resolve_line(
                &product,
                line,
                &definitions,
                self.attribute_policy,
            )?);
        }

        let subtotal: Decimal = priced.iter().map(|line| line.line_total).sum();
        let subtotal_old: Decimal = priced.iter().map(|line| line.line_total_old).sum();
        // Quantities are client-supplied; saturate rather than overflow.
        let quantity_total = priced
            .iter()
            .map(|line| line.amount)
            .fold(0_u32, u32::saturating_add);

        let codes = dedup_codes(&submission.coupon_codes);
        let coupons = if codes.is_empty() {
            Vec::new()
        } else {
            self.store.coupons_by_codes(&codes)?
        };
        let outcome = apply_coupons(subtotal, &codes, &coupons, now);

        let shipping = self.shipping.shipping_price(&priced, subtotal);
        let grand_total = (subtotal - outcome.discount).max(Decimal::ZERO) + shipping;

        // Convert everything to the active currency, then round only the
        // emitted aggregate figures.
        for line in &mut priced {
            line.scale_prices(rate);
        }

        Ok(CartTotal {
            cart: priced,
            subtotal_old: round2(subtotal_old * rate),
            subtotal: round2(subtotal * rate),
            discount: round2(outcome.discount * rate),
            shipping_price: round2(shipping * rate),
            grand_total: round2(grand_total * rate),
            quantity_total,
            applied_coupons: outcome.applied_codes,
            currency: submission.currency.clone(),
        })
    }
}
