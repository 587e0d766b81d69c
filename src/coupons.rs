//! Coupons
//!
//! Coupon records and the stacking resolver. Coupons apply sequentially, in
//! the order the customer listed them, each against the running discounted
//! subtotal; percentages compound and fixed amounts subtract flat. The
//! running subtotal is floored at zero after every step.
//!
//! The resolver never touches `used_times`: usage accounting is an atomic
//! conditional increment at the storage layer, performed together with the
//! order insert (see [`crate::store::OrderStore`]).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::debug;

/// Discount kind and value of a coupon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "discountType", content = "value", rename_all = "camelCase")]
pub enum CouponDiscount {
    /// Percentage of the running subtotal, e.g. `10` for 10% off.
    Percentage(Decimal),

    /// Fixed amount off, in the base currency unit.
    FixedAmount(Decimal),
}

/// An admin-created coupon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    /// Unique code, matched case-insensitively.
    pub code: String,

    /// Discount kind and value.
    #[serde(flatten)]
    pub discount: CouponDiscount,

    /// Maximum number of successful orders this coupon may be applied to.
    #[serde(default)]
    pub usage_limit: Option<u32>,

    /// Number of successful orders this coupon has been applied to.
    #[serde(default)]
    pub used_times: u32,

    /// Instant after which the coupon no longer applies.
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,

    /// Minimum pre-discount cart subtotal, in the base currency unit.
    #[serde(default)]
    pub minimum_cart_total: Option<Decimal>,
}

impl Coupon {
    /// Whether the usage limit has been reached.
    pub fn is_exhausted(&self) -> bool {
        self.usage_limit
            .is_some_and(|limit| self.used_times >= limit)
    }

    /// Whether the coupon may apply to a cart with the given pre-discount
    /// subtotal at the given instant.
    pub fn is_eligible(&self, subtotal: Decimal, now: DateTime<Utc>) -> bool {
        if self.is_exhausted() {
            return false;
        }
        if self.expiry_date.is_some_and(|expiry| now > expiry) {
            return false;
        }
        !self.minimum_cart_total.is_some_and(|min| subtotal < min)
    }
}

/// Result of resolving a list of coupon codes against a cart subtotal.
#[derive(Debug, Clone, PartialEq)]
pub struct CouponOutcome {
    /// Total discount across all applied coupons.
    pub discount: Decimal,

    /// Canonical codes of coupons that actually reduced the total, in
    /// submission order.
    pub applied_codes: SmallVec<[String; 4]>,
}

/// Deduplicate submitted codes case-insensitively, preserving the first
/// occurrence and its spelling.
pub fn dedup_codes(codes: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(codes.len());
    let mut out = Vec::with_capacity(codes.len());

    for code in codes {
        let folded = code.to_lowercase();
        if !seen.contains(&folded) {
            seen.push(folded);
            out.push(code.clone());
        }
    }

    out
}

/// Resolve coupon codes against a pre-discount subtotal.
///
/// Codes are deduplicated case-insensitively; unknown, expired, exhausted, or
/// otherwise ineligible codes are dropped silently so a stale coupon never
/// blocks pricing. Eligibility (including the minimum-cart constraint) is
/// always judged against the pre-discount subtotal; the discount amount of
/// each applied coupon is computed against the running discounted subtotal.
pub fn apply_coupons(
    subtotal: Decimal,
    codes: &[String],
    coupons: &[Coupon],
    now: DateTime<Utc>,
) -> CouponOutcome {
    let mut running = subtotal.max(Decimal::ZERO);
    let mut applied_codes = SmallVec::new();

    for code in dedup_codes(codes) {
        // Same Unicode folding as `dedup_codes` and the storage lookup key.
        let folded = code.to_lowercase();
        let Some(coupon) = coupons
            .iter()
            .find(|coupon| coupon.code.to_lowercase() == folded)
        else {
            debug!(%code, "dropping unknown coupon code");
            continue;
        };

        if !coupon.is_eligible(subtotal, now) {
            debug!(code = %coupon.code, "dropping ineligible coupon");
            continue;
        }

        let reduction = match coupon.discount {
            CouponDiscount::Percentage(percent) => running * percent / dec!(100),
            CouponDiscount::FixedAmount(amount) => amount,
        };

        // Floor at zero: a coupon can never drive the subtotal negative.
        let reduction = reduction.clamp(Decimal::ZERO, running);

        if reduction > Decimal::ZERO {
            running -= reduction;
            applied_codes.push(coupon.code.clone());
        }
    }

    CouponOutcome {
        discount: subtotal.max(Decimal::ZERO) - running,
        applied_codes,
    }
}
