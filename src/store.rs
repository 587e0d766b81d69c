//! Store
//!
//! The engine's only view of persistence. Catalog and coupon data are read
//! through [`CatalogSource`]; order placement writes through [`OrderStore`],
//! whose implementations must insert the order and bump coupon usage in one
//! atomic operation. [`MemoryStore`] is the reference implementation, used by
//! the test suites.

use std::sync::{Mutex, PoisonError};

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::{
    catalog::{Attribute, Product},
    coupons::Coupon,
    order::Order,
};

/// A transport-level failure from a backing store, propagated uninterpreted.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct StoreError(#[from] Box<dyn std::error::Error + Send + Sync>);

impl StoreError {
    /// Wrap any error as a store failure.
    pub fn new(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        StoreError(error.into())
    }
}

/// Read access to catalog and coupon snapshots.
///
/// "Not found" is expressed as `None` or an empty result, never as an error:
/// the engine excludes missing products and coupons rather than failing the
/// whole request.
pub trait CatalogSource {
    /// Load a product by id.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on transport failure.
    fn product_by_id(&self, id: &str) -> Result<Option<Product>, StoreError>;

    /// Load the global attribute definitions.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on transport failure.
    fn attributes(&self) -> Result<Vec<Attribute>, StoreError>;

    /// Load the coupons matching the given codes (case-insensitive); codes
    /// with no coupon are simply absent from the result.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on transport failure.
    fn coupons_by_codes(&self, codes: &[String]) -> Result<Vec<Coupon>, StoreError>;
}

/// Errors from committing an order.
#[derive(Debug, Error)]
pub enum OrderStoreError {
    /// A coupon's usage limit was reached by a concurrent placement.
    #[error("coupon {0:?} has reached its usage limit")]
    CouponExhausted(String),

    /// Transport failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Write access for order placement.
pub trait OrderStore {
    /// Atomically persist the order and increment `used_times` for every
    /// coupon in `order.coupon_codes`; either both happen or neither does.
    ///
    /// The usage check must be a conditional increment (`used < limit`) at
    /// the storage layer, never a read-then-write pair, so two concurrent
    /// checkouts cannot both consume a coupon's last use.
    ///
    /// # Errors
    ///
    /// - [`OrderStoreError::CouponExhausted`]: a coupon's limit was already
    ///   reached; nothing was written.
    /// - [`OrderStoreError::Store`]: transport failure.
    fn create_order(&self, order: &Order) -> Result<(), OrderStoreError>;
}

/// In-memory store backing the test suites.
#[derive(Debug, Default)]
pub struct MemoryStore {
    products: Vec<Product>,
    attributes: Vec<Attribute>,
    coupons: Mutex<FxHashMap<String, Coupon>>,
    orders: Mutex<Vec<Order>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Add products.
    #[must_use]
    pub fn with_products(mut self, products: impl IntoIterator<Item = Product>) -> Self {
        self.products.extend(products);
        self
    }

    /// Add global attribute definitions.
    #[must_use]
    pub fn with_attributes(mut self, attributes: impl IntoIterator<Item = Attribute>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    /// Add coupons, keyed case-insensitively by code.
    #[must_use]
    pub fn with_coupons(self, coupons: impl IntoIterator<Item = Coupon>) -> Self {
        {
            let mut map = lock(&self.coupons);
            for coupon in coupons {
                map.insert(coupon.code.to_lowercase(), coupon);
            }
        }
        self
    }

    /// Current state of a coupon, if present.
    pub fn coupon(&self, code: &str) -> Option<Coupon> {
        lock(&self.coupons).get(&code.to_lowercase()).cloned()
    }

    /// Orders persisted so far.
    pub fn orders(&self) -> Vec<Order> {
        lock(&self.orders).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CatalogSource for MemoryStore {
    fn product_by_id(&self, id: &str) -> Result<Option<Product>, StoreError> {
        Ok(self.products.iter().find(|product| product.id == id).cloned())
    }

    fn attributes(&self) -> Result<Vec<Attribute>, StoreError> {
        Ok(self.attributes.clone())
    }

    fn coupons_by_codes(&self, codes: &[String]) -> Result<Vec<Coupon>, StoreError> {
        let coupons = lock(&self.coupons);

        Ok(codes
            .iter()
            .filter_map(|code| coupons.get(&code.to_lowercase()).cloned())
            .collect())
    }
}

impl OrderStore for MemoryStore {
    fn create_order(&self, order: &Order) -> Result<(), OrderStoreError> {
        // One lock across check and increment stands in for the storage
        // layer's conditional update.
        let mut coupons = lock(&self.coupons);

        for code in &order.coupon_codes {
            if let Some(coupon) = coupons.get(&code.to_lowercase()) {
                if coupon.is_exhausted() {
                    return Err(OrderStoreError::CouponExhausted(coupon.code.clone()));
                }
            }
        }

        for code in &order.coupon_codes {
            if let Some(coupon) = coupons.get_mut(&code.to_lowercase()) {
                coupon.used_times += 1;
            }
        }

        lock(&self.orders).push(order.clone());

        Ok(())
    }
}
