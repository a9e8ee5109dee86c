//! # Storage Traits
//!
//! Storage abstraction traits that let the domain layer work against
//! different backends without modification. The shipped implementation is
//! file-backed (YAML documents plus CSV logs); the original deployment
//! target is a managed document store, and these traits are the seam where
//! such a client would plug in.

use anyhow::Result;

use crate::domain::models::coupon::{Coupon, UserCoupon};
use crate::domain::models::points::{PointsBalance, PointsTransaction};
use crate::domain::models::profile::UserProfile;

/// Interface for balance-document storage, keyed by user id.
pub trait BalanceStorage: Send + Sync {
    /// Retrieve a user's balance document, if one exists.
    fn get_balance(&self, uid: &str) -> Result<Option<PointsBalance>>;

    /// Persist a balance document, overwriting any previous version.
    fn store_balance(&self, balance: &PointsBalance) -> Result<()>;
}

/// Interface for the append-only transaction log.
///
/// There is deliberately no update or delete operation: once written, a
/// record is never mutated in normal operation.
pub trait TransactionStorage: Send + Sync {
    /// Append one record to the user's log.
    fn append_transaction(&self, transaction: &PointsTransaction) -> Result<()>;

    /// List records newest-first, capped at `limit` (default 50).
    fn list_transactions(&self, uid: &str, limit: Option<u32>)
        -> Result<Vec<PointsTransaction>>;

    /// List records oldest-first for replay, capped at `limit` (default 1000).
    fn list_transactions_chronological(
        &self,
        uid: &str,
        limit: Option<u32>,
    ) -> Result<Vec<PointsTransaction>>;
}

/// Interface for the coupon catalog, read-only from the ledger's point of
/// view. `store_coupon` exists for admin seeding and tests.
pub trait CouponCatalogStorage: Send + Sync {
    /// Retrieve a specific catalog coupon by id.
    fn get_coupon(&self, coupon_id: &str) -> Result<Option<Coupon>>;

    /// List the whole catalog, unfiltered.
    fn list_coupons(&self) -> Result<Vec<Coupon>>;

    /// Insert or replace a catalog coupon.
    fn store_coupon(&self, coupon: &Coupon) -> Result<()>;
}

/// Interface for purchased coupon instances.
pub trait UserCouponStorage: Send + Sync {
    /// Store a new purchased instance.
    fn store_user_coupon(&self, user_coupon: &UserCoupon) -> Result<()>;

    /// Retrieve a specific instance by id.
    fn get_user_coupon(&self, uid: &str, user_coupon_id: &str) -> Result<Option<UserCoupon>>;

    /// List all of a user's instances in purchase order.
    fn list_user_coupons(&self, uid: &str) -> Result<Vec<UserCoupon>>;

    /// Replace an existing instance (used for lifecycle transitions).
    fn update_user_coupon(&self, user_coupon: &UserCoupon) -> Result<()>;
}

/// Interface for the profile fields the ledger consumes.
pub trait ProfileStorage: Send + Sync {
    /// Retrieve a user's profile, if one exists.
    fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>>;

    /// Retrieve a user's profile, creating and persisting the default
    /// (free-coupons off) when none exists.
    fn get_or_create_profile(&self, uid: &str, email: &str) -> Result<UserProfile>;

    /// Persist a profile, overwriting any previous version.
    fn store_profile(&self, profile: &UserProfile) -> Result<()>;
}
