//! Purchase/redemption workflow and the user coupon ledger.
//!
//! Converts a user's points into owned coupon instances and tracks each
//! instance through its lifecycle. The purchase touches two documents (the
//! balance and the new instance) as two separate writes, not one atomic
//! transaction: when the instance write fails after a successful deduction,
//! a compensating refund credit is appended. A crash between the two leaves
//! the user under-credited until a reconciliation pass runs.

use chrono::Utc;
use log::{error, info, warn};
use shared::AuthUser;

use crate::domain::errors::{LedgerError, LedgerResult};
use crate::domain::models::coupon::{Coupon, UserCoupon, UserCouponStatus};
use crate::domain::models::points::{JsonMetadata, PointCategory};
use crate::domain::points_service::PointsService;
use crate::storage::csv::{CouponCatalogRepository, ProfileRepository, UserCouponRepository};
use crate::storage::{CouponCatalogStorage, CsvConnection, ProfileStorage, UserCouponStorage};

/// Service for purchasing coupons and walking instances through their
/// lifecycle.
#[derive(Clone)]
pub struct CouponService {
    catalog_repository: CouponCatalogRepository,
    user_coupon_repository: UserCouponRepository,
    profile_repository: ProfileRepository,
    points_service: PointsService,
}

impl CouponService {
    pub fn new(connection: CsvConnection) -> Self {
        Self {
            catalog_repository: CouponCatalogRepository::new(connection.clone()),
            user_coupon_repository: UserCouponRepository::new(connection.clone()),
            profile_repository: ProfileRepository::new(connection.clone()),
            points_service: PointsService::new(connection),
        }
    }

    /// Catalog coupons currently purchasable: active and inside their
    /// validity window. This listing filter is the only place the window is
    /// enforced; purchase itself checks existence only.
    pub fn list_available_coupons(&self) -> LedgerResult<Vec<Coupon>> {
        let now = Utc::now();
        let coupons = self.catalog_repository.list_coupons()?;
        Ok(coupons
            .into_iter()
            .filter(|c| c.is_available_at(now))
            .collect())
    }

    /// Purchase a coupon: debit the share category (unless the user's
    /// free-coupons override applies) and grant an owned instance.
    ///
    /// Repeat purchases of the same coupon are allowed; each call yields an
    /// independent instance.
    pub fn purchase_coupon(&self, user: &AuthUser, coupon_id: &str) -> LedgerResult<UserCoupon> {
        let coupon = self
            .catalog_repository
            .get_coupon(coupon_id)?
            .ok_or_else(|| LedgerError::CouponNotFound(coupon_id.to_string()))?;

        let profile = self
            .profile_repository
            .get_or_create_profile(&user.uid, &user.email)?;
        let price = if profile.free_coupons { 0 } else { coupon.points };
        if profile.free_coupons {
            info!(
                "Free-coupons override active for {}; {} costs 0 points",
                user.uid, coupon.id
            );
        }

        if price > 0 {
            let mut metadata = JsonMetadata::new();
            metadata.insert("coupon_id".to_string(), serde_json::json!(coupon.id));
            self.points_service.deduct_from_category(
                user,
                PointCategory::Share,
                price,
                &format!("Coupon purchase: {}", coupon.name),
                metadata,
            )?;
        }

        let user_coupon = UserCoupon {
            id: UserCoupon::generate_id(),
            user_id: user.uid.clone(),
            coupon_id: coupon.id.clone(),
            coupon_code: coupon.description.clone(),
            coupon: coupon.snapshot(),
            purchased_at: Utc::now(),
            status: UserCouponStatus::Active,
            points_deducted: price,
            used_at: None,
            redemption_metadata: JsonMetadata::new(),
        };

        if let Err(e) = self.user_coupon_repository.store_user_coupon(&user_coupon) {
            error!(
                "Failed to store coupon instance for {} after deducting {} points: {}",
                user.uid, price, e
            );
            if price > 0 {
                let mut metadata = JsonMetadata::new();
                metadata.insert("coupon_id".to_string(), serde_json::json!(coupon.id));
                match self.points_service.add_to_category(
                    user,
                    PointCategory::Share,
                    price,
                    &format!("Refund for failed purchase: {}", coupon.name),
                    metadata,
                ) {
                    Ok(_) => info!("Refunded {} points to {}", price, user.uid),
                    // Under-credited until a reconciliation pass runs.
                    Err(refund_err) => error!(
                        "Refund after failed purchase also failed for {}: {}",
                        user.uid, refund_err
                    ),
                }
            }
            return Err(LedgerError::Storage(e));
        }

        info!(
            "User {} purchased coupon {} for {} points (instance {})",
            user.uid, coupon.id, price, user_coupon.id
        );
        Ok(user_coupon)
    }

    /// Instances with status `active`. Deliberately no date filtering:
    /// purchased instances stay active past the catalog's display window
    /// until explicitly used or expired.
    pub fn list_active_coupons(&self, user: &AuthUser) -> LedgerResult<Vec<UserCoupon>> {
        let user_coupons = self.user_coupon_repository.list_user_coupons(&user.uid)?;
        Ok(user_coupons
            .into_iter()
            .filter(|uc| uc.status == UserCouponStatus::Active)
            .collect())
    }

    /// All instances regardless of status, free purchases first, then by
    /// purchase time descending.
    pub fn list_coupon_history(&self, user: &AuthUser) -> LedgerResult<Vec<UserCoupon>> {
        let mut user_coupons = self.user_coupon_repository.list_user_coupons(&user.uid)?;
        user_coupons.sort_by(|a, b| {
            let a_free = a.points_deducted == 0;
            let b_free = b.points_deducted == 0;
            b_free
                .cmp(&a_free)
                .then(b.purchased_at.cmp(&a.purchased_at))
        });
        Ok(user_coupons)
    }

    /// One-way transition to `used`, stamping `used_at` and recording any
    /// redemption metadata. Re-marking an already-used instance overwrites
    /// `used_at`; an expired instance is rejected.
    pub fn mark_as_used(
        &self,
        user: &AuthUser,
        user_coupon_id: &str,
        metadata: JsonMetadata,
    ) -> LedgerResult<UserCoupon> {
        let mut user_coupon = self
            .user_coupon_repository
            .get_user_coupon(&user.uid, user_coupon_id)?
            .ok_or_else(|| LedgerError::UserCouponNotFound(user_coupon_id.to_string()))?;

        if user_coupon.status == UserCouponStatus::Expired {
            return Err(LedgerError::InvalidStatusTransition {
                from: UserCouponStatus::Expired,
                to: UserCouponStatus::Used,
            });
        }
        if user_coupon.status == UserCouponStatus::Used {
            warn!(
                "Coupon instance {} already used; overwriting used_at",
                user_coupon.id
            );
        }

        user_coupon.status = UserCouponStatus::Used;
        user_coupon.used_at = Some(Utc::now());
        user_coupon.redemption_metadata.extend(metadata);
        self.user_coupon_repository.update_user_coupon(&user_coupon)?;
        info!("Coupon instance {} marked used by {}", user_coupon.id, user.uid);
        Ok(user_coupon)
    }

    /// Explicit administrative transition to `expired`. Only `active`
    /// instances qualify; time passing never triggers this on its own.
    pub fn mark_as_expired(
        &self,
        user: &AuthUser,
        user_coupon_id: &str,
    ) -> LedgerResult<UserCoupon> {
        let mut user_coupon = self
            .user_coupon_repository
            .get_user_coupon(&user.uid, user_coupon_id)?
            .ok_or_else(|| LedgerError::UserCouponNotFound(user_coupon_id.to_string()))?;

        if user_coupon.status != UserCouponStatus::Active {
            return Err(LedgerError::InvalidStatusTransition {
                from: user_coupon.status,
                to: UserCouponStatus::Expired,
            });
        }

        user_coupon.status = UserCouponStatus::Expired;
        self.user_coupon_repository.update_user_coupon(&user_coupon)?;
        info!(
            "Coupon instance {} expired for {}",
            user_coupon.id, user.uid
        );
        Ok(user_coupon)
    }
}
