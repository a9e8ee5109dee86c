//! Domain models for the coupon catalog and purchased coupon instances.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::points::JsonMetadata;

/// A purchasable coupon from the catalog. Read-only from the ledger's
/// perspective; creation and editing belong to the admin panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: String,
    pub name: String,
    /// Doubles as the redemption code shown to the user after purchase.
    pub description: String,
    /// Nominal price in currency, for display only.
    pub price: f64,
    /// Cost in points when purchased through the ledger.
    pub points: i64,
    pub image_url: Option<String>,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub is_active: bool,
    #[serde(default)]
    pub business_ids: Vec<String>,
}

impl Coupon {
    /// Presentation-layer availability check: active and inside the validity
    /// window. Not enforced atomically against concurrent purchases.
    pub fn is_available_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.valid_from <= now && now <= self.valid_to
    }

    /// Denormalized copy stored on each purchased instance, so the instance
    /// survives later catalog edits or deletions.
    pub fn snapshot(&self) -> CouponSnapshot {
        CouponSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            points: self.points,
            image_url: self.image_url.clone(),
            valid_from: self.valid_from,
            valid_to: self.valid_to,
        }
    }
}

/// Frozen copy of a catalog coupon's fields at purchase time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponSnapshot {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub points: i64,
    pub image_url: Option<String>,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
}

/// Lifecycle status of a purchased coupon instance.
///
/// Transitions are monotonic: active -> used, or active -> expired. Passing
/// the snapshot's validity date never flips a status by itself; expiry is an
/// explicit administrative transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserCouponStatus {
    Active,
    Used,
    Expired,
}

impl UserCouponStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserCouponStatus::Active => "active",
            UserCouponStatus::Used => "used",
            UserCouponStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for UserCouponStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserCouponStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(UserCouponStatus::Active),
            "used" => Ok(UserCouponStatus::Used),
            "expired" => Ok(UserCouponStatus::Expired),
            other => Err(format!("unknown user coupon status: {}", other)),
        }
    }
}

/// A user's owned, purchased copy of a catalog coupon, tracked independently
/// of the catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCoupon {
    pub id: String,
    pub user_id: String,
    pub coupon_id: String,
    pub coupon_code: String,
    pub coupon: CouponSnapshot,
    pub purchased_at: DateTime<Utc>,
    pub status: UserCouponStatus,
    /// Points actually deducted at purchase (0 for free-override purchases).
    pub points_deducted: i64,
    pub used_at: Option<DateTime<Utc>>,
    /// Optional redemption metadata, e.g. which business honored the coupon.
    #[serde(default)]
    pub redemption_metadata: JsonMetadata,
}

impl UserCoupon {
    pub fn generate_id() -> String {
        format!("uc-{}", uuid::Uuid::new_v4())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn coupon(is_active: bool, from_offset_days: i64, to_offset_days: i64) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: "coupon-1".to_string(),
            name: "Free grooming".to_string(),
            description: "GROOM-2025".to_string(),
            price: 25.0,
            points: 50,
            image_url: None,
            valid_from: now + Duration::days(from_offset_days),
            valid_to: now + Duration::days(to_offset_days),
            is_active,
            business_ids: vec!["biz-1".to_string()],
        }
    }

    #[test]
    fn test_availability_requires_active_flag_and_window() {
        let now = Utc::now();
        assert!(coupon(true, -1, 1).is_available_at(now));
        assert!(!coupon(false, -1, 1).is_available_at(now));
        assert!(!coupon(true, 1, 2).is_available_at(now));
        assert!(!coupon(true, -2, -1).is_available_at(now));
    }

    #[test]
    fn test_snapshot_copies_catalog_fields() {
        let c = coupon(true, -1, 1);
        let snapshot = c.snapshot();
        assert_eq!(snapshot.id, c.id);
        assert_eq!(snapshot.description, c.description);
        assert_eq!(snapshot.points, c.points);
        assert_eq!(snapshot.valid_to, c.valid_to);
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            UserCouponStatus::Active,
            UserCouponStatus::Used,
            UserCouponStatus::Expired,
        ] {
            assert_eq!(status.as_str().parse::<UserCouponStatus>().unwrap(), status);
        }
    }
}
