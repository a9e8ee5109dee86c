//! Domain model for the user profile fields the ledger consumes.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The slice of the user profile the purchase workflow reads. The full
/// profile (pet pages, contact directory, ...) lives outside this subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    /// Global override: when set, every coupon purchase costs zero points.
    /// An override on the user, not a property of any coupon.
    #[serde(default)]
    pub free_coupons: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new_default(uid: &str, email: &str) -> Self {
        let now = Utc::now();
        Self {
            uid: uid.to_string(),
            email: email.to_string(),
            free_coupons: false,
            created_at: now,
            updated_at: now,
        }
    }
}
