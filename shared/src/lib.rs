use serde::{Deserialize, Serialize};

/// Opaque authenticated-user handle supplied by the auth collaborator.
///
/// Every ledger operation takes this explicitly instead of reading an
/// ambient "current user" context, so callers (and tests) stay in control
/// of whose ledger is being touched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
}

impl AuthUser {
    pub fn new(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
        }
    }
}

/// Per-category point balances for a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointsBreakdown {
    pub registration: i64,
    pub phone: i64,
    pub pet: i64,
    pub share: i64,
}

/// A user's current point balance, broken down by earning category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointsBalance {
    pub uid: String,
    pub email: String,
    pub breakdown: PointsBreakdown,
    /// Always equals the sum of the four category balances.
    pub total_points: i64,
    /// RFC 3339 timestamp of the last mutation.
    pub last_updated: String,
}

/// Transaction kinds recorded in the points log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Registration,
    PhoneVerification,
    PetCreation,
    AppShare,
    PetShare,
    AdminAdjustment,
    PrizeClaim,
}

/// One append-only entry in a user's points log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointsTransaction {
    pub id: String,
    pub user_id: String,
    pub kind: TransactionKind,
    /// Signed point delta (positive for earns, negative for spends).
    pub points: i64,
    pub description: String,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// RFC 3339 timestamp.
    pub created_at: String,
}

/// A purchasable coupon from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: String,
    pub name: String,
    /// Doubles as the redemption code shown after purchase.
    pub description: String,
    /// Nominal price in currency, for display only.
    pub price: f64,
    /// Cost in points when purchased through the ledger.
    pub points: i64,
    pub image_url: Option<String>,
    /// RFC 3339 start of the validity window.
    pub valid_from: String,
    /// RFC 3339 end of the validity window.
    pub valid_to: String,
    pub is_active: bool,
    #[serde(default)]
    pub business_ids: Vec<String>,
}

/// Denormalized copy of the catalog coupon stored on each purchased instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponSnapshot {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub points: i64,
    pub image_url: Option<String>,
    pub valid_from: String,
    pub valid_to: String,
}

/// Lifecycle status of a purchased coupon instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserCouponStatus {
    Active,
    Used,
    Expired,
}

/// A user's owned, purchased copy of a catalog coupon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCoupon {
    pub id: String,
    pub user_id: String,
    pub coupon_id: String,
    pub coupon_code: String,
    pub coupon: CouponSnapshot,
    /// RFC 3339 timestamp of the purchase.
    pub purchased_at: String,
    pub status: UserCouponStatus,
    /// Points actually deducted at purchase time (0 for free-override purchases).
    pub points_deducted: i64,
    /// RFC 3339 timestamp, set when the coupon is marked used.
    pub used_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionListResponse {
    pub transactions: Vec<PointsTransaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecalculateBalanceRequest {
    pub uid: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseCouponRequest {
    pub uid: String,
    pub email: String,
    pub coupon_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseCouponResponse {
    pub user_coupon: UserCoupon,
    /// Points actually deducted (0 when the free-coupons override applied).
    pub points_deducted: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkCouponUsedRequest {
    pub uid: String,
    pub email: String,
    /// Optional redemption metadata, e.g. which business honored the coupon.
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpireCouponRequest {
    pub uid: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCouponListResponse {
    pub user_coupons: Vec<UserCoupon>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponListResponse {
    pub coupons: Vec<Coupon>,
}

/// One stored-vs-replayed mismatch found by the consistency checker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditDiscrepancy {
    /// Balance field the mismatch was found in (category name or "total").
    pub field: String,
    pub stored: i64,
    pub replayed: i64,
}

/// Field-by-field comparison of a stored balance against a log replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceAuditReport {
    pub uid: String,
    pub consistent: bool,
    pub stored: PointsBreakdown,
    pub stored_total: i64,
    pub replayed: PointsBreakdown,
    pub replayed_total: i64,
    pub discrepancies: Vec<AuditDiscrepancy>,
    pub transactions_scanned: usize,
}

/// Error body returned by the REST layer.
///
/// Business-rule violations carry a specific, actionable message;
/// infrastructure failures a generic one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}
