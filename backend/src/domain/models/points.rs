//! Domain models for the points ledger.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Points granted to a brand-new balance when it is created lazily on first read.
pub const REGISTRATION_BONUS_POINTS: i64 = 30;

/// Arbitrary JSON object attached to transactions and redemption records.
pub type JsonMetadata = serde_json::Map<String, serde_json::Value>;

/// The four fixed point-earning buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointCategory {
    Registration,
    Phone,
    Pet,
    Share,
}

impl PointCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointCategory::Registration => "registration",
            PointCategory::Phone => "phone",
            PointCategory::Pet => "pet",
            PointCategory::Share => "share",
        }
    }

    /// Transaction kind recorded when points are earned in this category.
    pub fn earn_kind(&self) -> TransactionKind {
        match self {
            PointCategory::Registration => TransactionKind::Registration,
            PointCategory::Phone => TransactionKind::PhoneVerification,
            PointCategory::Pet => TransactionKind::PetCreation,
            PointCategory::Share => TransactionKind::AppShare,
        }
    }

    /// Transaction kind recorded when points are spent from this category.
    ///
    /// Coupon purchases debit the share category and are logged as prize
    /// claims; deductions from any other category only happen through admin
    /// flows and are logged as adjustments (with the category in metadata,
    /// since the kind alone does not identify it).
    pub fn deduct_kind(&self) -> TransactionKind {
        match self {
            PointCategory::Share => TransactionKind::PrizeClaim,
            _ => TransactionKind::AdminAdjustment,
        }
    }
}

impl fmt::Display for PointCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PointCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registration" => Ok(PointCategory::Registration),
            "phone" => Ok(PointCategory::Phone),
            "pet" => Ok(PointCategory::Pet),
            "share" => Ok(PointCategory::Share),
            other => Err(format!("unknown point category: {}", other)),
        }
    }
}

/// Kind of point-affecting event recorded in the log.
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

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Registration => "registration",
            TransactionKind::PhoneVerification => "phone_verification",
            TransactionKind::PetCreation => "pet_creation",
            TransactionKind::AppShare => "app_share",
            TransactionKind::PetShare => "pet_share",
            TransactionKind::AdminAdjustment => "admin_adjustment",
            TransactionKind::PrizeClaim => "prize_claim",
        }
    }

    /// Category this kind is replayed into during reconciliation, when the
    /// kind alone implies one. Admin adjustments carry their category in
    /// transaction metadata instead.
    pub fn category(&self) -> Option<PointCategory> {
        match self {
            TransactionKind::Registration => Some(PointCategory::Registration),
            TransactionKind::PhoneVerification => Some(PointCategory::Phone),
            TransactionKind::PetCreation => Some(PointCategory::Pet),
            TransactionKind::AppShare | TransactionKind::PetShare | TransactionKind::PrizeClaim => {
                Some(PointCategory::Share)
            }
            TransactionKind::AdminAdjustment => None,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registration" => Ok(TransactionKind::Registration),
            "phone_verification" => Ok(TransactionKind::PhoneVerification),
            "pet_creation" => Ok(TransactionKind::PetCreation),
            "app_share" => Ok(TransactionKind::AppShare),
            "pet_share" => Ok(TransactionKind::PetShare),
            "admin_adjustment" => Ok(TransactionKind::AdminAdjustment),
            "prize_claim" => Ok(TransactionKind::PrizeClaim),
            other => Err(format!("unknown transaction kind: {}", other)),
        }
    }
}

/// Per-category point balances.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsBreakdown {
    pub registration: i64,
    pub phone: i64,
    pub pet: i64,
    pub share: i64,
}

impl PointsBreakdown {
    pub fn total(&self) -> i64 {
        self.registration + self.phone + self.pet + self.share
    }

    pub fn get(&self, category: PointCategory) -> i64 {
        match category {
            PointCategory::Registration => self.registration,
            PointCategory::Phone => self.phone,
            PointCategory::Pet => self.pet,
            PointCategory::Share => self.share,
        }
    }

    pub fn add(&mut self, category: PointCategory, delta: i64) {
        match category {
            PointCategory::Registration => self.registration += delta,
            PointCategory::Phone => self.phone += delta,
            PointCategory::Pet => self.pet += delta,
            PointCategory::Share => self.share += delta,
        }
    }

    /// Recompute category sums by replaying a slice of transactions in order.
    pub fn from_replay(transactions: &[PointsTransaction]) -> Self {
        let mut breakdown = PointsBreakdown::default();
        for transaction in transactions {
            breakdown.add(transaction.replay_category(), transaction.points);
        }
        breakdown
    }
}

/// A user's current balance document. Materialized projection of the
/// transaction log, kept consistent by the points service and repairable
/// via replay when the two drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointsBalance {
    pub uid: String,
    pub email: String,
    pub breakdown: PointsBreakdown,
    pub total_points: i64,
    pub last_updated: DateTime<Utc>,
}

impl PointsBalance {
    /// Default balance synthesized on first read: registration bonus only.
    pub fn new_default(uid: &str, email: &str) -> Self {
        let breakdown = PointsBreakdown {
            registration: REGISTRATION_BONUS_POINTS,
            ..Default::default()
        };
        let total_points = breakdown.total();
        Self {
            uid: uid.to_string(),
            email: email.to_string(),
            breakdown,
            total_points,
            last_updated: Utc::now(),
        }
    }
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
    pub metadata: JsonMetadata,
    pub created_at: DateTime<Utc>,
}

impl PointsTransaction {
    /// Generate a unique transaction ID based on the delta sign and current timestamp.
    /// Format: ptx-<earn|spend>-<timestamp_ms>-<random_suffix>
    /// Example: ptx-earn-1625846400123-af3c
    pub fn generate_id(points: i64, timestamp_ms: u64) -> String {
        let direction = if points >= 0 { "earn" } else { "spend" };
        let random_suffix = Self::generate_random_suffix(4);
        format!("ptx-{}-{}-{}", direction, timestamp_ms, random_suffix)
    }

    pub fn current_timestamp_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    /// Category this transaction is replayed into. Admin adjustments carry
    /// it in metadata; everything else derives it from the kind. Unattributable
    /// entries fall back to share, where all spend activity lives.
    pub fn replay_category(&self) -> PointCategory {
        if let Some(category) = self.kind.category() {
            return category;
        }
        self.metadata
            .get("category")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse::<PointCategory>().ok())
            .unwrap_or(PointCategory::Share)
    }

    fn generate_random_suffix(len: usize) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        format!("{:x}", now % (16_u128.pow(len as u32)))
            .chars()
            .take(len)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transaction(kind: TransactionKind, points: i64, metadata: JsonMetadata) -> PointsTransaction {
        PointsTransaction {
            id: PointsTransaction::generate_id(points, PointsTransaction::current_timestamp_ms()),
            user_id: "user-1".to_string(),
            kind,
            points,
            description: "test".to_string(),
            metadata,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_breakdown_total_sums_all_categories() {
        let breakdown = PointsBreakdown {
            registration: 30,
            phone: 10,
            pet: 10,
            share: 5,
        };
        assert_eq!(breakdown.total(), 55);
    }

    #[test]
    fn test_default_balance_carries_registration_bonus() {
        let balance = PointsBalance::new_default("user-1", "user@example.com");
        assert_eq!(balance.breakdown.registration, REGISTRATION_BONUS_POINTS);
        assert_eq!(balance.breakdown.share, 0);
        assert_eq!(balance.total_points, REGISTRATION_BONUS_POINTS);
    }

    #[test]
    fn test_replay_maps_kinds_to_categories() {
        let transactions = vec![
            transaction(TransactionKind::Registration, 30, JsonMetadata::new()),
            transaction(TransactionKind::PhoneVerification, 10, JsonMetadata::new()),
            transaction(TransactionKind::PetCreation, 10, JsonMetadata::new()),
            transaction(TransactionKind::AppShare, 20, JsonMetadata::new()),
            transaction(TransactionKind::PrizeClaim, -15, JsonMetadata::new()),
        ];
        let breakdown = PointsBreakdown::from_replay(&transactions);
        assert_eq!(breakdown.registration, 30);
        assert_eq!(breakdown.phone, 10);
        assert_eq!(breakdown.pet, 10);
        assert_eq!(breakdown.share, 5);
        assert_eq!(breakdown.total(), 55);
    }

    #[test]
    fn test_admin_adjustment_replays_into_metadata_category() {
        let mut metadata = JsonMetadata::new();
        metadata.insert("category".to_string(), serde_json::json!("pet"));
        let tx = transaction(TransactionKind::AdminAdjustment, -5, metadata);
        assert_eq!(tx.replay_category(), PointCategory::Pet);

        // Without metadata the adjustment falls back to share.
        let tx = transaction(TransactionKind::AdminAdjustment, 5, JsonMetadata::new());
        assert_eq!(tx.replay_category(), PointCategory::Share);
    }

    #[test]
    fn test_generate_id_encodes_direction() {
        let earn = PointsTransaction::generate_id(10, 1625846400123);
        assert!(earn.starts_with("ptx-earn-1625846400123-"));
        let spend = PointsTransaction::generate_id(-10, 1625846400123);
        assert!(spend.starts_with("ptx-spend-1625846400123-"));
    }

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in [
            TransactionKind::Registration,
            TransactionKind::PhoneVerification,
            TransactionKind::PetCreation,
            TransactionKind::AppShare,
            TransactionKind::PetShare,
            TransactionKind::AdminAdjustment,
            TransactionKind::PrizeClaim,
        ] {
            assert_eq!(kind.as_str().parse::<TransactionKind>().unwrap(), kind);
        }
    }
}
