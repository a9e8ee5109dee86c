//! Points Store service.
//!
//! Holds the authoritative current balance per user, broken into the four
//! fixed categories, and keeps `total_points` consistent with the breakdown.
//! The transaction log is the source of truth: every mutation here appends a
//! matching log entry, and `recalculate_balance` can rebuild the stored
//! document from a replay when the two drift. The add/deduct path is not
//! serialized against concurrent writers; replay-based reconciliation is the
//! compensating control, not a lock.

use anyhow::Result;
use chrono::Utc;
use log::{info, warn};
use shared::AuthUser;

use crate::domain::errors::{LedgerError, LedgerResult};
use crate::domain::models::points::{
    JsonMetadata, PointCategory, PointsBalance, PointsBreakdown, PointsTransaction,
    TransactionKind, REGISTRATION_BONUS_POINTS,
};
use crate::storage::csv::{BalanceRepository, TransactionRepository};
use crate::storage::{BalanceStorage, CsvConnection, TransactionStorage};

/// How much of the log a replay scans. Far above any realistic per-user
/// transaction count in this app.
const RECONCILIATION_SCAN_LIMIT: u32 = 1000;

/// Service for reading and mutating per-user point balances.
#[derive(Clone)]
pub struct PointsService {
    balance_repository: BalanceRepository,
    transaction_repository: TransactionRepository,
}

impl PointsService {
    pub fn new(connection: CsvConnection) -> Self {
        Self {
            balance_repository: BalanceRepository::new(connection.clone()),
            transaction_repository: TransactionRepository::new(connection),
        }
    }

    /// Return the stored balance, or synthesize and persist the default one
    /// (registration bonus only) if none exists. The bonus is also appended
    /// to the log so a replay reproduces the stored document.
    pub fn get_or_create_balance(&self, user: &AuthUser) -> LedgerResult<PointsBalance> {
        if let Some(balance) = self.balance_repository.get_balance(&user.uid)? {
            return Ok(balance);
        }

        let balance = PointsBalance::new_default(&user.uid, &user.email);
        self.balance_repository.store_balance(&balance)?;
        self.append_log_entry(
            user,
            TransactionKind::Registration,
            REGISTRATION_BONUS_POINTS,
            "Registration bonus",
            JsonMetadata::new(),
        )?;
        info!(
            "Created default balance for {} with {} registration points",
            user.uid, REGISTRATION_BONUS_POINTS
        );
        Ok(balance)
    }

    /// Add `amount` points to one category, recompute the total, persist the
    /// balance, and append a log entry whose kind derives from the category.
    pub fn add_to_category(
        &self,
        user: &AuthUser,
        category: PointCategory,
        amount: i64,
        description: &str,
        metadata: JsonMetadata,
    ) -> LedgerResult<PointsBalance> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let mut balance = self.get_or_create_balance(user)?;
        balance.breakdown.add(category, amount);
        balance.total_points = balance.breakdown.total();
        balance.last_updated = Utc::now();
        self.balance_repository.store_balance(&balance)?;

        self.append_log_entry(user, category.earn_kind(), amount, description, metadata)?;
        info!(
            "Added {} points to {} for {} (total now {})",
            amount, category, user.uid, balance.total_points
        );
        Ok(balance)
    }

    /// Deduct `amount` points from one category. Fails with
    /// [`LedgerError::InsufficientPoints`] before touching anything when the
    /// category holds less than `amount` - a business rule, not a lock:
    /// concurrent deductions from the same user can still race.
    pub fn deduct_from_category(
        &self,
        user: &AuthUser,
        category: PointCategory,
        amount: i64,
        description: &str,
        metadata: JsonMetadata,
    ) -> LedgerResult<PointsBalance> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let mut balance = self.get_or_create_balance(user)?;
        let available = balance.breakdown.get(category);
        if available < amount {
            warn!(
                "Rejected deduction of {} from {} for {}: only {} available",
                amount, category, user.uid, available
            );
            return Err(LedgerError::InsufficientPoints {
                category,
                available,
                requested: amount,
            });
        }

        balance.breakdown.add(category, -amount);
        balance.total_points = balance.breakdown.total();
        balance.last_updated = Utc::now();
        self.balance_repository.store_balance(&balance)?;

        let kind = category.deduct_kind();
        let mut metadata = metadata;
        if kind == TransactionKind::AdminAdjustment {
            // The kind alone does not identify the category on replay.
            metadata.insert(
                "category".to_string(),
                serde_json::json!(category.as_str()),
            );
        }
        self.append_log_entry(user, kind, -amount, description, metadata)?;
        info!(
            "Deducted {} points from {} for {} (total now {})",
            amount, category, user.uid, balance.total_points
        );
        Ok(balance)
    }

    /// Signed administrative adjustment to one category, logged as an
    /// `admin_adjustment` with the category recorded in metadata.
    pub fn admin_adjust(
        &self,
        user: &AuthUser,
        category: PointCategory,
        delta: i64,
        description: &str,
    ) -> LedgerResult<PointsBalance> {
        if delta == 0 {
            return Err(LedgerError::InvalidAmount(delta));
        }

        let mut balance = self.get_or_create_balance(user)?;
        let available = balance.breakdown.get(category);
        if delta < 0 && available < -delta {
            return Err(LedgerError::InsufficientPoints {
                category,
                available,
                requested: -delta,
            });
        }

        balance.breakdown.add(category, delta);
        balance.total_points = balance.breakdown.total();
        balance.last_updated = Utc::now();
        self.balance_repository.store_balance(&balance)?;

        let mut metadata = JsonMetadata::new();
        metadata.insert(
            "category".to_string(),
            serde_json::json!(category.as_str()),
        );
        self.append_log_entry(
            user,
            TransactionKind::AdminAdjustment,
            delta,
            description,
            metadata,
        )?;
        info!(
            "Admin adjustment of {} to {} for {} (total now {})",
            delta, category, user.uid, balance.total_points
        );
        Ok(balance)
    }

    /// List a user's log entries newest-first, capped at `limit` (default 50).
    pub fn list_transactions(
        &self,
        user: &AuthUser,
        limit: Option<u32>,
    ) -> LedgerResult<Vec<PointsTransaction>> {
        Ok(self.transaction_repository.list_transactions(&user.uid, limit)?)
    }

    /// Replay the user's full transaction history, recompute the category
    /// sums, and overwrite the stored balance. Repair tool for documents
    /// that have drifted from the log.
    pub fn recalculate_balance(&self, user: &AuthUser) -> LedgerResult<PointsBalance> {
        let transactions = self
            .transaction_repository
            .list_transactions_chronological(&user.uid, Some(RECONCILIATION_SCAN_LIMIT))?;

        let breakdown = PointsBreakdown::from_replay(&transactions);
        let email = self
            .balance_repository
            .get_balance(&user.uid)?
            .map(|b| b.email)
            .unwrap_or_else(|| user.email.clone());

        let balance = PointsBalance {
            uid: user.uid.clone(),
            email,
            total_points: breakdown.total(),
            breakdown,
            last_updated: Utc::now(),
        };
        self.balance_repository.store_balance(&balance)?;
        info!(
            "Recalculated balance for {} from {} transactions (total {})",
            user.uid,
            transactions.len(),
            balance.total_points
        );
        Ok(balance)
    }

    fn append_log_entry(
        &self,
        user: &AuthUser,
        kind: TransactionKind,
        points: i64,
        description: &str,
        metadata: JsonMetadata,
    ) -> Result<()> {
        let transaction = PointsTransaction {
            id: PointsTransaction::generate_id(points, PointsTransaction::current_timestamp_ms()),
            user_id: user.uid.clone(),
            kind,
            points,
            description: description.to_string(),
            metadata,
            created_at: Utc::now(),
        };
        self.transaction_repository.append_transaction(&transaction)
    }
}
