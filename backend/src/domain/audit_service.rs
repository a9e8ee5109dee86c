//! Balance consistency checker.
//!
//! Compares a user's stored balance document against a replay of their
//! transaction log and reports discrepancies field-by-field. Diagnostic
//! only: it never mutates anything. Drifted documents are repaired with
//! [`PointsService::recalculate_balance`].
//!
//! [`PointsService::recalculate_balance`]: crate::domain::points_service::PointsService::recalculate_balance

use log::{info, warn};
use shared::{AuditDiscrepancy, AuthUser, BalanceAuditReport};

use crate::domain::errors::LedgerResult;
use crate::domain::models::points::PointsBreakdown;
use crate::storage::csv::{BalanceRepository, TransactionRepository};
use crate::storage::{BalanceStorage, CsvConnection, TransactionStorage};

const AUDIT_SCAN_LIMIT: u32 = 1000;

/// Service that validates stored balances against the log.
#[derive(Clone)]
pub struct AuditService {
    balance_repository: BalanceRepository,
    transaction_repository: TransactionRepository,
}

impl AuditService {
    pub fn new(connection: CsvConnection) -> Self {
        Self {
            balance_repository: BalanceRepository::new(connection.clone()),
            transaction_repository: TransactionRepository::new(connection),
        }
    }

    /// Replay the user's log and compare against the stored document.
    /// A missing document is compared against all zeros.
    pub fn check_consistency(&self, user: &AuthUser) -> LedgerResult<BalanceAuditReport> {
        let transactions = self
            .transaction_repository
            .list_transactions_chronological(&user.uid, Some(AUDIT_SCAN_LIMIT))?;
        let replayed = PointsBreakdown::from_replay(&transactions);

        let stored_balance = self.balance_repository.get_balance(&user.uid)?;
        // Compare the persisted total_points field, not a recomputed sum, so
        // a document whose total disagrees with its own breakdown is caught.
        let stored_total = stored_balance.as_ref().map(|b| b.total_points).unwrap_or(0);
        let stored = stored_balance.map(|b| b.breakdown).unwrap_or_default();

        let mut discrepancies = Vec::new();
        let fields = [
            ("registration", stored.registration, replayed.registration),
            ("phone", stored.phone, replayed.phone),
            ("pet", stored.pet, replayed.pet),
            ("share", stored.share, replayed.share),
            ("total", stored_total, replayed.total()),
        ];
        for (field, stored_value, replayed_value) in fields {
            if stored_value != replayed_value {
                discrepancies.push(AuditDiscrepancy {
                    field: field.to_string(),
                    stored: stored_value,
                    replayed: replayed_value,
                });
            }
        }

        if discrepancies.is_empty() {
            info!(
                "Balance for {} is consistent with {} logged transactions",
                user.uid,
                transactions.len()
            );
        } else {
            warn!(
                "Balance for {} has {} discrepancies against the log: {:?}",
                user.uid,
                discrepancies.len(),
                discrepancies
            );
        }

        Ok(BalanceAuditReport {
            uid: user.uid.clone(),
            consistent: discrepancies.is_empty(),
            stored: to_shared_breakdown(&stored),
            stored_total,
            replayed: to_shared_breakdown(&replayed),
            replayed_total: replayed.total(),
            discrepancies,
            transactions_scanned: transactions.len(),
        })
    }
}

fn to_shared_breakdown(breakdown: &PointsBreakdown) -> shared::PointsBreakdown {
    shared::PointsBreakdown {
        registration: breakdown.registration,
        phone: breakdown.phone,
        pet: breakdown.pet,
        share: breakdown.share,
    }
}
