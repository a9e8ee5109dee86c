//! # Transaction Repository
//!
//! CSV-backed storage for the append-only points log, one
//! `points_transactions.csv` per user. Records are only ever appended; the
//! file order is the chronological order, so listings never re-sort by
//! timestamp (same-millisecond writes would make that ambiguous).

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use csv::{Reader, WriterBuilder};
use log::debug;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter};

use super::connection::CsvConnection;
use crate::domain::models::points::{JsonMetadata, PointsTransaction, TransactionKind};
use crate::storage::traits::TransactionStorage;

const DEFAULT_LIST_LIMIT: usize = 50;
const DEFAULT_REPLAY_LIMIT: usize = 1000;

/// CSV-based transaction repository.
#[derive(Clone)]
pub struct TransactionRepository {
    connection: CsvConnection,
}

impl TransactionRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    /// Read a user's full log in file (append, i.e. chronological) order.
    fn read_transactions(&self, uid: &str) -> Result<Vec<PointsTransaction>> {
        self.connection.ensure_transactions_file_exists(uid)?;
        let file_path = self.connection.get_transactions_file_path(uid)?;

        let file = File::open(&file_path)?;
        let mut csv_reader = Reader::from_reader(BufReader::new(file));

        let mut transactions = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            transactions.push(Self::parse_record(&record)?);
        }

        Ok(transactions)
    }

    fn parse_record(record: &csv::StringRecord) -> Result<PointsTransaction> {
        let field = |idx: usize| record.get(idx).unwrap_or("");

        let kind = field(2)
            .parse::<TransactionKind>()
            .map_err(|e| anyhow::anyhow!(e))?;
        let points = field(3)
            .parse::<i64>()
            .with_context(|| format!("invalid points value: {}", field(3)))?;
        let metadata = if field(5).is_empty() {
            JsonMetadata::new()
        } else {
            serde_json::from_str(field(5)).context("invalid transaction metadata")?
        };
        let created_at = DateTime::parse_from_rfc3339(field(6))
            .with_context(|| format!("invalid created_at timestamp: {}", field(6)))?
            .with_timezone(&Utc);

        Ok(PointsTransaction {
            id: field(0).to_string(),
            user_id: field(1).to_string(),
            kind,
            points,
            description: field(4).to_string(),
            metadata,
            created_at,
        })
    }
}

impl TransactionStorage for TransactionRepository {
    fn append_transaction(&self, transaction: &PointsTransaction) -> Result<()> {
        self.connection
            .ensure_transactions_file_exists(&transaction.user_id)?;
        let file_path = self.connection.get_transactions_file_path(&transaction.user_id)?;

        let file = OpenOptions::new().append(true).open(&file_path)?;
        let mut csv_writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(BufWriter::new(file));

        csv_writer.write_record(&[
            transaction.id.as_str(),
            transaction.user_id.as_str(),
            transaction.kind.as_str(),
            &transaction.points.to_string(),
            transaction.description.as_str(),
            &serde_json::to_string(&transaction.metadata)?,
            &transaction.created_at.to_rfc3339(),
        ])?;
        csv_writer.flush()?;

        debug!(
            "Appended {} transaction of {} points for {}",
            transaction.kind, transaction.points, transaction.user_id
        );
        Ok(())
    }

    fn list_transactions(&self, uid: &str, limit: Option<u32>) -> Result<Vec<PointsTransaction>> {
        let mut transactions = self.read_transactions(uid)?;
        transactions.reverse();
        transactions.truncate(limit.map(|l| l as usize).unwrap_or(DEFAULT_LIST_LIMIT));
        Ok(transactions)
    }

    fn list_transactions_chronological(
        &self,
        uid: &str,
        limit: Option<u32>,
    ) -> Result<Vec<PointsTransaction>> {
        let mut transactions = self.read_transactions(uid)?;
        transactions.truncate(limit.map(|l| l as usize).unwrap_or(DEFAULT_REPLAY_LIMIT));
        Ok(transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_repo() -> (TransactionRepository, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let connection = CsvConnection::new(temp_dir.path()).expect("Failed to create connection");
        (TransactionRepository::new(connection), temp_dir)
    }

    fn transaction(uid: &str, seq: u64, kind: TransactionKind, points: i64) -> PointsTransaction {
        PointsTransaction {
            id: format!("ptx-test-{}", seq),
            user_id: uid.to_string(),
            kind,
            points,
            description: format!("entry {}", seq),
            metadata: JsonMetadata::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_list_transactions_empty_log() {
        let (repo, _temp_dir) = setup_test_repo();
        assert!(repo.list_transactions("user-1", None).unwrap().is_empty());
    }

    #[test]
    fn test_append_and_list_newest_first() {
        let (repo, _temp_dir) = setup_test_repo();
        for seq in 0..3 {
            repo.append_transaction(&transaction("user-1", seq, TransactionKind::AppShare, 10))
                .unwrap();
        }

        let listed = repo.list_transactions("user-1", None).unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].id, "ptx-test-2");
        assert_eq!(listed[2].id, "ptx-test-0");
    }

    #[test]
    fn test_list_respects_limit() {
        let (repo, _temp_dir) = setup_test_repo();
        for seq in 0..5 {
            repo.append_transaction(&transaction("user-1", seq, TransactionKind::AppShare, 10))
                .unwrap();
        }

        let listed = repo.list_transactions("user-1", Some(2)).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, "ptx-test-4");
    }

    #[test]
    fn test_chronological_order_matches_append_order() {
        let (repo, _temp_dir) = setup_test_repo();
        repo.append_transaction(&transaction("user-1", 0, TransactionKind::Registration, 30))
            .unwrap();
        repo.append_transaction(&transaction("user-1", 1, TransactionKind::PrizeClaim, -15))
            .unwrap();

        let listed = repo.list_transactions_chronological("user-1", None).unwrap();
        assert_eq!(listed[0].kind, TransactionKind::Registration);
        assert_eq!(listed[1].kind, TransactionKind::PrizeClaim);
        assert_eq!(listed[1].points, -15);
    }

    #[test]
    fn test_metadata_round_trips_through_csv() {
        let (repo, _temp_dir) = setup_test_repo();
        let mut tx = transaction("user-1", 0, TransactionKind::PrizeClaim, -50);
        tx.metadata
            .insert("coupon_id".to_string(), serde_json::json!("coupon-7"));
        tx.description = "Coupon purchase: Free grooming, \"deluxe\"".to_string();
        repo.append_transaction(&tx).unwrap();

        let listed = repo.list_transactions("user-1", None).unwrap();
        assert_eq!(listed[0].metadata.get("coupon_id").unwrap(), "coupon-7");
        assert_eq!(listed[0].description, tx.description);
    }

    #[test]
    fn test_logs_are_partitioned_by_user() {
        let (repo, _temp_dir) = setup_test_repo();
        repo.append_transaction(&transaction("user-1", 0, TransactionKind::AppShare, 10))
            .unwrap();
        repo.append_transaction(&transaction("user-2", 0, TransactionKind::AppShare, 20))
            .unwrap();

        let listed = repo.list_transactions("user-1", None).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].points, 10);
    }
}
