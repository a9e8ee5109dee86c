//! # Balance Repository
//!
//! File-based storage for per-user balance documents, one `balance.yaml`
//! per user directory. Writes are atomic: temp file, then rename.

use anyhow::Result;
use log::debug;
use std::fs;

use super::connection::CsvConnection;
use crate::domain::models::points::PointsBalance;
use crate::storage::traits::BalanceStorage;

/// YAML-backed balance repository.
#[derive(Clone)]
pub struct BalanceRepository {
    connection: CsvConnection,
}

impl BalanceRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }
}

impl BalanceStorage for BalanceRepository {
    fn get_balance(&self, uid: &str) -> Result<Option<PointsBalance>> {
        let path = self.connection.get_balance_file_path(uid)?;
        if !path.exists() {
            return Ok(None);
        }

        let yaml_content = fs::read_to_string(&path)?;
        let balance: PointsBalance = serde_yaml::from_str(&yaml_content)?;
        debug!("Loaded balance for {} from {:?}", uid, path);
        Ok(Some(balance))
    }

    fn store_balance(&self, balance: &PointsBalance) -> Result<()> {
        self.connection.ensure_user_directory_exists(&balance.uid)?;
        let path = self.connection.get_balance_file_path(&balance.uid)?;

        let yaml_content = serde_yaml::to_string(balance)?;
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, yaml_content)?;
        fs::rename(&temp_path, &path)?;

        debug!("Saved balance for {} to {:?}", balance.uid, path);
        Ok(())
    }
}
