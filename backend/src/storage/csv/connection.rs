//! # File Store Connection
//!
//! `CsvConnection` manages the data directory layout and ensures the
//! per-user files exist before repositories touch them.
//!
//! ## File Structure
//!
//! ```text
//! data/
//! ├── coupons.yaml                ← catalog (read-only to the ledger)
//! └── users/
//!     └── {uid}/
//!         ├── balance.yaml
//!         ├── profile.yaml
//!         ├── points_transactions.csv
//!         └── user_coupons.csv
//! ```

use anyhow::{bail, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

pub(crate) const TRANSACTIONS_CSV_HEADER: &[&str] = &[
    "id",
    "user_id",
    "kind",
    "points",
    "description",
    "metadata",
    "created_at",
];

pub(crate) const USER_COUPONS_CSV_HEADER: &[&str] = &[
    "id",
    "user_id",
    "coupon_id",
    "coupon_code",
    "coupon",
    "purchased_at",
    "status",
    "points_deducted",
    "used_at",
    "redemption_metadata",
];

/// Manages file paths under the base data directory.
#[derive(Clone)]
pub struct CsvConnection {
    base_directory: PathBuf,
}

impl CsvConnection {
    /// Create a connection rooted at `base_directory`, creating it if needed.
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path)?;
            info!("Created data directory: {}", base_path.display());
        }

        Ok(Self {
            base_directory: base_path,
        })
    }

    /// Create a connection in the default data directory, honoring the
    /// `FACEPET_DATA_DIR` environment variable.
    pub fn new_default() -> Result<Self> {
        let data_dir = std::env::var("FACEPET_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("facepet-data"));
        Self::new(data_dir)
    }

    /// Get the base data directory path.
    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    /// Get the catalog file path.
    pub fn get_catalog_file_path(&self) -> PathBuf {
        self.base_directory.join("coupons.yaml")
    }

    /// Get the directory holding one user's ledger files. Fails on ids that
    /// are not filesystem-safe; stripping characters instead would let two
    /// distinct ids collide onto one directory and share a ledger.
    pub fn get_user_directory(&self, uid: &str) -> Result<PathBuf> {
        Self::validate_uid(uid)?;
        Ok(self.base_directory.join("users").join(uid))
    }

    pub fn get_balance_file_path(&self, uid: &str) -> Result<PathBuf> {
        Ok(self.get_user_directory(uid)?.join("balance.yaml"))
    }

    pub fn get_profile_file_path(&self, uid: &str) -> Result<PathBuf> {
        Ok(self.get_user_directory(uid)?.join("profile.yaml"))
    }

    pub fn get_transactions_file_path(&self, uid: &str) -> Result<PathBuf> {
        Ok(self.get_user_directory(uid)?.join("points_transactions.csv"))
    }

    pub fn get_user_coupons_file_path(&self, uid: &str) -> Result<PathBuf> {
        Ok(self.get_user_directory(uid)?.join("user_coupons.csv"))
    }

    /// Create the user directory if it does not exist yet.
    pub fn ensure_user_directory_exists(&self, uid: &str) -> Result<()> {
        let user_dir = self.get_user_directory(uid)?;
        if !user_dir.exists() {
            fs::create_dir_all(&user_dir)?;
        }
        Ok(())
    }

    /// Ensure the transaction log exists with its header row.
    pub fn ensure_transactions_file_exists(&self, uid: &str) -> Result<()> {
        self.ensure_user_directory_exists(uid)?;
        let file_path = self.get_transactions_file_path(uid)?;
        if !file_path.exists() {
            fs::write(&file_path, format!("{}\n", TRANSACTIONS_CSV_HEADER.join(",")))?;
        }
        Ok(())
    }

    /// Ensure the user-coupons file exists with its header row.
    pub fn ensure_user_coupons_file_exists(&self, uid: &str) -> Result<()> {
        self.ensure_user_directory_exists(uid)?;
        let file_path = self.get_user_coupons_file_path(uid)?;
        if !file_path.exists() {
            fs::write(&file_path, format!("{}\n", USER_COUPONS_CSV_HEADER.join(",")))?;
        }
        Ok(())
    }

    /// User ids become directory names, so only alphanumerics, `-` and `_`
    /// are accepted.
    fn validate_uid(uid: &str) -> Result<()> {
        if uid.is_empty() {
            bail!("user id must not be empty");
        }
        if !uid
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            bail!("user id contains characters unsafe for storage: {}", uid);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_connection() -> (CsvConnection, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let connection = CsvConnection::new(temp_dir.path()).expect("Failed to create connection");
        (connection, temp_dir)
    }

    #[test]
    fn test_new_creates_base_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested").join("data");
        let connection = CsvConnection::new(&nested).unwrap();
        assert!(nested.exists());
        assert_eq!(connection.base_directory(), nested.as_path());
    }

    #[test]
    fn test_user_file_paths_live_under_users_directory() {
        let (connection, _temp_dir) = create_test_connection();
        let balance_path = connection.get_balance_file_path("user-123").unwrap();
        assert!(balance_path.ends_with("users/user-123/balance.yaml"));
        let tx_path = connection.get_transactions_file_path("user-123").unwrap();
        assert!(tx_path.ends_with("users/user-123/points_transactions.csv"));
    }

    #[test]
    fn test_unsafe_user_ids_are_rejected_not_sanitized() {
        let (connection, _temp_dir) = create_test_connection();
        // Stripping characters would map distinct ids (e.g. "user.1" and
        // "user1") onto one directory; such ids must error instead.
        assert!(connection.get_user_directory("../evil/uid").is_err());
        assert!(connection.get_user_directory("user.1").is_err());
        assert!(connection.get_user_directory("").is_err());
        assert!(connection.ensure_user_directory_exists("user 1").is_err());
        assert!(connection.get_user_directory("user-1_A").is_ok());
    }

    #[test]
    fn test_ensure_transactions_file_writes_header_once() {
        let (connection, _temp_dir) = create_test_connection();
        connection.ensure_transactions_file_exists("user-1").unwrap();
        let path = connection.get_transactions_file_path("user-1").unwrap();
        assert!(path.exists());

        let header = std::fs::read_to_string(&path).unwrap();
        assert!(header.starts_with("id,user_id,kind,points"));

        // A second call must not truncate existing content.
        std::fs::write(&path, format!("{}extra", header)).unwrap();
        connection.ensure_transactions_file_exists("user-1").unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.ends_with("extra"));
    }

    #[test]
    fn test_ensure_user_coupons_file_writes_header() {
        let (connection, _temp_dir) = create_test_connection();
        connection.ensure_user_coupons_file_exists("user-1").unwrap();
        let content =
            std::fs::read_to_string(connection.get_user_coupons_file_path("user-1").unwrap())
                .unwrap();
        assert!(content.starts_with("id,user_id,coupon_id,coupon_code,coupon"));
    }
}
