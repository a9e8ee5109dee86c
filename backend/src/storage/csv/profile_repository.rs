//! # Profile Repository
//!
//! File-based storage for the profile fields the ledger consumes, one
//! `profile.yaml` per user directory. The purchase workflow only reads the
//! `free_coupons` override from here.

use anyhow::Result;
use log::{debug, info};
use std::fs;

use super::connection::CsvConnection;
use crate::domain::models::profile::UserProfile;
use crate::storage::traits::ProfileStorage;

/// YAML-backed profile repository.
#[derive(Clone)]
pub struct ProfileRepository {
    connection: CsvConnection,
}

impl ProfileRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }
}

impl ProfileStorage for ProfileRepository {
    fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>> {
        let path = self.connection.get_profile_file_path(uid)?;
        if !path.exists() {
            return Ok(None);
        }

        let yaml_content = fs::read_to_string(&path)?;
        let profile: UserProfile = serde_yaml::from_str(&yaml_content)?;
        debug!("Loaded profile for {} from {:?}", uid, path);
        Ok(Some(profile))
    }

    fn get_or_create_profile(&self, uid: &str, email: &str) -> Result<UserProfile> {
        if let Some(profile) = self.get_profile(uid)? {
            return Ok(profile);
        }

        let profile = UserProfile::new_default(uid, email);
        self.store_profile(&profile)?;
        info!("Created default profile for {}", uid);
        Ok(profile)
    }

    fn store_profile(&self, profile: &UserProfile) -> Result<()> {
        self.connection.ensure_user_directory_exists(&profile.uid)?;
        let path = self.connection.get_profile_file_path(&profile.uid)?;

        let yaml_content = serde_yaml::to_string(profile)?;
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, yaml_content)?;
        fs::rename(&temp_path, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_repo() -> (ProfileRepository, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let connection = CsvConnection::new(temp_dir.path()).expect("Failed to create connection");
        (ProfileRepository::new(connection), temp_dir)
    }

    #[test]
    fn test_get_or_create_defaults_free_coupons_off() {
        let (repo, _temp_dir) = setup_test_repo();
        let profile = repo
            .get_or_create_profile("user-1", "user@example.com")
            .unwrap();
        assert!(!profile.free_coupons);
        assert_eq!(profile.email, "user@example.com");

        // Second call reads the persisted document instead of recreating it.
        let again = repo
            .get_or_create_profile("user-1", "other@example.com")
            .unwrap();
        assert_eq!(again.email, "user@example.com");
        assert_eq!(again.created_at, profile.created_at);
    }

    #[test]
    fn test_store_persists_free_coupons_override() {
        let (repo, _temp_dir) = setup_test_repo();
        let mut profile = repo
            .get_or_create_profile("user-1", "user@example.com")
            .unwrap();
        profile.free_coupons = true;
        repo.store_profile(&profile).unwrap();

        let loaded = repo.get_profile("user-1").unwrap().unwrap();
        assert!(loaded.free_coupons);
    }
}
