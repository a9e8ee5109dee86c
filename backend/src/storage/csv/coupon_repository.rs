//! # Coupon Catalog Repository
//!
//! YAML-backed coupon catalog, a single `coupons.yaml` at the data root.
//! The ledger only reads it; `store_coupon` exists for admin seeding and
//! tests. Writes are atomic: temp file, then rename.

use anyhow::Result;
use log::{debug, info};
use std::fs;

use super::connection::CsvConnection;
use crate::domain::models::coupon::Coupon;
use crate::storage::traits::CouponCatalogStorage;

/// YAML-backed catalog repository.
#[derive(Clone)]
pub struct CouponCatalogRepository {
    connection: CsvConnection,
}

impl CouponCatalogRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn load_catalog(&self) -> Result<Vec<Coupon>> {
        let path = self.connection.get_catalog_file_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let yaml_content = fs::read_to_string(&path)?;
        let coupons: Vec<Coupon> = serde_yaml::from_str(&yaml_content)?;
        debug!("Loaded {} catalog coupons from {:?}", coupons.len(), path);
        Ok(coupons)
    }

    fn save_catalog(&self, coupons: &[Coupon]) -> Result<()> {
        let path = self.connection.get_catalog_file_path();
        let yaml_content = serde_yaml::to_string(coupons)?;

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, yaml_content)?;
        fs::rename(&temp_path, &path)?;
        Ok(())
    }
}

impl CouponCatalogStorage for CouponCatalogRepository {
    fn get_coupon(&self, coupon_id: &str) -> Result<Option<Coupon>> {
        let coupons = self.load_catalog()?;
        Ok(coupons.into_iter().find(|c| c.id == coupon_id))
    }

    fn list_coupons(&self) -> Result<Vec<Coupon>> {
        self.load_catalog()
    }

    fn store_coupon(&self, coupon: &Coupon) -> Result<()> {
        let mut coupons = self.load_catalog()?;
        match coupons.iter_mut().find(|c| c.id == coupon.id) {
            Some(existing) => *existing = coupon.clone(),
            None => coupons.push(coupon.clone()),
        }
        self.save_catalog(&coupons)?;
        info!("Stored catalog coupon {}", coupon.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn setup_test_repo() -> (CouponCatalogRepository, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let connection = CsvConnection::new(temp_dir.path()).expect("Failed to create connection");
        (CouponCatalogRepository::new(connection), temp_dir)
    }

    fn coupon(id: &str, points: i64) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: id.to_string(),
            name: format!("Coupon {}", id),
            description: format!("CODE-{}", id),
            price: 10.0,
            points,
            image_url: None,
            valid_from: now - Duration::days(1),
            valid_to: now + Duration::days(30),
            is_active: true,
            business_ids: Vec::new(),
        }
    }

    #[test]
    fn test_empty_catalog_lists_nothing() {
        let (repo, _temp_dir) = setup_test_repo();
        assert!(repo.list_coupons().unwrap().is_empty());
        assert!(repo.get_coupon("missing").unwrap().is_none());
    }

    #[test]
    fn test_store_and_get_coupon() {
        let (repo, _temp_dir) = setup_test_repo();
        repo.store_coupon(&coupon("c1", 50)).unwrap();
        repo.store_coupon(&coupon("c2", 75)).unwrap();

        let loaded = repo.get_coupon("c2").unwrap().unwrap();
        assert_eq!(loaded.points, 75);
        assert_eq!(repo.list_coupons().unwrap().len(), 2);
    }

    #[test]
    fn test_store_replaces_coupon_with_same_id() {
        let (repo, _temp_dir) = setup_test_repo();
        repo.store_coupon(&coupon("c1", 50)).unwrap();

        let mut updated = coupon("c1", 50);
        updated.is_active = false;
        repo.store_coupon(&updated).unwrap();

        let loaded = repo.get_coupon("c1").unwrap().unwrap();
        assert!(!loaded.is_active);
        assert_eq!(repo.list_coupons().unwrap().len(), 1);
    }
}
