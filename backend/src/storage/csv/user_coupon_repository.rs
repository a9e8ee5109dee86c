//! # User Coupon Repository
//!
//! CSV-backed storage for purchased coupon instances, one `user_coupons.csv`
//! per user. Unlike the transaction log, rows here do change (lifecycle
//! transitions stamp status and `used_at`), so updates rewrite the file.
//! The denormalized coupon snapshot and redemption metadata are stored as
//! JSON columns.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use csv::{Reader, Writer};
use log::debug;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter};

use super::connection::{CsvConnection, USER_COUPONS_CSV_HEADER};
use crate::domain::models::coupon::{CouponSnapshot, UserCoupon, UserCouponStatus};
use crate::domain::models::points::JsonMetadata;
use crate::storage::traits::UserCouponStorage;

/// CSV-based user coupon repository.
#[derive(Clone)]
pub struct UserCouponRepository {
    connection: CsvConnection,
}

impl UserCouponRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    /// Read all of a user's instances in file (purchase) order.
    fn read_user_coupons(&self, uid: &str) -> Result<Vec<UserCoupon>> {
        self.connection.ensure_user_coupons_file_exists(uid)?;
        let file_path = self.connection.get_user_coupons_file_path(uid)?;

        let file = File::open(&file_path)?;
        let mut csv_reader = Reader::from_reader(BufReader::new(file));

        let mut user_coupons = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            user_coupons.push(Self::parse_record(&record)?);
        }

        Ok(user_coupons)
    }

    /// Rewrite the whole file. Used for both inserts and updates.
    fn write_user_coupons(&self, uid: &str, user_coupons: &[UserCoupon]) -> Result<()> {
        self.connection.ensure_user_directory_exists(uid)?;
        let file_path = self.connection.get_user_coupons_file_path(uid)?;

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&file_path)?;
        let mut csv_writer = Writer::from_writer(BufWriter::new(file));

        csv_writer.write_record(USER_COUPONS_CSV_HEADER)?;
        for user_coupon in user_coupons {
            csv_writer.write_record(&[
                user_coupon.id.as_str(),
                user_coupon.user_id.as_str(),
                user_coupon.coupon_id.as_str(),
                user_coupon.coupon_code.as_str(),
                &serde_json::to_string(&user_coupon.coupon)?,
                &user_coupon.purchased_at.to_rfc3339(),
                user_coupon.status.as_str(),
                &user_coupon.points_deducted.to_string(),
                &user_coupon
                    .used_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_default(),
                &serde_json::to_string(&user_coupon.redemption_metadata)?,
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    fn parse_record(record: &csv::StringRecord) -> Result<UserCoupon> {
        let field = |idx: usize| record.get(idx).unwrap_or("");

        let coupon: CouponSnapshot =
            serde_json::from_str(field(4)).context("invalid coupon snapshot")?;
        let purchased_at = DateTime::parse_from_rfc3339(field(5))
            .with_context(|| format!("invalid purchased_at timestamp: {}", field(5)))?
            .with_timezone(&Utc);
        let status = field(6)
            .parse::<UserCouponStatus>()
            .map_err(|e| anyhow!(e))?;
        let points_deducted = field(7)
            .parse::<i64>()
            .with_context(|| format!("invalid points_deducted value: {}", field(7)))?;
        let used_at = if field(8).is_empty() {
            None
        } else {
            Some(
                DateTime::parse_from_rfc3339(field(8))
                    .with_context(|| format!("invalid used_at timestamp: {}", field(8)))?
                    .with_timezone(&Utc),
            )
        };
        let redemption_metadata = if field(9).is_empty() {
            JsonMetadata::new()
        } else {
            serde_json::from_str(field(9)).context("invalid redemption metadata")?
        };

        Ok(UserCoupon {
            id: field(0).to_string(),
            user_id: field(1).to_string(),
            coupon_id: field(2).to_string(),
            coupon_code: field(3).to_string(),
            coupon,
            purchased_at,
            status,
            points_deducted,
            used_at,
            redemption_metadata,
        })
    }
}

impl UserCouponStorage for UserCouponRepository {
    fn store_user_coupon(&self, user_coupon: &UserCoupon) -> Result<()> {
        let mut user_coupons = self.read_user_coupons(&user_coupon.user_id)?;
        user_coupons.push(user_coupon.clone());
        self.write_user_coupons(&user_coupon.user_id, &user_coupons)?;
        debug!(
            "Stored user coupon {} for {}",
            user_coupon.id, user_coupon.user_id
        );
        Ok(())
    }

    fn get_user_coupon(&self, uid: &str, user_coupon_id: &str) -> Result<Option<UserCoupon>> {
        let user_coupons = self.read_user_coupons(uid)?;
        Ok(user_coupons.into_iter().find(|uc| uc.id == user_coupon_id))
    }

    fn list_user_coupons(&self, uid: &str) -> Result<Vec<UserCoupon>> {
        self.read_user_coupons(uid)
    }

    fn update_user_coupon(&self, user_coupon: &UserCoupon) -> Result<()> {
        let mut user_coupons = self.read_user_coupons(&user_coupon.user_id)?;
        let existing = user_coupons
            .iter_mut()
            .find(|uc| uc.id == user_coupon.id)
            .ok_or_else(|| {
                anyhow!(
                    "user coupon {} not found for {}",
                    user_coupon.id,
                    user_coupon.user_id
                )
            })?;
        *existing = user_coupon.clone();
        self.write_user_coupons(&user_coupon.user_id, &user_coupons)?;
        debug!(
            "Updated user coupon {} for {} (status {})",
            user_coupon.id, user_coupon.user_id, user_coupon.status
        );
        Ok(())
    }
}
