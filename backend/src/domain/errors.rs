//! Error taxonomy for the ledger.
//!
//! Business-rule violations (insufficient points, bad lifecycle transitions,
//! unknown coupons) are reported distinctly from infrastructure failures so
//! callers can show an actionable message for the former and a generic
//! "try again" for the latter. No operation retries internally.

use thiserror::Error;

use crate::domain::models::coupon::UserCouponStatus;
use crate::domain::models::points::PointCategory;

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("insufficient points in {category} category: have {available}, need {requested}")]
    InsufficientPoints {
        category: PointCategory,
        available: i64,
        requested: i64,
    },

    #[error("point amount must be positive, got {0}")]
    InvalidAmount(i64),

    #[error("coupon not found: {0}")]
    CouponNotFound(String),

    #[error("user coupon not found: {0}")]
    UserCouponNotFound(String),

    #[error("cannot transition coupon from {from} to {to}")]
    InvalidStatusTransition {
        from: UserCouponStatus,
        to: UserCouponStatus,
    },

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl LedgerError {
    /// True for violations of a business rule, false for infrastructure
    /// failures. Drives the REST layer's status-code and message choice.
    pub fn is_business_rule(&self) -> bool {
        !matches!(self, LedgerError::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_points_message_names_the_category() {
        let err = LedgerError::InsufficientPoints {
            category: PointCategory::Share,
            available: 20,
            requested: 100,
        };
        let message = err.to_string();
        assert!(message.contains("share"));
        assert!(message.contains("20"));
        assert!(message.contains("100"));
        assert!(err.is_business_rule());
    }

    #[test]
    fn test_storage_errors_are_not_business_rules() {
        let err = LedgerError::Storage(anyhow::anyhow!("disk on fire"));
        assert!(!err.is_business_rule());
    }
}
