//! # Domain Module
//!
//! Business logic for the points and coupon ledger, independent of the
//! HTTP layer. Services own their repositories and are constructed from a
//! [`CsvConnection`](crate::storage::CsvConnection); the REST layer only
//! ever calls through them.
//!
//! ## Services
//! - [`PointsService`] — category balances, earn/spend, replay-based repair
//! - [`CouponService`] — purchase workflow and coupon instance lifecycle
//! - [`AuditService`] — stored-vs-replayed consistency reports

pub mod audit_service;
pub mod coupon_service;
pub mod errors;
pub mod models;
pub mod points_service;

pub use audit_service::AuditService;
pub use coupon_service::CouponService;
pub use errors::{LedgerError, LedgerResult};
pub use points_service::PointsService;
