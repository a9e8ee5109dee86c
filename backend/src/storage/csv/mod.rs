//! # File-Backed Storage
//!
//! The shipped storage backend: YAML documents for balance, profile, and
//! catalog; CSV files for the append-only transaction log and purchased
//! coupon instances. All files live under one data directory managed by
//! `CsvConnection`.

pub mod balance_repository;
pub mod connection;
pub mod coupon_repository;
pub mod profile_repository;
pub mod transaction_repository;
pub mod user_coupon_repository;

pub use balance_repository::BalanceRepository;
pub use connection::CsvConnection;
pub use coupon_repository::CouponCatalogRepository;
pub use profile_repository::ProfileRepository;
pub use transaction_repository::TransactionRepository;
pub use user_coupon_repository::UserCouponRepository;
