//! Domain models for the points and coupon ledger.

pub mod coupon;
pub mod points;
pub mod profile;
