//! # Facepet Points & Coupon Ledger
//!
//! Backend service that tracks per-user engagement points across fixed
//! earning categories and lets users spend them on coupons. The stored
//! balance is a cache over an append-only transaction log; replaying the
//! log must always reproduce the balance, and a reconciliation pass repairs
//! it when the two drift.
//!
//! ## Layout
//! - [`domain`] — services and models (points, coupons, audit)
//! - [`storage`] — file-backed repositories behind storage traits
//! - [`rest`] — axum HTTP surface

pub mod domain;
pub mod rest;
pub mod storage;

pub use rest::AppState;
pub use storage::CsvConnection;
