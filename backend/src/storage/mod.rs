//! # Storage Module
//!
//! Data persistence for the points and coupon ledger. Repositories sit
//! behind the traits in [`traits`], so the domain layer never touches file
//! formats directly; swapping in a different backend (a managed document
//! store, SQL, ...) means implementing those traits, nothing more.

pub mod csv;
pub mod traits;

pub use csv::CsvConnection;
pub use traits::*;
