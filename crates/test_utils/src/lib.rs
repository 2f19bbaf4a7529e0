//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the bank
//! ledger test suite.
//!
//! # Modules
//!
//! - `fixtures`: Fixed instants, amounts and ready-made engines
//! - `builders`: Builder patterns for accounts and movement requests
//! - `database`: PostgreSQL testcontainer management
//! - `assertions`: Ledger invariant assertions
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
