//! Repository implementations
//!
//! Repositories hold the SQL and the mapping between rows and domain types.
//! They know nothing about locking strategy or error classification; that
//! lives in the adapters.
//!
//! Queries are built at runtime with `sqlx::query_as` and `FromRow` rows so
//! the crate builds without a live database.

pub mod ledger;

pub use ledger::{AccountRow, DbAccountState, DbMovementType, MovementRow};
