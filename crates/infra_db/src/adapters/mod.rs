//! Storage port adapters
//!
//! Implementations of the ledger domain's storage ports on PostgreSQL. The
//! adapter translates between domain types and rows through the repository
//! layer and classifies database failures into `StoreError` kinds.
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresLedgerStore;
//! use domain_ledger::{LedgerConfig, LedgerEngine};
//!
//! let store = PostgresLedgerStore::new(pool);
//! let engine = LedgerEngine::with_system_clock(store, LedgerConfig::default());
//! ```

pub mod ledger;

pub use ledger::{PgLedgerTransaction, PostgresLedgerStore};
