//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the bank ledger using SQLx.
//!
//! # Architecture
//!
//! - [`repositories`] holds the SQL and row mapping
//! - [`adapters`] implements the ledger storage ports on top of it
//! - [`pool`] creates the connection pool and applies migrations
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresLedgerStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/ledger")).await?;
//! run_migrations(&pool).await?;
//! let store = PostgresLedgerStore::new(pool);
//! ```

pub mod adapters;
pub mod error;
pub mod pool;
pub mod repositories;

pub use adapters::{PgLedgerTransaction, PostgresLedgerStore};
pub use error::{DatabaseError, IDEMPOTENCY_INDEX};
pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool};
