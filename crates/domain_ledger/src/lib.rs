//! Ledger Domain - Accounts, movements and the ledger engine
//!
//! This crate holds the business core of the bank ledger: the account
//! aggregate, immutable movement records, the daily debit cap, statement
//! aggregation and the engine that ties them together.
//!
//! # Guarantees
//!
//! - Amounts are exact two-digit decimals, rounded once on entry
//! - A retried request with the same idempotency key has exactly one effect
//! - A debit never pushes a balance below zero or a day's debits over the cap
//! - Every movement records the balance before and after it
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_ledger::{InMemoryLedgerStore, LedgerConfig, LedgerEngine, MovementRequest};
//!
//! let store = InMemoryLedgerStore::new();
//! let engine = LedgerEngine::with_system_clock(store, LedgerConfig::default());
//! let account = engine.open_account(owner_id, "2000.00").await?;
//!
//! let movement = engine
//!     .apply_movement(
//!         MovementRequest::debit(account.id(), "600.00", "teller-7")
//!             .with_idempotency_key("req-1"),
//!     )
//!     .await?;
//! assert_eq!(movement.balance_after.to_string(), "1400.00");
//! ```

pub mod account;
pub mod config;
pub mod daily_cap;
pub mod engine;
pub mod error;
pub mod memory;
pub mod movement;
pub mod ports;
pub mod statement;

pub use account::{Account, AccountSnapshot, AccountState};
pub use config::LedgerConfig;
pub use daily_cap::DailyCapAccumulator;
pub use engine::{LedgerEngine, MAX_MOVEMENT_PAGE, TIMESTAMP_PRECISION};
pub use error::LedgerError;
pub use memory::{InMemoryLedgerStore, InMemoryTransaction};
pub use movement::{Movement, MovementRequest, MovementType};
pub use ports::{LedgerStore, LedgerTransaction, StoreError};
pub use statement::{fold_statement, AccountStatement, StatementResult};
