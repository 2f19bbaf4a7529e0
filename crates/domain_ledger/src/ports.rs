//! Ledger Storage Ports
//!
//! The engine talks to storage only through the traits in this module, so the
//! same apply logic runs against PostgreSQL (infra_db) and against the
//! in-memory store used by tests and local runs.
//!
//! # Unit of work
//!
//! A [`LedgerTransaction`] is a single atomic unit. Locks taken with
//! [`LedgerTransaction::lock_account`] are held until the transaction is
//! committed or dropped. Dropping without commit discards every staged write.
//!
//! ```rust,ignore
//! let mut tx = store.begin().await?;
//! let mut account = tx.lock_account(account_id).await?.ok_or(..)?;
//! // ... validate and post
//! tx.insert_movement(&movement).await?;
//! tx.save_account(&account).await?;
//! tx.commit().await?;
//! ```

use async_trait::async_trait;
use thiserror::Error;

use core_kernel::{AccountId, DateRange, DayWindow, Money};

use crate::account::Account;
use crate::movement::Movement;

/// Errors surfaced by storage adapters
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Another movement already holds this key on this account
    #[error("Idempotency key '{key}' already used on account {account_id}")]
    DuplicateIdempotencyKey { account_id: AccountId, key: String },

    /// Any other uniqueness or integrity violation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Connectivity, timeout, serialization failure or deadlock
    #[error("Transient: {0}")]
    Transient(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
}

/// Read access plus the entry point for atomic writes
#[async_trait]
pub trait LedgerStore: Send + Sync + 'static {
    type Transaction: LedgerTransaction;

    /// Starts a unit of work
    async fn begin(&self) -> Result<Self::Transaction, StoreError>;

    /// Current persisted state of an account, without locking
    async fn find_account(&self, account_id: AccountId) -> Result<Option<Account>, StoreError>;

    /// Persists a newly opened account
    async fn insert_account(&self, account: &Account) -> Result<(), StoreError>;

    /// Committed movement holding `key` on `account_id`
    async fn find_movement_by_key(
        &self,
        account_id: AccountId,
        key: &str,
    ) -> Result<Option<Movement>, StoreError>;

    /// Latest movements of an account, newest first
    async fn recent_movements(
        &self,
        account_id: AccountId,
        limit: usize,
    ) -> Result<Vec<Movement>, StoreError>;

    /// Movements of the given accounts with a timestamp inside `range`
    async fn movements_between(
        &self,
        account_ids: &[AccountId],
        range: &DateRange,
    ) -> Result<Vec<Movement>, StoreError>;

    /// Cheap round trip used by the readiness check
    async fn ping(&self) -> Result<(), StoreError>;
}

/// A single atomic unit of ledger writes
#[async_trait]
pub trait LedgerTransaction: Send {
    /// Takes the exclusive per-account lock and returns the locked state
    ///
    /// Returns `None` for an unknown account.
    async fn lock_account(&mut self, account_id: AccountId) -> Result<Option<Account>, StoreError>;

    /// Movement holding `key` on `account_id`, as seen inside this unit
    async fn find_movement_by_key(
        &mut self,
        account_id: AccountId,
        key: &str,
    ) -> Result<Option<Movement>, StoreError>;

    /// Sum of debit amounts on `account_id` inside `window`
    async fn sum_debits(
        &mut self,
        account_id: AccountId,
        window: DayWindow,
    ) -> Result<Money, StoreError>;

    /// Stages a movement for insertion
    async fn insert_movement(&mut self, movement: &Movement) -> Result<(), StoreError>;

    /// Stages the new account state
    async fn save_account(&mut self, account: &Account) -> Result<(), StoreError>;

    /// Makes every staged write visible atomically
    async fn commit(self) -> Result<(), StoreError>;
}
