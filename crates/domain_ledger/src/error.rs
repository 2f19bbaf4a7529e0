//! Ledger domain errors

use thiserror::Error;

use core_kernel::{AccountId, Money, MoneyError, TemporalError};

use crate::account::AccountState;
use crate::ports::StoreError;

/// Errors returned by the ledger engine
///
/// Business errors are final and must not be retried automatically. Only
/// [`LedgerError::Transient`] is safe to retry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Unknown account, or an account that is not Active
    ///
    /// The two cases are deliberately indistinguishable to the caller.
    #[error("Account not found: {0}")]
    NotFound(String),

    /// Malformed or non-positive amount
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Debit would drive the balance below zero
    #[error("Insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: Money, requested: Money },

    /// Debit would push today's debits over the configured cap
    #[error("Daily debit cap exceeded: consumed {consumed}, requested {requested}, cap {cap}")]
    DailyCapExceeded {
        consumed: Money,
        requested: Money,
        cap: Money,
    },

    /// Deactivation attempted with a non-zero balance
    #[error("Balance must be zero to deactivate, current balance {0}")]
    BalanceNotZero(Money),

    /// Transition not present in the account state table
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: AccountState, to: AccountState },

    /// Invalid reporting date range
    #[error("Invalid date range: {0}")]
    InvalidRange(#[from] TemporalError),

    /// Unique constraint violation not resolved by idempotent replay
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Storage or connectivity failure; safe to retry
    #[error("Transient storage failure: {0}")]
    Transient(String),

    /// Unexpected storage failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    pub fn not_found(account_id: AccountId) -> Self {
        LedgerError::NotFound(account_id.to_string())
    }

    /// True only for failures that may succeed on a plain retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Transient(_))
    }
}

impl From<MoneyError> for LedgerError {
    fn from(error: MoneyError) -> Self {
        LedgerError::InvalidAmount(error.to_string())
    }
}

impl From<StoreError> for LedgerError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::DuplicateIdempotencyKey { .. } | StoreError::Conflict(_) => {
                LedgerError::Conflict(error.to_string())
            }
            StoreError::Transient(message) => LedgerError::Transient(message),
            StoreError::Backend(message) => LedgerError::Internal(message),
        }
    }
}
