//! Account aggregate
//!
//! The account owns the only contended piece of state in the ledger: its
//! balance. Fields are private; the balance changes only through
//! [`Account::post`], called by the engine under the account lock, and the
//! lifecycle changes only through [`Account::transition_to`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{AccountId, CustomerId, Money};

use crate::error::LedgerError;
use crate::movement::MovementType;

/// Lifecycle state of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountState {
    /// Open for movements
    Active,
    /// Soft-deleted; terminal for operational purposes
    Inactive,
    /// Temporarily frozen; reversible back to Active
    Blocked,
}

impl AccountState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountState::Active => "active",
            AccountState::Inactive => "inactive",
            AccountState::Blocked => "blocked",
        }
    }
}

impl fmt::Display for AccountState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(AccountState::Active),
            "inactive" => Ok(AccountState::Inactive),
            "blocked" => Ok(AccountState::Blocked),
            other => Err(format!("unknown account state '{}'", other)),
        }
    }
}

/// Plain data used to rebuild an [`Account`] from storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub id: AccountId,
    pub owner_id: CustomerId,
    pub state: AccountState,
    pub balance: Money,
    pub opening_balance: Money,
    pub opened_at: DateTime<Utc>,
    pub version: u64,
    pub last_movement_at: Option<DateTime<Utc>>,
}

/// Balance change produced by a single posting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Posting {
    pub balance_before: Money,
    pub balance_after: Money,
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
}

/// A customer account
///
/// # Invariants
///
/// - The balance is never negative
/// - `version` counts the movements applied to the account
/// - Inactive is only reachable with a zero balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    id: AccountId,
    owner_id: CustomerId,
    state: AccountState,
    balance: Money,
    opening_balance: Money,
    opened_at: DateTime<Utc>,
    version: u64,
    last_movement_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Opens a new Active account
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` if the opening balance is negative
    pub fn open(
        owner_id: CustomerId,
        opening_balance: Money,
        opened_at: DateTime<Utc>,
    ) -> Result<Self, LedgerError> {
        if opening_balance.is_negative() {
            return Err(LedgerError::InvalidAmount(format!(
                "opening balance must not be negative, got {}",
                opening_balance
            )));
        }

        Ok(Self {
            id: AccountId::new_v7(),
            owner_id,
            state: AccountState::Active,
            balance: opening_balance,
            opening_balance,
            opened_at,
            version: 0,
            last_movement_at: None,
        })
    }

    /// Rebuilds an account from persisted data
    pub fn restore(snapshot: AccountSnapshot) -> Self {
        Self {
            id: snapshot.id,
            owner_id: snapshot.owner_id,
            state: snapshot.state,
            balance: snapshot.balance,
            opening_balance: snapshot.opening_balance,
            opened_at: snapshot.opened_at,
            version: snapshot.version,
            last_movement_at: snapshot.last_movement_at,
        }
    }

    pub fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            id: self.id,
            owner_id: self.owner_id,
            state: self.state,
            balance: self.balance,
            opening_balance: self.opening_balance,
            opened_at: self.opened_at,
            version: self.version,
            last_movement_at: self.last_movement_at,
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn owner_id(&self) -> CustomerId {
        self.owner_id
    }

    pub fn state(&self) -> AccountState {
        self.state
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    pub fn opening_balance(&self) -> Money {
        self.opening_balance
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn last_movement_at(&self) -> Option<DateTime<Utc>> {
        self.last_movement_at
    }

    /// True iff the account accepts movements
    pub fn can_operate(&self) -> bool {
        self.state == AccountState::Active
    }

    /// Fails with `NotFound` unless the account is Active
    pub fn ensure_operable(&self) -> Result<(), LedgerError> {
        if self.can_operate() {
            Ok(())
        } else {
            Err(LedgerError::not_found(self.id))
        }
    }

    /// Moves the account to `new_state`
    ///
    /// Active to Inactive requires a zero balance. Active and Blocked switch
    /// freely. Inactive accepts no outgoing transition, and Blocked cannot go
    /// straight to Inactive. Transitioning to the current state is a no-op.
    pub fn transition_to(&mut self, new_state: AccountState) -> Result<(), LedgerError> {
        use AccountState::*;

        match (self.state, new_state) {
            (from, to) if from == to => Ok(()),
            (Active, Inactive) => {
                if !self.balance.is_zero() {
                    return Err(LedgerError::BalanceNotZero(self.balance));
                }
                self.state = Inactive;
                Ok(())
            }
            (Active, Blocked) | (Blocked, Active) => {
                self.state = new_state;
                Ok(())
            }
            (from, to) => Err(LedgerError::InvalidStateTransition { from, to }),
        }
    }

    /// Timestamp for the next movement
    ///
    /// Strictly after the previous movement: one microsecond past it when the
    /// clock has not moved beyond it.
    pub fn next_timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.last_movement_at {
            Some(last) if last >= now => last + Duration::microseconds(1),
            _ => now,
        }
    }

    /// Applies a movement to the balance
    pub(crate) fn post(
        &mut self,
        movement_type: MovementType,
        amount: Money,
        at: DateTime<Utc>,
    ) -> Result<Posting, LedgerError> {
        let balance_before = self.balance;
        let balance_after = match movement_type {
            MovementType::Credit => balance_before.checked_add(&amount)?,
            MovementType::Debit => {
                if amount > balance_before {
                    return Err(LedgerError::InsufficientFunds {
                        balance: balance_before,
                        requested: amount,
                    });
                }
                balance_before.checked_sub(&amount)?
            }
        };

        self.balance = balance_after;
        self.version += 1;
        self.last_movement_at = Some(at);

        Ok(Posting {
            balance_before,
            balance_after,
            sequence: self.version,
            timestamp: at,
        })
    }
}
