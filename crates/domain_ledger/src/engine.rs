//! Ledger engine
//!
//! Orchestrates every ledger write. `apply_movement` validates in a fixed
//! order and fails fast:
//!
//! 1. unknown account: `NotFound`
//! 2. account not Active: `NotFound`
//! 3. amount malformed or not positive after rounding: `InvalidAmount`
//! 4. idempotency key already used on the account: the stored movement is returned
//! 5. debit over today's cap: `DailyCapExceeded`, then debit over balance: `InsufficientFunds`
//! 6. movement and new balance persisted in one unit of work
//!
//! Steps 4 to 6 run under the per-account lock, so cap and funds checks always
//! see the latest committed balance.

use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use std::sync::Arc;

use core_kernel::{AccountId, Clock, CustomerId, DateRange, Money, MovementId, SystemClock};

use crate::account::{Account, AccountState};
use crate::config::LedgerConfig;
use crate::daily_cap::DailyCapAccumulator;
use crate::error::LedgerError;
use crate::movement::{Movement, MovementRequest, MovementType};
use crate::ports::{LedgerStore, LedgerTransaction, StoreError};
use crate::statement::{fold_statement, StatementResult};

/// Upper bound on a single movement listing
pub const MAX_MOVEMENT_PAGE: usize = 500;

/// Fractional-second digits kept on every persisted timestamp
pub const TIMESTAMP_PRECISION: u16 = 6;

/// Failure inside the locked section, keeping store errors intact so the
/// caller can recognise a lost idempotency race
enum Failure {
    Ledger(LedgerError),
    Store(StoreError),
}

impl From<LedgerError> for Failure {
    fn from(error: LedgerError) -> Self {
        Failure::Ledger(error)
    }
}

impl From<StoreError> for Failure {
    fn from(error: StoreError) -> Self {
        Failure::Store(error)
    }
}

/// The ledger engine
pub struct LedgerEngine<S: LedgerStore> {
    store: S,
    config: LedgerConfig,
    clock: Arc<dyn Clock>,
}

impl<S: LedgerStore> LedgerEngine<S> {
    pub fn new(store: S, config: LedgerConfig, clock: Arc<dyn Clock>) -> Self {
        Self { store, config, clock }
    }

    /// Engine on the wall clock
    pub fn with_system_clock(store: S, config: LedgerConfig) -> Self {
        Self::new(store, config, Arc::new(SystemClock))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Clock reading cut to the microsecond precision stores keep
    fn now(&self) -> DateTime<Utc> {
        self.clock.now().trunc_subsecs(TIMESTAMP_PRECISION)
    }

    /// Opens an Active account with the given opening balance
    pub async fn open_account(
        &self,
        owner_id: CustomerId,
        opening_balance: &str,
    ) -> Result<Account, LedgerError> {
        let opening_balance = Money::parse(opening_balance, self.config.rounding_mode())?;
        let account = Account::open(owner_id, opening_balance, self.now())?;
        self.store.insert_account(&account).await?;
        Ok(account)
    }

    /// Current state of an account, whatever its lifecycle state
    pub async fn account(&self, account_id: AccountId) -> Result<Account, LedgerError> {
        self.store
            .find_account(account_id)
            .await?
            .ok_or_else(|| LedgerError::not_found(account_id))
    }

    /// Moves an account through its lifecycle under the account lock
    pub async fn change_state(
        &self,
        account_id: AccountId,
        new_state: AccountState,
    ) -> Result<Account, LedgerError> {
        let mut tx = self.store.begin().await?;
        let mut account = tx
            .lock_account(account_id)
            .await?
            .ok_or_else(|| LedgerError::not_found(account_id))?;

        let previous = account.state();
        account.transition_to(new_state)?;
        if account.state() != previous {
            tx.save_account(&account).await?;
            tx.commit().await?;
        }
        Ok(account)
    }

    /// Latest movements of an account, newest first
    ///
    /// `limit` is clamped to `1..=MAX_MOVEMENT_PAGE`.
    pub async fn movements(
        &self,
        account_id: AccountId,
        limit: usize,
    ) -> Result<Vec<Movement>, LedgerError> {
        self.account(account_id).await?;
        let limit = limit.clamp(1, MAX_MOVEMENT_PAGE);
        Ok(self.store.recent_movements(account_id, limit).await?)
    }

    /// Applies a credit or debit
    pub async fn apply_movement(&self, request: MovementRequest) -> Result<Movement, LedgerError> {
        let account_id = request.account_id;
        let account = self.account(account_id).await?;
        account.ensure_operable()?;

        let amount = Money::parse_positive(&request.amount, self.config.rounding_mode())?;

        let key = request.normalized_key();
        if let Some(key) = key {
            if let Some(existing) = self.store.find_movement_by_key(account_id, key).await? {
                return Ok(existing);
            }
        }

        match self.apply_locked(&request, amount, key).await {
            Ok(movement) => Ok(movement),
            Err(Failure::Ledger(error)) => Err(error),
            Err(Failure::Store(StoreError::DuplicateIdempotencyKey { account_id, key })) => {
                // lost the race against a request with the same key
                self.store
                    .find_movement_by_key(account_id, &key)
                    .await?
                    .ok_or_else(|| {
                        LedgerError::Conflict(format!(
                            "idempotency key '{}' on account {} is taken \
                             but no movement is visible",
                            key, account_id
                        ))
                    })
            }
            Err(Failure::Store(error)) => Err(error.into()),
        }
    }

    async fn apply_locked(
        &self,
        request: &MovementRequest,
        amount: Money,
        key: Option<&str>,
    ) -> Result<Movement, Failure> {
        let account_id = request.account_id;
        let mut tx = self.store.begin().await?;

        let mut account = tx
            .lock_account(account_id)
            .await?
            .ok_or_else(|| LedgerError::not_found(account_id))?;
        account.ensure_operable()?;

        if let Some(key) = key {
            if let Some(existing) = tx.find_movement_by_key(account_id, key).await? {
                return Ok(existing);
            }
        }

        let at = account.next_timestamp(self.now());

        if request.movement_type == MovementType::Debit {
            let cap = DailyCapAccumulator::new(self.config.daily_debit_cap());
            let consumed = cap.consumed(&mut tx, account_id, at).await?;
            cap.check(consumed, amount)?;
        }

        let posting = account.post(request.movement_type, amount, at)?;

        let movement = Movement {
            id: MovementId::new_v7(),
            account_id,
            movement_type: request.movement_type,
            amount,
            balance_before: posting.balance_before,
            balance_after: posting.balance_after,
            timestamp: posting.timestamp,
            sequence: posting.sequence,
            idempotency_key: key.map(str::to_owned),
            note: request.note.clone(),
            actor: Some(request.actor.clone()),
        };

        tx.insert_movement(&movement).await?;
        tx.save_account(&account).await?;
        tx.commit().await?;

        Ok(movement)
    }

    /// Statement over the inclusive UTC date range `from..=to`
    pub async fn statement(
        &self,
        account_ids: &[AccountId],
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<StatementResult, LedgerError> {
        let range = DateRange::new(from, to)?;

        let mut unique: Vec<AccountId> = Vec::with_capacity(account_ids.len());
        for id in account_ids {
            if !unique.contains(id) {
                unique.push(*id);
            }
        }
        if unique.is_empty() {
            return Err(LedgerError::NotFound("no account requested".to_string()));
        }

        let mut accounts = Vec::with_capacity(unique.len());
        for id in &unique {
            accounts.push(self.account(*id).await?);
        }

        let movements = self.store.movements_between(&unique, &range).await?;
        fold_statement(&range, &accounts, movements)
    }
}
