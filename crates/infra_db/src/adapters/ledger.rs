//! PostgreSQL Ledger Adapter
//!
//! Implements the ledger storage ports on top of the repository queries.
//!
//! # Locking
//!
//! A unit of work is a PostgreSQL transaction at READ COMMITTED. The account
//! row is locked with `SELECT ... FOR UPDATE`, so concurrent movements on the
//! same account queue on that row while other accounts proceed. Every
//! statement after the lock sees the latest committed movements, which keeps
//! the daily cap sum and the idempotency re-check current.
//!
//! The partial unique index on `(account_id, idempotency_key)` is the final
//! arbiter for duplicate keys; a violation surfaces as
//! `StoreError::DuplicateIdempotencyKey` and the engine replays the winner.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use core_kernel::{AccountId, DateRange, DayWindow, Money};
use domain_ledger::{Account, LedgerStore, LedgerTransaction, Movement, StoreError};

use crate::error::DatabaseError;
use crate::repositories::ledger;

/// PostgreSQL-backed implementation of [`LedgerStore`]
#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: PgPool,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    type Transaction = PgLedgerTransaction;

    #[instrument(skip(self))]
    async fn begin(&self) -> Result<Self::Transaction, StoreError> {
        let tx = self.pool.begin().await.map_err(DatabaseError::from)?;
        Ok(PgLedgerTransaction { tx })
    }

    #[instrument(skip(self), fields(account_id = %account_id))]
    async fn find_account(&self, account_id: AccountId) -> Result<Option<Account>, StoreError> {
        Ok(ledger::find_account(&self.pool, account_id).await?)
    }

    #[instrument(skip(self, account), fields(account_id = %account.id()))]
    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        debug!("Inserting account");
        Ok(ledger::insert_account(&self.pool, account).await?)
    }

    #[instrument(skip(self), fields(account_id = %account_id))]
    async fn find_movement_by_key(
        &self,
        account_id: AccountId,
        key: &str,
    ) -> Result<Option<Movement>, StoreError> {
        Ok(ledger::find_movement_by_key(&self.pool, account_id, key).await?)
    }

    #[instrument(skip(self), fields(account_id = %account_id))]
    async fn recent_movements(
        &self,
        account_id: AccountId,
        limit: usize,
    ) -> Result<Vec<Movement>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        Ok(ledger::recent_movements(&self.pool, account_id, limit).await?)
    }

    #[instrument(skip(self, account_ids), fields(accounts = account_ids.len()))]
    async fn movements_between(
        &self,
        account_ids: &[AccountId],
        range: &DateRange,
    ) -> Result<Vec<Movement>, StoreError> {
        let ids: Vec<Uuid> = account_ids.iter().map(|id| *id.as_uuid()).collect();
        Ok(ledger::movements_between(&self.pool, &ids, range.start(), range.end_exclusive()).await?)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(ledger::ping(&self.pool).await?)
    }
}

/// Unit of work backed by a PostgreSQL transaction
///
/// Dropping it without [`LedgerTransaction::commit`] rolls back.
pub struct PgLedgerTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTransaction for PgLedgerTransaction {
    #[instrument(skip(self), fields(account_id = %account_id))]
    async fn lock_account(&mut self, account_id: AccountId) -> Result<Option<Account>, StoreError> {
        Ok(ledger::lock_account(&mut *self.tx, account_id).await?)
    }

    #[instrument(skip(self), fields(account_id = %account_id))]
    async fn find_movement_by_key(
        &mut self,
        account_id: AccountId,
        key: &str,
    ) -> Result<Option<Movement>, StoreError> {
        Ok(ledger::find_movement_by_key(&mut *self.tx, account_id, key).await?)
    }

    #[instrument(skip(self), fields(account_id = %account_id))]
    async fn sum_debits(
        &mut self,
        account_id: AccountId,
        window: DayWindow,
    ) -> Result<Money, StoreError> {
        Ok(ledger::sum_debits(&mut *self.tx, account_id, window.start, window.end).await?)
    }

    #[instrument(
        skip(self, movement),
        fields(account_id = %movement.account_id, sequence = movement.sequence)
    )]
    async fn insert_movement(&mut self, movement: &Movement) -> Result<(), StoreError> {
        match ledger::insert_movement(&mut *self.tx, movement).await {
            Ok(()) => Ok(()),
            Err(error) if error.is_idempotency_conflict() => {
                warn!("Idempotency key already taken by a concurrent movement");
                Err(StoreError::DuplicateIdempotencyKey {
                    account_id: movement.account_id,
                    key: movement.idempotency_key.clone().unwrap_or_default(),
                })
            }
            Err(error) => Err(error.into()),
        }
    }

    #[instrument(
        skip(self, account),
        fields(account_id = %account.id(), version = account.version())
    )]
    async fn save_account(&mut self, account: &Account) -> Result<(), StoreError> {
        Ok(ledger::update_account(&mut *self.tx, account).await?)
    }

    #[instrument(skip(self))]
    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(DatabaseError::from)?;
        Ok(())
    }
}
