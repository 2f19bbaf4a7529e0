//! In-memory ledger store
//!
//! Implements the storage ports without a database, for tests and local runs.
//! Each account has its own async lock, so units of work on different
//! accounts never wait on each other. Committed state is kept apart from the
//! locks so readers are never blocked by a writer.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use core_kernel::{AccountId, DateRange, DayWindow, Money};

use crate::account::Account;
use crate::movement::{Movement, MovementType};
use crate::ports::{LedgerStore, LedgerTransaction, StoreError};

struct AccountSlot {
    lock: Arc<AsyncMutex<()>>,
    committed: RwLock<Account>,
}

#[derive(Default)]
struct Journal {
    movements: Vec<Movement>,
    by_account: HashMap<AccountId, Vec<usize>>,
    keys: HashMap<(AccountId, String), usize>,
}

impl Journal {
    fn for_account(&self, account_id: AccountId) -> impl DoubleEndedIterator<Item = &Movement> {
        self.by_account
            .get(&account_id)
            .map(|indices| indices.as_slice())
            .unwrap_or_default()
            .iter()
            .map(move |&index| &self.movements[index])
    }

    fn by_key(&self, account_id: AccountId, key: &str) -> Option<&Movement> {
        self.keys
            .get(&(account_id, key.to_string()))
            .map(|&index| &self.movements[index])
    }
}

#[derive(Default)]
struct Inner {
    accounts: RwLock<HashMap<AccountId, Arc<AccountSlot>>>,
    journal: Mutex<Journal>,
}

fn poisoned<T>(_: PoisonError<T>) -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".to_string())
}

/// Thread-safe in-memory implementation of [`LedgerStore`]
#[derive(Clone, Default)]
pub struct InMemoryLedgerStore {
    inner: Arc<Inner>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed movements across all accounts
    pub fn movement_count(&self) -> Result<usize, StoreError> {
        Ok(self.inner.journal.lock().map_err(poisoned)?.movements.len())
    }

    fn slot(&self, account_id: AccountId) -> Result<Option<Arc<AccountSlot>>, StoreError> {
        let accounts = self.inner.accounts.read().map_err(poisoned)?;
        Ok(accounts.get(&account_id).cloned())
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    type Transaction = InMemoryTransaction;

    async fn begin(&self) -> Result<Self::Transaction, StoreError> {
        Ok(InMemoryTransaction {
            store: self.clone(),
            guards: HashMap::new(),
            staged_accounts: HashMap::new(),
            staged_movements: Vec::new(),
        })
    }

    async fn find_account(&self, account_id: AccountId) -> Result<Option<Account>, StoreError> {
        match self.slot(account_id)? {
            Some(slot) => Ok(Some(slot.committed.read().map_err(poisoned)?.clone())),
            None => Ok(None),
        }
    }

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        let mut accounts = self.inner.accounts.write().map_err(poisoned)?;
        if accounts.contains_key(&account.id()) {
            return Err(StoreError::Conflict(format!(
                "account {} already exists",
                account.id()
            )));
        }
        accounts.insert(
            account.id(),
            Arc::new(AccountSlot {
                lock: Arc::new(AsyncMutex::new(())),
                committed: RwLock::new(account.clone()),
            }),
        );
        Ok(())
    }

    async fn find_movement_by_key(
        &self,
        account_id: AccountId,
        key: &str,
    ) -> Result<Option<Movement>, StoreError> {
        let journal = self.inner.journal.lock().map_err(poisoned)?;
        Ok(journal.by_key(account_id, key).cloned())
    }

    async fn recent_movements(
        &self,
        account_id: AccountId,
        limit: usize,
    ) -> Result<Vec<Movement>, StoreError> {
        let journal = self.inner.journal.lock().map_err(poisoned)?;
        Ok(journal.for_account(account_id).rev().take(limit).cloned().collect())
    }

    async fn movements_between(
        &self,
        account_ids: &[AccountId],
        range: &DateRange,
    ) -> Result<Vec<Movement>, StoreError> {
        let journal = self.inner.journal.lock().map_err(poisoned)?;
        let mut found: Vec<Movement> = account_ids
            .iter()
            .flat_map(|id| journal.for_account(*id))
            .filter(|m| range.contains(m.timestamp))
            .cloned()
            .collect();
        found.sort_by_key(Movement::ordering_key);
        Ok(found)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Unit of work over [`InMemoryLedgerStore`]
///
/// Holds the account locks it took until it is committed or dropped.
pub struct InMemoryTransaction {
    store: InMemoryLedgerStore,
    guards: HashMap<AccountId, OwnedMutexGuard<()>>,
    staged_accounts: HashMap<AccountId, Account>,
    staged_movements: Vec<Movement>,
}

impl InMemoryTransaction {
    fn staged_key(&self, account_id: AccountId, key: &str) -> Option<&Movement> {
        self.staged_movements
            .iter()
            .find(|m| m.account_id == account_id && m.idempotency_key.as_deref() == Some(key))
    }

    fn ensure_locked(&self, account_id: AccountId) -> Result<(), StoreError> {
        if self.guards.contains_key(&account_id) {
            Ok(())
        } else {
            Err(StoreError::Backend(format!(
                "account {} written without holding its lock",
                account_id
            )))
        }
    }
}

#[async_trait]
impl LedgerTransaction for InMemoryTransaction {
    async fn lock_account(&mut self, account_id: AccountId) -> Result<Option<Account>, StoreError> {
        if let Some(staged) = self.staged_accounts.get(&account_id) {
            return Ok(Some(staged.clone()));
        }

        let Some(slot) = self.store.slot(account_id)? else {
            return Ok(None);
        };

        if !self.guards.contains_key(&account_id) {
            let guard = slot.lock.clone().lock_owned().await;
            self.guards.insert(account_id, guard);
        }

        let account = slot.committed.read().map_err(poisoned)?.clone();
        Ok(Some(account))
    }

    async fn find_movement_by_key(
        &mut self,
        account_id: AccountId,
        key: &str,
    ) -> Result<Option<Movement>, StoreError> {
        if let Some(staged) = self.staged_key(account_id, key) {
            return Ok(Some(staged.clone()));
        }
        self.store.find_movement_by_key(account_id, key).await
    }

    async fn sum_debits(
        &mut self,
        account_id: AccountId,
        window: DayWindow,
    ) -> Result<Money, StoreError> {
        let journal = self.store.inner.journal.lock().map_err(poisoned)?;
        let debits: Vec<Money> = journal
            .for_account(account_id)
            .chain(self.staged_movements.iter().filter(|m| m.account_id == account_id))
            .filter(|m| m.movement_type == MovementType::Debit && window.contains(m.timestamp))
            .map(|m| m.amount)
            .collect();
        Money::checked_sum(&debits).map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn insert_movement(&mut self, movement: &Movement) -> Result<(), StoreError> {
        self.ensure_locked(movement.account_id)?;

        if let Some(key) = movement.idempotency_key.as_deref() {
            let taken = self.staged_key(movement.account_id, key).is_some()
                || self
                    .store
                    .inner
                    .journal
                    .lock()
                    .map_err(poisoned)?
                    .by_key(movement.account_id, key)
                    .is_some();
            if taken {
                return Err(StoreError::DuplicateIdempotencyKey {
                    account_id: movement.account_id,
                    key: key.to_string(),
                });
            }
        }

        self.staged_movements.push(movement.clone());
        Ok(())
    }

    async fn save_account(&mut self, account: &Account) -> Result<(), StoreError> {
        self.ensure_locked(account.id())?;
        self.staged_accounts.insert(account.id(), account.clone());
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        let mut journal = self.store.inner.journal.lock().map_err(poisoned)?;

        for movement in &self.staged_movements {
            if let Some(key) = movement.idempotency_key.as_deref() {
                if journal.by_key(movement.account_id, key).is_some() {
                    return Err(StoreError::DuplicateIdempotencyKey {
                        account_id: movement.account_id,
                        key: key.to_string(),
                    });
                }
            }
        }

        let mut slots = Vec::with_capacity(self.staged_accounts.len());
        for account in self.staged_accounts.values() {
            let slot = self.store.slot(account.id())?.ok_or_else(|| {
                StoreError::Backend(format!("account {} vanished before commit", account.id()))
            })?;
            slots.push((slot, account));
        }

        for movement in self.staged_movements {
            let index = journal.movements.len();
            journal.by_account.entry(movement.account_id).or_default().push(index);
            if let Some(key) = movement.idempotency_key.clone() {
                journal.keys.insert((movement.account_id, key), index);
            }
            journal.movements.push(movement);
        }

        for (slot, account) in slots {
            *slot.committed.write().map_err(poisoned)? = account.clone();
        }

        Ok(())
    }
}
