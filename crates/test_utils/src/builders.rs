//! Test Data Builders
//!
//! Builders for accounts and movement requests with sensible defaults, so a
//! test only spells out the fields it cares about.

use chrono::{DateTime, Utc};

use core_kernel::{AccountId, CustomerId, Money};
use domain_ledger::{
    Account, AccountState, LedgerEngine, LedgerError, LedgerStore, MovementRequest, MovementType,
};

use crate::fixtures::{ActorFixtures, MoneyFixtures};

/// Builder for accounts opened through an engine
pub struct TestAccountBuilder {
    owner_id: CustomerId,
    opening_balance: String,
    state: AccountState,
}

impl Default for TestAccountBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAccountBuilder {
    pub fn new() -> Self {
        Self {
            owner_id: ActorFixtures::customer(),
            opening_balance: MoneyFixtures::opening_balance().to_string(),
            state: AccountState::Active,
        }
    }

    pub fn owner(mut self, owner_id: CustomerId) -> Self {
        self.owner_id = owner_id;
        self
    }

    pub fn opening_balance(mut self, amount: impl Into<String>) -> Self {
        self.opening_balance = amount.into();
        self
    }

    pub fn blocked(mut self) -> Self {
        self.state = AccountState::Blocked;
        self
    }

    /// Closed accounts must open at zero
    pub fn inactive(mut self) -> Self {
        self.state = AccountState::Inactive;
        self.opening_balance = Money::ZERO.to_string();
        self
    }

    /// Opens the account and moves it to the requested state
    pub async fn open<S: LedgerStore>(
        self,
        engine: &LedgerEngine<S>,
    ) -> Result<Account, LedgerError> {
        let account = engine.open_account(self.owner_id, &self.opening_balance).await?;
        if self.state == AccountState::Active {
            return Ok(account);
        }
        engine.change_state(account.id(), self.state).await
    }

    /// Builds the account in memory without a store
    pub fn build_detached(self, opened_at: DateTime<Utc>) -> Result<Account, LedgerError> {
        let balance = Money::parse(&self.opening_balance, Default::default())?;
        let mut account = Account::open(self.owner_id, balance, opened_at)?;
        account.transition_to(self.state)?;
        Ok(account)
    }
}

/// Builder for movement requests
pub struct MovementRequestBuilder {
    account_id: AccountId,
    movement_type: MovementType,
    amount: String,
    idempotency_key: Option<String>,
    note: Option<String>,
    actor: String,
}

impl MovementRequestBuilder {
    pub fn credit(account_id: AccountId) -> Self {
        Self::new(account_id, MovementType::Credit)
    }

    pub fn debit(account_id: AccountId) -> Self {
        Self::new(account_id, MovementType::Debit)
    }

    fn new(account_id: AccountId, movement_type: MovementType) -> Self {
        Self {
            account_id,
            movement_type,
            amount: MoneyFixtures::hundred().to_string(),
            idempotency_key: None,
            note: None,
            actor: ActorFixtures::teller(),
        }
    }

    pub fn amount(mut self, amount: impl Into<String>) -> Self {
        self.amount = amount.into();
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    pub fn with_random_note(mut self) -> Self {
        self.note = Some(ActorFixtures::note());
        self
    }

    pub fn actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    pub fn build(self) -> MovementRequest {
        let mut request =
            MovementRequest::new(self.account_id, self.movement_type, self.amount, self.actor);
        request.idempotency_key = self.idempotency_key;
        request.note = self.note;
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TemporalFixtures;

    #[test]
    fn test_detached_account_defaults() {
        let account = TestAccountBuilder::new()
            .build_detached(TemporalFixtures::business_morning())
            .unwrap();
        assert_eq!(account.balance(), MoneyFixtures::opening_balance());
        assert!(account.can_operate());
    }

    #[test]
    fn test_inactive_builder_opens_at_zero() {
        let account = TestAccountBuilder::new()
            .inactive()
            .build_detached(TemporalFixtures::business_morning())
            .unwrap();
        assert_eq!(account.state(), AccountState::Inactive);
    }

    #[test]
    fn test_request_builder() {
        let id = AccountId::new();
        let request = MovementRequestBuilder::debit(id).amount("12.34").key("abc").build();

        assert_eq!(request.account_id, id);
        assert_eq!(request.movement_type, MovementType::Debit);
        assert_eq!(request.normalized_key(), Some("abc"));
    }
}
