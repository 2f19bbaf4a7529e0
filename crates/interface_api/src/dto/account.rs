//! Account DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{AccountId, CustomerId, Money};
use domain_ledger::{Account, AccountState};

/// Body of `POST /accounts`
///
/// Amounts travel as decimal strings so no precision is lost in JSON.
#[derive(Debug, Deserialize, Validate)]
pub struct OpenAccountRequest {
    pub owner_id: Uuid,
    #[validate(length(min = 1, max = 32))]
    pub opening_balance: String,
}

impl OpenAccountRequest {
    pub fn owner(&self) -> CustomerId {
        CustomerId::from_uuid(self.owner_id)
    }
}

#[derive(Debug, Deserialize)]
pub struct ChangeStateRequest {
    pub state: AccountState,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: AccountId,
    pub owner_id: CustomerId,
    pub state: AccountState,
    pub balance: Money,
    pub opening_balance: Money,
    pub opened_at: DateTime<Utc>,
    pub last_movement_at: Option<DateTime<Utc>>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id(),
            owner_id: account.owner_id(),
            state: account.state(),
            balance: account.balance(),
            opening_balance: account.opening_balance(),
            opened_at: account.opened_at(),
            last_movement_at: account.last_movement_at(),
        }
    }
}
