//! Statement DTOs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{AccountId, Money};
use domain_ledger::{AccountStatement, StatementResult};

use crate::dto::movement::MovementResponse;
use crate::error::ApiError;

/// Query of `GET /statements?accounts=a,b&from=YYYY-MM-DD&to=YYYY-MM-DD`
#[derive(Debug, Deserialize)]
pub struct StatementQuery {
    pub accounts: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl StatementQuery {
    /// Comma-separated account ids; blanks between commas are skipped
    pub fn account_ids(&self) -> Result<Vec<AccountId>, ApiError> {
        self.accounts
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<AccountId>()
                    .map_err(|_| ApiError::BadRequest(format!("invalid account id '{}'", part)))
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct AccountStatementResponse {
    pub account_id: AccountId,
    pub opening_balance: Money,
    pub closing_balance: Money,
    pub total_credits: Money,
    pub total_debits: Money,
    pub movement_count: usize,
}

impl From<AccountStatement> for AccountStatementResponse {
    fn from(statement: AccountStatement) -> Self {
        Self {
            account_id: statement.account_id,
            opening_balance: statement.opening_balance,
            closing_balance: statement.closing_balance,
            total_credits: statement.total_credits,
            total_debits: statement.total_debits,
            movement_count: statement.movement_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatementResponse {
    pub account_ids: Vec<AccountId>,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub opening_balance: Money,
    pub closing_balance: Money,
    pub total_credits: Money,
    pub total_debits: Money,
    pub accounts: Vec<AccountStatementResponse>,
    pub movements: Vec<MovementResponse>,
}

impl From<StatementResult> for StatementResponse {
    fn from(result: StatementResult) -> Self {
        Self {
            account_ids: result.account_ids,
            from: result.from,
            to: result.to,
            opening_balance: result.opening_balance,
            closing_balance: result.closing_balance,
            total_credits: result.total_credits,
            total_debits: result.total_debits,
            accounts: result.accounts.into_iter().map(Into::into).collect(),
            movements: result.movements.into_iter().map(Into::into).collect(),
        }
    }
}
