//! Statement aggregation
//!
//! A statement folds the movements of one or more accounts over an inclusive
//! range of UTC calendar dates into totals and boundary balances. Boundaries
//! are computed per account and then summed, so multi-account statements stay
//! correct when accounts have movements in different parts of the range.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use core_kernel::{AccountId, DateRange, Money};

use crate::account::Account;
use crate::error::LedgerError;
use crate::movement::{Movement, MovementType};

/// Per-account part of a statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStatement {
    pub account_id: AccountId,
    pub opening_balance: Money,
    pub closing_balance: Money,
    pub total_credits: Money,
    pub total_debits: Money,
    pub movement_count: usize,
}

/// Read-only aggregation of movements over a date range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementResult {
    pub account_ids: Vec<AccountId>,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub opening_balance: Money,
    pub closing_balance: Money,
    pub total_credits: Money,
    pub total_debits: Money,
    pub accounts: Vec<AccountStatement>,
    /// In-range movements ordered by `(timestamp, sequence, id)`
    pub movements: Vec<Movement>,
}

/// Builds a statement from already-fetched data
///
/// `accounts` supplies the current balances used for accounts without any
/// in-range movement. Movements outside `range` or belonging to other
/// accounts are ignored.
pub fn fold_statement(
    range: &DateRange,
    accounts: &[Account],
    movements: Vec<Movement>,
) -> Result<StatementResult, LedgerError> {
    let mut in_range: Vec<Movement> = movements
        .into_iter()
        .filter(|m| range.contains(m.timestamp))
        .filter(|m| accounts.iter().any(|a| a.id() == m.account_id))
        .collect();
    in_range.sort_by_key(Movement::ordering_key);

    let mut by_account: HashMap<AccountId, Vec<&Movement>> = HashMap::new();
    for movement in &in_range {
        by_account.entry(movement.account_id).or_default().push(movement);
    }

    let mut summaries = Vec::with_capacity(accounts.len());
    for account in accounts {
        let summary = match by_account.get(&account.id()) {
            Some(ledger) => summarize(account.id(), ledger)?,
            None => AccountStatement {
                account_id: account.id(),
                opening_balance: account.balance(),
                closing_balance: account.balance(),
                total_credits: Money::ZERO,
                total_debits: Money::ZERO,
                movement_count: 0,
            },
        };
        summaries.push(summary);
    }

    let opening_balance = Money::checked_sum(summaries.iter().map(|s| &s.opening_balance))?;
    let closing_balance = Money::checked_sum(summaries.iter().map(|s| &s.closing_balance))?;
    let total_credits = Money::checked_sum(summaries.iter().map(|s| &s.total_credits))?;
    let total_debits = Money::checked_sum(summaries.iter().map(|s| &s.total_debits))?;

    Ok(StatementResult {
        account_ids: accounts.iter().map(Account::id).collect(),
        from: range.from_date(),
        to: range.to_date(),
        opening_balance,
        closing_balance,
        total_credits,
        total_debits,
        accounts: summaries,
        movements: in_range,
    })
}

fn summarize(account_id: AccountId, ledger: &[&Movement]) -> Result<AccountStatement, LedgerError> {
    let mut total_credits = Money::ZERO;
    let mut total_debits = Money::ZERO;
    for movement in ledger {
        match movement.movement_type {
            MovementType::Credit => total_credits = total_credits.checked_add(&movement.amount)?,
            MovementType::Debit => total_debits = total_debits.checked_add(&movement.amount)?,
        }
    }

    // ledger is non-empty: callers only summarize accounts with movements
    let opening_balance = ledger.first().map(|m| m.balance_before).unwrap_or_default();
    let closing_balance = ledger.last().map(|m| m.balance_after).unwrap_or_default();

    Ok(AccountStatement {
        account_id,
        opening_balance,
        closing_balance,
        total_credits,
        total_debits,
        movement_count: ledger.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use core_kernel::{CustomerId, MovementId};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, day, hour, 0, 0).unwrap()
    }

    fn movement(
        account: &Account,
        sequence: u64,
        movement_type: MovementType,
        before: i64,
        amount: i64,
        timestamp: DateTime<Utc>,
    ) -> Movement {
        let after = match movement_type {
            MovementType::Credit => before + amount,
            MovementType::Debit => before - amount,
        };
        Movement {
            id: MovementId::new_v7(),
            account_id: account.id(),
            movement_type,
            amount: Money::from_minor(amount),
            balance_before: Money::from_minor(before),
            balance_after: Money::from_minor(after),
            timestamp,
            sequence,
            idempotency_key: None,
            note: None,
            actor: None,
        }
    }

    fn range(from: u32, to: u32) -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 4, from).unwrap(),
            NaiveDate::from_ymd_opt(2024, 4, to).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_boundaries_come_from_first_and_last_movement() {
        let account =
            Account::open(CustomerId::new(), Money::from_minor(10_000), at(1, 8)).unwrap();
        let movements = vec![
            movement(&account, 2, MovementType::Debit, 15_000, 2_500, at(3, 12)),
            movement(&account, 1, MovementType::Credit, 10_000, 5_000, at(2, 9)),
            movement(&account, 3, MovementType::Credit, 12_500, 100, at(9, 9)),
        ];

        let statement = fold_statement(&range(2, 3), &[account], movements).unwrap();

        assert_eq!(statement.opening_balance, Money::from_minor(10_000));
        assert_eq!(statement.closing_balance, Money::from_minor(12_500));
        assert_eq!(statement.total_credits, Money::from_minor(5_000));
        assert_eq!(statement.total_debits, Money::from_minor(2_500));
        assert_eq!(statement.movements.len(), 2);
        assert_eq!(statement.movements[0].sequence, 1);
    }

    #[test]
    fn test_quiet_account_uses_current_balance() {
        let account = Account::open(CustomerId::new(), Money::from_minor(7_700), at(1, 8)).unwrap();
        let statement = fold_statement(&range(5, 6), &[account], Vec::new()).unwrap();

        assert_eq!(statement.opening_balance, Money::from_minor(7_700));
        assert_eq!(statement.closing_balance, Money::from_minor(7_700));
        assert!(statement.total_credits.is_zero());
        assert_eq!(statement.accounts[0].movement_count, 0);
    }

    #[test]
    fn test_multi_account_boundaries_are_summed() {
        let first = Account::open(CustomerId::new(), Money::from_minor(1_000), at(1, 8)).unwrap();
        let second = Account::open(CustomerId::new(), Money::from_minor(3_000), at(1, 8)).unwrap();
        let movements = vec![
            movement(&first, 1, MovementType::Credit, 1_000, 500, at(2, 10)),
            movement(&second, 1, MovementType::Debit, 3_000, 1_000, at(2, 11)),
        ];

        let statement = fold_statement(&range(2, 2), &[first, second], movements).unwrap();

        assert_eq!(statement.opening_balance, Money::from_minor(4_000));
        assert_eq!(statement.closing_balance, Money::from_minor(3_500));
        assert_eq!(statement.accounts.len(), 2);
    }
}
