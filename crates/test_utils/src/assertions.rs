//! Custom Test Assertions
//!
//! Ledger invariant checks with failure messages that point at the offending
//! movement rather than a bare boolean.

use core_kernel::Money;
use domain_ledger::{Account, LedgerError, Movement, MovementType};

/// Asserts that every movement's `balance_after` follows from its own fields
pub fn assert_movements_consistent(movements: &[Movement]) {
    for movement in movements {
        assert!(
            movement.is_consistent(),
            "Inconsistent movement {}: {} {} from {} to {}",
            movement.id,
            movement.movement_type,
            movement.amount,
            movement.balance_before,
            movement.balance_after
        );
    }
}

/// Asserts that one account's movements form an unbroken chain
///
/// Sorted by `(timestamp, sequence, id)`, each `balance_before` must equal the
/// previous `balance_after` and sequences must be consecutive.
pub fn assert_ledger_chain(movements: &[Movement]) {
    let mut sorted = movements.to_vec();
    sorted.sort_by_key(Movement::ordering_key);

    for pair in sorted.windows(2) {
        assert_eq!(
            pair[0].balance_after, pair[1].balance_before,
            "Chain broken between sequence {} and {}",
            pair[0].sequence, pair[1].sequence
        );
        assert_eq!(
            pair[0].sequence + 1,
            pair[1].sequence,
            "Sequence gap after {}",
            pair[0].sequence
        );
    }
    assert_movements_consistent(&sorted);
}

/// Asserts `balance == opening + credits - debits` for an account's full ledger
pub fn assert_conservation(account: &Account, movements: &[Movement]) {
    let mut expected = account.opening_balance().minor_units();
    for movement in movements.iter().filter(|m| m.account_id == account.id()) {
        match movement.movement_type {
            MovementType::Credit => expected += movement.amount.minor_units(),
            MovementType::Debit => expected -= movement.amount.minor_units(),
        }
    }
    assert_eq!(
        account.balance().minor_units(),
        expected,
        "Balance {} does not match opening balance plus movements",
        account.balance()
    );
}

/// Asserts that a balance is not negative
pub fn assert_non_negative(balance: Money) {
    assert!(!balance.is_negative(), "Negative balance {}", balance);
}

/// Asserts that an operation failed with `NotFound`
pub fn assert_not_found<T: std::fmt::Debug>(result: &Result<T, LedgerError>) {
    assert!(
        matches!(result, Err(LedgerError::NotFound(_))),
        "Expected NotFound, got {:?}",
        result
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use core_kernel::{AccountId, MovementId};

    fn movement(sequence: u64, before: i64, after: i64) -> Movement {
        let (movement_type, amount) = if after >= before {
            (MovementType::Credit, after - before)
        } else {
            (MovementType::Debit, before - after)
        };
        Movement {
            id: MovementId::new_v7(),
            account_id: AccountId::new(),
            movement_type,
            amount: Money::from_minor(amount),
            balance_before: Money::from_minor(before),
            balance_after: Money::from_minor(after),
            timestamp: Utc::now(),
            sequence,
            idempotency_key: None,
            note: None,
            actor: None,
        }
    }

    #[test]
    fn test_unbroken_chain_passes() {
        let now = Utc::now();
        let mut movements = vec![movement(1, 100, 150), movement(2, 150, 120)];
        for m in &mut movements {
            m.timestamp = now;
        }
        assert_ledger_chain(&movements);
    }

    #[test]
    #[should_panic(expected = "Chain broken")]
    fn test_broken_chain_panics() {
        let now = Utc::now();
        let mut movements = vec![movement(1, 100, 150), movement(2, 140, 120)];
        for m in &mut movements {
            m.timestamp = now;
        }
        assert_ledger_chain(&movements);
    }
}
