//! Daily debit cap
//!
//! The cap bounds the sum of an account's debits within one UTC calendar day.
//! Consumption is derived from the stored movements, read inside the same unit
//! of work that holds the account lock, so two concurrent debits can never
//! both see the pre-debit total.

use chrono::{DateTime, Utc};

use core_kernel::{AccountId, DayWindow, Money};

use crate::error::LedgerError;
use crate::ports::LedgerTransaction;

/// Checks debits against the configured per-day cap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyCapAccumulator {
    cap: Money,
}

impl DailyCapAccumulator {
    pub fn new(cap: Money) -> Self {
        Self { cap }
    }

    /// Debits already applied on the UTC day containing `at`
    pub async fn consumed<T: LedgerTransaction>(
        &self,
        tx: &mut T,
        account_id: AccountId,
        at: DateTime<Utc>,
    ) -> Result<Money, LedgerError> {
        let window = DayWindow::containing(at);
        Ok(tx.sum_debits(account_id, window).await?)
    }

    /// Fails with `DailyCapExceeded` if `consumed + requested > cap`
    ///
    /// Reaching the cap exactly is allowed.
    pub fn check(&self, consumed: Money, requested: Money) -> Result<(), LedgerError> {
        let total = consumed.checked_add(&requested)?;
        if total > self.cap {
            return Err(LedgerError::DailyCapExceeded {
                consumed,
                requested,
                cap: self.cap,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cap() -> DailyCapAccumulator {
        DailyCapAccumulator::new(Money::from_minor(100_000))
    }

    #[test]
    fn test_exact_cap_is_allowed() {
        assert!(cap().check(Money::from_minor(60_000), Money::from_minor(40_000)).is_ok());
    }

    #[test]
    fn test_one_cent_over_is_rejected() {
        let result = cap().check(Money::from_minor(60_000), Money::from_minor(40_001));
        assert_eq!(
            result,
            Err(LedgerError::DailyCapExceeded {
                consumed: Money::from_minor(60_000),
                requested: Money::from_minor(40_001),
                cap: Money::from_minor(100_000),
            })
        );
    }
}
