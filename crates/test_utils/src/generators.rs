//! Property-Based Test Generators
//!
//! Proptest strategies that produce ledger inputs: amounts as the decimal
//! strings callers send, operation sequences and date ranges.

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::Money;
use domain_ledger::MovementType;

/// Positive amounts in minor units, up to 10_000.00
pub fn positive_minor_strategy() -> impl Strategy<Value = i64> {
    1i64..=1_000_000
}

/// Normalized positive Money values
pub fn positive_money_strategy() -> impl Strategy<Value = Money> {
    positive_minor_strategy().prop_map(Money::from_minor)
}

/// Raw decimal strings with up to four fractional digits
///
/// Some of these round to zero and must be rejected as amounts.
pub fn raw_amount_strategy() -> impl Strategy<Value = String> {
    (0i64..100_000_000, 0u32..=4)
        .prop_map(|(mantissa, scale)| Decimal::new(mantissa, scale).to_string())
}

pub fn movement_type_strategy() -> impl Strategy<Value = MovementType> {
    prop_oneof![Just(MovementType::Credit), Just(MovementType::Debit)]
}

/// A single ledger operation: direction and amount in minor units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub movement_type: MovementType,
    pub minor_units: i64,
}

impl Operation {
    pub fn amount(&self) -> String {
        Money::from_minor(self.minor_units).to_string()
    }
}

pub fn operation_strategy() -> impl Strategy<Value = Operation> {
    (movement_type_strategy(), 1i64..=50_000).prop_map(|(movement_type, minor_units)| Operation {
        movement_type,
        minor_units,
    })
}

/// Sequences of 1 to `max_len` operations
pub fn operations_strategy(max_len: usize) -> impl Strategy<Value = Vec<Operation>> {
    prop::collection::vec(operation_strategy(), 1..=max_len.max(1))
}

/// Inclusive date ranges of up to 60 days in 2024
pub fn date_range_strategy() -> impl Strategy<Value = (NaiveDate, NaiveDate)> {
    (0i64..300, 0i64..60).prop_map(|(offset, length)| {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
        let from = base + Duration::days(offset);
        (from, from + Duration::days(length))
    })
}
