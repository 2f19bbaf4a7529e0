//! Money types with exact two-digit decimal arithmetic
//!
//! Every `Money` value is stored as a `rust_decimal::Decimal` rescaled to
//! exactly [`Money::SCALE`] fractional digits. Rounding happens once, when a
//! raw amount enters the system, using a single configured [`RoundingMode`].
//! Arithmetic on already-normalized values is exact and never rounds again.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during money operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Amount must be greater than zero, got {0}")]
    NonPositive(Decimal),

    #[error("Amount {0} has more than two fractional digits")]
    Precision(Decimal),

    #[error("Overflow during calculation")]
    Overflow,
}

/// Rounding rule applied when a raw amount is normalized to two digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Round half to even ("banker's rounding")
    #[default]
    HalfEven,
    /// Round half away from zero
    HalfUp,
    /// Round half toward zero
    HalfDown,
    /// Always away from zero
    Up,
    /// Always toward zero (truncate)
    Down,
}

impl RoundingMode {
    /// Returns the matching `rust_decimal` strategy
    pub fn strategy(&self) -> RoundingStrategy {
        match self {
            RoundingMode::HalfEven => RoundingStrategy::MidpointNearestEven,
            RoundingMode::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            RoundingMode::HalfDown => RoundingStrategy::MidpointTowardZero,
            RoundingMode::Up => RoundingStrategy::AwayFromZero,
            RoundingMode::Down => RoundingStrategy::ToZero,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoundingMode::HalfEven => "half_even",
            RoundingMode::HalfUp => "half_up",
            RoundingMode::HalfDown => "half_down",
            RoundingMode::Up => "up",
            RoundingMode::Down => "down",
        }
    }
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoundingMode {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "half_even" | "bankers" => Ok(RoundingMode::HalfEven),
            "half_up" => Ok(RoundingMode::HalfUp),
            "half_down" => Ok(RoundingMode::HalfDown),
            "up" => Ok(RoundingMode::Up),
            "down" => Ok(RoundingMode::Down),
            other => Err(MoneyError::InvalidAmount(format!(
                "unknown rounding mode '{}'",
                other
            ))),
        }
    }
}

/// A monetary amount fixed to two fractional digits
///
/// Two values are equal iff their scaled integer representations are equal;
/// there is no epsilon tolerance anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Number of fractional digits every value carries
    pub const SCALE: u32 = 2;

    /// Zero
    pub const ZERO: Money = Money(Decimal::from_parts(0, 0, 0, false, Self::SCALE));

    /// Rounds `raw` to two digits using `mode`
    pub fn normalize(raw: Decimal, mode: RoundingMode) -> Self {
        let mut value = raw.round_dp_with_strategy(Self::SCALE, mode.strategy());
        value.rescale(Self::SCALE);
        Self(value)
    }

    /// Normalizes `raw` and rejects anything that is not strictly positive
    ///
    /// This is the entry point for movement amounts: `0.004` rounds to `0.00`
    /// under half-even and is therefore rejected.
    pub fn positive(raw: Decimal, mode: RoundingMode) -> Result<Self, MoneyError> {
        let money = Self::normalize(raw, mode);
        if !money.is_positive() {
            return Err(MoneyError::NonPositive(money.0));
        }
        Ok(money)
    }

    /// Parses a plain decimal string and normalizes it
    ///
    /// Scientific notation and empty input are rejected.
    pub fn parse(text: &str, mode: RoundingMode) -> Result<Self, MoneyError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(MoneyError::InvalidAmount("empty amount".to_string()));
        }
        if trimmed.contains(['e', 'E']) {
            return Err(MoneyError::InvalidAmount(format!(
                "scientific notation is not accepted: '{}'",
                trimmed
            )));
        }
        let raw = Decimal::from_str(trimmed)
            .map_err(|e| MoneyError::InvalidAmount(format!("'{}': {}", trimmed, e)))?;
        Ok(Self::normalize(raw, mode))
    }

    /// Parses a movement amount: [`Money::parse`] followed by the positivity rule
    pub fn parse_positive(text: &str, mode: RoundingMode) -> Result<Self, MoneyError> {
        let money = Self::parse(text, mode)?;
        if !money.is_positive() {
            return Err(MoneyError::NonPositive(money.0));
        }
        Ok(money)
    }

    /// Creates Money from an integer amount of cents
    pub fn from_minor(minor_units: i64) -> Self {
        Self(Decimal::new(minor_units, Self::SCALE))
    }

    /// Returns the amount as an integer number of cents
    pub fn minor_units(&self) -> i128 {
        self.0.mantissa()
    }

    /// Returns the underlying decimal (always scale 2)
    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Exact addition
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.0
            .checked_add(other.0)
            .map(Self::rescaled)
            .ok_or(MoneyError::Overflow)
    }

    /// Exact subtraction
    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.0
            .checked_sub(other.0)
            .map(Self::rescaled)
            .ok_or(MoneyError::Overflow)
    }

    /// Sums an iterator of money values without panicking on overflow
    pub fn checked_sum<'a, I>(values: I) -> Result<Money, MoneyError>
    where
        I: IntoIterator<Item = &'a Money>,
    {
        values
            .into_iter()
            .try_fold(Money::ZERO, |acc, value| acc.checked_add(value))
    }

    fn rescaled(mut value: Decimal) -> Self {
        value.rescale(Self::SCALE);
        Self(value)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::ZERO
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    /// Accepts only values that are already exact at two digits
    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        if value.round_dp(Self::SCALE) != value {
            return Err(MoneyError::Precision(value));
        }
        Ok(Self::rescaled(value))
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Decimal {
        money.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.checked_add(&other).expect("Overflow in Money::add")
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        self.checked_sub(&other).expect("Overflow in Money::sub")
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn normalize_is_idempotent(
            mantissa in -1_000_000_000i64..1_000_000_000i64,
            scale in 0u32..6u32,
        ) {
            let raw = Decimal::new(mantissa, scale);
            let once = Money::normalize(raw, RoundingMode::HalfEven);
            let twice = Money::normalize(once.amount(), RoundingMode::HalfEven);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn add_then_sub_round_trips(
            a in -1_000_000_000i64..1_000_000_000i64,
            b in -1_000_000_000i64..1_000_000_000i64
        ) {
            let ma = Money::from_minor(a);
            let mb = Money::from_minor(b);
            prop_assert_eq!(ma.checked_add(&mb).unwrap().checked_sub(&mb).unwrap(), ma);
        }
    }
}
