//! Ledger configuration
//!
//! Built once at process start and handed to the engine constructor. The
//! engine never reads configuration from anywhere else.

use serde::{Deserialize, Serialize};

use core_kernel::{Money, RoundingMode};

use crate::error::LedgerError;

/// Default daily debit cap: 1000.00
pub const DEFAULT_DAILY_DEBIT_CAP_MINOR: i64 = 100_000;

/// Process-wide, read-only ledger settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    daily_debit_cap: Money,
    rounding_mode: RoundingMode,
}

impl LedgerConfig {
    /// Creates a configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` unless the cap is strictly positive
    pub fn new(daily_debit_cap: Money, rounding_mode: RoundingMode) -> Result<Self, LedgerError> {
        if !daily_debit_cap.is_positive() {
            return Err(LedgerError::InvalidAmount(format!(
                "daily debit cap must be positive, got {}",
                daily_debit_cap
            )));
        }
        Ok(Self {
            daily_debit_cap,
            rounding_mode,
        })
    }

    /// Parses the cap from text, rounding it with `rounding_mode`
    pub fn parse(daily_debit_cap: &str, rounding_mode: RoundingMode) -> Result<Self, LedgerError> {
        let cap = Money::parse(daily_debit_cap, rounding_mode)?;
        Self::new(cap, rounding_mode)
    }

    pub fn daily_debit_cap(&self) -> Money {
        self.daily_debit_cap
    }

    pub fn rounding_mode(&self) -> RoundingMode {
        self.rounding_mode
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            daily_debit_cap: Money::from_minor(DEFAULT_DAILY_DEBIT_CAP_MINOR),
            rounding_mode: RoundingMode::HalfEven,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.daily_debit_cap().to_string(), "1000.00");
        assert_eq!(config.rounding_mode(), RoundingMode::HalfEven);
    }

    #[test]
    fn test_cap_must_be_positive() {
        assert!(LedgerConfig::new(Money::ZERO, RoundingMode::HalfEven).is_err());
        assert!(LedgerConfig::parse("-10", RoundingMode::HalfEven).is_err());
        assert!(LedgerConfig::parse("250.5", RoundingMode::HalfUp).is_ok());
    }
}
