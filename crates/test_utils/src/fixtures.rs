//! Pre-built Test Fixtures
//!
//! Consistent, predictable values for ledger tests: fixed instants, common
//! amounts and engines wired to the in-memory store and a fixed clock.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::Name;
use fake::Fake;
use std::sync::Arc;

use core_kernel::{CustomerId, FixedClock, Money, RoundingMode};
use domain_ledger::{InMemoryLedgerStore, LedgerConfig, LedgerEngine, LedgerStore};

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// The default daily debit cap, 1000.00
    pub fn daily_cap() -> Money {
        Money::from_minor(100_000)
    }

    /// A comfortable opening balance, 2000.00
    pub fn opening_balance() -> Money {
        Money::from_minor(200_000)
    }

    pub fn hundred() -> Money {
        Money::from_minor(10_000)
    }

    pub fn cent() -> Money {
        Money::from_minor(1)
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Mid-morning on a business day
    pub fn business_morning() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap()
    }

    /// Half an hour before UTC midnight
    pub fn just_before_midnight() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 23, 30, 0).unwrap()
    }

    pub fn business_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    }
}

/// Fixture for people and free text
pub struct ActorFixtures;

impl ActorFixtures {
    /// A random teller name
    pub fn teller() -> String {
        Name().fake()
    }

    /// A random movement note
    pub fn note() -> String {
        Sentence(2..6).fake()
    }

    pub fn customer() -> CustomerId {
        CustomerId::new()
    }
}

/// An engine with its clock handle, for tests that move time
pub struct EngineFixture<S: LedgerStore> {
    pub engine: Arc<LedgerEngine<S>>,
    pub clock: Arc<FixedClock>,
}

impl<S: LedgerStore> EngineFixture<S> {
    /// Engine over `store` with the default config, frozen at a business morning
    pub fn with_store(store: S) -> Self {
        Self::with_config(store, LedgerConfig::default())
    }

    pub fn with_config(store: S, config: LedgerConfig) -> Self {
        let clock = Arc::new(FixedClock::new(TemporalFixtures::business_morning()));
        let engine = Arc::new(LedgerEngine::new(store, config, clock.clone()));
        Self { engine, clock }
    }
}

impl EngineFixture<InMemoryLedgerStore> {
    /// Engine over a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::with_store(InMemoryLedgerStore::new())
    }

    /// Engine over a fresh in-memory store with a custom daily cap
    pub fn with_cap(cap: &str) -> Self {
        let config = LedgerConfig::parse(cap, RoundingMode::HalfEven).unwrap();
        Self::with_config(InMemoryLedgerStore::new(), config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_amounts_are_normalized() {
        assert_eq!(MoneyFixtures::daily_cap().to_string(), "1000.00");
        assert_eq!(MoneyFixtures::cent().to_string(), "0.01");
    }

    #[test]
    fn test_fake_actor_is_not_blank() {
        assert!(!ActorFixtures::teller().trim().is_empty());
        assert!(!ActorFixtures::note().trim().is_empty());
    }
}
