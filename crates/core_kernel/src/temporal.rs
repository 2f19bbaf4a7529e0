//! Time handling for the ledger
//!
//! All day boundaries are computed on a fixed UTC reference clock. The daily
//! debit cap and statement ranges both go through this module so that the
//! engine and the accumulator can never disagree on where a day starts.

use chrono::{DateTime, Days, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use thiserror::Error;

/// Errors related to temporal operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid range: from {from} must not be after to {to}")]
    InvalidRange { from: NaiveDate, to: NaiveDate },

    #[error("Date out of supported range: {0}")]
    OutOfRange(NaiveDate),
}

/// Source of the current instant
///
/// The engine assigns movement timestamps from a `Clock`, never from the
/// caller.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to
#[derive(Debug)]
pub struct FixedClock {
    instant: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant: RwLock::new(instant),
        }
    }

    /// Moves the clock to `instant`
    pub fn set(&self, instant: DateTime<Utc>) {
        let mut guard = self.instant.write().unwrap_or_else(|e| e.into_inner());
        *guard = instant;
    }

    /// Moves the clock forward by `by`
    pub fn advance(&self, by: Duration) {
        let mut guard = self.instant.write().unwrap_or_else(|e| e.into_inner());
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.instant.read().unwrap_or_else(|e| e.into_inner())
    }
}

/// Midnight UTC at the start of `date`
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// A half-open UTC calendar day `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    /// The UTC day containing `instant`
    pub fn containing(instant: DateTime<Utc>) -> Self {
        let start = start_of_day(instant.date_naive());
        Self {
            start,
            end: start + Duration::days(1),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }
}

/// An inclusive range of calendar dates, resolved to UTC instants
///
/// `from = 2024-03-01, to = 2024-03-31` covers
/// `[2024-03-01T00:00Z, 2024-04-01T00:00Z)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, TemporalError> {
        if from > to {
            return Err(TemporalError::InvalidRange { from, to });
        }
        to.checked_add_days(Days::new(1))
            .ok_or(TemporalError::OutOfRange(to))?;
        Ok(Self { from, to })
    }

    /// A range covering a single day
    pub fn single_day(date: NaiveDate) -> Result<Self, TemporalError> {
        Self::new(date, date)
    }

    pub fn from_date(&self) -> NaiveDate {
        self.from
    }

    pub fn to_date(&self) -> NaiveDate {
        self.to
    }

    /// First instant inside the range
    pub fn start(&self) -> DateTime<Utc> {
        start_of_day(self.from)
    }

    /// First instant after the range (end of `to`, exclusive)
    pub fn end_exclusive(&self) -> DateTime<Utc> {
        // checked in `new`
        start_of_day(self.to) + Duration::days(1)
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start() && instant < self.end_exclusive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_day_window_is_utc_midnight_to_midnight() {
        let instant = Utc.with_ymd_and_hms(2024, 5, 17, 23, 59, 59).unwrap();
        let window = DayWindow::containing(instant);

        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 5, 17, 0, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2024, 5, 18, 0, 0, 0).unwrap());
        assert!(window.contains(instant));
        assert!(!window.contains(window.end));
    }

    #[test]
    fn test_date_range_rejects_inverted_bounds() {
        let from = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(matches!(
            DateRange::new(from, to),
            Err(TemporalError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_fixed_clock_advances() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let clock = FixedClock::new(start);
        clock.advance(Duration::hours(13));
        assert_eq!(clock.now(), Utc.with_ymd_and_hms(2024, 1, 2, 1, 0, 0).unwrap());
    }
}
