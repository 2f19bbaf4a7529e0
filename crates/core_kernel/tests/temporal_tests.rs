//! Unit tests for the Temporal module
//!
//! Tests cover UTC day windows, inclusive date ranges and the clocks.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use core_kernel::temporal::start_of_day;
use core_kernel::{Clock, DateRange, DayWindow, FixedClock, SystemClock, TemporalError};

mod day_window {
    use super::*;

    #[test]
    fn test_window_starts_at_utc_midnight() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 10, 8, 30, 0).unwrap();
        let window = DayWindow::containing(instant);

        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap());
        assert_eq!(window.end - window.start, Duration::days(1));
    }

    #[test]
    fn test_midnight_belongs_to_the_new_day() {
        let midnight = Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap();
        let previous = DayWindow::containing(midnight - Duration::nanoseconds(1));
        let current = DayWindow::containing(midnight);

        assert!(!previous.contains(midnight));
        assert!(current.contains(midnight));
        assert_eq!(previous.end, current.start);
    }

    #[test]
    fn test_window_crosses_month_and_year_boundaries() {
        let instant = Utc.with_ymd_and_hms(2023, 12, 31, 23, 0, 0).unwrap();
        let window = DayWindow::containing(instant);
        assert_eq!(window.end, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }
}

mod date_range {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_range_end_is_exclusive_end_of_day() {
        let range = DateRange::new(date(2024, 3, 1), date(2024, 3, 31)).unwrap();

        assert_eq!(range.start(), start_of_day(date(2024, 3, 1)));
        assert_eq!(range.end_exclusive(), start_of_day(date(2024, 4, 1)));
        assert!(range.contains(Utc.with_ymd_and_hms(2024, 3, 31, 23, 59, 59).unwrap()));
        assert!(!range.contains(Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_single_day_range() {
        let range = DateRange::single_day(date(2024, 2, 29)).unwrap();
        assert_eq!(range.from_date(), range.to_date());
        assert_eq!(range.end_exclusive() - range.start(), Duration::days(1));
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let result = DateRange::new(date(2024, 5, 2), date(2024, 5, 1));
        assert!(matches!(result, Err(TemporalError::InvalidRange { .. })));
    }

    #[test]
    fn test_range_at_calendar_limit_is_rejected() {
        let result = DateRange::new(NaiveDate::MAX, NaiveDate::MAX);
        assert!(matches!(result, Err(TemporalError::OutOfRange(_))));
    }
}

mod clocks {
    use super::*;

    #[test]
    fn test_fixed_clock_holds_still_until_set() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        let clock = FixedClock::new(at);
        assert_eq!(clock.now(), at);
        assert_eq!(clock.now(), at);

        let later = at + Duration::days(2);
        clock.set(later);
        assert_eq!(clock.now(), later);
    }

    #[test]
    fn test_system_clock_is_monotonic_enough() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
