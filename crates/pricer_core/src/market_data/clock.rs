//! Per-evaluation valuation date.
//!
//! Every evaluation owns its own [`EvaluationClock`]; term structures built
//! for that evaluation take their reference date from it. Shifting the clock
//! (theta) therefore affects only that evaluation, and concurrent evaluations
//! on other threads never observe each other's dates.

use std::cell::Cell;
use std::rc::Rc;

use crate::types::{Date, DateError};

/// Mutable valuation date shared by the term structures of one evaluation.
///
/// # Example
///
/// ```
/// use pricer_core::market_data::EvaluationClock;
/// use pricer_core::types::Date;
///
/// let clock = EvaluationClock::shared(Date::from_ymd(2024, 6, 3).unwrap());
/// {
///     let _back = clock.shift_days(-1).unwrap();
///     assert_eq!(clock.date(), Date::from_ymd(2024, 6, 2).unwrap());
/// }
/// assert_eq!(clock.date(), Date::from_ymd(2024, 6, 3).unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct EvaluationClock {
    date: Cell<Date>,
}

impl EvaluationClock {
    /// Create a clock set to `date`.
    pub fn new(date: Date) -> Self {
        Self {
            date: Cell::new(date),
        }
    }

    /// Create a clock and wrap it for sharing between term structures.
    pub fn shared(date: Date) -> Rc<Self> {
        Rc::new(Self::new(date))
    }

    /// Current valuation date.
    #[inline]
    pub fn date(&self) -> Date {
        self.date.get()
    }

    /// Move the valuation date, returning the previous one.
    pub fn set_date(&self, date: Date) -> Date {
        self.date.replace(date)
    }

    /// Set the valuation date until the returned guard is dropped.
    #[must_use = "the clock is restored as soon as the guard is dropped"]
    pub fn set_scoped(&self, date: Date) -> ClockGuard<'_> {
        let original = self.set_date(date);
        ClockGuard {
            clock: self,
            original,
        }
    }

    /// Shift the valuation date by calendar days until the guard is dropped.
    pub fn shift_days(&self, days: i64) -> Result<ClockGuard<'_>, DateError> {
        let shifted = self.date().add_days(days)?;
        Ok(self.set_scoped(shifted))
    }
}

/// Restores the clock to its previous date on drop.
#[derive(Debug)]
pub struct ClockGuard<'a> {
    clock: &'a EvaluationClock,
    original: Date,
}

impl ClockGuard<'_> {
    /// Date the clock will be restored to.
    pub fn original(&self) -> Date {
        self.original
    }
}

impl Drop for ClockGuard<'_> {
    fn drop(&mut self) {
        self.clock.date.set(self.original);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_set_date_returns_previous() {
        let clock = EvaluationClock::new(d(2024, 1, 2));
        assert_eq!(clock.set_date(d(2024, 1, 3)), d(2024, 1, 2));
        assert_eq!(clock.date(), d(2024, 1, 3));
    }

    #[test]
    fn test_scoped_set_restores() {
        let clock = EvaluationClock::new(d(2024, 1, 2));
        {
            let guard = clock.set_scoped(d(2030, 1, 1));
            assert_eq!(guard.original(), d(2024, 1, 2));
            assert_eq!(clock.date(), d(2030, 1, 1));
        }
        assert_eq!(clock.date(), d(2024, 1, 2));
    }

    #[test]
    fn test_shift_out_of_range_leaves_clock_untouched() {
        let clock = EvaluationClock::new(d(2024, 1, 2));
        assert!(clock.shift_days(i64::MIN).is_err());
        assert_eq!(clock.date(), d(2024, 1, 2));
    }

    #[test]
    fn test_independent_clocks() {
        let a = EvaluationClock::shared(d(2024, 1, 2));
        let b = EvaluationClock::shared(d(2024, 1, 2));
        let _g = a.shift_days(-1).unwrap();
        assert_eq!(a.date(), d(2024, 1, 1));
        assert_eq!(b.date(), d(2024, 1, 2));
    }
}
