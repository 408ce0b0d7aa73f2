//! Dates and day count conventions.
//!
//! This module provides:
//! - `Date`: Type-safe date wrapper around chrono::NaiveDate
//! - `DayCountConvention`: Year fraction conventions
//!
//! # Examples
//!
//! ```
//! use pricer_core::types::time::{Date, DayCountConvention};
//!
//! let start = Date::from_ymd(2024, 1, 1).unwrap();
//! let end = Date::from_ymd(2024, 7, 1).unwrap();
//!
//! let yf = DayCountConvention::Actual365Fixed.year_fraction(start, end);
//! assert!((yf - 0.4986).abs() < 0.001);
//! ```

use chrono::{Datelike, Days, Local, NaiveDate, Weekday};
use std::fmt;
use std::ops::Sub;
use std::str::FromStr;

use super::error::DateError;

/// Type-safe date wrapper around chrono::NaiveDate.
///
/// # Examples
///
/// ```
/// use pricer_core::types::time::Date;
///
/// let date = Date::from_ymd(2024, 6, 15).unwrap();
/// let parsed: Date = "2024-06-15".parse().unwrap();
/// assert_eq!(date, parsed);
///
/// let later = date.add_days(10).unwrap();
/// assert_eq!(later - date, 10);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Date(NaiveDate);

impl Date {
    /// Creates a Date from year, month, and day components.
    ///
    /// # Returns
    /// `Ok(Date)` if the date is valid, `Err(DateError::InvalidDate)` otherwise.
    ///
    /// # Examples
    ///
    /// ```
    /// use pricer_core::types::time::Date;
    ///
    /// assert!(Date::from_ymd(2024, 2, 29).is_ok());
    /// assert!(Date::from_ymd(2023, 2, 29).is_err());
    /// ```
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, DateError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Date)
            .ok_or(DateError::InvalidDate { year, month, day })
    }

    /// Returns today's date based on local system time.
    pub fn today() -> Self {
        Date(Local::now().date_naive())
    }

    /// Parses a date from ISO 8601 format string (YYYY-MM-DD).
    ///
    /// # Examples
    ///
    /// ```
    /// use pricer_core::types::time::Date;
    ///
    /// assert!(Date::parse("2024-06-15").is_ok());
    /// assert!(Date::parse("not-a-date").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, DateError> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Date)
            .map_err(|e| DateError::ParseError(e.to_string()))
    }

    /// Returns the underlying NaiveDate.
    pub fn into_inner(self) -> NaiveDate {
        self.0
    }

    /// Returns the year component.
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Returns the month component (1-12).
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Returns the day component (1-31).
    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// Returns the day of the week.
    pub fn weekday(&self) -> Weekday {
        self.0.weekday()
    }

    /// Whether the date falls on Saturday or Sunday.
    pub fn is_weekend(&self) -> bool {
        matches!(self.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// Shifts the date by a signed number of calendar days.
    ///
    /// # Returns
    /// `Err(DateError::OutOfRange)` if the result is not representable.
    ///
    /// # Examples
    ///
    /// ```
    /// use pricer_core::types::time::Date;
    ///
    /// let d = Date::from_ymd(2024, 3, 1).unwrap();
    /// assert_eq!(d.add_days(-1).unwrap(), Date::from_ymd(2024, 2, 29).unwrap());
    /// ```
    pub fn add_days(self, days: i64) -> Result<Self, DateError> {
        let shifted = if days >= 0 {
            self.0.checked_add_days(Days::new(days.unsigned_abs()))
        } else {
            self.0.checked_sub_days(Days::new(days.unsigned_abs()))
        };
        shifted.map(Date).ok_or_else(|| DateError::OutOfRange {
            date: self.to_string(),
            days,
        })
    }
}

impl Sub for Date {
    type Output = i64;

    /// Returns the signed number of days between two dates.
    fn sub(self, other: Self) -> i64 {
        (self.0 - other.0).num_days()
    }
}

impl From<NaiveDate> for Date {
    fn from(date: NaiveDate) -> Self {
        Date(date)
    }
}

impl FromStr for Date {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, DateError> {
        Date::parse(s)
    }
}

impl fmt::Display for Date {
    /// Formats the date as ISO 8601 (YYYY-MM-DD).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Day count convention for year fractions.
///
/// Every term structure and process in the workspace measures time on
/// Actual/365 Fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DayCountConvention {
    /// Actual/365 Fixed: actual_days / 365.0
    #[default]
    Actual365Fixed,
}

impl DayCountConvention {
    /// Returns the standard convention name.
    ///
    /// # Examples
    ///
    /// ```
    /// use pricer_core::types::time::DayCountConvention;
    ///
    /// assert_eq!(DayCountConvention::Actual365Fixed.name(), "ACT/365F");
    /// ```
    pub fn name(&self) -> &'static str {
        match self {
            DayCountConvention::Actual365Fixed => "ACT/365F",
        }
    }

    /// Year fraction between two dates.
    ///
    /// Negative when `start > end`, so an expired maturity shows up as a
    /// negative time rather than a panic.
    ///
    /// # Examples
    ///
    /// ```
    /// use pricer_core::types::time::{Date, DayCountConvention};
    ///
    /// let start = Date::from_ymd(2024, 1, 1).unwrap();
    /// let end = Date::from_ymd(2024, 7, 1).unwrap();
    ///
    /// let yf = DayCountConvention::Actual365Fixed.year_fraction(start, end);
    /// assert!((yf - 182.0 / 365.0).abs() < 1e-12);
    /// assert!(DayCountConvention::Actual365Fixed.year_fraction(end, start) < 0.0);
    /// ```
    pub fn year_fraction(&self, start: Date, end: Date) -> f64 {
        match self {
            DayCountConvention::Actual365Fixed => (end - start) as f64 / 365.0,
        }
    }
}

impl fmt::Display for DayCountConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_date_round_trip_display() {
        let date = d(2024, 6, 5);
        assert_eq!(date.to_string(), "2024-06-05");
        assert_eq!("2024-06-05".parse::<Date>().unwrap(), date);
    }

    #[test]
    fn test_add_days_crosses_month_and_year() {
        assert_eq!(d(2023, 12, 30).add_days(3).unwrap(), d(2024, 1, 2));
        assert_eq!(d(2024, 1, 2).add_days(-3).unwrap(), d(2023, 12, 30));
        assert_eq!(d(2024, 1, 2).add_days(0).unwrap(), d(2024, 1, 2));
    }

    #[test]
    fn test_add_days_out_of_range() {
        let result = d(2024, 1, 1).add_days(i64::MAX);
        assert!(matches!(result, Err(DateError::OutOfRange { .. })));
    }

    #[test]
    fn test_weekend_detection() {
        assert!(d(2024, 6, 15).is_weekend()); // Saturday
        assert!(d(2024, 6, 16).is_weekend()); // Sunday
        assert!(!d(2024, 6, 17).is_weekend());
    }

    #[test]
    fn test_actual_365_fixed() {
        let yf = DayCountConvention::Actual365Fixed.year_fraction(d(2024, 1, 1), d(2025, 1, 1));
        assert_relative_eq!(yf, 366.0 / 365.0, epsilon = 1e-12);
    }

    #[test]
    fn test_expired_maturity_is_negative() {
        let yf = DayCountConvention::Actual365Fixed.year_fraction(d(2024, 3, 31), d(2024, 1, 31));
        assert_relative_eq!(yf, -60.0 / 365.0, epsilon = 1e-12);
        assert_eq!(DayCountConvention::Actual365Fixed.to_string(), "ACT/365F");
    }

    #[test]
    fn test_default_is_actual_365_fixed() {
        assert_eq!(
            DayCountConvention::default(),
            DayCountConvention::Actual365Fixed
        );
    }
}
