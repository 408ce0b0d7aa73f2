//! Trading calendars for settlement-lag arithmetic.
//!
//! Option valuation shifts both the observation date and the expiry by the
//! settlement lag measured in trading days, so the calendar decides which
//! days count.
//!
//! # Examples
//!
//! ```
//! use pricer_core::types::{Calendar, Date};
//!
//! let nyse = Calendar::UnitedStatesNyse;
//! // Thursday 2024-03-28 + 1 trading day skips Good Friday and the weekend.
//! let thursday = Date::from_ymd(2024, 3, 28).unwrap();
//! assert_eq!(nyse.advance(thursday, 1).unwrap(), Date::from_ymd(2024, 4, 1).unwrap());
//! ```

use chrono::{Datelike, Days, NaiveDate, Weekday};
use std::fmt;
use std::str::FromStr;

use super::error::CalendarError;
use super::time::Date;

/// Business-day calendar.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Calendar {
    /// Saturday and Sunday are the only non-trading days.
    WeekendsOnly,

    /// New York Stock Exchange holidays on top of weekends.
    #[default]
    UnitedStatesNyse,
}

impl Calendar {
    /// Returns the configuration name of the calendar.
    pub fn name(&self) -> &'static str {
        match self {
            Calendar::WeekendsOnly => "weekends-only",
            Calendar::UnitedStatesNyse => "united-states-nyse",
        }
    }

    /// Returns true if `date` is a trading day.
    pub fn is_business_day(&self, date: Date) -> bool {
        if date.is_weekend() {
            return false;
        }
        match self {
            Calendar::WeekendsOnly => true,
            Calendar::UnitedStatesNyse => !is_nyse_holiday(date.into_inner()),
        }
    }

    /// Returns true if `date` is not a trading day.
    pub fn is_holiday(&self, date: Date) -> bool {
        !self.is_business_day(date)
    }

    /// Rolls `date` forward to the first trading day on or after it.
    pub fn adjust_following(&self, date: Date) -> Result<Date, CalendarError> {
        let mut current = date;
        while self.is_holiday(current) {
            current = current.add_days(1)?;
        }
        Ok(current)
    }

    /// Moves `date` by `n` trading days.
    ///
    /// A zero shift rolls a non-trading date forward; a non-zero shift steps
    /// one calendar day at a time and counts only trading days.
    ///
    /// # Examples
    ///
    /// ```
    /// use pricer_core::types::{Calendar, Date};
    ///
    /// let friday = Date::from_ymd(2024, 6, 14).unwrap();
    /// let cal = Calendar::WeekendsOnly;
    /// assert_eq!(cal.advance(friday, 3).unwrap(), Date::from_ymd(2024, 6, 19).unwrap());
    /// assert_eq!(cal.advance(friday, -1).unwrap(), Date::from_ymd(2024, 6, 13).unwrap());
    /// ```
    pub fn advance(&self, date: Date, n: i64) -> Result<Date, CalendarError> {
        if n == 0 {
            return self.adjust_following(date);
        }

        let step = n.signum();
        let mut left = n.abs();
        let mut current = date;
        while left > 0 {
            current = current.add_days(step)?;
            if self.is_business_day(current) {
                left -= 1;
            }
        }
        Ok(current)
    }

    /// Counts trading days in `(start, end]`, negative when `start > end`.
    pub fn business_days_between(&self, start: Date, end: Date) -> Result<i64, CalendarError> {
        let (from, to, sign) = if start <= end {
            (start, end, 1)
        } else {
            (end, start, -1)
        };
        let mut count = 0;
        let mut current = from;
        while current < to {
            current = current.add_days(1)?;
            if self.is_business_day(current) {
                count += 1;
            }
        }
        Ok(sign * count)
    }
}

impl FromStr for Calendar {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "weekends-only" | "weekends" => Ok(Calendar::WeekendsOnly),
            "united-states-nyse" | "nyse" | "us" => Ok(Calendar::UnitedStatesNyse),
            _ => Err(CalendarError::UnknownCalendar(s.to_string())),
        }
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn is_nyse_holiday(date: NaiveDate) -> bool {
    let y = date.year();
    let m = date.month();
    let d = date.day();
    let w = date.weekday();

    // New Year's Day, moved to Monday if on Sunday
    (m == 1 && (d == 1 || (d == 2 && w == Weekday::Mon)))
        // Martin Luther King's birthday (third Monday in January, since 1998)
        || (y >= 1998 && is_nth_weekday(date, 1, Weekday::Mon, 3))
        // Washington's birthday (third Monday in February)
        || is_nth_weekday(date, 2, Weekday::Mon, 3)
        || is_good_friday(date)
        // Memorial Day (last Monday in May)
        || is_last_weekday(date, 5, Weekday::Mon)
        // Juneteenth (since 2022)
        || (y >= 2022 && is_observed(date, 6, 19))
        || is_observed(date, 7, 4)
        // Labor Day (first Monday in September)
        || is_nth_weekday(date, 9, Weekday::Mon, 1)
        // Thanksgiving (fourth Thursday in November)
        || is_nth_weekday(date, 11, Weekday::Thu, 4)
        || is_observed(date, 12, 25)
}

/// Fixed-date holiday moved to Monday when on Sunday, Friday when on Saturday.
fn is_observed(date: NaiveDate, month: u32, day: u32) -> bool {
    let Some(actual) = NaiveDate::from_ymd_opt(date.year(), month, day) else {
        return false;
    };
    match actual.weekday() {
        Weekday::Sat => actual.checked_sub_days(Days::new(1)) == Some(date),
        Weekday::Sun => actual.checked_add_days(Days::new(1)) == Some(date),
        _ => actual == date,
    }
}

fn is_nth_weekday(date: NaiveDate, month: u32, weekday: Weekday, n: u32) -> bool {
    date.month() == month && date.weekday() == weekday && (date.day() - 1) / 7 + 1 == n
}

fn is_last_weekday(date: NaiveDate, month: u32, weekday: Weekday) -> bool {
    date.month() == month
        && date.weekday() == weekday
        && date
            .checked_add_days(Days::new(7))
            .is_some_and(|next| next.month() != month)
}

fn is_good_friday(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Fri
        && date.checked_add_days(Days::new(2)) == easter_sunday(date.year())
}

/// Gregorian Easter Sunday (Meeus/Jones/Butcher).
fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = ((h + l - 7 * m + 114) % 31) + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}
