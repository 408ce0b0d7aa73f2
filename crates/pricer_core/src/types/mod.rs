//! Core time and error types.
//!
//! This module provides:
//! - `time`: `Date` and `DayCountConvention`
//! - `calendar`: Trading calendars used for settlement-lag arithmetic
//! - `error`: Structured error types for pricing, date, calendar and solver operations

pub mod calendar;
pub mod error;
pub mod time;

pub use calendar::Calendar;
pub use error::{CalendarError, DateError, PricingError, SolverError};
pub use time::{Date, DayCountConvention};
