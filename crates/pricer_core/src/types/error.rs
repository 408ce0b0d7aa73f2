//! Error types for structured error handling.
//!
//! This module provides:
//! - `PricingError`: Errors surfaced by valuation code paths
//! - `DateError`: Errors from date construction, parsing and arithmetic
//! - `CalendarError`: Errors from trading calendar lookups
//! - `SolverError`: Errors from root-finding solvers

use std::fmt;
use thiserror::Error;

/// Categorised pricing errors.
///
/// Lower-level error types (market data, instruments, engines) convert into
/// this type when they cross a layer boundary.
///
/// # Examples
/// ```
/// use pricer_core::types::PricingError;
///
/// let err = PricingError::InvalidInput("Negative spot price".to_string());
/// assert_eq!(format!("{}", err), "Invalid input: Negative spot price");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    /// Invalid input data or parameters
    InvalidInput(String),

    /// Numerical instability during computation
    NumericalInstability(String),

    /// Instrument type not supported by the selected method
    UnsupportedInstrument(String),
}

impl fmt::Display for PricingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            PricingError::NumericalInstability(msg) => {
                write!(f, "Numerical instability: {}", msg)
            }
            PricingError::UnsupportedInstrument(msg) => {
                write!(f, "Unsupported instrument: {}", msg)
            }
        }
    }
}

impl std::error::Error for PricingError {}

/// Date-related errors.
///
/// # Examples
/// ```
/// use pricer_core::types::DateError;
///
/// let err = DateError::InvalidDate { year: 2024, month: 2, day: 30 };
/// assert_eq!(format!("{}", err), "Invalid date: 2024-2-30");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    /// Invalid date components (e.g., February 30th).
    #[error("Invalid date: {year}-{month}-{day}")]
    InvalidDate {
        /// Year component
        year: i32,
        /// Month component (1-12)
        month: u32,
        /// Day component (1-31)
        day: u32,
    },

    /// Failed to parse date string.
    #[error("Date parse error: {0}")]
    ParseError(String),

    /// Date arithmetic left the representable range.
    #[error("Date out of range: {date} shifted by {days} days")]
    OutOfRange {
        /// Starting date, ISO 8601
        date: String,
        /// Requested shift in days
        days: i64,
    },
}

impl From<DateError> for PricingError {
    fn from(err: DateError) -> Self {
        PricingError::InvalidInput(err.to_string())
    }
}

/// Trading calendar errors.
///
/// # Examples
/// ```
/// use pricer_core::types::CalendarError;
///
/// let err = CalendarError::UnknownCalendar("tokyo".to_string());
/// assert!(format!("{}", err).contains("tokyo"));
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    /// Calendar name not recognised.
    #[error("Unknown calendar: {0}")]
    UnknownCalendar(String),

    /// Date arithmetic failed while rolling business days.
    #[error(transparent)]
    Date(#[from] DateError),
}

impl From<CalendarError> for PricingError {
    fn from(err: CalendarError) -> Self {
        PricingError::InvalidInput(err.to_string())
    }
}

/// Root-finding solver errors.
///
/// # Examples
/// ```
/// use pricer_core::types::SolverError;
///
/// let err = SolverError::MaxIterationsExceeded { iterations: 100 };
/// assert!(format!("{}", err).contains("100 iterations"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolverError {
    /// Solver failed to converge within maximum iterations.
    #[error("Failed to converge after {iterations} iterations")]
    MaxIterationsExceeded {
        /// Number of iterations attempted
        iterations: usize,
    },

    /// No valid bracket (function values at endpoints have same sign).
    #[error("No bracket: f({a}) and f({b}) have same sign")]
    NoBracket {
        /// Left bracket endpoint
        a: f64,
        /// Right bracket endpoint
        b: f64,
    },

    /// Objective returned a non-finite value.
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),
}

impl From<SolverError> for PricingError {
    fn from(err: SolverError) -> Self {
        PricingError::NumericalInstability(err.to_string())
    }
}
