//! Instrument error types.

use pricer_core::types::{Date, PricingError};
use thiserror::Error;

/// Instrument-related errors.
///
/// # Examples
/// ```
/// use pricer_models::instruments::InstrumentError;
///
/// let err = InstrumentError::InvalidStrike { strike: -100.0 };
/// assert!(format!("{}", err).contains("-100"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InstrumentError {
    /// Invalid strike price (non-positive or non-finite).
    #[error("Invalid strike: K = {strike}")]
    InvalidStrike {
        /// The invalid strike value
        strike: f64,
    },

    /// American exercise window ends before it starts.
    #[error("Invalid exercise window: {earliest} to {latest}")]
    InvalidExerciseWindow {
        /// First exercise date
        earliest: Date,
        /// Last exercise date
        latest: Date,
    },

    /// Unrecognised option right or exercise style.
    #[error("Invalid parameter: {message}")]
    InvalidParameter {
        /// Description of the parameter error
        message: String,
    },
}

impl From<InstrumentError> for PricingError {
    fn from(err: InstrumentError) -> Self {
        PricingError::InvalidInput(err.to_string())
    }
}
