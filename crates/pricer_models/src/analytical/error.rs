//! Error types for analytical pricing operations.

use pricer_core::types::PricingError;
use thiserror::Error;

/// Analytical pricing errors.
///
/// # Examples
/// ```
/// use pricer_models::analytical::AnalyticalError;
///
/// let err = AnalyticalError::InvalidVolatility { volatility: -0.2 };
/// assert!(format!("{}", err).contains("volatility"));
/// ```
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AnalyticalError {
    /// Negative or non-finite volatility.
    #[error("Invalid volatility: σ = {volatility}")]
    InvalidVolatility {
        /// The invalid volatility value
        volatility: f64,
    },

    /// Non-positive or non-finite spot price.
    #[error("Invalid spot price: S = {spot}")]
    InvalidSpot {
        /// The invalid spot price value
        spot: f64,
    },

    /// Non-positive strike.
    #[error("Invalid strike: K = {strike}")]
    InvalidStrike {
        /// The invalid strike value
        strike: f64,
    },

    /// Non-finite rate or dividend yield.
    #[error("Invalid rate: {name} = {value}")]
    InvalidRate {
        /// Which rate was rejected
        name: &'static str,
        /// The invalid value
        value: f64,
    },

    /// Computation encountered numerical issues.
    #[error("Numerical instability: {message}")]
    NumericalInstability {
        /// Description of the numerical issue
        message: String,
    },
}

impl From<AnalyticalError> for PricingError {
    fn from(err: AnalyticalError) -> Self {
        match err {
            AnalyticalError::NumericalInstability { .. } => {
                PricingError::NumericalInstability(err.to_string())
            }
            _ => PricingError::InvalidInput(err.to_string()),
        }
    }
}
