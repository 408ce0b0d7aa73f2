//! Market data error types.

use crate::types::PricingError;
use thiserror::Error;

/// Market data operation errors.
///
/// # Examples
///
/// ```
/// use pricer_core::market_data::MarketDataError;
///
/// let err = MarketDataError::InvalidMaturity { t: -1.0 };
/// assert!(format!("{}", err).contains("-1"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    /// Invalid maturity (negative time).
    #[error("Invalid maturity: t = {t}")]
    InvalidMaturity {
        /// The invalid maturity value
        t: f64,
    },

    /// Invalid strike price (non-positive).
    #[error("Invalid strike: K = {strike}")]
    InvalidStrike {
        /// The invalid strike value
        strike: f64,
    },

    /// Quote holds a value that cannot back a term structure.
    #[error("Invalid quote {name}: {value}")]
    InvalidQuote {
        /// Quote name
        name: String,
        /// Offending value
        value: f64,
    },
}

impl From<MarketDataError> for PricingError {
    fn from(err: MarketDataError) -> Self {
        PricingError::InvalidInput(err.to_string())
    }
}
