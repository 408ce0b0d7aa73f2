//! Engine error types.

use pricer_core::market_data::MarketDataError;
use pricer_core::types::PricingError;
use pricer_models::analytical::AnalyticalError;
use pricer_models::instruments::ExerciseStyle;
use thiserror::Error;

use super::Greek;

/// Errors raised by a pricing engine.
///
/// `GreekNotProvided` is not a failure of the engine: it marks a
/// sensitivity the engine cannot produce analytically, and callers branch on
/// it to fall back to bump-and-reprice.
///
/// # Examples
/// ```
/// use pricer_pricing::engines::{EngineError, Greek};
///
/// let err = EngineError::GreekNotProvided(Greek::Vega);
/// assert!(err.is_greek_not_provided());
/// assert_eq!(err.to_string(), "vega not provided by this engine");
/// ```
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    /// The engine has no analytic value for this Greek.
    #[error("{0} not provided by this engine")]
    GreekNotProvided(Greek),

    /// The engine cannot price this exercise style.
    #[error("{engine} does not support {style} exercise")]
    UnsupportedExercise {
        /// Engine name
        engine: &'static str,
        /// Rejected style
        style: ExerciseStyle,
    },

    /// Engine configured with unusable settings.
    #[error("Invalid engine setting: {0}")]
    InvalidSetting(String),

    /// The numerical method broke down.
    #[error("Numerical failure in {engine}: {message}")]
    NumericalFailure {
        /// Engine name
        engine: &'static str,
        /// What went wrong
        message: String,
    },

    /// A market input could not be read.
    #[error(transparent)]
    MarketData(#[from] MarketDataError),

    /// The closed-form model rejected its inputs.
    #[error(transparent)]
    Analytical(#[from] AnalyticalError),
}

impl EngineError {
    /// Whether this error only reports a missing analytic Greek.
    pub fn is_greek_not_provided(&self) -> bool {
        matches!(self, EngineError::GreekNotProvided(_))
    }
}

impl From<EngineError> for PricingError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::MarketData(e) => e.into(),
            EngineError::Analytical(e) => e.into(),
            EngineError::NumericalFailure { .. } => PricingError::NumericalInstability(err.to_string()),
            EngineError::GreekNotProvided(_) | EngineError::UnsupportedExercise { .. } => {
                PricingError::UnsupportedInstrument(err.to_string())
            }
            EngineError::InvalidSetting(_) => PricingError::InvalidInput(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = EngineError::UnsupportedExercise {
            engine: "AnalyticEuropeanEngine",
            style: ExerciseStyle::American,
        };
        assert_eq!(
            err.to_string(),
            "AnalyticEuropeanEngine does not support american exercise"
        );
        assert!(!err.is_greek_not_provided());
    }

    #[test]
    fn test_market_data_is_transparent() {
        let inner = MarketDataError::InvalidMaturity { t: -0.1 };
        let err: EngineError = inner.clone().into();
        assert_eq!(err.to_string(), inner.to_string());
    }

    #[test]
    fn test_into_pricing_error() {
        let err: PricingError = EngineError::NumericalFailure {
            engine: "x",
            message: "diverged".to_string(),
        }
        .into();
        assert!(matches!(err, PricingError::NumericalInstability(_)));

        let err: PricingError = EngineError::GreekNotProvided(Greek::Rho).into();
        assert!(matches!(err, PricingError::UnsupportedInstrument(_)));
    }
}
