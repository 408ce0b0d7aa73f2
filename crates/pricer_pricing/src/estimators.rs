//! Market input estimators.
//!
//! An estimator turns (underlying, market context, contract) into one scalar
//! input of the Black-Scholes-Merton process. The catalog seeds constant
//! risk-free and dividend estimators from the configuration and reads the
//! volatility from the underlying's own volatility model.

use std::fmt;
use std::sync::Arc;

use pricer_core::types::Date;
use pricer_models::instruments::{OptionContract, Underlying};
use thiserror::Error;

use crate::config::ValuationConfig;

/// Errors raised while estimating a market input.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EstimatorError {
    /// The estimator has not seen enough data to produce a value.
    #[error("{estimator} is not ready for {symbol}")]
    NotReady {
        /// Estimator name
        estimator: &'static str,
        /// Underlying symbol
        symbol: String,
    },

    /// The estimator produced a value the process cannot use.
    #[error("{estimator} produced an invalid value: {value}")]
    InvalidEstimate {
        /// Estimator name
        estimator: &'static str,
        /// Offending value
        value: f64,
    },
}

/// Market state visible to estimators at valuation time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketContext {
    time: Date,
}

impl MarketContext {
    /// Context observed at `time`.
    pub fn new(time: Date) -> Self {
        Self { time }
    }

    /// Observation date.
    pub fn time(&self) -> Date {
        self.time
    }
}

/// Strategy producing one process input.
pub trait MarketInputEstimator: fmt::Debug + Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Estimate the input for `contract` on `underlying`.
    fn estimate(
        &self,
        underlying: &Underlying,
        context: &MarketContext,
        contract: &OptionContract,
    ) -> Result<f64, EstimatorError>;
}

/// Returns the same value for every contract.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantEstimator {
    name: &'static str,
    value: f64,
}

impl ConstantEstimator {
    /// Constant estimator called `name`.
    pub fn new(name: &'static str, value: f64) -> Self {
        Self { name, value }
    }

    /// The constant.
    pub fn value(&self) -> f64 {
        self.value
    }
}

impl MarketInputEstimator for ConstantEstimator {
    fn name(&self) -> &'static str {
        self.name
    }

    fn estimate(
        &self,
        _underlying: &Underlying,
        _context: &MarketContext,
        _contract: &OptionContract,
    ) -> Result<f64, EstimatorError> {
        if self.value.is_finite() {
            Ok(self.value)
        } else {
            Err(EstimatorError::InvalidEstimate {
                estimator: self.name,
                value: self.value,
            })
        }
    }
}

/// Reads the volatility carried by the underlying.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnderlyingVolatilityEstimator;

impl MarketInputEstimator for UnderlyingVolatilityEstimator {
    fn name(&self) -> &'static str {
        "underlying volatility"
    }

    fn estimate(
        &self,
        underlying: &Underlying,
        _context: &MarketContext,
        _contract: &OptionContract,
    ) -> Result<f64, EstimatorError> {
        match underlying.volatility() {
            None => Err(EstimatorError::NotReady {
                estimator: self.name(),
                symbol: underlying.symbol().to_string(),
            }),
            Some(v) if !v.is_finite() || v < 0.0 => Err(EstimatorError::InvalidEstimate {
                estimator: self.name(),
                value: v,
            }),
            Some(v) => Ok(v),
        }
    }
}

/// The three estimators behind one pricing method.
#[derive(Debug, Clone)]
pub struct MarketEstimators {
    /// Black volatility
    pub volatility: Arc<dyn MarketInputEstimator>,
    /// Continuously compounded risk-free rate
    pub risk_free_rate: Arc<dyn MarketInputEstimator>,
    /// Continuous dividend yield
    pub dividend_yield: Arc<dyn MarketInputEstimator>,
}

impl MarketEstimators {
    /// Constant rates from `config`, volatility from the underlying.
    pub fn from_config(config: &ValuationConfig) -> Self {
        Self {
            volatility: Arc::new(UnderlyingVolatilityEstimator),
            risk_free_rate: Arc::new(ConstantEstimator::new(
                "risk-free rate",
                config.default_risk_free_rate,
            )),
            dividend_yield: Arc::new(ConstantEstimator::new(
                "dividend yield",
                config.default_dividend_yield,
            )),
        }
    }

    /// Replace the volatility estimator.
    pub fn with_volatility(mut self, estimator: Arc<dyn MarketInputEstimator>) -> Self {
        self.volatility = estimator;
        self
    }

    /// Replace the risk-free rate estimator.
    pub fn with_risk_free_rate(mut self, estimator: Arc<dyn MarketInputEstimator>) -> Self {
        self.risk_free_rate = estimator;
        self
    }

    /// Replace the dividend yield estimator.
    pub fn with_dividend_yield(mut self, estimator: Arc<dyn MarketInputEstimator>) -> Self {
        self.dividend_yield = estimator;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricer_models::instruments::{ExerciseStyle, OptionRight};

    fn contract() -> OptionContract {
        let d = |m, day| Date::from_ymd(2024, m, day).unwrap();
        OptionContract::new(
            "SPY 240621C00500000",
            500.0,
            OptionRight::Call,
            d(6, 21),
            ExerciseStyle::American,
            d(5, 1),
            12.5,
        )
        .unwrap()
    }

    fn context() -> MarketContext {
        MarketContext::new(Date::from_ymd(2024, 5, 1).unwrap())
    }

    #[test]
    fn test_defaults_follow_config() {
        let config = ValuationConfig {
            default_risk_free_rate: 0.045,
            default_dividend_yield: 0.013,
            ..ValuationConfig::default()
        };
        let estimators = MarketEstimators::from_config(&config);
        let spy = Underlying::new("SPY", 505.0).with_volatility(0.14);

        let (c, ctx) = (contract(), context());
        assert_eq!(estimators.risk_free_rate.estimate(&spy, &ctx, &c).unwrap(), 0.045);
        assert_eq!(estimators.dividend_yield.estimate(&spy, &ctx, &c).unwrap(), 0.013);
        assert_eq!(estimators.volatility.estimate(&spy, &ctx, &c).unwrap(), 0.14);
    }

    #[test]
    fn test_volatility_not_ready_without_model_value() {
        let spy = Underlying::new("SPY", 505.0);
        assert_eq!(
            UnderlyingVolatilityEstimator.estimate(&spy, &context(), &contract()),
            Err(EstimatorError::NotReady {
                estimator: "underlying volatility",
                symbol: "SPY".to_string(),
            })
        );
    }

    #[test]
    fn test_invalid_estimates_rejected() {
        let spy = Underlying::new("SPY", 505.0).with_volatility(-0.1);
        assert!(matches!(
            UnderlyingVolatilityEstimator.estimate(&spy, &context(), &contract()),
            Err(EstimatorError::InvalidEstimate { .. })
        ));
        let nan = ConstantEstimator::new("risk-free rate", f64::NAN);
        assert!(nan.estimate(&spy, &context(), &contract()).is_err());
    }

    #[test]
    fn test_override_single_estimator() {
        let estimators = MarketEstimators::from_config(&ValuationConfig::default())
            .with_volatility(Arc::new(ConstantEstimator::new("flat vol", 0.3)));
        let spy = Underlying::new("SPY", 505.0);
        assert_eq!(
            estimators.volatility.estimate(&spy, &context(), &contract()).unwrap(),
            0.3
        );
        assert_eq!(estimators.volatility.name(), "flat vol");
    }
}
