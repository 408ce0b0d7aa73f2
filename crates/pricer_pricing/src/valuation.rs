//! Valuation orchestrator.
//!
//! [`OptionPriceModel::evaluate`] values one contract with one method:
//!
//! 1. settlement = observation date + settlement lag, maturity = expiry +
//!    the same lag, both in trading days on the configured calendar; a
//!    contract with no exercise left after settlement is expired;
//! 2. spot from the underlying, volatility, risk-free rate and dividend
//!    yield from the method's estimators, each held in a fresh quote;
//! 3. a Black-Scholes-Merton process over flat term structures whose
//!    reference date is a clock owned by this evaluation, set to the
//!    settlement date;
//! 4. payoff and exercise from the method's policies, and an engine from
//!    its factory;
//! 5. the NPV, eagerly, with a non-finite NPV reported as 0;
//! 6. implied volatility and Greeks as deferred closures.
//!
//! Every failure in 1 to 5, panics included, is logged at debug level and
//! turned into the all-zero result. Nothing escapes `evaluate`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::sync::Arc;

use pricer_core::market_data::EvaluationClock;
use pricer_core::types::{CalendarError, Date, DateError, SolverError};
use pricer_models::instruments::{InstrumentError, OptionContract, Underlying};
use pricer_models::models::{BlackScholesMertonProcess, MarketQuotes};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace};

use crate::catalog::PricingMethod;
use crate::config::{ImpliedVolatilityConfig, ValuationConfig};
use crate::engines::{EngineError, Greek};
use crate::estimators::{EstimatorError, MarketContext};
use crate::greeks::{Greeks, GreeksSnapshot};
use crate::implied_vol;
use crate::instrument::VanillaOption;

/// Why an evaluation, or one deferred value, fell back to zero.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValuationError {
    /// Contract fields are unusable.
    #[error(transparent)]
    Instrument(#[from] InstrumentError),

    /// No exercise remains after the observation or settlement date.
    #[error("{symbol} expired on {expiry}, observed on {time}")]
    Expired {
        /// Contract symbol
        symbol: String,
        /// Expiry date
        expiry: Date,
        /// Observation date
        time: Date,
    },

    /// Settlement or maturity could not be rolled on the calendar.
    #[error(transparent)]
    Calendar(#[from] CalendarError),

    /// Evaluation clock could not be shifted.
    #[error(transparent)]
    Date(#[from] DateError),

    /// A market input estimator failed.
    #[error(transparent)]
    Estimator(#[from] EstimatorError),

    /// The engine failed to build or price.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The implied volatility search failed.
    #[error("Implied volatility: {0}")]
    Solver(#[from] SolverError),

    /// A repricing produced NaN or infinity.
    #[error("Non-finite NPV: {0}")]
    NonFiniteNpv(f64),

    /// The Greek has no numerical approximation.
    #[error("{0} is never approximated")]
    NotApproximated(Greek),

    /// The evaluation panicked.
    #[error("Evaluation panicked: {0}")]
    Panicked(String),
}

/// Everything a deferred value needs, owned by one evaluation.
pub(crate) struct ValuationState {
    pub(crate) option: VanillaOption,
    pub(crate) process: Rc<BlackScholesMertonProcess>,
    pub(crate) market_price: f64,
    pub(crate) approximate_greeks: bool,
    pub(crate) implied_volatility: ImpliedVolatilityConfig,
    pub(crate) label: String,
}

impl ValuationState {
    /// NPV at the current quotes and clock, rejecting NaN and infinity.
    pub(crate) fn reprice(&self) -> Result<f64, ValuationError> {
        let npv = self.option.npv()?;
        if npv.is_finite() {
            Ok(npv)
        } else {
            Err(ValuationError::NonFiniteNpv(npv))
        }
    }
}

/// Eager price with deferred implied volatility and Greeks.
///
/// Not `Send`: the deferred values share the evaluation's quotes and clock.
/// Use [`ValuationResult::snapshot`] to move results across threads.
pub struct ValuationResult {
    price: f64,
    implied_volatility: Box<dyn Fn() -> f64>,
    greeks: Greeks,
}

impl ValuationResult {
    /// Zero price, zero implied volatility, zero Greeks.
    pub fn zero() -> Self {
        Self {
            price: 0.0,
            implied_volatility: Box::new(|| 0.0),
            greeks: Greeks::zero(),
        }
    }

    fn deferred(price: f64, state: ValuationState) -> Self {
        let state = Rc::new(state);
        let greeks = Greeks::deferred(&state);
        let implied_volatility = Box::new(move || implied_vol::solve_or_zero(&state));
        Self {
            price,
            implied_volatility,
            greeks,
        }
    }

    /// Net present value.
    pub fn price(&self) -> f64 {
        self.price
    }

    /// Volatility that reprices the contract to its market price, or 0 if
    /// the search fails. Recomputed on every call.
    pub fn implied_volatility(&self) -> f64 {
        (self.implied_volatility)()
    }

    /// Deferred Greeks.
    pub fn greeks(&self) -> &Greeks {
        &self.greeks
    }

    /// Evaluate every deferred value once.
    pub fn snapshot(&self) -> ValuationSnapshot {
        ValuationSnapshot {
            price: self.price,
            implied_volatility: self.implied_volatility(),
            greeks: self.greeks.snapshot(),
        }
    }
}

impl std::fmt::Debug for ValuationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValuationResult")
            .field("price", &self.price)
            .finish_non_exhaustive()
    }
}

/// Fully evaluated result, for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ValuationSnapshot {
    /// Net present value
    pub price: f64,
    /// Implied volatility (0 on failure)
    pub implied_volatility: f64,
    /// Greeks (each 0 on failure)
    pub greeks: GreeksSnapshot,
}

/// One catalog method bound to the catalog configuration.
#[derive(Debug, Clone)]
pub struct OptionPriceModel {
    method: PricingMethod,
    config: Arc<ValuationConfig>,
}

impl OptionPriceModel {
    pub(crate) fn new(method: PricingMethod, config: Arc<ValuationConfig>) -> Self {
        Self { method, config }
    }

    /// Method name.
    pub fn name(&self) -> &str {
        self.method.name()
    }

    /// Method descriptor.
    pub fn method(&self) -> &PricingMethod {
        &self.method
    }

    /// Configuration shared with the catalog.
    pub fn config(&self) -> &ValuationConfig {
        &self.config
    }

    /// Value `contract` on `underlying`.
    ///
    /// Never fails: any error or panic yields [`ValuationResult::zero`].
    ///
    /// # Example
    ///
    /// ```
    /// use pricer_core::types::Date;
    /// use pricer_models::instruments::{ExerciseStyle, OptionContract, OptionRight, Underlying};
    /// use pricer_pricing::catalog::{PricingModelCatalog, PricingModelKind};
    /// use pricer_pricing::config::ValuationConfig;
    /// use pricer_pricing::estimators::MarketContext;
    ///
    /// let catalog = PricingModelCatalog::new(ValuationConfig::default()).unwrap();
    /// let model = catalog.model(PricingModelKind::BlackScholes);
    ///
    /// let today = Date::from_ymd(2024, 3, 1).unwrap();
    /// let contract = OptionContract::new(
    ///     "XYZ", 100.0, OptionRight::Call,
    ///     Date::from_ymd(2024, 4, 19).unwrap(),
    ///     ExerciseStyle::European, today, 3.1,
    /// ).unwrap();
    /// let underlying = Underlying::new("XYZ", 101.0).with_volatility(0.25);
    ///
    /// let result = model.evaluate(&underlying, &MarketContext::new(today), &contract);
    /// assert!(result.price() > 1.0);
    /// let delta = result.greeks().delta();
    /// assert!(delta > 0.0 && delta < 1.0);
    /// ```
    pub fn evaluate(
        &self,
        underlying: &Underlying,
        context: &MarketContext,
        contract: &OptionContract,
    ) -> ValuationResult {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.try_evaluate(underlying, context, contract)
        }));

        match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => {
                debug!(
                    model = self.name(),
                    contract = contract.symbol(),
                    error = %err,
                    "evaluation failed, returning zero result"
                );
                ValuationResult::zero()
            }
            Err(payload) => {
                debug!(
                    model = self.name(),
                    contract = contract.symbol(),
                    panic = panic_message(payload.as_ref()),
                    "evaluation panicked, returning zero result"
                );
                ValuationResult::zero()
            }
        }
    }

    /// [`evaluate`](Self::evaluate) without containment.
    pub fn try_evaluate(
        &self,
        underlying: &Underlying,
        context: &MarketContext,
        contract: &OptionContract,
    ) -> Result<ValuationResult, ValuationError> {
        contract.validate()?;
        if contract.is_expired(contract.time()) {
            return Err(ValuationError::Expired {
                symbol: contract.symbol().to_string(),
                expiry: contract.expiry(),
                time: contract.time(),
            });
        }

        let config = &self.config;
        let calendar = config.calendar;
        let lag = i64::from(config.settlement_days);
        let settlement = calendar.advance(contract.time(), lag)?;
        let maturity = calendar.advance(contract.expiry(), lag)?;
        if maturity <= settlement {
            return Err(ValuationError::Expired {
                symbol: contract.symbol().to_string(),
                expiry: contract.expiry(),
                time: contract.time(),
            });
        }

        let estimators = self.method.estimators();
        let spot = underlying.price();
        let dividend_yield = estimators.dividend_yield.estimate(underlying, context, contract)?;
        let risk_free_rate = estimators.risk_free_rate.estimate(underlying, context, contract)?;
        let volatility = estimators.volatility.estimate(underlying, context, contract)?;

        trace!(
            model = self.name(),
            contract = contract.symbol(),
            %settlement,
            %maturity,
            spot,
            volatility,
            risk_free_rate,
            dividend_yield,
            "evaluation inputs"
        );

        let clock = EvaluationClock::shared(settlement);
        let quotes = MarketQuotes::new(spot, volatility, risk_free_rate, dividend_yield);
        let process = Rc::new(BlackScholesMertonProcess::new(clock, quotes, calendar));

        let payoff = self.method.payoff(contract)?;
        let exercise = self
            .method
            .exercise_policy()
            .exercise(contract, settlement, maturity);
        let engine = (self.method.engine())(Rc::clone(&process))?;
        let option = VanillaOption::new(payoff, exercise, engine);

        let npv = option.npv()?;
        let price = if npv.is_finite() {
            npv
        } else {
            debug!(
                model = self.name(),
                contract = contract.symbol(),
                npv,
                "non-finite NPV reported as zero"
            );
            0.0
        };

        Ok(ValuationResult::deferred(
            price,
            ValuationState {
                option,
                process,
                market_price: contract.market_price(),
                approximate_greeks: config.enable_greek_approximation,
                implied_volatility: config.implied_volatility,
                label: contract.symbol().to_string(),
            },
        ))
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
