//! Pricing engines.
//!
//! An engine prices a vanilla payoff under a
//! [`BlackScholesMertonProcess`]. Every engine computes an NPV; analytic
//! sensitivities are an optional capability: an engine that cannot produce
//! a Greek returns [`EngineError::GreekNotProvided`].
//!
//! | Engine | Exercise | Analytic Greeks |
//! |--------|----------|-----------------|
//! | [`AnalyticEuropeanEngine`] | European | all |
//! | [`BaroneAdesiWhaleyEngine`] | American | none |
//! | [`BjerksundStenslandEngine`] | American | none |
//! | [`IntegralEngine`] | European | none |
//! | [`FdBlackScholesVanillaEngine`] | both | delta, gamma |
//! | [`BinomialVanillaEngine`] | both | delta, gamma |
//!
//! Engines read the process quotes at call time, so perturbing a quote or
//! the evaluation clock between calls reprices.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use pricer_models::instruments::{Exercise, ExerciseStyle, PlainVanillaPayoff};
use pricer_models::models::{BlackScholesMertonProcess, ProcessSnapshot};

mod analytic;
mod american_approximations;
mod binomial;
mod error;
mod finite_difference;
mod integral;

pub use analytic::AnalyticEuropeanEngine;
pub use american_approximations::{BaroneAdesiWhaleyEngine, BjerksundStenslandEngine};
pub use binomial::{BinomialTree, BinomialVanillaEngine};
pub use error::EngineError;
pub use finite_difference::FdBlackScholesVanillaEngine;
pub use integral::IntegralEngine;

/// Below this σ√T engines price the deterministic limit directly.
pub(crate) const MIN_STD_DEV: f64 = 1e-8;

/// Option sensitivities an engine may provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Greek {
    /// ∂V/∂S
    Delta,
    /// ∂²V/∂S²
    Gamma,
    /// ∂V/∂σ
    Vega,
    /// ∂V/∂t, per year
    Theta,
    /// ∂V/∂r
    Rho,
    /// Δ·S/V
    Elasticity,
}

impl Greek {
    /// All Greeks in reporting order.
    pub const ALL: [Greek; 6] = [
        Greek::Delta,
        Greek::Gamma,
        Greek::Vega,
        Greek::Theta,
        Greek::Rho,
        Greek::Elasticity,
    ];

    /// Lower-case name.
    pub fn name(&self) -> &'static str {
        match self {
            Greek::Delta => "delta",
            Greek::Gamma => "gamma",
            Greek::Vega => "vega",
            Greek::Theta => "theta",
            Greek::Rho => "rho",
            Greek::Elasticity => "elasticity",
        }
    }
}

impl fmt::Display for Greek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What an engine is asked to price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineArguments {
    /// Call or put on a strike
    pub payoff: PlainVanillaPayoff,
    /// Exercise schedule
    pub exercise: Exercise,
}

impl EngineArguments {
    /// Bundle a payoff and an exercise schedule.
    pub fn new(payoff: PlainVanillaPayoff, exercise: Exercise) -> Self {
        Self { payoff, exercise }
    }
}

/// A pricing method for vanilla options.
///
/// # Example
///
/// ```
/// use std::rc::Rc;
/// use pricer_core::market_data::EvaluationClock;
/// use pricer_core::types::{Calendar, Date};
/// use pricer_models::instruments::{Exercise, OptionRight, PlainVanillaPayoff};
/// use pricer_models::models::{BlackScholesMertonProcess, MarketQuotes};
/// use pricer_pricing::engines::{
///     AnalyticEuropeanEngine, EngineArguments, Greek, IntegralEngine, PricingEngine,
/// };
///
/// let clock = EvaluationClock::shared(Date::from_ymd(2024, 1, 2).unwrap());
/// let process = Rc::new(BlackScholesMertonProcess::new(
///     clock,
///     MarketQuotes::new(100.0, 0.2, 0.05, 0.0),
///     Calendar::WeekendsOnly,
/// ));
/// let args = EngineArguments::new(
///     PlainVanillaPayoff::new(OptionRight::Call, 100.0).unwrap(),
///     Exercise::european(Date::from_ymd(2025, 1, 1).unwrap()),
/// );
///
/// let analytic = AnalyticEuropeanEngine::new(Rc::clone(&process));
/// let integral = IntegralEngine::new(process);
/// assert!((analytic.npv(&args).unwrap() - integral.npv(&args).unwrap()).abs() < 1e-4);
///
/// assert!(analytic.greek(Greek::Vega, &args).is_ok());
/// assert!(integral.greek(Greek::Vega, &args).unwrap_err().is_greek_not_provided());
/// ```
pub trait PricingEngine {
    /// Engine name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Net present value at the process's current valuation date.
    fn npv(&self, args: &EngineArguments) -> Result<f64, EngineError>;

    /// Analytic sensitivity.
    ///
    /// The default implementation provides none.
    fn greek(&self, greek: Greek, args: &EngineArguments) -> Result<f64, EngineError> {
        let _ = args;
        Err(EngineError::GreekNotProvided(greek))
    }
}

/// Builds an engine over a process.
///
/// Factories are shared by every evaluation of a catalog entry, possibly
/// from several threads; the engines they build are owned by one evaluation.
pub type EngineFactory = std::sync::Arc<
    dyn Fn(Rc<BlackScholesMertonProcess>) -> Result<Box<dyn PricingEngine>, EngineError>
        + Send
        + Sync,
>;

/// Process inputs at the last exercise date.
pub(crate) fn snapshot(
    process: &BlackScholesMertonProcess,
    args: &EngineArguments,
) -> Result<ProcessSnapshot, EngineError> {
    Ok(process.snapshot(args.exercise.last_date(), args.payoff.strike())?)
}

/// Reject exercise styles the engine cannot handle.
pub(crate) fn require_style(
    engine: &'static str,
    args: &EngineArguments,
    style: ExerciseStyle,
) -> Result<(), EngineError> {
    let actual = args.exercise.style();
    if actual != style {
        return Err(EngineError::UnsupportedExercise {
            engine,
            style: actual,
        });
    }
    Ok(())
}

/// Whether σ√T is too small for a diffusion-based method.
pub(crate) fn is_degenerate(snap: &ProcessSnapshot) -> bool {
    snap.volatility * snap.time_to_expiry.max(0.0).sqrt() <= MIN_STD_DEV
}

/// Deterministic-limit value: the discounted forward intrinsic value, floored
/// at immediate exercise when early exercise is allowed.
pub(crate) fn degenerate_npv(
    snap: &ProcessSnapshot,
    args: &EngineArguments,
) -> Result<f64, EngineError> {
    let payoff = &args.payoff;
    let european = snap
        .black_scholes()?
        .price(payoff.strike(), snap.time_to_expiry, payoff.right());
    Ok(match args.exercise.style() {
        ExerciseStyle::European => european,
        ExerciseStyle::American => european.max(payoff.value(snap.spot)),
    })
}

/// Delta and gamma in the deterministic limit.
pub(crate) fn degenerate_delta_gamma(
    snap: &ProcessSnapshot,
    args: &EngineArguments,
) -> Result<(f64, f64), EngineError> {
    let payoff = &args.payoff;
    let european = snap.black_scholes()?;
    let t = snap.time_to_expiry;
    let delta = european.delta(payoff.strike(), t, payoff.right());

    if args.exercise.style().is_american() {
        let hold = european.price(payoff.strike(), t, payoff.right());
        let exercise = payoff.value(snap.spot);
        if exercise > hold {
            // Exercised immediately: delta of the intrinsic value
            return Ok((payoff.right().sign(), 0.0));
        }
    }
    Ok((delta, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricer_core::market_data::EvaluationClock;
    use pricer_core::types::{Calendar, Date};
    use pricer_models::instruments::OptionRight;
    use pricer_models::models::MarketQuotes;

    #[test]
    fn test_greek_names() {
        let names: Vec<_> = Greek::ALL.iter().map(|g| g.to_string()).collect();
        assert_eq!(
            names,
            ["delta", "gamma", "vega", "theta", "rho", "elasticity"]
        );
    }

    struct NpvOnly;

    impl PricingEngine for NpvOnly {
        fn name(&self) -> &'static str {
            "NpvOnly"
        }

        fn npv(&self, _args: &EngineArguments) -> Result<f64, EngineError> {
            Ok(1.0)
        }
    }

    fn args(style: ExerciseStyle) -> EngineArguments {
        let d = |m, day| Date::from_ymd(2024, m, day).unwrap();
        EngineArguments::new(
            PlainVanillaPayoff::new(OptionRight::Put, 100.0).unwrap(),
            Exercise::for_style(style, d(1, 2), d(6, 3)),
        )
    }

    #[test]
    fn test_default_greek_not_provided() {
        let args = args(ExerciseStyle::European);
        for greek in Greek::ALL {
            assert_eq!(
                NpvOnly.greek(greek, &args),
                Err(EngineError::GreekNotProvided(greek))
            );
        }
    }

    #[test]
    fn test_require_style() {
        assert!(require_style("x", &args(ExerciseStyle::European), ExerciseStyle::European).is_ok());
        assert!(matches!(
            require_style("x", &args(ExerciseStyle::American), ExerciseStyle::European),
            Err(EngineError::UnsupportedExercise { .. })
        ));
    }

    #[test]
    fn test_degenerate_american_put_exercises_now() {
        let process = BlackScholesMertonProcess::new(
            EvaluationClock::shared(Date::from_ymd(2024, 1, 2).unwrap()),
            MarketQuotes::new(80.0, 0.0, 0.05, 0.0),
            Calendar::WeekendsOnly,
        );
        let args = args(ExerciseStyle::American);
        let snap = snapshot(&process, &args).unwrap();
        assert!(is_degenerate(&snap));
        assert_eq!(degenerate_npv(&snap, &args).unwrap(), 20.0);
        assert_eq!(degenerate_delta_gamma(&snap, &args).unwrap(), (-1.0, 0.0));
    }
}
