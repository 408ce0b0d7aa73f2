//! Closed-form engine for European options.

use std::rc::Rc;

use pricer_models::instruments::ExerciseStyle;
use pricer_models::models::BlackScholesMertonProcess;

use super::{require_style, snapshot, EngineArguments, EngineError, Greek, PricingEngine};

/// Generalized Black-Scholes-Merton formula with every analytic Greek.
#[derive(Debug, Clone)]
pub struct AnalyticEuropeanEngine {
    process: Rc<BlackScholesMertonProcess>,
}

impl AnalyticEuropeanEngine {
    const NAME: &'static str = "AnalyticEuropeanEngine";

    /// Create an engine over `process`.
    pub fn new(process: Rc<BlackScholesMertonProcess>) -> Self {
        Self { process }
    }
}

impl PricingEngine for AnalyticEuropeanEngine {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn npv(&self, args: &EngineArguments) -> Result<f64, EngineError> {
        require_style(Self::NAME, args, ExerciseStyle::European)?;
        let snap = snapshot(&self.process, args)?;
        let bsm = snap.black_scholes()?;
        Ok(bsm.price(args.payoff.strike(), snap.time_to_expiry, args.payoff.right()))
    }

    fn greek(&self, greek: Greek, args: &EngineArguments) -> Result<f64, EngineError> {
        require_style(Self::NAME, args, ExerciseStyle::European)?;
        let snap = snapshot(&self.process, args)?;
        let bsm = snap.black_scholes()?;
        let (k, t, right) = (
            args.payoff.strike(),
            snap.time_to_expiry,
            args.payoff.right(),
        );

        Ok(match greek {
            Greek::Delta => bsm.delta(k, t, right),
            Greek::Gamma => bsm.gamma(k, t),
            Greek::Vega => bsm.vega(k, t),
            Greek::Theta => bsm.theta(k, t, right),
            Greek::Rho => bsm.rho(k, t, right),
            Greek::Elasticity => bsm.elasticity(k, t, right),
        })
    }
}
