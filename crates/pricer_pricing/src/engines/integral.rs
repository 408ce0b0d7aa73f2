//! Numerical integration of the payoff against the lognormal density.

use std::f64::consts::PI;
use std::rc::Rc;

use pricer_models::instruments::{ExerciseStyle, OptionRight};
use pricer_models::models::BlackScholesMertonProcess;

use super::{
    degenerate_npv, is_degenerate, require_style, snapshot, EngineArguments, EngineError,
    PricingEngine,
};

/// Simpson intervals over the log-price range (must be even).
const INTERVALS: usize = 5000;

/// Integration half-width in standard deviations.
const HALF_WIDTH: f64 = 10.0;

/// European engine computing
///
/// ```text
/// V = D_r / √(2πv) ∫ payoff(S·eˣ) · exp(-(x - μ)² / 2v) dx
/// ```
///
/// with v = σ²T and μ = ln(D_q/D_r) - v/2, by composite Simpson's rule over
/// the part of μ ± 10√v where the payoff is in the money. The strike's log
/// moneyness is always a node, so the NPV stays smooth in spot.
#[derive(Debug, Clone)]
pub struct IntegralEngine {
    process: Rc<BlackScholesMertonProcess>,
}

impl IntegralEngine {
    const NAME: &'static str = "IntegralEngine";

    /// Create an engine over `process`.
    pub fn new(process: Rc<BlackScholesMertonProcess>) -> Self {
        Self { process }
    }
}

impl PricingEngine for IntegralEngine {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn npv(&self, args: &EngineArguments) -> Result<f64, EngineError> {
        require_style(Self::NAME, args, ExerciseStyle::European)?;
        let snap = snapshot(&self.process, args)?;
        if is_degenerate(&snap) {
            return degenerate_npv(&snap, args);
        }

        let variance = snap.volatility * snap.volatility * snap.time_to_expiry;
        let discount = snap.discount();
        let drift = (snap.dividend_discount() / discount).ln() - 0.5 * variance;
        let spot = snap.spot;
        let payoff = args.payoff;

        let integrand =
            |x: f64| payoff.value(spot * x.exp()) * (-(x - drift).powi(2) / (2.0 * variance)).exp();

        let width = HALF_WIDTH * variance.sqrt();
        let kink = (payoff.strike() / spot).ln();
        let (lower, upper) = match payoff.right() {
            OptionRight::Call => ((drift - width).max(kink), drift + width),
            OptionRight::Put => (drift - width, (drift + width).min(kink)),
        };
        if upper <= lower {
            return Ok(0.0);
        }
        let integral = simpson(integrand, lower, upper, INTERVALS);

        Ok(discount / (2.0 * PI * variance).sqrt() * integral)
    }
}

/// Composite Simpson's rule with `n` (even) intervals.
fn simpson<F: Fn(f64) -> f64>(f: F, a: f64, b: f64, n: usize) -> f64 {
    let h = (b - a) / n as f64;
    let interior: f64 = (1..n)
        .map(|i| {
            let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
            weight * f(a + i as f64 * h)
        })
        .sum();
    (f(a) + f(b) + interior) * h / 3.0
}
