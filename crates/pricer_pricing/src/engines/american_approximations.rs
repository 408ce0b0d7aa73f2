//! Quadratic and flat-boundary approximations for American options.
//!
//! Both engines price NPV only; sensitivities come from bump-and-reprice.
//!
//! - Barone-Adesi & Whaley (1987): European value plus a quadratic
//!   early-exercise premium, with the critical price found by Newton
//!   iteration.
//! - Bjerksund & Stensland (1993): exercise against a flat trigger chosen
//!   from the perpetual and immediate-exercise boundaries; puts through the
//!   put-call transformation P(S, K, r, q) = C(K, S, q, r).

use std::rc::Rc;

use tracing::debug;

use pricer_models::analytical::{norm_cdf, norm_pdf};
use pricer_models::instruments::{ExerciseStyle, OptionRight};
use pricer_models::models::{BlackScholesMertonProcess, ProcessSnapshot};

use super::{
    degenerate_npv, is_degenerate, require_style, snapshot, EngineArguments, EngineError,
    PricingEngine,
};

/// Relative tolerance on the critical-price equation.
const CRITICAL_PRICE_ACCURACY: f64 = 1e-6;

/// Newton iterations allowed for the critical price.
const CRITICAL_PRICE_MAX_ITERATIONS: usize = 200;

/// Barone-Adesi-Whaley approximation engine.
#[derive(Debug, Clone)]
pub struct BaroneAdesiWhaleyEngine {
    process: Rc<BlackScholesMertonProcess>,
}

impl BaroneAdesiWhaleyEngine {
    const NAME: &'static str = "BaroneAdesiWhaleyEngine";

    /// Create an engine over `process`.
    pub fn new(process: Rc<BlackScholesMertonProcess>) -> Self {
        Self { process }
    }
}

impl PricingEngine for BaroneAdesiWhaleyEngine {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn npv(&self, args: &EngineArguments) -> Result<f64, EngineError> {
        require_style(Self::NAME, args, ExerciseStyle::American)?;
        let snap = snapshot(&self.process, args)?;
        if is_degenerate(&snap) {
            return degenerate_npv(&snap, args);
        }

        let strike = args.payoff.strike();
        let right = args.payoff.right();
        let european = snap
            .black_scholes()?
            .price(strike, snap.time_to_expiry, right);

        if !has_early_exercise_premium(&snap, right) {
            return Ok(european);
        }

        let q = Quadratic::new(&snap, right);
        let spot = snap.spot;
        let value = q.critical_price(strike).map(|critical| {
            let d1 = q.d1(critical, strike);
            match right {
                OptionRight::Call if spot < critical => {
                    let a = (critical / q.exponent) * (1.0 - q.dividend_discount * norm_cdf(d1));
                    european + a * (spot / critical).powf(q.exponent)
                }
                OptionRight::Put if spot > critical => {
                    let a =
                        -(critical / q.exponent) * (1.0 - q.dividend_discount * norm_cdf(-d1));
                    european + a * (spot / critical).powf(q.exponent)
                }
                _ => args.payoff.value(spot),
            }
        });

        Ok(within_bounds(Self::NAME, value, &snap, args, european))
    }
}

/// Clamp an approximation to [max(european, intrinsic), S] for calls or
/// [max(european, intrinsic), K] for puts.
///
/// For vanishing variance both approximations overflow; a failed or
/// out-of-range result is replaced by the lower bound, which is their limit.
fn within_bounds(
    engine: &'static str,
    value: Result<f64, EngineError>,
    snap: &ProcessSnapshot,
    args: &EngineArguments,
    european: f64,
) -> f64 {
    let lower = european.max(args.payoff.value(snap.spot));
    let upper = match args.payoff.right() {
        OptionRight::Call => snap.spot,
        OptionRight::Put => args.payoff.strike(),
    };
    match value {
        Ok(v) if v.is_finite() && v <= upper => v.max(lower),
        Ok(v) => {
            debug!(engine, value = v, lower, upper, "approximation out of bounds, using lower bound");
            lower
        }
        Err(err) => {
            debug!(engine, error = %err, "approximation failed, using lower bound");
            lower
        }
    }
}

/// American calls without dividends and puts without positive rates are
/// never exercised early.
fn has_early_exercise_premium(snap: &ProcessSnapshot, right: OptionRight) -> bool {
    match right {
        OptionRight::Call => snap.dividend_yield > 0.0,
        OptionRight::Put => snap.risk_free_rate > 0.0,
    }
}

/// Terms of the quadratic approximation for one snapshot.
struct Quadratic {
    right: OptionRight,
    variance: f64,
    std_dev: f64,
    discount: f64,
    dividend_discount: f64,
    /// 2(r - q)/σ²
    n: f64,
    /// Exponent q₂ (calls) or q₁ (puts)
    exponent: f64,
}

impl Quadratic {
    fn new(snap: &ProcessSnapshot, right: OptionRight) -> Self {
        let variance = snap.volatility * snap.volatility * snap.time_to_expiry;
        let discount = snap.discount();
        let dividend_discount = snap.dividend_discount();
        let n = 2.0 * (dividend_discount / discount).ln() / variance;
        let k = if (discount - 1.0).abs() > 1e-12 {
            -2.0 * discount.ln() / (variance * (1.0 - discount))
        } else {
            2.0 / variance
        };
        let root = ((n - 1.0) * (n - 1.0) + 4.0 * k).sqrt();
        let exponent = match right {
            OptionRight::Call => (-(n - 1.0) + root) / 2.0,
            OptionRight::Put => (-(n - 1.0) - root) / 2.0,
        };

        Self {
            right,
            variance,
            std_dev: variance.sqrt(),
            discount,
            dividend_discount,
            n,
            exponent,
        }
    }

    fn d1(&self, spot: f64, strike: f64) -> f64 {
        let forward = spot * self.dividend_discount / self.discount;
        ((forward / strike).ln() + 0.5 * self.variance) / self.std_dev
    }

    fn european(&self, spot: f64, strike: f64) -> f64 {
        let d1 = self.d1(spot, strike);
        let d2 = d1 - self.std_dev;
        let w = self.right.sign();
        w * (spot * self.dividend_discount * norm_cdf(w * d1)
            - strike * self.discount * norm_cdf(w * d2))
    }

    /// Seed for the Newton iteration (Barone-Adesi & Whaley, eq. 27).
    fn seed(&self, strike: f64) -> f64 {
        let m = -2.0 * self.discount.ln() / self.variance;
        let carry = (self.dividend_discount / self.discount).ln();
        let root = ((self.n - 1.0) * (self.n - 1.0) + 4.0 * m).sqrt();

        match self.right {
            OptionRight::Call => {
                let qu = (-(self.n - 1.0) + root) / 2.0;
                let su = strike / (1.0 - 1.0 / qu);
                let h = -(carry + 2.0 * self.std_dev) * strike / (su - strike);
                strike + (su - strike) * (1.0 - h.exp())
            }
            OptionRight::Put => {
                let qu = (-(self.n - 1.0) - root) / 2.0;
                let su = strike / (1.0 - 1.0 / qu);
                let h = (carry - 2.0 * self.std_dev) * strike / (strike - su);
                su + (strike - su) * h.exp()
            }
        }
    }

    /// Critical price S* at which immediate exercise equals continuation.
    fn critical_price(&self, strike: f64) -> Result<f64, EngineError> {
        let q = self.exponent;
        let dq = self.dividend_discount;
        let mut si = self.seed(strike);

        for _ in 0..CRITICAL_PRICE_MAX_ITERATIONS {
            if !si.is_finite() || si <= 0.0 {
                break;
            }
            let d1 = self.d1(si, strike);
            let european = self.european(si, strike);

            match self.right {
                OptionRight::Call => {
                    let lhs = si - strike;
                    let rhs = european + (1.0 - dq * norm_cdf(d1)) * si / q;
                    if ((lhs - rhs) / strike).abs() <= CRITICAL_PRICE_ACCURACY {
                        return Ok(si);
                    }
                    let bi = dq * norm_cdf(d1) * (1.0 - 1.0 / q)
                        + (1.0 - dq * norm_pdf(d1) / self.std_dev) / q;
                    si = (strike + rhs - bi * si) / (1.0 - bi);
                }
                OptionRight::Put => {
                    let lhs = strike - si;
                    let rhs = european - (1.0 - dq * norm_cdf(-d1)) * si / q;
                    if ((lhs - rhs) / strike).abs() <= CRITICAL_PRICE_ACCURACY {
                        return Ok(si);
                    }
                    let bi = -dq * norm_cdf(-d1) * (1.0 - 1.0 / q)
                        - (1.0 + dq * norm_pdf(-d1) / self.std_dev) / q;
                    si = (strike - rhs + bi * si) / (1.0 + bi);
                }
            }
        }

        Err(EngineError::NumericalFailure {
            engine: BaroneAdesiWhaleyEngine::NAME,
            message: format!("critical price did not converge (last iterate {})", si),
        })
    }
}

/// Bjerksund-Stensland (1993) approximation engine.
#[derive(Debug, Clone)]
pub struct BjerksundStenslandEngine {
    process: Rc<BlackScholesMertonProcess>,
}

impl BjerksundStenslandEngine {
    const NAME: &'static str = "BjerksundStenslandEngine";

    /// Create an engine over `process`.
    pub fn new(process: Rc<BlackScholesMertonProcess>) -> Self {
        Self { process }
    }
}

impl PricingEngine for BjerksundStenslandEngine {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn npv(&self, args: &EngineArguments) -> Result<f64, EngineError> {
        require_style(Self::NAME, args, ExerciseStyle::American)?;
        let snap = snapshot(&self.process, args)?;
        if is_degenerate(&snap) {
            return degenerate_npv(&snap, args);
        }

        let strike = args.payoff.strike();
        let right = args.payoff.right();
        let european = snap
            .black_scholes()?
            .price(strike, snap.time_to_expiry, right);

        if !has_early_exercise_premium(&snap, right) {
            return Ok(european);
        }

        let (r, q) = (snap.risk_free_rate, snap.dividend_yield);
        let value = match right {
            OptionRight::Call => flat_boundary_call(
                snap.spot,
                strike,
                snap.time_to_expiry,
                r,
                r - q,
                snap.volatility,
            ),
            OptionRight::Put => flat_boundary_call(
                strike,
                snap.spot,
                snap.time_to_expiry,
                q,
                q - r,
                snap.volatility,
            ),
        };

        Ok(within_bounds(Self::NAME, Ok(value), &snap, args, european))
    }
}

/// American call with cost of carry `b` exercised at a flat trigger.
fn flat_boundary_call(spot: f64, strike: f64, t: f64, r: f64, b: f64, sigma: f64) -> f64 {
    let v2 = sigma * sigma;
    let beta = (0.5 - b / v2) + ((b / v2 - 0.5).powi(2) + 2.0 * r / v2).sqrt();
    let b_inf = beta / (beta - 1.0) * strike;
    let b_zero = if r - b > 0.0 {
        strike.max(r / (r - b) * strike)
    } else {
        strike
    };
    let ht = -(b * t + 2.0 * sigma * t.sqrt()) * b_zero / (b_inf - b_zero);
    let trigger = b_zero + (b_inf - b_zero) * (1.0 - ht.exp());

    if spot >= trigger {
        return spot - strike;
    }

    let alpha = (trigger - strike) * trigger.powf(-beta);
    let phi = |gamma: f64, h: f64| -> f64 {
        let lambda = (-r + gamma * b + 0.5 * gamma * (gamma - 1.0) * v2) * t;
        let d = -((spot / h).ln() + (b + (gamma - 0.5) * v2) * t) / (sigma * t.sqrt());
        let kappa = 2.0 * b / v2 + (2.0 * gamma - 1.0);
        lambda.exp()
            * spot.powf(gamma)
            * (norm_cdf(d)
                - (trigger / spot).powf(kappa)
                    * norm_cdf(d - 2.0 * (trigger / spot).ln() / (sigma * t.sqrt())))
    };

    alpha * spot.powf(beta) - alpha * phi(beta, trigger) + phi(1.0, trigger) - phi(1.0, strike)
        - strike * phi(0.0, trigger)
        + strike * phi(0.0, strike)
}
