//! Crank-Nicolson finite differences on the Black-Scholes PDE.
//!
//! The PDE is solved in x = ln S on a uniform grid centred on the current
//! spot, so the value, delta and gamma are read at the middle node without
//! interpolation. The first `damping_steps` steps are replaced by pairs of
//! implicit half steps (Rannacher start-up) to smooth the payoff kink.
//! American exercise is enforced by projecting onto the intrinsic value
//! after each step once exercise is allowed.

use std::rc::Rc;

use pricer_models::instruments::Exercise;
use pricer_models::models::{BlackScholesMertonProcess, ProcessSnapshot};

use super::{
    degenerate_delta_gamma, degenerate_npv, is_degenerate, snapshot, EngineArguments,
    EngineError, Greek, PricingEngine,
};

/// Grid half-width in standard deviations around the spot.
const GRID_STD_DEVS: f64 = 5.0;

/// Extra standard deviations kept beyond the strike when it is far away.
const STRIKE_MARGIN_STD_DEVS: f64 = 3.0;

/// Finite-difference engine for European and American vanilla options.
#[derive(Debug, Clone)]
pub struct FdBlackScholesVanillaEngine {
    process: Rc<BlackScholesMertonProcess>,
    time_steps: usize,
    grid_points: usize,
    damping_steps: usize,
}

/// Value, delta and gamma at the spot node.
#[derive(Debug, Clone, Copy)]
struct GridResults {
    value: f64,
    delta: f64,
    gamma: f64,
}

/// Three-point operator r·V = a·V[i-1] + b·V[i] + c·V[i+1] in log space.
#[derive(Debug, Clone, Copy)]
struct Operator {
    lower: f64,
    diag: f64,
    upper: f64,
}

impl Operator {
    fn new(snap: &ProcessSnapshot, dx: f64) -> Self {
        let variance = snap.volatility * snap.volatility;
        let mu = snap.risk_free_rate - snap.dividend_yield - 0.5 * variance;
        let diffusion = 0.5 * variance / (dx * dx);
        let convection = mu / (2.0 * dx);
        Self {
            lower: diffusion - convection,
            diag: -2.0 * diffusion - snap.risk_free_rate,
            upper: diffusion + convection,
        }
    }

    #[inline]
    fn apply(&self, v: &[f64], i: usize) -> f64 {
        self.lower * v[i - 1] + self.diag * v[i] + self.upper * v[i + 1]
    }
}

/// Scratch buffers reused across time steps.
struct Workspace {
    rhs: Vec<f64>,
    c_star: Vec<f64>,
    d_star: Vec<f64>,
    solution: Vec<f64>,
}

impl Workspace {
    fn new(interior: usize) -> Self {
        Self {
            rhs: vec![0.0; interior],
            c_star: vec![0.0; interior],
            d_star: vec![0.0; interior],
            solution: vec![0.0; interior],
        }
    }
}

impl FdBlackScholesVanillaEngine {
    const NAME: &'static str = "FdBlackScholesVanillaEngine";

    /// Create an engine.
    ///
    /// `grid_points` is rounded up to an even number so the spot sits on a
    /// node.
    ///
    /// # Errors
    /// `EngineError::InvalidSetting` unless `time_steps >= 1`,
    /// `grid_points >= 4` and `damping_steps <= time_steps`.
    pub fn new(
        process: Rc<BlackScholesMertonProcess>,
        time_steps: usize,
        grid_points: usize,
        damping_steps: usize,
    ) -> Result<Self, EngineError> {
        if time_steps == 0 {
            return Err(EngineError::InvalidSetting(
                "finite-difference time steps must be positive".to_string(),
            ));
        }
        if grid_points < 4 {
            return Err(EngineError::InvalidSetting(format!(
                "finite-difference grid needs at least 4 points, got {}",
                grid_points
            )));
        }
        if damping_steps > time_steps {
            return Err(EngineError::InvalidSetting(format!(
                "damping steps ({}) exceed time steps ({})",
                damping_steps, time_steps
            )));
        }
        Ok(Self {
            process,
            time_steps,
            grid_points: grid_points + grid_points % 2,
            damping_steps,
        })
    }

    fn calculate(&self, args: &EngineArguments) -> Result<GridResults, EngineError> {
        let snap = snapshot(&self.process, args)?;
        if is_degenerate(&snap) {
            let (delta, gamma) = degenerate_delta_gamma(&snap, args)?;
            return Ok(GridResults {
                value: degenerate_npv(&snap, args)?,
                delta,
                gamma,
            });
        }

        let payoff = args.payoff;
        let strike = payoff.strike();
        let sign = payoff.right().sign();
        let maturity = snap.time_to_expiry;
        let std_dev = snap.volatility * maturity.sqrt();

        let half_width = (GRID_STD_DEVS * std_dev)
            .max((strike / snap.spot).ln().abs() + STRIKE_MARGIN_STD_DEVS * std_dev);
        let centre = self.grid_points / 2;
        let dx = half_width / centre as f64;
        let x0 = snap.spot.ln();

        let spots: Vec<f64> = (0..=self.grid_points)
            .map(|i| (x0 + (i as f64 - centre as f64) * dx).exp())
            .collect();
        let intrinsic: Vec<f64> = spots.iter().map(|&s| payoff.value(s)).collect();

        // Exercise is allowed while the remaining life is at most this
        let exercise_horizon = match args.exercise {
            Exercise::European { .. } => None,
            Exercise::American { earliest, .. } => {
                Some(maturity - self.process.time_to(earliest).max(0.0))
            }
        };
        let can_exercise = |tau: f64| exercise_horizon.is_some_and(|h| tau <= h + 1e-12);

        let boundary = |tau: f64| -> (f64, f64) {
            let df = (-snap.risk_free_rate * tau).exp();
            let qf = (-snap.dividend_yield * tau).exp();
            let forward_intrinsic = |s: f64| (sign * (s * qf - strike * df)).max(0.0);
            let last = spots.len() - 1;
            let mut lo = forward_intrinsic(spots[0]);
            let mut hi = forward_intrinsic(spots[last]);
            if can_exercise(tau) {
                lo = lo.max(intrinsic[0]);
                hi = hi.max(intrinsic[last]);
            }
            (lo, hi)
        };

        let op = Operator::new(&snap, dx);
        let mut values = intrinsic.clone();
        let mut work = Workspace::new(values.len() - 2);
        let dt = maturity / self.time_steps as f64;
        let mut tau = 0.0;

        for step in 0..self.time_steps {
            if step < self.damping_steps {
                for half in 1..=2 {
                    let to = tau + 0.5 * dt * half as f64;
                    self.step(&op, &mut values, &mut work, 0.5 * dt, 1.0, boundary(to))?;
                    if can_exercise(to) {
                        project(&mut values, &intrinsic);
                    }
                }
            } else {
                self.step(&op, &mut values, &mut work, dt, 0.5, boundary(tau + dt))?;
                if can_exercise(tau + dt) {
                    project(&mut values, &intrinsic);
                }
            }
            tau += dt;
        }

        let (down, mid, up) = (values[centre - 1], values[centre], values[centre + 1]);
        let vx = (up - down) / (2.0 * dx);
        let vxx = (up - 2.0 * mid + down) / (dx * dx);
        let spot = snap.spot;

        Ok(GridResults {
            value: mid,
            delta: vx / spot,
            gamma: (vxx - vx) / (spot * spot),
        })
    }

    /// One theta-scheme step of size `h` backwards in calendar time.
    fn step(
        &self,
        op: &Operator,
        values: &mut [f64],
        work: &mut Workspace,
        h: f64,
        theta: f64,
        (lower_bound, upper_bound): (f64, f64),
    ) -> Result<(), EngineError> {
        let n = work.rhs.len();
        let explicit = (1.0 - theta) * h;
        let implicit = theta * h;

        for k in 0..n {
            let i = k + 1;
            work.rhs[k] = values[i] + explicit * op.apply(values, i);
        }
        work.rhs[0] += implicit * op.lower * lower_bound;
        work.rhs[n - 1] += implicit * op.upper * upper_bound;

        let lower = -implicit * op.lower;
        let diag = 1.0 - implicit * op.diag;
        let upper = -implicit * op.upper;
        solve_constant_tridiagonal(lower, diag, upper, work)?;

        values[0] = lower_bound;
        values[1..=n].copy_from_slice(&work.solution);
        values[n + 1] = upper_bound;
        Ok(())
    }
}

fn project(values: &mut [f64], intrinsic: &[f64]) {
    for (v, &e) in values.iter_mut().zip(intrinsic) {
        *v = v.max(e);
    }
}

/// Thomas algorithm for a tridiagonal matrix with constant bands.
fn solve_constant_tridiagonal(
    lower: f64,
    diag: f64,
    upper: f64,
    work: &mut Workspace,
) -> Result<(), EngineError> {
    let n = work.rhs.len();
    let singular = || EngineError::NumericalFailure {
        engine: FdBlackScholesVanillaEngine::NAME,
        message: "tridiagonal system is singular".to_string(),
    };

    if diag.abs() <= 1e-14 {
        return Err(singular());
    }
    work.c_star[0] = upper / diag;
    work.d_star[0] = work.rhs[0] / diag;

    for i in 1..n {
        let denom = diag - lower * work.c_star[i - 1];
        if denom.abs() <= 1e-14 {
            return Err(singular());
        }
        work.c_star[i] = upper / denom;
        work.d_star[i] = (work.rhs[i] - lower * work.d_star[i - 1]) / denom;
    }

    work.solution[n - 1] = work.d_star[n - 1];
    for i in (0..n - 1).rev() {
        work.solution[i] = work.d_star[i] - work.c_star[i] * work.solution[i + 1];
    }
    Ok(())
}

impl PricingEngine for FdBlackScholesVanillaEngine {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn npv(&self, args: &EngineArguments) -> Result<f64, EngineError> {
        // Crank-Nicolson can undershoot zero far out of the money
        Ok(self.calculate(args)?.value.max(0.0))
    }

    fn greek(&self, greek: Greek, args: &EngineArguments) -> Result<f64, EngineError> {
        match greek {
            Greek::Delta => Ok(self.calculate(args)?.delta),
            Greek::Gamma => Ok(self.calculate(args)?.gamma),
            _ => Err(EngineError::GreekNotProvided(greek)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pricer_core::market_data::EvaluationClock;
    use pricer_core::types::{Calendar, Date};
    use pricer_models::instruments::{OptionRight, PlainVanillaPayoff};
    use pricer_models::models::MarketQuotes;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    fn engine(spot: f64, r: f64, q: f64) -> FdBlackScholesVanillaEngine {
        let process = Rc::new(BlackScholesMertonProcess::new(
            EvaluationClock::shared(d(2023, 1, 2)),
            MarketQuotes::new(spot, 0.2, r, q),
            Calendar::WeekendsOnly,
        ));
        FdBlackScholesVanillaEngine::new(process, 100, 100, 2).unwrap()
    }

    // ========================================
    // European
    // ========================================

    #[test]
    fn test_european_put_close_to_closed_form() {
        // One year of Actual/365: 2023-01-02 to 2024-01-02
        let engine = engine(100.0, 0.05, 0.0);
        let args = EngineArguments::new(
            PlainVanillaPayoff::new(OptionRight::Put, 100.0).unwrap(),
            Exercise::european(d(2024, 1, 2)),
        );
        let npv = engine.npv(&args).unwrap();
        assert!(((npv - 5.573526022256971) / 5.573526022256971).abs() < 5e-3);

        let delta = engine.greek(Greek::Delta, &args).unwrap();
        assert_relative_eq!(delta, -0.3632, epsilon = 5e-3);
        let gamma = engine.greek(Greek::Gamma, &args).unwrap();
        assert_relative_eq!(gamma, 0.01876, epsilon = 5e-4);
    }

    #[test]
    fn test_short_dated_in_the_money_call() {
        let engine = engine(110.0, 0.0, 0.0);
        let args = EngineArguments::new(
            PlainVanillaPayoff::new(OptionRight::Call, 100.0).unwrap(),
            Exercise::european(d(2023, 2, 6)),
        );
        assert_relative_eq!(engine.npv(&args).unwrap(), 10.174029618505827, epsilon = 5e-3);
    }

    // ========================================
    // American
    // ========================================

    #[test]
    fn test_american_put_premium() {
        let engine = engine(100.0, 0.05, 0.0);
        let payoff = PlainVanillaPayoff::new(OptionRight::Put, 100.0).unwrap();
        let american = engine
            .npv(&EngineArguments::new(
                payoff,
                Exercise::american(d(2023, 1, 2), d(2024, 1, 2)).unwrap(),
            ))
            .unwrap();
        assert_relative_eq!(american, 6.074, epsilon = 2e-2);

        let european = engine
            .npv(&EngineArguments::new(payoff, Exercise::european(d(2024, 1, 2))))
            .unwrap();
        assert!(american > european + 0.3);
    }

    #[test]
    fn test_deep_in_the_money_american_put_is_intrinsic() {
        let engine = engine(40.0, 0.05, 0.0);
        let args = EngineArguments::new(
            PlainVanillaPayoff::new(OptionRight::Put, 100.0).unwrap(),
            Exercise::american(d(2023, 1, 2), d(2023, 7, 3)).unwrap(),
        );
        assert_relative_eq!(engine.npv(&args).unwrap(), 60.0, epsilon = 1e-9);
        assert_relative_eq!(engine.greek(Greek::Delta, &args).unwrap(), -1.0, epsilon = 1e-3);
    }

    // ========================================
    // Settings
    // ========================================

    #[test]
    fn test_invalid_settings() {
        let process = Rc::new(BlackScholesMertonProcess::new(
            EvaluationClock::shared(d(2023, 1, 2)),
            MarketQuotes::new(100.0, 0.2, 0.0, 0.0),
            Calendar::WeekendsOnly,
        ));
        for (t, x, damping) in [(0, 100, 0), (100, 3, 0), (2, 100, 3)] {
            assert!(matches!(
                FdBlackScholesVanillaEngine::new(Rc::clone(&process), t, x, damping),
                Err(EngineError::InvalidSetting(_))
            ));
        }
    }

    #[test]
    fn test_only_delta_and_gamma() {
        let engine = engine(100.0, 0.0, 0.0);
        let args = EngineArguments::new(
            PlainVanillaPayoff::new(OptionRight::Call, 100.0).unwrap(),
            Exercise::european(d(2023, 6, 1)),
        );
        assert!(engine.greek(Greek::Vega, &args).unwrap_err().is_greek_not_provided());
    }
}
