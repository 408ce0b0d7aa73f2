//! Deferred Greeks.
//!
//! Each Greek is a zero-argument closure over the evaluation's state. On
//! every call it asks the engine for the analytic value; if the engine
//! cannot provide it and approximation is enabled, it bumps the relevant
//! quote (or shifts the evaluation clock) and reprices:
//!
//! | Greek | Bump | Estimate |
//! |-------|------|----------|
//! | delta | spot ± 0.01 | (V₊ - V₋) / 2h |
//! | gamma | spot ± 0.01 | (V₊ - 2V₀ + V₋) / h² |
//! | vega | volatility + 0.001 | (V₊ - V₀) / h |
//! | theta | valuation date - 1 day | (V₀ - V₋₁) · 365 |
//! | rho | risk-free rate + 0.001 | (V₊ - V₀) / h |
//! | elasticity | none | 0 |
//!
//! Bumps are scoped guards, so every quote and the clock are back at their
//! original values when a Greek returns, whether it succeeded, failed or
//! panicked. Failures are logged at debug level and reported as 0.

use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use serde::Serialize;
use tracing::debug;

use crate::engines::Greek;
use crate::valuation::{panic_message, ValuationError, ValuationState};

/// Spot bump for delta and gamma.
pub const SPOT_BUMP: f64 = 0.01;

/// Absolute volatility bump for vega.
pub const VOLATILITY_BUMP: f64 = 0.001;

/// Absolute rate bump for rho.
pub const RATE_BUMP: f64 = 0.001;

/// Calendar days per year used by theta.
pub const DAYS_PER_YEAR: f64 = 365.0;

type Deferred = Box<dyn Fn() -> f64>;

/// Lazily computed sensitivities of one valuation.
///
/// Values are recomputed on every call and never cached.
pub struct Greeks {
    delta: Deferred,
    gamma: Deferred,
    vega: Deferred,
    theta: Deferred,
    rho: Deferred,
    elasticity: Deferred,
}

impl Greeks {
    pub(crate) fn deferred(state: &Rc<ValuationState>) -> Self {
        let greek = |g: Greek| -> Deferred {
            let state = Rc::clone(state);
            Box::new(move || sensitivity(&state, g))
        };
        Self {
            delta: greek(Greek::Delta),
            gamma: greek(Greek::Gamma),
            vega: greek(Greek::Vega),
            theta: greek(Greek::Theta),
            rho: greek(Greek::Rho),
            elasticity: greek(Greek::Elasticity),
        }
    }

    /// All six Greeks fixed at zero.
    pub fn zero() -> Self {
        let zero = || -> Deferred { Box::new(|| 0.0) };
        Self {
            delta: zero(),
            gamma: zero(),
            vega: zero(),
            theta: zero(),
            rho: zero(),
            elasticity: zero(),
        }
    }

    /// ∂V/∂S
    pub fn delta(&self) -> f64 {
        (self.delta)()
    }

    /// ∂²V/∂S²
    pub fn gamma(&self) -> f64 {
        (self.gamma)()
    }

    /// ∂V/∂σ per unit volatility.
    pub fn vega(&self) -> f64 {
        (self.vega)()
    }

    /// ∂V/∂t per year.
    pub fn theta(&self) -> f64 {
        (self.theta)()
    }

    /// Theta per calendar day.
    pub fn theta_per_day(&self) -> f64 {
        self.theta() / DAYS_PER_YEAR
    }

    /// ∂V/∂r per unit rate.
    pub fn rho(&self) -> f64 {
        (self.rho)()
    }

    /// Δ·S/V; 0 when the engine has no analytic value.
    pub fn elasticity(&self) -> f64 {
        (self.elasticity)()
    }

    /// One Greek by name.
    pub fn get(&self, greek: Greek) -> f64 {
        match greek {
            Greek::Delta => self.delta(),
            Greek::Gamma => self.gamma(),
            Greek::Vega => self.vega(),
            Greek::Theta => self.theta(),
            Greek::Rho => self.rho(),
            Greek::Elasticity => self.elasticity(),
        }
    }

    /// Evaluate every Greek once.
    pub fn snapshot(&self) -> GreeksSnapshot {
        GreeksSnapshot {
            delta: self.delta(),
            gamma: self.gamma(),
            vega: self.vega(),
            theta: self.theta(),
            rho: self.rho(),
            elasticity: self.elasticity(),
        }
    }
}

impl std::fmt::Debug for Greeks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Greeks { .. }")
    }
}

/// Greeks evaluated once, for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GreeksSnapshot {
    /// ∂V/∂S
    pub delta: f64,
    /// ∂²V/∂S²
    pub gamma: f64,
    /// ∂V/∂σ
    pub vega: f64,
    /// ∂V/∂t per year
    pub theta: f64,
    /// ∂V/∂r
    pub rho: f64,
    /// Δ·S/V
    pub elasticity: f64,
}

/// Analytic value first, bump-and-reprice second, zero last.
fn sensitivity(state: &ValuationState, greek: Greek) -> f64 {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        match state.option.greek(greek) {
            Ok(value) if value.is_finite() => return value,
            Ok(value) => debug!(
                contract = %state.label,
                %greek,
                value,
                "analytic greek is not finite"
            ),
            Err(err) => debug!(
                contract = %state.label,
                %greek,
                engine = state.option.engine_name(),
                error = %err,
                "analytic greek unavailable"
            ),
        }

        if greek == Greek::Elasticity || !state.approximate_greeks {
            return 0.0;
        }

        match approximate(state, greek) {
            Ok(value) => value,
            Err(err) => {
                debug!(contract = %state.label, %greek, error = %err, "greek approximation failed");
                0.0
            }
        }
    }));

    outcome.unwrap_or_else(|payload| {
        debug!(
            contract = %state.label,
            %greek,
            panic = panic_message(payload.as_ref()),
            "greek computation panicked"
        );
        0.0
    })
}

/// Bump-and-reprice estimate of `greek`.
pub(crate) fn approximate(state: &ValuationState, greek: Greek) -> Result<f64, ValuationError> {
    let process = &state.process;
    match greek {
        Greek::Delta | Greek::Gamma => {
            let spot = process.spot_quote();
            let up = {
                let _bump = spot.bump(SPOT_BUMP);
                state.reprice()?
            };
            let down = {
                let _bump = spot.bump(-SPOT_BUMP);
                state.reprice()?
            };
            if greek == Greek::Delta {
                Ok((up - down) / (2.0 * SPOT_BUMP))
            } else {
                let base = state.reprice()?;
                Ok((up - 2.0 * base + down) / (SPOT_BUMP * SPOT_BUMP))
            }
        }
        Greek::Vega => {
            let base = state.reprice()?;
            let up = {
                let _bump = process.volatility_quote().bump(VOLATILITY_BUMP);
                state.reprice()?
            };
            Ok((up - base) / VOLATILITY_BUMP)
        }
        Greek::Theta => {
            let base = state.reprice()?;
            let earlier = {
                let _shift = process.clock().shift_days(-1)?;
                state.reprice()?
            };
            Ok((base - earlier) * DAYS_PER_YEAR)
        }
        Greek::Rho => {
            let base = state.reprice()?;
            let up = {
                let _bump = process.risk_free_quote().bump(RATE_BUMP);
                state.reprice()?
            };
            Ok((up - base) / RATE_BUMP)
        }
        Greek::Elasticity => Err(ValuationError::NotApproximated(greek)),
    }
}
