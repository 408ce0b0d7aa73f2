//! Implied volatility by Brent root finding on the engine NPV.

use std::panic::{self, AssertUnwindSafe};

use pricer_core::math::solvers::{BrentSolver, SolverConfig};
use tracing::debug;

use crate::valuation::{panic_message, ValuationError, ValuationState};

/// Volatility σ in the configured bracket with NPV(σ) = market price.
///
/// The volatility quote is restored when the search ends.
pub(crate) fn solve(state: &ValuationState) -> Result<f64, ValuationError> {
    let settings = state.implied_volatility;
    let solver = BrentSolver::new(SolverConfig {
        tolerance: settings.accuracy,
        max_iterations: settings.max_evaluations,
    });
    let quote = state.process.volatility_quote();
    let target = state.market_price;

    solver.try_find_root(
        |sigma| {
            let _trial = quote.set_scoped(sigma);
            Ok::<f64, ValuationError>(state.reprice()? - target)
        },
        settings.min_volatility,
        settings.max_volatility,
    )
}

/// `solve`, with every failure logged and reported as 0.
pub(crate) fn solve_or_zero(state: &ValuationState) -> f64 {
    match panic::catch_unwind(AssertUnwindSafe(|| solve(state))) {
        Ok(Ok(vol)) => vol,
        Ok(Err(err)) => {
            debug!(
                contract = %state.label,
                market_price = state.market_price,
                error = %err,
                "implied volatility failed"
            );
            0.0
        }
        Err(payload) => {
            debug!(
                contract = %state.label,
                panic = panic_message(payload.as_ref()),
                "implied volatility panicked"
            );
            0.0
        }
    }
}
