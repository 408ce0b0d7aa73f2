//! Root-finding solvers.
//!
//! [`BrentSolver`] is a bracketing method that needs no derivative, which
//! suits objectives built on numerical pricers (lattices, PDE grids) where a
//! derivative would itself be a bump-and-reprice.
//!
//! ## Configuration
//!
//! [`SolverConfig`] carries:
//! - `tolerance`: Convergence tolerance (default: 1e-10)
//! - `max_iterations`: Maximum iteration count (default: 100)
//!
//! ## Examples
//!
//! ```
//! use pricer_core::math::solvers::{BrentSolver, SolverConfig};
//!
//! let solver = BrentSolver::new(SolverConfig::default());
//! let root = solver.find_root(|x: f64| x * x - 2.0, 0.0, 2.0).unwrap();
//! assert!((root - std::f64::consts::SQRT_2).abs() < 1e-10);
//! ```

mod brent;
mod config;

pub use brent::BrentSolver;
pub use config::SolverConfig;
