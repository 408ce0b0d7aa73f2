//! Numerical building blocks.
//!
//! - [`solvers`]: Bracketing root finder used for implied volatility

pub mod solvers;
