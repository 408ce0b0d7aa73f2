//! Closed-form formulas for European options.
//!
//! This module provides:
//! - The generalized Black-Scholes-Merton formula with continuous dividend yield
//! - Analytical Greeks (Delta, Gamma, Vega, Theta, Rho, dividend Rho, Elasticity)
//! - Standard normal CDF/PDF
//!
//! ## Design Principles
//!
//! - **Generic over `T: Float`**: the same code serves `f64` and `f32`
//! - **Degenerate inputs are priced, not rejected**: zero volatility or zero
//!   time collapses to the discounted forward intrinsic value

pub mod black_scholes;
pub mod distributions;
pub mod error;

pub use black_scholes::BlackScholesMerton;
pub use distributions::{norm_cdf, norm_pdf};
pub use error::AnalyticalError;
