//! Option contract definitions.
//!
//! - [`OptionContract`]: the listed contract being valued
//! - [`Underlying`]: spot and volatility estimate of the underlying
//! - [`PlainVanillaPayoff`] / [`OptionRight`]: call or put on a strike
//! - [`ExerciseStyle`] / [`Exercise`]: declared style vs. priced schedule
//!
//! # Examples
//!
//! ```
//! use pricer_models::instruments::{Exercise, OptionRight, PlainVanillaPayoff};
//! use pricer_core::types::Date;
//!
//! let payoff = PlainVanillaPayoff::new(OptionRight::Call, 100.0).unwrap();
//! let exercise = Exercise::european(Date::from_ymd(2024, 12, 20).unwrap());
//!
//! assert_eq!(payoff.value(110.0_f64), 10.0);
//! assert!(exercise.style().is_european());
//! ```

mod contract;
mod error;
mod exercise;
mod payoff;

pub use contract::{OptionContract, Underlying};
pub use error::InstrumentError;
pub use exercise::{Exercise, ExerciseStyle};
pub use payoff::{OptionRight, PlainVanillaPayoff};
