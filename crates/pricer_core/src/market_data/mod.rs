//! Market data for a single evaluation.
//!
//! # Components
//!
//! - [`quote`]: Named mutable scalars with scoped bump guards
//! - [`clock`]: Per-evaluation valuation date with scoped shifts
//! - [`curves`]: Yield term structures (FlatForward)
//! - [`surfaces`]: Black volatility term structures (BlackConstantVol)
//! - [`error`]: Market data error types (MarketDataError)
//!
//! Term structures hold shared handles to quotes and to the clock, so a
//! bump applied to a quote or a shift applied to the clock is seen by every
//! structure built on top of it until the guard is dropped.
//!
//! # Example
//!
//! ```
//! use pricer_core::market_data::{EvaluationClock, SimpleQuote};
//! use pricer_core::market_data::curves::{FlatForward, YieldCurve};
//! use pricer_core::types::{Date, DayCountConvention};
//!
//! let clock = EvaluationClock::shared(Date::from_ymd(2024, 1, 2).unwrap());
//! let rate = SimpleQuote::shared("risk-free", 0.05);
//! let curve = FlatForward::new(clock, rate.clone(), DayCountConvention::Actual365Fixed);
//!
//! let base = curve.discount_factor(1.0).unwrap();
//! {
//!     let _bump = rate.bump(0.001);
//!     assert!(curve.discount_factor(1.0).unwrap() < base);
//! }
//! assert_eq!(curve.discount_factor(1.0).unwrap(), base);
//! ```

pub mod clock;
pub mod curves;
pub mod error;
pub mod quote;
pub mod surfaces;

pub use clock::{ClockGuard, EvaluationClock};
pub use curves::{FlatForward, YieldCurve};
pub use error::MarketDataError;
pub use quote::{QuoteGuard, QuoteHandle, SimpleQuote};
pub use surfaces::{BlackConstantVol, VolatilitySurface};
