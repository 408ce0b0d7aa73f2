//! # pricer_core: Foundation for Option Valuation
//!
//! ## Layer 1 (Foundation) Role
//!
//! pricer_core is the bottom layer of the pricer workspace, providing:
//! - Time types: `Date`, `DayCountConvention` (`types::time`)
//! - Trading calendars for settlement lags: `Calendar` (`types::calendar`)
//! - Error types: `PricingError`, `DateError`, `CalendarError`, `SolverError` (`types::error`)
//! - Mutable quotes, the per-evaluation clock and flat term structures (`market_data`)
//! - Brent root finding (`math::solvers`)
//!
//! ## Zero Dependency Principle
//!
//! Layer 1 has no dependencies on other pricer_* crates, with minimal external dependencies:
//! - num-traits: Traits for generic numerical computation
//! - chrono: Date arithmetic
//! - thiserror: Error derivation
//! - serde: Serialisation support (optional)
//!
//! ## Usage Examples
//!
//! ```rust
//! use pricer_core::market_data::{EvaluationClock, SimpleQuote, FlatForward, YieldCurve};
//! use pricer_core::types::{Calendar, Date, DayCountConvention};
//!
//! let observation = Date::from_ymd(2024, 6, 3).unwrap();
//! let settlement = Calendar::UnitedStatesNyse.advance(observation, 3).unwrap();
//!
//! let clock = EvaluationClock::shared(settlement);
//! let rate = SimpleQuote::shared("risk-free", 0.01);
//! let curve = FlatForward::new(clock, rate, DayCountConvention::Actual365Fixed);
//! assert!(curve.discount_factor(1.0).unwrap() < 1.0);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): Enable serialisation for Date, Calendar

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod market_data;
pub mod math;
pub mod traits;
pub mod types;
