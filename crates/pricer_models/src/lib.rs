//! # Pricer Models (L2: Business Logic)
//!
//! Option contracts, the Black-Scholes-Merton process, and closed-form
//! formulas.
//!
//! This crate provides:
//! - Contract definitions (strike, right, expiry, exercise style)
//! - Payoff and exercise schedules handed to pricing engines
//! - The generalized Black-Scholes-Merton process over live quotes
//! - Closed-form prices and Greeks with dividend yield
//!
//! ## Example
//!
//! ```
//! use pricer_models::instruments::OptionRight;
//! use pricer_models::models::{BlackScholesMertonProcess, MarketQuotes};
//! use pricer_core::market_data::EvaluationClock;
//! use pricer_core::types::{Calendar, Date};
//!
//! let clock = EvaluationClock::shared(Date::from_ymd(2024, 1, 2).unwrap());
//! let process = BlackScholesMertonProcess::new(
//!     clock,
//!     MarketQuotes::new(100.0, 0.2, 0.01, 0.0),
//!     Calendar::UnitedStatesNyse,
//! );
//!
//! let maturity = Date::from_ymd(2024, 2, 1).unwrap();
//! let bsm = process.snapshot(maturity, 100.0).unwrap().black_scholes().unwrap();
//! let t = process.time_to(maturity);
//! assert!(bsm.price(100.0, t, OptionRight::Call) > 0.0);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod analytical;
pub mod instruments;
pub mod models;
