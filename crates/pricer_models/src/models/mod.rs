//! Stochastic processes for option valuation.
//!
//! Only the generalized Black-Scholes-Merton process is provided; every
//! pricing engine in the workspace prices against it.

pub mod black_scholes_process;

pub use black_scholes_process::{
    BlackScholesMertonProcess, MarketQuotes, ProcessSnapshot, PROCESS_DAY_COUNT,
};
