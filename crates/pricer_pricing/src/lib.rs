//! # Pricer Pricing (L3: Valuation)
//!
//! Pricing engines, the pricing-model catalog, and the valuation
//! orchestrator that turns (underlying, contract, method) into a price, a
//! deferred implied volatility and deferred Greeks.
//!
//! ## Layout
//!
//! - [`engines`]: the `PricingEngine` capability trait and twelve engines
//! - [`catalog`]: named pricing methods (`PricingModelCatalog`)
//! - [`valuation`]: `OptionPriceModel::evaluate` and `ValuationResult`
//! - [`greeks`]: deferred Greeks with bump-and-reprice fallback
//! - [`estimators`]: volatility, risk-free rate and dividend yield inputs
//! - [`config`]: `ValuationConfig` (TOML + `PRICER_*` overrides)
//! - [`chain`]: parallel valuation of a contract chain
//!
//! ## Error containment
//!
//! Engines and estimators return typed errors. `evaluate` is the single
//! place they are swallowed: the failure is logged through `tracing` at
//! debug level and the affected value (or the whole result) becomes zero.
//!
//! ## Example
//!
//! ```
//! use pricer_core::types::Date;
//! use pricer_models::instruments::{ExerciseStyle, OptionContract, OptionRight, Underlying};
//! use pricer_pricing::{MarketContext, PricingModelCatalog, PricingModelKind, ValuationConfig};
//!
//! let catalog = PricingModelCatalog::new(ValuationConfig::default()).unwrap();
//! let today = Date::from_ymd(2024, 5, 1).unwrap();
//! let put = OptionContract::new(
//!     "XYZ 240621P00095000",
//!     95.0,
//!     OptionRight::Put,
//!     Date::from_ymd(2024, 6, 21).unwrap(),
//!     ExerciseStyle::American,
//!     today,
//!     1.20,
//! )
//! .unwrap();
//! let xyz = Underlying::new("XYZ", 100.0).with_volatility(0.3);
//!
//! let model = catalog.model(PricingModelKind::BaroneAdesiWhaley);
//! let result = model.evaluate(&xyz, &MarketContext::new(today), &put);
//!
//! assert!(result.price() > 0.0);
//! let iv = result.implied_volatility();
//! assert!(iv > 0.0 && iv < 4.0);
//! assert!(result.greeks().delta() < 0.0);
//! // Barone-Adesi-Whaley has no analytic elasticity
//! assert_eq!(result.greeks().elasticity(), 0.0);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod catalog;
pub mod chain;
pub mod config;
pub mod engines;
pub mod estimators;
pub mod greeks;
pub mod instrument;
pub mod valuation;

mod implied_vol;

pub use catalog::{ExercisePolicy, PricingMethod, PricingModelCatalog, PricingModelKind};
pub use chain::ChainValuation;
pub use config::{ConfigError, ImpliedVolatilityConfig, ValuationConfig};
pub use engines::{EngineError, Greek, PricingEngine};
pub use estimators::{EstimatorError, MarketContext, MarketEstimators, MarketInputEstimator};
pub use greeks::{Greeks, GreeksSnapshot};
pub use instrument::VanillaOption;
pub use valuation::{OptionPriceModel, ValuationError, ValuationResult, ValuationSnapshot};
