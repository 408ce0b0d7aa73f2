//! Valuation configuration.
//!
//! Loaded from TOML, then overridden by `PRICER_*` environment variables:
//!
//! ```toml
//! enable_greek_approximation = true
//! default_risk_free_rate = 0.01
//! default_dividend_yield = 0.0
//! settlement_days = 3
//! calendar = "united-states-nyse"
//! binomial_steps = 100
//! fd_time_steps = 100
//! fd_grid_points = 100
//!
//! [implied_volatility]
//! accuracy = 1e-4
//! max_evaluations = 100
//! min_volatility = 1e-7
//! max_volatility = 4.0
//! ```
//!
//! Every field is optional; missing fields take the defaults shown.

use std::path::Path;
use std::str::FromStr;

use pricer_core::types::Calendar;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engines::BinomialVanillaEngine;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("Configuration file error: {0}")]
    FileError(#[from] std::io::Error),

    /// Configuration file is not valid TOML for this schema.
    #[error("Configuration parse error: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Environment variable holds an unparsable value.
    #[error("Environment variable {name}: cannot parse {value:?}")]
    EnvError {
        /// Variable name
        name: &'static str,
        /// Raw value
        value: String,
    },

    /// A field is out of range.
    #[error("Invalid {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Implied volatility solver settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpliedVolatilityConfig {
    /// Brent tolerance on volatility and price error
    pub accuracy: f64,
    /// Maximum repricings per solve
    pub max_evaluations: usize,
    /// Lower end of the search bracket
    pub min_volatility: f64,
    /// Upper end of the search bracket
    pub max_volatility: f64,
}

impl Default for ImpliedVolatilityConfig {
    fn default() -> Self {
        Self {
            accuracy: 1e-4,
            max_evaluations: 100,
            min_volatility: 1e-7,
            max_volatility: 4.0,
        }
    }
}

/// Settings shared by every pricing method in a catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationConfig {
    /// Fall back to bump-and-reprice when an engine lacks an analytic Greek
    pub enable_greek_approximation: bool,
    /// Seed of the constant risk-free rate estimator
    pub default_risk_free_rate: f64,
    /// Seed of the constant dividend yield estimator
    pub default_dividend_yield: f64,
    /// Settlement lag in trading days
    pub settlement_days: u32,
    /// Trading calendar for the settlement lag
    pub calendar: Calendar,
    /// Binomial lattice steps
    pub binomial_steps: usize,
    /// Finite-difference time steps
    pub fd_time_steps: usize,
    /// Finite-difference spatial grid points
    pub fd_grid_points: usize,
    /// Implied volatility solver
    pub implied_volatility: ImpliedVolatilityConfig,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            enable_greek_approximation: true,
            default_risk_free_rate: 0.01,
            default_dividend_yield: 0.0,
            settlement_days: 3,
            calendar: Calendar::UnitedStatesNyse,
            binomial_steps: 100,
            fd_time_steps: 100,
            fd_grid_points: 100,
            implied_volatility: ImpliedVolatilityConfig::default(),
        }
    }
}

impl ValuationConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Apply `PRICER_*` environment variable overrides.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `PRICER_GREEK_APPROXIMATION` | `enable_greek_approximation` |
    /// | `PRICER_RISK_FREE_RATE` | `default_risk_free_rate` |
    /// | `PRICER_DIVIDEND_YIELD` | `default_dividend_yield` |
    /// | `PRICER_SETTLEMENT_DAYS` | `settlement_days` |
    /// | `PRICER_CALENDAR` | `calendar` |
    /// | `PRICER_BINOMIAL_STEPS` | `binomial_steps` |
    /// | `PRICER_FD_TIME_STEPS` | `fd_time_steps` |
    /// | `PRICER_FD_GRID_POINTS` | `fd_grid_points` |
    pub fn with_env_override(self) -> Result<Self, ConfigError> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::EnvError { name, value })
        }

        if let Some(v) = lookup("PRICER_GREEK_APPROXIMATION") {
            self.enable_greek_approximation = parse("PRICER_GREEK_APPROXIMATION", v)?;
        }
        if let Some(v) = lookup("PRICER_RISK_FREE_RATE") {
            self.default_risk_free_rate = parse("PRICER_RISK_FREE_RATE", v)?;
        }
        if let Some(v) = lookup("PRICER_DIVIDEND_YIELD") {
            self.default_dividend_yield = parse("PRICER_DIVIDEND_YIELD", v)?;
        }
        if let Some(v) = lookup("PRICER_SETTLEMENT_DAYS") {
            self.settlement_days = parse("PRICER_SETTLEMENT_DAYS", v)?;
        }
        if let Some(v) = lookup("PRICER_CALENDAR") {
            self.calendar = parse("PRICER_CALENDAR", v)?;
        }
        if let Some(v) = lookup("PRICER_BINOMIAL_STEPS") {
            self.binomial_steps = parse("PRICER_BINOMIAL_STEPS", v)?;
        }
        if let Some(v) = lookup("PRICER_FD_TIME_STEPS") {
            self.fd_time_steps = parse("PRICER_FD_TIME_STEPS", v)?;
        }
        if let Some(v) = lookup("PRICER_FD_GRID_POINTS") {
            self.fd_grid_points = parse("PRICER_FD_GRID_POINTS", v)?;
        }
        Ok(self)
    }

    /// Check every field is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason: String| Err(ConfigError::InvalidValue { field, reason });

        if !self.default_risk_free_rate.is_finite() {
            return invalid("default_risk_free_rate", "must be finite".into());
        }
        if !self.default_dividend_yield.is_finite() {
            return invalid("default_dividend_yield", "must be finite".into());
        }
        if self.binomial_steps < BinomialVanillaEngine::MIN_STEPS {
            return invalid(
                "binomial_steps",
                format!("must be at least {}", BinomialVanillaEngine::MIN_STEPS),
            );
        }
        if self.fd_time_steps == 0 {
            return invalid("fd_time_steps", "must be positive".into());
        }
        if self.fd_grid_points < 4 {
            return invalid("fd_grid_points", "must be at least 4".into());
        }

        let iv = &self.implied_volatility;
        if !(iv.accuracy > 0.0 && iv.accuracy.is_finite()) {
            return invalid("implied_volatility.accuracy", "must be positive".into());
        }
        if iv.max_evaluations == 0 {
            return invalid("implied_volatility.max_evaluations", "must be positive".into());
        }
        if !(iv.min_volatility > 0.0 && iv.min_volatility < iv.max_volatility)
            || !iv.max_volatility.is_finite()
        {
            return invalid(
                "implied_volatility",
                format!(
                    "bracket [{}, {}] must satisfy 0 < min < max",
                    iv.min_volatility, iv.max_volatility
                ),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ValuationConfig::default();
        assert!(config.enable_greek_approximation);
        assert_eq!(config.default_risk_free_rate, 0.01);
        assert_eq!(config.default_dividend_yield, 0.0);
        assert_eq!(config.settlement_days, 3);
        assert_eq!(config.binomial_steps, 100);
        assert_eq!(config.implied_volatility.max_volatility, 4.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ValuationConfig::from_toml_str(
            r#"
            default_risk_free_rate = 0.0525
            calendar = "weekends-only"

            [implied_volatility]
            accuracy = 1e-6
            "#,
        )
        .unwrap();
        assert_eq!(config.default_risk_free_rate, 0.0525);
        assert_eq!(config.calendar, Calendar::WeekendsOnly);
        assert_eq!(config.implied_volatility.accuracy, 1e-6);
        assert_eq!(config.implied_volatility.max_evaluations, 100);
        assert_eq!(config.fd_grid_points, 100);
    }

    #[test]
    fn test_unknown_calendar_is_parse_error() {
        assert!(matches!(
            ValuationConfig::from_toml_str(r#"calendar = "tokyo""#),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("valuation-{}.toml", std::process::id()));
        std::fs::write(&path, "settlement_days = 1\nbinomial_steps = 201\n").unwrap();
        let config = ValuationConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.settlement_days, 1);
        assert_eq!(config.binomial_steps, 201);

        assert!(matches!(
            ValuationConfig::load(&path),
            Err(ConfigError::FileError(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("PRICER_GREEK_APPROXIMATION", "false"),
            ("PRICER_RISK_FREE_RATE", "0.03"),
            ("PRICER_CALENDAR", "weekends-only"),
            ("PRICER_FD_GRID_POINTS", " 200 "),
        ]
        .into_iter()
        .collect();
        let config = ValuationConfig::default()
            .with_overrides(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();
        assert!(!config.enable_greek_approximation);
        assert_eq!(config.default_risk_free_rate, 0.03);
        assert_eq!(config.calendar, Calendar::WeekendsOnly);
        assert_eq!(config.fd_grid_points, 200);
        assert_eq!(config.binomial_steps, 100);
    }

    #[test]
    fn test_bad_override() {
        let result = ValuationConfig::default().with_overrides(|name| {
            (name == "PRICER_SETTLEMENT_DAYS").then(|| "three".to_string())
        });
        match result {
            Err(ConfigError::EnvError { name, value }) => {
                assert_eq!(name, "PRICER_SETTLEMENT_DAYS");
                assert_eq!(value, "three");
            }
            other => panic!("Expected EnvError, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects() {
        let cases = [
            ValuationConfig {
                binomial_steps: 2,
                ..ValuationConfig::default()
            },
            ValuationConfig {
                fd_time_steps: 0,
                ..ValuationConfig::default()
            },
            ValuationConfig {
                default_risk_free_rate: f64::NAN,
                ..ValuationConfig::default()
            },
            ValuationConfig {
                implied_volatility: ImpliedVolatilityConfig {
                    min_volatility: 5.0,
                    ..ImpliedVolatilityConfig::default()
                },
                ..ValuationConfig::default()
            },
        ];
        for config in cases {
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidValue { .. })
            ));
        }
    }
}
