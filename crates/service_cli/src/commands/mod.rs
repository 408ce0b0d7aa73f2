//! CLI command implementations
//!
//! Each submodule implements a specific CLI command. Commands render their
//! output to a `String` so it can be checked without a terminal.

use clap::Args;
use pricer_core::types::Date;
use pricer_models::instruments::{ExerciseStyle, OptionContract, OptionRight, Underlying};
use pricer_pricing::{MarketContext, PricingModelCatalog, ValuationConfig, ValuationSnapshot};
use tracing::warn;

use crate::{CliError, Result};

pub mod compare;
pub mod models;
pub mod price;

/// One contract and its market observation
#[derive(Args, Debug, Clone)]
pub struct ContractArgs {
    /// Contract symbol used in logs and output
    #[arg(long, default_value = "OPTION")]
    pub symbol: String,

    /// Underlying price
    #[arg(long)]
    pub spot: f64,

    /// Strike price
    #[arg(short = 'k', long)]
    pub strike: f64,

    /// Option right (call, put)
    #[arg(short, long, default_value = "call")]
    pub right: OptionRight,

    /// Exercise style (european, american)
    #[arg(short, long, default_value = "european")]
    pub style: ExerciseStyle,

    /// Expiry date (YYYY-MM-DD)
    #[arg(short, long)]
    pub expiry: Date,

    /// Observation date (YYYY-MM-DD)
    #[arg(short, long)]
    pub date: Date,

    /// Volatility of the underlying; without it every method reports zero
    #[arg(short, long)]
    pub volatility: Option<f64>,

    /// Quoted option price, the implied volatility target
    #[arg(long, default_value_t = 0.0)]
    pub market_price: f64,

    /// Risk-free rate (overrides the configured default)
    #[arg(long)]
    pub rate: Option<f64>,

    /// Dividend yield (overrides the configured default)
    #[arg(long)]
    pub dividend: Option<f64>,
}

impl ContractArgs {
    /// Underlying observation, with its volatility when given
    pub fn underlying(&self) -> Result<Underlying> {
        if !(self.spot.is_finite() && self.spot > 0.0) {
            return Err(CliError::InvalidArgument(format!(
                "spot must be positive, got {}",
                self.spot
            )));
        }
        let underlying = Underlying::new(self.symbol.as_str(), self.spot);
        Ok(match self.volatility {
            Some(volatility) => underlying.with_volatility(volatility),
            None => {
                warn!("no volatility given, every method will report zero");
                underlying
            }
        })
    }

    /// Contract observed on `date` at `market_price`
    pub fn contract(&self) -> Result<OptionContract> {
        Ok(OptionContract::new(
            self.symbol.as_str(),
            self.strike,
            self.right,
            self.expiry,
            self.style,
            self.date,
            self.market_price,
        )?)
    }

    /// Market context at the observation date
    pub fn context(&self) -> MarketContext {
        MarketContext::new(self.date)
    }

    /// Catalog seeded with this contract's rate and dividend overrides
    pub fn catalog(&self, base: &ValuationConfig) -> Result<PricingModelCatalog> {
        let mut config = base.clone();
        if let Some(rate) = self.rate {
            config.default_risk_free_rate = rate;
        }
        if let Some(dividend) = self.dividend {
            config.default_dividend_yield = dividend;
        }
        Ok(PricingModelCatalog::new(config)?)
    }
}

/// Column headers of a valuation table
const VALUATION_HEADERS: [&str; 9] = [
    "Model", "Price", "Impl. Vol", "Delta", "Gamma", "Vega", "Theta/day", "Rho", "Elasticity",
];

/// One table row per (model, snapshot)
pub(crate) fn valuation_table(rows: &[(String, ValuationSnapshot)]) -> String {
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|(model, v)| {
            let g = &v.greeks;
            vec![
                model.clone(),
                format!("{:.6}", v.price),
                format!("{:.6}", v.implied_volatility),
                format!("{:.6}", g.delta),
                format!("{:.6}", g.gamma),
                format!("{:.6}", g.vega),
                format!("{:.6}", g.theta / pricer_pricing::greeks::DAYS_PER_YEAR),
                format!("{:.6}", g.rho),
                format!("{:.6}", g.elasticity),
            ]
        })
        .collect();
    render_table(&VALUATION_HEADERS, &body)
}

/// Box-drawn table with left-aligned first column
pub(crate) fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .filter_map(|r| r.get(i))
                .map(|c| c.chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let rule = |left: &str, mid: &str, right: &str| {
        let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
        format!("{}{}{}\n", left, segments.join(mid), right)
    };
    let line = |cells: Vec<&str>| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (c, w))| {
                if i == 0 {
                    format!(" {:<w$} ", c, w = w)
                } else {
                    format!(" {:>w$} ", c, w = w)
                }
            })
            .collect();
        format!("│{}│\n", padded.join("│"))
    };

    let mut out = rule("┌", "┬", "┐");
    out.push_str(&line(headers.to_vec()));
    out.push_str(&rule("├", "┼", "┤"));
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
    }
    out.push_str(&rule("└", "┴", "┘"));
    out
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// ATM call, 2024-03-01 to 2024-06-21, σ = 25%
    pub(crate) fn contract_args() -> ContractArgs {
        ContractArgs {
            symbol: "XYZ".to_string(),
            spot: 100.0,
            strike: 100.0,
            right: OptionRight::Call,
            style: ExerciseStyle::European,
            expiry: Date::from_ymd(2024, 6, 21).unwrap(),
            date: Date::from_ymd(2024, 3, 1).unwrap(),
            volatility: Some(0.25),
            market_price: 5.0,
            rate: None,
            dividend: None,
        }
    }

    #[test]
    fn test_render_table_aligns_columns() {
        let table = render_table(
            &["Name", "Value"],
            &[
                vec!["a".to_string(), "1.0".to_string()],
                vec!["longer".to_string(), "22.5".to_string()],
            ],
        );
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 6);
        let width = lines[0].chars().count();
        assert!(lines.iter().all(|l| l.chars().count() == width));
        assert!(lines[3].contains(" a      "));
        assert!(lines[4].contains("  22.5 "));
    }

    #[test]
    fn test_rate_override_reaches_catalog() {
        let mut args = contract_args();
        args.rate = Some(0.05);
        let catalog = args.catalog(&ValuationConfig::default()).unwrap();
        assert_eq!(catalog.config().default_risk_free_rate, 0.05);
        assert_eq!(catalog.config().default_dividend_yield, 0.0);
    }

    #[test]
    fn test_non_positive_spot_rejected() {
        let mut args = contract_args();
        args.spot = 0.0;
        assert!(matches!(args.underlying(), Err(CliError::InvalidArgument(_))));
    }

    #[test]
    fn test_negative_strike_rejected() {
        let mut args = contract_args();
        args.strike = -5.0;
        assert!(matches!(args.contract(), Err(CliError::Contract(_))));
    }
}
