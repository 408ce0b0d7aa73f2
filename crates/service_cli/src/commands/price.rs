//! Price command implementation
//!
//! Values one contract with one catalog method.

use pricer_pricing::{PricingModelCatalog, PricingModelKind, ValuationSnapshot};
use serde::Serialize;
use tracing::info;

use super::{valuation_table, ContractArgs};
use crate::config::OutputFormat;
use crate::Result;

#[derive(Debug, Serialize)]
struct PriceReport<'a> {
    model: &'static str,
    contract: &'a str,
    #[serde(flatten)]
    valuation: ValuationSnapshot,
}

/// Value the contract and render the result
pub fn render(
    catalog: &PricingModelCatalog,
    kind: PricingModelKind,
    args: &ContractArgs,
    format: OutputFormat,
) -> Result<String> {
    let underlying = args.underlying()?;
    let contract = args.contract()?;
    let model = catalog.model(kind);

    info!(model = kind.name(), contract = contract.symbol(), "pricing");
    let valuation = model
        .evaluate(&underlying, &args.context(), &contract)
        .snapshot();

    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&PriceReport {
            model: kind.name(),
            contract: contract.symbol(),
            valuation,
        })?),
        OutputFormat::Table => Ok(valuation_table(&[(kind.name().to_string(), valuation)])),
    }
}

/// Run the price command
pub fn run(
    catalog: &PricingModelCatalog,
    kind: PricingModelKind,
    args: &ContractArgs,
    format: OutputFormat,
) -> Result<()> {
    print!("{}", render(catalog, kind, args, format)?);
    Ok(())
}
