//! Compare command implementation
//!
//! Values one contract with every catalog method.

use pricer_pricing::{PricingModelCatalog, ValuationSnapshot};
use serde::Serialize;
use tracing::info;

use super::{valuation_table, ContractArgs};
use crate::config::OutputFormat;
use crate::Result;

#[derive(Debug, Serialize)]
struct ModelValuation {
    model: &'static str,
    #[serde(flatten)]
    valuation: ValuationSnapshot,
}

/// Value the contract with each method and render the results
pub fn render(
    catalog: &PricingModelCatalog,
    args: &ContractArgs,
    format: OutputFormat,
) -> Result<String> {
    let underlying = args.underlying()?;
    let contract = args.contract()?;
    let context = args.context();

    info!(contract = contract.symbol(), "comparing every catalog method");
    let rows: Vec<ModelValuation> = catalog
        .models()
        .into_iter()
        .map(|(kind, model)| ModelValuation {
            model: kind.name(),
            valuation: model.evaluate(&underlying, &context, &contract).snapshot(),
        })
        .collect();

    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&rows)?),
        OutputFormat::Table => {
            let table: Vec<(String, ValuationSnapshot)> = rows
                .into_iter()
                .map(|r| (r.model.to_string(), r.valuation))
                .collect();
            Ok(valuation_table(&table))
        }
    }
}

/// Run the compare command
pub fn run(catalog: &PricingModelCatalog, args: &ContractArgs, format: OutputFormat) -> Result<()> {
    print!("{}", render(catalog, args, format)?);
    Ok(())
}
