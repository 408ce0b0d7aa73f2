//! Models command implementation
//!
//! Lists every pricing method in the catalog.

use pricer_pricing::{PricingModelCatalog, PricingModelKind};
use serde::Serialize;

use super::render_table;
use crate::config::OutputFormat;
use crate::Result;

#[derive(Debug, Serialize)]
struct ModelEntry {
    name: &'static str,
    exercise: &'static str,
    description: &'static str,
}

/// Render the catalog listing
pub fn render(catalog: &PricingModelCatalog, format: OutputFormat) -> Result<String> {
    let entries: Vec<ModelEntry> = PricingModelKind::ALL
        .iter()
        .map(|kind| ModelEntry {
            name: kind.name(),
            exercise: catalog.model(*kind).method().exercise_policy().label(),
            description: kind.description(),
        })
        .collect();

    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&entries)?),
        OutputFormat::Table => {
            let rows: Vec<Vec<String>> = entries
                .iter()
                .map(|e| vec![e.name.to_string(), e.exercise.to_string(), e.description.to_string()])
                .collect();
            Ok(render_table(&["Model", "Exercise", "Description"], &rows))
        }
    }
}

/// Run the models command
pub fn run(catalog: &PricingModelCatalog, format: OutputFormat) -> Result<()> {
    print!("{}", render(catalog, format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricer_pricing::ValuationConfig;

    #[test]
    fn test_table_lists_every_model() {
        let catalog = PricingModelCatalog::new(ValuationConfig::default()).unwrap();
        let table = render(&catalog, OutputFormat::Table).unwrap();
        for kind in PricingModelKind::ALL {
            assert!(table.contains(kind.name()), "missing {}", kind);
        }
    }

    #[test]
    fn test_json_listing() {
        let catalog = PricingModelCatalog::new(ValuationConfig::default()).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&render(&catalog, OutputFormat::Json).unwrap()).unwrap();
        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), 12);
        assert_eq!(entries[1]["name"], "barone-adesi-whaley");
        assert_eq!(entries[1]["exercise"], "american");
    }
}
