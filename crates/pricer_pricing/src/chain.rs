//! Parallel valuation of an option chain.
//!
//! Evaluations share nothing mutable (each owns its quotes, clock and
//! engine), so a chain is valued with one rayon task per contract. Deferred
//! values are forced inside the task and only the eager snapshot crosses
//! threads.

use pricer_models::instruments::{OptionContract, OptionRight, Underlying};
use rayon::prelude::*;
use serde::Serialize;

use crate::estimators::MarketContext;
use crate::valuation::{OptionPriceModel, ValuationSnapshot};

/// Chains shorter than this are valued on the calling thread.
pub const PARALLEL_THRESHOLD: usize = 8;

/// Valuation of one chain member.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainValuation {
    /// Contract symbol
    pub symbol: String,
    /// Strike
    pub strike: f64,
    /// Call or put
    pub right: OptionRight,
    /// Price, implied volatility and Greeks
    pub valuation: ValuationSnapshot,
}

impl OptionPriceModel {
    /// Value every contract in `contracts`, preserving order.
    ///
    /// A contract that cannot be valued gets the all-zero snapshot; the rest
    /// of the chain is unaffected.
    pub fn evaluate_chain(
        &self,
        underlying: &Underlying,
        context: &MarketContext,
        contracts: &[OptionContract],
    ) -> Vec<ChainValuation> {
        let value = |contract: &OptionContract| ChainValuation {
            symbol: contract.symbol().to_string(),
            strike: contract.strike(),
            right: contract.right(),
            valuation: self.evaluate(underlying, context, contract).snapshot(),
        };

        if contracts.len() < PARALLEL_THRESHOLD {
            contracts.iter().map(value).collect()
        } else {
            contracts.par_iter().map(value).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{PricingModelCatalog, PricingModelKind};
    use crate::config::ValuationConfig;
    use pricer_core::types::Date;
    use pricer_models::instruments::ExerciseStyle;

    fn d(m: u32, day: u32) -> Date {
        Date::from_ymd(2024, m, day).unwrap()
    }

    fn chain(expiry: Date) -> Vec<OptionContract> {
        (80..=120)
            .step_by(5)
            .flat_map(|k| {
                [OptionRight::Call, OptionRight::Put].map(|right| {
                    OptionContract::new(
                        format!("XYZ {} {}", k, right),
                        k as f64,
                        right,
                        expiry,
                        ExerciseStyle::American,
                        d(3, 1),
                        1.0,
                    )
                    .unwrap()
                })
            })
            .collect()
    }

    #[test]
    fn test_parallel_chain_matches_sequential() {
        let catalog = PricingModelCatalog::new(ValuationConfig::default()).unwrap();
        let model = catalog.model(PricingModelKind::BaroneAdesiWhaley);
        let underlying = Underlying::new("XYZ", 100.0).with_volatility(0.3);
        let context = MarketContext::new(d(3, 1));
        let contracts = chain(d(6, 21));
        assert!(contracts.len() >= PARALLEL_THRESHOLD);

        let parallel = model.evaluate_chain(&underlying, &context, &contracts);
        let sequential: Vec<_> = contracts
            .iter()
            .map(|c| model.evaluate(&underlying, &context, c).snapshot())
            .collect();

        assert_eq!(parallel.len(), contracts.len());
        for ((p, s), c) in parallel.iter().zip(&sequential).zip(&contracts) {
            assert_eq!(p.symbol, c.symbol());
            assert_eq!(&p.valuation, s);
        }
    }

    #[test]
    fn test_bad_contract_does_not_halt_chain() {
        let catalog = PricingModelCatalog::new(ValuationConfig::default()).unwrap();
        let model = catalog.model(PricingModelKind::BlackScholes);
        let underlying = Underlying::new("XYZ", 100.0).with_volatility(0.3);
        let context = MarketContext::new(d(3, 1));

        let mut contracts = chain(d(6, 21));
        // Expired before observation
        contracts[3] = contracts[3].observed(d(7, 1), 1.0);

        let results = model.evaluate_chain(&underlying, &context, &contracts);
        assert_eq!(results[3].valuation, ValuationSnapshot::default());
        assert!(results
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != 3)
            .all(|(_, r)| r.valuation.price > 0.0));
    }
}
