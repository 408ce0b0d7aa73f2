//! Pricing model catalog.
//!
//! Twelve named methods, each bundling an engine factory, an exercise
//! policy, an optional payoff builder and the market input estimators:
//!
//! | Kind | Engine | Exercise |
//! |------|--------|----------|
//! | `black-scholes` | [`AnalyticEuropeanEngine`] | European |
//! | `barone-adesi-whaley` | [`BaroneAdesiWhaleyEngine`] | American |
//! | `bjerksund-stensland` | [`BjerksundStenslandEngine`] | American |
//! | `integral` | [`IntegralEngine`] | European |
//! | `crank-nicolson-fd` | [`FdBlackScholesVanillaEngine`] | contract style |
//! | `binomial-*` (seven trees) | [`BinomialVanillaEngine`] | European |
//!
//! Nothing checks that a method suits the contract it is asked to value: an
//! American contract valued with `black-scholes` is priced as European.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;
use std::sync::Arc;

use pricer_core::types::Date;
use pricer_models::instruments::{
    Exercise, ExerciseStyle, InstrumentError, OptionContract, PlainVanillaPayoff,
};
use pricer_models::models::BlackScholesMertonProcess;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, ValuationConfig};
use crate::engines::{
    AnalyticEuropeanEngine, BaroneAdesiWhaleyEngine, BinomialTree, BinomialVanillaEngine,
    BjerksundStenslandEngine, EngineError, EngineFactory, FdBlackScholesVanillaEngine,
    IntegralEngine, PricingEngine,
};
use crate::estimators::MarketEstimators;
use crate::valuation::OptionPriceModel;

/// Rannacher start-up steps of the finite-difference method.
const FD_DAMPING_STEPS: usize = 2;

/// Builds the payoff of a contract.
pub type PayoffBuilder =
    Arc<dyn Fn(&OptionContract) -> Result<PlainVanillaPayoff, InstrumentError> + Send + Sync>;

/// Chooses the exercise schedule from (contract, settlement, maturity).
pub type ExerciseSelector = Arc<dyn Fn(&OptionContract, Date, Date) -> Exercise + Send + Sync>;

/// How a method turns a contract into an exercise schedule.
#[derive(Clone, Default)]
pub enum ExercisePolicy {
    /// Always European at maturity.
    #[default]
    European,
    /// Always American from settlement to maturity.
    American,
    /// Follow the contract's own style.
    FromContract,
    /// Caller-supplied selector.
    Custom(ExerciseSelector),
}

impl ExercisePolicy {
    /// Exercise schedule for `contract` valued at `settlement`.
    pub fn exercise(&self, contract: &OptionContract, settlement: Date, maturity: Date) -> Exercise {
        match self {
            ExercisePolicy::European => Exercise::european(maturity),
            ExercisePolicy::American => {
                Exercise::for_style(ExerciseStyle::American, settlement, maturity)
            }
            ExercisePolicy::FromContract => {
                Exercise::for_style(contract.style(), settlement, maturity)
            }
            ExercisePolicy::Custom(select) => select(contract, settlement, maturity),
        }
    }

    /// Short label for listings.
    pub fn label(&self) -> &'static str {
        match self {
            ExercisePolicy::European => "european",
            ExercisePolicy::American => "american",
            ExercisePolicy::FromContract => "contract",
            ExercisePolicy::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for ExercisePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExercisePolicy::{}", self.label())
    }
}

/// Immutable description of one pricing method.
///
/// Holds no per-evaluation state, so one descriptor serves any number of
/// evaluations, including concurrent ones.
#[derive(Clone)]
pub struct PricingMethod {
    name: String,
    engine: EngineFactory,
    exercise: ExercisePolicy,
    payoff: Option<PayoffBuilder>,
    estimators: MarketEstimators,
}

impl PricingMethod {
    /// Method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Engine factory.
    pub fn engine(&self) -> &EngineFactory {
        &self.engine
    }

    /// Exercise policy.
    pub fn exercise_policy(&self) -> &ExercisePolicy {
        &self.exercise
    }

    /// Market input estimators.
    pub fn estimators(&self) -> &MarketEstimators {
        &self.estimators
    }

    /// Payoff for `contract`: the custom builder if any, else a vanilla
    /// payoff on the contract strike.
    pub fn payoff(&self, contract: &OptionContract) -> Result<PlainVanillaPayoff, InstrumentError> {
        match &self.payoff {
            Some(build) => build(contract),
            None => Ok(contract.payoff()),
        }
    }
}

impl fmt::Debug for PricingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PricingMethod")
            .field("name", &self.name)
            .field("exercise", &self.exercise)
            .field("custom_payoff", &self.payoff.is_some())
            .field("estimators", &self.estimators)
            .finish()
    }
}

/// Catalog entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PricingModelKind {
    /// Closed-form Black-Scholes-Merton
    BlackScholes,
    /// Barone-Adesi-Whaley quadratic approximation
    BaroneAdesiWhaley,
    /// Bjerksund-Stensland flat-boundary approximation
    BjerksundStensland,
    /// Numerical integration against the lognormal density
    Integral,
    /// Crank-Nicolson finite differences
    CrankNicolsonFd,
    /// Jarrow-Rudd binomial tree
    BinomialJarrowRudd,
    /// Cox-Ross-Rubinstein binomial tree
    BinomialCoxRossRubinstein,
    /// Additive equiprobabilities binomial tree
    AdditiveEquiprobabilities,
    /// Trigeorgis binomial tree
    BinomialTrigeorgis,
    /// Tian binomial tree
    BinomialTian,
    /// Leisen-Reimer binomial tree
    BinomialLeisenReimer,
    /// Joshi binomial tree
    BinomialJoshi,
}

impl PricingModelKind {
    /// Every catalog entry, in catalog order.
    pub const ALL: [PricingModelKind; 12] = [
        PricingModelKind::BlackScholes,
        PricingModelKind::BaroneAdesiWhaley,
        PricingModelKind::BjerksundStensland,
        PricingModelKind::Integral,
        PricingModelKind::CrankNicolsonFd,
        PricingModelKind::BinomialJarrowRudd,
        PricingModelKind::BinomialCoxRossRubinstein,
        PricingModelKind::AdditiveEquiprobabilities,
        PricingModelKind::BinomialTrigeorgis,
        PricingModelKind::BinomialTian,
        PricingModelKind::BinomialLeisenReimer,
        PricingModelKind::BinomialJoshi,
    ];

    /// Identifier used in configuration and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            PricingModelKind::BlackScholes => "black-scholes",
            PricingModelKind::BaroneAdesiWhaley => "barone-adesi-whaley",
            PricingModelKind::BjerksundStensland => "bjerksund-stensland",
            PricingModelKind::Integral => "integral",
            PricingModelKind::CrankNicolsonFd => "crank-nicolson-fd",
            PricingModelKind::BinomialJarrowRudd => "binomial-jarrow-rudd",
            PricingModelKind::BinomialCoxRossRubinstein => "binomial-cox-ross-rubinstein",
            PricingModelKind::AdditiveEquiprobabilities => "additive-equiprobabilities",
            PricingModelKind::BinomialTrigeorgis => "binomial-trigeorgis",
            PricingModelKind::BinomialTian => "binomial-tian",
            PricingModelKind::BinomialLeisenReimer => "binomial-leisen-reimer",
            PricingModelKind::BinomialJoshi => "binomial-joshi",
        }
    }

    /// One-line description.
    pub fn description(&self) -> &'static str {
        match self {
            PricingModelKind::BlackScholes => "Closed-form Black-Scholes-Merton",
            PricingModelKind::BaroneAdesiWhaley => "Barone-Adesi-Whaley (1987) approximation",
            PricingModelKind::BjerksundStensland => "Bjerksund-Stensland (1993) approximation",
            PricingModelKind::Integral => "Simpson integration over the lognormal density",
            PricingModelKind::CrankNicolsonFd => "Crank-Nicolson finite differences",
            PricingModelKind::BinomialJarrowRudd => "Jarrow-Rudd binomial tree",
            PricingModelKind::BinomialCoxRossRubinstein => "Cox-Ross-Rubinstein binomial tree",
            PricingModelKind::AdditiveEquiprobabilities => {
                "Additive equiprobabilities binomial tree"
            }
            PricingModelKind::BinomialTrigeorgis => "Trigeorgis binomial tree",
            PricingModelKind::BinomialTian => "Tian binomial tree",
            PricingModelKind::BinomialLeisenReimer => "Leisen-Reimer binomial tree",
            PricingModelKind::BinomialJoshi => "Joshi binomial tree",
        }
    }

    /// Tree construction for the binomial entries.
    pub fn binomial_tree(&self) -> Option<BinomialTree> {
        match self {
            PricingModelKind::BinomialJarrowRudd => Some(BinomialTree::JarrowRudd),
            PricingModelKind::BinomialCoxRossRubinstein => Some(BinomialTree::CoxRossRubinstein),
            PricingModelKind::AdditiveEquiprobabilities => {
                Some(BinomialTree::AdditiveEquiprobabilities)
            }
            PricingModelKind::BinomialTrigeorgis => Some(BinomialTree::Trigeorgis),
            PricingModelKind::BinomialTian => Some(BinomialTree::Tian),
            PricingModelKind::BinomialLeisenReimer => Some(BinomialTree::LeisenReimer),
            PricingModelKind::BinomialJoshi => Some(BinomialTree::Joshi4),
            _ => None,
        }
    }
}

impl fmt::Display for PricingModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PricingModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| format!("Unknown pricing model: {}", s))
    }
}

/// Wrap an engine constructor as an [`EngineFactory`].
pub fn engine_factory<F>(build: F) -> EngineFactory
where
    F: Fn(Rc<BlackScholesMertonProcess>) -> Result<Box<dyn PricingEngine>, EngineError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(build)
}

/// Factory of [`OptionPriceModel`]s sharing one configuration.
///
/// # Example
///
/// ```
/// use pricer_pricing::catalog::{PricingModelCatalog, PricingModelKind};
/// use pricer_pricing::config::ValuationConfig;
///
/// let catalog = PricingModelCatalog::new(ValuationConfig::default()).unwrap();
/// let model = catalog.model(PricingModelKind::BaroneAdesiWhaley);
/// assert_eq!(model.name(), "barone-adesi-whaley");
/// assert_eq!(model.method().exercise_policy().label(), "american");
/// ```
#[derive(Debug, Clone)]
pub struct PricingModelCatalog {
    config: Arc<ValuationConfig>,
}

impl PricingModelCatalog {
    /// Build a catalog, rejecting an invalid configuration.
    pub fn new(config: ValuationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// Shared configuration.
    pub fn config(&self) -> &ValuationConfig {
        &self.config
    }

    /// Assemble a method from its parts.
    ///
    /// Missing parts take the defaults: constant risk-free and dividend
    /// estimators seeded from the configuration with volatility read from
    /// the underlying, European exercise, and a vanilla payoff on the
    /// contract strike.
    pub fn create_method(
        &self,
        name: impl Into<String>,
        engine: EngineFactory,
        estimators: Option<MarketEstimators>,
        exercise: Option<ExercisePolicy>,
        payoff: Option<PayoffBuilder>,
    ) -> OptionPriceModel {
        let method = PricingMethod {
            name: name.into(),
            engine,
            exercise: exercise.unwrap_or_default(),
            payoff,
            estimators: estimators.unwrap_or_else(|| MarketEstimators::from_config(&self.config)),
        };
        OptionPriceModel::new(method, Arc::clone(&self.config))
    }

    /// Model for a catalog entry.
    pub fn model(&self, kind: PricingModelKind) -> OptionPriceModel {
        match kind {
            PricingModelKind::BlackScholes => self.black_scholes(),
            PricingModelKind::BaroneAdesiWhaley => self.barone_adesi_whaley(),
            PricingModelKind::BjerksundStensland => self.bjerksund_stensland(),
            PricingModelKind::Integral => self.integral(),
            PricingModelKind::CrankNicolsonFd => self.crank_nicolson_fd(),
            PricingModelKind::BinomialJarrowRudd => self.binomial_jarrow_rudd(),
            PricingModelKind::BinomialCoxRossRubinstein => self.binomial_cox_ross_rubinstein(),
            PricingModelKind::AdditiveEquiprobabilities => self.additive_equiprobabilities(),
            PricingModelKind::BinomialTrigeorgis => self.binomial_trigeorgis(),
            PricingModelKind::BinomialTian => self.binomial_tian(),
            PricingModelKind::BinomialLeisenReimer => self.binomial_leisen_reimer(),
            PricingModelKind::BinomialJoshi => self.binomial_joshi(),
        }
    }

    /// Every catalog entry, in catalog order.
    pub fn models(&self) -> Vec<(PricingModelKind, OptionPriceModel)> {
        PricingModelKind::ALL
            .iter()
            .map(|&kind| (kind, self.model(kind)))
            .collect()
    }

    /// Closed-form Black-Scholes-Merton, European exercise.
    pub fn black_scholes(&self) -> OptionPriceModel {
        self.create_method(
            PricingModelKind::BlackScholes.name(),
            engine_factory(|process| Ok(Box::new(AnalyticEuropeanEngine::new(process)))),
            None,
            None,
            None,
        )
    }

    /// Barone-Adesi-Whaley, American exercise.
    pub fn barone_adesi_whaley(&self) -> OptionPriceModel {
        self.create_method(
            PricingModelKind::BaroneAdesiWhaley.name(),
            engine_factory(|process| Ok(Box::new(BaroneAdesiWhaleyEngine::new(process)))),
            None,
            Some(ExercisePolicy::American),
            None,
        )
    }

    /// Bjerksund-Stensland, American exercise.
    pub fn bjerksund_stensland(&self) -> OptionPriceModel {
        self.create_method(
            PricingModelKind::BjerksundStensland.name(),
            engine_factory(|process| Ok(Box::new(BjerksundStenslandEngine::new(process)))),
            None,
            Some(ExercisePolicy::American),
            None,
        )
    }

    /// Lognormal integral, European exercise.
    pub fn integral(&self) -> OptionPriceModel {
        self.create_method(
            PricingModelKind::Integral.name(),
            engine_factory(|process| Ok(Box::new(IntegralEngine::new(process)))),
            None,
            None,
            None,
        )
    }

    /// Crank-Nicolson finite differences, exercise from the contract.
    pub fn crank_nicolson_fd(&self) -> OptionPriceModel {
        let (time_steps, grid_points) = (self.config.fd_time_steps, self.config.fd_grid_points);
        self.create_method(
            PricingModelKind::CrankNicolsonFd.name(),
            engine_factory(move |process| {
                let engine = FdBlackScholesVanillaEngine::new(
                    process,
                    time_steps,
                    grid_points,
                    FD_DAMPING_STEPS.min(time_steps),
                )?;
                Ok(Box::new(engine))
            }),
            None,
            Some(ExercisePolicy::FromContract),
            None,
        )
    }

    /// Jarrow-Rudd tree, European exercise.
    pub fn binomial_jarrow_rudd(&self) -> OptionPriceModel {
        self.binomial(PricingModelKind::BinomialJarrowRudd, BinomialTree::JarrowRudd)
    }

    /// Cox-Ross-Rubinstein tree, European exercise.
    pub fn binomial_cox_ross_rubinstein(&self) -> OptionPriceModel {
        self.binomial(
            PricingModelKind::BinomialCoxRossRubinstein,
            BinomialTree::CoxRossRubinstein,
        )
    }

    /// Additive equiprobabilities tree, European exercise.
    pub fn additive_equiprobabilities(&self) -> OptionPriceModel {
        self.binomial(
            PricingModelKind::AdditiveEquiprobabilities,
            BinomialTree::AdditiveEquiprobabilities,
        )
    }

    /// Trigeorgis tree, European exercise.
    pub fn binomial_trigeorgis(&self) -> OptionPriceModel {
        self.binomial(PricingModelKind::BinomialTrigeorgis, BinomialTree::Trigeorgis)
    }

    /// Tian tree, European exercise.
    pub fn binomial_tian(&self) -> OptionPriceModel {
        self.binomial(PricingModelKind::BinomialTian, BinomialTree::Tian)
    }

    /// Leisen-Reimer tree, European exercise.
    pub fn binomial_leisen_reimer(&self) -> OptionPriceModel {
        self.binomial(PricingModelKind::BinomialLeisenReimer, BinomialTree::LeisenReimer)
    }

    /// Joshi tree, European exercise.
    pub fn binomial_joshi(&self) -> OptionPriceModel {
        self.binomial(PricingModelKind::BinomialJoshi, BinomialTree::Joshi4)
    }

    fn binomial(&self, kind: PricingModelKind, tree: BinomialTree) -> OptionPriceModel {
        let steps = self.config.binomial_steps;
        self.create_method(
            kind.name(),
            engine_factory(move |process| {
                let engine = BinomialVanillaEngine::new(process, tree, steps)?;
                Ok(Box::new(engine))
            }),
            None,
            None,
            None,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricer_models::instruments::OptionRight;

    fn catalog() -> PricingModelCatalog {
        PricingModelCatalog::new(ValuationConfig::default()).unwrap()
    }

    fn d(m: u32, day: u32) -> Date {
        Date::from_ymd(2024, m, day).unwrap()
    }

    fn contract(style: ExerciseStyle) -> OptionContract {
        OptionContract::new("XYZ", 100.0, OptionRight::Put, d(6, 21), style, d(5, 1), 2.0)
            .unwrap()
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in PricingModelKind::ALL {
            assert_eq!(kind.to_string().parse::<PricingModelKind>().unwrap(), kind);
        }
        assert_eq!(
            "Crank_Nicolson_FD".parse::<PricingModelKind>().unwrap(),
            PricingModelKind::CrankNicolsonFd
        );
        assert!("monte-carlo".parse::<PricingModelKind>().is_err());
    }

    #[test]
    fn test_every_kind_builds_a_named_model() {
        let catalog = catalog();
        let models = catalog.models();
        assert_eq!(models.len(), 12);
        for (kind, model) in models {
            assert_eq!(model.name(), kind.name());
        }
    }

    #[test]
    fn test_binomial_trees_map_to_kinds() {
        let trees: Vec<_> = PricingModelKind::ALL
            .iter()
            .filter_map(|k| k.binomial_tree())
            .collect();
        assert_eq!(trees, BinomialTree::ALL.to_vec());
    }

    #[test]
    fn test_exercise_policies() {
        let catalog = catalog();
        let american = contract(ExerciseStyle::American);
        let european = contract(ExerciseStyle::European);
        let (settle, maturity) = (d(5, 6), d(6, 26));

        let style = |kind: PricingModelKind, c: &OptionContract| {
            catalog
                .model(kind)
                .method()
                .exercise_policy()
                .exercise(c, settle, maturity)
                .style()
        };

        assert_eq!(style(PricingModelKind::BlackScholes, &american), ExerciseStyle::European);
        assert_eq!(style(PricingModelKind::BaroneAdesiWhaley, &european), ExerciseStyle::American);
        assert_eq!(style(PricingModelKind::CrankNicolsonFd, &american), ExerciseStyle::American);
        assert_eq!(style(PricingModelKind::CrankNicolsonFd, &european), ExerciseStyle::European);
        assert_eq!(style(PricingModelKind::BinomialTian, &american), ExerciseStyle::European);
    }

    #[test]
    fn test_american_exercise_window_starts_at_settlement() {
        let exercise = ExercisePolicy::American.exercise(
            &contract(ExerciseStyle::European),
            d(5, 6),
            d(6, 26),
        );
        assert_eq!(
            exercise,
            Exercise::American {
                earliest: d(5, 6),
                latest: d(6, 26)
            }
        );
    }

    #[test]
    fn test_custom_payoff_and_exercise() {
        let catalog = catalog();
        let model = catalog.create_method(
            "flipped",
            engine_factory(|process| Ok(Box::new(AnalyticEuropeanEngine::new(process)))),
            None,
            Some(ExercisePolicy::Custom(Arc::new(
                |_: &OptionContract, _: Date, maturity: Date| Exercise::european(maturity),
            ))),
            Some(Arc::new(|c: &OptionContract| {
                PlainVanillaPayoff::new(c.right().flip(), c.strike())
            })),
        );
        let payoff = model.method().payoff(&contract(ExerciseStyle::European)).unwrap();
        assert_eq!(payoff.right(), OptionRight::Call);
        assert_eq!(model.method().exercise_policy().label(), "custom");
    }

    #[test]
    fn test_invalid_config_rejected_at_build() {
        let config = ValuationConfig {
            binomial_steps: 1,
            ..ValuationConfig::default()
        };
        assert!(matches!(
            PricingModelCatalog::new(config),
            Err(ConfigError::InvalidValue { field: "binomial_steps", .. })
        ));
    }
}
