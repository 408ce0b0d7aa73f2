//! Vanilla option bound to a pricing engine.

use pricer_models::instruments::{Exercise, PlainVanillaPayoff};

use crate::engines::{EngineArguments, EngineError, Greek, PricingEngine};

/// A payoff and exercise schedule priced by one engine.
///
/// The engine reads its process at call time, so the option reprices after
/// any quote bump or clock shift.
pub struct VanillaOption {
    arguments: EngineArguments,
    engine: Box<dyn PricingEngine>,
}

impl VanillaOption {
    /// Attach `engine` to a new option.
    pub fn new(
        payoff: PlainVanillaPayoff,
        exercise: Exercise,
        engine: Box<dyn PricingEngine>,
    ) -> Self {
        Self {
            arguments: EngineArguments::new(payoff, exercise),
            engine,
        }
    }

    /// Payoff and exercise passed to the engine.
    pub fn arguments(&self) -> &EngineArguments {
        &self.arguments
    }

    /// Name of the attached engine.
    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// Net present value.
    pub fn npv(&self) -> Result<f64, EngineError> {
        self.engine.npv(&self.arguments)
    }

    /// Analytic sensitivity from the engine.
    pub fn greek(&self, greek: Greek) -> Result<f64, EngineError> {
        self.engine.greek(greek, &self.arguments)
    }
}

impl std::fmt::Debug for VanillaOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VanillaOption")
            .field("arguments", &self.arguments)
            .field("engine", &self.engine.name())
            .finish()
    }
}
