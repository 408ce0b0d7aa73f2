//! Solver configuration types.

use num_traits::Float;

/// Configuration for root-finding algorithms.
///
/// # Example
///
/// ```
/// use pricer_core::math::solvers::SolverConfig;
///
/// let config: SolverConfig<f64> = SolverConfig::default();
/// assert!(config.tolerance < 1e-8);
///
/// // Implied volatility is quoted to four decimals
/// let iv = SolverConfig::new(1e-4, 100);
/// assert_eq!(iv.max_iterations, 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig<T: Float> {
    /// Convergence tolerance on both `|f(x)|` and the bracket half-width.
    pub tolerance: T,

    /// Maximum number of objective evaluations after the two bracket
    /// endpoints.
    pub max_iterations: usize,
}

impl<T: Float> Default for SolverConfig<T> {
    /// Default values: `tolerance` 1e-10, `max_iterations` 100.
    fn default() -> Self {
        Self {
            tolerance: T::from(1e-10).unwrap_or_else(T::epsilon),
            max_iterations: 100,
        }
    }
}

impl<T: Float> SolverConfig<T> {
    /// Create a new configuration with specified values.
    ///
    /// # Panics
    ///
    /// Panics if `tolerance <= 0` or `max_iterations == 0`.
    pub fn new(tolerance: T, max_iterations: usize) -> Self {
        assert!(tolerance > T::zero(), "tolerance must be positive");
        assert!(max_iterations > 0, "max_iterations must be > 0");
        Self {
            tolerance,
            max_iterations,
        }
    }

    /// Whether the configuration can drive a solver.
    pub fn is_valid(&self) -> bool {
        self.tolerance > T::zero() && self.max_iterations > 0
    }
}
