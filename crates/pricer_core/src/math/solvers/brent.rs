//! Brent's method root-finding solver.

use super::SolverConfig;
use crate::types::SolverError;
use num_traits::Float;

/// Brent's method root finder.
///
/// Switches between bisection, secant and inverse quadratic interpolation,
/// falling back to bisection whenever an interpolated step would leave the
/// bracket or shrink it too slowly.
///
/// # Example
///
/// ```
/// use pricer_core::math::solvers::{BrentSolver, SolverConfig};
///
/// let solver = BrentSolver::new(SolverConfig::default());
///
/// // Solve x³ - x - 2 = 0 in bracket [1, 2]
/// let f = |x: f64| x * x * x - x - 2.0;
///
/// let root = solver.find_root(f, 1.0, 2.0).unwrap();
/// assert!((f(root)).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct BrentSolver<T: Float> {
    config: SolverConfig<T>,
}

impl<T: Float> BrentSolver<T> {
    /// Create a new Brent solver with the given configuration.
    pub fn new(config: SolverConfig<T>) -> Self {
        Self { config }
    }

    /// Create a solver with default configuration.
    pub fn with_defaults() -> Self {
        Self {
            config: SolverConfig::default(),
        }
    }

    /// Returns a reference to the solver configuration.
    pub fn config(&self) -> &SolverConfig<T> {
        &self.config
    }

    /// Find a root of an infallible `f` in the bracket [a, b].
    ///
    /// # Returns
    ///
    /// * `Ok(x)` - Root where `|f(x)| < tolerance` or the bracket collapsed
    /// * `Err(SolverError::NoBracket)` - `f(a)` and `f(b)` have same sign
    /// * `Err(SolverError::NumericalInstability)` - `f` returned NaN or infinity
    /// * `Err(SolverError::MaxIterationsExceeded)` - Failed to converge
    pub fn find_root<F>(&self, mut f: F, a: T, b: T) -> Result<T, SolverError>
    where
        F: FnMut(T) -> T,
    {
        self.try_find_root(|x| Ok::<T, SolverError>(f(x)), a, b)
    }

    /// Find a root of a fallible objective in the bracket [a, b].
    ///
    /// The first error returned by `f` aborts the search and is passed
    /// through unchanged; solver failures are converted with `From`.
    ///
    /// # Example
    ///
    /// ```
    /// use pricer_core::math::solvers::BrentSolver;
    /// use pricer_core::types::SolverError;
    ///
    /// let solver = BrentSolver::<f64>::with_defaults();
    /// let root = solver
    ///     .try_find_root(|x| Ok::<f64, SolverError>(x.exp() - 2.0), 0.0, 1.0)
    ///     .unwrap();
    /// assert!((root - 2.0_f64.ln()).abs() < 1e-10);
    /// ```
    pub fn try_find_root<F, E>(&self, mut f: F, a: T, b: T) -> Result<T, E>
    where
        F: FnMut(T) -> Result<T, E>,
        E: From<SolverError>,
    {
        let mut eval = |x: T| -> Result<T, E> {
            let y = f(x)?;
            if y.is_finite() {
                Ok(y)
            } else {
                Err(SolverError::NumericalInstability(format!(
                    "objective is not finite at x = {}",
                    x.to_f64().unwrap_or(f64::NAN)
                ))
                .into())
            }
        };

        let mut a = a;
        let mut b = b;
        let mut fa = eval(a)?;
        let mut fb = eval(b)?;

        if fa * fb > T::zero() {
            return Err(SolverError::NoBracket {
                a: a.to_f64().unwrap_or(f64::NAN),
                b: b.to_f64().unwrap_or(f64::NAN),
            }
            .into());
        }

        // The root stays between b and c; b is the best estimate so far
        let mut c = b;
        let mut fc = fb;
        let mut d = b - a;
        let mut e = d;

        let two = T::one() + T::one();
        let three = two + T::one();
        let half = T::one() / two;
        let tol = self.config.tolerance;

        for _ in 0..self.config.max_iterations {
            if (fb > T::zero() && fc > T::zero()) || (fb < T::zero() && fc < T::zero()) {
                c = a;
                fc = fa;
                d = b - a;
                e = d;
            }
            if fc.abs() < fb.abs() {
                a = b;
                b = c;
                c = a;
                fa = fb;
                fb = fc;
                fc = fa;
            }

            let tol1 = two * T::epsilon() * b.abs() + half * tol;
            let m = half * (c - b);
            if m.abs() <= tol1 || fb.abs() < tol {
                return Ok(b);
            }

            if e.abs() >= tol1 && fa.abs() > fb.abs() {
                let s = fb / fa;
                let (p, q) = if a == c {
                    // Secant
                    (two * m * s, T::one() - s)
                } else {
                    // Inverse quadratic interpolation
                    let q = fa / fc;
                    let r = fb / fc;
                    (
                        s * (two * m * q * (q - r) - (b - a) * (r - T::one())),
                        (q - T::one()) * (r - T::one()) * (s - T::one()),
                    )
                };
                let q = if p > T::zero() { -q } else { q };
                let p = p.abs();

                let interpolation_bound = three * m * q - (tol1 * q).abs();
                if two * p < interpolation_bound.min((e * q).abs()) {
                    e = d;
                    d = p / q;
                } else {
                    d = m;
                    e = m;
                }
            } else {
                d = m;
                e = m;
            }

            a = b;
            fa = fb;
            b = if d.abs() > tol1 {
                b + d
            } else if m > T::zero() {
                b + tol1
            } else {
                b - tol1
            };
            fb = eval(b)?;
        }

        Err(SolverError::MaxIterationsExceeded {
            iterations: self.config.max_iterations,
        }
        .into())
    }
}
