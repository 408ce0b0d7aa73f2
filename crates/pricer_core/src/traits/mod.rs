//! Generic numeric traits shared across the pricer crates.

/// Generic floating-point trait for numeric computations.
///
/// Closed-form formulas are written against this trait so they can be
/// evaluated in `f64` or `f32` without duplication.
///
/// # Examples
/// ```
/// use pricer_core::traits::Float;
///
/// fn compute_discount<T: Float>(rate: T, time: T) -> T {
///     (-rate * time).exp()
/// }
///
/// let discount_f64: f64 = compute_discount(0.05, 1.0);
/// assert!((discount_f64 - 0.951229).abs() < 1e-5);
/// ```
pub use num_traits::Float;
