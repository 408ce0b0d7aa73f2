//! Standard normal distribution functions.
//!
//! This module provides:
//! - `norm_cdf`: Cumulative distribution function (CDF)
//! - `norm_pdf`: Probability density function (PDF)
//!
//! Both are generic over `T: Float`.

use pricer_core::traits::Float;

/// 1 / sqrt(2 * pi)
const FRAC_1_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// sqrt(2 * pi)
const SQRT_2PI: f64 = 2.506_628_274_631;

/// Converts an `f64` literal into `T`.
#[inline]
pub(crate) fn lit<T: Float>(x: f64) -> T {
    T::from(x).unwrap_or_else(T::nan)
}

/// Standard normal cumulative distribution function.
///
/// Hart's double-precision rational approximation (as popularised by
/// West, 2005): a rational function of |x| for |x| < 5√2, a continued
/// fraction in the tail, exact zero beyond 37.
///
/// # Accuracy
/// Absolute error below 1e-14 for all finite x, so finite differences of
/// prices built on it are dominated by truncation error, not CDF error.
///
/// # Examples
/// ```
/// use pricer_models::analytical::distributions::norm_cdf;
///
/// assert!((norm_cdf(0.0_f64) - 0.5).abs() < 1e-15);
/// assert!((norm_cdf(1.96_f64) - 0.9750021048517795).abs() < 1e-12);
/// assert!((norm_cdf(-1.0_f64) + norm_cdf(1.0_f64) - 1.0).abs() < 1e-15);
/// ```
pub fn norm_cdf<T: Float>(x: T) -> T {
    let x_abs = x.abs();

    let tail = if x_abs > lit(37.0) {
        T::zero()
    } else {
        let exponential = (-x_abs * x_abs / lit(2.0)).exp();
        if x_abs < lit(7.071_067_811_865_47) {
            let mut num = lit::<T>(3.526_249_659_989_11e-2) * x_abs + lit(0.700_383_064_443_688);
            num = num * x_abs + lit(6.373_962_203_531_65);
            num = num * x_abs + lit(33.912_866_078_383);
            num = num * x_abs + lit(112.079_291_497_871);
            num = num * x_abs + lit(221.213_596_169_931);
            num = num * x_abs + lit(220.206_867_912_376);

            let mut den = lit::<T>(8.838_834_764_831_84e-2) * x_abs + lit(1.755_667_163_182_64);
            den = den * x_abs + lit(16.064_177_579_207);
            den = den * x_abs + lit(86.780_732_202_946_1);
            den = den * x_abs + lit(296.564_248_779_674);
            den = den * x_abs + lit(637.333_633_378_831);
            den = den * x_abs + lit(793.826_512_519_948);
            den = den * x_abs + lit(440.413_735_824_752);

            exponential * num / den
        } else {
            let mut cf = x_abs + lit(0.65);
            cf = x_abs + lit::<T>(4.0) / cf;
            cf = x_abs + lit::<T>(3.0) / cf;
            cf = x_abs + lit::<T>(2.0) / cf;
            cf = x_abs + T::one() / cf;
            exponential / cf / lit(SQRT_2PI)
        }
    };

    if x > T::zero() {
        T::one() - tail
    } else {
        tail
    }
}

/// Standard normal probability density function.
///
/// φ(x) = (1 / sqrt(2π)) * exp(-x² / 2)
///
/// # Examples
/// ```
/// use pricer_models::analytical::distributions::norm_pdf;
///
/// assert!((norm_pdf(0.0_f64) - 0.3989422804).abs() < 1e-9);
/// assert!((norm_pdf(1.0_f64) - 0.2419707245).abs() < 1e-9);
/// ```
#[inline]
pub fn norm_pdf<T: Float>(x: T) -> T {
    lit::<T>(FRAC_1_SQRT_2PI) * (-lit::<T>(0.5) * x * x).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cdf_reference_values() {
        assert_relative_eq!(norm_cdf(1.0_f64), 0.841_344_746_068_542_9, epsilon = 1e-13);
        assert_relative_eq!(norm_cdf(-2.0_f64), 0.022_750_131_948_179_2, epsilon = 1e-13);
        assert_relative_eq!(norm_cdf(0.5_f64), 0.691_462_461_274_013_1, epsilon = 1e-13);
        assert_relative_eq!(norm_cdf(-8.0_f64), 6.220_960_574_271_78e-16, epsilon = 1e-18);
    }

    #[test]
    fn test_cdf_symmetry() {
        for &x in &[0.1_f64, 0.7, 1.3, 2.9, 5.5, 7.5, 12.0] {
            assert_relative_eq!(norm_cdf(x) + norm_cdf(-x), 1.0, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_cdf_extremes() {
        assert_eq!(norm_cdf(-40.0_f64), 0.0);
        assert_eq!(norm_cdf(40.0_f64), 1.0);
    }

    #[test]
    fn test_cdf_monotone() {
        let mut prev = 0.0_f64;
        for i in -800..=800 {
            let x = i as f64 / 100.0;
            let c = norm_cdf(x);
            assert!(c >= prev, "CDF decreased at {}", x);
            prev = c;
        }
    }

    #[test]
    fn test_pdf_is_cdf_derivative() {
        let h = 1e-5;
        for &x in &[-3.0_f64, -1.0, 0.0, 0.5, 2.0, 7.2] {
            let fd = (norm_cdf(x + h) - norm_cdf(x - h)) / (2.0 * h);
            assert_relative_eq!(fd, norm_pdf(x), epsilon = 1e-8);
        }
    }

    #[test]
    fn test_f32_compatibility() {
        assert!((norm_cdf(0.0_f32) - 0.5).abs() < 1e-6);
        assert!((norm_pdf(0.0_f32) - 0.398_942_3).abs() < 1e-6);
    }
}
