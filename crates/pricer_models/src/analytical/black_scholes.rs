//! Generalized Black-Scholes-Merton formula for European options.
//!
//! ## Mathematical Formulas
//!
//! With forward F = S·e^((r-q)T), discount factors D_r = e^(-rT) and
//! D_q = e^(-qT), and ω = +1 for calls, -1 for puts:
//!
//! **Price**: V = ω·(S·D_q·N(ω·d₁) - K·D_r·N(ω·d₂))
//!
//! Where:
//! - d₁ = (ln(F/K) + σ²T/2) / (σ√T)
//! - d₂ = d₁ - σ√T
//!
//! When σ√T vanishes (zero volatility or zero time) the formula collapses to
//! the discounted forward intrinsic value D_r·max(ω(F - K), 0); gamma and vega
//! are zero there and every other Greek follows from the same limit.

use pricer_core::traits::Float;

use super::distributions::{lit, norm_cdf, norm_pdf};
use super::error::AnalyticalError;
use crate::instruments::OptionRight;

/// Below this total standard deviation the degenerate limit is used.
const MIN_STD_DEV: f64 = 1e-12;

/// Black-Scholes-Merton model with continuous dividend yield.
///
/// # Type Parameters
/// * `T` - Floating-point type implementing `Float` (e.g., `f64`, `f32`)
///
/// # Examples
/// ```
/// use pricer_models::analytical::BlackScholesMerton;
/// use pricer_models::instruments::OptionRight;
///
/// let bsm = BlackScholesMerton::new(100.0_f64, 0.05, 0.02, 0.2).unwrap();
/// let call = bsm.price(100.0, 1.0, OptionRight::Call);
/// let put = bsm.price(100.0, 1.0, OptionRight::Put);
///
/// // Put-call parity: C - P = S·e^(-qT) - K·e^(-rT)
/// let parity = call - put - (100.0 * (-0.02_f64).exp() - 100.0 * (-0.05_f64).exp());
/// assert!(parity.abs() < 1e-10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlackScholesMerton<T: Float> {
    /// Spot price (S)
    spot: T,
    /// Risk-free rate (r)
    rate: T,
    /// Dividend yield (q)
    dividend: T,
    /// Volatility (σ)
    volatility: T,
}

/// Intermediate quantities shared by price and Greeks.
#[derive(Debug, Clone, Copy)]
struct Terms<T> {
    discount: T,
    dividend_discount: T,
    std_dev: T,
    /// N(d₁), N(d₂) for a call; N(-d₁), N(-d₂) for a put
    cum_d1: T,
    cum_d2: T,
    pdf_d1: T,
    omega: T,
}

impl<T: Float> BlackScholesMerton<T> {
    /// Creates a new Black-Scholes-Merton model.
    ///
    /// # Arguments
    /// * `spot` - Current spot price (must be positive)
    /// * `rate` - Continuously compounded risk-free rate
    /// * `dividend` - Continuous dividend yield
    /// * `volatility` - Volatility (zero is allowed)
    ///
    /// # Errors
    /// - `AnalyticalError::InvalidSpot` if spot <= 0 or not finite
    /// - `AnalyticalError::InvalidVolatility` if volatility < 0 or not finite
    /// - `AnalyticalError::InvalidRate` if either rate is not finite
    ///
    /// # Examples
    /// ```
    /// use pricer_models::analytical::BlackScholesMerton;
    ///
    /// assert!(BlackScholesMerton::new(100.0_f64, 0.01, 0.0, 0.0).is_ok());
    /// assert!(BlackScholesMerton::new(-100.0_f64, 0.01, 0.0, 0.2).is_err());
    /// assert!(BlackScholesMerton::new(100.0_f64, f64::NAN, 0.0, 0.2).is_err());
    /// ```
    pub fn new(spot: T, rate: T, dividend: T, volatility: T) -> Result<Self, AnalyticalError> {
        let as_f64 = |x: T| x.to_f64().unwrap_or(f64::NAN);

        if !(spot > T::zero()) || !spot.is_finite() {
            return Err(AnalyticalError::InvalidSpot { spot: as_f64(spot) });
        }
        if !(volatility >= T::zero()) || !volatility.is_finite() {
            return Err(AnalyticalError::InvalidVolatility {
                volatility: as_f64(volatility),
            });
        }
        if !rate.is_finite() {
            return Err(AnalyticalError::InvalidRate {
                name: "risk-free rate",
                value: as_f64(rate),
            });
        }
        if !dividend.is_finite() {
            return Err(AnalyticalError::InvalidRate {
                name: "dividend yield",
                value: as_f64(dividend),
            });
        }

        Ok(Self {
            spot,
            rate,
            dividend,
            volatility,
        })
    }

    /// Returns the spot price.
    #[inline]
    pub fn spot(&self) -> T {
        self.spot
    }

    /// Returns the risk-free rate.
    #[inline]
    pub fn rate(&self) -> T {
        self.rate
    }

    /// Returns the dividend yield.
    #[inline]
    pub fn dividend(&self) -> T {
        self.dividend
    }

    /// Returns the volatility.
    #[inline]
    pub fn volatility(&self) -> T {
        self.volatility
    }

    /// Forward price F = S·e^((r-q)T).
    #[inline]
    pub fn forward(&self, expiry: T) -> T {
        self.spot * ((self.rate - self.dividend) * expiry).exp()
    }

    /// Computes d₁ = (ln(F/K) + σ²T/2) / (σ√T).
    ///
    /// Returns ±infinity (or NaN at the money) when σ√T is zero.
    pub fn d1(&self, strike: T, expiry: T) -> T {
        let std_dev = self.std_dev(expiry);
        ((self.forward(expiry) / strike).ln() + lit::<T>(0.5) * std_dev * std_dev) / std_dev
    }

    /// Computes d₂ = d₁ - σ√T.
    pub fn d2(&self, strike: T, expiry: T) -> T {
        self.d1(strike, expiry) - self.std_dev(expiry)
    }

    #[inline]
    fn std_dev(&self, expiry: T) -> T {
        self.volatility * expiry.max(T::zero()).sqrt()
    }

    fn terms(&self, strike: T, expiry: T, right: OptionRight) -> Terms<T> {
        let expiry = expiry.max(T::zero());
        let omega = lit::<T>(right.sign());
        let discount = (-self.rate * expiry).exp();
        let dividend_discount = (-self.dividend * expiry).exp();
        let std_dev = self.std_dev(expiry);

        if std_dev <= lit(MIN_STD_DEV) {
            // N(ω·d) is the indicator of ω(F - K) > 0
            let itm = omega * (self.forward(expiry) - strike) > T::zero();
            let cum = if itm { T::one() } else { T::zero() };
            return Terms {
                discount,
                dividend_discount,
                std_dev: T::zero(),
                cum_d1: cum,
                cum_d2: cum,
                pdf_d1: T::zero(),
                omega,
            };
        }

        let d1 = ((self.forward(expiry) / strike).ln() + lit::<T>(0.5) * std_dev * std_dev)
            / std_dev;
        let d2 = d1 - std_dev;

        Terms {
            discount,
            dividend_discount,
            std_dev,
            cum_d1: norm_cdf(omega * d1),
            cum_d2: norm_cdf(omega * d2),
            pdf_d1: norm_pdf(d1),
            omega,
        }
    }

    /// European option price.
    ///
    /// # Arguments
    /// * `strike` - Strike price (K > 0)
    /// * `expiry` - Time to expiration in years; negative values are treated as zero
    /// * `right` - Call or put
    ///
    /// # Examples
    /// ```
    /// use pricer_models::analytical::BlackScholesMerton;
    /// use pricer_models::instruments::OptionRight;
    ///
    /// let bsm = BlackScholesMerton::new(100.0_f64, 0.05, 0.0, 0.2).unwrap();
    /// let call = bsm.price(100.0, 1.0, OptionRight::Call);
    /// assert!((call - 10.450583572185565).abs() < 1e-9);
    /// ```
    pub fn price(&self, strike: T, expiry: T, right: OptionRight) -> T {
        let t = self.terms(strike, expiry, right);
        let value = t.omega
            * (self.spot * t.dividend_discount * t.cum_d1 - strike * t.discount * t.cum_d2);
        value.max(T::zero())
    }

    /// European call price.
    #[inline]
    pub fn price_call(&self, strike: T, expiry: T) -> T {
        self.price(strike, expiry, OptionRight::Call)
    }

    /// European put price.
    #[inline]
    pub fn price_put(&self, strike: T, expiry: T) -> T {
        self.price(strike, expiry, OptionRight::Put)
    }

    /// Delta (∂V/∂S) = ω·D_q·N(ω·d₁).
    pub fn delta(&self, strike: T, expiry: T, right: OptionRight) -> T {
        let t = self.terms(strike, expiry, right);
        t.omega * t.dividend_discount * t.cum_d1
    }

    /// Gamma (∂²V/∂S²) = D_q·φ(d₁) / (S·σ√T).
    ///
    /// Identical for calls and puts; zero in the degenerate limit.
    pub fn gamma(&self, strike: T, expiry: T) -> T {
        let t = self.terms(strike, expiry, OptionRight::Call);
        if t.std_dev == T::zero() {
            return T::zero();
        }
        t.dividend_discount * t.pdf_d1 / (self.spot * t.std_dev)
    }

    /// Vega (∂V/∂σ) = S·D_q·φ(d₁)·√T.
    pub fn vega(&self, strike: T, expiry: T) -> T {
        let t = self.terms(strike, expiry, OptionRight::Call);
        self.spot * t.dividend_discount * t.pdf_d1 * expiry.max(T::zero()).sqrt()
    }

    /// Theta (∂V/∂t), the value change per year of calendar time passing.
    ///
    /// ```text
    /// Θ = -S·D_q·φ(d₁)·σ / (2√T) + ω·q·S·D_q·N(ω·d₁) - ω·r·K·D_r·N(ω·d₂)
    /// ```
    pub fn theta(&self, strike: T, expiry: T, right: OptionRight) -> T {
        let t = self.terms(strike, expiry, right);
        let expiry = expiry.max(T::zero());

        let decay = if t.std_dev == T::zero() {
            T::zero()
        } else {
            -self.spot * t.dividend_discount * t.pdf_d1 * self.volatility
                / (lit::<T>(2.0) * expiry.sqrt())
        };

        decay + t.omega * self.dividend * self.spot * t.dividend_discount * t.cum_d1
            - t.omega * self.rate * strike * t.discount * t.cum_d2
    }

    /// Rho (∂V/∂r) = ω·K·T·D_r·N(ω·d₂).
    pub fn rho(&self, strike: T, expiry: T, right: OptionRight) -> T {
        let t = self.terms(strike, expiry, right);
        t.omega * strike * expiry.max(T::zero()) * t.discount * t.cum_d2
    }

    /// Dividend rho (∂V/∂q) = -ω·S·T·D_q·N(ω·d₁).
    pub fn dividend_rho(&self, strike: T, expiry: T, right: OptionRight) -> T {
        let t = self.terms(strike, expiry, right);
        -t.omega * self.spot * expiry.max(T::zero()) * t.dividend_discount * t.cum_d1
    }

    /// Elasticity (Ω = Δ·S / V), the percentage price change per percentage
    /// spot change.
    ///
    /// When the price is numerically zero the ratio is undefined: zero is
    /// returned if delta is also negligible, otherwise the largest finite
    /// value carrying delta's sign.
    ///
    /// # Examples
    /// ```
    /// use pricer_models::analytical::BlackScholesMerton;
    /// use pricer_models::instruments::OptionRight;
    ///
    /// let bsm = BlackScholesMerton::new(100.0_f64, 0.01, 0.0, 0.2).unwrap();
    /// assert!(bsm.elasticity(100.0, 0.5, OptionRight::Call) > 1.0);
    /// assert!(bsm.elasticity(100.0, 0.5, OptionRight::Put) < -1.0);
    /// ```
    pub fn elasticity(&self, strike: T, expiry: T, right: OptionRight) -> T {
        let price = self.price(strike, expiry, right);
        let delta = self.delta(strike, expiry, right);

        if price > T::epsilon() {
            delta / price * self.spot
        } else if delta.abs() < T::epsilon() {
            T::zero()
        } else if delta > T::zero() {
            T::max_value()
        } else {
            T::min_value()
        }
    }
}
