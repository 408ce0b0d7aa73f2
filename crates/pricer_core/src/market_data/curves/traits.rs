//! Yield curve trait definition.

use crate::market_data::error::MarketDataError;
use crate::types::{Date, DayCountConvention};

/// Yield term structure anchored at a reference date.
///
/// # Invariants
///
/// - D(0) = 1
/// - D(t) > 0 for all t >= 0
///
/// # Example
///
/// ```
/// use pricer_core::market_data::curves::{FlatForward, YieldCurve};
/// use pricer_core::market_data::{EvaluationClock, SimpleQuote};
/// use pricer_core::types::{Date, DayCountConvention};
///
/// let clock = EvaluationClock::shared(Date::from_ymd(2024, 1, 2).unwrap());
/// let rate = SimpleQuote::shared("risk-free", 0.05);
/// let curve = FlatForward::new(clock, rate, DayCountConvention::Actual365Fixed);
///
/// let df = curve.discount_factor(1.0).unwrap();
/// assert!((df - 0.951229).abs() < 1e-5);
/// ```
pub trait YieldCurve {
    /// Date at which D(t) = 1.
    fn reference_date(&self) -> Date;

    /// Convention converting dates into times.
    fn day_count(&self) -> DayCountConvention;

    /// Continuously compounded zero rate for maturity `t`.
    ///
    /// # Returns
    ///
    /// * `Err(MarketDataError::InvalidMaturity)` - If t < 0
    fn zero_rate(&self, t: f64) -> Result<f64, MarketDataError>;

    /// Discount factor for maturity `t`.
    ///
    /// ```text
    /// D(t) = exp(-r(t) * t)
    /// ```
    fn discount_factor(&self, t: f64) -> Result<f64, MarketDataError> {
        let r = self.zero_rate(t)?;
        Ok((-r * t).exp())
    }

    /// Time from the reference date to `date` under the curve's day count.
    fn time_from_reference(&self, date: Date) -> f64 {
        self.day_count().year_fraction(self.reference_date(), date)
    }

    /// Discount factor for a payment on `date`.
    fn discount(&self, date: Date) -> Result<f64, MarketDataError> {
        self.discount_factor(self.time_from_reference(date))
    }

    /// Forward rate between t1 and t2.
    ///
    /// ```text
    /// f(t1, t2) = -ln(D(t2) / D(t1)) / (t2 - t1)
    /// ```
    fn forward_rate(&self, t1: f64, t2: f64) -> Result<f64, MarketDataError> {
        let dt = t2 - t1;
        if dt <= 0.0 {
            return Err(MarketDataError::InvalidMaturity { t: dt });
        }
        let df1 = self.discount_factor(t1)?;
        let df2 = self.discount_factor(t2)?;
        Ok(-(df2 / df1).ln() / dt)
    }
}
