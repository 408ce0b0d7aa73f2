//! Flat forward curve driven by a quote.

use std::rc::Rc;

use super::YieldCurve;
use crate::market_data::clock::EvaluationClock;
use crate::market_data::error::MarketDataError;
use crate::market_data::quote::QuoteHandle;
use crate::types::{Date, DayCountConvention};

/// Flat yield curve whose rate is read from a quote on every call and
/// whose reference date follows the evaluation clock.
///
/// # Example
///
/// ```
/// use pricer_core::market_data::curves::{FlatForward, YieldCurve};
/// use pricer_core::market_data::{EvaluationClock, SimpleQuote};
/// use pricer_core::types::{Date, DayCountConvention};
///
/// let clock = EvaluationClock::shared(Date::from_ymd(2024, 1, 2).unwrap());
/// let rate = SimpleQuote::shared("risk-free", 0.03);
/// let curve = FlatForward::new(clock, rate.clone(), DayCountConvention::Actual365Fixed);
///
/// assert_eq!(curve.zero_rate(5.0).unwrap(), 0.03);
/// rate.set_value(0.04);
/// assert_eq!(curve.zero_rate(5.0).unwrap(), 0.04);
/// ```
#[derive(Debug, Clone)]
pub struct FlatForward {
    clock: Rc<EvaluationClock>,
    rate: QuoteHandle,
    day_count: DayCountConvention,
}

impl FlatForward {
    /// Construct a flat curve over `rate`, anchored at `clock`.
    pub fn new(clock: Rc<EvaluationClock>, rate: QuoteHandle, day_count: DayCountConvention) -> Self {
        Self {
            clock,
            rate,
            day_count,
        }
    }

    /// Quote backing the curve.
    pub fn rate_quote(&self) -> &QuoteHandle {
        &self.rate
    }
}

impl YieldCurve for FlatForward {
    fn reference_date(&self) -> Date {
        self.clock.date()
    }

    fn day_count(&self) -> DayCountConvention {
        self.day_count
    }

    fn zero_rate(&self, t: f64) -> Result<f64, MarketDataError> {
        if t < 0.0 {
            return Err(MarketDataError::InvalidMaturity { t });
        }
        self.rate.checked_value()
    }
}
