//! Constant Black volatility driven by a quote.

use std::rc::Rc;

use super::VolatilitySurface;
use crate::market_data::clock::EvaluationClock;
use crate::market_data::error::MarketDataError;
use crate::market_data::quote::QuoteHandle;
use crate::types::{Date, DayCountConvention};

/// Flat volatility surface: the same σ for every strike and expiry.
///
/// # Example
///
/// ```
/// use pricer_core::market_data::surfaces::{BlackConstantVol, VolatilitySurface};
/// use pricer_core::market_data::{EvaluationClock, SimpleQuote};
/// use pricer_core::types::{Date, DayCountConvention};
///
/// let clock = EvaluationClock::shared(Date::from_ymd(2024, 1, 2).unwrap());
/// let vol = BlackConstantVol::new(
///     clock,
///     SimpleQuote::shared("volatility", 0.2),
///     DayCountConvention::Actual365Fixed,
/// );
/// assert_eq!(vol.volatility(80.0, 0.5).unwrap(), 0.2);
/// assert!((vol.black_variance(120.0, 2.0).unwrap() - 0.08).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct BlackConstantVol {
    clock: Rc<EvaluationClock>,
    volatility: QuoteHandle,
    day_count: DayCountConvention,
}

impl BlackConstantVol {
    /// Construct over a volatility quote, anchored at `clock`.
    pub fn new(
        clock: Rc<EvaluationClock>,
        volatility: QuoteHandle,
        day_count: DayCountConvention,
    ) -> Self {
        Self {
            clock,
            volatility,
            day_count,
        }
    }

    /// Quote backing the surface.
    pub fn volatility_quote(&self) -> &QuoteHandle {
        &self.volatility
    }
}

impl VolatilitySurface for BlackConstantVol {
    fn reference_date(&self) -> Date {
        self.clock.date()
    }

    fn day_count(&self) -> DayCountConvention {
        self.day_count
    }

    fn volatility(&self, strike: f64, expiry: f64) -> Result<f64, MarketDataError> {
        if strike <= 0.0 {
            return Err(MarketDataError::InvalidStrike { strike });
        }
        if expiry < 0.0 {
            return Err(MarketDataError::InvalidMaturity { t: expiry });
        }
        self.volatility.checked_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::quote::SimpleQuote;

    fn surface(sigma: f64) -> BlackConstantVol {
        BlackConstantVol::new(
            EvaluationClock::shared(Date::from_ymd(2024, 1, 2).unwrap()),
            SimpleQuote::shared("volatility", sigma),
            DayCountConvention::Actual365Fixed,
        )
    }

    #[test]
    fn test_invalid_strike() {
        assert!(matches!(
            surface(0.2).volatility(0.0, 1.0),
            Err(MarketDataError::InvalidStrike { .. })
        ));
    }

    #[test]
    fn test_zero_expiry_allowed() {
        assert_eq!(surface(0.2).black_variance(100.0, 0.0).unwrap(), 0.0);
    }

    #[test]
    fn test_quote_bump_visible() {
        let s = surface(0.2);
        let _g = s.volatility_quote().bump(0.001);
        assert!((s.volatility(100.0, 1.0).unwrap() - 0.201).abs() < 1e-12);
    }
}
