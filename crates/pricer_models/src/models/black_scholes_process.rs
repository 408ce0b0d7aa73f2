//! Black-Scholes-Merton process built from live quotes.
//!
//! The process is the single description an engine prices against:
//! ```text
//! dS = (r - q) * S * dt + sigma * S * dW
//! ```
//! Each input lives in a [`SimpleQuote`], so bumping a quote or shifting the
//! evaluation clock is immediately visible to every engine built on the
//! process. Times are measured Actual/365 Fixed from the clock's date.

use std::rc::Rc;

use pricer_core::market_data::curves::{FlatForward, YieldCurve};
use pricer_core::market_data::surfaces::{BlackConstantVol, VolatilitySurface};
use pricer_core::market_data::{EvaluationClock, MarketDataError, QuoteHandle, SimpleQuote};
use pricer_core::types::{Calendar, Date, DayCountConvention};

use crate::analytical::{AnalyticalError, BlackScholesMerton};

/// Day count used for every time measurement on the process.
pub const PROCESS_DAY_COUNT: DayCountConvention = DayCountConvention::Actual365Fixed;

/// The four quotes backing a process.
#[derive(Debug, Clone)]
pub struct MarketQuotes {
    /// Underlying price
    pub spot: QuoteHandle,
    /// Black volatility
    pub volatility: QuoteHandle,
    /// Continuously compounded risk-free rate
    pub risk_free_rate: QuoteHandle,
    /// Continuous dividend yield
    pub dividend_yield: QuoteHandle,
}

impl MarketQuotes {
    /// Fresh quotes holding the given values.
    ///
    /// # Example
    ///
    /// ```
    /// use pricer_models::models::MarketQuotes;
    ///
    /// let quotes = MarketQuotes::new(100.0, 0.2, 0.01, 0.0);
    /// assert_eq!(quotes.spot.name(), "spot");
    /// assert_eq!(quotes.volatility.value(), 0.2);
    /// ```
    pub fn new(spot: f64, volatility: f64, risk_free_rate: f64, dividend_yield: f64) -> Self {
        Self {
            spot: SimpleQuote::shared("spot", spot),
            volatility: SimpleQuote::shared("volatility", volatility),
            risk_free_rate: SimpleQuote::shared("risk-free rate", risk_free_rate),
            dividend_yield: SimpleQuote::shared("dividend yield", dividend_yield),
        }
    }
}

/// Generalized Black-Scholes-Merton process over flat term structures.
///
/// # Example
///
/// ```
/// use pricer_models::models::{BlackScholesMertonProcess, MarketQuotes};
/// use pricer_core::market_data::EvaluationClock;
/// use pricer_core::types::{Calendar, Date};
///
/// let clock = EvaluationClock::shared(Date::from_ymd(2024, 1, 2).unwrap());
/// let quotes = MarketQuotes::new(100.0, 0.2, 0.05, 0.0);
/// let process = BlackScholesMertonProcess::new(clock, quotes, Calendar::UnitedStatesNyse);
///
/// let maturity = Date::from_ymd(2025, 1, 1).unwrap();
/// let snap = process.snapshot(maturity, 100.0).unwrap();
/// assert!((snap.time_to_expiry - 1.0).abs() < 1e-12);
///
/// // Bumping the quote changes what engines see
/// let _up = process.spot_quote().bump(1.0);
/// assert_eq!(process.snapshot(maturity, 100.0).unwrap().spot, 101.0);
/// ```
#[derive(Debug, Clone)]
pub struct BlackScholesMertonProcess {
    clock: Rc<EvaluationClock>,
    spot: QuoteHandle,
    dividend_curve: FlatForward,
    risk_free_curve: FlatForward,
    volatility: BlackConstantVol,
    calendar: Calendar,
}

impl BlackScholesMertonProcess {
    /// Assemble a process whose term structures follow `clock`.
    pub fn new(clock: Rc<EvaluationClock>, quotes: MarketQuotes, calendar: Calendar) -> Self {
        let dividend_curve = FlatForward::new(
            Rc::clone(&clock),
            quotes.dividend_yield,
            PROCESS_DAY_COUNT,
        );
        let risk_free_curve = FlatForward::new(
            Rc::clone(&clock),
            quotes.risk_free_rate,
            PROCESS_DAY_COUNT,
        );
        let volatility =
            BlackConstantVol::new(Rc::clone(&clock), quotes.volatility, PROCESS_DAY_COUNT);

        Self {
            clock,
            spot: quotes.spot,
            dividend_curve,
            risk_free_curve,
            volatility,
            calendar,
        }
    }

    /// Evaluation clock shared by the term structures.
    pub fn clock(&self) -> &Rc<EvaluationClock> {
        &self.clock
    }

    /// Current valuation date.
    pub fn reference_date(&self) -> Date {
        self.clock.date()
    }

    /// Trading calendar.
    pub fn calendar(&self) -> Calendar {
        self.calendar
    }

    /// Always Actual/365 Fixed.
    pub fn day_count(&self) -> DayCountConvention {
        PROCESS_DAY_COUNT
    }

    /// Spot quote.
    pub fn spot_quote(&self) -> &QuoteHandle {
        &self.spot
    }

    /// Volatility quote.
    pub fn volatility_quote(&self) -> &QuoteHandle {
        self.volatility.volatility_quote()
    }

    /// Risk-free rate quote.
    pub fn risk_free_quote(&self) -> &QuoteHandle {
        self.risk_free_curve.rate_quote()
    }

    /// Dividend yield quote.
    pub fn dividend_quote(&self) -> &QuoteHandle {
        self.dividend_curve.rate_quote()
    }

    /// Risk-free term structure.
    pub fn risk_free_curve(&self) -> &FlatForward {
        &self.risk_free_curve
    }

    /// Dividend term structure.
    pub fn dividend_curve(&self) -> &FlatForward {
        &self.dividend_curve
    }

    /// Black volatility term structure.
    pub fn black_volatility(&self) -> &BlackConstantVol {
        &self.volatility
    }

    /// Year fraction from the valuation date to `date`.
    pub fn time_to(&self, date: Date) -> f64 {
        self.risk_free_curve.time_from_reference(date)
    }

    /// Read every input at the current clock date.
    ///
    /// # Errors
    /// `MarketDataError` if a quote is not finite, the maturity lies before
    /// the valuation date, or the strike is not positive.
    pub fn snapshot(&self, maturity: Date, strike: f64) -> Result<ProcessSnapshot, MarketDataError> {
        let t = self.time_to(maturity);
        let spot = self.spot.checked_value()?;
        let risk_free_rate = self.risk_free_curve.zero_rate(t)?;
        let dividend_yield = self.dividend_curve.zero_rate(t)?;
        let volatility = self.volatility.volatility(strike, t)?;

        Ok(ProcessSnapshot {
            spot,
            risk_free_rate,
            dividend_yield,
            volatility,
            time_to_expiry: t,
        })
    }
}

/// Process inputs frozen at one valuation date and maturity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSnapshot {
    /// Underlying price S
    pub spot: f64,
    /// Risk-free rate r
    pub risk_free_rate: f64,
    /// Dividend yield q
    pub dividend_yield: f64,
    /// Volatility σ
    pub volatility: f64,
    /// Time to expiry T in years
    pub time_to_expiry: f64,
}

impl ProcessSnapshot {
    /// e^(-rT)
    pub fn discount(&self) -> f64 {
        (-self.risk_free_rate * self.time_to_expiry).exp()
    }

    /// e^(-qT)
    pub fn dividend_discount(&self) -> f64 {
        (-self.dividend_yield * self.time_to_expiry).exp()
    }

    /// Forward price S·e^((r-q)T).
    pub fn forward(&self) -> f64 {
        self.spot * self.dividend_discount() / self.discount()
    }

    /// Closed-form model over this snapshot.
    pub fn black_scholes(&self) -> Result<BlackScholesMerton<f64>, AnalyticalError> {
        BlackScholesMerton::new(
            self.spot,
            self.risk_free_rate,
            self.dividend_yield,
            self.volatility,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    fn process() -> BlackScholesMertonProcess {
        BlackScholesMertonProcess::new(
            EvaluationClock::shared(d(2024, 1, 2)),
            MarketQuotes::new(100.0, 0.2, 0.05, 0.02),
            Calendar::UnitedStatesNyse,
        )
    }

    #[test]
    fn test_snapshot_reads_quotes() {
        let p = process();
        let snap = p.snapshot(d(2024, 7, 2), 100.0).unwrap();
        assert_eq!(snap.spot, 100.0);
        assert_eq!(snap.volatility, 0.2);
        assert_eq!(snap.risk_free_rate, 0.05);
        assert_eq!(snap.dividend_yield, 0.02);
        assert_relative_eq!(snap.time_to_expiry, 182.0 / 365.0, epsilon = 1e-12);
    }

    #[test]
    fn test_clock_shift_lengthens_time() {
        let p = process();
        let t0 = p.time_to(d(2024, 7, 2));
        {
            let _back = p.clock().shift_days(-1).unwrap();
            assert_relative_eq!(p.time_to(d(2024, 7, 2)), t0 + 1.0 / 365.0, epsilon = 1e-12);
        }
        assert_relative_eq!(p.time_to(d(2024, 7, 2)), t0, epsilon = 1e-12);
    }

    #[test]
    fn test_all_term_structures_share_the_clock() {
        let p = process();
        let _g = p.clock().set_scoped(d(2024, 2, 1));
        assert_eq!(p.risk_free_curve().reference_date(), d(2024, 2, 1));
        assert_eq!(p.dividend_curve().reference_date(), d(2024, 2, 1));
        assert_eq!(p.black_volatility().reference_date(), d(2024, 2, 1));
    }

    #[test]
    fn test_snapshot_rejects_past_maturity() {
        let p = process();
        assert!(matches!(
            p.snapshot(d(2023, 12, 1), 100.0),
            Err(MarketDataError::InvalidMaturity { .. })
        ));
    }

    #[test]
    fn test_snapshot_rejects_nan_spot() {
        let p = process();
        let _g = p.spot_quote().set_scoped(f64::NAN);
        assert!(matches!(
            p.snapshot(d(2024, 7, 2), 100.0),
            Err(MarketDataError::InvalidQuote { .. })
        ));
    }

    #[test]
    fn test_forward_and_discounts() {
        let snap = ProcessSnapshot {
            spot: 100.0,
            risk_free_rate: 0.05,
            dividend_yield: 0.02,
            volatility: 0.2,
            time_to_expiry: 1.0,
        };
        assert_relative_eq!(snap.forward(), 100.0 * 0.03_f64.exp(), epsilon = 1e-10);
        assert_relative_eq!(snap.discount(), (-0.05_f64).exp(), epsilon = 1e-14);
        assert!(snap.black_scholes().is_ok());
    }
}
