//! Volatility surface trait definition.

use crate::market_data::error::MarketDataError;
use crate::types::{Date, DayCountConvention};

/// Black volatility term structure anchored at a reference date.
///
/// # Contract
///
/// - `volatility(strike, expiry)` returns σ(K, T)
/// - `black_variance(strike, expiry)` returns σ(K, T)² · T
pub trait VolatilitySurface {
    /// Date from which expiries are measured.
    fn reference_date(&self) -> Date;

    /// Convention converting dates into times.
    fn day_count(&self) -> DayCountConvention;

    /// Black volatility for the given strike and time to expiry.
    ///
    /// # Returns
    ///
    /// * `Err(MarketDataError::InvalidStrike)` - If strike <= 0
    /// * `Err(MarketDataError::InvalidMaturity)` - If expiry < 0
    fn volatility(&self, strike: f64, expiry: f64) -> Result<f64, MarketDataError>;

    /// Total Black variance σ² · T.
    fn black_variance(&self, strike: f64, expiry: f64) -> Result<f64, MarketDataError> {
        let sigma = self.volatility(strike, expiry)?;
        Ok(sigma * sigma * expiry)
    }

    /// Time from the reference date to `date`.
    fn time_from_reference(&self, date: Date) -> f64 {
        self.day_count().year_fraction(self.reference_date(), date)
    }
}
