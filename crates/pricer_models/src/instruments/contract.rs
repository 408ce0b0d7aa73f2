//! Listed option contracts and underlying observations.

use pricer_core::types::Date;

use super::error::InstrumentError;
use super::exercise::ExerciseStyle;
use super::payoff::{OptionRight, PlainVanillaPayoff};

/// Immutable description of a listed option contract.
///
/// `time` is the observation date of the contract's quote; valuation
/// settles a fixed number of trading days after it.
///
/// # Examples
/// ```
/// use pricer_models::instruments::{ExerciseStyle, OptionContract, OptionRight};
/// use pricer_core::types::Date;
///
/// let contract = OptionContract::new(
///     "SPY 240719C00100000",
///     100.0,
///     OptionRight::Call,
///     Date::from_ymd(2024, 7, 19).unwrap(),
///     ExerciseStyle::American,
///     Date::from_ymd(2024, 6, 17).unwrap(),
///     2.45,
/// )
/// .unwrap();
///
/// assert_eq!(contract.payoff().strike(), 100.0);
/// assert!(!contract.is_expired(Date::from_ymd(2024, 7, 18).unwrap()));
/// assert!(contract.is_expired(Date::from_ymd(2024, 7, 19).unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptionContract {
    symbol: String,
    strike: f64,
    right: OptionRight,
    expiry: Date,
    #[cfg_attr(feature = "serde", serde(default))]
    style: ExerciseStyle,
    time: Date,
    #[cfg_attr(feature = "serde", serde(default))]
    market_price: f64,
}

impl OptionContract {
    /// Create a contract.
    ///
    /// # Errors
    /// - `InstrumentError::InvalidStrike` if strike is not positive and finite
    /// - `InstrumentError::InvalidParameter` if the market price is not finite
    pub fn new(
        symbol: impl Into<String>,
        strike: f64,
        right: OptionRight,
        expiry: Date,
        style: ExerciseStyle,
        time: Date,
        market_price: f64,
    ) -> Result<Self, InstrumentError> {
        let contract = Self {
            symbol: symbol.into(),
            strike,
            right,
            expiry,
            style,
            time,
            market_price,
        };
        contract.validate()?;
        Ok(contract)
    }

    /// Check field invariants; used after deserialisation.
    pub fn validate(&self) -> Result<(), InstrumentError> {
        if !(self.strike.is_finite() && self.strike > 0.0) {
            return Err(InstrumentError::InvalidStrike {
                strike: self.strike,
            });
        }
        if !self.market_price.is_finite() {
            return Err(InstrumentError::InvalidParameter {
                message: format!("market price must be finite, got {}", self.market_price),
            });
        }
        Ok(())
    }

    /// Contract symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Strike price.
    pub fn strike(&self) -> f64 {
        self.strike
    }

    /// Call or put.
    pub fn right(&self) -> OptionRight {
        self.right
    }

    /// Last trading date.
    pub fn expiry(&self) -> Date {
        self.expiry
    }

    /// Declared exercise style.
    pub fn style(&self) -> ExerciseStyle {
        self.style
    }

    /// Observation date of the quote.
    pub fn time(&self) -> Date {
        self.time
    }

    /// Quoted market price, the implied volatility target.
    pub fn market_price(&self) -> f64 {
        self.market_price
    }

    /// Copy of the contract observed at another date and price.
    pub fn observed(&self, time: Date, market_price: f64) -> Self {
        Self {
            time,
            market_price,
            ..self.clone()
        }
    }

    /// Vanilla payoff on the contract's strike.
    pub fn payoff(&self) -> PlainVanillaPayoff {
        // strike was validated on construction
        PlainVanillaPayoff::from_validated(self.right, self.strike)
    }

    /// Whether no exercise remains after `date`.
    ///
    /// A contract expiring on `date` counts as expired.
    pub fn is_expired(&self, date: Date) -> bool {
        self.expiry <= date
    }
}

/// Snapshot of the underlying security at the observation time.
///
/// `volatility` is the security's own volatility model output; it is `None`
/// until the model has seen enough data.
///
/// # Examples
/// ```
/// use pricer_models::instruments::Underlying;
///
/// let spy = Underlying::new("SPY", 545.2).with_volatility(0.14);
/// assert_eq!(spy.volatility(), Some(0.14));
/// assert!(Underlying::new("QQQ", 470.0).volatility().is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Underlying {
    symbol: String,
    price: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    volatility: Option<f64>,
}

impl Underlying {
    /// Create an observation without a volatility estimate.
    pub fn new(symbol: impl Into<String>, price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            volatility: None,
        }
    }

    /// Attach the volatility model's current estimate.
    pub fn with_volatility(mut self, volatility: f64) -> Self {
        self.volatility = Some(volatility);
        self
    }

    /// Security symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Last price.
    pub fn price(&self) -> f64 {
        self.price
    }

    /// Volatility estimate, if the model is ready.
    pub fn volatility(&self) -> Option<f64> {
        self.volatility
    }
}
