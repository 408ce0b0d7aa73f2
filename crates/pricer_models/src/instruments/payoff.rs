//! Option rights and the plain vanilla payoff.

use pricer_core::traits::Float;
use std::fmt;
use std::str::FromStr;

use super::error::InstrumentError;

/// Right conferred by the option.
///
/// # Examples
/// ```
/// use pricer_models::instruments::OptionRight;
///
/// assert_eq!("put".parse::<OptionRight>().unwrap(), OptionRight::Put);
/// assert_eq!(OptionRight::Call.sign(), 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OptionRight {
    /// Right to buy: max(S - K, 0)
    Call,
    /// Right to sell: max(K - S, 0)
    Put,
}

impl OptionRight {
    /// +1 for calls, -1 for puts.
    #[inline]
    pub fn sign(&self) -> f64 {
        match self {
            OptionRight::Call => 1.0,
            OptionRight::Put => -1.0,
        }
    }

    /// Returns whether this is a call.
    #[inline]
    pub fn is_call(&self) -> bool {
        matches!(self, OptionRight::Call)
    }

    /// The opposite right.
    pub fn flip(&self) -> Self {
        match self {
            OptionRight::Call => OptionRight::Put,
            OptionRight::Put => OptionRight::Call,
        }
    }
}

impl FromStr for OptionRight {
    type Err = InstrumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "call" | "c" => Ok(OptionRight::Call),
            "put" | "p" => Ok(OptionRight::Put),
            _ => Err(InstrumentError::InvalidParameter {
                message: format!("Unknown option right: {}", s),
            }),
        }
    }
}

impl fmt::Display for OptionRight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionRight::Call => write!(f, "call"),
            OptionRight::Put => write!(f, "put"),
        }
    }
}

/// Vanilla payoff max(ω(S - K), 0) with ω = +1 for calls, -1 for puts.
///
/// # Examples
/// ```
/// use pricer_models::instruments::{OptionRight, PlainVanillaPayoff};
///
/// let put = PlainVanillaPayoff::new(OptionRight::Put, 100.0).unwrap();
/// assert_eq!(put.value(90.0_f64), 10.0);
/// assert_eq!(put.value(110.0_f64), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlainVanillaPayoff {
    right: OptionRight,
    strike: f64,
}

impl PlainVanillaPayoff {
    /// Create a payoff.
    ///
    /// # Errors
    /// `InstrumentError::InvalidStrike` if strike is not a positive finite number.
    pub fn new(right: OptionRight, strike: f64) -> Result<Self, InstrumentError> {
        if !(strike.is_finite() && strike > 0.0) {
            return Err(InstrumentError::InvalidStrike { strike });
        }
        Ok(Self { right, strike })
    }

    /// Payoff on a strike already known to be valid.
    pub(crate) fn from_validated(right: OptionRight, strike: f64) -> Self {
        debug_assert!(strike.is_finite() && strike > 0.0);
        Self { right, strike }
    }

    /// Option right.
    #[inline]
    pub fn right(&self) -> OptionRight {
        self.right
    }

    /// Strike price.
    #[inline]
    pub fn strike(&self) -> f64 {
        self.strike
    }

    /// Payoff at underlying price `spot`.
    #[inline]
    pub fn value<T: Float>(&self, spot: T) -> T {
        let strike = T::from(self.strike).unwrap_or_else(T::nan);
        let diff = match self.right {
            OptionRight::Call => spot - strike,
            OptionRight::Put => strike - spot,
        };
        diff.max(T::zero())
    }
}
