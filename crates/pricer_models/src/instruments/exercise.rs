//! Exercise styles and exercise schedules.
//!
//! [`ExerciseStyle`] is what a contract declares; [`Exercise`] is the dated
//! schedule an engine actually prices. A pricing method may build an
//! `Exercise` that disagrees with the contract's declared style.

use pricer_core::types::Date;
use std::fmt;
use std::str::FromStr;

use super::error::InstrumentError;

/// Declared exercise style of a listed contract.
///
/// # Examples
/// ```
/// use pricer_models::instruments::ExerciseStyle;
///
/// let style: ExerciseStyle = "american".parse().unwrap();
/// assert!(style.is_american());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ExerciseStyle {
    /// Exercise only at expiry.
    #[default]
    European,

    /// Exercise at any time up to expiry.
    American,
}

impl ExerciseStyle {
    /// Returns whether this is a European exercise style.
    #[inline]
    pub fn is_european(&self) -> bool {
        matches!(self, ExerciseStyle::European)
    }

    /// Returns whether this is an American exercise style.
    #[inline]
    pub fn is_american(&self) -> bool {
        matches!(self, ExerciseStyle::American)
    }
}

impl FromStr for ExerciseStyle {
    type Err = InstrumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "european" | "eu" => Ok(ExerciseStyle::European),
            "american" | "am" => Ok(ExerciseStyle::American),
            _ => Err(InstrumentError::InvalidParameter {
                message: format!("Unknown exercise style: {}", s),
            }),
        }
    }
}

impl fmt::Display for ExerciseStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExerciseStyle::European => write!(f, "european"),
            ExerciseStyle::American => write!(f, "american"),
        }
    }
}

/// Dated exercise schedule handed to an engine.
///
/// # Examples
/// ```
/// use pricer_models::instruments::{Exercise, ExerciseStyle};
/// use pricer_core::types::Date;
///
/// let settle = Date::from_ymd(2024, 6, 6).unwrap();
/// let maturity = Date::from_ymd(2024, 7, 9).unwrap();
///
/// let am = Exercise::american(settle, maturity).unwrap();
/// assert_eq!(am.style(), ExerciseStyle::American);
/// assert_eq!(am.last_date(), maturity);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exercise {
    /// Single exercise on the maturity date.
    European {
        /// Exercise date
        maturity: Date,
    },

    /// Continuous exercise between two dates.
    American {
        /// First exercise date
        earliest: Date,
        /// Last exercise date
        latest: Date,
    },
}

impl Exercise {
    /// European exercise on `maturity`.
    pub fn european(maturity: Date) -> Self {
        Exercise::European { maturity }
    }

    /// American exercise over `[earliest, latest]`.
    ///
    /// # Errors
    /// `InstrumentError::InvalidExerciseWindow` if `latest < earliest`.
    pub fn american(earliest: Date, latest: Date) -> Result<Self, InstrumentError> {
        if latest < earliest {
            return Err(InstrumentError::InvalidExerciseWindow { earliest, latest });
        }
        Ok(Exercise::American { earliest, latest })
    }

    /// Exercise schedule matching a declared style.
    ///
    /// An American window that would end before `earliest` (an already
    /// expired contract) collapses to a single date.
    pub fn for_style(style: ExerciseStyle, earliest: Date, maturity: Date) -> Self {
        match style {
            ExerciseStyle::European => Exercise::European { maturity },
            ExerciseStyle::American => Exercise::American {
                earliest: earliest.min(maturity),
                latest: maturity,
            },
        }
    }

    /// Style of the schedule.
    pub fn style(&self) -> ExerciseStyle {
        match self {
            Exercise::European { .. } => ExerciseStyle::European,
            Exercise::American { .. } => ExerciseStyle::American,
        }
    }

    /// Last date on which the option can be exercised.
    pub fn last_date(&self) -> Date {
        match self {
            Exercise::European { maturity } => *maturity,
            Exercise::American { latest, .. } => *latest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_style_parse_and_display() {
        assert_eq!(
            "European".parse::<ExerciseStyle>().unwrap(),
            ExerciseStyle::European
        );
        assert!("bermudan".parse::<ExerciseStyle>().is_err());
        assert_eq!(ExerciseStyle::American.to_string(), "american");
        assert_eq!(ExerciseStyle::default(), ExerciseStyle::European);
    }

    #[test]
    fn test_american_window_validation() {
        assert!(Exercise::american(d(2024, 2, 1), d(2024, 1, 1)).is_err());
        assert!(Exercise::american(d(2024, 1, 1), d(2024, 1, 1)).is_ok());
    }

    #[test]
    fn test_for_style() {
        let e = Exercise::for_style(ExerciseStyle::European, d(2024, 1, 2), d(2024, 3, 1));
        assert_eq!(e, Exercise::european(d(2024, 3, 1)));

        let a = Exercise::for_style(ExerciseStyle::American, d(2024, 1, 2), d(2024, 3, 1));
        assert_eq!(a.style(), ExerciseStyle::American);
        assert_eq!(a.last_date(), d(2024, 3, 1));
    }

    #[test]
    fn test_for_style_collapses_inverted_window() {
        let a = Exercise::for_style(ExerciseStyle::American, d(2024, 3, 2), d(2024, 3, 1));
        assert_eq!(
            a,
            Exercise::American {
                earliest: d(2024, 3, 1),
                latest: d(2024, 3, 1)
            }
        );
    }
}
