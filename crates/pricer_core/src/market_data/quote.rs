//! Mutable market quotes with scoped perturbation.
//!
//! A [`SimpleQuote`] is the single source of truth for one scalar input
//! (spot, volatility, risk-free rate, dividend yield). Term structures and
//! processes hold a [`QuoteHandle`] and read the value at calculation time,
//! so changing the quote reprices everything built on it.
//!
//! Perturbations go through [`QuoteGuard`], which restores the previous value
//! when dropped, including during unwinding.
//!
//! # Example
//!
//! ```
//! use pricer_core::market_data::SimpleQuote;
//!
//! let spot = SimpleQuote::shared("spot", 100.0);
//! {
//!     let _up = spot.bump(0.01);
//!     assert!((spot.value() - 100.01).abs() < 1e-12);
//! }
//! assert_eq!(spot.value(), 100.0);
//! ```

use std::cell::Cell;
use std::rc::Rc;

use super::error::MarketDataError;

/// Shared handle to a quote.
///
/// Quotes are owned by a single evaluation and never cross threads, so the
/// handle is reference counted without synchronisation.
pub type QuoteHandle = Rc<SimpleQuote>;

/// Named mutable scalar.
#[derive(Debug, Clone)]
pub struct SimpleQuote {
    name: String,
    value: Cell<f64>,
}

impl SimpleQuote {
    /// Create a quote with an initial value.
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value: Cell::new(value),
        }
    }

    /// Create a quote and wrap it in a [`QuoteHandle`].
    pub fn shared(name: impl Into<String>, value: f64) -> QuoteHandle {
        Rc::new(Self::new(name, value))
    }

    /// Quote name, used in error messages and logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current value.
    #[inline]
    pub fn value(&self) -> f64 {
        self.value.get()
    }

    /// Current value, or an error if it is NaN or infinite.
    pub fn checked_value(&self) -> Result<f64, MarketDataError> {
        let value = self.value();
        if value.is_finite() {
            Ok(value)
        } else {
            Err(MarketDataError::InvalidQuote {
                name: self.name.clone(),
                value,
            })
        }
    }

    /// Whether the quote holds a finite value.
    pub fn is_valid(&self) -> bool {
        self.value().is_finite()
    }

    /// Overwrite the value, returning the previous one.
    pub fn set_value(&self, value: f64) -> f64 {
        self.value.replace(value)
    }

    /// Set the value until the returned guard is dropped.
    #[must_use = "the quote is restored as soon as the guard is dropped"]
    pub fn set_scoped(&self, value: f64) -> QuoteGuard<'_> {
        let original = self.set_value(value);
        QuoteGuard {
            quote: self,
            original,
        }
    }

    /// Add `delta` to the value until the returned guard is dropped.
    #[must_use = "the quote is restored as soon as the guard is dropped"]
    pub fn bump(&self, delta: f64) -> QuoteGuard<'_> {
        self.set_scoped(self.value() + delta)
    }
}

/// Restores a quote to its pre-perturbation value on drop.
#[derive(Debug)]
pub struct QuoteGuard<'a> {
    quote: &'a SimpleQuote,
    original: f64,
}

impl QuoteGuard<'_> {
    /// Value the quote will be restored to.
    pub fn original(&self) -> f64 {
        self.original
    }
}

impl Drop for QuoteGuard<'_> {
    fn drop(&mut self) {
        self.quote.value.set(self.original);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_set_value_returns_previous() {
        let q = SimpleQuote::new("rate", 0.01);
        assert_eq!(q.set_value(0.02), 0.01);
        assert_eq!(q.value(), 0.02);
        assert_eq!(q.name(), "rate");
    }

    #[test]
    fn test_nested_guards_restore_in_order() {
        let q = SimpleQuote::shared("spot", 100.0);
        {
            let outer = q.bump(1.0);
            assert_eq!(outer.original(), 100.0);
            {
                let _inner = q.bump(-2.0);
                assert_eq!(q.value(), 99.0);
            }
            assert_eq!(q.value(), 101.0);
        }
        assert_eq!(q.value(), 100.0);
    }

    #[test]
    fn test_guard_restores_during_unwind() {
        let q = SimpleQuote::shared("vol", 0.2);
        let inner = Rc::clone(&q);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _g = inner.set_scoped(0.5);
            panic!("pricing blew up");
        }));
        assert!(result.is_err());
        assert_eq!(q.value(), 0.2);
    }

    #[test]
    fn test_checked_value_rejects_nan() {
        let q = SimpleQuote::new("dividend", f64::NAN);
        assert!(!q.is_valid());
        assert!(matches!(
            q.checked_value(),
            Err(MarketDataError::InvalidQuote { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_bump_always_restores(start in -1e6f64..1e6, delta in -1e3f64..1e3) {
            let q = SimpleQuote::new("x", start);
            {
                let _g = q.bump(delta);
            }
            prop_assert_eq!(q.value(), start);
        }
    }
}
