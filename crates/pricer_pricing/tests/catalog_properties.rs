//! Properties every catalog method must satisfy.
//!
//! # Test Categories
//!
//! 1. **Bounds**: non-negative prices, American prices above intrinsic
//! 2. **Degenerate inputs**: zero volatility, zero time to maturity
//! 3. **Cross-method agreement**: prices, Greeks and implied volatility
//!    against the closed form
//! 4. **Containment**: non-finite NPVs, missing Greeks

use approx::assert_relative_eq;
use pricer_core::types::Date;
use pricer_models::instruments::{ExerciseStyle, OptionContract, OptionRight, Underlying};
use pricer_pricing::catalog::engine_factory;
use pricer_pricing::engines::{EngineArguments, EngineError, PricingEngine};
use pricer_pricing::{
    MarketContext, PricingModelCatalog, PricingModelKind, ValuationConfig, ValuationSnapshot,
};
use proptest::prelude::*;

fn d(y: i32, m: u32, day: u32) -> Date {
    Date::from_ymd(y, m, day).unwrap()
}

fn catalog() -> PricingModelCatalog {
    PricingModelCatalog::new(ValuationConfig::default()).unwrap()
}

fn contract(
    strike: f64,
    right: OptionRight,
    style: ExerciseStyle,
    time: Date,
    expiry: Date,
) -> OptionContract {
    OptionContract::new(
        format!("XYZ {} {}", right, strike),
        strike,
        right,
        expiry,
        style,
        time,
        1.0,
    )
    .unwrap()
}

/// Intrinsic value at the underlying's price.
fn intrinsic(spot: f64, strike: f64, right: OptionRight) -> f64 {
    (right.sign() * (spot - strike)).max(0.0)
}

// ============================================================================
// Bounds
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_every_method_prices_non_negative(
        spot in 20.0f64..200.0,
        strike in 20.0f64..200.0,
        volatility in 0.05f64..1.0,
        days in 1i64..400,
        is_call in any::<bool>(),
        is_american in any::<bool>(),
    ) {
        let time = d(2024, 3, 1);
        let expiry = time.add_days(days).unwrap();
        let right = if is_call { OptionRight::Call } else { OptionRight::Put };
        let style = if is_american { ExerciseStyle::American } else { ExerciseStyle::European };
        let option = contract(strike, right, style, time, expiry);
        let underlying = Underlying::new("XYZ", spot).with_volatility(volatility);
        let context = MarketContext::new(time);

        for (kind, model) in catalog().models() {
            let price = model.evaluate(&underlying, &context, &option).price();
            prop_assert!(price.is_finite() && price >= 0.0, "{}: {}", kind, price);
        }
    }
}

#[test]
fn test_american_methods_respect_intrinsic() {
    let catalog = catalog();
    let time = d(2024, 3, 1);
    let expiry = d(2024, 8, 16);
    let context = MarketContext::new(time);

    for kind in [
        PricingModelKind::BaroneAdesiWhaley,
        PricingModelKind::BjerksundStensland,
        PricingModelKind::CrankNicolsonFd,
    ] {
        let model = catalog.model(kind);
        for spot in [60.0, 80.0, 100.0, 120.0, 140.0] {
            for right in [OptionRight::Call, OptionRight::Put] {
                let underlying = Underlying::new("XYZ", spot).with_volatility(0.25);
                let option = contract(100.0, right, ExerciseStyle::American, time, expiry);
                let price = model.evaluate(&underlying, &context, &option).price();
                assert!(
                    price >= intrinsic(spot, 100.0, right) - 1e-10,
                    "{} {} at {}: {}",
                    kind,
                    right,
                    spot,
                    price
                );
            }
        }
    }
}

#[test]
fn test_deep_itm_american_call_not_below_european() {
    let catalog = catalog();
    let time = d(2024, 3, 1);
    let expiry = d(2024, 12, 20);
    let context = MarketContext::new(time);
    let underlying = Underlying::new("XYZ", 160.0).with_volatility(0.3);

    let european = catalog
        .model(PricingModelKind::BlackScholes)
        .evaluate(&underlying, &context, &contract(100.0, OptionRight::Call, ExerciseStyle::European, time, expiry))
        .price();
    let american_call = contract(100.0, OptionRight::Call, ExerciseStyle::American, time, expiry);

    for kind in [
        PricingModelKind::BaroneAdesiWhaley,
        PricingModelKind::BjerksundStensland,
    ] {
        let american = catalog.model(kind).evaluate(&underlying, &context, &american_call).price();
        assert!(american >= european - 1e-10, "{}: {} < {}", kind, american, european);
    }

    let fd = catalog.model(PricingModelKind::CrankNicolsonFd);
    let fd_european = fd
        .evaluate(&underlying, &context, &contract(100.0, OptionRight::Call, ExerciseStyle::European, time, expiry))
        .price();
    let fd_american = fd.evaluate(&underlying, &context, &american_call).price();
    assert!(fd_american >= fd_european - 1e-10);
}

// ============================================================================
// Degenerate inputs
// ============================================================================

#[test]
fn test_zero_volatility_returns_without_failure() {
    let time = d(2024, 3, 1);
    let context = MarketContext::new(time);
    let underlying = Underlying::new("XYZ", 110.0).with_volatility(0.0);
    let option = contract(100.0, OptionRight::Call, ExerciseStyle::American, time, d(2024, 6, 21));

    for (kind, model) in catalog().models() {
        let snapshot = model.evaluate(&underlying, &context, &option).snapshot();
        assert!(snapshot.price.is_finite() && snapshot.price >= 0.0, "{}", kind);
        assert!(snapshot.greeks.delta.is_finite(), "{}", kind);
    }
}

#[test]
fn test_zero_time_is_zero() {
    let time = d(2024, 6, 21);
    let context = MarketContext::new(time);
    let underlying = Underlying::new("XYZ", 95.0).with_volatility(0.3);

    for style in [ExerciseStyle::European, ExerciseStyle::American] {
        let option = contract(100.0, OptionRight::Put, style, time, time);
        for (kind, model) in catalog().models() {
            let snapshot = model.evaluate(&underlying, &context, &option).snapshot();
            assert_eq!(snapshot.price, 0.0, "{}", kind);
            assert_eq!(snapshot, ValuationSnapshot::default(), "{}", kind);
        }
    }
}

#[test]
fn test_deep_otm_short_dated_american_put_is_worthless() {
    let time = d(2024, 3, 1);
    let context = MarketContext::new(time);
    let underlying = Underlying::new("XYZ", 100.0).with_volatility(0.2);
    let option = contract(50.0, OptionRight::Put, ExerciseStyle::American, time, d(2024, 3, 11));

    let result = catalog()
        .model(PricingModelKind::BaroneAdesiWhaley)
        .evaluate(&underlying, &context, &option);
    assert!(result.price() < 1e-8);
    assert!(result.greeks().delta().abs() < 1e-6);
}

// ============================================================================
// Cross-method agreement
// ============================================================================

#[test]
fn test_black_scholes_reference_scenario() {
    // No settlement lag: exactly 30 calendar days to expiry
    let catalog = PricingModelCatalog::new(ValuationConfig {
        settlement_days: 0,
        ..ValuationConfig::default()
    })
    .unwrap();
    let time = d(2024, 3, 4);
    let option = contract(100.0, OptionRight::Call, ExerciseStyle::European, time, d(2024, 4, 3));
    let underlying = Underlying::new("XYZ", 100.0).with_volatility(0.2);

    let result = catalog
        .model(PricingModelKind::BlackScholes)
        .evaluate(&underlying, &MarketContext::new(time), &option);

    assert_relative_eq!(result.price(), 2.327_524_911_927_718, epsilon = 1e-6);
    let delta = result.greeks().delta();
    assert_relative_eq!(delta, 0.517_150_693_219_39, epsilon = 1e-6);
}

#[test]
fn test_binomial_trees_within_one_percent_of_closed_form() {
    let catalog = catalog();
    let time = d(2024, 3, 1);
    let context = MarketContext::new(time);
    let underlying = Underlying::new("XYZ", 100.0).with_volatility(0.2);
    let option = contract(100.0, OptionRight::Call, ExerciseStyle::European, time, d(2024, 4, 1));

    let reference = catalog
        .model(PricingModelKind::BlackScholes)
        .evaluate(&underlying, &context, &option)
        .price();
    assert!(reference > 0.0);

    for kind in PricingModelKind::ALL.iter().filter(|k| k.binomial_tree().is_some()) {
        let price = catalog.model(*kind).evaluate(&underlying, &context, &option).price();
        assert_relative_eq!(price, reference, max_relative = 1e-2);
    }
}

#[test]
fn test_integral_and_fd_agree_with_closed_form() {
    let catalog = catalog();
    let time = d(2024, 3, 1);
    let context = MarketContext::new(time);
    let underlying = Underlying::new("XYZ", 100.0).with_volatility(0.3);
    let option = contract(105.0, OptionRight::Put, ExerciseStyle::European, time, d(2024, 9, 20));

    let reference = catalog
        .model(PricingModelKind::BlackScholes)
        .evaluate(&underlying, &context, &option)
        .price();
    let integral = catalog
        .model(PricingModelKind::Integral)
        .evaluate(&underlying, &context, &option)
        .price();
    let fd = catalog
        .model(PricingModelKind::CrankNicolsonFd)
        .evaluate(&underlying, &context, &option)
        .price();

    assert_relative_eq!(integral, reference, max_relative = 1e-4);
    assert_relative_eq!(fd, reference, max_relative = 1e-2);
}

/// Catalog without settlement lag: 2024-03-01 to 2024-09-20 is 203 days.
fn unlagged_catalog() -> PricingModelCatalog {
    PricingModelCatalog::new(ValuationConfig {
        settlement_days: 0,
        ..ValuationConfig::default()
    })
    .unwrap()
}

/// Lattices whose jumps ignore the strike reprice the rate bump coarsely.
fn rho_tolerance(kind: PricingModelKind) -> f64 {
    match kind {
        PricingModelKind::BinomialJarrowRudd
        | PricingModelKind::AdditiveEquiprobabilities
        | PricingModelKind::BinomialTian => 0.15,
        _ => 1e-2,
    }
}

#[test]
fn test_every_method_greeks_match_closed_form() {
    // Calls without dividends carry no early-exercise premium, so the
    // American approximations value the same European claim.
    let catalog = unlagged_catalog();
    let time = d(2024, 3, 1);
    let context = MarketContext::new(time);
    let underlying = Underlying::new("XYZ", 100.0).with_volatility(0.2);

    for strike in [100.0, 95.0] {
        let option = contract(strike, OptionRight::Call, ExerciseStyle::European, time, d(2024, 9, 20));
        let reference = catalog
            .model(PricingModelKind::BlackScholes)
            .evaluate(&underlying, &context, &option)
            .snapshot()
            .greeks;

        for (kind, model) in catalog.models() {
            let greeks = model.evaluate(&underlying, &context, &option).snapshot().greeks;
            assert_relative_eq!(greeks.delta, reference.delta, max_relative = 2e-2);
            assert_relative_eq!(greeks.gamma, reference.gamma, max_relative = 2e-2);
            assert_relative_eq!(greeks.vega, reference.vega, max_relative = 5e-2);
            assert!(
                ((greeks.rho - reference.rho) / reference.rho).abs() < rho_tolerance(kind),
                "{} rho {} against {}",
                kind,
                greeks.rho,
                reference.rho
            );
        }
    }
}

#[test]
fn test_integral_gamma_from_bumped_reprices() {
    let catalog = unlagged_catalog();
    let time = d(2024, 3, 1);
    let context = MarketContext::new(time);
    let underlying = Underlying::new("XYZ", 100.0).with_volatility(0.2);
    let option = contract(100.0, OptionRight::Call, ExerciseStyle::European, time, d(2024, 9, 1));

    let reference = catalog
        .model(PricingModelKind::BlackScholes)
        .evaluate(&underlying, &context, &option);
    let integral = catalog
        .model(PricingModelKind::Integral)
        .evaluate(&underlying, &context, &option);

    assert_relative_eq!(integral.greeks().gamma(), reference.greeks().gamma(), max_relative = 1e-3);
    assert_relative_eq!(integral.greeks().delta(), reference.greeks().delta(), max_relative = 1e-4);
}

#[test]
fn test_every_method_recovers_its_own_volatility() {
    let catalog = unlagged_catalog();
    let time = d(2024, 3, 1);
    let context = MarketContext::new(time);
    let underlying = Underlying::new("XYZ", 101.0).with_volatility(0.25);
    let call = contract(100.0, OptionRight::Call, ExerciseStyle::European, time, d(2024, 9, 20));
    let put = contract(105.0, OptionRight::Put, ExerciseStyle::American, time, d(2024, 9, 20));

    let american = [
        PricingModelKind::BaroneAdesiWhaley,
        PricingModelKind::BjerksundStensland,
        PricingModelKind::CrankNicolsonFd,
    ];
    let cases = catalog
        .models()
        .into_iter()
        .map(|(kind, model)| (kind, model, &call))
        .chain(american.iter().map(|&kind| (kind, catalog.model(kind), &put)));

    for (kind, model, option) in cases {
        let fair = model.evaluate(&underlying, &context, option).price();
        assert!(fair > 0.0, "{}", kind);

        let quoted = option.observed(time, fair);
        let implied = model.evaluate(&underlying, &context, &quoted).implied_volatility();
        assert!((implied - 0.25).abs() < 1e-3, "{}: {}", kind, implied);
    }
}

// ============================================================================
// Containment
// ============================================================================

struct NanEngine;

impl PricingEngine for NanEngine {
    fn name(&self) -> &'static str {
        "NanEngine"
    }

    fn npv(&self, _args: &EngineArguments) -> Result<f64, EngineError> {
        Ok(f64::NAN)
    }
}

#[test]
fn test_nan_npv_reported_as_zero() {
    let model = catalog().create_method(
        "nan",
        engine_factory(|_| Ok(Box::new(NanEngine))),
        None,
        None,
        None,
    );
    let time = d(2024, 3, 1);
    let option = contract(100.0, OptionRight::Call, ExerciseStyle::European, time, d(2024, 6, 21));
    let underlying = Underlying::new("XYZ", 100.0).with_volatility(0.2);

    let snapshot = model
        .evaluate(&underlying, &MarketContext::new(time), &option)
        .snapshot();
    assert_eq!(snapshot, ValuationSnapshot::default());
}

#[test]
fn test_elasticity_only_from_closed_form() {
    let time = d(2024, 3, 1);
    let context = MarketContext::new(time);
    let underlying = Underlying::new("XYZ", 100.0).with_volatility(0.2);
    let option = contract(100.0, OptionRight::Call, ExerciseStyle::European, time, d(2024, 6, 21));

    for (kind, model) in catalog().models() {
        let greeks = model.evaluate(&underlying, &context, &option).snapshot().greeks;
        assert!(greeks.delta > 0.0 && greeks.delta < 1.0, "{}: {}", kind, greeks.delta);
        if kind == PricingModelKind::BlackScholes {
            assert!(greeks.elasticity > 0.0);
        } else {
            assert_eq!(greeks.elasticity, 0.0, "{}", kind);
        }
    }
}

#[test]
fn test_concurrent_evaluations_are_isolated() {
    let catalog = catalog();
    let model = catalog.model(PricingModelKind::BaroneAdesiWhaley);
    let time = d(2024, 3, 1);
    let context = MarketContext::new(time);
    let underlying = Underlying::new("XYZ", 100.0).with_volatility(0.35);
    let option = contract(100.0, OptionRight::Put, ExerciseStyle::American, time, d(2024, 9, 20));

    let expected = model.evaluate(&underlying, &context, &option).snapshot();
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| model.evaluate(&underlying, &context, &option).snapshot()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
