//! Contract + process + closed form, wired the way engines use them.

use approx::assert_relative_eq;
use pricer_core::math::solvers::{BrentSolver, SolverConfig};
use pricer_core::market_data::EvaluationClock;
use pricer_core::types::{Calendar, Date};
use pricer_models::analytical::BlackScholesMerton;
use pricer_models::instruments::{Exercise, ExerciseStyle, OptionContract, OptionRight};
use pricer_models::models::{BlackScholesMertonProcess, MarketQuotes};
use proptest::prelude::*;

fn d(y: i32, m: u32, day: u32) -> Date {
    Date::from_ymd(y, m, day).unwrap()
}

fn contract(right: OptionRight) -> OptionContract {
    OptionContract::new(
        "XYZ",
        100.0,
        right,
        d(2024, 2, 16),
        ExerciseStyle::American,
        d(2024, 1, 12),
        2.0,
    )
    .unwrap()
}

#[test]
fn test_contract_priced_through_process() {
    let clock = EvaluationClock::shared(d(2024, 1, 17));
    let process = BlackScholesMertonProcess::new(
        clock,
        MarketQuotes::new(100.0, 0.2, 0.01, 0.0),
        Calendar::UnitedStatesNyse,
    );
    let c = contract(OptionRight::Call);
    let maturity = d(2024, 2, 21);
    let exercise = Exercise::for_style(c.style(), process.reference_date(), maturity);

    let snap = process.snapshot(exercise.last_date(), c.strike()).unwrap();
    let bsm = snap.black_scholes().unwrap();
    let price = bsm.price(c.strike(), snap.time_to_expiry, c.right());

    // 35 days to maturity
    assert_relative_eq!(snap.time_to_expiry, 35.0 / 365.0, epsilon = 1e-12);
    assert!(price > 0.0 && price < 5.0);
}

#[test]
fn test_bumped_spot_reprices() {
    let clock = EvaluationClock::shared(d(2024, 1, 17));
    let process = BlackScholesMertonProcess::new(
        clock,
        MarketQuotes::new(100.0, 0.2, 0.01, 0.0),
        Calendar::WeekendsOnly,
    );
    let price = |p: &BlackScholesMertonProcess| {
        let snap = p.snapshot(d(2024, 2, 21), 100.0).unwrap();
        snap.black_scholes()
            .unwrap()
            .price(100.0, snap.time_to_expiry, OptionRight::Put)
    };

    let base = price(&process);
    let bumped = {
        let _up = process.spot_quote().bump(1.0);
        price(&process)
    };
    assert!(bumped < base);
    assert_eq!(price(&process), base);
}

#[test]
fn test_brent_recovers_closed_form_volatility() {
    let solver = BrentSolver::new(SolverConfig::new(1e-10, 100));
    let expiry = 49.0 / 365.0;

    for volatility in [0.05, 0.16, 0.25, 0.6, 1.5, 3.5] {
        for (strike, right) in [(100.0, OptionRight::Call), (140.0, OptionRight::Call), (90.0, OptionRight::Put)] {
            let target = BlackScholesMerton::new(101.0, 0.01, 0.0, volatility)
                .unwrap()
                .price(strike, expiry, right);
            if target < 1e-4 {
                continue;
            }

            let mut visited = Vec::new();
            let root = solver
                .find_root(
                    |v| {
                        visited.push(v);
                        match BlackScholesMerton::new(101.0, 0.01, 0.0, v) {
                            Ok(bsm) => bsm.price(strike, expiry, right) - target,
                            Err(_) => f64::NAN,
                        }
                    },
                    1e-7,
                    4.0,
                )
                .unwrap();

            assert_relative_eq!(root, volatility, max_relative = 1e-6);
            assert!(visited.iter().all(|v| (1e-7..=4.0).contains(v)));
        }
    }
}

proptest! {
    #[test]
    fn prop_closed_form_non_negative(
        spot in 1.0f64..500.0,
        vol in 0.0f64..2.0,
        rate in -0.02f64..0.2,
        days in 0i64..1000,
    ) {
        let clock = EvaluationClock::shared(d(2024, 1, 2));
        let process = BlackScholesMertonProcess::new(
            clock,
            MarketQuotes::new(spot, vol, rate, 0.0),
            Calendar::WeekendsOnly,
        );
        let maturity = d(2024, 1, 2).add_days(days).unwrap();
        let snap = process.snapshot(maturity, 100.0).unwrap();
        let bsm = snap.black_scholes().unwrap();
        for right in [OptionRight::Call, OptionRight::Put] {
            let v = bsm.price(100.0, snap.time_to_expiry, right);
            prop_assert!(v >= 0.0 && v.is_finite());
        }
    }
}
