//! Recombining binomial lattices.
//!
//! Every tree is expressed in log space: node (i, j) after i steps with j up
//! moves carries S·exp(j·u + (i - j)·d) and moves up with probability p.
//!
//! | Tree | Construction |
//! |------|--------------|
//! | Jarrow-Rudd | p = ½, u,d = ν·dt ± σ√dt |
//! | Cox-Ross-Rubinstein | u = -d = σ√dt, p from the drift |
//! | Additive equiprobabilities | p = ½, u,d = ν·dt ± ½√(4σ²dt - 3ν²dt²) |
//! | Trigeorgis | u = -d = √(σ²dt + ν²dt²) |
//! | Tian | third-moment matching |
//! | Leisen-Reimer | Peizer-Pratt inversion, odd step count |
//! | Joshi | fourth-order inversion, odd step count |
//!
//! with ν = r - q - σ²/2. Delta and gamma come from the option values at the
//! first two time steps.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use pricer_models::instruments::Exercise;
use pricer_models::models::{BlackScholesMertonProcess, ProcessSnapshot};

use super::{
    degenerate_delta_gamma, degenerate_npv, is_degenerate, snapshot, EngineArguments,
    EngineError, Greek, PricingEngine,
};

/// Binomial tree construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BinomialTree {
    /// Jarrow-Rudd (equal probabilities, multiplicative drift)
    JarrowRudd,
    /// Cox-Ross-Rubinstein (equal jumps)
    CoxRossRubinstein,
    /// Additive equiprobabilities
    AdditiveEquiprobabilities,
    /// Trigeorgis (equal jumps, drift-adjusted)
    Trigeorgis,
    /// Tian (moment matching)
    Tian,
    /// Leisen-Reimer
    LeisenReimer,
    /// Joshi (fourth-order)
    Joshi4,
}

impl BinomialTree {
    /// All constructions.
    pub const ALL: [BinomialTree; 7] = [
        BinomialTree::JarrowRudd,
        BinomialTree::CoxRossRubinstein,
        BinomialTree::AdditiveEquiprobabilities,
        BinomialTree::Trigeorgis,
        BinomialTree::Tian,
        BinomialTree::LeisenReimer,
        BinomialTree::Joshi4,
    ];

    /// Short identifier.
    pub fn name(&self) -> &'static str {
        match self {
            BinomialTree::JarrowRudd => "jarrow-rudd",
            BinomialTree::CoxRossRubinstein => "cox-ross-rubinstein",
            BinomialTree::AdditiveEquiprobabilities => "additive-equiprobabilities",
            BinomialTree::Trigeorgis => "trigeorgis",
            BinomialTree::Tian => "tian",
            BinomialTree::LeisenReimer => "leisen-reimer",
            BinomialTree::Joshi4 => "joshi4",
        }
    }

    /// Whether the construction needs an odd number of steps.
    fn needs_odd_steps(&self) -> bool {
        matches!(self, BinomialTree::LeisenReimer | BinomialTree::Joshi4)
    }
}

impl fmt::Display for BinomialTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BinomialTree {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown binomial tree: {}", s))
    }
}

/// Log-space lattice parameters.
#[derive(Debug, Clone, Copy)]
struct Lattice {
    steps: usize,
    dt: f64,
    up: f64,
    down: f64,
    p: f64,
}

impl Lattice {
    fn build(
        tree: BinomialTree,
        snap: &ProcessSnapshot,
        strike: f64,
        steps: usize,
    ) -> Result<Self, EngineError> {
        let steps = if tree.needs_odd_steps() && steps % 2 == 0 {
            steps + 1
        } else {
            steps
        };
        let t = snap.time_to_expiry;
        let sigma = snap.volatility;
        let dt = t / steps as f64;
        let drift = (snap.risk_free_rate - snap.dividend_yield - 0.5 * sigma * sigma) * dt;

        let (up, down, p) = match tree {
            BinomialTree::JarrowRudd => {
                let dx = sigma * dt.sqrt();
                (drift + dx, drift - dx, 0.5)
            }
            BinomialTree::AdditiveEquiprobabilities => {
                let dx = -0.5 * drift
                    + 0.5 * (4.0 * sigma * sigma * dt - 3.0 * drift * drift).sqrt();
                (drift + dx, drift - dx, 0.5)
            }
            BinomialTree::CoxRossRubinstein => {
                let dx = sigma * dt.sqrt();
                (dx, -dx, 0.5 + 0.5 * drift / dx)
            }
            BinomialTree::Trigeorgis => {
                let dx = (sigma * sigma * dt + drift * drift).sqrt();
                (dx, -dx, 0.5 + 0.5 * drift / dx)
            }
            BinomialTree::Tian => {
                let q = (sigma * sigma * dt).exp();
                let r = drift.exp() * q.sqrt();
                let root = (q * q + 2.0 * q - 3.0).sqrt();
                let u = 0.5 * r * q * (q + 1.0 + root);
                let d = 0.5 * r * q * (q + 1.0 - root);
                (u.ln(), d.ln(), (r - d) / (u - d))
            }
            BinomialTree::LeisenReimer | BinomialTree::Joshi4 => {
                let variance = sigma * sigma * t;
                let growth = (drift + 0.5 * sigma * sigma * dt).exp();
                let d2 = ((snap.spot / strike).ln() + drift * steps as f64) / variance.sqrt();
                let (p, p_dash) = if tree == BinomialTree::LeisenReimer {
                    (
                        peizer_pratt_inversion(d2, steps),
                        peizer_pratt_inversion(d2 + variance.sqrt(), steps),
                    )
                } else {
                    let k = (steps - 1) as f64 / 2.0;
                    (joshi_up_probability(k, d2), joshi_up_probability(k, d2 + variance.sqrt()))
                };
                let u = growth * p_dash / p;
                let d = (growth - p * u) / (1.0 - p);
                (u.ln(), d.ln(), p)
            }
        };

        if !(0.0..=1.0).contains(&p) || !up.is_finite() || !down.is_finite() || up <= down {
            return Err(EngineError::NumericalFailure {
                engine: BinomialVanillaEngine::NAME,
                message: format!(
                    "{} tree is not arbitrage free (p = {}, u = {}, d = {})",
                    tree, p, up, down
                ),
            });
        }

        Ok(Self {
            steps,
            dt,
            up,
            down,
            p,
        })
    }

    #[inline]
    fn underlying(&self, spot: f64, i: usize, j: usize) -> f64 {
        spot * (j as f64 * self.up + (i - j) as f64 * self.down).exp()
    }
}

/// Peizer-Pratt method 2 inversion of the binomial distribution.
fn peizer_pratt_inversion(z: f64, n: usize) -> f64 {
    let n = n as f64;
    let ratio = z / (n + 1.0 / 3.0 + 0.1 / (n + 1.0));
    let root = (0.25 - 0.25 * (-ratio * ratio * (n + 1.0 / 6.0)).exp()).sqrt();
    if z >= 0.0 {
        0.5 + root
    } else {
        0.5 - root
    }
}

/// Joshi's fourth-order up probability for k = (n - 1)/2.
fn joshi_up_probability(k: f64, dj: f64) -> f64 {
    let alpha = dj / 8.0_f64.sqrt();
    let alpha2 = alpha * alpha;
    let alpha3 = alpha * alpha2;
    let alpha5 = alpha3 * alpha2;
    let alpha7 = alpha5 * alpha2;
    let beta = -0.375 * alpha - alpha3;
    let gamma = (5.0 / 6.0) * alpha5 + (13.0 / 12.0) * alpha3 + (25.0 / 128.0) * alpha;
    let delta = -0.1025 * alpha - 0.9285 * alpha3 - 1.43 * alpha5 - 0.5138 * alpha7;
    let root_k = k.sqrt();

    0.5 + alpha / root_k + beta / (k * root_k) + gamma / (k * k * root_k)
        + delta / (k * k * k * root_k)
}

/// Value, delta and gamma read off one lattice rollback.
#[derive(Debug, Clone, Copy)]
struct LatticeResults {
    value: f64,
    delta: f64,
    gamma: f64,
}

fn deterministic_limit(
    snap: &ProcessSnapshot,
    args: &EngineArguments,
) -> Result<LatticeResults, EngineError> {
    let (delta, gamma) = degenerate_delta_gamma(snap, args)?;
    Ok(LatticeResults {
        value: degenerate_npv(snap, args)?,
        delta,
        gamma,
    })
}

/// Binomial engine for European and American vanilla options.
#[derive(Debug, Clone)]
pub struct BinomialVanillaEngine {
    process: Rc<BlackScholesMertonProcess>,
    tree: BinomialTree,
    steps: usize,
}

impl BinomialVanillaEngine {
    const NAME: &'static str = "BinomialVanillaEngine";

    /// Fewest steps that still yield a gamma.
    pub const MIN_STEPS: usize = 3;

    /// Create an engine.
    ///
    /// # Errors
    /// `EngineError::InvalidSetting` if `steps < 3`.
    pub fn new(
        process: Rc<BlackScholesMertonProcess>,
        tree: BinomialTree,
        steps: usize,
    ) -> Result<Self, EngineError> {
        if steps < Self::MIN_STEPS {
            return Err(EngineError::InvalidSetting(format!(
                "binomial steps must be >= {}, got {}",
                Self::MIN_STEPS,
                steps
            )));
        }
        Ok(Self {
            process,
            tree,
            steps,
        })
    }

    /// Tree construction in use.
    pub fn tree(&self) -> BinomialTree {
        self.tree
    }

    fn calculate(&self, args: &EngineArguments) -> Result<LatticeResults, EngineError> {
        let snap = snapshot(&self.process, args)?;
        if is_degenerate(&snap) {
            return deterministic_limit(&snap, args);
        }

        let payoff = args.payoff;
        // Drift outrunning the diffusion within one step breaks the tree
        let lattice = match Lattice::build(self.tree, &snap, payoff.strike(), self.steps) {
            Ok(lattice) => lattice,
            Err(err) => {
                debug!(error = %err, "lattice unusable, pricing the deterministic limit");
                return deterministic_limit(&snap, args);
            }
        };
        let spot = snap.spot;
        let n = lattice.steps;
        let discount = (-snap.risk_free_rate * lattice.dt).exp();

        // Exercise allowed from this step on
        let first_exercise_step = match args.exercise {
            Exercise::European { .. } => None,
            Exercise::American { earliest, .. } => {
                let t = self.process.time_to(earliest).max(0.0);
                Some((t / lattice.dt - 1e-9).ceil().max(0.0) as usize)
            }
        };

        let mut values: Vec<f64> = (0..=n)
            .map(|j| payoff.value(lattice.underlying(spot, n, j)))
            .collect();
        let mut step2 = [0.0; 3];
        let mut step1 = [0.0; 2];

        for i in (0..n).rev() {
            for j in 0..=i {
                let continuation =
                    discount * (lattice.p * values[j + 1] + (1.0 - lattice.p) * values[j]);
                values[j] = match first_exercise_step {
                    Some(first) if i >= first => {
                        continuation.max(payoff.value(lattice.underlying(spot, i, j)))
                    }
                    _ => continuation,
                };
            }
            match i {
                2 => step2.copy_from_slice(&values[..3]),
                1 => step1.copy_from_slice(&values[..2]),
                _ => {}
            }
        }

        let s2 = [0, 1, 2].map(|j| lattice.underlying(spot, 2, j));
        let delta_up = (step2[2] - step2[1]) / (s2[2] - s2[1]);
        let delta_down = (step2[1] - step2[0]) / (s2[1] - s2[0]);
        let gamma = (delta_up - delta_down) / ((s2[2] - s2[0]) / 2.0);

        let s1 = [0, 1].map(|j| lattice.underlying(spot, 1, j));
        let delta = (step1[1] - step1[0]) / (s1[1] - s1[0]);

        Ok(LatticeResults {
            value: values[0],
            delta,
            gamma,
        })
    }
}

impl PricingEngine for BinomialVanillaEngine {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn npv(&self, args: &EngineArguments) -> Result<f64, EngineError> {
        Ok(self.calculate(args)?.value)
    }

    fn greek(&self, greek: Greek, args: &EngineArguments) -> Result<f64, EngineError> {
        match greek {
            Greek::Delta => Ok(self.calculate(args)?.delta),
            Greek::Gamma => Ok(self.calculate(args)?.gamma),
            _ => Err(EngineError::GreekNotProvided(greek)),
        }
    }
}
