//! Market-clearing and budget verification for solved equilibria.
//!
//! The solver guarantees `Σ c_i = Σ e_i` algebraically. Floating-point
//! rounding, or an equilibrium paired with the wrong economy, can still
//! break it. For each good k the check is:
//!
//! ```text
//! |Σ_i c_i[k] − Σ_i e_i[k]| <= tolerance
//! ```
//!
//! A violation produces a [`ClearingAnomaly`] listing every good that did
//! not clear. Budget verification is the per-consumer counterpart:
//! `p·c_i == p·e_i + W_i`.

use std::collections::BTreeMap;

use walras_types::{ConsumerId, GoodId};

use crate::economy::Economy;
use crate::solver::Equilibrium;

/// Default absolute tolerance for clearing and budget checks.
pub const DEFAULT_CLEARING_TOLERANCE: f64 = 1e-8;

/// A market-clearing violation.
#[derive(Debug, Clone, PartialEq)]
pub struct ClearingAnomaly {
    /// Per-good imbalance: (`total_allocated`, `total_endowed`) for each
    /// good that did not clear.
    pub imbalances: BTreeMap<GoodId, (f64, f64)>,
    /// Human-readable description of the anomaly.
    pub message: String,
}

impl core::fmt::Display for ClearingAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// The result of a market-clearing check.
#[derive(Debug, Clone, PartialEq)]
pub enum ClearingResult {
    /// Every market clears.
    Balanced,
    /// One or more goods are over- or under-allocated.
    Anomaly(ClearingAnomaly),
}

impl ClearingResult {
    /// Whether every market clears.
    pub const fn is_balanced(&self) -> bool {
        matches!(self, Self::Balanced)
    }
}

/// A consumer whose spending differs from their wealth at equilibrium prices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetViolation {
    /// The consumer.
    pub consumer: ConsumerId,
    /// `p·c_i`.
    pub spending: f64,
    /// `p·e_i + W_i`.
    pub wealth: f64,
}

/// Verify that total allocation equals total endowment, good by good.
///
/// An equilibrium whose dimensions do not match the economy is reported as
/// an anomaly on every good of the economy.
pub fn verify_market_clearing(
    economy: &Economy,
    equilibrium: &Equilibrium,
    tolerance: f64,
) -> ClearingResult {
    let endowed = economy.aggregate_endowment();
    let mut imbalances = BTreeMap::new();

    if equilibrium.prices().len() != economy.goods()
        || equilibrium.allocations().len() != economy.consumer_count()
    {
        for (k, e) in endowed.iter().enumerate() {
            imbalances.insert(GoodId(k), (f64::NAN, *e));
        }
        return ClearingResult::Anomaly(ClearingAnomaly {
            imbalances,
            message: format!(
                "CLEARING_ANOMALY: equilibrium shape does not match economy with {} goods and {} consumers",
                economy.goods(),
                economy.consumer_count(),
            ),
        });
    }

    let allocated = equilibrium.total_allocation();
    for (k, (a, e)) in allocated.iter().zip(endowed.iter()).enumerate() {
        if (a - e).abs() > tolerance {
            imbalances.insert(GoodId(k), (*a, *e));
        }
    }

    if imbalances.is_empty() {
        ClearingResult::Balanced
    } else {
        let count = imbalances.len();
        ClearingResult::Anomaly(ClearingAnomaly {
            imbalances,
            message: format!("CLEARING_ANOMALY: {count} market(s) do not clear"),
        })
    }
}

/// List consumers whose budget constraint fails at the equilibrium prices.
pub fn verify_budgets(
    economy: &Economy,
    equilibrium: &Equilibrium,
    tolerance: f64,
) -> Vec<BudgetViolation> {
    let prices = equilibrium.prices();
    economy
        .consumers()
        .iter()
        .zip(equilibrium.allocations())
        .enumerate()
        .filter_map(|(i, (consumer, allocation))| {
            let spending = prices.dot(allocation);
            let wealth = prices.dot(&consumer.endowment) + consumer.transfer;
            ((spending - wealth).abs() > tolerance).then_some(BudgetViolation {
                consumer: ConsumerId(i),
                spending,
                wealth,
            })
        })
        .collect()
}
