//! Closed-form competitive equilibrium.
//!
//! With quadratic preferences the equilibrium price vector is the
//! first-order condition of a representative consumer holding the aggregate
//! bliss point `b = Σ b_i` and endowment `e = Σ e_i`:
//!
//! ```text
//! p0 = Πᵗ b − ΠᵗΠ e,   p = p0 / p0[0]
//! ```
//!
//! Each consumer then demands at `p` (see [`crate::demand`]). Because the
//! transfers sum to zero, the multipliers sum to exactly the amount that
//! makes total demand equal total endowment.

use nalgebra::DVector;
use tracing::{debug, warn};

use walras_types::{ConsumerId, ConsumerOutcome, EquilibriumReport, GoodId};

use crate::demand::{demand_at, price_quadratic, utility_of};
use crate::economy::Economy;
use crate::error::EquilibriumError;
use crate::linalg::{self, PreferenceInverses};

/// Prices, multipliers and allocations of a competitive equilibrium.
#[derive(Debug, Clone, PartialEq)]
pub struct Equilibrium {
    prices: DVector<f64>,
    marginal_utilities: Vec<f64>,
    allocations: Vec<DVector<f64>>,
}

impl Equilibrium {
    /// Normalized prices; the numeraire component is exactly 1.
    pub const fn prices(&self) -> &DVector<f64> {
        &self.prices
    }

    /// Marginal utility of wealth `μ_i`, in consumer order.
    pub fn marginal_utilities(&self) -> &[f64] {
        &self.marginal_utilities
    }

    /// Allocations `c_i`, in consumer order.
    pub fn allocations(&self) -> &[DVector<f64>] {
        &self.allocations
    }

    /// One consumer's allocation.
    pub fn allocation(&self, consumer: ConsumerId) -> Option<&DVector<f64>> {
        self.allocations.get(consumer.into_inner())
    }

    /// `Σ c_i`.
    pub fn total_allocation(&self) -> DVector<f64> {
        linalg::sum_vectors(self.allocations.iter(), self.prices.len())
    }

    /// Whether every price, multiplier and allocation component is finite.
    pub fn is_finite(&self) -> bool {
        self.prices.iter().all(|p| p.is_finite())
            && self.marginal_utilities.iter().all(|mu| mu.is_finite())
            && self.allocations.iter().flatten().all(|x| x.is_finite())
    }

    /// The first negative (or NaN) allocation component, scanning consumers
    /// then goods.
    pub fn first_negative(&self) -> Option<(ConsumerId, GoodId, f64)> {
        self.allocations.iter().enumerate().find_map(|(i, c)| {
            c.iter()
                .enumerate()
                .find(|(_, x)| x.is_nan() || **x < 0.0)
                .map(|(k, x)| (ConsumerId(i), GoodId(k), *x))
        })
    }

    /// Serializable form, with each consumer's utility at its allocation.
    pub fn to_report(&self, economy: &Economy) -> EquilibriumReport {
        let consumers = economy
            .consumers()
            .iter()
            .zip(self.allocations.iter().zip(&self.marginal_utilities))
            .enumerate()
            .map(|(i, (consumer, (allocation, mu)))| ConsumerOutcome {
                consumer: ConsumerId(i),
                marginal_utility: *mu,
                allocation: allocation.iter().copied().collect(),
                utility: utility_of(economy, consumer, allocation),
            })
            .collect();
        EquilibriumReport {
            prices: self.prices.iter().copied().collect(),
            consumers,
        }
    }
}

/// Solve for the competitive equilibrium of `economy`.
///
/// Pure and deterministic: the same economy always yields the same result.
///
/// # Errors
///
/// - [`EquilibriumError::SingularMatrix`] if `Π` or `ΠᵗΠ` cannot be inverted.
/// - [`EquilibriumError::DegenerateNormalization`] if `p0[0]` is zero, or if
///   aggregation overflows so that prices or allocations are not finite.
/// - [`EquilibriumError::InfeasibleAllocation`] if any consumer would hold a
///   negative quantity; the invalid equilibrium is attached.
pub fn solve_equilibrium(economy: &Economy) -> Result<Equilibrium, EquilibriumError> {
    let preferences = economy.preferences();
    let inverses = PreferenceInverses::compute(preferences)?;

    let bliss = economy.aggregate_bliss();
    let endowment = economy.aggregate_endowment();
    let transposed = preferences.transpose();
    let raw = &transposed * &bliss - &transposed * preferences * &endowment;

    let numeraire = raw.get(GoodId::NUMERAIRE.into_inner()).copied().unwrap_or(0.0);
    if numeraire == 0.0 || !numeraire.is_finite() {
        return Err(EquilibriumError::DegenerateNormalization);
    }
    let prices = raw / numeraire;
    let quadratic = price_quadratic(&inverses, &prices);
    if quadratic == 0.0 || !quadratic.is_finite() || !prices.iter().all(|p| p.is_finite()) {
        return Err(EquilibriumError::DegenerateNormalization);
    }
    debug!(
        numeraire,
        quadratic,
        goods = economy.goods(),
        consumers = economy.consumer_count(),
        "prices normalized"
    );

    let (allocations, marginal_utilities) = economy
        .consumers()
        .iter()
        .map(|consumer| {
            let d = demand_at(&inverses, consumer, &prices, quadratic);
            (d.allocation, d.marginal_utility)
        })
        .unzip();

    let equilibrium = Equilibrium {
        prices,
        marginal_utilities,
        allocations,
    };

    if !equilibrium.is_finite() {
        warn!("equilibrium overflowed to a non-finite value");
        return Err(EquilibriumError::DegenerateNormalization);
    }

    if let Some((consumer, good, value)) = equilibrium.first_negative() {
        warn!(%consumer, %good, value, "equilibrium allocation is infeasible");
        return Err(EquilibriumError::InfeasibleAllocation {
            consumer,
            good,
            value,
            equilibrium: Box::new(equilibrium),
        });
    }

    Ok(equilibrium)
}

impl Economy {
    /// Solve this economy. See [`solve_equilibrium`].
    ///
    /// # Errors
    ///
    /// As for [`solve_equilibrium`].
    pub fn solve(&self) -> Result<Equilibrium, EquilibriumError> {
        solve_equilibrium(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::indexing_slicing)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use nalgebra::DMatrix;

    use super::*;

    fn v(values: &[f64]) -> DVector<f64> {
        DVector::from_column_slice(values)
    }

    fn two_consumer(b1: &[f64], b2: &[f64], transfers: Option<Vec<f64>>) -> Economy {
        let builder = Economy::builder(DMatrix::identity(2, 2))
            .consumer(v(b1), v(&[0.0, 2.0]))
            .consumer(v(b2), v(&[2.0, 0.0]));
        match transfers {
            Some(t) => builder.transfers(t).build().unwrap(),
            None => builder.build().unwrap(),
        }
    }

    #[test]
    fn symmetric_economy_splits_equally() {
        let eq = solve_equilibrium(&two_consumer(&[5.0, 5.0], &[5.0, 5.0], None)).unwrap();
        assert_relative_eq!(*eq.prices(), v(&[1.0, 1.0]));
        assert_relative_eq!(eq.allocations()[0], v(&[1.0, 1.0]));
        assert_relative_eq!(eq.allocations()[1], v(&[1.0, 1.0]));
        assert_relative_eq!(eq.marginal_utilities()[0], 4.0);
        assert_relative_eq!(eq.marginal_utilities()[1], 4.0);
    }

    #[test]
    fn numeraire_is_exactly_one() {
        let economy = Economy::builder(
            DMatrix::from_row_slice(2, 2, &[1.0, 0.2, 0.1, 1.0]),
        )
        .consumer(v(&[10.0, 8.0]), v(&[3.0, 1.0]))
        .consumer(v(&[8.0, 10.0]), v(&[1.0, 3.0]))
        .build()
        .unwrap();
        let eq = economy.solve().unwrap();
        assert_eq!(eq.prices()[0], 1.0);
    }

    #[test]
    fn asymmetric_bliss_shifts_consumption() {
        let eq = solve_equilibrium(&two_consumer(&[6.0, 5.0], &[5.0, 6.0], None)).unwrap();
        let c1 = eq.allocation(ConsumerId(0)).unwrap();
        assert!(c1[0] > c1[1]);
        assert_relative_eq!(*c1, v(&[1.5, 0.5]), epsilon = 1e-12);
        let c2 = eq.allocation(ConsumerId(1)).unwrap();
        assert!(c2[1] > c2[0]);
    }

    #[test]
    fn transfers_redistribute_consumption() {
        let eq =
            solve_equilibrium(&two_consumer(&[5.0, 5.0], &[5.0, 5.0], Some(vec![0.5, -0.5])))
                .unwrap();
        // c_1 = 1 + W_1 / 2 per good.
        assert_relative_eq!(eq.allocations()[0], v(&[1.25, 1.25]), epsilon = 1e-12);
        assert_relative_eq!(eq.allocations()[1], v(&[0.75, 0.75]), epsilon = 1e-12);
    }

    #[test]
    fn large_transfer_is_infeasible() {
        let err = solve_equilibrium(&two_consumer(&[5.0, 5.0], &[5.0, 5.0], Some(vec![-3.0, 3.0])))
            .unwrap_err();
        match err {
            EquilibriumError::InfeasibleAllocation {
                consumer,
                good,
                value,
                equilibrium,
            } => {
                assert_eq!(consumer, ConsumerId(0));
                assert_eq!(good, GoodId(0));
                assert_relative_eq!(value, -0.5, epsilon = 1e-12);
                assert_relative_eq!(equilibrium.allocations()[1], v(&[2.5, 2.5]), epsilon = 1e-12);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn singular_preferences_fail() {
        let economy = Economy::builder(DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]))
            .consumer(v(&[20.0, 20.0]), v(&[1.0, 1.0]))
            .build()
            .unwrap();
        let err = solve_equilibrium(&economy).unwrap_err();
        assert!(matches!(err, EquilibriumError::SingularMatrix { .. }));
    }

    #[test]
    fn zero_numeraire_price_is_degenerate() {
        // b[0] == e[0] in aggregate, so p0[0] = 0 under Π = I.
        let economy = Economy::builder(DMatrix::identity(2, 2))
            .consumer(v(&[2.0, 5.0]), v(&[2.0, 1.0]))
            .threshold(0.5)
            .build()
            .unwrap();
        let err = solve_equilibrium(&economy).unwrap_err();
        assert!(matches!(err, EquilibriumError::DegenerateNormalization));
    }

    #[test]
    fn overflowing_aggregates_are_degenerate() {
        // Each input is finite, but Σ b_i overflows to infinity and p0 = ∞ − ∞.
        let economy = Economy::builder(DMatrix::identity(2, 2))
            .consumer(v(&[1.6e308, 1.6e308]), v(&[1e308, 1e308]))
            .consumer(v(&[1.6e308, 1.6e308]), v(&[1e308, 1e308]))
            .build()
            .unwrap();
        let err = solve_equilibrium(&economy).unwrap_err();
        assert!(matches!(err, EquilibriumError::DegenerateNormalization));
    }

    #[test]
    fn nan_allocation_counts_as_infeasible() {
        let eq = Equilibrium {
            prices: v(&[1.0, 1.0]),
            marginal_utilities: vec![1.0, 1.0],
            allocations: vec![v(&[1.0, 1.0]), v(&[0.5, f64::NAN])],
        };
        assert!(!eq.is_finite());
        let (consumer, good, value) = eq.first_negative().unwrap();
        assert_eq!((consumer, good), (ConsumerId(1), GoodId(1)));
        assert!(value.is_nan());
    }

    #[test]
    fn solving_twice_is_identical() {
        let economy = two_consumer(&[6.0, 5.0], &[5.0, 6.0], Some(vec![0.25, -0.25]));
        let first = solve_equilibrium(&economy).unwrap();
        let second = solve_equilibrium(&economy).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn markets_clear() {
        let economy = two_consumer(&[6.0, 5.0], &[5.0, 6.0], None);
        let eq = solve_equilibrium(&economy).unwrap();
        assert_abs_diff_eq!(eq.total_allocation(), economy.aggregate_endowment(), epsilon = 1e-12);
    }

    #[test]
    fn report_carries_utilities() {
        let economy = two_consumer(&[5.0, 5.0], &[5.0, 5.0], None);
        let report = solve_equilibrium(&economy).unwrap().to_report(&economy);
        assert_eq!(report.prices, vec![1.0, 1.0]);
        assert_eq!(report.consumers.len(), 2);
        assert_eq!(report.consumers[1].consumer, ConsumerId(1));
        assert_relative_eq!(report.consumers[0].utility, -16.0, epsilon = 1e-12);
    }
}
