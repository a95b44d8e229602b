//! Individual demand, aggregate excess demand and quadratic utility.
//!
//! Each consumer maximizes `u(c) = -½ ‖Π c − b_i‖²` subject to the budget
//! `p·c = p·e_i + W_i`. The first-order conditions give the closed form
//!
//! ```text
//! μ_i(p) = (pᵗ(Π⁻¹ b_i − e_i) − W_i) / (pᵗ (ΠᵗΠ)⁻¹ p)
//! c_i(p) = Π⁻¹ b_i − μ_i(p) (ΠᵗΠ)⁻¹ p
//! ```
//!
//! which holds at any price vector, not only the equilibrium one.

use nalgebra::DVector;

use walras_types::ConsumerId;

use crate::economy::{Consumer, Economy};
use crate::error::EquilibriumError;
use crate::linalg::{self, PreferenceInverses};

/// A consumer's optimal choice at given prices.
#[derive(Debug, Clone, PartialEq)]
pub struct Demand {
    /// Utility-maximizing bundle.
    pub allocation: DVector<f64>,
    /// Marginal utility of wealth at that bundle.
    pub marginal_utility: f64,
}

/// `pᵗ (ΠᵗΠ)⁻¹ p`, the denominator shared by every consumer's multiplier.
pub(crate) fn price_quadratic(inverses: &PreferenceInverses, prices: &DVector<f64>) -> f64 {
    prices.dot(&(&inverses.slope * prices))
}

/// Demand of one consumer given precomputed inverses and quadratic form.
pub(crate) fn demand_at(
    inverses: &PreferenceInverses,
    consumer: &Consumer,
    prices: &DVector<f64>,
    quadratic: f64,
) -> Demand {
    let satiation = &inverses.preferences_inv * &consumer.bliss;
    let marginal_utility =
        (-consumer.transfer + prices.dot(&(&satiation - &consumer.endowment))) / quadratic;
    let allocation = satiation - (&inverses.slope * prices) * marginal_utility;
    Demand {
        allocation,
        marginal_utility,
    }
}

fn check_prices(economy: &Economy, prices: &DVector<f64>) -> Result<(), EquilibriumError> {
    if prices.len() != economy.goods() {
        return Err(EquilibriumError::DimensionMismatch {
            what: "price vector",
            expected: economy.goods(),
            actual: prices.len(),
        });
    }
    linalg::ensure_finite(prices.iter(), "price vector")
}

fn quadratic_for(
    inverses: &PreferenceInverses,
    prices: &DVector<f64>,
) -> Result<f64, EquilibriumError> {
    let quadratic = price_quadratic(inverses, prices);
    if quadratic == 0.0 {
        return Err(EquilibriumError::DegenerateNormalization);
    }
    Ok(quadratic)
}

/// Marshallian demand of `consumer` at `prices`.
///
/// # Errors
///
/// [`EquilibriumError::ConsumerOutOfRange`], a price-vector
/// [`EquilibriumError::DimensionMismatch`], [`EquilibriumError::SingularMatrix`]
/// for a singular `Π`, or [`EquilibriumError::DegenerateNormalization`] for
/// an all-zero price vector.
pub fn demand(
    economy: &Economy,
    consumer: ConsumerId,
    prices: &DVector<f64>,
) -> Result<Demand, EquilibriumError> {
    let data = economy.consumer(consumer)?;
    check_prices(economy, prices)?;
    let inverses = PreferenceInverses::compute(economy.preferences())?;
    let quadratic = quadratic_for(&inverses, prices)?;
    Ok(demand_at(&inverses, data, prices, quadratic))
}

/// Aggregate excess demand `Σ c_i(p) − Σ e_i`.
///
/// Vanishes at the equilibrium price vector.
///
/// # Errors
///
/// As for [`demand`], minus the consumer lookup.
pub fn excess_demand(
    economy: &Economy,
    prices: &DVector<f64>,
) -> Result<DVector<f64>, EquilibriumError> {
    check_prices(economy, prices)?;
    let inverses = PreferenceInverses::compute(economy.preferences())?;
    let quadratic = quadratic_for(&inverses, prices)?;
    let total = economy
        .consumers()
        .iter()
        .map(|c| demand_at(&inverses, c, prices, quadratic).allocation)
        .fold(DVector::zeros(economy.goods()), |acc, c| acc + c);
    Ok(total - economy.aggregate_endowment())
}

/// Quadratic utility `-½ ‖Π c − b_i‖²` of `allocation` for `consumer`.
///
/// # Errors
///
/// [`EquilibriumError::ConsumerOutOfRange`] or an allocation
/// [`EquilibriumError::DimensionMismatch`].
pub fn utility(
    economy: &Economy,
    consumer: ConsumerId,
    allocation: &DVector<f64>,
) -> Result<f64, EquilibriumError> {
    let data = economy.consumer(consumer)?;
    if allocation.len() != economy.goods() {
        return Err(EquilibriumError::DimensionMismatch {
            what: "allocation",
            expected: economy.goods(),
            actual: allocation.len(),
        });
    }
    Ok(utility_of(economy, data, allocation))
}

pub(crate) fn utility_of(economy: &Economy, consumer: &Consumer, allocation: &DVector<f64>) -> f64 {
    let gap = economy.preferences() * allocation - &consumer.bliss;
    -0.5 * gap.norm_squared()
}
