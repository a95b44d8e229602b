//! Enumeration types shared between the solver and its reports.

use serde::{Deserialize, Serialize};

/// The distinguishable reasons an economy can fail to build or solve.
///
/// Every error the solver produces maps onto exactly one kind, so callers
/// and report consumers can branch on the failure without parsing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The economy has no consumers or no goods.
    EmptyEconomy,
    /// Matrix or vector shapes disagree.
    DimensionMismatch,
    /// An input contains NaN or an infinity.
    NonFiniteInput,
    /// A bliss point is not far enough above the transformed endowment.
    NonSatiationViolation,
    /// Wealth transfers do not sum to zero.
    InvalidWealthDistribution,
    /// The preference matrix or its Gram matrix is not invertible.
    SingularMatrix,
    /// The unnormalized numeraire price is zero.
    DegenerateNormalization,
    /// Some consumer would consume a negative quantity of some good.
    InfeasibleAllocation,
    /// A query addressed a consumer the economy does not have.
    ConsumerOutOfRange,
}

impl FailureKind {
    /// Whether the failure happens while building the economy (as opposed
    /// to while solving or querying it).
    pub const fn is_construction(self) -> bool {
        matches!(
            self,
            Self::EmptyEconomy
                | Self::DimensionMismatch
                | Self::NonFiniteInput
                | Self::NonSatiationViolation
                | Self::InvalidWealthDistribution
        )
    }
}

/// Outcome of a single scenario run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    /// A valid, non-negative equilibrium was found.
    Solved,
    /// Construction or solving failed; see the attached failure.
    Failed,
}
