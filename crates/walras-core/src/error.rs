//! Error types for the `walras-core` crate.
//!
//! Every fallible operation returns [`EquilibriumError`]. Each variant maps
//! onto one [`FailureKind`] so callers can branch on what went wrong.

use walras_types::{ConsumerId, FailureKind, GoodId};

use crate::solver::Equilibrium;

/// Errors raised while building, solving or querying an economy.
#[derive(Debug, thiserror::Error)]
pub enum EquilibriumError {
    /// The economy has no consumers or a 0x0 preference matrix.
    #[error("economy must have at least one good and one consumer")]
    EmptyEconomy,

    /// A matrix or vector has the wrong shape.
    #[error("dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Which input is malformed.
        what: &'static str,
        /// The required length.
        expected: usize,
        /// The supplied length.
        actual: usize,
    },

    /// An input contains NaN or an infinity.
    #[error("non-finite value in {what}")]
    NonFiniteInput {
        /// Which input contains the value.
        what: &'static str,
    },

    /// The consumer's bliss point is not far enough above `Π e_i`.
    #[error(
        "bliss point of {consumer} is too close to its transformed endowment: \
         ratio {ratio} must exceed {threshold}"
    )]
    NonSatiationViolation {
        /// The offending consumer.
        consumer: ConsumerId,
        /// `min(b_i / max(Π e_i))` as computed.
        ratio: f64,
        /// The threshold the ratio had to exceed.
        threshold: f64,
    },

    /// Wealth transfers do not sum to zero.
    #[error("wealth transfers must sum to zero, got {sum} (tolerance {tolerance})")]
    InvalidWealthDistribution {
        /// The actual sum of transfers.
        sum: f64,
        /// The accepted absolute deviation from zero.
        tolerance: f64,
    },

    /// A matrix that must be inverted is singular.
    #[error("{which} is not invertible")]
    SingularMatrix {
        /// Which matrix failed to invert.
        which: &'static str,
    },

    /// The numeraire price (or the price quadratic form) is zero, or the
    /// computation overflowed to a non-finite value.
    #[error("cannot normalize prices: numeraire component is zero or not finite")]
    DegenerateNormalization,

    /// The equilibrium asks some consumer to hold a negative quantity.
    #[error("no feasible equilibrium: {consumer} would consume {value} of {good}")]
    InfeasibleAllocation {
        /// First consumer found with a negative component.
        consumer: ConsumerId,
        /// The good with the negative component.
        good: GoodId,
        /// The negative quantity.
        value: f64,
        /// The full (invalid) equilibrium for diagnostics.
        equilibrium: Box<Equilibrium>,
    },

    /// A query named a consumer the economy does not contain.
    #[error("{consumer} is out of range for an economy of {count} consumers")]
    ConsumerOutOfRange {
        /// The requested consumer.
        consumer: ConsumerId,
        /// Number of consumers in the economy.
        count: usize,
    },
}

impl EquilibriumError {
    /// The serializable kind of this error.
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::EmptyEconomy => FailureKind::EmptyEconomy,
            Self::DimensionMismatch { .. } => FailureKind::DimensionMismatch,
            Self::NonFiniteInput { .. } => FailureKind::NonFiniteInput,
            Self::NonSatiationViolation { .. } => FailureKind::NonSatiationViolation,
            Self::InvalidWealthDistribution { .. } => FailureKind::InvalidWealthDistribution,
            Self::SingularMatrix { .. } => FailureKind::SingularMatrix,
            Self::DegenerateNormalization => FailureKind::DegenerateNormalization,
            Self::InfeasibleAllocation { .. } => FailureKind::InfeasibleAllocation,
            Self::ConsumerOutOfRange { .. } => FailureKind::ConsumerOutOfRange,
        }
    }

    /// The consumer the failure is attributable to, if any.
    pub const fn consumer(&self) -> Option<ConsumerId> {
        match self {
            Self::NonSatiationViolation { consumer, .. }
            | Self::InfeasibleAllocation { consumer, .. }
            | Self::ConsumerOutOfRange { consumer, .. } => Some(*consumer),
            _ => None,
        }
    }

    /// The good the failure is attributable to, if any.
    pub const fn good(&self) -> Option<GoodId> {
        match self {
            Self::InfeasibleAllocation { good, .. } => Some(*good),
            _ => None,
        }
    }
}
