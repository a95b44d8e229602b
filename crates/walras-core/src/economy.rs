//! Economy construction and validation.
//!
//! An [`Economy`] is the validated tuple `(Π, {b_i}, {e_i}, {W_i})`. It is
//! immutable once built: re-solving with different data means building a
//! new value, usually through [`Economy::to_builder`].
//!
//! Validation runs in a fixed order:
//!
//! 1. Shapes and finiteness of every input.
//! 2. The non-satiation guard, consumer by consumer:
//!    `min(b_i / max(Π e_i)) > threshold`.
//! 3. Zero-sum wealth transfers, when transfers were supplied.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use walras_types::{ConsumerId, EconomySpec};

use crate::error::EquilibriumError;
use crate::linalg;

/// Default margin by which bliss points must dominate transformed endowments.
pub const DEFAULT_NONSATIATION_THRESHOLD: f64 = 1.5;

/// Default absolute tolerance on `Σ W_i`.
pub const DEFAULT_WEALTH_TOLERANCE: f64 = 1e-9;

/// One consumer's data inside a validated economy.
#[derive(Debug, Clone, PartialEq)]
pub struct Consumer {
    /// Bliss point `b_i`.
    pub bliss: DVector<f64>,
    /// Endowment `e_i`.
    pub endowment: DVector<f64>,
    /// Wealth transfer `W_i` received by the consumer.
    pub transfer: f64,
}

/// A validated pure-exchange economy.
#[derive(Debug, Clone, PartialEq)]
pub struct Economy {
    preferences: DMatrix<f64>,
    consumers: Vec<Consumer>,
    threshold: f64,
    wealth_tolerance: f64,
}

impl Economy {
    /// Start building an economy around the preference matrix `Π`.
    pub fn builder(preferences: DMatrix<f64>) -> EconomyBuilder {
        EconomyBuilder::new(preferences)
    }

    /// Build from a serializable spec with the given validation settings.
    ///
    /// Transfers are always supplied (zero when a consumer omits them), so
    /// the zero-sum check always runs.
    ///
    /// # Errors
    ///
    /// Any construction error from [`EconomyBuilder::build`], plus shape and
    /// finiteness errors for the raw rows.
    pub fn from_spec(
        spec: &EconomySpec,
        threshold: f64,
        wealth_tolerance: f64,
    ) -> Result<Self, EquilibriumError> {
        let preferences = linalg::square_from_rows(&spec.preferences, "preference matrix")?;
        let n = preferences.nrows();
        let mut builder = EconomyBuilder::new(preferences)
            .threshold(threshold)
            .wealth_tolerance(wealth_tolerance)
            .transfers(spec.transfers());
        for consumer in &spec.consumers {
            let bliss = linalg::vector_of_len(&consumer.bliss, n, "bliss point")?;
            let endowment = linalg::vector_of_len(&consumer.endowment, n, "endowment")?;
            builder = builder.consumer(bliss, endowment);
        }
        builder.build()
    }

    /// The shared preference matrix `Π`.
    pub const fn preferences(&self) -> &DMatrix<f64> {
        &self.preferences
    }

    /// All consumers, in index order.
    pub fn consumers(&self) -> &[Consumer] {
        &self.consumers
    }

    /// Look up one consumer.
    ///
    /// # Errors
    ///
    /// Returns [`EquilibriumError::ConsumerOutOfRange`] for an unknown index.
    pub fn consumer(&self, id: ConsumerId) -> Result<&Consumer, EquilibriumError> {
        self.consumers
            .get(id.into_inner())
            .ok_or(EquilibriumError::ConsumerOutOfRange {
                consumer: id,
                count: self.consumers.len(),
            })
    }

    /// Number of goods `n`.
    pub fn goods(&self) -> usize {
        self.preferences.nrows()
    }

    /// Number of consumers `m`.
    pub fn consumer_count(&self) -> usize {
        self.consumers.len()
    }

    /// The non-satiation threshold this economy was validated against.
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// The tolerance this economy's transfers were checked against.
    pub const fn wealth_tolerance(&self) -> f64 {
        self.wealth_tolerance
    }

    /// Aggregate bliss point `Σ b_i`.
    pub fn aggregate_bliss(&self) -> DVector<f64> {
        linalg::sum_vectors(self.consumers.iter().map(|c| &c.bliss), self.goods())
    }

    /// Aggregate endowment `Σ e_i`.
    pub fn aggregate_endowment(&self) -> DVector<f64> {
        linalg::sum_vectors(self.consumers.iter().map(|c| &c.endowment), self.goods())
    }

    /// Wealth transfers in consumer order.
    pub fn transfers(&self) -> Vec<f64> {
        self.consumers.iter().map(|c| c.transfer).collect()
    }

    /// Collapse the economy into a single representative consumer holding
    /// the aggregate bliss point and endowment, with no transfer.
    ///
    /// # Errors
    ///
    /// Returns [`EquilibriumError::NonSatiationViolation`] if the aggregate
    /// consumer fails the guard under this economy's threshold.
    pub fn representative(&self) -> Result<Self, EquilibriumError> {
        EconomyBuilder::new(self.preferences.clone())
            .threshold(self.threshold)
            .wealth_tolerance(self.wealth_tolerance)
            .consumer(self.aggregate_bliss(), self.aggregate_endowment())
            .build()
    }

    /// A builder pre-populated with this economy's data, for re-solving
    /// with modified inputs.
    pub fn to_builder(&self) -> EconomyBuilder {
        let mut builder = EconomyBuilder::new(self.preferences.clone())
            .threshold(self.threshold)
            .wealth_tolerance(self.wealth_tolerance)
            .transfers(self.transfers());
        for consumer in &self.consumers {
            builder = builder.consumer(consumer.bliss.clone(), consumer.endowment.clone());
        }
        builder
    }
}

/// Builder for [`Economy`].
///
/// Consumers are appended in index order. Transfers are optional; when
/// omitted every consumer receives zero and the zero-sum check is skipped.
#[derive(Debug, Clone)]
pub struct EconomyBuilder {
    preferences: DMatrix<f64>,
    bliss_points: Vec<DVector<f64>>,
    endowments: Vec<DVector<f64>>,
    transfers: Option<Vec<f64>>,
    threshold: f64,
    wealth_tolerance: f64,
}

impl EconomyBuilder {
    /// Start with the preference matrix and default settings.
    pub fn new(preferences: DMatrix<f64>) -> Self {
        Self {
            preferences,
            bliss_points: Vec::new(),
            endowments: Vec::new(),
            transfers: None,
            threshold: DEFAULT_NONSATIATION_THRESHOLD,
            wealth_tolerance: DEFAULT_WEALTH_TOLERANCE,
        }
    }

    /// Append a consumer.
    #[must_use]
    pub fn consumer(mut self, bliss: DVector<f64>, endowment: DVector<f64>) -> Self {
        self.bliss_points.push(bliss);
        self.endowments.push(endowment);
        self
    }

    /// Replace all bliss points, keeping the consumer order.
    #[must_use]
    pub fn bliss_points(mut self, bliss_points: Vec<DVector<f64>>) -> Self {
        self.bliss_points = bliss_points;
        self
    }

    /// Replace all endowments, keeping the consumer order.
    #[must_use]
    pub fn endowments(mut self, endowments: Vec<DVector<f64>>) -> Self {
        self.endowments = endowments;
        self
    }

    /// Supply wealth transfers, one per consumer.
    #[must_use]
    pub fn transfers(mut self, transfers: Vec<f64>) -> Self {
        self.transfers = Some(transfers);
        self
    }

    /// Set the non-satiation threshold.
    #[must_use]
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the tolerance on `Σ W_i`.
    #[must_use]
    pub fn wealth_tolerance(mut self, tolerance: f64) -> Self {
        self.wealth_tolerance = tolerance;
        self
    }

    /// Validate and build the economy.
    ///
    /// # Errors
    ///
    /// Shape and finiteness errors first, then
    /// [`EquilibriumError::NonSatiationViolation`], then
    /// [`EquilibriumError::InvalidWealthDistribution`].
    pub fn build(self) -> Result<Economy, EquilibriumError> {
        let n = self.preferences.nrows();
        let m = self.bliss_points.len();
        if n == 0 || m == 0 {
            return Err(EquilibriumError::EmptyEconomy);
        }
        if self.preferences.ncols() != n {
            return Err(EquilibriumError::DimensionMismatch {
                what: "preference matrix columns",
                expected: n,
                actual: self.preferences.ncols(),
            });
        }
        if self.endowments.len() != m {
            return Err(EquilibriumError::DimensionMismatch {
                what: "endowment count",
                expected: m,
                actual: self.endowments.len(),
            });
        }
        if let Some(transfers) = &self.transfers {
            if transfers.len() != m {
                return Err(EquilibriumError::DimensionMismatch {
                    what: "transfer count",
                    expected: m,
                    actual: transfers.len(),
                });
            }
            linalg::ensure_finite(transfers.iter(), "transfers")?;
        }
        linalg::ensure_finite(self.preferences.iter(), "preference matrix")?;
        for (bliss, endowment) in self.bliss_points.iter().zip(&self.endowments) {
            check_len(bliss, n, "bliss point")?;
            check_len(endowment, n, "endowment")?;
            linalg::ensure_finite(bliss.iter(), "bliss point")?;
            linalg::ensure_finite(endowment.iter(), "endowment")?;
        }

        for (i, (bliss, endowment)) in self.bliss_points.iter().zip(&self.endowments).enumerate() {
            let ratio = nonsatiation_ratio(&self.preferences, bliss, endowment);
            debug!(consumer = i, ratio, threshold = self.threshold, "non-satiation check");
            if ratio <= self.threshold {
                return Err(EquilibriumError::NonSatiationViolation {
                    consumer: ConsumerId(i),
                    ratio,
                    threshold: self.threshold,
                });
            }
        }

        if let Some(transfers) = &self.transfers {
            let sum: f64 = transfers.iter().sum();
            if sum.abs() > self.wealth_tolerance {
                return Err(EquilibriumError::InvalidWealthDistribution {
                    sum,
                    tolerance: self.wealth_tolerance,
                });
            }
        }

        let transfers = self.transfers.unwrap_or_else(|| vec![0.0; m]);
        let consumers = self
            .bliss_points
            .into_iter()
            .zip(self.endowments)
            .zip(transfers)
            .map(|((bliss, endowment), transfer)| Consumer {
                bliss,
                endowment,
                transfer,
            })
            .collect();

        Ok(Economy {
            preferences: self.preferences,
            consumers,
            threshold: self.threshold,
            wealth_tolerance: self.wealth_tolerance,
        })
    }
}

/// Build an economy from positional data.
///
/// `transfers` of `None` means every consumer receives zero.
///
/// # Errors
///
/// See [`EconomyBuilder::build`].
pub fn build_economy(
    preferences: DMatrix<f64>,
    bliss_points: Vec<DVector<f64>>,
    endowments: Vec<DVector<f64>>,
    transfers: Option<Vec<f64>>,
    threshold: f64,
) -> Result<Economy, EquilibriumError> {
    let builder = EconomyBuilder::new(preferences)
        .bliss_points(bliss_points)
        .endowments(endowments)
        .threshold(threshold);
    match transfers {
        Some(transfers) => builder.transfers(transfers).build(),
        None => builder.build(),
    }
}

/// `min_k(b[k] / max(Π e))`.
///
/// Division by a zero scale yields an infinite ratio, which passes any
/// finite threshold. `0 / 0` entries are skipped by the `min` fold.
pub fn nonsatiation_ratio(
    preferences: &DMatrix<f64>,
    bliss: &DVector<f64>,
    endowment: &DVector<f64>,
) -> f64 {
    let scale = (preferences * endowment).max();
    bliss.iter().map(|b| b / scale).fold(f64::INFINITY, f64::min)
}

fn check_len(v: &DVector<f64>, n: usize, what: &'static str) -> Result<(), EquilibriumError> {
    if v.len() == n {
        Ok(())
    } else {
        Err(EquilibriumError::DimensionMismatch {
            what,
            expected: n,
            actual: v.len(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::indexing_slicing)]
mod tests {
    use approx::assert_relative_eq;

    use walras_types::ConsumerSpec;

    use super::*;

    fn v(values: &[f64]) -> DVector<f64> {
        DVector::from_column_slice(values)
    }

    fn symmetric_builder() -> EconomyBuilder {
        Economy::builder(DMatrix::identity(2, 2))
            .consumer(v(&[5.0, 5.0]), v(&[0.0, 2.0]))
            .consumer(v(&[5.0, 5.0]), v(&[2.0, 0.0]))
    }

    #[test]
    fn builds_symmetric_economy() {
        let economy = symmetric_builder().build().unwrap();
        assert_eq!(economy.goods(), 2);
        assert_eq!(economy.consumer_count(), 2);
        assert_eq!(economy.transfers(), vec![0.0, 0.0]);
        assert_relative_eq!(economy.aggregate_bliss(), v(&[10.0, 10.0]));
        assert_relative_eq!(economy.aggregate_endowment(), v(&[2.0, 2.0]));
    }

    #[test]
    fn ratio_matches_definition() {
        // Π e = (0, 2), max 2, b / 2 = (2.5, 2.5).
        let ratio = nonsatiation_ratio(&DMatrix::identity(2, 2), &v(&[5.0, 5.0]), &v(&[0.0, 2.0]));
        assert_relative_eq!(ratio, 2.5);
    }

    #[test]
    fn bliss_too_close_fails_nonsatiation() {
        let err = Economy::builder(DMatrix::identity(2, 2))
            .consumer(v(&[5.0, 5.0]), v(&[0.0, 2.0]))
            .consumer(v(&[2.5, 2.5]), v(&[2.0, 0.0]))
            .build()
            .unwrap_err();
        match err {
            EquilibriumError::NonSatiationViolation {
                consumer,
                ratio,
                threshold,
            } => {
                assert_eq!(consumer, ConsumerId(1));
                assert_relative_eq!(ratio, 1.25);
                assert_relative_eq!(threshold, DEFAULT_NONSATIATION_THRESHOLD);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn ratio_equal_to_threshold_fails() {
        // 3 / 2 == 1.5 exactly: the guard requires strictly greater.
        let err = Economy::builder(DMatrix::identity(2, 2))
            .consumer(v(&[3.0, 3.0]), v(&[0.0, 2.0]))
            .build()
            .unwrap_err();
        assert!(matches!(err, EquilibriumError::NonSatiationViolation { .. }));
    }

    #[test]
    fn custom_threshold_is_honoured() {
        let economy = Economy::builder(DMatrix::identity(2, 2))
            .consumer(v(&[3.0, 3.0]), v(&[0.0, 2.0]))
            .threshold(1.0)
            .build();
        assert!(economy.is_ok());
    }

    #[test]
    fn non_zero_sum_transfers_fail() {
        let err = symmetric_builder()
            .transfers(vec![1.0, -0.5])
            .build()
            .unwrap_err();
        match err {
            EquilibriumError::InvalidWealthDistribution { sum, .. } => assert_relative_eq!(sum, 0.5),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn transfers_within_tolerance_pass() {
        let economy = symmetric_builder()
            .transfers(vec![0.1 + 0.2, -0.3])
            .build()
            .unwrap();
        assert_relative_eq!(economy.consumers()[0].transfer, 0.3, epsilon = 1e-12);
    }

    #[test]
    fn nonsatiation_is_checked_before_wealth() {
        let err = Economy::builder(DMatrix::identity(2, 2))
            .consumer(v(&[1.0, 1.0]), v(&[0.0, 2.0]))
            .transfers(vec![5.0])
            .build()
            .unwrap_err();
        assert!(matches!(err, EquilibriumError::NonSatiationViolation { .. }));
    }

    #[test]
    fn mismatched_counts_fail() {
        let err = Economy::builder(DMatrix::identity(2, 2))
            .bliss_points(vec![v(&[5.0, 5.0]), v(&[5.0, 5.0])])
            .endowments(vec![v(&[0.0, 2.0])])
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            EquilibriumError::DimensionMismatch {
                what: "endowment count",
                ..
            }
        ));

        let err = symmetric_builder().transfers(vec![0.0]).build().unwrap_err();
        assert!(matches!(
            err,
            EquilibriumError::DimensionMismatch {
                what: "transfer count",
                ..
            }
        ));
    }

    #[test]
    fn wrong_vector_length_fails() {
        let err = Economy::builder(DMatrix::identity(2, 2))
            .consumer(v(&[5.0, 5.0, 5.0]), v(&[0.0, 2.0]))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            EquilibriumError::DimensionMismatch {
                what: "bliss point",
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn no_consumers_is_empty() {
        let err = Economy::builder(DMatrix::identity(2, 2)).build().unwrap_err();
        assert!(matches!(err, EquilibriumError::EmptyEconomy));
    }

    #[test]
    fn infinite_bliss_is_rejected() {
        let err = Economy::builder(DMatrix::identity(2, 2))
            .consumer(v(&[f64::INFINITY, 5.0]), v(&[0.0, 2.0]))
            .build()
            .unwrap_err();
        assert!(matches!(err, EquilibriumError::NonFiniteInput { what: "bliss point" }));
    }

    #[test]
    fn positional_constructor_matches_builder() {
        let economy = build_economy(
            DMatrix::identity(2, 2),
            vec![v(&[5.0, 5.0]), v(&[5.0, 5.0])],
            vec![v(&[0.0, 2.0]), v(&[2.0, 0.0])],
            None,
            DEFAULT_NONSATIATION_THRESHOLD,
        )
        .unwrap();
        assert_eq!(economy, symmetric_builder().build().unwrap());
    }

    #[test]
    fn to_builder_round_trips() {
        let economy = symmetric_builder()
            .transfers(vec![0.5, -0.5])
            .threshold(1.2)
            .build()
            .unwrap();
        let rebuilt = economy.to_builder().build().unwrap();
        assert_eq!(rebuilt, economy);
    }

    #[test]
    fn representative_aggregates_consumers() {
        let economy = symmetric_builder().build().unwrap();
        let rep = economy.representative().unwrap();
        assert_eq!(rep.consumer_count(), 1);
        assert_relative_eq!(rep.consumers()[0].bliss, v(&[10.0, 10.0]));
        assert_relative_eq!(rep.consumers()[0].endowment, v(&[2.0, 2.0]));
    }

    #[test]
    fn consumer_lookup_out_of_range() {
        let economy = symmetric_builder().build().unwrap();
        assert!(economy.consumer(ConsumerId(1)).is_ok());
        let err = economy.consumer(ConsumerId(2)).unwrap_err();
        assert!(matches!(
            err,
            EquilibriumError::ConsumerOutOfRange { count: 2, .. }
        ));
    }

    #[test]
    fn from_spec_builds_and_validates_shapes() {
        let spec = EconomySpec {
            preferences: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            consumers: vec![
                ConsumerSpec {
                    bliss: vec![5.0, 5.0],
                    endowment: vec![0.0, 2.0],
                    transfer: 0.5,
                },
                ConsumerSpec {
                    bliss: vec![5.0, 5.0],
                    endowment: vec![2.0, 0.0],
                    transfer: -0.5,
                },
            ],
        };
        let economy = Economy::from_spec(&spec, 1.5, 1e-9).unwrap();
        assert_eq!(economy.transfers(), vec![0.5, -0.5]);

        let mut bad = spec;
        bad.consumers[0].endowment = vec![0.0];
        let err = Economy::from_spec(&bad, 1.5, 1e-9).unwrap_err();
        assert!(matches!(
            err,
            EquilibriumError::DimensionMismatch {
                what: "endowment",
                ..
            }
        ));
    }
}
