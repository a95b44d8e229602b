//! Serializable scenario inputs and solve reports.
//!
//! These are plain data shapes with `Vec<f64>` payloads. The solver crate
//! converts them to and from its dense matrix types; nothing here knows
//! how an equilibrium is computed.

use serde::{Deserialize, Serialize};

use crate::enums::{FailureKind, ScenarioStatus};
use crate::ids::{ConsumerId, GoodId};

/// One consumer as supplied by a caller or a scenario file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumerSpec {
    /// Bliss point: the unconstrained utility maximizer, one entry per good.
    pub bliss: Vec<f64>,
    /// Initial holdings, one non-negative entry per good.
    pub endowment: Vec<f64>,
    /// Lump-sum wealth transfer received (negative means paid).
    #[serde(default)]
    pub transfer: f64,
}

/// A full economy description: shared preferences plus consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomySpec {
    /// The n-by-n preference matrix, row-major.
    pub preferences: Vec<Vec<f64>>,
    /// Consumers in index order.
    pub consumers: Vec<ConsumerSpec>,
}

impl EconomySpec {
    /// Number of goods implied by the preference matrix.
    pub fn goods(&self) -> usize {
        self.preferences.len()
    }

    /// Transfers in consumer order.
    pub fn transfers(&self) -> Vec<f64> {
        self.consumers.iter().map(|c| c.transfer).collect()
    }

    /// Whether any consumer carries a non-zero transfer.
    pub fn has_transfers(&self) -> bool {
        self.consumers.iter().any(|c| c.transfer != 0.0)
    }
}

/// Per-consumer part of a solved equilibrium.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumerOutcome {
    /// Which consumer this is.
    pub consumer: ConsumerId,
    /// Marginal utility of wealth (budget multiplier).
    pub marginal_utility: f64,
    /// Equilibrium consumption bundle, one entry per good.
    pub allocation: Vec<f64>,
    /// Quadratic utility attained at the allocation.
    pub utility: f64,
}

/// A solved equilibrium in serializable form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumReport {
    /// Normalized prices; the first entry is always 1.
    pub prices: Vec<f64>,
    /// One outcome per consumer, in consumer order.
    pub consumers: Vec<ConsumerOutcome>,
}

/// Why a scenario failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureReport {
    /// The failure kind.
    pub kind: FailureKind,
    /// Human-readable error message.
    pub message: String,
    /// Offending consumer, when the failure is attributable to one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer: Option<ConsumerId>,
    /// Offending good, when the failure is attributable to one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub good: Option<GoodId>,
    /// The invalid equilibrium, kept for diagnostics on infeasibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<EquilibriumReport>,
}

/// The result of running one named scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Scenario name from the configuration file.
    pub name: String,
    /// Whether an equilibrium was found.
    pub status: ScenarioStatus,
    /// The equilibrium, when solved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equilibrium: Option<EquilibriumReport>,
    /// The failure, when not solved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReport>,
}

impl ScenarioReport {
    /// Build a report for a solved scenario.
    pub fn solved(name: impl Into<String>, equilibrium: EquilibriumReport) -> Self {
        Self {
            name: name.into(),
            status: ScenarioStatus::Solved,
            equilibrium: Some(equilibrium),
            failure: None,
        }
    }

    /// Build a report for a failed scenario.
    pub fn failed(name: impl Into<String>, failure: FailureReport) -> Self {
        Self {
            name: name.into(),
            status: ScenarioStatus::Failed,
            equilibrium: None,
            failure: Some(failure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consumer_transfer_defaults_to_zero() {
        let json = r#"{"bliss":[5.0,5.0],"endowment":[0.0,2.0]}"#;
        let spec: Result<ConsumerSpec, _> = serde_json::from_str(json);
        let spec = spec.ok();
        assert_eq!(spec.as_ref().map(|s| s.transfer), Some(0.0));
        assert_eq!(spec.map(|s| s.bliss.len()), Some(2));
    }

    #[test]
    fn economy_spec_reports_transfers() {
        let spec = EconomySpec {
            preferences: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            consumers: vec![
                ConsumerSpec {
                    bliss: vec![5.0, 5.0],
                    endowment: vec![0.0, 2.0],
                    transfer: 0.0,
                },
                ConsumerSpec {
                    bliss: vec![5.0, 5.0],
                    endowment: vec![2.0, 0.0],
                    transfer: 0.0,
                },
            ],
        };
        assert_eq!(spec.goods(), 2);
        assert!(!spec.has_transfers());
        assert_eq!(spec.transfers(), vec![0.0, 0.0]);
    }

    #[test]
    fn failed_report_omits_equilibrium() {
        let report = ScenarioReport::failed(
            "bad",
            FailureReport {
                kind: FailureKind::SingularMatrix,
                message: "singular".to_owned(),
                consumer: None,
                good: None,
                diagnostic: None,
            },
        );
        let json = serde_json::to_string(&report).unwrap_or_default();
        assert!(json.contains("\"status\":\"failed\""));
        assert!(json.contains("\"singular_matrix\""));
        assert!(!json.contains("equilibrium"));
        assert!(!json.contains("consumer"));
    }

    #[test]
    fn solved_report_carries_prices() {
        let report = ScenarioReport::solved(
            "ok",
            EquilibriumReport {
                prices: vec![1.0, 1.0],
                consumers: vec![ConsumerOutcome {
                    consumer: ConsumerId(0),
                    marginal_utility: 4.0,
                    allocation: vec![1.0, 1.0],
                    utility: -16.0,
                }],
            },
        );
        assert_eq!(report.status, ScenarioStatus::Solved);
        let json = serde_json::to_string(&report).unwrap_or_default();
        let back: Result<ScenarioReport, _> = serde_json::from_str(&json);
        assert_eq!(back.ok(), Some(report));
    }
}
