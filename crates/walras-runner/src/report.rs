//! Turns one configured scenario into a [`ScenarioReport`].
//!
//! Construction and solve failures are captured in the report rather than
//! propagated, so one bad economy never stops a batch.

use tracing::{debug, info, warn};

use walras_core::config::{ScenarioConfig, SolverConfig};
use walras_core::{
    ClearingResult, Economy, EquilibriumError, solve_equilibrium, verify_budgets,
    verify_market_clearing,
};
use walras_types::{FailureKind, FailureReport, ScenarioReport};

/// Build, solve and verify one scenario.
pub fn run_scenario(scenario: &ScenarioConfig, solver: &SolverConfig) -> ScenarioReport {
    let economy = match scenario.build(solver) {
        Ok(economy) => economy,
        Err(err) => return failed(scenario, &err, None),
    };
    debug!(
        scenario = scenario.name,
        goods = economy.goods(),
        consumers = economy.consumer_count(),
        threshold = economy.threshold(),
        transfers = scenario.economy.has_transfers(),
        "economy built"
    );

    match solve_equilibrium(&economy) {
        Ok(equilibrium) => {
            if let ClearingResult::Anomaly(anomaly) =
                verify_market_clearing(&economy, &equilibrium, solver.clearing_tolerance)
            {
                warn!(scenario = scenario.name, %anomaly, "market clearing check failed");
            }
            for violation in verify_budgets(&economy, &equilibrium, solver.clearing_tolerance) {
                warn!(
                    scenario = scenario.name,
                    consumer = %violation.consumer,
                    spending = violation.spending,
                    wealth = violation.wealth,
                    "budget constraint violated"
                );
            }
            info!(
                scenario = scenario.name,
                prices = ?equilibrium.prices().as_slice(),
                "equilibrium solved"
            );
            ScenarioReport::solved(&scenario.name, equilibrium.to_report(&economy))
        }
        Err(err) => failed(scenario, &err, Some(&economy)),
    }
}

/// Which phase a failure of this kind comes from.
pub const fn failure_stage(kind: FailureKind) -> &'static str {
    if kind.is_construction() {
        "construction"
    } else {
        "solve"
    }
}

fn failed(
    scenario: &ScenarioConfig,
    err: &EquilibriumError,
    economy: Option<&Economy>,
) -> ScenarioReport {
    let kind = err.kind();
    warn!(
        scenario = scenario.name,
        stage = failure_stage(kind),
        ?kind,
        error = %err,
        "scenario failed"
    );
    ScenarioReport::failed(&scenario.name, failure_report(err, economy))
}

/// Describe a solver error, attaching the invalid equilibrium when there is one.
pub fn failure_report(err: &EquilibriumError, economy: Option<&Economy>) -> FailureReport {
    let diagnostic = match (err, economy) {
        (EquilibriumError::InfeasibleAllocation { equilibrium, .. }, Some(economy)) => {
            Some(equilibrium.to_report(economy))
        }
        _ => None,
    };
    FailureReport {
        kind: err.kind(),
        message: err.to_string(),
        consumer: err.consumer(),
        good: err.good(),
        diagnostic,
    }
}
