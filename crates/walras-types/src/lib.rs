//! Shared type definitions for the Walras exchange-economy solver.
//!
//! Scenario inputs and solve reports live here so the solver, the runner
//! and any downstream consumer of the JSON reports agree on one schema.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe consumer and good indices
//! - [`enums`] -- Failure kinds and scenario status
//! - [`structs`] -- Economy specs and equilibrium reports

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{FailureKind, ScenarioStatus};
pub use ids::{ConsumerId, GoodId};
pub use structs::{
    ConsumerOutcome, ConsumerSpec, EconomySpec, EquilibriumReport, FailureReport, ScenarioReport,
};
