//! Competitive equilibrium of pure-exchange economies with quadratic
//! preferences.
//!
//! Consumers share a preference matrix `Π` and differ in bliss points
//! `b_i`, endowments `e_i` and lump-sum wealth transfers `W_i`. Utility is
//! `-½ ‖Π c − b_i‖²`, which makes the equilibrium a closed-form linear
//! algebra problem: no iteration, no tatonnement.
//!
//! # Modules
//!
//! - [`economy`] -- [`Economy`] construction and the non-satiation and
//!   zero-sum-transfer checks.
//! - [`solver`] -- [`solve_equilibrium`] and the [`Equilibrium`] it returns.
//! - [`demand`] -- Demand and excess demand at arbitrary prices, utility.
//! - [`clearing`] -- Post-solve market-clearing and budget verification.
//! - [`config`] -- YAML scenario files for batch runs.
//! - [`linalg`] -- LU-based inverses and shape-checked conversions.
//! - [`error`] -- [`EquilibriumError`], one variant per failure kind.
//!
//! # Usage
//!
//! ```
//! use nalgebra::{DMatrix, DVector};
//! use walras_core::{Economy, solve_equilibrium};
//!
//! let economy = Economy::builder(DMatrix::identity(2, 2))
//!     .consumer(DVector::from_vec(vec![5.0, 5.0]), DVector::from_vec(vec![0.0, 2.0]))
//!     .consumer(DVector::from_vec(vec![5.0, 5.0]), DVector::from_vec(vec![2.0, 0.0]))
//!     .build()
//!     .ok();
//!
//! let equilibrium = economy.as_ref().and_then(|e| solve_equilibrium(e).ok());
//! let prices = equilibrium.as_ref().map(|eq| eq.prices().iter().copied().collect::<Vec<_>>());
//! assert_eq!(prices, Some(vec![1.0, 1.0]));
//! ```

// nalgebra's matrix operators are not on clippy's known-safe list.
#![allow(clippy::arithmetic_side_effects)]

pub mod clearing;
pub mod config;
pub mod demand;
pub mod economy;
pub mod error;
pub mod linalg;
pub mod solver;

// Re-export primary types at crate root.
pub use clearing::{BudgetViolation, ClearingAnomaly, ClearingResult, verify_budgets, verify_market_clearing};
pub use config::{ConfigError, WalrasConfig};
pub use demand::{Demand, demand, excess_demand, utility};
pub use economy::{Consumer, Economy, EconomyBuilder, build_economy};
pub use error::EquilibriumError;
pub use solver::{Equilibrium, solve_equilibrium};
