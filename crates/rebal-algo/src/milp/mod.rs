//! Shared MILP model-building and solving discipline
//!
//! Both optimisation stages build a [`MilpModel`] and hand it to
//! [`solve_model`], which drives every solve through the same lifecycle:
//!
//! ```text
//! INIT ──▶ MODEL_BUILT ──▶ SOLVING ──┬──▶ OPTIMAL ─────────────┐
//!                                    ├──▶ SUBOPTIMAL_WITHIN_GAP ┼──▶ RESULT_EXTRACTED
//!                                    ├──▶ TIMEOUT_EXCEEDED_GAP ─┤
//!                                    ├──▶ INFEASIBLE ───────────┼──▶ RebalanceError
//!                                    └──▶ SOLVER_ERROR ─────────┘
//! ```
//!
//! A time-limited incumbent is only accepted when its relative gap is within
//! the configured limit. Engines that do not report a dual bound get one from
//! the LP relaxation of the same model, solved through the same engine.

mod engine;
mod good_lp_engine;
mod model;
mod status;

pub use engine::{EngineFailure, EngineSolution, EngineTermination, SolveConfig, SolverEngine};
pub use good_lp_engine::{GoodLpEngine, MilpBackend};
pub use model::{LinExpr, LinearConstraint, MilpModel, Objective, Relation, Sense, VarDecl, VarDomain, VarId};
pub use status::{relative_gap, solve_model, SolvePhase, SolveStatus, SolvedModel};
