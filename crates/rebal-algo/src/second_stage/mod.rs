//! Second stage: weather-dependent relocation recourse
//!
//! Given the first-stage allocation, decide per weather scenario how many
//! bikes to move between every ordered station pair so that stock meets the
//! scenario's demand without overfilling docks.
//!
//! ## MILP Formulation
//!
//! ```text
//! minimize    Σ_k p_k Σ_{i≠j} c_ij · y_ijk  +  P_u Σ_ik unmet_ik  +  P_o Σ_ik over_ik
//!             └───────────────────────┘     └──────────────────────────────────┘
//!             expected transport cost            shortage and overflow penalties
//!
//! subject to:
//!   Σ_i x_ik ≤ Σ_i allocation_i                     Fleet per scenario
//!   x_ik = allocation_i + Σ_j y_jik − Σ_j y_ijk     Flow conservation (hard)
//!   x_ik + unmet_ik ≥ f(category_i) · cap_i · w_k   Demand (soft)
//!   x_ik − over_ik ≤ cap_i                          Capacity (soft)
//!   x, y, unmet, over ∈ ℤ≥0
//! ```
//!
//! `c_ij` is the distance matrix, `p_k` and `w_k` the scenario probability
//! and weather factor, `f` the injected [`rebal_core::DemandFractions`].
//! Penalties are not weighted by `p_k`. Since the penalty variables only
//! appear in the soft constraints, the model is always feasible: staying put
//! with every shortfall paid as a penalty is a valid plan.
//!
//! Reporting one scenario's relocations is a separate draw made through a
//! [`crate::ScenarioSampler`] after the solve.

mod problem;
mod solution;
mod solver;

pub use problem::SecondStageParams;
pub use solution::{ReportedPlan, Relocation, ScenarioPlan, SecondStageSolution, StationOutcome};
pub use solver::{build_second_stage, solve_second_stage, ScenarioVars, SecondStageModel, SECOND_STAGE_MODEL};
