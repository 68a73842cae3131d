//! First stage: how many bikes each station should hold
//!
//! The first stage decides a target allocation `x_i` per station and whether
//! redistributing is worth doing at all.
//!
//! ## MILP Formulation
//!
//! ```text
//! maximize    Σ_i b_i · x_i  −  c · Σ_i abs_i
//!             └──────────┘     └──────────┘
//!             service benefit   moving cost
//!
//! subject to:
//!   x_i ≤ capacity_i                      Dock capacity
//!   abs_i ≥ x_i − current_i               Deviation, bikes added
//!   abs_i ≥ current_i − x_i               Deviation, bikes removed
//!   Σ x_i ≤ fleet_cap                     Fleet size
//!   net ≥  e − M(1 − w)                   Switch on only for positive net
//!   net ≤ −e + M·w                        Switch off only for negative net
//!   x_i, abs_i ∈ ℤ≥0,  w ∈ {0,1}
//! ```
//!
//! Because `c > 0`, the optimiser pushes each `abs_i` down onto
//! `|x_i − current_i|`. The benefit `b_i` of a station comes from the
//! injected [`rebal_core::BenefitScoring`] keyed by its demand category.
//!
//! ## Big-M Switch
//!
//! The switch `w` can only be 1 when the net benefit is at least `e`, and
//! only 0 when it is at most `−e`. `M` must dominate every reachable net
//! value; [`recommended_big_m`] computes a safe value from the inputs and a
//! smaller `M` is logged at `warn` level.

mod problem;
mod solution;
mod solver;

pub use problem::{recommended_big_m, FirstStageParams, FleetCap};
pub use solution::FirstStageSolution;
pub use solver::{build_first_stage, solve_first_stage, FirstStageModel, FIRST_STAGE_MODEL};
