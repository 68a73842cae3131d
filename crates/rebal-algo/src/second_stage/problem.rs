//! Second-stage parameters

use crate::error::ModelBuildError;
use crate::inputs::ensure_penalty;
use crate::milp::SolveConfig;
use serde::{Deserialize, Serialize};

/// Parameters of the recourse model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondStageParams {
    /// Cost per bike of demand left unserved
    pub penalty_unmet: f64,
    /// Cost per bike stocked above dock capacity
    pub penalty_over_capacity: f64,
    pub solver: SolveConfig,
}

impl SecondStageParams {
    pub fn new(penalty_unmet: f64, penalty_over_capacity: f64, solver: SolveConfig) -> Self {
        Self {
            penalty_unmet,
            penalty_over_capacity,
            solver,
        }
    }

    pub fn validate(&self) -> Result<(), ModelBuildError> {
        ensure_penalty("penalty_unmet", self.penalty_unmet)?;
        ensure_penalty("penalty_over_capacity", self.penalty_over_capacity)?;
        self.solver.validate()
    }
}
