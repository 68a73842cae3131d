//! Solver engine interface
//!
//! An engine takes a [`MilpModel`] and a mandatory [`SolveConfig`] and
//! returns either an incumbent with its termination reason or a failure.
//! Engines keep no state between calls: every solve builds a fresh problem.

use super::model::MilpModel;
use crate::error::ModelBuildError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Time budget and optimality gap of one solve.
///
/// Every solve names its budget; there is no `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolveConfig {
    /// Wall-clock limit (seconds)
    pub time_limit_secs: f64,
    /// Accepted relative optimality gap, e.g. 0.01 for 1%
    pub relative_gap: f64,
}

impl SolveConfig {
    pub fn new(time_limit: Duration, relative_gap: f64) -> Result<Self, ModelBuildError> {
        let config = Self {
            time_limit_secs: time_limit.as_secs_f64(),
            relative_gap,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn time_limit(&self) -> Duration {
        Duration::from_secs_f64(self.time_limit_secs)
    }

    pub fn validate(&self) -> Result<(), ModelBuildError> {
        if !(self.time_limit_secs.is_finite() && self.time_limit_secs > 0.0) {
            return Err(ModelBuildError::invalid(
                "time_limit_secs",
                format!("must be positive and finite, got {}", self.time_limit_secs),
            ));
        }
        if !(self.relative_gap.is_finite() && (0.0..1.0).contains(&self.relative_gap)) {
            return Err(ModelBuildError::invalid(
                "relative_gap",
                format!("must lie in [0, 1), got {}", self.relative_gap),
            ));
        }
        Ok(())
    }
}

/// Why the engine stopped with an incumbent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineTermination {
    /// Search completed, incumbent proven optimal
    Optimal,
    /// Search stopped because the configured gap was reached
    GapLimit,
    /// Search stopped at the time limit
    TimeLimit,
}

/// Incumbent returned by an engine
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSolution {
    pub termination: EngineTermination,
    /// Variable values indexed by [`super::VarId`]
    pub values: Vec<f64>,
    /// Dual bound on the optimum, when the engine exposes one
    pub best_bound: Option<f64>,
    pub elapsed: Duration,
}

/// Engine-level failure
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineFailure {
    #[error("infeasible")]
    Infeasible,
    #[error("unbounded")]
    Unbounded,
    #[error("{0}")]
    Fault(String),
}

/// Generic MILP solving capability shared by both optimisers.
pub trait SolverEngine: Send + Sync {
    /// Engine name for logs and reports
    fn name(&self) -> &str;

    fn solve(
        &self,
        model: &MilpModel,
        config: &SolveConfig,
    ) -> Result<EngineSolution, EngineFailure>;
}

impl<E: SolverEngine + ?Sized> SolverEngine for &E {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn solve(
        &self,
        model: &MilpModel,
        config: &SolveConfig,
    ) -> Result<EngineSolution, EngineFailure> {
        (**self).solve(model, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_config_validation() {
        let config = SolveConfig::new(Duration::from_secs(300), 0.01).unwrap();
        assert_eq!(config.time_limit(), Duration::from_secs(300));

        assert!(SolveConfig::new(Duration::ZERO, 0.01).is_err());
        assert!(SolveConfig::new(Duration::from_secs(1), 1.5).is_err());
        assert!(SolveConfig {
            time_limit_secs: f64::INFINITY,
            relative_gap: 0.0
        }
        .validate()
        .is_err());
    }
}
