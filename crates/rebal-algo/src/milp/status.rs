//! Terminal solve status and its mapping from engine outcomes

use super::engine::{EngineFailure, EngineSolution, EngineTermination, SolveConfig, SolverEngine};
use super::model::{MilpModel, Sense};
use crate::error::RebalanceError;
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Tolerance for hard constraints when checking a time-limited incumbent
const INCUMBENT_TOLERANCE: f64 = 1e-6;

/// Lifecycle of one solve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolvePhase {
    Init,
    ModelBuilt,
    Solving,
    Terminal,
    ResultExtracted,
}

impl fmt::Display for SolvePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SolvePhase::Init => "init",
            SolvePhase::ModelBuilt => "model_built",
            SolvePhase::Solving => "solving",
            SolvePhase::Terminal => "terminal",
            SolvePhase::ResultExtracted => "result_extracted",
        };
        f.write_str(label)
    }
}

/// Terminal status of a solve
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SolveStatus {
    /// Proven optimal
    Optimal,
    /// Incumbent accepted within the configured relative gap
    SuboptimalWithinGap { gap: f64 },
    /// Time limit hit outside the gap (never usable)
    TimeoutExceededGap { gap: Option<f64> },
    Infeasible,
    SolverError,
}

impl SolveStatus {
    /// Whether the status carries a usable decision
    pub fn is_usable(&self) -> bool {
        matches!(
            self,
            SolveStatus::Optimal | SolveStatus::SuboptimalWithinGap { .. }
        )
    }

    pub fn is_proven_optimal(&self) -> bool {
        matches!(self, SolveStatus::Optimal)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "optimal"),
            SolveStatus::SuboptimalWithinGap { gap } => {
                write!(f, "suboptimal within gap ({:.4}%)", gap * 100.0)
            }
            SolveStatus::TimeoutExceededGap { .. } => write!(f, "timeout exceeded gap"),
            SolveStatus::Infeasible => write!(f, "infeasible"),
            SolveStatus::SolverError => write!(f, "solver error"),
        }
    }
}

/// Usable result of a solve
#[derive(Debug, Clone)]
pub struct SolvedModel {
    pub status: SolveStatus,
    /// Variable values, integer domains snapped to integers
    pub values: Vec<f64>,
    /// Objective evaluated at `values`
    pub objective: f64,
    pub solve_time: Duration,
}

/// Relative gap between an incumbent and a bound.
pub fn relative_gap(incumbent: f64, bound: f64) -> f64 {
    let diff = (bound - incumbent).abs();
    if diff <= 1e-9 {
        return 0.0;
    }
    diff / incumbent.abs().max(1e-9)
}

/// Solve a model and map the engine outcome onto [`SolveStatus`].
///
/// Only `Optimal` and `SuboptimalWithinGap` come back as `Ok`; every other
/// terminal status is returned as the matching [`RebalanceError`].
pub fn solve_model(
    engine: &dyn SolverEngine,
    model: &MilpModel,
    config: &SolveConfig,
) -> Result<SolvedModel, RebalanceError> {
    config.validate()?;
    let objective = model.objective()?.clone();
    debug!(model = model.name(), phase = %SolvePhase::ModelBuilt, vars = model.num_vars(), constraints = model.num_constraints());

    let started = Instant::now();
    debug!(model = model.name(), phase = %SolvePhase::Solving, engine = engine.name());
    let outcome = engine.solve(model, config);

    let (status, mut values) = match outcome {
        Ok(solution) => classify(engine, model, config, objective.sense, solution)?,
        Err(EngineFailure::Infeasible) => {
            warn!(model = model.name(), phase = %SolvePhase::Terminal, "infeasible");
            return Err(RebalanceError::SolverInfeasible {
                model: model.name().to_string(),
            });
        }
        Err(failure) => {
            warn!(model = model.name(), phase = %SolvePhase::Terminal, %failure, "solver error");
            return Err(RebalanceError::SolverError {
                model: model.name().to_string(),
                diagnostic: failure.to_string(),
            });
        }
    };

    if values.len() != model.num_vars() {
        return Err(RebalanceError::SolverError {
            model: model.name().to_string(),
            diagnostic: format!(
                "engine returned {} values for {} variables",
                values.len(),
                model.num_vars()
            ),
        });
    }

    model.snap_integral(&mut values);
    let objective_value = objective.expr.evaluate(&values);
    let solve_time = started.elapsed();
    info!(
        model = model.name(),
        phase = %SolvePhase::ResultExtracted,
        %status,
        objective = objective_value,
        solve_ms = solve_time.as_millis() as u64,
        "solve finished"
    );

    Ok(SolvedModel {
        status,
        values,
        objective: objective_value,
        solve_time,
    })
}

fn classify(
    engine: &dyn SolverEngine,
    model: &MilpModel,
    config: &SolveConfig,
    sense: Sense,
    solution: EngineSolution,
) -> Result<(SolveStatus, Vec<f64>), RebalanceError> {
    let objective = model.objective()?;
    let incumbent = objective.expr.evaluate(&solution.values);

    let status = match solution.termination {
        EngineTermination::Optimal => SolveStatus::Optimal,
        EngineTermination::GapLimit => {
            let gap = solution
                .best_bound
                .map(|bound| relative_gap(incumbent, bound))
                .unwrap_or(config.relative_gap);
            SolveStatus::SuboptimalWithinGap { gap }
        }
        EngineTermination::TimeLimit => {
            let feasible = model
                .violations(&solution.values, INCUMBENT_TOLERANCE)
                .is_empty();
            let gap = if feasible {
                solution
                    .best_bound
                    .or_else(|| relaxation_bound(engine, model, config))
                    .map(|bound| directed_gap(sense, incumbent, bound))
            } else {
                None
            };
            match gap {
                Some(gap) if gap <= config.relative_gap => SolveStatus::SuboptimalWithinGap { gap },
                gap => {
                    warn!(
                        model = model.name(),
                        phase = %SolvePhase::Terminal,
                        gap = ?gap,
                        required_gap = config.relative_gap,
                        "time limit reached outside the accepted gap"
                    );
                    return Err(RebalanceError::SolverTimeout {
                        model: model.name().to_string(),
                        gap,
                        required_gap: config.relative_gap,
                        limit_secs: config.time_limit_secs,
                    });
                }
            }
        }
    };

    debug!(model = model.name(), phase = %SolvePhase::Terminal, %status);
    Ok((status, solution.values))
}

/// Gap of an incumbent against a bound, zero when the bound is on the
/// wrong side (the incumbent is then at least as good as the bound).
fn directed_gap(sense: Sense, incumbent: f64, bound: f64) -> f64 {
    let behind = match sense {
        Sense::Maximize => bound > incumbent,
        Sense::Minimize => bound < incumbent,
    };
    if behind {
        relative_gap(incumbent, bound)
    } else {
        0.0
    }
}

/// Optimum of the LP relaxation, a valid bound on the MILP optimum.
fn relaxation_bound(engine: &dyn SolverEngine, model: &MilpModel, config: &SolveConfig) -> Option<f64> {
    let relaxed = model.relaxed();
    let objective = relaxed.objective().ok()?;
    match engine.solve(&relaxed, config) {
        Ok(solution) if solution.termination == EngineTermination::Optimal => {
            Some(objective.expr.evaluate(&solution.values))
        }
        Ok(_) => None,
        Err(failure) => {
            debug!(model = model.name(), %failure, "relaxation bound unavailable");
            None
        }
    }
}
