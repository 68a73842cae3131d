//! [`SolverEngine`] implementation on top of `good_lp`

use super::engine::{EngineFailure, EngineSolution, EngineTermination, SolveConfig, SolverEngine};
use super::model::{LinExpr, MilpModel, Relation, Sense, VarDomain};
use anyhow::anyhow;
#[cfg(feature = "solver-highs")]
use good_lp::solvers::highs::highs as highs_solver;
#[cfg(feature = "solver-microlp")]
use good_lp::solvers::microlp::microlp as microlp_solver;
use good_lp::solvers::{ResolutionError, SolutionStatus};
use good_lp::{constraint, variable, Constraint, Expression, ProblemVariables, Solution, SolverModel, Variable};
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, warn};

#[cfg(not(any(feature = "solver-microlp", feature = "solver-highs")))]
compile_error!("enable at least one of the `solver-microlp` or `solver-highs` features");

/// MILP backend used by [`GoodLpEngine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MilpBackend {
    /// Pure-Rust branch-and-bound. Runs to proven optimality; neither the
    /// time limit nor the gap is enforced, so the search on a recourse model
    /// with more than a handful of stations may not terminate.
    #[cfg(feature = "solver-microlp")]
    Microlp,
    /// HiGHS, honouring `time_limit` and `mip_rel_gap`
    #[cfg(feature = "solver-highs")]
    Highs,
}

/// HiGHS whenever it is compiled in; microlp only in microlp-only builds.
impl Default for MilpBackend {
    fn default() -> Self {
        #[cfg(feature = "solver-highs")]
        {
            MilpBackend::Highs
        }
        #[cfg(not(feature = "solver-highs"))]
        {
            MilpBackend::Microlp
        }
    }
}

impl MilpBackend {
    pub fn available() -> &'static [&'static str] {
        AVAILABLE_BACKENDS
    }

    /// Whether the backend stops at `time_limit_secs` and `relative_gap`
    pub fn enforces_limits(&self) -> bool {
        match self {
            #[cfg(feature = "solver-microlp")]
            MilpBackend::Microlp => false,
            #[cfg(feature = "solver-highs")]
            MilpBackend::Highs => true,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            #[cfg(feature = "solver-microlp")]
            MilpBackend::Microlp => "microlp",
            #[cfg(feature = "solver-highs")]
            MilpBackend::Highs => "highs",
        }
    }
}

const AVAILABLE_BACKENDS: &[&str] = &[
    #[cfg(feature = "solver-microlp")]
    "microlp",
    #[cfg(feature = "solver-highs")]
    "highs",
];

fn unknown_backend_error(label: &str) -> anyhow::Error {
    anyhow!(
        "unknown milp backend '{}'; supported values: {}",
        label,
        MilpBackend::available().join(", ")
    )
}

impl FromStr for MilpBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.to_ascii_lowercase();
        match normalized.as_str() {
            "microlp" => {
                #[cfg(feature = "solver-microlp")]
                {
                    Ok(MilpBackend::Microlp)
                }
                #[cfg(not(feature = "solver-microlp"))]
                {
                    Err(unknown_backend_error(&normalized))
                }
            }
            "highs" => {
                #[cfg(feature = "solver-highs")]
                {
                    Ok(MilpBackend::Highs)
                }
                #[cfg(not(feature = "solver-highs"))]
                {
                    Err(unknown_backend_error(&normalized))
                }
            }
            other => Err(unknown_backend_error(other)),
        }
    }
}

/// Stateless engine translating a [`MilpModel`] into a fresh `good_lp`
/// problem on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoodLpEngine {
    backend: MilpBackend,
}

impl GoodLpEngine {
    pub fn new(backend: MilpBackend) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> MilpBackend {
        self.backend
    }
}

impl SolverEngine for GoodLpEngine {
    fn name(&self) -> &str {
        self.backend.as_str()
    }

    fn solve(
        &self,
        model: &MilpModel,
        config: &SolveConfig,
    ) -> Result<EngineSolution, EngineFailure> {
        let started = Instant::now();
        let objective = model
            .objective()
            .map_err(|e| EngineFailure::Fault(e.to_string()))?;

        let mut vars = ProblemVariables::new();
        let handles: Vec<Variable> = model
            .vars()
            .iter()
            .map(|decl| {
                let mut def = variable().name(decl.name.clone()).min(decl.lower);
                if let Some(upper) = decl.upper {
                    def = def.max(upper);
                }
                match decl.domain {
                    VarDomain::Continuous => def,
                    VarDomain::Integer => def.integer(),
                    VarDomain::Binary => def.binary(),
                }
            })
            .map(|def| vars.add(def))
            .collect();

        let constraints: Vec<Constraint> = model
            .constraints()
            .iter()
            .map(|c| {
                let lhs = to_expression(&c.expr, &handles);
                match c.relation {
                    Relation::Le => constraint::leq(lhs, c.rhs),
                    Relation::Ge => constraint::geq(lhs, c.rhs),
                    Relation::Eq => constraint::eq(lhs, c.rhs),
                }
            })
            .collect();

        let objective_expr = to_expression(&objective.expr, &handles);
        let unsolved = match objective.sense {
            Sense::Maximize => vars.maximise(objective_expr),
            Sense::Minimize => vars.minimise(objective_expr),
        };

        debug!(
            model = model.name(),
            backend = self.backend.as_str(),
            vars = model.num_vars(),
            constraints = model.num_constraints(),
            time_limit_secs = config.time_limit_secs,
            relative_gap = config.relative_gap,
            "handing model to good_lp"
        );

        match self.backend {
            #[cfg(feature = "solver-microlp")]
            MilpBackend::Microlp => {
                warn!(
                    model = model.name(),
                    time_limit_secs = config.time_limit_secs,
                    relative_gap = config.relative_gap,
                    "microlp cannot enforce the time limit or relative gap; solving to optimality"
                );
                run(unsolved.using(microlp_solver), constraints, &handles, started)
            }
            #[cfg(feature = "solver-highs")]
            MilpBackend::Highs => {
                let problem = unsolved
                    .using(highs_solver)
                    .set_verbose(false)
                    .set_option("time_limit", config.time_limit_secs)
                    .set_option("mip_rel_gap", config.relative_gap);
                run(problem, constraints, &handles, started)
            }
        }
    }
}

fn to_expression(expr: &LinExpr, handles: &[Variable]) -> Expression {
    let mut out = Expression::from(expr.constant_term());
    for (var, coef) in expr.terms() {
        out += *coef * handles[var.index()];
    }
    out
}

fn run<M>(
    problem: M,
    constraints: Vec<Constraint>,
    handles: &[Variable],
    started: Instant,
) -> Result<EngineSolution, EngineFailure>
where
    M: SolverModel<Error = ResolutionError>,
{
    let problem = constraints.into_iter().fold(problem, |p, c| p.with(c));
    let solution = problem.solve().map_err(|e| match e {
        ResolutionError::Infeasible => EngineFailure::Infeasible,
        ResolutionError::Unbounded => EngineFailure::Unbounded,
        other => EngineFailure::Fault(other.to_string()),
    })?;

    let termination = match solution.status() {
        SolutionStatus::Optimal => EngineTermination::Optimal,
        SolutionStatus::GapLimit => EngineTermination::GapLimit,
        SolutionStatus::TimeLimit => EngineTermination::TimeLimit,
    };

    Ok(EngineSolution {
        termination,
        values: handles.iter().map(|v| solution.value(*v)).collect(),
        best_bound: None,
        elapsed: started.elapsed(),
    })
}
