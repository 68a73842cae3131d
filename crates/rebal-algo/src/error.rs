//! Error taxonomy for model building and solving
//!
//! Build-time problems ([`ModelBuildError`]) are raised before any solver is
//! invoked. Solver-time problems are mapped from the engine's terminal status
//! into [`RebalanceError`] and are never folded into a "do nothing" decision.

use rebal_core::ValidationError;
use serde::Serialize;
use thiserror::Error;

/// Errors detected while assembling a model, before any solve.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelBuildError {
    /// Input data failed validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Index-aligned inputs disagree on their dimension
    #[error("dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        found: usize,
    },

    /// The station set is empty
    #[error("no stations to plan for")]
    EmptyStationSet,

    /// A station category has no entry in the injected profile
    #[error("profile '{profile}' has no entry for category '{category}' (station '{station}')")]
    UnscoredCategory {
        profile: String,
        category: String,
        station: String,
    },

    /// A model parameter is out of range
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Two constraints share the same label
    #[error("duplicate constraint label '{0}'")]
    DuplicateLabel(String),

    /// An expression references a variable the model never declared
    #[error("constraint '{label}' references unknown variable #{index}")]
    UnknownVariable { label: String, index: usize },

    /// A variable has an empty or unbounded-below domain
    #[error("variable '{name}' has invalid bounds [{lower}, {upper}]")]
    InvalidBounds { name: String, lower: f64, upper: f64 },

    /// A coefficient or right-hand side is NaN or infinite
    #[error("non-finite value in {0}")]
    NonFinite(String),

    /// The model has no objective
    #[error("model '{0}' has no objective")]
    MissingObjective(String),
}

impl ModelBuildError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        ModelBuildError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Stable error tag for the reporting layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ModelBuild,
    SolverInfeasible,
    SolverTimeout,
    SolverError,
    Catalog,
}

/// Failure of an optimisation stage or of the pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RebalanceError {
    /// The model could not be built from the given inputs
    #[error("model build error: {0}")]
    ModelBuild(#[from] ModelBuildError),

    /// No point satisfies the hard constraints
    #[error("model '{model}' is infeasible")]
    SolverInfeasible { model: String },

    /// Time limit hit with an incumbent outside the configured gap
    #[error("model '{model}' hit the {limit_secs}s time limit with gap {} above {required_gap}", format_gap(.gap))]
    SolverTimeout {
        model: String,
        gap: Option<f64>,
        required_gap: f64,
        limit_secs: f64,
    },

    /// Engine fault unrelated to feasibility
    #[error("solver error in model '{model}': {diagnostic}")]
    SolverError { model: String, diagnostic: String },

    /// A station or distance collaborator failed
    #[error("catalog error: {0}")]
    Catalog(ValidationError),
}

fn format_gap(gap: &Option<f64>) -> String {
    match gap {
        Some(g) => format!("{:.4}", g),
        None => "unknown".to_string(),
    }
}

impl RebalanceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RebalanceError::ModelBuild(_) => ErrorKind::ModelBuild,
            RebalanceError::SolverInfeasible { .. } => ErrorKind::SolverInfeasible,
            RebalanceError::SolverTimeout { .. } => ErrorKind::SolverTimeout,
            RebalanceError::SolverError { .. } => ErrorKind::SolverError,
            RebalanceError::Catalog(_) => ErrorKind::Catalog,
        }
    }

    /// Solver diagnostic, when the failure came from the engine
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            RebalanceError::SolverError { diagnostic, .. } => Some(diagnostic),
            _ => None,
        }
    }
}

impl From<ValidationError> for RebalanceError {
    fn from(err: ValidationError) -> Self {
        RebalanceError::ModelBuild(ModelBuildError::Validation(err))
    }
}

/// Convenience alias for stage results.
pub type RebalanceResult<T> = Result<T, RebalanceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let err: RebalanceError = ValidationError::NoScenarios.into();
        assert_eq!(err.kind(), ErrorKind::ModelBuild);

        let err = RebalanceError::SolverError {
            model: "first_stage".into(),
            diagnostic: "numerical trouble".into(),
        };
        assert_eq!(err.kind(), ErrorKind::SolverError);
        assert_eq!(err.diagnostic(), Some("numerical trouble"));
    }

    #[test]
    fn test_timeout_display() {
        let err = RebalanceError::SolverTimeout {
            model: "second_stage".into(),
            gap: Some(0.125),
            required_gap: 0.01,
            limit_secs: 300.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("300s"));
        assert!(msg.contains("0.1250"));

        let err = RebalanceError::SolverTimeout {
            model: "second_stage".into(),
            gap: None,
            required_gap: 0.01,
            limit_secs: 5.0,
        };
        assert!(err.to_string().contains("unknown"));
    }
}
