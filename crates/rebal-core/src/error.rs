//! Validation errors for planning inputs
//!
//! Every constructor in this crate that accepts external data validates it and
//! returns a [`ValidationError`] rather than silently repairing the input.

use thiserror::Error;

/// Errors raised while validating stations, distances, scenarios or profiles.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Two stations share the same identifier
    #[error("duplicate station id '{0}'")]
    DuplicateStation(String),

    /// A station reports more bikes than docks
    #[error("station '{id}' has {current_bikes} bikes but capacity {capacity}")]
    OccupancyExceedsCapacity {
        id: String,
        current_bikes: u32,
        capacity: u32,
    },

    /// Two index-aligned collections disagree on their length
    #[error("dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        found: usize,
    },

    /// A distance entry is negative, NaN or infinite
    #[error("invalid distance {value} at ({from}, {to})")]
    InvalidDistance { from: usize, to: usize, value: f64 },

    /// The scenario set is empty
    #[error("scenario set is empty")]
    NoScenarios,

    /// Two scenarios share the same name
    #[error("duplicate scenario '{0}'")]
    DuplicateScenario(String),

    /// A scenario probability lies outside (0, 1]
    #[error("scenario '{name}' has probability {probability}, expected a value in (0, 1]")]
    InvalidProbability { name: String, probability: f64 },

    /// Probabilities do not sum to one
    #[error("scenario probabilities sum to {sum}, expected 1")]
    ProbabilitySum { sum: f64 },

    /// A weather factor is negative or not finite
    #[error("scenario '{name}' has invalid demand weather factor {factor}")]
    InvalidWeatherFactor { name: String, factor: f64 },

    /// A profile table value is not finite (or out of range for fractions)
    #[error("profile '{profile}' has invalid value {value} for category '{category}'")]
    InvalidProfileValue {
        profile: String,
        category: String,
        value: f64,
    },

    /// A profile name was requested that no registry entry carries
    #[error("unknown profile '{0}'")]
    UnknownProfile(String),

    /// A station coordinate is outside the valid lat/lng range
    #[error("station '{id}' has invalid location ({lat}, {lng})")]
    InvalidLocation { id: String, lat: f64, lng: f64 },
}

/// Convenience alias for validation results.
pub type ValidationResult<T> = Result<T, ValidationError>;
