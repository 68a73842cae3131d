//! # rebal-core: Bike-Share Network Data Model
//!
//! Provides the validated inputs of a rebalancing planning cycle:
//!
//! - [`StationSet`] - ordered station snapshot (capacity, occupancy, category)
//! - [`DistanceMatrix`] - relocation costs aligned with the station order
//! - [`ScenarioSet`] - weather scenarios whose probabilities sum to one
//! - [`ScoringProfile`] / [`DemandProfile`] - named category tables
//! - [`StationCatalog`] / [`DistanceProvider`] - collaborator interfaces
//!
//! Ordinal position in a [`StationSet`] is the index shared by every matrix
//! and vector built on top of it. Constructors validate that alignment and
//! return [`ValidationError`] instead of repairing inputs.
//!
//! ## Quick Start
//!
//! ```rust
//! use rebal_core::*;
//!
//! let stations = StationSet::new(vec![
//!     Station::new("6926.01", "W 52 St & 11 Ave", 20, "Highest", 4),
//!     Station::new("5329.03", "Franklin St & W Broadway", 15, "Low", 12),
//! ])?;
//! let distances = DistanceMatrix::from_rows(vec![vec![0.0, 4.0], vec![4.0, 0.0]])?;
//! distances.ensure_aligned(&stations)?;
//!
//! let scoring = ScoringProfile::manhattan_2024();
//! assert!(scoring.benefit(&stations.as_slice()[0].demand_category).is_some());
//! # Ok::<(), ValidationError>(())
//! ```

pub mod catalog;
pub mod distance;
pub mod error;
pub mod scenario;
pub mod scoring;
pub mod station;

pub use catalog::{DistanceProvider, HaversineDistances, StaticCatalog, StaticDistances, StationCatalog};
pub use distance::DistanceMatrix;
pub use error::{ValidationError, ValidationResult};
pub use scenario::{Scenario, ScenarioSet, PROBABILITY_TOLERANCE};
pub use scoring::{BenefitScoring, DemandFractions, DemandProfile, ProfileRegistry, ScoringProfile};
pub use station::{DemandCategory, Location, Station, StationId, StationSet};
