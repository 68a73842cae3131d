//! Collaborator interfaces for station and distance data
//!
//! Loading station snapshots and distance tables from files or services is
//! owned by the caller. The planning pipeline only consumes these traits.

use crate::distance::DistanceMatrix;
use crate::error::ValidationResult;
use crate::station::StationSet;

/// Supplies the ordered station snapshot for a planning cycle.
pub trait StationCatalog {
    fn stations(&self) -> ValidationResult<StationSet>;
}

/// Supplies relocation costs for a station snapshot.
///
/// Providers report their own lookup failures. Whether the matrix matches
/// the snapshot is checked by the model builders.
pub trait DistanceProvider {
    fn distances(&self, stations: &StationSet) -> ValidationResult<DistanceMatrix>;
}

/// Catalog backed by an in-memory snapshot
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    stations: StationSet,
}

impl StaticCatalog {
    pub fn new(stations: StationSet) -> Self {
        Self { stations }
    }
}

impl StationCatalog for StaticCatalog {
    fn stations(&self) -> ValidationResult<StationSet> {
        Ok(self.stations.clone())
    }
}

/// Distance provider backed by a precomputed matrix, returned unchanged
#[derive(Debug, Clone)]
pub struct StaticDistances {
    matrix: DistanceMatrix,
}

impl StaticDistances {
    pub fn new(matrix: DistanceMatrix) -> Self {
        Self { matrix }
    }
}

impl DistanceProvider for StaticDistances {
    fn distances(&self, _stations: &StationSet) -> ValidationResult<DistanceMatrix> {
        Ok(self.matrix.clone())
    }
}

/// Distance provider using great-circle distances between station locations
#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineDistances;

impl DistanceProvider for HaversineDistances {
    fn distances(&self, stations: &StationSet) -> ValidationResult<DistanceMatrix> {
        Ok(DistanceMatrix::haversine(stations))
    }
}
