//! Station data structures
//!
//! A [`StationSet`] is the ordered snapshot of the docking network for one
//! planning cycle. Its ordinal order is the index used by the distance matrix
//! and by every vector derived from it (benefits, allocations, demands).

use crate::error::{ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Unique identifier for a docking station
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(pub String);

impl StationId {
    pub fn new(id: impl Into<String>) -> Self {
        StationId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Demand category label attached to a station.
///
/// The set of categories is a configuration concern: scoring and demand
/// profiles decide which labels they understand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DemandCategory(pub String);

impl DemandCategory {
    pub fn new(label: impl Into<String>) -> Self {
        DemandCategory(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DemandCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DemandCategory {
    fn from(label: &str) -> Self {
        DemandCategory::new(label)
    }
}

/// Geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// A docking station as observed at the start of a planning cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Unique identifier
    pub id: StationId,
    /// Human-readable name
    pub name: String,
    /// Number of docks
    pub capacity: u32,
    /// Geographic position
    pub location: Location,
    /// Demand category used by scoring and demand profiles
    pub demand_category: DemandCategory,
    /// Bikes currently docked
    pub current_bikes: u32,
}

impl Station {
    /// Create a new station with required parameters
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        capacity: u32,
        demand_category: impl Into<DemandCategory>,
        current_bikes: u32,
    ) -> Self {
        Self {
            id: StationId::new(id),
            name: name.into(),
            capacity,
            location: Location::default(),
            demand_category: demand_category.into(),
            current_bikes,
        }
    }

    /// Set the geographic position
    pub fn with_location(mut self, lat: f64, lng: f64) -> Self {
        self.location = Location::new(lat, lng);
        self
    }
}

/// Ordered, validated set of stations for one planning cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationSet {
    stations: Vec<Station>,
}

impl StationSet {
    /// Validate a list of stations, keeping the given order.
    pub fn new(stations: Vec<Station>) -> ValidationResult<Self> {
        let mut seen = HashSet::with_capacity(stations.len());
        for station in &stations {
            if station.current_bikes > station.capacity {
                return Err(ValidationError::OccupancyExceedsCapacity {
                    id: station.id.0.clone(),
                    current_bikes: station.current_bikes,
                    capacity: station.capacity,
                });
            }
            if !station.location.is_valid() {
                return Err(ValidationError::InvalidLocation {
                    id: station.id.0.clone(),
                    lat: station.location.lat,
                    lng: station.location.lng,
                });
            }
            if !seen.insert(station.id.clone()) {
                return Err(ValidationError::DuplicateStation(station.id.0.clone()));
            }
        }
        Ok(Self { stations })
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Station> {
        self.stations.iter()
    }

    pub fn as_slice(&self) -> &[Station] {
        &self.stations
    }

    /// Dock capacities in ordinal order
    pub fn capacities(&self) -> Vec<u32> {
        self.stations.iter().map(|s| s.capacity).collect()
    }

    /// Current occupancy in ordinal order
    pub fn current_bikes(&self) -> Vec<u32> {
        self.stations.iter().map(|s| s.current_bikes).collect()
    }
}

impl<'a> IntoIterator for &'a StationSet {
    type Item = &'a Station;
    type IntoIter = std::slice::Iter<'a, Station>;

    fn into_iter(self) -> Self::IntoIter {
        self.stations.iter()
    }
}

impl<'de> Deserialize<'de> for StationSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            stations: Vec<Station>,
        }
        let raw = Raw::deserialize(deserializer)?;
        StationSet::new(raw.stations).map_err(serde::de::Error::custom)
    }
}
