//! Station-to-station relocation cost matrix

use crate::error::{ValidationError, ValidationResult};
use crate::station::{Location, StationSet};
use serde::{Deserialize, Serialize};

/// Mean Earth radius used for great-circle distances (km)
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Square matrix of non-negative relocation costs, aligned with a
/// [`StationSet`] by ordinal index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceMatrix {
    size: usize,
    costs: Vec<f64>,
}

impl DistanceMatrix {
    /// Build from rows, rejecting ragged rows and invalid entries.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> ValidationResult<Self> {
        let size = rows.len();
        let mut costs = Vec::with_capacity(size * size);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != size {
                return Err(ValidationError::DimensionMismatch {
                    what: format!("distance matrix row {}", i),
                    expected: size,
                    found: row.len(),
                });
            }
            for (j, value) in row.into_iter().enumerate() {
                if !value.is_finite() || value < 0.0 {
                    return Err(ValidationError::InvalidDistance { from: i, to: j, value });
                }
                costs.push(value);
            }
        }
        Ok(Self { size, costs })
    }

    /// Great-circle distances (km) between station locations.
    pub fn haversine(stations: &StationSet) -> Self {
        let locations: Vec<Location> = stations.iter().map(|s| s.location).collect();
        let size = locations.len();
        let mut costs = Vec::with_capacity(size * size);
        for from in &locations {
            for to in &locations {
                costs.push(haversine_km(*from, *to));
            }
        }
        Self { size, costs }
    }

    /// Number of stations covered
    pub fn size(&self) -> usize {
        self.size
    }

    /// Cost of moving one bike from station `from` to station `to`
    pub fn cost(&self, from: usize, to: usize) -> f64 {
        self.costs[from * self.size + to]
    }

    /// Fail unless the matrix covers exactly the given station set.
    pub fn ensure_aligned(&self, stations: &StationSet) -> ValidationResult<()> {
        if self.size != stations.len() {
            return Err(ValidationError::DimensionMismatch {
                what: "distance matrix".to_string(),
                expected: stations.len(),
                found: self.size,
            });
        }
        Ok(())
    }
}

impl<'de> Deserialize<'de> for DistanceMatrix {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let rows = Vec::<Vec<f64>>::deserialize(deserializer)?;
        DistanceMatrix::from_rows(rows).map_err(serde::de::Error::custom)
    }
}

fn haversine_km(from: Location, to: Location) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}
