//! First-stage parameters
//!
//! One parameter set covers every experiment variant: the fleet cap formula,
//! cost coefficient, big-M, tolerance and objective sense are all explicit.

use crate::error::ModelBuildError;
use crate::milp::{Sense, SolveConfig};
use serde::{Deserialize, Serialize};

/// Upper bound on the total number of bikes the allocation may place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FleetCap {
    /// A fixed number of bikes
    Absolute(u64),
    /// The share of a larger fleet proportional to the planned stations:
    /// `floor(stations / network_stations · fleet_size)`
    Proportional {
        fleet_size: u64,
        network_stations: u64,
    },
}

impl FleetCap {
    /// Resolve the cap for a station set of the given size.
    pub fn resolve(&self, station_count: usize) -> Result<u64, ModelBuildError> {
        match *self {
            FleetCap::Absolute(cap) => Ok(cap),
            FleetCap::Proportional {
                fleet_size,
                network_stations,
            } => {
                if network_stations == 0 {
                    return Err(ModelBuildError::invalid(
                        "fleet_cap.network_stations",
                        "must be positive",
                    ));
                }
                let share = fleet_size as u128 * station_count as u128 / network_stations as u128;
                Ok(share as u64)
            }
        }
    }
}

/// Parameters of the first-stage allocation model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirstStageParams {
    pub fleet_cap: FleetCap,
    /// Cost of moving one bike away from or onto a station
    pub unit_cost: f64,
    /// Big-M constant of the redistribution switch
    pub big_m: f64,
    /// Net benefit must exceed this value for the switch to turn on
    pub tolerance: f64,
    /// Maximize net benefit, or minimize net cost (same decision)
    #[serde(default)]
    pub sense: Sense,
    pub solver: SolveConfig,
}

impl FirstStageParams {
    pub fn new(
        fleet_cap: FleetCap,
        unit_cost: f64,
        big_m: f64,
        tolerance: f64,
        solver: SolveConfig,
    ) -> Self {
        Self {
            fleet_cap,
            unit_cost,
            big_m,
            tolerance,
            sense: Sense::Maximize,
            solver,
        }
    }

    /// Set the objective sense
    pub fn with_sense(mut self, sense: Sense) -> Self {
        self.sense = sense;
        self
    }

    pub fn validate(&self) -> Result<(), ModelBuildError> {
        if !(self.unit_cost.is_finite() && self.unit_cost > 0.0) {
            return Err(ModelBuildError::invalid(
                "unit_cost",
                format!("must be positive and finite, got {}", self.unit_cost),
            ));
        }
        if !(self.big_m.is_finite() && self.big_m > 0.0) {
            return Err(ModelBuildError::invalid(
                "big_m",
                format!("must be positive and finite, got {}", self.big_m),
            ));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(ModelBuildError::invalid(
                "tolerance",
                format!("must be positive and finite, got {}", self.tolerance),
            ));
        }
        if self.tolerance >= self.big_m {
            return Err(ModelBuildError::invalid(
                "tolerance",
                format!("must be below big_m ({}), got {}", self.big_m, self.tolerance),
            ));
        }
        self.fleet_cap.resolve(0)?;
        self.solver.validate()
    }
}

/// Smallest big-M that dominates every net objective value reachable with
/// deviations at their minimum, plus the tolerance.
pub fn recommended_big_m(
    benefits: &[f64],
    capacities: &[u32],
    current_bikes: &[u32],
    unit_cost: f64,
    tolerance: f64,
) -> f64 {
    let bound: f64 = benefits
        .iter()
        .zip(capacities)
        .zip(current_bikes)
        .map(|((b, &cap), &current)| {
            let max_deviation = cap.saturating_sub(current).max(current) as f64;
            b.abs() * cap as f64 + unit_cost * max_deviation
        })
        .sum();
    bound + tolerance
}
