//! First-stage MILP
//!
//! Builds the allocation model from a station set and a scoring profile and
//! solves it through the shared [`solve_model`] discipline.

use super::{recommended_big_m, FirstStageParams, FirstStageSolution};
use crate::error::{ModelBuildError, RebalanceError};
use crate::inputs::benefit_vector;
use crate::milp::{solve_model, LinExpr, MilpModel, Relation, Sense, SolverEngine, VarDomain, VarId};
use rebal_core::{BenefitScoring, StationSet};
use tracing::{debug, warn};

/// Name of the first-stage model in logs and errors
pub const FIRST_STAGE_MODEL: &str = "first_stage";

/// Built first-stage model with handles to its decision variables
#[derive(Debug, Clone)]
pub struct FirstStageModel {
    pub model: MilpModel,
    /// `x_i`, bikes targeted at station `i`
    pub allocation: Vec<VarId>,
    /// `abs_i`, linearised `|x_i − current_i|`
    pub deviations: Vec<VarId>,
    /// `w`, the redistribution switch
    pub switch: VarId,
    /// `Σ b_i x_i − unit_cost · Σ abs_i`
    pub net_benefit: LinExpr,
    pub fleet_cap: u64,
}

/// Build the first-stage model without solving it.
///
/// ```text
/// maximize    Σ b_i x_i − c · Σ abs_i
/// subject to  x_i ≤ capacity_i
///             abs_i ≥ x_i − current_i
///             abs_i ≥ current_i − x_i
///             Σ x_i ≤ fleet_cap
///             net ≥ e − M(1 − w)
///             net ≤ −e + M w
///             x_i, abs_i ∈ ℤ≥0,  w ∈ {0, 1}
/// ```
pub fn build_first_stage(
    stations: &StationSet,
    scoring: &dyn BenefitScoring,
    params: &FirstStageParams,
) -> Result<FirstStageModel, ModelBuildError> {
    if stations.is_empty() {
        return Err(ModelBuildError::EmptyStationSet);
    }
    params.validate()?;
    let benefits = benefit_vector(stations, scoring)?;
    let fleet_cap = params.fleet_cap.resolve(stations.len())?;

    let recommended = recommended_big_m(
        &benefits,
        &stations.capacities(),
        &stations.current_bikes(),
        params.unit_cost,
        params.tolerance,
    );
    if params.big_m < recommended {
        warn!(
            big_m = params.big_m,
            recommended,
            "big_m is below the objective magnitude; the redistribution switch may be forced"
        );
    }

    let mut model = MilpModel::new(FIRST_STAGE_MODEL);
    let mut allocation = Vec::with_capacity(stations.len());
    let mut deviations = Vec::with_capacity(stations.len());

    for station in stations {
        let x = model.add_var(format!("x_{}", station.id), VarDomain::Integer, 0.0, None)?;
        let abs = model.add_var(format!("abs_{}", station.id), VarDomain::Integer, 0.0, None)?;
        let current = station.current_bikes as f64;

        model.add_constraint(
            format!("capacity_{}", station.id),
            LinExpr::from(x),
            Relation::Le,
            station.capacity as f64,
        )?;
        model.add_constraint(
            format!("abs_pos_{}", station.id),
            LinExpr::from(abs) - LinExpr::from(x),
            Relation::Ge,
            -current,
        )?;
        model.add_constraint(
            format!("abs_neg_{}", station.id),
            LinExpr::from(abs) + LinExpr::from(x),
            Relation::Ge,
            current,
        )?;

        allocation.push(x);
        deviations.push(abs);
    }

    model.add_constraint(
        "fleet_cap",
        LinExpr::sum(allocation.iter().map(|&x| (x, 1.0))),
        Relation::Le,
        fleet_cap as f64,
    )?;

    let net_benefit = LinExpr::sum(allocation.iter().copied().zip(benefits.iter().copied()))
        + LinExpr::sum(deviations.iter().map(|&abs| (abs, -params.unit_cost)));

    let switch = model.add_var("w", VarDomain::Binary, 0.0, Some(1.0))?;
    let m = params.big_m;
    let e = params.tolerance;
    model.add_constraint(
        "switch_on",
        net_benefit.clone().term(switch, -m),
        Relation::Ge,
        e - m,
    )?;
    model.add_constraint(
        "switch_off",
        net_benefit.clone().term(switch, -m),
        Relation::Le,
        -e,
    )?;

    let objective = match params.sense {
        Sense::Maximize => net_benefit.clone(),
        Sense::Minimize => -net_benefit.clone(),
    };
    model.set_objective(objective, params.sense)?;

    debug!(
        stations = stations.len(),
        fleet_cap,
        vars = model.num_vars(),
        constraints = model.num_constraints(),
        "first-stage model built"
    );

    Ok(FirstStageModel {
        model,
        allocation,
        deviations,
        switch,
        net_benefit,
        fleet_cap,
    })
}

/// Solve the first-stage allocation problem.
///
/// Infeasibility, timeouts outside the gap and engine faults are returned as
/// errors; none of them yields `redistribute = false`.
pub fn solve_first_stage(
    stations: &StationSet,
    scoring: &dyn BenefitScoring,
    params: &FirstStageParams,
    engine: &dyn SolverEngine,
) -> Result<FirstStageSolution, RebalanceError> {
    let built = build_first_stage(stations, scoring, params)?;
    let solved = solve_model(engine, &built.model, &params.solver)?;

    let net_benefit = built.net_benefit.evaluate(&solved.values);
    let redistribute = solved.values[built.switch.index()] > 0.5;

    let consistent = if redistribute {
        net_benefit >= params.tolerance - 1e-6
    } else {
        net_benefit <= -params.tolerance + 1e-6
    };
    if !consistent {
        warn!(
            net_benefit,
            redistribute,
            tolerance = params.tolerance,
            "redistribution switch disagrees with the net benefit"
        );
    }

    let (allocation, deviations) = if redistribute {
        (
            to_counts(&built.allocation, &solved.values),
            to_counts(&built.deviations, &solved.values),
        )
    } else {
        (Vec::new(), Vec::new())
    };

    Ok(FirstStageSolution {
        net_benefit,
        redistribute,
        allocation,
        deviations,
        fleet_cap: built.fleet_cap,
        status: solved.status,
        solve_time: solved.solve_time,
    })
}

fn to_counts(vars: &[VarId], values: &[f64]) -> Vec<u32> {
    vars.iter()
        .map(|v| values[v.index()].max(0.0).round() as u32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::first_stage::FleetCap;
    use crate::milp::SolveConfig;
    use rebal_core::{ScoringProfile, Station};
    use std::time::Duration;

    fn stations() -> StationSet {
        StationSet::new(vec![
            Station::new("a", "A", 10, "Low", 2),
            Station::new("b", "B", 5, "Medium", 1),
        ])
        .unwrap()
    }

    fn params() -> FirstStageParams {
        FirstStageParams::new(
            FleetCap::Absolute(12),
            1.0,
            1e4,
            1e-5,
            SolveConfig::new(Duration::from_secs(30), 0.0).unwrap(),
        )
    }

    #[test]
    fn test_model_shape() {
        let built = build_first_stage(&stations(), &ScoringProfile::manhattan_2024(), &params()).unwrap();
        // x and abs per station plus the switch
        assert_eq!(built.model.num_vars(), 5);
        // three per station, the fleet cap and the big-M pair
        assert_eq!(built.model.num_constraints(), 9);
        assert_eq!(built.model.var(built.switch).domain, VarDomain::Binary);
        assert_eq!(built.fleet_cap, 12);
        assert!(built.model.is_mixed_integer());
    }

    #[test]
    fn test_minimize_sense_negates_objective() {
        let stations = stations();
        let scoring = ScoringProfile::manhattan_2024();
        let max = build_first_stage(&stations, &scoring, &params()).unwrap();
        let min = build_first_stage(&stations, &scoring, &params().with_sense(Sense::Minimize)).unwrap();

        let point = vec![3.0, 1.0, 2.0, 1.0, 1.0];
        let max_obj = max.model.objective().unwrap().expr.evaluate(&point);
        let min_obj = min.model.objective().unwrap().expr.evaluate(&point);
        assert!((max_obj + min_obj).abs() < 1e-12);
        assert_eq!(min.model.objective().unwrap().sense, Sense::Minimize);
    }

    #[test]
    fn test_empty_station_set() {
        let empty = StationSet::new(Vec::new()).unwrap();
        let err = build_first_stage(&empty, &ScoringProfile::manhattan_2024(), &params()).unwrap_err();
        assert_eq!(err, ModelBuildError::EmptyStationSet);
    }

    #[test]
    fn test_invalid_params_rejected_before_build() {
        let mut bad = params();
        bad.tolerance = 0.0;
        let err = build_first_stage(&stations(), &ScoringProfile::manhattan_2024(), &bad).unwrap_err();
        assert!(matches!(err, ModelBuildError::InvalidParameter { .. }));
    }

    #[test]
    fn test_deviation_constraints_pin_absolute_value() {
        let built = build_first_stage(&stations(), &ScoringProfile::manhattan_2024(), &params()).unwrap();
        // x_a = 5 with abs_a = 1 understates |5 − 2|
        let point = vec![5.0, 1.0, 1.0, 0.0, 1.0];
        let violated = built.model.violations(&point, 1e-9);
        assert!(violated.contains(&"abs_pos_a"));
    }
}
