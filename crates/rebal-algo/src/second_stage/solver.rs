//! Second-stage MILP
//!
//! One joint model over every scenario. Each scenario gets its own copy of
//! the stock, penalty and flow variables; only the objective couples them
//! through the scenario probabilities.

use super::{Relocation, ScenarioPlan, SecondStageParams, SecondStageSolution, StationOutcome};
use crate::error::{ModelBuildError, RebalanceError};
use crate::inputs::{baseline_demand, ensure_recourse_inputs};
use crate::milp::{solve_model, LinExpr, MilpModel, Relation, Sense, SolverEngine, VarDomain, VarId};
use rebal_core::{DemandFractions, DistanceMatrix, ScenarioSet, StationSet};
use tracing::debug;

/// Name of the second-stage model in logs and errors
pub const SECOND_STAGE_MODEL: &str = "second_stage";

/// Variables of one scenario
#[derive(Debug, Clone)]
pub struct ScenarioVars {
    /// `x_ik`, stock after relocation
    pub stock: Vec<VarId>,
    /// `unmet_ik`
    pub unmet: Vec<VarId>,
    /// `over_ik`
    pub over: Vec<VarId>,
    /// `(i, j, y_ijk)` for every ordered pair `i ≠ j`
    pub flows: Vec<(usize, usize, VarId)>,
    /// `demandFraction(category_i) · capacity_i · weather_k`
    pub demand: Vec<f64>,
}

/// Built second-stage model with handles to its decision variables
#[derive(Debug, Clone)]
pub struct SecondStageModel {
    pub model: MilpModel,
    /// Indexed like the scenario set
    pub scenarios: Vec<ScenarioVars>,
}

/// Build the recourse model without solving it.
///
/// ```text
/// minimize    Σ_k p_k Σ_{i≠j} c_ij y_ijk + P_u Σ_ik unmet_ik + P_o Σ_ik over_ik
/// subject to  Σ_i x_ik ≤ Σ_i allocation_i                       ∀k
///             x_ik = allocation_i + Σ_j y_jik − Σ_j y_ijk       ∀i,k
///             x_ik + unmet_ik ≥ demand_ik                       ∀i,k
///             x_ik − over_ik ≤ capacity_i                       ∀i,k
///             x, y, unmet, over ∈ ℤ≥0
/// ```
pub fn build_second_stage(
    allocation: &[u32],
    stations: &StationSet,
    distances: &DistanceMatrix,
    scenarios: &ScenarioSet,
    demand: &dyn DemandFractions,
    params: &SecondStageParams,
) -> Result<SecondStageModel, ModelBuildError> {
    ensure_recourse_inputs(allocation, stations, distances)?;
    params.validate()?;
    let baseline = baseline_demand(stations, demand)?;
    let fleet: f64 = allocation.iter().map(|&a| a as f64).sum();
    let n = stations.len();

    let mut model = MilpModel::new(SECOND_STAGE_MODEL);
    let mut objective = LinExpr::new();
    let mut per_scenario = Vec::with_capacity(scenarios.len());

    for (k, scenario) in scenarios.iter().enumerate() {
        let mut stock = Vec::with_capacity(n);
        let mut unmet = Vec::with_capacity(n);
        let mut over = Vec::with_capacity(n);
        for i in 0..n {
            stock.push(model.add_var(format!("x_{k}_{i}"), VarDomain::Integer, 0.0, None)?);
            unmet.push(model.add_var(format!("unmet_{k}_{i}"), VarDomain::Integer, 0.0, None)?);
            over.push(model.add_var(format!("over_{k}_{i}"), VarDomain::Integer, 0.0, None)?);
        }

        // x_ik − inflow + outflow, completed into balance_k_i below
        let mut balances: Vec<LinExpr> = stock.iter().map(|&x| LinExpr::from(x)).collect();
        let mut flows = Vec::with_capacity(n * n.saturating_sub(1));
        for i in 0..n {
            for j in (0..n).filter(|&j| j != i) {
                let y = model.add_var(format!("y_{k}_{i}_{j}"), VarDomain::Integer, 0.0, None)?;
                objective.add_term(y, scenario.probability * distances.cost(i, j));
                balances[i].add_term(y, 1.0);
                balances[j].add_term(y, -1.0);
                flows.push((i, j, y));
            }
        }

        model.add_constraint(
            format!("fleet_{k}"),
            LinExpr::sum(stock.iter().map(|&x| (x, 1.0))),
            Relation::Le,
            fleet,
        )?;

        let demand_k: Vec<f64> = baseline
            .iter()
            .map(|d| d * scenario.demand_weather_factor)
            .collect();

        for ((i, station), balance) in stations.iter().enumerate().zip(balances) {
            model.add_constraint(
                format!("balance_{k}_{i}"),
                balance,
                Relation::Eq,
                allocation[i] as f64,
            )?;
            model.add_constraint(
                format!("demand_{k}_{i}"),
                LinExpr::from(stock[i]) + LinExpr::from(unmet[i]),
                Relation::Ge,
                demand_k[i],
            )?;
            model.add_constraint(
                format!("capacity_{k}_{i}"),
                LinExpr::from(stock[i]) - LinExpr::from(over[i]),
                Relation::Le,
                station.capacity as f64,
            )?;

            objective.add_term(unmet[i], params.penalty_unmet);
            objective.add_term(over[i], params.penalty_over_capacity);
        }

        per_scenario.push(ScenarioVars {
            stock,
            unmet,
            over,
            flows,
            demand: demand_k,
        });
    }

    model.set_objective(objective, Sense::Minimize)?;

    debug!(
        stations = n,
        scenarios = scenarios.len(),
        fleet,
        vars = model.num_vars(),
        constraints = model.num_constraints(),
        "second-stage model built"
    );

    Ok(SecondStageModel {
        model,
        scenarios: per_scenario,
    })
}

/// Solve the recourse problem for a first-stage allocation.
///
/// Every input is checked before the engine is called.
pub fn solve_second_stage(
    allocation: &[u32],
    stations: &StationSet,
    distances: &DistanceMatrix,
    scenarios: &ScenarioSet,
    demand: &dyn DemandFractions,
    params: &SecondStageParams,
    engine: &dyn SolverEngine,
) -> Result<SecondStageSolution, RebalanceError> {
    let built = build_second_stage(allocation, stations, distances, scenarios, demand, params)?;
    let solved = solve_model(engine, &built.model, &params.solver)?;
    let values = &solved.values;

    let plans = scenarios
        .iter()
        .zip(&built.scenarios)
        .map(|(scenario, vars)| {
            let relocations: Vec<Relocation> = vars
                .flows
                .iter()
                .filter_map(|&(i, j, y)| {
                    let amount = count(values, y);
                    (amount > 0).then(|| Relocation {
                        amount,
                        from: stations.as_slice()[i].id.clone(),
                        to: stations.as_slice()[j].id.clone(),
                        from_index: i,
                        to_index: j,
                    })
                })
                .collect();
            let transport_cost = relocations
                .iter()
                .map(|r| r.amount as f64 * distances.cost(r.from_index, r.to_index))
                .sum();
            let outcomes = stations
                .iter()
                .enumerate()
                .map(|(i, station)| StationOutcome {
                    station: station.id.clone(),
                    stock: count(values, vars.stock[i]),
                    unmet: count(values, vars.unmet[i]),
                    over: count(values, vars.over[i]),
                    demand: vars.demand[i],
                })
                .collect();
            ScenarioPlan {
                name: scenario.name.clone(),
                probability: scenario.probability,
                relocations,
                stations: outcomes,
                transport_cost,
            }
        })
        .collect();

    Ok(SecondStageSolution {
        expected_cost: solved.objective,
        scenarios: plans,
        status: solved.status,
        solve_time: solved.solve_time,
        scenario_set: scenarios.clone(),
    })
}

fn count(values: &[f64], var: VarId) -> u32 {
    values[var.index()].max(0.0).round() as u32
}
