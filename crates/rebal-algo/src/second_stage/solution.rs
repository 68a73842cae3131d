//! Second-stage solution data structures

use crate::error::ModelBuildError;
use crate::milp::SolveStatus;
use crate::sampler::ScenarioSampler;
use rebal_core::{ScenarioSet, StationId};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Bikes moved between two distinct stations in one scenario
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relocation {
    pub amount: u32,
    pub from: StationId,
    pub to: StationId,
    /// Ordinal of `from` in the station set
    #[serde(skip)]
    pub from_index: usize,
    /// Ordinal of `to` in the station set
    #[serde(skip)]
    pub to_index: usize,
}

/// End-of-recourse state of one station in one scenario
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationOutcome {
    pub station: StationId,
    /// Bikes docked after relocation
    pub stock: u32,
    /// Demand left unserved
    pub unmet: u32,
    /// Bikes above dock capacity
    pub over: u32,
    /// Demand the station had to serve
    pub demand: f64,
}

/// Recourse plan for one scenario
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioPlan {
    pub name: String,
    pub probability: f64,
    /// Nonzero flows between distinct stations
    pub relocations: Vec<Relocation>,
    pub stations: Vec<StationOutcome>,
    /// `Σ c_ij y_ij` of this scenario, unweighted
    pub transport_cost: f64,
}

impl ScenarioPlan {
    pub fn total_moved(&self) -> u64 {
        self.relocations.iter().map(|r| r.amount as u64).sum()
    }

    pub fn total_unmet(&self) -> u64 {
        self.stations.iter().map(|s| s.unmet as u64).sum()
    }

    pub fn total_over(&self) -> u64 {
        self.stations.iter().map(|s| s.over as u64).sum()
    }
}

/// Relocation plan over every scenario
#[derive(Debug, Clone, Serialize)]
pub struct SecondStageSolution {
    /// Objective value: probability-weighted transport plus penalties
    pub expected_cost: f64,
    pub scenarios: Vec<ScenarioPlan>,
    pub status: SolveStatus,
    #[serde(skip)]
    pub solve_time: Duration,
    #[serde(skip)]
    pub(crate) scenario_set: ScenarioSet,
}

/// Relocations of the one scenario chosen for reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportedPlan {
    pub scenario: String,
    pub relocations: Vec<Relocation>,
    /// Expected cost over all scenarios, not just the reported one
    pub expected_cost: f64,
}

impl SecondStageSolution {
    pub fn is_proven_optimal(&self) -> bool {
        self.status.is_proven_optimal()
    }

    pub fn scenario(&self, name: &str) -> Option<&ScenarioPlan> {
        self.scenarios.iter().find(|plan| plan.name == name)
    }

    /// Relocations keyed by scenario name
    pub fn relocations_by_scenario(&self) -> BTreeMap<&str, &[Relocation]> {
        self.scenarios
            .iter()
            .map(|plan| (plan.name.as_str(), plan.relocations.as_slice()))
            .collect()
    }

    /// Draw the reported scenario. Only the report depends on the draw.
    pub fn report(&self, sampler: &mut dyn ScenarioSampler) -> Result<ReportedPlan, ModelBuildError> {
        let plan = sampler
            .sample(&self.scenario_set)
            .and_then(|index| self.scenarios.get(index))
            .ok_or_else(|| {
                ModelBuildError::invalid("sampler", "did not pick a scenario of this plan")
            })?;
        Ok(ReportedPlan {
            scenario: plan.name.clone(),
            relocations: plan.relocations.clone(),
            expected_cost: self.expected_cost,
        })
    }

    /// Format a human-readable summary
    pub fn summary(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("Second Stage Summary\n{}\n", "=".repeat(40)));
        s.push_str(&format!("Status: {}\n", self.status));
        s.push_str(&format!("Expected cost: {:.4}\n", self.expected_cost));
        for plan in &self.scenarios {
            s.push_str(&format!(
                "  {} (p={:.2}): moved {}, unmet {}, over {}\n",
                plan.name,
                plan.probability,
                plan.total_moved(),
                plan.total_unmet(),
                plan.total_over()
            ));
        }
        s.push_str(&format!("Solve time: {:.2?}\n", self.solve_time));
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::{FixedScenario, WeightedSampler};
    use rebal_core::Scenario;

    fn solution() -> SecondStageSolution {
        let scenario_set = ScenarioSet::new(vec![
            Scenario::new("Rainy", 0.25, 1.2),
            Scenario::new("Clear", 0.75, 0.9),
        ])
        .unwrap();
        let move_one = Relocation {
            amount: 3,
            from: StationId::new("b"),
            to: StationId::new("a"),
            from_index: 1,
            to_index: 0,
        };
        let plan = |name: &str, probability: f64, relocations: Vec<Relocation>| ScenarioPlan {
            name: name.to_string(),
            probability,
            relocations,
            stations: Vec::new(),
            transport_cost: 0.0,
        };
        SecondStageSolution {
            expected_cost: 42.0,
            scenarios: vec![plan("Rainy", 0.25, vec![move_one]), plan("Clear", 0.75, Vec::new())],
            status: SolveStatus::Optimal,
            solve_time: Duration::ZERO,
            scenario_set,
        }
    }

    #[test]
    fn test_relocations_by_scenario() {
        let solution = solution();
        let by_scenario = solution.relocations_by_scenario();
        assert_eq!(by_scenario.len(), 2);
        assert_eq!(by_scenario["Rainy"][0].amount, 3);
        assert!(by_scenario["Clear"].is_empty());
    }

    #[test]
    fn test_report_keeps_full_expectation() {
        let solution = solution();
        let report = solution.report(&mut FixedScenario::new("Rainy")).unwrap();
        assert_eq!(report.scenario, "Rainy");
        assert_eq!(report.relocations.len(), 1);
        assert_eq!(report.expected_cost, 42.0);

        let clear = solution.report(&mut FixedScenario::new("Clear")).unwrap();
        assert!(clear.relocations.is_empty());
        assert_eq!(clear.expected_cost, 42.0);
    }

    #[test]
    fn test_report_with_unknown_scenario() {
        let err = solution().report(&mut FixedScenario::new("Snow")).unwrap_err();
        assert!(matches!(err, ModelBuildError::InvalidParameter { .. }));
    }

    #[test]
    fn test_report_draw_does_not_change_plans() {
        let solution = solution();
        let before = solution.scenarios.clone();
        let mut sampler = WeightedSampler::seeded(3);
        for _ in 0..10 {
            let report = solution.report(&mut sampler).unwrap();
            assert!(solution.scenario(&report.scenario).is_some());
        }
        assert_eq!(solution.scenarios, before);
    }
}
