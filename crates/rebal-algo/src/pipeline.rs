//! End-to-end planning cycle
//!
//! Loads the station snapshot and distances, solves the first stage and,
//! when redistribution pays off, the recourse stage. Every input is checked
//! before the first solve so a bad distance table or demand profile never
//! costs a first-stage solve.

use crate::config::PipelineConfig;
use crate::error::{ModelBuildError, RebalanceError};
use crate::first_stage::{solve_first_stage, FirstStageSolution};
use crate::inputs::{baseline_demand, benefit_vector};
use crate::milp::{SolveStatus, SolverEngine};
use crate::sampler::ScenarioSampler;
use crate::second_stage::{solve_second_stage, Relocation, SecondStageSolution};
use rebal_core::{BenefitScoring, DemandFractions, DistanceProvider, StationCatalog};
use serde::Serialize;
use tracing::info;

/// How a planning cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanOutcome {
    /// Both stages solved and a scenario was reported
    Planned,
    /// The first stage decided redistribution does not pay off
    NoRedistribution,
}

/// Result of a planning cycle, as consumed by the reporting layer
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub outcome: PlanOutcome,
    pub net_benefit: f64,
    pub redistribute: bool,
    pub allocation: Vec<u32>,
    pub first_stage_status: SolveStatus,
    pub expected_cost: Option<f64>,
    pub reported_scenario: Option<String>,
    pub relocations: Vec<Relocation>,
    pub second_stage_status: Option<SolveStatus>,
    #[serde(skip)]
    pub first_stage: FirstStageSolution,
    #[serde(skip)]
    pub second_stage: Option<SecondStageSolution>,
}

/// Two-stage planner over injected collaborators
pub struct RebalancePipeline<'a> {
    engine: &'a dyn SolverEngine,
    config: &'a PipelineConfig,
    scoring: &'a dyn BenefitScoring,
    demand: &'a dyn DemandFractions,
}

impl<'a> RebalancePipeline<'a> {
    pub fn new(
        engine: &'a dyn SolverEngine,
        config: &'a PipelineConfig,
        scoring: &'a dyn BenefitScoring,
        demand: &'a dyn DemandFractions,
    ) -> Self {
        Self {
            engine,
            config,
            scoring,
            demand,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        self.config
    }

    /// Run one planning cycle.
    ///
    /// A first-stage failure is returned as is and the recourse stage never
    /// runs. The sampler only selects which scenario is reported.
    pub fn run(
        &self,
        catalog: &dyn StationCatalog,
        distances: &dyn DistanceProvider,
        sampler: &mut dyn ScenarioSampler,
    ) -> Result<PlanReport, RebalanceError> {
        let stations = catalog.stations().map_err(RebalanceError::Catalog)?;
        let matrix = distances
            .distances(&stations)
            .map_err(RebalanceError::Catalog)?;

        if stations.is_empty() {
            return Err(ModelBuildError::EmptyStationSet.into());
        }
        matrix.ensure_aligned(&stations)?;
        self.config.first_stage.validate()?;
        self.config.second_stage.validate()?;
        benefit_vector(&stations, self.scoring)?;
        baseline_demand(&stations, self.demand)?;

        info!(
            stations = stations.len(),
            scenarios = self.config.scenarios.len(),
            engine = self.engine.name(),
            "planning cycle started"
        );

        let first = solve_first_stage(&stations, self.scoring, &self.config.first_stage, self.engine)?;

        if !first.redistribute {
            info!(net_benefit = first.net_benefit, "redistribution does not pay off");
            return Ok(PlanReport {
                outcome: PlanOutcome::NoRedistribution,
                net_benefit: first.net_benefit,
                redistribute: false,
                allocation: Vec::new(),
                first_stage_status: first.status,
                expected_cost: None,
                reported_scenario: None,
                relocations: Vec::new(),
                second_stage_status: None,
                first_stage: first,
                second_stage: None,
            });
        }

        let second = solve_second_stage(
            &first.allocation,
            &stations,
            &matrix,
            &self.config.scenarios,
            self.demand,
            &self.config.second_stage,
            self.engine,
        )?;
        let reported = second.report(sampler)?;

        info!(
            net_benefit = first.net_benefit,
            expected_cost = second.expected_cost,
            reported_scenario = %reported.scenario,
            relocations = reported.relocations.len(),
            "planning cycle finished"
        );

        Ok(PlanReport {
            outcome: PlanOutcome::Planned,
            net_benefit: first.net_benefit,
            redistribute: true,
            allocation: first.allocation.clone(),
            first_stage_status: first.status,
            expected_cost: Some(second.expected_cost),
            reported_scenario: Some(reported.scenario),
            relocations: reported.relocations,
            second_stage_status: Some(second.status),
            first_stage: first,
            second_stage: Some(second),
        })
    }
}
