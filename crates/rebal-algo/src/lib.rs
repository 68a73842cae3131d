//! Two-stage stochastic bike rebalancing
//!
//! The first stage ([`first_stage`]) picks how many bikes each station
//! should hold and whether redistributing pays off at all. The second stage
//! ([`second_stage`]) plans weather-dependent relocations from that
//! allocation, minimising expected transport cost plus shortage and
//! overflow penalties. Both stages build an engine-neutral
//! [`milp::MilpModel`] and are solved through the same [`milp::solve_model`]
//! lifecycle; [`RebalancePipeline`] chains them.
//!
//! ```no_run
//! use rebal_algo::{load_config, RebalancePipeline};
//! use rebal_core::{HaversineDistances, StaticCatalog, StationSet};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = load_config(Path::new("rebalance.toml"))?;
//! let engine = config.engine()?;
//! let scoring = config.scoring()?;
//! let demand = config.demand()?;
//! let stations: StationSet = serde_json::from_str(&std::fs::read_to_string("stations.json")?)?;
//!
//! let pipeline = RebalancePipeline::new(&engine, &config, &scoring, &demand);
//! let report = pipeline.run(&StaticCatalog::new(stations), &HaversineDistances, &mut config.sampler())?;
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod first_stage;
pub mod inputs;
pub mod milp;
pub mod pipeline;
pub mod sampler;
pub mod second_stage;

pub use config::{load_config, PipelineConfig};
pub use error::{ErrorKind, ModelBuildError, RebalanceError, RebalanceResult};
pub use first_stage::{solve_first_stage, FirstStageParams, FirstStageSolution, FleetCap};
pub use milp::{GoodLpEngine, MilpBackend, SolveConfig, SolveStatus, SolverEngine};
pub use pipeline::{PlanOutcome, PlanReport, RebalancePipeline};
pub use sampler::{FixedScenario, ScenarioSampler, WeightedSampler};
pub use second_stage::{
    solve_second_stage, ReportedPlan, Relocation, ScenarioPlan, SecondStageParams, SecondStageSolution,
    StationOutcome,
};
