//! Pipeline configuration
//!
//! A planning run is configured from a TOML (or JSON) file:
//!
//! ```toml
//! scoring_profile = "manhattan-2024"
//! demand_profile = "manhattan-2024"
//! backend = "highs"
//! seed = 7
//!
//! [first_stage]
//! fleet_cap = { proportional = { fleet_size = 37369, network_stations = 1915 } }
//! unit_cost = 3.0
//! big_m = 100000.0
//! tolerance = 0.00001
//!
//! [first_stage.solver]
//! time_limit_secs = 300.0
//! relative_gap = 0.01
//!
//! [second_stage]
//! penalty_unmet = 1000.0
//! penalty_over_capacity = 500.0
//!
//! [second_stage.solver]
//! time_limit_secs = 300.0
//! relative_gap = 0.01
//!
//! [[scenarios]]
//! name = "Clear"
//! probability = 1.0
//! demand_weather_factor = 0.9
//! ```
//!
//! `scenarios` defaults to the four-scenario weather set. Extra profiles
//! can be declared with `[[scoring_profiles]]` and `[[demand_profiles]]`;
//! they replace built-in profiles of the same name.

use crate::first_stage::{FirstStageParams, FleetCap};
use crate::milp::{GoodLpEngine, MilpBackend, SolveConfig};
use crate::sampler::WeightedSampler;
use crate::second_stage::SecondStageParams;
use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rebal_core::{DemandProfile, ProfileRegistry, ScenarioSet, ScoringProfile};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Complete configuration of a planning run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub first_stage: FirstStageParams,
    pub second_stage: SecondStageParams,
    #[serde(default = "ScenarioSet::weather_default")]
    pub scenarios: ScenarioSet,
    #[serde(default = "default_profile")]
    pub scoring_profile: String,
    #[serde(default = "default_profile")]
    pub demand_profile: String,
    #[serde(default)]
    pub scoring_profiles: Vec<ScoringProfile>,
    #[serde(default)]
    pub demand_profiles: Vec<DemandProfile>,
    /// MILP backend name; the build default when absent
    #[serde(default)]
    pub backend: Option<String>,
    /// Seed of the reporting sampler; drawn from entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_profile() -> String {
    "manhattan-2024".to_string()
}

impl PipelineConfig {
    /// Parameters of the Manhattan study: 300 s and 1% gap per stage.
    pub fn manhattan_default() -> Result<Self> {
        let solver = SolveConfig::new(Duration::from_secs(300), 0.01)?;
        Ok(Self {
            first_stage: FirstStageParams::new(
                FleetCap::Proportional {
                    fleet_size: 37369,
                    network_stations: 1915,
                },
                3.0,
                1e5,
                1e-5,
                solver,
            ),
            second_stage: SecondStageParams::new(1000.0, 500.0, solver),
            scenarios: ScenarioSet::weather_default(),
            scoring_profile: default_profile(),
            demand_profile: default_profile(),
            scoring_profiles: Vec::new(),
            demand_profiles: Vec::new(),
            backend: None,
            seed: None,
        })
    }

    /// Built-in profiles extended with the ones declared in the file
    pub fn registry(&self) -> ProfileRegistry {
        let mut registry = ProfileRegistry::builtin();
        registry.extend(ProfileRegistry {
            scoring: self.scoring_profiles.clone(),
            demand: self.demand_profiles.clone(),
        });
        registry
    }

    pub fn scoring(&self) -> Result<ScoringProfile> {
        let registry = self.registry();
        let profile = registry
            .scoring_profile(&self.scoring_profile)
            .context("resolving scoring profile")?;
        Ok(profile.clone())
    }

    pub fn demand(&self) -> Result<DemandProfile> {
        let registry = self.registry();
        let profile = registry
            .demand_profile(&self.demand_profile)
            .context("resolving demand profile")?;
        Ok(profile.clone())
    }

    pub fn backend(&self) -> Result<MilpBackend> {
        match &self.backend {
            Some(name) => name.parse(),
            None => Ok(MilpBackend::default()),
        }
    }

    pub fn engine(&self) -> Result<GoodLpEngine> {
        Ok(GoodLpEngine::new(self.backend()?))
    }

    /// Reporting sampler, reproducible when `seed` is set
    pub fn sampler(&self) -> WeightedSampler<StdRng> {
        match self.seed {
            Some(seed) => WeightedSampler::seeded(seed),
            None => WeightedSampler::from_entropy(),
        }
    }

    /// Check every parameter, profile reference and the backend name.
    pub fn validate(&self) -> Result<()> {
        self.first_stage
            .validate()
            .context("invalid [first_stage] parameters")?;
        self.second_stage
            .validate()
            .context("invalid [second_stage] parameters")?;
        self.registry().validate().context("invalid profile table")?;
        self.scoring()?;
        self.demand()?;
        self.backend()?;
        Ok(())
    }
}

/// Load and validate a pipeline configuration file.
pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading pipeline config '{}'", path.display()))?;
    let config: PipelineConfig = match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => {
            serde_json::from_str(&data).context("parsing pipeline config json")?
        }
        _ => toml::from_str(&data).context("parsing pipeline config toml")?,
    };
    config
        .validate()
        .with_context(|| format!("validating pipeline config '{}'", path.display()))?;
    Ok(config)
}
