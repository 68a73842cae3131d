//! Weather scenarios for the recourse stage

use crate::error::{ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Allowed deviation of the probability sum from one
pub const PROBABILITY_TOLERANCE: f64 = 1e-9;

/// A discrete, probability-weighted weather outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name (unique within a set)
    pub name: String,
    /// Probability in (0, 1]
    pub probability: f64,
    /// Multiplier applied to baseline station demand
    pub demand_weather_factor: f64,
}

impl Scenario {
    pub fn new(name: impl Into<String>, probability: f64, demand_weather_factor: f64) -> Self {
        Self {
            name: name.into(),
            probability,
            demand_weather_factor,
        }
    }
}

/// Validated scenario set whose probabilities sum to one
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ScenarioSet {
    scenarios: Vec<Scenario>,
}

impl ScenarioSet {
    /// Validate a scenario list. Probabilities are never renormalised.
    pub fn new(scenarios: Vec<Scenario>) -> ValidationResult<Self> {
        if scenarios.is_empty() {
            return Err(ValidationError::NoScenarios);
        }

        let mut names = HashSet::new();
        for scenario in &scenarios {
            if !names.insert(scenario.name.as_str()) {
                return Err(ValidationError::DuplicateScenario(scenario.name.clone()));
            }
            if !(scenario.probability > 0.0 && scenario.probability <= 1.0) {
                return Err(ValidationError::InvalidProbability {
                    name: scenario.name.clone(),
                    probability: scenario.probability,
                });
            }
            if !scenario.demand_weather_factor.is_finite() || scenario.demand_weather_factor < 0.0 {
                return Err(ValidationError::InvalidWeatherFactor {
                    name: scenario.name.clone(),
                    factor: scenario.demand_weather_factor,
                });
            }
        }

        let sum: f64 = scenarios.iter().map(|s| s.probability).sum();
        if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(ValidationError::ProbabilitySum { sum });
        }

        Ok(Self { scenarios })
    }

    /// The four-condition weather mix used for the Manhattan studies.
    pub fn weather_default() -> Self {
        Self {
            scenarios: vec![
                Scenario::new("Cloudy", 0.3, 0.8),
                Scenario::new("Rainy", 0.2, 1.2),
                Scenario::new("Sunny", 0.1, 1.0),
                Scenario::new("Clear", 0.4, 0.9),
            ],
        }
    }

    /// A single certain scenario
    pub fn certain(name: impl Into<String>, demand_weather_factor: f64) -> ValidationResult<Self> {
        Self::new(vec![Scenario::new(name, 1.0, demand_weather_factor)])
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Scenario> {
        self.scenarios.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Scenario> {
        self.scenarios.get(index)
    }

    /// Ordinal position of a scenario by name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.scenarios.iter().position(|s| s.name == name)
    }

    /// Probabilities in scenario order
    pub fn probabilities(&self) -> Vec<f64> {
        self.scenarios.iter().map(|s| s.probability).collect()
    }
}

impl<'a> IntoIterator for &'a ScenarioSet {
    type Item = &'a Scenario;
    type IntoIter = std::slice::Iter<'a, Scenario>;

    fn into_iter(self) -> Self::IntoIter {
        self.scenarios.iter()
    }
}

impl<'de> Deserialize<'de> for ScenarioSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let scenarios = Vec::<Scenario>::deserialize(deserializer)?;
        ScenarioSet::new(scenarios).map_err(serde::de::Error::custom)
    }
}
