//! Scenario sampling for reporting
//!
//! The recourse model is solved jointly over all scenarios. Which single
//! scenario's relocations are reported is a separate, injectable draw that
//! never changes the decision or the expected cost.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rebal_core::ScenarioSet;

/// Picks the scenario whose plan is reported
pub trait ScenarioSampler {
    /// Index into `scenarios`, or `None` when the sampler cannot pick from
    /// this set.
    fn sample(&mut self, scenarios: &ScenarioSet) -> Option<usize>;
}

impl<S: ScenarioSampler + ?Sized> ScenarioSampler for &mut S {
    fn sample(&mut self, scenarios: &ScenarioSet) -> Option<usize> {
        (**self).sample(scenarios)
    }
}

/// Draws a scenario with probability equal to its weight
#[derive(Debug, Clone)]
pub struct WeightedSampler<R> {
    rng: R,
}

impl<R: Rng> WeightedSampler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl WeightedSampler<StdRng> {
    /// Reproducible sampler
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> ScenarioSampler for WeightedSampler<R> {
    fn sample(&mut self, scenarios: &ScenarioSet) -> Option<usize> {
        let u: f64 = self.rng.gen();
        pick(&scenarios.probabilities(), u)
    }
}

/// First index whose cumulative probability exceeds `u`. Rounding slack in
/// the sum falls to the last scenario.
fn pick(probabilities: &[f64], u: f64) -> Option<usize> {
    let mut cumulative = 0.0;
    for (index, p) in probabilities.iter().enumerate() {
        cumulative += p;
        if u < cumulative {
            return Some(index);
        }
    }
    probabilities.len().checked_sub(1)
}

/// Always reports the named scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedScenario(pub String);

impl FixedScenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl ScenarioSampler for FixedScenario {
    fn sample(&mut self, scenarios: &ScenarioSet) -> Option<usize> {
        scenarios.position(&self.0)
    }
}
