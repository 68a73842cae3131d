//! Benefit scoring and demand profiles
//!
//! Several incompatible category tables have been used across studies, so
//! each table is a named, versioned profile selected per planning run. The
//! optimisers only see the [`BenefitScoring`] and [`DemandFractions`] traits.

use crate::error::{ValidationError, ValidationResult};
use crate::station::DemandCategory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maps a demand category to the benefit of one docked bike.
pub trait BenefitScoring {
    /// Profile name for diagnostics
    fn profile_name(&self) -> &str;

    /// Benefit per bike, or `None` when the category is not scored
    fn benefit(&self, category: &DemandCategory) -> Option<f64>;
}

/// Maps a demand category to expected demand as a fraction of capacity.
pub trait DemandFractions {
    /// Profile name for diagnostics
    fn profile_name(&self) -> &str;

    /// Demand fraction, or `None` when the category is unknown
    fn fraction(&self, category: &DemandCategory) -> Option<f64>;
}

/// Named, versioned benefit table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringProfile {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: u32,
    pub benefits: BTreeMap<String, f64>,
}

fn default_version() -> u32 {
    1
}

impl ScoringProfile {
    /// Create a profile, rejecting non-finite benefits.
    pub fn new(
        name: impl Into<String>,
        version: u32,
        benefits: impl IntoIterator<Item = (String, f64)>,
    ) -> ValidationResult<Self> {
        let profile = Self {
            name: name.into(),
            version,
            benefits: benefits.into_iter().collect(),
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Benefit table derived from the Manhattan station demand study (2024).
    ///
    /// The study never scored a `High` category; stations labelled that way
    /// need a different profile.
    pub fn manhattan_2024() -> Self {
        Self {
            name: "manhattan-2024".to_string(),
            version: 1,
            benefits: [
                ("Lowest", 5.518800),
                ("Low", 5.776327),
                ("Medium", 6.154097),
                ("Highest", 6.995029),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
        }
    }

    pub fn validate(&self) -> ValidationResult<()> {
        for (category, value) in &self.benefits {
            if !value.is_finite() {
                return Err(ValidationError::InvalidProfileValue {
                    profile: self.name.clone(),
                    category: category.clone(),
                    value: *value,
                });
            }
        }
        Ok(())
    }
}

impl BenefitScoring for ScoringProfile {
    fn profile_name(&self) -> &str {
        &self.name
    }

    fn benefit(&self, category: &DemandCategory) -> Option<f64> {
        self.benefits.get(category.as_str()).copied()
    }
}

/// Named, versioned demand-fraction table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandProfile {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: u32,
    pub fractions: BTreeMap<String, f64>,
}

impl DemandProfile {
    /// Create a profile, rejecting fractions that are negative or not finite.
    pub fn new(
        name: impl Into<String>,
        version: u32,
        fractions: impl IntoIterator<Item = (String, f64)>,
    ) -> ValidationResult<Self> {
        let profile = Self {
            name: name.into(),
            version,
            fractions: fractions.into_iter().collect(),
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Demand fractions used with the Manhattan weather scenarios (2024).
    pub fn manhattan_2024() -> Self {
        Self {
            name: "manhattan-2024".to_string(),
            version: 1,
            fractions: [
                ("Lowest", 0.20),
                ("Low", 0.40),
                ("Medium", 0.60),
                ("Highest", 0.80),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
        }
    }

    pub fn validate(&self) -> ValidationResult<()> {
        for (category, value) in &self.fractions {
            if !value.is_finite() || *value < 0.0 {
                return Err(ValidationError::InvalidProfileValue {
                    profile: self.name.clone(),
                    category: category.clone(),
                    value: *value,
                });
            }
        }
        Ok(())
    }
}

impl DemandFractions for DemandProfile {
    fn profile_name(&self) -> &str {
        &self.name
    }

    fn fraction(&self, category: &DemandCategory) -> Option<f64> {
        self.fractions.get(category.as_str()).copied()
    }
}

/// Collection of selectable profiles
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileRegistry {
    #[serde(default)]
    pub scoring: Vec<ScoringProfile>,
    #[serde(default)]
    pub demand: Vec<DemandProfile>,
}

impl ProfileRegistry {
    /// Registry holding the profiles shipped with the crate
    pub fn builtin() -> Self {
        Self {
            scoring: vec![ScoringProfile::manhattan_2024()],
            demand: vec![DemandProfile::manhattan_2024()],
        }
    }

    /// Add or replace profiles by name.
    pub fn extend(&mut self, other: ProfileRegistry) {
        for profile in other.scoring {
            self.scoring.retain(|p| p.name != profile.name);
            self.scoring.push(profile);
        }
        for profile in other.demand {
            self.demand.retain(|p| p.name != profile.name);
            self.demand.push(profile);
        }
    }

    pub fn scoring_profile(&self, name: &str) -> ValidationResult<&ScoringProfile> {
        self.scoring
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ValidationError::UnknownProfile(name.to_string()))
    }

    pub fn demand_profile(&self, name: &str) -> ValidationResult<&DemandProfile> {
        self.demand
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ValidationError::UnknownProfile(name.to_string()))
    }

    pub fn validate(&self) -> ValidationResult<()> {
        self.scoring.iter().try_for_each(ScoringProfile::validate)?;
        self.demand.iter().try_for_each(DemandProfile::validate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manhattan_scoring() {
        let profile = ScoringProfile::manhattan_2024();
        assert_eq!(profile.benefit(&"Highest".into()), Some(6.995029));
        assert_eq!(profile.benefit(&"High".into()), None);
        assert_eq!(profile.profile_name(), "manhattan-2024");
    }

    #[test]
    fn test_rejects_nan_benefit() {
        let err = ScoringProfile::new("broken", 1, [("Low".to_string(), f64::NAN)]).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidProfileValue { .. }));
    }

    #[test]
    fn test_rejects_negative_fraction() {
        let err = DemandProfile::new("broken", 1, [("Low".to_string(), -0.1)]).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidProfileValue { .. }));
    }

    #[test]
    fn test_registry_selects_and_replaces() {
        let mut registry = ProfileRegistry::builtin();
        let flat = ScoringProfile::new(
            "flat",
            2,
            ["Lowest", "Low", "Medium", "High", "Highest"]
                .into_iter()
                .map(|c| (c.to_string(), 1.0)),
        )
        .unwrap();
        registry.extend(ProfileRegistry {
            scoring: vec![flat],
            demand: vec![],
        });

        assert_eq!(registry.scoring_profile("flat").unwrap().version, 2);
        assert!(registry.scoring_profile("manhattan-2024").is_ok());
        assert_eq!(
            registry.demand_profile("missing").unwrap_err(),
            ValidationError::UnknownProfile("missing".into())
        );
    }
}
