//! Derived per-station vectors and build-time alignment checks

use crate::error::ModelBuildError;
use rebal_core::{BenefitScoring, DemandFractions, DistanceMatrix, StationSet};

/// Benefit coefficient per station, in station order.
pub fn benefit_vector(
    stations: &StationSet,
    scoring: &dyn BenefitScoring,
) -> Result<Vec<f64>, ModelBuildError> {
    stations
        .iter()
        .map(|station| {
            scoring
                .benefit(&station.demand_category)
                .ok_or_else(|| ModelBuildError::UnscoredCategory {
                    profile: scoring.profile_name().to_string(),
                    category: station.demand_category.to_string(),
                    station: station.id.to_string(),
                })
        })
        .collect()
}

/// Baseline demand `fraction(category) · capacity` per station.
pub fn baseline_demand(
    stations: &StationSet,
    demand: &dyn DemandFractions,
) -> Result<Vec<f64>, ModelBuildError> {
    stations
        .iter()
        .map(|station| {
            demand
                .fraction(&station.demand_category)
                .map(|fraction| fraction * station.capacity as f64)
                .ok_or_else(|| ModelBuildError::UnscoredCategory {
                    profile: demand.profile_name().to_string(),
                    category: station.demand_category.to_string(),
                    station: station.id.to_string(),
                })
        })
        .collect()
}

/// Check that an allocation and a distance matrix line up with a station set.
pub fn ensure_recourse_inputs(
    allocation: &[u32],
    stations: &StationSet,
    distances: &DistanceMatrix,
) -> Result<(), ModelBuildError> {
    if stations.is_empty() {
        return Err(ModelBuildError::EmptyStationSet);
    }
    if allocation.len() != stations.len() {
        return Err(ModelBuildError::DimensionMismatch {
            what: "first-stage allocation".to_string(),
            expected: stations.len(),
            found: allocation.len(),
        });
    }
    distances.ensure_aligned(stations)?;
    Ok(())
}

pub(crate) fn ensure_penalty(name: &str, value: f64) -> Result<(), ModelBuildError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ModelBuildError::invalid(
            name,
            format!("must be finite and non-negative, got {}", value),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebal_core::{DemandProfile, ScoringProfile, Station};

    fn stations() -> StationSet {
        StationSet::new(vec![
            Station::new("a", "A", 10, "Highest", 2),
            Station::new("b", "B", 5, "Lowest", 1),
        ])
        .unwrap()
    }

    #[test]
    fn test_benefit_vector_follows_station_order() {
        let benefits = benefit_vector(&stations(), &ScoringProfile::manhattan_2024()).unwrap();
        assert_eq!(benefits, vec![6.995029, 5.518800]);
    }

    #[test]
    fn test_unscored_category() {
        let set = StationSet::new(vec![Station::new("h", "H", 10, "High", 2)]).unwrap();
        let err = benefit_vector(&set, &ScoringProfile::manhattan_2024()).unwrap_err();
        assert_eq!(
            err,
            ModelBuildError::UnscoredCategory {
                profile: "manhattan-2024".into(),
                category: "High".into(),
                station: "h".into(),
            }
        );
    }

    #[test]
    fn test_baseline_demand() {
        let demand = baseline_demand(&stations(), &DemandProfile::manhattan_2024()).unwrap();
        assert!((demand[0] - 8.0).abs() < 1e-12);
        assert!((demand[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_recourse_input_alignment() {
        let distances = DistanceMatrix::from_rows(vec![vec![0.0, 4.0], vec![4.0, 0.0]]).unwrap();

        assert!(ensure_recourse_inputs(&[2, 1], &stations(), &distances).is_ok());
        assert!(matches!(
            ensure_recourse_inputs(&[2], &stations(), &distances),
            Err(ModelBuildError::DimensionMismatch { expected: 2, found: 1, .. })
        ));

        let wide = DistanceMatrix::from_rows(vec![vec![0.0; 3]; 3]).unwrap();
        assert!(matches!(
            ensure_recourse_inputs(&[2, 1], &stations(), &wide),
            Err(ModelBuildError::Validation(_))
        ));
    }

    #[test]
    fn test_penalty_validation() {
        assert!(ensure_penalty("penalty_unmet", 1000.0).is_ok());
        assert!(ensure_penalty("penalty_unmet", -1.0).is_err());
        assert!(ensure_penalty("penalty_unmet", f64::NAN).is_err());
    }
}
