//! First-stage allocation tests

use rebal_algo::first_stage::{build_first_stage, recommended_big_m};
use rebal_algo::milp::Sense;
use rebal_algo::{
    solve_first_stage, FirstStageParams, FleetCap, GoodLpEngine, ModelBuildError, RebalanceError,
    SolveConfig, SolveStatus,
};
use rebal_core::{ScoringProfile, Station, StationSet};
use std::thread;
use std::time::Duration;

/// Three stations scored 5, 6 and 7 per bike
/// Capacities 10 / 5 / 8, currently holding 2 / 1 / 3 bikes
fn three_stations() -> (StationSet, ScoringProfile) {
    let stations = StationSet::new(vec![
        Station::new("s0", "Broadway & 1st", 10, "A", 2),
        Station::new("s1", "Broadway & 2nd", 5, "B", 1),
        Station::new("s2", "Broadway & 3rd", 8, "C", 3),
    ])
    .unwrap();
    let scoring = ScoringProfile::new(
        "test",
        1,
        [("A", 5.0), ("B", 6.0), ("C", 7.0)].map(|(k, v)| (k.to_string(), v)),
    )
    .unwrap();
    (stations, scoring)
}

fn params(fleet_cap: u64) -> FirstStageParams {
    FirstStageParams::new(
        FleetCap::Absolute(fleet_cap),
        1.0,
        1000.0,
        1e-5,
        SolveConfig::new(Duration::from_secs(60), 0.0).unwrap(),
    )
}

#[test]
fn test_fills_highest_benefit_stations_first() {
    let (stations, scoring) = three_stations();
    let solution = solve_first_stage(&stations, &scoring, &params(15), &GoodLpEngine::default()).unwrap();

    assert!(solution.redistribute);
    assert_eq!(solution.allocation, vec![2, 5, 8]);
    assert!((solution.net_benefit - 87.0).abs() < 1e-6);
    assert_eq!(solution.status, SolveStatus::Optimal);
    assert!(solution.is_proven_optimal());
}

#[test]
fn test_fleet_cap_binds() {
    let (stations, scoring) = three_stations();
    let solution = solve_first_stage(&stations, &scoring, &params(12), &GoodLpEngine::default()).unwrap();

    assert_eq!(solution.allocation, vec![2, 2, 8]);
    assert!((solution.net_benefit - 72.0).abs() < 1e-6);
    assert!(solution.total_allocated() <= 12);
}

#[test]
fn test_deviations_equal_absolute_difference() {
    let (stations, scoring) = three_stations();
    let solution = solve_first_stage(&stations, &scoring, &params(15), &GoodLpEngine::default()).unwrap();

    for ((x, dev), station) in solution
        .allocation
        .iter()
        .zip(&solution.deviations)
        .zip(stations.iter())
    {
        assert_eq!(*dev, x.abs_diff(station.current_bikes));
        assert!(*x <= station.capacity);
    }
}

#[test]
fn test_switch_and_net_benefit_stay_consistent() {
    let (stations, scoring) = three_stations();
    let p = params(15);
    let solution = solve_first_stage(&stations, &scoring, &p, &GoodLpEngine::default()).unwrap();
    assert!(solution.redistribute);
    assert!(solution.net_benefit >= p.tolerance);
}

#[test]
fn test_no_redistribution_when_net_benefit_negative() {
    // Negative benefit: the best move is to empty the station (net −3)
    let stations = StationSet::new(vec![Station::new("only", "Only", 4, "Burden", 3)]).unwrap();
    let scoring = ScoringProfile::new("burden", 1, [("Burden".to_string(), -2.0)]).unwrap();

    let solution = solve_first_stage(&stations, &scoring, &params(10), &GoodLpEngine::default()).unwrap();

    assert!(!solution.redistribute);
    assert!((solution.net_benefit + 3.0).abs() < 1e-6);
    assert!(solution.allocation.is_empty());
    assert!(solution.deviations.is_empty());
}

#[test]
fn test_minimize_sense_reaches_same_decision() {
    let (stations, scoring) = three_stations();
    let engine = GoodLpEngine::default();
    let max = solve_first_stage(&stations, &scoring, &params(15), &engine).unwrap();
    let min = solve_first_stage(
        &stations,
        &scoring,
        &params(15).with_sense(Sense::Minimize),
        &engine,
    )
    .unwrap();

    assert_eq!(max.allocation, min.allocation);
    assert!((max.net_benefit - min.net_benefit).abs() < 1e-6);
}

#[test]
fn test_proportional_fleet_cap() {
    let (stations, scoring) = three_stations();
    let mut p = params(0);
    // floor(3 / 4 · 16) = 12
    p.fleet_cap = FleetCap::Proportional {
        fleet_size: 16,
        network_stations: 4,
    };
    let solution = solve_first_stage(&stations, &scoring, &p, &GoodLpEngine::default()).unwrap();
    assert_eq!(solution.fleet_cap, 12);
    assert_eq!(solution.allocation, vec![2, 2, 8]);
}

#[test]
fn test_resolve_is_deterministic() {
    let (stations, scoring) = three_stations();
    let engine = GoodLpEngine::default();
    let first = solve_first_stage(&stations, &scoring, &params(15), &engine).unwrap();
    let second = solve_first_stage(&stations, &scoring, &params(15), &engine).unwrap();
    assert_eq!(first.net_benefit, second.net_benefit);
}

#[test]
fn test_concurrent_solves_share_engine() {
    let (stations, scoring) = three_stations();
    let engine = GoodLpEngine::default();

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = [15, 12, 15, 12]
            .into_iter()
            .map(|cap| {
                let (stations, scoring, engine) = (&stations, &scoring, &engine);
                scope.spawn(move || solve_first_stage(stations, scoring, &params(cap), engine).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results[0].allocation, vec![2, 5, 8]);
    assert_eq!(results[1].allocation, vec![2, 2, 8]);
    assert_eq!(results[0].allocation, results[2].allocation);
    assert_eq!(results[1].allocation, results[3].allocation);
}

#[test]
fn test_unscored_category_is_build_error() {
    let (stations, _) = three_stations();
    let err = solve_first_stage(
        &stations,
        &ScoringProfile::manhattan_2024(),
        &params(15),
        &GoodLpEngine::default(),
    )
    .unwrap_err();

    match err {
        RebalanceError::ModelBuild(ModelBuildError::UnscoredCategory { station, .. }) => {
            assert_eq!(station, "s0")
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_recommended_big_m_covers_objective() {
    let (stations, scoring) = three_stations();
    let benefits = [5.0, 6.0, 7.0];
    let m = recommended_big_m(
        &benefits,
        &stations.capacities(),
        &stations.current_bikes(),
        1.0,
        1e-5,
    );
    // 5·10 + 8  +  6·5 + 4  +  7·8 + 5
    assert!((m - 153.00001).abs() < 1e-9);

    let mut p = params(15);
    p.big_m = m;
    let built = build_first_stage(&stations, &scoring, &p).unwrap();
    assert!(built.model.constraints().iter().any(|c| c.label == "switch_on"));
}
