//! End-to-end pipeline tests over the library API: tables from disk,
//! scenarios from JSON, projections and curves checked against hand
//! calculations.

use rc_common::{DrawId, PopulationId};
use rc_config::{CovariateStore, PopulationTable};
use rc_core::curve::RuleCurve;
use rc_core::posterior::{ParameterSummaryTable, PosteriorStore};
use rc_core::projection::{ProjectionConfig, ProjectionEngine};
use rc_core::scenario::{load_scenarios, Scenario, ScenarioBuilder};
use std::io::Write;
use std::path::PathBuf;

struct Fixture {
    _dir: tempfile::TempDir,
    covariates: CovariateStore,
    populations: PopulationTable,
    posterior: PosteriorStore,
    scenarios_path: PathBuf,
}

fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    path
}

/// Two populations, three covariates (one interaction), four draws.
fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();

    let covariates_path = write_file(
        &dir,
        "covariates.csv",
        "name,mean,sd,min_raw,max_raw,min_z,max_z,product_of\n\
         flow_spring,320.0,45.0,200.0,430.0,-2.6,2.4,\n\
         temp_aug,14.2,1.3,11.0,17.5,-2.5,2.5,\n\
         flow_x_temp,0.0,1.0,-6.5,6.0,-6.5,6.0,flow_spring*temp_aug\n",
    );

    let populations_path = write_file(
        &dir,
        "populations.csv",
        "short_name,long_name,latitude,longitude,first_year,last_year,median_density\n\
         bear_valley,Bear Valley Creek,44.4,-115.4,1995,2019,50.0\n\
         marsh,Marsh Creek,44.5,-115.2,1995,2019,12.0\n",
    );

    let posterior_path = write_file(
        &dir,
        "posterior.csv",
        "A[1],A[2],B[1],B[2],\
         \"coef[1,1]\",\"coef[1,2]\",\"coef[1,3]\",\"coef[2,1]\",\"coef[2,2]\",\"coef[2,3]\",\
         mu.coef[1],mu.coef[2],mu.coef[3],phi[1],phi[2]\n\
         1.0,1.2,0.01,0.02,0.5,-0.2,0.1,0.4,-0.1,0.05,0.45,-0.15,0.075,0.1,0.2\n\
         1.1,1.3,0.012,0.021,0.55,-0.25,0.12,0.35,-0.05,0.04,0.45,-0.15,0.08,0.15,0.25\n\
         0.9,1.1,0.009,0.019,0.45,-0.15,0.08,0.5,-0.2,0.06,0.475,-0.175,0.07,0.05,0.1\n\
         1.05,1.25,0.011,0.02,0.52,-0.22,0.11,0.42,-0.12,0.05,0.46,-0.17,0.08,0.12,0.22\n",
    );

    let scenarios_path = write_file(
        &dir,
        "scenarios.json",
        r#"[
            {"name": "warming", "changes": [{"covariate": "temp_aug", "value": 15.5}]},
            {"name": "early_runoff", "changes": [{"covariate": "flow_spring", "shift": -45.0}]},
            {"name": "combined", "stack": ["warming", "early_runoff"]}
        ]"#,
    );

    Fixture {
        covariates: CovariateStore::load(&covariates_path).unwrap(),
        populations: PopulationTable::load(&populations_path).unwrap(),
        posterior: PosteriorStore::load(&posterior_path).unwrap(),
        scenarios_path,
        _dir: dir,
    }
}

#[test]
fn loaded_dimensions_are_consistent() {
    let fx = fixture();
    assert_eq!(fx.covariates.len(), 3);
    assert_eq!(fx.populations.len(), 2);
    assert_eq!(fx.posterior.len(), 4);
    assert_eq!(fx.posterior.population_count(), 2);
    assert_eq!(fx.posterior.covariate_count(), 3);
}

#[test]
fn baseline_identity_holds_across_all_draws_and_populations() {
    let fx = fixture();
    let engine = ProjectionEngine::new(&fx.posterior, &fx.populations).unwrap();
    let draws = engine.select_draws(&ProjectionConfig::default()).unwrap();
    let p = engine
        .project(&Scenario::baseline(&fx.covariates), &draws)
        .unwrap();
    assert!(p.productivity.iter().all(|&v| v == 0.0));
    assert!(p.delta.iter().all(|&v| v == 0.0));
    assert!(p.total_delta.iter().all(|&v| v == 0.0));
}

#[test]
fn scenario_file_drives_projection_with_stacking() {
    let fx = fixture();
    let scenarios = load_scenarios(&fx.scenarios_path, &fx.covariates).unwrap();
    assert_eq!(scenarios.len(), 3);

    let engine = ProjectionEngine::new(&fx.posterior, &fx.populations).unwrap();
    let results = engine
        .project_batch(&scenarios, &ProjectionConfig::default())
        .unwrap();
    assert!(results.iter().all(|(_, r)| r.is_ok()));

    // The combined scenario is not the sum of its parts in recruitment
    // space, but its z-vector components are sums and the interaction a
    // product.
    let combined = &scenarios[2];
    let zt = (15.5 - 14.2) / 1.3;
    let zf = -1.0;
    assert!((combined.z()[0] - zf).abs() < 1e-12);
    assert!((combined.z()[1] - zt).abs() < 1e-12);
    assert!((combined.z()[2] - zf * zt).abs() < 1e-12);
}

#[test]
fn recruitment_deltas_are_additive_over_populations() {
    let fx = fixture();
    let engine = ProjectionEngine::new(&fx.posterior, &fx.populations).unwrap();
    let scenario = ScenarioBuilder::new(&fx.covariates, "warming")
        .set_raw("temp_aug", 16.0)
        .unwrap()
        .build();
    let draws = engine.select_draws(&ProjectionConfig::default()).unwrap();
    let p = engine.project(&scenario, &draws).unwrap();
    for m in 0..p.draw_count() {
        let sum = p.delta(m, PopulationId(0)) + p.delta(m, PopulationId(1));
        assert!((sum - p.total_delta[m]).abs() < 1e-12);
    }
}

#[test]
fn large_population_dominates_total_but_not_productivity() {
    let fx = fixture();
    let engine = ProjectionEngine::new(&fx.posterior, &fx.populations).unwrap();
    let scenario = ScenarioBuilder::new(&fx.covariates, "wetter")
        .set_raw("flow_spring", 400.0)
        .unwrap()
        .build();
    let p = engine.project(&scenario, &[DrawId(0)]).unwrap();
    // bear_valley (S=50) moves more recruits than marsh (S=12)
    assert!(
        p.delta(0, PopulationId(0)).abs() > p.delta(0, PopulationId(1)).abs(),
        "larger population should dominate the total"
    );
    // productivity ignores population size entirely: it is a function of
    // global coefficients and the scenario alone.
    let expected = 0.45 * (400.0 - 320.0) / 45.0;
    assert!((p.productivity[0] - expected).abs() < 1e-12);
}

#[test]
fn extrapolated_scenarios_are_flagged_through_to_results() {
    let fx = fixture();
    let engine = ProjectionEngine::new(&fx.posterior, &fx.populations).unwrap();
    let scenario = ScenarioBuilder::new(&fx.covariates, "far_future")
        .set_raw("temp_aug", 21.0)
        .unwrap()
        .build();
    assert!(scenario.is_extrapolated());
    let p = engine.project(&scenario, &[DrawId(0)]).unwrap();
    assert!(p.extrapolated);
}

#[test]
fn zero_vector_with_fourteen_covariates_gives_zero_productivity() {
    // The model used in production carries 14 covariates; the baseline
    // identity must hold at that width too.
    let c = 14;
    let mut header: Vec<String> = vec!["A[1]".into(), "B[1]".into()];
    header.extend((1..=c).map(|i| format!("\"coef[1,{}]\"", i)));
    header.extend((1..=c).map(|i| format!("mu.coef[{}]", i)));
    let mut rows = Vec::new();
    for d in 0..10 {
        let mut row = vec![format!("{}", 1.0 + d as f64 * 0.01), "0.01".to_string()];
        row.extend((0..c).map(|i| format!("{}", 0.1 * (i as f64 - 7.0))));
        row.extend((0..c).map(|i| format!("{}", 0.05 * (i as f64 - 7.0))));
        rows.push(row.join(","));
    }
    let csv = format!("{}\n{}\n", header.join(","), rows.join("\n"));
    let posterior = PosteriorStore::from_reader(csv.as_bytes()).unwrap();
    assert_eq!(posterior.covariate_count(), 14);

    let populations = PopulationTable::new(vec![rc_config::Population {
        short_name: "bear_valley".into(),
        long_name: "Bear Valley Creek".into(),
        latitude: 44.4,
        longitude: -115.4,
        first_year: 1995,
        last_year: 2019,
        median_density: 50.0,
    }])
    .unwrap();
    let covariates = CovariateStore::new(
        (0..c)
            .map(|i| rc_config::Covariate {
                name: format!("cov_{}", i),
                mean: 0.0,
                sd: 1.0,
                min_raw: -3.0,
                max_raw: 3.0,
                min_z: -3.0,
                max_z: 3.0,
                product_of: None,
            })
            .collect(),
    )
    .unwrap();

    let engine = ProjectionEngine::new(&posterior, &populations).unwrap();
    let draws = engine.select_draws(&ProjectionConfig::default()).unwrap();
    let p = engine.project(&Scenario::baseline(&covariates), &draws).unwrap();
    assert_eq!(p.draw_count(), 10);
    assert!(p.productivity.iter().all(|&v| v == 0.0));
}

#[test]
fn curve_carrying_capacity_matches_a_over_b_for_every_draw() {
    let fx = fixture();
    let baseline = Scenario::baseline(&fx.covariates);
    for m in 0..fx.posterior.len() {
        let view = fx.posterior.view(DrawId(m));
        for j in [PopulationId(0), PopulationId(1)] {
            let curve = RuleCurve::from_draw(&view, j, &baseline, 500.0, 5.0).unwrap();
            let k_direct = view.carrying_capacity(j).unwrap();
            assert!((curve.carrying_capacity() - k_direct).abs() < 1e-12);
            assert_eq!(curve.recruits(0.0), 0.0);
        }
    }
}

#[test]
fn summary_point_curve_agrees_with_draw_summaries() {
    let fx = fixture();
    let table = ParameterSummaryTable::from_summaries(&fx.posterior.summarize(0.95));
    let point = table.ricker_point(PopulationId(0), 3).unwrap();
    // mean of A[1] over the four draws
    let expected_a = (1.0 + 1.1 + 0.9 + 1.05) / 4.0;
    assert!((point.a - expected_a).abs() < 1e-12);

    let curve = RuleCurve::from_point(
        &point,
        PopulationId(0),
        &Scenario::baseline(&fx.covariates),
        200.0,
        50.0,
    )
    .unwrap();
    assert!((curve.carrying_capacity() - point.a / point.b).abs() < 1e-9);
}

#[test]
fn standardize_round_trip_over_the_loaded_store() {
    let fx = fixture();
    for raw in [210.0, 320.0, 429.0] {
        let z = fx.covariates.standardize("flow_spring", raw).unwrap();
        let back = fx.covariates.destandardize("flow_spring", z.z).unwrap();
        assert!((back - raw).abs() < 1e-9);
    }
}
