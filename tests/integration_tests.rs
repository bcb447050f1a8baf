use iqt_rater::config::RunConfig;
use iqt_rater::error::LoadError;
use iqt_rater::geometry::Crs;
use iqt_rater::geometry::linker::link;
use iqt_rater::indicators::types::IqtClass;
use iqt_rater::input::{
    read_compliance_log, read_integrations, read_points, read_punctuality_log, read_score_matrix,
    read_static_attributes, read_trip_log,
};
use iqt_rater::output::{ErrorManifest, write_json, write_results};
use iqt_rater::pipeline::{PipelineInputs, evaluate_matrix, load_points, run};
use iqt_rater::route::{Direction, RouteKey};
use iqt_rater::summary::{integrated_routes, summarize};
use std::path::{Path, PathBuf};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn inputs_from(config: &RunConfig) -> PipelineInputs {
    PipelineInputs {
        static_attributes: read_static_attributes(&config.static_attributes).unwrap().rows,
        trips: config.trips.as_deref().map(|p| read_trip_log(p).unwrap().rows),
        punctuality: config
            .punctuality
            .as_deref()
            .map(|p| read_punctuality_log(p).unwrap().rows),
        compliance: config
            .compliance
            .as_deref()
            .map(|p| read_compliance_log(p).unwrap().rows),
        stops: config.stops.as_deref().map(|p| read_points(p).unwrap().rows),
        geometry_crs: config.geometry_crs,
        points_crs: config.points_crs,
        by_direction: config.by_direction,
        issues: Vec::new(),
    }
}

fn scores_of(report: &iqt_rater::pipeline::PipelineReport, route: &str) -> Vec<u8> {
    let result = report
        .results
        .iter()
        .find(|r| r.key() == &RouteKey::route(route))
        .unwrap();
    result.scores.iter().map(|(_, s)| s).collect()
}

#[test]
fn test_full_pipeline() {
    let config = RunConfig::load(&fixture("run.json")).unwrap();
    let report = run(&inputs_from(&config));

    // Left join on the static table, in its order.
    let routes: Vec<_> = report.results.iter().map(|r| r.key().route.as_str()).collect();
    assert_eq!(routes, vec!["1702", "4601", "0026"]);
    assert!(report.failures.is_empty());

    // Stop spacing 450 m, everything else at the top tier.
    assert_eq!(scores_of(&report, "1702"), vec![3, 1, 3, 3, 3, 3, 3, 3, 3, 3]);
    assert_eq!(report.results[0].class, IqtClass::Excelente);
    assert!((report.results[0].iqt - 2.7758 / 0.551128).abs() < 1e-4);

    // Absent from punctuality and compliance, static spacing as fallback.
    assert_eq!(scores_of(&report, "4601"), vec![1, 3, 0, 0, 0, 0, 0, 0, 0, 0]);
    assert_eq!(report.results[1].class, IqtClass::Insuficiente);

    assert_eq!(scores_of(&report, "0026"), vec![3, 0, 2, 0, 2, 0, 2, 2, 1, 2]);
    assert_eq!(report.results[2].class, IqtClass::Bom);

    assert_eq!(report.records[0].itinerary_ratio, Some(1.0));
    assert_eq!(report.records[0].stop_spacing_m, Some(450.0));
    assert_eq!(report.records[1].interval_minutes, Some(40.0));

    // One bad trip time, one unreadable trajectory.
    assert_eq!(report.issues.len(), 2);
    let sources: Vec<_> = report.issues.iter().map(|i| i.source.as_str()).collect();
    assert!(sources.contains(&"trip_log"));
    assert!(sources.contains(&"punctuality_log"));
}

#[test]
fn test_full_pipeline_is_deterministic() {
    let config = RunConfig::load(&fixture("run.json")).unwrap();
    let inputs = inputs_from(&config);
    let first = run(&inputs);
    let second = run(&inputs);
    assert_eq!(first.results, second.results);
    assert_eq!(first.records, second.records);
}

#[test]
fn test_static_only_pipeline_scores_missing_sources_zero() {
    let inputs = PipelineInputs {
        static_attributes: read_static_attributes(&fixture("static_attributes.csv"))
            .unwrap()
            .rows,
        geometry_crs: Crs::WebMercator,
        ..Default::default()
    };
    let report = run(&inputs);
    assert_eq!(report.results.len(), 3);
    for result in &report.results {
        assert_eq!(result.scores.punctuality, 0);
        assert_eq!(result.scores.frequency, 0);
        assert_eq!(result.scores.itinerary_compliance, 0);
    }
}

#[test]
fn test_results_and_manifest_files() {
    let config = RunConfig::load(&fixture("run.json")).unwrap();
    let report = run(&inputs_from(&config));

    let dir = std::env::temp_dir().join("iqt_rater_integration_out");
    let results_path = dir.join("iqt.csv");
    let manifest_path = dir.join("errors.json");
    write_results(&results_path, &report.results).unwrap();
    write_json(
        &manifest_path,
        &ErrorManifest::new(report.failures, Vec::new(), report.issues),
    )
    .unwrap();

    let csv = std::fs::read_to_string(&results_path).unwrap();
    assert_eq!(csv.lines().count(), 4);
    assert!(csv.lines().nth(1).unwrap().starts_with("1702,,3,1,"));

    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&manifest_path).unwrap()).unwrap();
    assert_eq!(manifest["row_issues"].as_array().unwrap().len(), 2);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_score_matrix_fixture() {
    let matrix = read_score_matrix(&fixture("score_matrix.csv")).unwrap();
    assert!(matrix.issues.is_empty());
    let (results, failures) = evaluate_matrix(matrix.rows);

    let classes: Vec<_> = results.iter().map(|r| (r.key().route.as_str(), r.class)).collect();
    assert_eq!(
        classes,
        vec![
            ("A", IqtClass::Excelente),
            ("B", IqtClass::Insuficiente),
            ("D", IqtClass::Suficiente),
        ]
    );
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].route, "C");
    assert_eq!(failures[0].direction, "volta");
}

#[test]
fn test_link_fixture_points() {
    let residences = read_points(&fixture("residences.csv")).unwrap().rows;
    let stops = read_points(&fixture("stops.csv")).unwrap().rows;
    let (origins, _) = load_points(&residences, Crs::WebMercator).unwrap();
    let (targets, _) = load_points(&stops, Crs::WebMercator).unwrap();

    let links = link(origins.points(), targets.points()).unwrap();
    let nearest: Vec<_> = links.pontos.iter().map(|i| targets.ids[*i].as_str()).collect();
    assert_eq!(nearest, vec!["S1", "S3"]);
    assert!((links.distancias[0] - 2f64.sqrt()).abs() < 1e-9);
}

#[test]
fn test_trip_log_summary_fixture() {
    let rows = read_trip_log(&fixture("trips.csv")).unwrap().rows;
    let mut summary = summarize(&rows);
    let summaries = &summary.routes;

    let order: Vec<_> = summaries.iter().map(|s| s.linha.as_str()).collect();
    assert_eq!(order, vec!["4601", "0026", "1702"]);
    assert_eq!(summaries[0].viagens, 2);
    assert_eq!(summaries[0].media_passageiros, Some(22.0));
    assert_eq!(summaries[0].valor_arrecadado, 99.0);
    assert_eq!(summaries[0].duracao_media_min, Some(40.0));
    assert_eq!(summary.issues.len(), 1);

    // Every trip starts on 01/01/2024; the bad "6h" trip still counts its fare.
    assert_eq!(summary.daily.len(), 3);
    assert!(summary.daily.iter().all(|d| d.data.to_string() == "2024-01-01"));
    let day_4601 = summary.daily.iter().find(|d| d.linha == "4601").unwrap();
    assert_eq!(day_4601.passageiros, 44.0);
    assert_eq!(day_4601.valor_arrecadado, 99.0);

    let month_4601 = summary.monthly.iter().find(|m| m.linha == "4601").unwrap();
    assert_eq!(month_4601.mes, "2024-01");
    assert_eq!(month_4601.duracao_media_min, 40.0);

    summary.rank_by_revenue();
    let order: Vec<_> = summary.routes.iter().map(|s| s.linha.as_str()).collect();
    assert_eq!(order, vec!["4601", "0026", "1702"]);
    assert_eq!(summary.routes[2].valor_arrecadado, 45.5);

    let integrations = read_integrations(&fixture("integrations.csv")).unwrap().rows;
    let integrated = integrated_routes(&integrations);
    summary.mark_integrated(&integrated);
    let flags: Vec<_> = summary.routes.iter().map(|s| s.integrada).collect();
    assert_eq!(flags, vec![Some(true), Some(true), Some(false)]);
}

#[test]
fn test_pipeline_by_direction() {
    let inputs = PipelineInputs {
        static_attributes: read_static_attributes(&fixture("static_by_direction.csv"))
            .unwrap()
            .rows,
        trips: Some(read_trip_log(&fixture("trips_by_direction.csv")).unwrap().rows),
        punctuality: Some(
            read_punctuality_log(&fixture("punctuality_by_direction.csv"))
                .unwrap()
                .rows,
        ),
        compliance: Some(
            read_compliance_log(&fixture("compliance_by_direction.csv"))
                .unwrap()
                .rows,
        ),
        geometry_crs: Crs::WebMercator,
        by_direction: true,
        ..Default::default()
    };
    let report = run(&inputs);
    assert!(report.failures.is_empty());
    assert!(report.issues.is_empty());

    let outbound = RouteKey::new("5500", Some(Direction::Outbound));
    let ret = RouteKey::new("5500", Some(Direction::Return));
    let fallback = RouteKey::new("7000", Some(Direction::Outbound));
    let keys: Vec<_> = report.records.iter().map(|r| r.key.clone()).collect();
    assert_eq!(keys, vec![outbound.clone(), ret.clone(), fallback.clone()]);

    // Each direction joins its own trips, stop events and planned length.
    let out = &report.records[0];
    assert_eq!(out.interval_minutes, Some(5.0));
    assert_eq!(out.punctuality, Some(1.0));
    assert_eq!(out.itinerary_ratio, Some(1.0));

    let back = &report.records[1];
    assert_eq!(back.interval_minutes, Some(45.0));
    assert_eq!(back.punctuality, None);
    assert_eq!(back.itinerary_ratio, Some(0.5));

    // Trips logged without a direction serve the directed static row.
    let route_level = &report.records[2];
    assert_eq!(route_level.interval_minutes, Some(12.0));
    assert_eq!(route_level.itinerary_ratio, None);

    let scores = |key: &RouteKey| {
        let r = report.results.iter().find(|r| r.key() == key).unwrap();
        (
            r.scores.frequency,
            r.scores.punctuality,
            r.scores.itinerary_compliance,
        )
    };
    assert_eq!(scores(&ret), (0, 0, 1));
    assert_eq!(scores(&fallback).0, 2);
    assert_eq!(scores(&fallback).2, 0);
    assert_eq!(scores(&outbound).0, 3);
    assert_eq!(scores(&outbound).2, 3);
}

#[test]
fn test_ragged_source_rows_reach_the_report() {
    let dir = std::env::temp_dir().join("iqt_rater_integration_ragged");
    std::fs::create_dir_all(&dir).unwrap();
    let compliance_path = dir.join("compliance.csv");
    std::fs::write(
        &compliance_path,
        "Trajeto,KM Executado\n\
         1702 - Terminal Sul (ida),0.9\n\
         \"1702 - Terminal Sul (volta)\",0.9,sobra\n\
         1702 - Terminal Sul (volta),0.9\n",
    )
    .unwrap();
    let trips_path = dir.join("trips.csv");
    std::fs::write(
        &trips_path,
        "linha,sentido,hsstart,hsstop,datai,dataf\n\
         1702,0,06:00:00,06:10:00,01/01/2024,01/01/2024\n\
         1702\n",
    )
    .unwrap();

    let compliance = read_compliance_log(&compliance_path).unwrap();
    let trips = read_trip_log(&trips_path).unwrap();
    assert_eq!(trips.rows.len(), 1);
    assert_eq!(trips.issues.len(), 1);

    let mut issues = compliance.issues.clone();
    issues.extend(trips.issues.clone());
    let inputs = PipelineInputs {
        static_attributes: read_static_attributes(&fixture("static_attributes.csv"))
            .unwrap()
            .rows,
        trips: Some(trips.rows),
        compliance: Some(compliance.rows),
        geometry_crs: Crs::WebMercator,
        issues,
        ..Default::default()
    };
    let report = run(&inputs);

    let first = &report.records[0];
    assert_eq!(first.key, RouteKey::route("1702"));
    assert_eq!(first.interval_minutes, Some(10.0));
    assert_eq!(first.itinerary_ratio, Some(1.0));
    assert!(
        report
            .issues
            .iter()
            .any(|i| i.source == "trip_log" && i.row == 2)
    );

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_missing_columns_are_schema_mismatch() {
    // The trip log has none of the punctuality columns.
    let err = read_punctuality_log(&fixture("trips.csv")).unwrap_err();
    match err {
        LoadError::Schema(mismatch) => {
            assert_eq!(mismatch.source_name, "punctuality_log");
            assert!(mismatch.missing.contains(&"Trajeto".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
}
