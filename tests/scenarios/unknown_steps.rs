//! Test: Unknown Steps - names with no registry entry are skipped

use crate::helpers::*;
use deployflow::core::FailureKind;
use deployflow::ExecutionContext;
use serde_json::json;

/// An unknown name between two known steps is logged once and skipped
#[tokio::test]
async fn test_unknown_step_is_skipped() {
    let params = r#"{ "fetch": { "repository": "git@example.com:{app}.git" } }"#;
    let connectors =
        MockConnectors::new().with_revision("git@example.com:orders-service.git", "a1b2c3d");
    let mut harness = Harness::new(STEPS_CONFIG, params, connectors);

    let context = ExecutionContext::new("orders-service");
    let report = harness.run(&["fetch", "bogus", "cleanup"], &context).await;

    assert_executed(&report, &["fetch", "cleanup"]);
    assert_single_error(&harness.logger, &["bogus", "orders-service"]);

    let unknown: Vec<_> = report.failures_of(FailureKind::UnknownStep).collect();
    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown[0].step, "bogus");
}

/// With only fetch and package registered, a request naming an unregistered
/// step runs the other two in order and logs the unknown name once
#[tokio::test]
async fn test_unknown_step_between_fetch_and_package() {
    let scratch = scratch_dir();
    let source = scratch.path().join("source");
    std::fs::create_dir_all(&source).unwrap();

    let steps = r#"{ "fetch": "fetch_code", "package": "package_app" }"#;
    let params = json!({
        "fetch": { "repository": "git@example.com:{app}.git" },
        "package": { "source_dir": source, "output_dir": scratch.path() }
    });
    let connectors =
        MockConnectors::new().with_revision("git@example.com:orders-service.git", "a1b2c3d");
    let mut harness = Harness::new(steps, &params.to_string(), connectors);
    assert_eq!(harness.orchestrator.registry().names(), vec!["fetch", "package"]);

    let context = ExecutionContext::new("orders-service");
    let report = harness.run(&["fetch", "bogus", "package"], &context).await;

    assert_executed(&report, &["fetch", "package"]);
    assert_single_error(&harness.logger, &["bogus"]);
    assert_eq!(
        *harness.connectors.packages.lock().unwrap(),
        vec![(source.clone(), scratch.path().join("orders-service.tar.gz"))]
    );
}

/// A binding to an implementation the catalog lacks is reported while
/// loading, and requesting that step later behaves like any unknown name
#[tokio::test]
async fn test_unknown_implementation_is_reported_at_load() {
    let steps = r#"{ "ship": "teleport", "cleanup": "cleanup" }"#;
    let mut harness = Harness::new(steps, "{}", MockConnectors::new());

    let load_errors = harness.logger.errors();
    assert_eq!(load_errors.len(), 1);
    assert!(load_errors[0].contains("ship"));
    assert!(load_errors[0].contains("teleport"));
    assert_eq!(harness.orchestrator.registry().names(), vec!["cleanup"]);

    let report = harness
        .run(&["ship", "cleanup"], &ExecutionContext::new("billing"))
        .await;
    assert_executed(&report, &["cleanup"]);
    assert_eq!(harness.logger.errors().len(), 2);
}

/// Only unknown names: nothing runs, but the run still completes
#[tokio::test]
async fn test_all_steps_unknown() {
    let mut harness = Harness::new("{}", "{}", MockConnectors::new());

    let report = harness
        .run(&["alpha", "beta"], &ExecutionContext::new("billing"))
        .await;

    assert_executed(&report, &[]);
    assert_eq!(harness.logger.errors().len(), 2);
    assert!(report.completed_at.is_some());
}
