//! Test: Variable Substitution - parameter templates resolved per run

use crate::helpers::*;
use deployflow::core::FailureKind;
use deployflow::ExecutionContext;
use serde_json::json;
use std::path::PathBuf;

/// The application identifier is substituted into templated paths
#[tokio::test]
async fn test_app_placeholder() {
    let params = json!({
        "upload": {
            "repository_url": "https://artifacts.example.com/releases",
            "artifact_path": "/deploy/{app}.zip"
        }
    });
    let mut harness = Harness::new(STEPS_CONFIG, &params.to_string(), MockConnectors::new());

    harness
        .run(&["upload"], &ExecutionContext::new("orders-service"))
        .await;

    assert_eq!(
        *harness.connectors.uploaded.lock().unwrap(),
        vec![PathBuf::from("/deploy/orders-service.zip")]
    );
}

/// Target, extra variables and escaped braces all resolve
#[tokio::test]
async fn test_target_variables_and_escapes() {
    let params = json!({
        "deploy": {
            "ssh_user": "deploy-{region}",
            "ssh_key_path": "/keys/{target}",
            "local_package_path": "/build/{app}.tar.gz",
            "remote_package_path": "/srv/{region}/{app}/{{current}}.tar.gz"
        }
    });
    let mut harness = Harness::new(STEPS_CONFIG, &params.to_string(), MockConnectors::new());

    let context = ExecutionContext::new("billing")
        .with_target("web-03")
        .with_variable("region", "eu-west-1");
    let report = harness.run(&["deploy"], &context).await;

    assert_executed(&report, &["deploy"]);
    let deployments = harness.connectors.deployments();
    assert_eq!(deployments.len(), 1);
    assert_eq!(deployments[0].target.user, "deploy-eu-west-1");
    assert_eq!(deployments[0].target.key_path, PathBuf::from("/keys/web-03"));
    assert_eq!(deployments[0].local, PathBuf::from("/build/billing.tar.gz"));
    assert_eq!(deployments[0].remote, "/srv/eu-west-1/billing/{current}.tar.gz");
}

/// Different applications get different values from the same template
#[tokio::test]
async fn test_templates_resolve_per_run() {
    let params = json!({
        "upload": {
            "repository_url": "https://artifacts.example.com/releases",
            "artifact_path": "/deploy/{app}.zip"
        }
    });
    let mut harness = Harness::new(STEPS_CONFIG, &params.to_string(), MockConnectors::new());

    harness.run(&["upload"], &ExecutionContext::new("billing")).await;
    harness.run(&["upload"], &ExecutionContext::new("orders-service")).await;

    assert_eq!(
        *harness.connectors.uploaded.lock().unwrap(),
        vec![
            PathBuf::from("/deploy/billing.zip"),
            PathBuf::from("/deploy/orders-service.zip"),
        ]
    );
}

/// An unknown placeholder is a configuration failure: the step never runs
#[tokio::test]
async fn test_unknown_placeholder_skips_step() {
    let params = json!({
        "upload": {
            "repository_url": "https://artifacts.example.com/releases",
            "artifact_path": "/deploy/{app}-{version}.zip"
        }
    });
    let mut harness = Harness::new(STEPS_CONFIG, &params.to_string(), MockConnectors::new());

    let report = harness
        .run(&["upload", "cleanup"], &ExecutionContext::new("billing"))
        .await;

    assert_executed(&report, &["cleanup"]);
    assert_eq!(harness.connectors.upload_call_count(), 0);
    assert_single_error(&harness.logger, &["upload", "{version}"]);
    assert_eq!(report.failures_of(FailureKind::Configuration).count(), 1);
}

/// Non-string values pass through untouched
#[tokio::test]
async fn test_numeric_parameters_are_not_templated() {
    let params = json!({
        "deploy": {
            "ssh_user": "deploy",
            "ssh_key_path": "/keys/id_ed25519",
            "port": "2200",
            "local_package_path": "/build/{app}.tar.gz",
            "remote_package_path": "/srv/{app}.tar.gz"
        }
    });
    let mut harness = Harness::new(STEPS_CONFIG, &params.to_string(), MockConnectors::new());

    harness
        .run(&["deploy"], &ExecutionContext::new("billing").with_target("web-01"))
        .await;

    assert_eq!(harness.connectors.deployments()[0].target.port, 2200);
    assert_eq!(
        harness.orchestrator.binder().template("deploy").map(|t| t.len()),
        Some(5)
    );
}
