//! Test: Config Loading - building an orchestrator from files on disk

use crate::helpers::*;
use deployflow::core::MemoryLogger;
use deployflow::{builtin_catalog, ConfigPaths, ExecutionContext, Orchestrator, StepDeps};
use std::path::Path;
use std::sync::Arc;

fn orchestrator_from_files(paths: &ConfigPaths) -> (Orchestrator, Arc<MemoryLogger>) {
    let logger = Arc::new(MemoryLogger::new());
    let deps = StepDeps::new(logger.clone(), Arc::new(MockConnectors::new()));
    let orchestrator = Orchestrator::from_config(paths, &builtin_catalog(), deps);
    (orchestrator, logger)
}

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// YAML bindings and JSON parameters load side by side
#[tokio::test]
async fn test_load_yaml_and_json() {
    let dir = scratch_dir();
    let steps = write(dir.path(), "steps.yaml", "cleanup: cleanup\npush: push_mirror\n");
    let params = write(
        dir.path(),
        "params.json",
        r#"{ "push": { "checkout_dir": "/work/{app}", "mirror_url": "git@mirror.example.com:{app}.git" } }"#,
    );

    let (mut orchestrator, logger) = orchestrator_from_files(&ConfigPaths::new(steps, params));

    assert!(logger.errors().is_empty(), "{:?}", logger.errors());
    assert_eq!(orchestrator.registry().names(), vec!["cleanup", "push"]);

    let report = orchestrator
        .execute_steps(&requested(&["push", "cleanup"]), &ExecutionContext::new("billing"))
        .await;
    assert_executed(&report, &["push", "cleanup"]);
}

/// A missing parameter file is reported but the bindings still load
#[tokio::test]
async fn test_missing_parameter_file() {
    let dir = scratch_dir();
    let steps = write(dir.path(), "steps.json", r#"{ "cleanup": "cleanup" }"#);
    let params = dir.path().join("absent.json");

    let (mut orchestrator, logger) = orchestrator_from_files(&ConfigPaths::new(steps, &params));

    assert_single_error(&logger, &["absent.json"]);
    assert!(orchestrator.registry().contains("cleanup"));

    let report = orchestrator
        .execute_steps(&requested(&["cleanup"]), &ExecutionContext::new("billing"))
        .await;
    assert_executed(&report, &["cleanup"]);
}

/// A malformed bindings file leaves an empty registry; every request is unknown
#[tokio::test]
async fn test_malformed_steps_file() {
    let dir = scratch_dir();
    let steps = write(dir.path(), "steps.json", "{ \"cleanup\": ");
    let params = write(dir.path(), "params.json", "{}");

    let (mut orchestrator, logger) = orchestrator_from_files(&ConfigPaths::new(steps, params));

    assert_single_error(&logger, &["steps.json"]);
    assert!(orchestrator.registry().is_empty());

    let report = orchestrator
        .execute_steps(&requested(&["cleanup"]), &ExecutionContext::new("billing"))
        .await;
    assert_executed(&report, &[]);
    assert_eq!(logger.errors().len(), 2);
}

/// The first binding of a duplicated step name wins
#[tokio::test]
async fn test_duplicate_step_first_wins() {
    let dir = scratch_dir();
    let steps = write(
        dir.path(),
        "steps.json",
        r#"{ "tidy": "cleanup", "tidy": "push_mirror", "ship": "teleport" }"#,
    );
    let params = write(dir.path(), "params.json", "{}");

    let (mut orchestrator, logger) = orchestrator_from_files(&ConfigPaths::new(steps, params));

    let errors = logger.errors();
    assert_eq!(errors.len(), 2, "{:?}", errors);
    assert!(errors.iter().any(|e| e.contains("tidy") && e.contains("more than once")));
    assert!(errors.iter().any(|e| e.contains("teleport")));
    assert_eq!(
        orchestrator.registry().resolve("tidy").map(|s| s.implementation()),
        Some("cleanup")
    );

    // push_mirror would fail without parameters; cleanup succeeds
    let report = orchestrator
        .execute_steps(&requested(&["tidy"]), &ExecutionContext::new("billing"))
        .await;
    assert_executed(&report, &["tidy"]);
}

/// A bad entry is skipped while its neighbours in the same file still run
#[tokio::test]
async fn test_invalid_entry_skips_only_that_step() {
    let dir = scratch_dir();
    let steps = write(
        dir.path(),
        "steps.json",
        r#"{ "tidy": "cleanup", "broken": 5, "push": "push_mirror" }"#,
    );
    let params = write(
        dir.path(),
        "params.json",
        r#"{ "tidy": "not a mapping", "push": { "checkout_dir": "/work/{app}", "mirror_url": "git@mirror.example.com:{app}.git" } }"#,
    );

    let (mut orchestrator, logger) = orchestrator_from_files(&ConfigPaths::new(steps, params));

    let errors = logger.errors();
    assert_eq!(errors.len(), 2, "{:?}", errors);
    assert!(errors.iter().any(|e| e.contains("'broken'") && e.contains("steps.json")));
    assert!(errors.iter().any(|e| e.contains("'tidy'") && e.contains("params.json")));
    assert_eq!(orchestrator.registry().names(), vec!["push", "tidy"]);

    let report = orchestrator
        .execute_steps(&requested(&["tidy", "push"]), &ExecutionContext::new("billing"))
        .await;
    assert_executed(&report, &["tidy", "push"]);
}
