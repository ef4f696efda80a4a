//! Test: Idempotence - repeated runs give the same result

use crate::helpers::*;
use deployflow::{ExecutionContext, RunState};
use serde_json::json;

/// Running the same list twice executes the same steps both times
#[tokio::test]
async fn test_repeated_runs_match() {
    let params = json!({
        "compare": {
            "source_revision": "a1b2c3d",
            "target_repository": "git@example.com:{app}-live.git"
        }
    });
    let connectors =
        MockConnectors::new().with_revision("git@example.com:billing-live.git", "9f8e7d6");
    let mut harness = Harness::new(STEPS_CONFIG, &params.to_string(), connectors);
    let context = ExecutionContext::new("billing");

    let first = harness.run(&["compare", "cleanup"], &context).await;
    assert_eq!(harness.orchestrator.state(), RunState::Completed);
    let second = harness.run(&["compare", "cleanup"], &context).await;

    assert_executed(&first, &["compare", "cleanup"]);
    assert_eq!(first.executed, second.executed);
    assert_ne!(first.run_id, second.run_id);
    assert!(harness.logger.errors().is_empty());
}

/// Differing and matching revisions are both a successful comparison
#[tokio::test]
async fn test_compare_outcome_is_success_either_way() {
    let params = json!({
        "compare": {
            "source_repository": "git@example.com:{app}.git",
            "target_revision": "{version}"
        }
    });
    let connectors = MockConnectors::new().with_revision("git@example.com:billing.git", "1234abc");
    let mut harness = Harness::new(STEPS_CONFIG, &params.to_string(), connectors);

    let same = ExecutionContext::new("billing").with_variable("version", "1234abc");
    let differs = ExecutionContext::new("billing").with_variable("version", "0000000");

    assert_executed(&harness.run(&["compare"], &same).await, &["compare"]);
    assert_executed(&harness.run(&["compare"], &differs).await, &["compare"]);

    let info = harness.logger.messages(deployflow::core::logger::LogLevel::Info);
    assert!(info.iter().any(|line| line.contains("in sync at 1234abc")));
    assert!(info.iter().any(|line| line.contains("differs")));
}

/// A requested name may appear more than once and runs each time
#[tokio::test]
async fn test_repeated_step_name_runs_twice() {
    let params = json!({
        "push": { "checkout_dir": "/work/{app}", "mirror_url": "git@mirror.example.com:{app}.git" }
    });
    let mut harness = Harness::new(STEPS_CONFIG, &params.to_string(), MockConnectors::new());

    let report = harness
        .run(&["push", "push"], &ExecutionContext::new("billing"))
        .await;

    assert_executed(&report, &["push", "push"]);
    assert_eq!(harness.connectors.pushes.lock().unwrap().len(), 2);
}
