//! Run state and run report models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Orchestrator lifecycle
///
/// There is no failed state: a run always proceeds to the end of the
/// requested list and completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    /// No run has started
    Idle,
    /// A run is in progress
    Running,
    /// The last run reached the end of its requested list
    Completed,
}

/// Why a requested step did not make it into the executed list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No registry entry for the requested name
    UnknownStep,
    /// Its parameters could not be resolved
    Configuration,
    /// The step ran and failed
    Execution,
}

/// A requested step that did not succeed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFailure {
    pub step: String,
    pub kind: FailureKind,
    pub message: String,
}

/// Record of one orchestration run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub app: String,
    pub target: Option<String>,
    /// Step names in the order they were requested
    pub requested: Vec<String>,
    /// Step names that succeeded, in execution order
    pub executed: Vec<String>,
    pub failures: Vec<StepFailure>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl RunReport {
    pub fn new(app: &str, target: Option<&str>, requested: &[String]) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            app: app.to_string(),
            target: target.map(str::to_string),
            requested: requested.to_vec(),
            executed: Vec::new(),
            failures: Vec::new(),
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn record_success(&mut self, step: &str) {
        self.executed.push(step.to_string());
    }

    pub fn record_failure(&mut self, step: &str, kind: FailureKind, message: String) {
        self.failures.push(StepFailure {
            step: step.to_string(),
            kind,
            message,
        });
    }

    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    /// The executed steps, in order
    pub fn executed_steps(&self) -> &[String] {
        &self.executed
    }

    /// Whether every requested step succeeded
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures_of(&self, kind: FailureKind) -> impl Iterator<Item = &StepFailure> {
        self.failures.iter().filter(move |f| f.kind == kind)
    }

    /// Run duration, once completed
    pub fn duration(&self) -> Option<std::time::Duration> {
        self.completed_at
            .and_then(|end| end.signed_duration_since(self.started_at).to_std().ok())
    }
}
