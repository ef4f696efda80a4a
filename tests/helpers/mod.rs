//! Test utilities for deployment runs

use async_trait::async_trait;
use deployflow::connectors::{
    ArtifactRepository, ConnectorError, Connectors, Packager, RemoteChannel, RemoteTarget,
    RepositoryMirror, RevisionSource,
};
use deployflow::core::config::{ConfigFormat, LoadedConfig, ParameterTemplates, StepBindings};
use deployflow::core::MemoryLogger;
use deployflow::{builtin_catalog, ExecutionContext, Orchestrator, RunReport, StepDeps};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Every built-in variant under a short step name
pub const STEPS_CONFIG: &str = r#"{
    "fetch": "fetch_code",
    "compare": "compare_versions",
    "package": "package_app",
    "upload": "upload_artifact",
    "deploy": "deploy_to_target",
    "cleanup": "cleanup",
    "push": "push_mirror"
}"#;

/// A deployment that reached the remote channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub target: RemoteTarget,
    pub local: PathBuf,
    pub remote: String,
}

/// Collaborators that record what they were asked to do
#[derive(Clone, Default)]
pub struct MockConnectors {
    revisions: HashMap<String, String>,
    upload_failures: usize,
    pub upload_calls: Arc<AtomicUsize>,
    pub uploaded: Arc<Mutex<Vec<PathBuf>>>,
    pub packages: Arc<Mutex<Vec<(PathBuf, PathBuf)>>>,
    pub deployments: Arc<Mutex<Vec<Deployment>>>,
    pub pushes: Arc<Mutex<Vec<String>>>,
}

impl MockConnectors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `revision` as the latest revision of `repository`
    pub fn with_revision(mut self, repository: &str, revision: &str) -> Self {
        self.revisions.insert(repository.to_string(), revision.to_string());
        self
    }

    /// Fail the first `count` upload attempts
    pub fn failing_uploads(mut self, count: usize) -> Self {
        self.upload_failures = count;
        self
    }

    pub fn upload_call_count(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn deployments(&self) -> Vec<Deployment> {
        self.deployments.lock().unwrap().clone()
    }
}

struct MockRevisionSource {
    repository: String,
    revision: Option<String>,
}

#[async_trait]
impl RevisionSource for MockRevisionSource {
    async fn fetch_latest_revision(&self) -> Result<String, ConnectorError> {
        self.revision
            .clone()
            .ok_or_else(|| ConnectorError::Network(format!("unreachable repository {}", self.repository)))
    }
}

struct MockMirror {
    mirror_url: String,
    pushes: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl RepositoryMirror for MockMirror {
    async fn push(&self, branch: &str) -> Result<(), ConnectorError> {
        self.pushes
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.mirror_url, branch));
        Ok(())
    }
}

struct MockPackager {
    packages: Arc<Mutex<Vec<(PathBuf, PathBuf)>>>,
}

#[async_trait]
impl Packager for MockPackager {
    async fn create_package(&self, source_dir: &Path, artifact: &Path) -> Result<PathBuf, ConnectorError> {
        self.packages
            .lock()
            .unwrap()
            .push((source_dir.to_path_buf(), artifact.to_path_buf()));
        Ok(artifact.to_path_buf())
    }
}

/// Fails a fixed number of attempts, then succeeds
struct FlakyRepository {
    failures: usize,
    calls: Arc<AtomicUsize>,
    uploaded: Arc<Mutex<Vec<PathBuf>>>,
}

#[async_trait]
impl ArtifactRepository for FlakyRepository {
    async fn attempt_upload(&self, artifact: &Path) -> bool {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call > self.failures {
            self.uploaded.lock().unwrap().push(artifact.to_path_buf());
            true
        } else {
            false
        }
    }
}

struct MockChannel {
    target: RemoteTarget,
    deployments: Arc<Mutex<Vec<Deployment>>>,
}

#[async_trait]
impl RemoteChannel for MockChannel {
    async fn deploy(&self, local: &Path, remote: &str) -> Result<(), ConnectorError> {
        self.deployments.lock().unwrap().push(Deployment {
            target: self.target.clone(),
            local: local.to_path_buf(),
            remote: remote.to_string(),
        });
        Ok(())
    }
}

impl Connectors for MockConnectors {
    fn revision_source(&self, repository: &str, _reference: &str) -> Box<dyn RevisionSource> {
        Box::new(MockRevisionSource {
            repository: repository.to_string(),
            revision: self.revisions.get(repository).cloned(),
        })
    }

    fn repository_mirror(&self, _checkout_dir: &Path, mirror_url: &str) -> Box<dyn RepositoryMirror> {
        Box::new(MockMirror {
            mirror_url: mirror_url.to_string(),
            pushes: Arc::clone(&self.pushes),
        })
    }

    fn packager(&self) -> Box<dyn Packager> {
        Box::new(MockPackager {
            packages: Arc::clone(&self.packages),
        })
    }

    fn artifact_repository(&self, _url: &str) -> Box<dyn ArtifactRepository> {
        Box::new(FlakyRepository {
            failures: self.upload_failures,
            calls: Arc::clone(&self.upload_calls),
            uploaded: Arc::clone(&self.uploaded),
        })
    }

    fn remote_channel(&self, target: &RemoteTarget) -> Box<dyn RemoteChannel> {
        Box::new(MockChannel {
            target: target.clone(),
            deployments: Arc::clone(&self.deployments),
        })
    }
}

/// An orchestrator wired to mock collaborators and an in-memory logger
pub struct Harness {
    pub orchestrator: Orchestrator,
    pub logger: Arc<MemoryLogger>,
    pub connectors: MockConnectors,
}

impl Harness {
    /// Build from JSON configuration text
    pub fn new(steps_json: &str, params_json: &str, connectors: MockConnectors) -> Self {
        let (bindings, mut errors) =
            StepBindings::parse(steps_json, ConfigFormat::Json, Path::new("steps_config.json"))
                .unwrap_or_else(|e| panic!("Failed to parse step bindings: {}", e));
        let (parameters, skipped) =
            ParameterTemplates::parse(params_json, ConfigFormat::Json, Path::new("step_parameters.json"))
                .unwrap_or_else(|e| panic!("Failed to parse step parameters: {}", e));
        errors.extend(skipped);

        let loaded = LoadedConfig {
            bindings,
            parameters,
            errors,
        };
        Self::from_loaded(loaded, connectors)
    }

    pub fn from_loaded(loaded: LoadedConfig, connectors: MockConnectors) -> Self {
        let logger = Arc::new(MemoryLogger::new());
        let deps = StepDeps::new(logger.clone(), Arc::new(connectors.clone()));
        let orchestrator = Orchestrator::from_loaded(loaded, &builtin_catalog(), deps);
        Self {
            orchestrator,
            logger,
            connectors,
        }
    }

    pub async fn run(&mut self, steps: &[&str], context: &ExecutionContext) -> RunReport {
        self.orchestrator.execute_steps(&requested(steps), context).await
    }
}

/// Owned step list from string literals
pub fn requested(steps: &[&str]) -> Vec<String> {
    steps.iter().map(|s| s.to_string()).collect()
}

/// Fresh scratch directory, removed when the guard drops
pub fn scratch_dir() -> TempDir {
    TempDir::new().unwrap()
}

/// Assert the executed list matches exactly
pub fn assert_executed(report: &RunReport, expected: &[&str]) {
    assert_eq!(
        report.executed_steps(),
        requested(expected).as_slice(),
        "Expected executed steps: {:?}\nActual: {:?}\nFailures: {:?}",
        expected,
        report.executed_steps(),
        report.failures
    );
}

/// Assert exactly one error was logged and that it mentions every fragment
pub fn assert_single_error(logger: &MemoryLogger, fragments: &[&str]) {
    let errors = logger.errors();
    assert_eq!(errors.len(), 1, "Expected exactly one error, got: {:?}", errors);
    for fragment in fragments {
        assert!(
            errors[0].contains(fragment),
            "Error:\n{}\n\ndoes not contain:\n{}",
            errors[0],
            fragment
        );
    }
}
