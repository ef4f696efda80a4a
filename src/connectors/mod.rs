//! External collaborators used by the deployment steps
//!
//! Steps are thin adapters: the real work (talking to git remotes, building
//! archives, uploading to an artifact repository, shipping to a remote host)
//! happens behind the traits in this module. [`SystemConnectors`] backs them
//! with local tools run as subprocesses and an HTTP client for uploads;
//! tests substitute their own.

pub mod archive;
pub mod artifactory;
pub mod command;
pub mod git;
pub mod ssh;

use crate::core::logger::SharedLogger;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub use archive::TarPackager;
pub use artifactory::HttpArtifactRepository;
pub use command::CommandRunner;
pub use git::{GitMirror, GitRevisionSource};
pub use ssh::SshChannel;

/// Failures reported by collaborators
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("{program} exited with code {code}: {stderr}")]
    Command {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("{0} timed out after {1} seconds")]
    Timeout(String, u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of revision identifiers (a git remote, a hosted repository API, ...)
#[async_trait]
pub trait RevisionSource: Send + Sync {
    async fn fetch_latest_revision(&self) -> Result<String, ConnectorError>;
}

/// Pushes a local checkout to a mirror repository
#[async_trait]
pub trait RepositoryMirror: Send + Sync {
    async fn push(&self, branch: &str) -> Result<(), ConnectorError>;
}

/// Produces a deployable artifact from a source directory
#[async_trait]
pub trait Packager: Send + Sync {
    /// Package `source_dir` into `artifact`, returning the artifact path
    async fn create_package(&self, source_dir: &Path, artifact: &Path) -> Result<PathBuf, ConnectorError>;
}

/// Artifact repository client
#[async_trait]
pub trait ArtifactRepository: Send + Sync {
    /// One upload attempt; `false` means the attempt failed and may be retried
    async fn attempt_upload(&self, artifact: &Path) -> bool;
}

/// Remote-execution channel to a deployment host
#[async_trait]
pub trait RemoteChannel: Send + Sync {
    /// Transfer `local` to `remote` on the host and install it
    async fn deploy(&self, local: &Path, remote: &str) -> Result<(), ConnectorError>;
}

/// Where and how to reach a deployment host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub host: String,
    pub user: String,
    pub key_path: PathBuf,
    pub port: u16,
    /// Command run on the host after the transfer
    pub install_command: Option<String>,
}

/// Builds collaborators from step parameters
pub trait Connectors: Send + Sync {
    fn revision_source(&self, repository: &str, reference: &str) -> Box<dyn RevisionSource>;

    fn repository_mirror(&self, checkout_dir: &Path, mirror_url: &str) -> Box<dyn RepositoryMirror>;

    fn packager(&self) -> Box<dyn Packager>;

    fn artifact_repository(&self, url: &str) -> Box<dyn ArtifactRepository>;

    fn remote_channel(&self, target: &RemoteTarget) -> Box<dyn RemoteChannel>;
}

/// Collaborators backed by `git`, `tar`, `scp`, `ssh` and HTTP uploads
#[derive(Clone)]
pub struct SystemConnectors {
    runner: CommandRunner,
    http: reqwest::Client,
}

impl SystemConnectors {
    /// Default timeout for a single external command or upload request
    pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

    pub fn new(logger: SharedLogger) -> Self {
        Self::with_timeout(logger, Self::DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(logger: SharedLogger, timeout_secs: u64) -> Self {
        Self {
            http: artifactory::http_client(Duration::from_secs(timeout_secs)),
            runner: CommandRunner::new(logger, timeout_secs),
        }
    }
}

impl Connectors for SystemConnectors {
    fn revision_source(&self, repository: &str, reference: &str) -> Box<dyn RevisionSource> {
        Box::new(GitRevisionSource::new(
            self.runner.clone(),
            repository.to_string(),
            reference.to_string(),
        ))
    }

    fn repository_mirror(&self, checkout_dir: &Path, mirror_url: &str) -> Box<dyn RepositoryMirror> {
        Box::new(GitMirror::new(
            self.runner.clone(),
            checkout_dir.to_path_buf(),
            mirror_url.to_string(),
        ))
    }

    fn packager(&self) -> Box<dyn Packager> {
        Box::new(TarPackager::new(self.runner.clone()))
    }

    fn artifact_repository(&self, url: &str) -> Box<dyn ArtifactRepository> {
        Box::new(HttpArtifactRepository::new(
            self.http.clone(),
            url.to_string(),
            self.runner.logger().clone(),
        ))
    }

    fn remote_channel(&self, target: &RemoteTarget) -> Box<dyn RemoteChannel> {
        Box::new(SshChannel::new(self.runner.clone(), target.clone()))
    }
}
