//! Git-backed revision source and mirror

use crate::connectors::{CommandRunner, ConnectorError, RepositoryMirror, RevisionSource};
use async_trait::async_trait;
use std::path::PathBuf;

/// Map git's stderr onto the collaborator error taxonomy
fn classify(err: ConnectorError) -> ConnectorError {
    match err {
        ConnectorError::Command { stderr, .. }
            if stderr.contains("Could not resolve host")
                || stderr.contains("unable to access")
                || stderr.contains("Connection timed out") =>
        {
            ConnectorError::Network(stderr)
        }
        ConnectorError::Command { stderr, .. }
            if stderr.contains("Authentication failed") || stderr.contains("Permission denied") =>
        {
            ConnectorError::Authentication(stderr)
        }
        other => other,
    }
}

/// Latest revision of a reference on a git remote (`git ls-remote`)
pub struct GitRevisionSource {
    runner: CommandRunner,
    repository: String,
    reference: String,
}

impl GitRevisionSource {
    pub fn new(runner: CommandRunner, repository: String, reference: String) -> Self {
        Self {
            runner,
            repository,
            reference,
        }
    }
}

/// First object id in `git ls-remote` output
fn parse_ls_remote(output: &str) -> Option<String> {
    output
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .find(|id| !id.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl RevisionSource for GitRevisionSource {
    async fn fetch_latest_revision(&self) -> Result<String, ConnectorError> {
        let args = vec![
            "ls-remote".to_string(),
            self.repository.clone(),
            self.reference.clone(),
        ];
        let output = self.runner.run("git", &args, None).await.map_err(classify)?;

        parse_ls_remote(&output).ok_or_else(|| {
            ConnectorError::Api(format!(
                "{} has no reference '{}'",
                self.repository, self.reference
            ))
        })
    }
}

/// Pushes a branch from a local checkout to a mirror remote
pub struct GitMirror {
    runner: CommandRunner,
    checkout_dir: PathBuf,
    mirror_url: String,
}

impl GitMirror {
    pub fn new(runner: CommandRunner, checkout_dir: PathBuf, mirror_url: String) -> Self {
        Self {
            runner,
            checkout_dir,
            mirror_url,
        }
    }
}

#[async_trait]
impl RepositoryMirror for GitMirror {
    async fn push(&self, branch: &str) -> Result<(), ConnectorError> {
        let args = vec![
            "push".to_string(),
            self.mirror_url.clone(),
            format!("{branch}:{branch}"),
        ];
        self.runner
            .run("git", &args, Some(&self.checkout_dir))
            .await
            .map_err(classify)?;
        Ok(())
    }
}
