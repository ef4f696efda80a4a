//! Artifact packaging with `tar`

use crate::connectors::{CommandRunner, ConnectorError, Packager};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Builds gzip-compressed tarballs of a source directory
pub struct TarPackager {
    runner: CommandRunner,
}

impl TarPackager {
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Packager for TarPackager {
    async fn create_package(&self, source_dir: &Path, artifact: &Path) -> Result<PathBuf, ConnectorError> {
        if let Some(parent) = artifact.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let args = vec![
            "-czf".to_string(),
            artifact.display().to_string(),
            "-C".to_string(),
            source_dir.display().to_string(),
            ".".to_string(),
        ];
        self.runner.run("tar", &args, None).await?;

        self.runner
            .logger()
            .debug(&format!("Packaged {} into {}", source_dir.display(), artifact.display()));
        Ok(artifact.to_path_buf())
    }
}
