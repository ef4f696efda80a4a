//! Cleanup step - remove transient local state

use crate::core::context::ExecutionContext;
use crate::core::params::StepParams;
use crate::core::registry::StepDescriptor;
use crate::steps::{descriptor_for, DeploymentStep, StepDeps, StepError, StepOutcome};
use async_trait::async_trait;
use std::path::Path;

/// Removes every file or directory listed in `paths`; missing paths are skipped
pub struct CleanupStep {
    deps: StepDeps,
}

impl CleanupStep {
    pub const IMPLEMENTATION: &'static str = "cleanup";

    pub fn new(deps: StepDeps) -> Self {
        Self { deps }
    }

    pub fn descriptor() -> StepDescriptor {
        descriptor_for(Self::IMPLEMENTATION, false, Self::new)
    }
}

#[async_trait]
impl DeploymentStep for CleanupStep {
    fn implementation(&self) -> &'static str {
        Self::IMPLEMENTATION
    }

    async fn execute(
        &self,
        context: &ExecutionContext,
        params: &StepParams,
    ) -> Result<StepOutcome, StepError> {
        let paths = params.str_list("paths")?;
        let mut removed = 0;

        for raw in &paths {
            let path = Path::new(raw);
            let metadata = match tokio::fs::symlink_metadata(path).await {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    self.deps.logger.debug(&format!("Nothing to clean at {}", path.display()));
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if metadata.is_dir() {
                tokio::fs::remove_dir_all(path).await?;
            } else {
                tokio::fs::remove_file(path).await?;
            }
            removed += 1;
            self.deps.logger.debug(&format!("Removed {}", path.display()));
        }

        let summary = format!("removed {} of {} path(s) for {}", removed, paths.len(), context.app);
        self.deps.logger.info(&summary);
        Ok(StepOutcome::new(summary))
    }
}
