//! Upload step - push an artifact to the artifact repository

use crate::core::context::ExecutionContext;
use crate::core::params::StepParams;
use crate::core::registry::StepDescriptor;
use crate::execution::retry::{upload_with_retry, RetryPolicy, UploadResult};
use crate::steps::{descriptor_for, DeploymentStep, StepDeps, StepError, StepOutcome};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Uploads `artifact_path` to `repository_url`, retrying up to
/// `max_attempts` (default 3) with `retry_delay_ms` between attempts.
pub struct UploadArtifactStep {
    deps: StepDeps,
}

impl UploadArtifactStep {
    pub const IMPLEMENTATION: &'static str = "upload_artifact";

    pub fn new(deps: StepDeps) -> Self {
        Self { deps }
    }

    pub fn descriptor() -> StepDescriptor {
        descriptor_for(Self::IMPLEMENTATION, false, Self::new)
    }

    fn policy(params: &StepParams) -> Result<RetryPolicy, StepError> {
        let max_attempts = params.u64_or("max_attempts", RetryPolicy::DEFAULT_MAX_ATTEMPTS as u64)?;
        let max_attempts = u32::try_from(max_attempts).map_err(|_| StepError::InvalidParameter {
            name: "max_attempts".to_string(),
            expected: "at most 4294967295",
        })?;
        let delay_ms = params.u64_or("retry_delay_ms", 0)?;
        Ok(RetryPolicy::new(max_attempts).with_delay(Duration::from_millis(delay_ms)))
    }
}

#[async_trait]
impl DeploymentStep for UploadArtifactStep {
    fn implementation(&self) -> &'static str {
        Self::IMPLEMENTATION
    }

    async fn execute(
        &self,
        context: &ExecutionContext,
        params: &StepParams,
    ) -> Result<StepOutcome, StepError> {
        let repository_url = params.require_str("repository_url")?;
        let artifact = Path::new(params.require_str("artifact_path")?);
        let policy = Self::policy(params)?;

        self.deps.logger.info(&format!(
            "Uploading {} for {} to {}",
            artifact.display(),
            context.app,
            repository_url
        ));

        let repository = self.deps.connectors.artifact_repository(repository_url);
        match upload_with_retry(repository.as_ref(), artifact, policy, self.deps.logger.as_ref()).await {
            UploadResult::Uploaded { attempts } => Ok(StepOutcome::new(format!(
                "uploaded {} in {} attempt(s)",
                artifact.display(),
                attempts
            ))),
            UploadResult::Exhausted { attempts } => Err(StepError::UploadExhausted {
                path: artifact.to_path_buf(),
                attempts,
            }),
        }
    }
}
