//! Fetch step - latest source revision

use crate::core::context::ExecutionContext;
use crate::core::params::StepParams;
use crate::core::registry::StepDescriptor;
use crate::steps::{descriptor_for, DeploymentStep, StepDeps, StepError, StepOutcome};
use async_trait::async_trait;

/// Reference resolved when none is configured
pub const DEFAULT_REFERENCE: &str = "HEAD";

/// Looks up the latest revision of a source repository
///
/// Parameters: `repository` (required), `reference` (default `HEAD`).
pub struct FetchCodeStep {
    deps: StepDeps,
}

impl FetchCodeStep {
    pub const IMPLEMENTATION: &'static str = "fetch_code";

    pub fn new(deps: StepDeps) -> Self {
        Self { deps }
    }

    pub fn descriptor() -> StepDescriptor {
        descriptor_for(Self::IMPLEMENTATION, false, Self::new)
    }
}

#[async_trait]
impl DeploymentStep for FetchCodeStep {
    fn implementation(&self) -> &'static str {
        Self::IMPLEMENTATION
    }

    async fn execute(
        &self,
        context: &ExecutionContext,
        params: &StepParams,
    ) -> Result<StepOutcome, StepError> {
        let repository = params.require_str("repository")?;
        let reference = params.optional_str("reference")?.unwrap_or(DEFAULT_REFERENCE);

        self.deps
            .logger
            .info(&format!("Fetching latest revision of {} ({}) for {}", repository, reference, context.app));

        let revision = self
            .deps
            .connectors
            .revision_source(repository, reference)
            .fetch_latest_revision()
            .await?;

        self.deps.logger.info(&format!("Fetched latest revision: {}", revision));
        Ok(StepOutcome::new(format!("{} at {}", repository, revision)))
    }
}
