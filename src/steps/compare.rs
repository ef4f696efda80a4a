//! Compare step - source revision vs. deployment-target revision

use crate::core::context::ExecutionContext;
use crate::core::params::StepParams;
use crate::core::registry::StepDescriptor;
use crate::steps::fetch::DEFAULT_REFERENCE;
use crate::steps::{descriptor_for, DeploymentStep, StepDeps, StepError, StepOutcome};
use async_trait::async_trait;

/// Reports whether the source and deployment-target revisions differ.
/// Both answers are a successful outcome.
///
/// Each side is either given literally (`source_revision`,
/// `target_revision`) or fetched from a repository (`source_repository`,
/// `target_repository`) at `reference`.
pub struct CompareVersionsStep {
    deps: StepDeps,
}

impl CompareVersionsStep {
    pub const IMPLEMENTATION: &'static str = "compare_versions";

    pub fn new(deps: StepDeps) -> Self {
        Self { deps }
    }

    pub fn descriptor() -> StepDescriptor {
        descriptor_for(Self::IMPLEMENTATION, false, Self::new)
    }

    async fn revision(&self, params: &StepParams, side: &str, reference: &str) -> Result<String, StepError> {
        if let Some(revision) = params.optional_str(&format!("{side}_revision"))? {
            return Ok(revision.to_string());
        }
        let repository = params.require_str(&format!("{side}_repository"))?;
        let revision = self
            .deps
            .connectors
            .revision_source(repository, reference)
            .fetch_latest_revision()
            .await?;
        Ok(revision)
    }
}

#[async_trait]
impl DeploymentStep for CompareVersionsStep {
    fn implementation(&self) -> &'static str {
        Self::IMPLEMENTATION
    }

    async fn execute(
        &self,
        context: &ExecutionContext,
        params: &StepParams,
    ) -> Result<StepOutcome, StepError> {
        let reference = params.optional_str("reference")?.unwrap_or(DEFAULT_REFERENCE);
        let source = self.revision(params, "source", reference).await?;
        let target = self.revision(params, "target", reference).await?;

        let summary = if source == target {
            format!("{} is in sync at {}", context.app, source)
        } else {
            format!("{} differs: source {} vs target {}", context.app, source, target)
        };
        self.deps.logger.info(&summary);

        Ok(StepOutcome::new(summary))
    }
}
