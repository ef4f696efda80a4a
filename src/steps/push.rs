//! Push step - mirror a branch to a second repository host

use crate::core::context::ExecutionContext;
use crate::core::params::StepParams;
use crate::core::registry::StepDescriptor;
use crate::steps::{descriptor_for, DeploymentStep, StepDeps, StepError, StepOutcome};
use async_trait::async_trait;
use std::path::Path;

const DEFAULT_BRANCH: &str = "main";

/// Pushes `branch` (default `main`) from `checkout_dir` to `mirror_url`
pub struct PushMirrorStep {
    deps: StepDeps,
}

impl PushMirrorStep {
    pub const IMPLEMENTATION: &'static str = "push_mirror";

    pub fn new(deps: StepDeps) -> Self {
        Self { deps }
    }

    pub fn descriptor() -> StepDescriptor {
        descriptor_for(Self::IMPLEMENTATION, false, Self::new)
    }
}

#[async_trait]
impl DeploymentStep for PushMirrorStep {
    fn implementation(&self) -> &'static str {
        Self::IMPLEMENTATION
    }

    async fn execute(
        &self,
        context: &ExecutionContext,
        params: &StepParams,
    ) -> Result<StepOutcome, StepError> {
        let checkout_dir = Path::new(params.require_str("checkout_dir")?);
        let mirror_url = params.require_str("mirror_url")?;
        let branch = params.optional_str("branch")?.unwrap_or(DEFAULT_BRANCH);

        self.deps
            .logger
            .info(&format!("Pushing {} branch {} to {}", context.app, branch, mirror_url));

        self.deps
            .connectors
            .repository_mirror(checkout_dir, mirror_url)
            .push(branch)
            .await?;

        Ok(StepOutcome::new(format!("pushed {} to {}", branch, mirror_url)))
    }
}
