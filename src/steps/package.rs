//! Package step - build a deployable artifact

use crate::core::context::ExecutionContext;
use crate::core::params::StepParams;
use crate::core::registry::StepDescriptor;
use crate::steps::{descriptor_for, DeploymentStep, StepDeps, StepError, StepOutcome};
use async_trait::async_trait;
use std::path::Path;

/// Packages `source_dir` into `output_dir/artifact_name`
/// (default artifact name: `<app>.tar.gz`).
pub struct PackageAppStep {
    deps: StepDeps,
}

impl PackageAppStep {
    pub const IMPLEMENTATION: &'static str = "package_app";

    pub fn new(deps: StepDeps) -> Self {
        Self { deps }
    }

    pub fn descriptor() -> StepDescriptor {
        descriptor_for(Self::IMPLEMENTATION, false, Self::new)
    }
}

#[async_trait]
impl DeploymentStep for PackageAppStep {
    fn implementation(&self) -> &'static str {
        Self::IMPLEMENTATION
    }

    async fn execute(
        &self,
        context: &ExecutionContext,
        params: &StepParams,
    ) -> Result<StepOutcome, StepError> {
        let source_dir = Path::new(params.require_str("source_dir")?);
        let output_dir = Path::new(params.require_str("output_dir")?);
        let artifact_name = match params.optional_str("artifact_name")? {
            Some(name) => name.to_string(),
            None => format!("{}.tar.gz", context.app),
        };

        if !source_dir.is_dir() {
            return Err(StepError::InvalidParameter {
                name: "source_dir".to_string(),
                expected: "an existing directory",
            });
        }

        self.deps
            .logger
            .info(&format!("Packaging {} from {}", context.app, source_dir.display()));

        let artifact = self
            .deps
            .connectors
            .packager()
            .create_package(source_dir, &output_dir.join(artifact_name))
            .await?;

        Ok(StepOutcome::new(format!("packaged {}", artifact.display())))
    }
}
