//! Deploy-to-target step - ship an artifact to a remote host

use crate::connectors::RemoteTarget;
use crate::core::context::ExecutionContext;
use crate::core::params::StepParams;
use crate::core::registry::StepDescriptor;
use crate::steps::{descriptor_for, DeploymentStep, StepDeps, StepError, StepOutcome};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

const DEFAULT_SSH_PORT: u64 = 22;

/// Transfers `local_package_path` to `remote_package_path` on the run's
/// target host and runs `install_command` there when configured.
///
/// Requires a deployment target plus `ssh_user`, `ssh_key_path`,
/// `local_package_path` and `remote_package_path`; `port` defaults to 22.
pub struct DeployToTargetStep {
    deps: StepDeps,
}

impl DeployToTargetStep {
    pub const IMPLEMENTATION: &'static str = "deploy_to_target";

    pub fn new(deps: StepDeps) -> Self {
        Self { deps }
    }

    pub fn descriptor() -> StepDescriptor {
        descriptor_for(Self::IMPLEMENTATION, true, Self::new)
    }

    fn remote_target(host: &str, params: &StepParams) -> Result<RemoteTarget, StepError> {
        let port = params.u64_or("port", DEFAULT_SSH_PORT)?;
        let port = u16::try_from(port).map_err(|_| StepError::InvalidParameter {
            name: "port".to_string(),
            expected: "a TCP port number",
        })?;

        Ok(RemoteTarget {
            host: host.to_string(),
            user: params.require_str("ssh_user")?.to_string(),
            key_path: PathBuf::from(params.require_str("ssh_key_path")?),
            port,
            install_command: params.optional_str("install_command")?.map(str::to_string),
        })
    }
}

#[async_trait]
impl DeploymentStep for DeployToTargetStep {
    fn implementation(&self) -> &'static str {
        Self::IMPLEMENTATION
    }

    async fn execute(
        &self,
        context: &ExecutionContext,
        params: &StepParams,
    ) -> Result<StepOutcome, StepError> {
        let host = context.target.as_deref().ok_or(StepError::MissingTarget)?;
        let target = Self::remote_target(host, params)?;
        let local = Path::new(params.require_str("local_package_path")?);
        let remote = params.require_str("remote_package_path")?;

        self.deps.logger.info(&format!(
            "Deploying {} to {} as {}",
            context.app, target.host, target.user
        ));

        self.deps
            .connectors
            .remote_channel(&target)
            .deploy(local, remote)
            .await?;

        Ok(StepOutcome::new(format!(
            "deployed {} to {}:{}",
            context.app, target.host, remote
        )))
    }
}
