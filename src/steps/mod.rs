//! Deployment steps
//!
//! A step is one independently executable stage of a deployment. Every
//! variant implements [`DeploymentStep`] and registers a [`StepDescriptor`]
//! in the [`builtin_catalog`], which is the only place that knows the
//! implementation ids configuration files may refer to.

pub mod cleanup;
pub mod compare;
pub mod deploy;
pub mod fetch;
pub mod package;
pub mod push;
pub mod upload;

use crate::connectors::{ConnectorError, Connectors};
use crate::core::context::ExecutionContext;
use crate::core::logger::SharedLogger;
use crate::core::params::StepParams;
use crate::core::registry::{ImplementationCatalog, StepDescriptor};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

pub use cleanup::CleanupStep;
pub use compare::CompareVersionsStep;
pub use deploy::DeployToTargetStep;
pub use fetch::FetchCodeStep;
pub use package::PackageAppStep;
pub use push::PushMirrorStep;
pub use upload::UploadArtifactStep;

/// Why a step failed
#[derive(Debug, Error)]
pub enum StepError {
    #[error("missing required parameter '{0}'")]
    MissingParameter(String),

    #[error("parameter '{name}' must be {expected}")]
    InvalidParameter { name: String, expected: &'static str },

    #[error("deployment target is missing")]
    MissingTarget,

    #[error("upload of {} failed after {attempts} attempt(s)", path.display())]
    UploadExhausted { path: PathBuf, attempts: u32 },

    #[error(transparent)]
    Connector(#[from] ConnectorError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// What a successful step reports back
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub summary: String,
}

impl StepOutcome {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
        }
    }
}

/// One stage of a deployment
///
/// Steps are built fresh for every invocation and must not rely on any other
/// step having run: whatever they need arrives through the context or the
/// resolved parameters.
#[async_trait]
pub trait DeploymentStep: Send + Sync {
    /// Implementation id this step was registered under
    fn implementation(&self) -> &'static str;

    async fn execute(
        &self,
        context: &ExecutionContext,
        params: &StepParams,
    ) -> Result<StepOutcome, StepError>;
}

/// Shared dependencies handed to every step constructor
#[derive(Clone)]
pub struct StepDeps {
    pub logger: SharedLogger,
    pub connectors: Arc<dyn Connectors>,
}

impl StepDeps {
    pub fn new(logger: SharedLogger, connectors: Arc<dyn Connectors>) -> Self {
        Self { logger, connectors }
    }
}

/// Catalog with every built-in step variant registered
pub fn builtin_catalog() -> ImplementationCatalog {
    let mut catalog = ImplementationCatalog::new();
    catalog.register(FetchCodeStep::descriptor());
    catalog.register(CompareVersionsStep::descriptor());
    catalog.register(PackageAppStep::descriptor());
    catalog.register(UploadArtifactStep::descriptor());
    catalog.register(DeployToTargetStep::descriptor());
    catalog.register(CleanupStep::descriptor());
    catalog.register(PushMirrorStep::descriptor());
    catalog
}

/// Descriptor helper for steps that need nothing beyond [`StepDeps`]
pub(crate) fn descriptor_for<S, F>(implementation: &'static str, requires_target: bool, build: F) -> StepDescriptor
where
    S: DeploymentStep + 'static,
    F: Fn(StepDeps) -> S + Send + Sync + 'static,
{
    StepDescriptor::new(implementation, requires_target, move |deps: StepDeps| {
        Box::new(build(deps)) as Box<dyn DeploymentStep>
    })
}
