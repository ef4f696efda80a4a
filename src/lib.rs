//! deployflow - configuration-driven deployment pipelines

pub mod cli;
pub mod connectors;
pub mod core;
pub mod execution;
pub mod steps;

// Re-export commonly used types
pub use crate::core::config::{ConfigError, ConfigPaths, LoadedConfig};
pub use crate::core::{ExecutionContext, RunReport, RunState, SharedLogger, StepRegistry};
pub use connectors::{Connectors, SystemConnectors};
pub use execution::{ExecutionEvent, Orchestrator};
pub use steps::{builtin_catalog, DeploymentStep, StepDeps, StepError, StepOutcome};
