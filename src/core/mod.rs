//! Core domain models
//!
//! Configuration loading, parameter binding, the step registry and the
//! models describing a run.

pub mod config;
pub mod context;
pub mod logger;
pub mod params;
pub mod registry;
pub mod state;

pub use context::*;
pub use logger::{DeployLogger, MemoryLogger, SharedLogger, TracingLogger};
pub use params::{ParameterBinder, StepParams};
pub use registry::{RegisteredStep, StepRegistry};
pub use state::*;
