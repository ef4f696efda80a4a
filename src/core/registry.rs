//! Step registry - maps configured step names to step factories
//!
//! Step variants are registered at startup in an [`ImplementationCatalog`]
//! keyed by implementation id. The [`StepRegistry`] is then built from the
//! step implementation map: every `step name -> implementation id` entry is
//! looked up in the catalog and wrapped in a factory that closes over the
//! shared dependencies. Adding a step variant only touches the catalog.

use crate::core::config::{ConfigError, StepBindings};
use crate::steps::{DeploymentStep, StepDeps};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type StepConstructor = Arc<dyn Fn(StepDeps) -> Box<dyn DeploymentStep> + Send + Sync>;

/// A step variant known at compile time
#[derive(Clone)]
pub struct StepDescriptor {
    implementation: &'static str,
    requires_target: bool,
    construct: StepConstructor,
}

impl StepDescriptor {
    pub fn new<F>(implementation: &'static str, requires_target: bool, construct: F) -> Self
    where
        F: Fn(StepDeps) -> Box<dyn DeploymentStep> + Send + Sync + 'static,
    {
        Self {
            implementation,
            requires_target,
            construct: Arc::new(construct),
        }
    }

    pub fn implementation(&self) -> &'static str {
        self.implementation
    }

    /// Whether the step cannot run without a deployment target
    pub fn requires_target(&self) -> bool {
        self.requires_target
    }

    pub fn build(&self, deps: StepDeps) -> Box<dyn DeploymentStep> {
        (self.construct)(deps)
    }
}

impl fmt::Debug for StepDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDescriptor")
            .field("implementation", &self.implementation)
            .field("requires_target", &self.requires_target)
            .finish()
    }
}

/// Registration side-table of step variants, keyed by implementation id
#[derive(Debug, Clone, Default)]
pub struct ImplementationCatalog {
    descriptors: HashMap<&'static str, StepDescriptor>,
}

impl ImplementationCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a variant, returning the descriptor it replaced
    pub fn register(&mut self, descriptor: StepDescriptor) -> Option<StepDescriptor> {
        self.descriptors.insert(descriptor.implementation, descriptor)
    }

    pub fn get(&self, implementation: &str) -> Option<&StepDescriptor> {
        self.descriptors.get(implementation)
    }

    pub fn implementations(&self) -> Vec<&'static str> {
        self.descriptors.keys().copied().collect()
    }
}

/// Produces a step instance bound to the shared dependencies
pub type StepFactory = Arc<dyn Fn() -> Box<dyn DeploymentStep> + Send + Sync>;

/// A registry entry
#[derive(Clone)]
pub struct RegisteredStep {
    implementation: String,
    requires_target: bool,
    factory: StepFactory,
}

impl RegisteredStep {
    pub fn new<F>(implementation: impl Into<String>, requires_target: bool, factory: F) -> Self
    where
        F: Fn() -> Box<dyn DeploymentStep> + Send + Sync + 'static,
    {
        Self {
            implementation: implementation.into(),
            requires_target,
            factory: Arc::new(factory),
        }
    }

    /// Bind a catalog descriptor to the shared dependencies
    pub fn from_descriptor(descriptor: &StepDescriptor, deps: &StepDeps) -> Self {
        let descriptor = descriptor.clone();
        let deps = deps.clone();
        Self {
            implementation: descriptor.implementation().to_string(),
            requires_target: descriptor.requires_target(),
            factory: Arc::new(move || descriptor.build(deps.clone())),
        }
    }

    pub fn implementation(&self) -> &str {
        &self.implementation
    }

    pub fn requires_target(&self) -> bool {
        self.requires_target
    }

    pub fn factory(&self) -> StepFactory {
        Arc::clone(&self.factory)
    }

    /// Build a fresh step instance
    pub fn instantiate(&self) -> Box<dyn DeploymentStep> {
        (self.factory)()
    }
}

impl fmt::Debug for RegisteredStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredStep")
            .field("implementation", &self.implementation)
            .field("requires_target", &self.requires_target)
            .finish()
    }
}

/// Step name to factory mapping; read-only once a run starts
#[derive(Debug, Clone, Default)]
pub struct StepRegistry {
    steps: HashMap<String, RegisteredStep>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the step implementation map
    ///
    /// Entries that cannot be bound are reported and left out; they never
    /// prevent other entries from loading. For a step name listed more than
    /// once, the first binding wins and each later one is reported.
    pub fn build(
        bindings: &StepBindings,
        catalog: &ImplementationCatalog,
        deps: &StepDeps,
    ) -> (Self, Vec<ConfigError>) {
        let mut registry = Self::new();
        let mut errors = Vec::new();

        for binding in bindings.iter() {
            if registry.contains(&binding.step) {
                errors.push(ConfigError::DuplicateStep {
                    step: binding.step.clone(),
                    implementation: binding.implementation.clone(),
                });
                continue;
            }

            match catalog.get(&binding.implementation) {
                Some(descriptor) => {
                    registry.register(
                        binding.step.clone(),
                        RegisteredStep::from_descriptor(descriptor, deps),
                    );
                }
                None => errors.push(ConfigError::UnknownImplementation {
                    step: binding.step.clone(),
                    implementation: binding.implementation.clone(),
                }),
            }
        }

        (registry, errors)
    }

    /// Add or replace a binding, returning the replaced entry
    pub fn register(&mut self, name: impl Into<String>, step: RegisteredStep) -> Option<RegisteredStep> {
        self.steps.insert(name.into(), step)
    }

    pub fn resolve(&self, name: &str) -> Option<&RegisteredStep> {
        self.steps.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.steps.contains_key(name)
    }

    /// Whether `name` is bound to a step that needs a deployment target
    pub fn requires_target(&self, name: &str) -> bool {
        self.resolve(name).is_some_and(RegisteredStep::requires_target)
    }

    /// Registered step names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.steps.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
