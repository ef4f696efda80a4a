//! Orchestrator - runs a requested list of steps in order
//!
//! The pipeline is fail-open: an unknown step name, a parameter that cannot
//! be resolved or a step that fails is logged once on the error channel and
//! the run moves on to the next requested step. Only steps that succeeded
//! end up in the executed list.

use crate::core::config::{ConfigPaths, LoadedConfig};
use crate::core::context::ExecutionContext;
use crate::core::logger::SharedLogger;
use crate::core::params::ParameterBinder;
use crate::core::registry::{ImplementationCatalog, StepRegistry};
use crate::core::state::{FailureKind, RunReport, RunState};
use crate::steps::StepDeps;
use std::sync::Arc;
use uuid::Uuid;

/// Events emitted while a run progresses
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted {
        run_id: Uuid,
        app: String,
        steps: Vec<String>,
    },
    StepStarted {
        step: String,
        implementation: String,
    },
    StepSucceeded {
        step: String,
        summary: String,
    },
    StepFailed {
        step: String,
        kind: FailureKind,
        error: String,
    },
    StepUnknown {
        step: String,
    },
    RunCompleted {
        run_id: Uuid,
        executed: Vec<String>,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(&ExecutionEvent) + Send + Sync>;

/// Drives a deployment run
pub struct Orchestrator {
    registry: StepRegistry,
    binder: ParameterBinder,
    logger: SharedLogger,
    state: RunState,
    event_handlers: Vec<EventHandler>,
}

impl Orchestrator {
    pub fn new(registry: StepRegistry, binder: ParameterBinder, logger: SharedLogger) -> Self {
        Self {
            registry,
            binder,
            logger,
            state: RunState::Idle,
            event_handlers: Vec::new(),
        }
    }

    /// Load both configuration files and build the registry
    ///
    /// Never fails: every configuration problem is logged on the error
    /// channel and whatever valid configuration remains is used.
    pub fn from_config(paths: &ConfigPaths, catalog: &ImplementationCatalog, deps: StepDeps) -> Self {
        let loaded = LoadedConfig::load(paths);
        Self::from_loaded(loaded, catalog, deps)
    }

    /// Build from already-loaded configuration, reporting its errors
    pub fn from_loaded(loaded: LoadedConfig, catalog: &ImplementationCatalog, deps: StepDeps) -> Self {
        let logger = deps.logger.clone();
        for error in &loaded.errors {
            logger.error(&format!("[Orchestrator] {}", error));
        }

        let (registry, errors) = StepRegistry::build(&loaded.bindings, catalog, &deps);
        for error in &errors {
            logger.error(&format!("[Orchestrator] {}", error));
        }

        logger.debug(&format!(
            "[Orchestrator] Registered steps: {:?}",
            registry.names()
        ));

        Self::new(registry, ParameterBinder::new(loaded.parameters), logger)
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(&ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
    }

    fn emit_event(&self, event: ExecutionEvent) {
        for handler in &self.event_handlers {
            handler(&event);
        }
    }

    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    pub fn binder(&self) -> &ParameterBinder {
        &self.binder
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Requested names bound to steps that need a deployment target
    pub fn steps_requiring_target<'a>(&self, requested: &'a [String]) -> Vec<&'a str> {
        requested
            .iter()
            .map(String::as_str)
            .filter(|name| self.registry.requires_target(name))
            .collect()
    }

    /// Run the requested steps in order and report what happened
    ///
    /// Steps run strictly one after another. A failing step never stops the
    /// loop.
    pub async fn execute_steps(&mut self, requested: &[String], context: &ExecutionContext) -> RunReport {
        self.state = RunState::Running;
        let mut report = RunReport::new(&context.app, context.target.as_deref(), requested);

        self.logger.info(&format!(
            "[Orchestrator] Executing deployment steps for {}: {:?}",
            context.app, requested
        ));
        self.emit_event(ExecutionEvent::RunStarted {
            run_id: report.run_id,
            app: context.app.clone(),
            steps: requested.to_vec(),
        });

        for name in requested {
            self.execute_step(name, context, &mut report).await;
        }

        report.complete();
        self.logger.info(&format!(
            "[Orchestrator] Steps executed: {:?}",
            report.executed_steps()
        ));
        self.emit_event(ExecutionEvent::RunCompleted {
            run_id: report.run_id,
            executed: report.executed.clone(),
        });

        self.state = RunState::Completed;
        report
    }

    async fn execute_step(&self, name: &str, context: &ExecutionContext, report: &mut RunReport) {
        let Some(entry) = self.registry.resolve(name) else {
            let message = format!("Unknown step '{}' requested for {}; skipping", name, context.app);
            self.logger.error(&format!("[Orchestrator] {}", message));
            report.record_failure(name, FailureKind::UnknownStep, message);
            self.emit_event(ExecutionEvent::StepUnknown {
                step: name.to_string(),
            });
            return;
        };

        let step = entry.instantiate();
        self.emit_event(ExecutionEvent::StepStarted {
            step: name.to_string(),
            implementation: entry.implementation().to_string(),
        });

        let params = match self.binder.resolve(name, context) {
            Ok(params) => params,
            Err(e) => {
                let message = format!("Cannot resolve parameters of step '{}' for {}: {}", name, context.app, e);
                self.fail(name, FailureKind::Configuration, message, report);
                return;
            }
        };
        self.logger.debug(&format!(
            "[Orchestrator] Step '{}' ({}) parameters: {:?}",
            name,
            entry.implementation(),
            params
        ));

        match step.execute(context, &params).await {
            Ok(outcome) => {
                self.logger.info(&format!(
                    "[Orchestrator] Step '{}' completed for {}: {}",
                    name, context.app, outcome.summary
                ));
                report.record_success(name);
                self.emit_event(ExecutionEvent::StepSucceeded {
                    step: name.to_string(),
                    summary: outcome.summary,
                });
            }
            Err(e) => {
                let message = format!("Step '{}' failed for {}: {}", name, context.app, e);
                self.fail(name, FailureKind::Execution, message, report);
            }
        }
    }

    fn fail(&self, name: &str, kind: FailureKind, message: String, report: &mut RunReport) {
        self.logger.error(&format!("[Orchestrator] {}", message));
        self.emit_event(ExecutionEvent::StepFailed {
            step: name.to_string(),
            kind,
            error: message.clone(),
        });
        report.record_failure(name, kind, message);
    }
}
