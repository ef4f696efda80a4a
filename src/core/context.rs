//! Execution context - runtime values available to parameter templates

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Runtime values supplied by the caller for one orchestration run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Application identifier (e.g. "orders-service")
    pub app: String,

    /// Deployment target host, when the run deploys anywhere
    pub target: Option<String>,

    /// Extra template variables (`--var key=value`)
    pub variables: HashMap<String, String>,
}

impl ExecutionContext {
    /// Create a context for an application with no target
    pub fn new(app: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            target: None,
            variables: HashMap::new(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    /// Look up a placeholder name
    ///
    /// `app` and `target` always refer to the run's own values and cannot be
    /// shadowed by extra variables.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        match name {
            "app" => Some(self.app.as_str()),
            "target" => self.target.as_deref(),
            other => self.variables.get(other).map(String::as_str),
        }
    }
}
