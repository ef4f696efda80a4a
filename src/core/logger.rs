//! Deployment logger - the shared sink every component writes to

use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// Logging capability handed to every component at construction.
///
/// Implementations must never fail or panic: a broken sink cannot be
/// allowed to take a deployment run down with it.
pub trait DeployLogger: Send + Sync {
    fn info(&self, message: &str);
    fn warning(&self, message: &str);
    fn error(&self, message: &str);
    fn debug(&self, message: &str);
}

/// Logger handle shared between the orchestrator, registry and steps
pub type SharedLogger = Arc<dyn DeployLogger>;

/// Forwards log entries to `tracing`
#[derive(Debug, Clone)]
pub struct TracingLogger {
    component: String,
}

impl TracingLogger {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }

    /// Wrap into a shared handle
    pub fn shared(component: impl Into<String>) -> SharedLogger {
        Arc::new(Self::new(component))
    }
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new("deployflow")
    }
}

impl DeployLogger for TracingLogger {
    fn info(&self, message: &str) {
        info!(component = %self.component, "{}", message);
    }

    fn warning(&self, message: &str) {
        warn!(component = %self.component, "{}", message);
    }

    fn error(&self, message: &str) {
        error!(component = %self.component, "{}", message);
    }

    fn debug(&self, message: &str) {
        debug!(component = %self.component, "{}", message);
    }
}

/// Severity of a recorded entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// A single recorded log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

/// Logger that keeps every entry in memory
///
/// Useful for embedding (collecting a run transcript) and for asserting on
/// what a run reported.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, level: LogLevel, message: &str) {
        // A poisoned lock still holds usable data; logging must not panic.
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.push(LogEntry {
            level,
            message: message.to_string(),
        });
    }

    /// Snapshot of all entries in the order they were logged
    pub fn entries(&self) -> Vec<LogEntry> {
        match self.entries.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Messages logged at the given level
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.level == level)
            .map(|e| e.message)
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.messages(LogLevel::Error)
    }

    pub fn warnings(&self) -> Vec<String> {
        self.messages(LogLevel::Warning)
    }
}

impl DeployLogger for MemoryLogger {
    fn info(&self, message: &str) {
        self.record(LogLevel::Info, message);
    }

    fn warning(&self, message: &str) {
        self.record(LogLevel::Warning, message);
    }

    fn error(&self, message: &str) {
        self.record(LogLevel::Error, message);
    }

    fn debug(&self, message: &str) {
        self.record(LogLevel::Debug, message);
    }
}
