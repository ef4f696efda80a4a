//! CLI output formatting

use crate::core::config::ConfigError;
use crate::core::state::{FailureKind, RunReport};
use crate::execution::ExecutionEvent;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Progress bar advanced once per requested step
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    progress.set_style(style);
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

fn format_failure_kind(kind: FailureKind) -> String {
    match kind {
        FailureKind::UnknownStep => style("UNKNOWN").yellow().to_string(),
        FailureKind::Configuration => style("CONFIG").yellow().to_string(),
        FailureKind::Execution => style("FAILED").red().to_string(),
    }
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::RunStarted { run_id, app, steps } => format!(
            "{} Deploying {} ({}): {}",
            ROCKET,
            style(app).bold(),
            style(&run_id.to_string()[..8]).dim(),
            style(steps.join(" → ")).cyan()
        ),
        ExecutionEvent::StepStarted { step, implementation } => format!(
            "{} {} {}",
            INFO,
            style(step).bold(),
            style(format!("({})", implementation)).dim()
        ),
        ExecutionEvent::StepSucceeded { step, summary } => {
            format!("{} {} {}", CHECK, style(step).bold(), style(summary).dim())
        }
        ExecutionEvent::StepFailed { step, kind, error } => format!(
            "{} {} {} {}",
            CROSS,
            style(step).bold(),
            format_failure_kind(*kind),
            style(error).red()
        ),
        ExecutionEvent::StepUnknown { step } => {
            format!("{} Unknown step {}", WARN, style(step).yellow())
        }
        ExecutionEvent::RunCompleted { executed, .. } => format!(
            "{} Executed: {}",
            INFO,
            style(executed.join(", ")).green()
        ),
    }
}

/// Format the end-of-run summary
pub fn format_run_summary(report: &RunReport) -> String {
    let mut lines = Vec::new();
    let icon = if report.all_succeeded() { CHECK } else { WARN };
    lines.push(format!(
        "{} {}: {}/{} step(s) succeeded",
        icon,
        style(&report.app).bold(),
        style(report.executed.len()).green(),
        report.requested.len()
    ));

    for failure in &report.failures {
        lines.push(format!(
            "  {} {} {}",
            format_failure_kind(failure.kind),
            style(&failure.step).bold(),
            style(&failure.message).dim()
        ));
    }

    if let Some(duration) = report.duration() {
        lines.push(format!("  Duration: {}", style(format_duration(duration)).dim()));
    }

    lines.join("\n")
}

/// Format a configuration problem
pub fn format_config_error(error: &ConfigError) -> String {
    format!("{} {}", CROSS, style(error).red())
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}.{:01}s", secs, duration.subsec_millis() / 100)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
