use anyhow::{Context, Result};
use clap::Parser;
use deployflow::cli::commands::{ListCommand, RunCommand, ValidateCommand};
use deployflow::cli::output::*;
use deployflow::cli::{Cli, Command};
use deployflow::core::config::LoadedConfig;
use deployflow::core::registry::StepRegistry;
use deployflow::core::{ExecutionContext, SharedLogger, TracingLogger};
use deployflow::execution::{ExecutionEvent, Orchestrator};
use deployflow::steps::{builtin_catalog, StepDeps};
use deployflow::SystemConnectors;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Usage errors exit with 1; --help and --version keep clap's behavior
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            std::process::exit(1);
        }
        Err(e) => e.exit(),
    };

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to set logging subscriber")?;

    let logger = TracingLogger::shared("deployflow");
    let deps = StepDeps::new(logger.clone(), Arc::new(SystemConnectors::new(logger.clone())));

    // Execute command
    match &cli.command {
        Command::Run(cmd) => run_steps(cmd, deps).await?,
        Command::Validate(cmd) => validate_config(cmd, deps)?,
        Command::List(cmd) => list_steps(cmd, deps, logger)?,
    }

    Ok(())
}

async fn run_steps(cmd: &RunCommand, deps: StepDeps) -> Result<()> {
    let paths = cmd.config.paths();
    let mut orchestrator = Orchestrator::from_config(&paths, &builtin_catalog(), deps);

    if cmd.steps.is_empty() {
        println!("{} No steps specified. Available steps:", INFO);
        for name in orchestrator.registry().names() {
            println!("  {}", style(name).bold());
        }
        return Ok(());
    }

    if cmd.target.is_none() {
        let needs_target = orchestrator.steps_requiring_target(&cmd.steps);
        if !needs_target.is_empty() {
            eprintln!(
                "{} --target is required for step(s): {}",
                CROSS,
                style(needs_target.join(", ")).red()
            );
            std::process::exit(1);
        }
    }

    let mut context = ExecutionContext::new(&cmd.app);
    if let Some(target) = &cmd.target {
        context = context.with_target(target);
    }
    for (key, value) in &cmd.var {
        context = context.with_variable(key, value);
    }

    let json = cmd.json;
    let progress = (!json).then(|| create_progress_bar(cmd.steps.len()));
    if let Some(bar) = progress.clone() {
        orchestrator.add_event_handler(move |event| {
            bar.println(format_execution_event(event));
            if matches!(
                event,
                ExecutionEvent::StepSucceeded { .. } | ExecutionEvent::StepFailed { .. } | ExecutionEvent::StepUnknown { .. }
            ) {
                bar.inc(1);
            }
        });
    }

    let report = orchestrator.execute_steps(&cmd.steps, &context).await;

    if let Some(bar) = progress {
        bar.finish_and_clear();
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("\n{}", format_run_summary(&report));
    }

    // Partial failures still count as a normal completion
    Ok(())
}

fn validate_config(cmd: &ValidateCommand, deps: StepDeps) -> Result<()> {
    let paths = cmd.config.paths();
    println!(
        "{} Validating {} and {}",
        INFO,
        style(paths.steps.display()).cyan(),
        style(paths.parameters.display()).cyan()
    );

    let loaded = LoadedConfig::load(&paths);
    let (registry, registry_errors) = StepRegistry::build(&loaded.bindings, &builtin_catalog(), &deps);

    let problems: Vec<_> = loaded.errors.iter().chain(registry_errors.iter()).collect();
    if !problems.is_empty() {
        println!("{} Validation failed:", CROSS);
        for problem in problems {
            println!("  {}", format_config_error(problem));
        }
        std::process::exit(1);
    }

    for step in unconfigured_parameter_steps(&loaded, &registry) {
        println!(
            "{} Parameters declared for unconfigured step {}",
            WARN,
            style(step).yellow()
        );
    }

    println!("{} Configuration is valid!", CHECK);
    println!("  Steps: {}", style(registry.len()).cyan());
    println!("  Parameter templates: {}", style(loaded.parameters.len()).cyan());
    Ok(())
}

fn unconfigured_parameter_steps<'a>(loaded: &'a LoadedConfig, registry: &StepRegistry) -> Vec<&'a str> {
    let mut orphans: Vec<&str> = loaded
        .parameters
        .steps()
        .map(|(step, _)| step)
        .filter(|step| !registry.contains(step))
        .collect();
    orphans.sort_unstable();
    orphans
}

fn list_steps(cmd: &ListCommand, deps: StepDeps, logger: SharedLogger) -> Result<()> {
    let paths = cmd.config.paths();
    let loaded = LoadedConfig::load(&paths);
    for error in &loaded.errors {
        logger.error(&error.to_string());
    }
    let (registry, errors) = StepRegistry::build(&loaded.bindings, &builtin_catalog(), &deps);
    for error in &errors {
        logger.error(&error.to_string());
    }

    let rows: Vec<serde_json::Value> = registry
        .names()
        .into_iter()
        .map(|name| {
            let entry = registry.resolve(name);
            let params: Vec<&String> = loaded
                .parameters
                .get(name)
                .map(|t| t.names().collect())
                .unwrap_or_default();
            serde_json::json!({
                "step": name,
                "implementation": entry.map(|e| e.implementation()),
                "requires_target": entry.is_some_and(|e| e.requires_target()),
                "parameters": params,
            })
        })
        .collect();

    if cmd.json {
        let data = serde_json::json!({ "steps": rows });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("{} No steps configured", INFO);
        return Ok(());
    }

    println!("{} Configured steps:", INFO);
    for row in &rows {
        let params = row["parameters"]
            .as_array()
            .map(|p| p.iter().filter_map(|v| v.as_str()).collect::<Vec<_>>().join(", "))
            .unwrap_or_default();
        println!(
            "  {} {} {}",
            style(row["step"].as_str().unwrap_or_default()).bold(),
            style(format!("({})", row["implementation"].as_str().unwrap_or_default())).dim(),
            style(params).cyan()
        );
    }

    Ok(())
}
