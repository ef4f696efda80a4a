//! CLI command definitions

use crate::core::config::ConfigPaths;
use clap::Args;
use std::path::PathBuf;

/// Configuration file overrides shared by every command
#[derive(Debug, Args, Clone, Default)]
pub struct ConfigArgs {
    /// Step implementation map (JSON or YAML)
    #[arg(long)]
    pub steps_config: Option<PathBuf>,

    /// Step parameter map (JSON or YAML)
    #[arg(long)]
    pub params_config: Option<PathBuf>,
}

impl ConfigArgs {
    /// Discovered default paths with the overrides applied
    pub fn paths(&self) -> ConfigPaths {
        ConfigPaths::discover().with_overrides(self.steps_config.clone(), self.params_config.clone())
    }
}

/// Run deployment steps
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Steps to execute, in order
    #[arg(long, num_args = 1..)]
    pub steps: Vec<String>,

    /// Application identifier
    #[arg(long)]
    pub app: String,

    /// Deployment target host
    #[arg(long)]
    pub target: Option<String>,

    /// Extra template variables (key=value)
    #[arg(long, value_parser = parse_key_value)]
    pub var: Vec<(String, String)>,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Check the configuration files
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// List the configured steps
#[derive(Debug, Args, Clone)]
pub struct ListCommand {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Parse key=value pairs
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let parts: Vec<&str> = s.splitn(2, '=').collect();
    if parts.len() != 2 || parts[0].is_empty() {
        return Err(format!("Invalid key=value pair: {}", s));
    }
    Ok((parts[0].to_string(), parts[1].to_string()))
}
