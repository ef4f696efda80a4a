//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{ListCommand, RunCommand, ValidateCommand};
use std::ffi::OsString;

/// Configuration-driven deployment pipelines
#[derive(Debug, Parser, Clone)]
#[command(name = "deployflow")]
#[command(author = "Deployflow Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Run deployment steps described by configuration", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run deployment steps for an application
    Run(RunCommand),

    /// Check the configuration files
    Validate(ValidateCommand),

    /// List the configured steps
    List(ListCommand),
}

impl Cli {
    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
