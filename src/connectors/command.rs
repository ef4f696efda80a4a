//! Subprocess runner shared by the system connectors

use crate::connectors::ConnectorError;
use crate::core::logger::SharedLogger;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Captured result of a finished command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Runs external tools with a timeout
#[derive(Clone)]
pub struct CommandRunner {
    logger: SharedLogger,
    timeout_secs: u64,
}

impl CommandRunner {
    pub fn new(logger: SharedLogger, timeout_secs: u64) -> Self {
        Self {
            logger,
            timeout_secs,
        }
    }

    pub fn logger(&self) -> &SharedLogger {
        &self.logger
    }

    /// Run `program` and capture its output, whatever the exit code
    ///
    /// # Errors
    /// - the program cannot be spawned
    /// - it does not finish within the timeout
    pub async fn output(
        &self,
        program: &str,
        args: &[String],
        cwd: Option<&Path>,
    ) -> Result<CommandOutput, ConnectorError> {
        self.logger
            .debug(&format!("Running {} {}", program, args.join(" ")));

        let mut command = Command::new(program);
        command.args(args).kill_on_drop(true);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let output = timeout(Duration::from_secs(self.timeout_secs), command.output())
            .await
            .map_err(|_| ConnectorError::Timeout(program.to_string(), self.timeout_secs))??;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            code: output.status.code().unwrap_or(-1),
        })
    }

    /// Run `program`, treating a non-zero exit as [`ConnectorError::Command`]
    pub async fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: Option<&Path>,
    ) -> Result<String, ConnectorError> {
        let output = self.output(program, args, cwd).await?;
        if !output.success() {
            self.logger.debug(&format!(
                "{} exited with code {}: {}",
                program, output.code, output.stderr
            ));
            return Err(ConnectorError::Command {
                program: program.to_string(),
                code: output.code,
                stderr: output.stderr,
            });
        }
        Ok(output.stdout)
    }
}
