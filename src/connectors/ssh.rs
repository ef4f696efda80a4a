//! Remote deployment over `scp` and `ssh`

use crate::connectors::{CommandRunner, ConnectorError, RemoteChannel, RemoteTarget};
use async_trait::async_trait;
use std::path::Path;

/// ssh and scp both report their own failures with exit code 255
const SSH_TRANSPORT_FAILURE: i32 = 255;

fn classify(err: ConnectorError) -> ConnectorError {
    match err {
        ConnectorError::Command { code, stderr, .. }
            if code == SSH_TRANSPORT_FAILURE || stderr.contains("lost connection") =>
        {
            if stderr.contains("Permission denied") || stderr.contains("Host key verification failed") {
                ConnectorError::Authentication(stderr)
            } else {
                ConnectorError::Connection(stderr)
            }
        }
        other => other,
    }
}

/// Copies an artifact to a host and optionally runs an install command there
pub struct SshChannel {
    runner: CommandRunner,
    target: RemoteTarget,
}

impl SshChannel {
    pub fn new(runner: CommandRunner, target: RemoteTarget) -> Self {
        Self { runner, target }
    }

    fn common_options(&self) -> Vec<String> {
        vec![
            "-i".to_string(),
            self.target.key_path.display().to_string(),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "ConnectTimeout=10".to_string(),
        ]
    }

    fn destination(&self) -> String {
        format!("{}@{}", self.target.user, self.target.host)
    }

    fn scp_args(&self, local: &Path, remote: &str) -> Vec<String> {
        let mut args = self.common_options();
        args.extend(["-P".to_string(), self.target.port.to_string()]);
        args.push(local.display().to_string());
        args.push(format!("{}:{}", self.destination(), remote));
        args
    }

    fn ssh_args(&self, command: &str) -> Vec<String> {
        let mut args = self.common_options();
        args.extend(["-p".to_string(), self.target.port.to_string()]);
        args.push(self.destination());
        args.push(command.to_string());
        args
    }
}

#[async_trait]
impl RemoteChannel for SshChannel {
    async fn deploy(&self, local: &Path, remote: &str) -> Result<(), ConnectorError> {
        if !self.target.key_path.exists() {
            return Err(ConnectorError::Authentication(format!(
                "identity file not found: {}",
                self.target.key_path.display()
            )));
        }

        self.runner
            .run("scp", &self.scp_args(local, remote), None)
            .await
            .map_err(classify)?;

        if let Some(install) = &self.target.install_command {
            self.runner
                .run("ssh", &self.ssh_args(install), None)
                .await
                .map_err(classify)?;
        }

        Ok(())
    }
}
