//! pipal-runner: local shell execution for command checks.
//!
//! [`LocalShell`] runs command lines through `sh -c` and captures their
//! output for the check engine in `pipal-core`.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;

use pipal_core::traits::{ShellOutput, ShellRequest, ShellRunner};

/// Runs commands with the system shell.
#[derive(Debug, Clone, Default)]
pub struct LocalShell {
    /// Kill the command if it runs longer than this. No limit when unset.
    timeout: Option<Duration>,
    /// Working directory for spawned commands. Inherited when unset.
    current_dir: Option<PathBuf>,
}

impl LocalShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    fn command(&self, request: &ShellRequest) -> Command {
        let line = if request.merge_stderr {
            merged_command_line(&request.command)
        } else {
            request.command.clone()
        };

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        for (key, val) in &request.env {
            cmd.env(key, val);
        }
        cmd
    }
}

/// Wrap a command line so stderr lands in stdout, in order.
///
/// The newline before the closing brace keeps a trailing comment in the
/// command from swallowing it.
fn merged_command_line(command: &str) -> String {
    format!("{{ {command}\n}} 2>&1")
}

#[async_trait]
impl ShellRunner for LocalShell {
    async fn run(&self, request: &ShellRequest) -> Result<ShellOutput> {
        let start = Instant::now();
        let mut cmd = self.command(request);

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, cmd.output())
                .await
                .with_context(|| {
                    format!("`{}` timed out after {limit:?}", request.command)
                })?,
            None => cmd.output().await,
        }
        .with_context(|| format!("failed to run `{}`", request.command))?;

        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(
            command = %request.command,
            exit_code = ?output.status.code(),
            duration_ms,
            "shell command finished"
        );

        Ok(ShellOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
            duration_ms,
        })
    }
}
