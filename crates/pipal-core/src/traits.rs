//! Collaborator traits for shell execution and problem lookup.
//!
//! Implemented by the `pipal-runner` and `pipal-client` crates respectively,
//! and by [`LocalRegistry`](crate::parser::LocalRegistry) for problems on disk.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::model::ProblemMetadata;

// ---------------------------------------------------------------------------
// Shell execution
// ---------------------------------------------------------------------------

/// Runs shell command lines for command checks.
#[async_trait]
pub trait ShellRunner: Send + Sync {
    /// Run a command line to completion and capture its output.
    ///
    /// A non-zero exit status is not an error; only failing to run the
    /// command at all is.
    async fn run(&self, request: &ShellRequest) -> anyhow::Result<ShellOutput>;
}

/// A command line to run through the shell.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShellRequest {
    /// Command line, passed to `sh -c`.
    pub command: String,
    /// Capture stderr interleaved into stdout.
    #[serde(default)]
    pub merge_stderr: bool,
    /// Extra environment variables for the child.
    #[serde(default)]
    pub env: Vec<(String, String)>,
}

impl ShellRequest {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Default::default()
        }
    }

    pub fn merged(mut self) -> Self {
        self.merge_stderr = true;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Captured result of a shell command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShellOutput {
    pub stdout: String,
    /// Empty when stderr was merged.
    pub stderr: String,
    /// `None` if the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
}

impl ShellOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

// ---------------------------------------------------------------------------
// Problem registry
// ---------------------------------------------------------------------------

/// Source of problem metadata.
#[async_trait]
pub trait ProblemRegistry: Send + Sync {
    /// Fetch the metadata for `name`, or [`RegistryError::UnknownProblem`].
    async fn fetch(&self, name: &str) -> Result<ProblemMetadata, RegistryError>;
}
