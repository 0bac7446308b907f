//! Mock collaborators for testing checks and problems without a shell or server.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::RegistryError;
use crate::model::ProblemMetadata;
use crate::traits::{ProblemRegistry, ShellOutput, ShellRequest, ShellRunner};

enum Scripted {
    Output { stdout: String, exit_code: i32 },
    SpawnError,
}

/// A shell that answers with canned output keyed by exact command line.
///
/// Unknown commands succeed with empty output.
#[derive(Default)]
pub struct MockShell {
    responses: HashMap<String, Scripted>,
    requests: Mutex<Vec<ShellRequest>>,
}

impl MockShell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `command` with `stdout` and exit code 0.
    pub fn respond(self, command: &str, stdout: &str) -> Self {
        self.respond_with_exit(command, stdout, 0)
    }

    pub fn respond_with_exit(mut self, command: &str, stdout: &str, exit_code: i32) -> Self {
        self.responses.insert(
            command.to_string(),
            Scripted::Output {
                stdout: stdout.to_string(),
                exit_code,
            },
        );
        self
    }

    /// Make `command` fail to spawn.
    pub fn fail_on(mut self, command: &str) -> Self {
        self.responses
            .insert(command.to_string(), Scripted::SpawnError);
        self
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<ShellRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<ShellRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ShellRunner for MockShell {
    async fn run(&self, request: &ShellRequest) -> anyhow::Result<ShellOutput> {
        self.requests.lock().unwrap().push(request.clone());
        match self.responses.get(&request.command) {
            Some(Scripted::Output { stdout, exit_code }) => Ok(ShellOutput {
                stdout: stdout.clone(),
                stderr: String::new(),
                exit_code: Some(*exit_code),
                duration_ms: 0,
            }),
            Some(Scripted::SpawnError) => {
                anyhow::bail!("failed to spawn `{}`: not found", request.command)
            }
            None => Ok(ShellOutput {
                exit_code: Some(0),
                ..Default::default()
            }),
        }
    }
}

/// An in-memory problem registry.
#[derive(Debug, Default)]
pub struct MockRegistry {
    problems: HashMap<String, ProblemMetadata>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_problem(mut self, name: &str, metadata: ProblemMetadata) -> Self {
        self.problems.insert(name.to_string(), metadata);
        self
    }
}

#[async_trait]
impl ProblemRegistry for MockRegistry {
    async fn fetch(&self, name: &str) -> Result<ProblemMetadata, RegistryError> {
        self.problems
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownProblem(name.to_string()))
    }
}
