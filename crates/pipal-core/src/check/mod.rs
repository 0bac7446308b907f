//! Checks: single assertions within a problem's verification suite.
//!
//! A [`Check`] is built from a raw spec with [`Check::load`]. Configuration
//! errors surface there; [`Check::run`] never fails, it reports through the
//! borrowed [`LineSink`] and returns whether the check passed.

mod command;
mod function;

use std::path::PathBuf;
use std::sync::Arc;

pub use command::CommandCheck;
pub use function::FunctionCheck;

use crate::env::Environment;
use crate::error::ConfigError;
use crate::evaluator::Evaluator;
use crate::logger::LineSink;
use crate::model::CheckSpec;
use crate::traits::ShellRunner;

/// Symbol prefixed to a passing check's line.
pub const PASS_MARK: &str = "✓";
/// Symbol prefixed to a failing check's line.
pub const FAIL_MARK: &str = "✗";

/// Capabilities shared by every check of a problem.
#[derive(Clone)]
pub struct CheckContext {
    pub evaluator: Arc<dyn Evaluator>,
    pub shell: Arc<dyn ShellRunner>,
    /// Directory of the problem's files.
    pub problem_root: PathBuf,
}

impl CheckContext {
    pub fn new(evaluator: Arc<dyn Evaluator>, shell: Arc<dyn ShellRunner>) -> Self {
        Self {
            evaluator,
            shell,
            problem_root: PathBuf::from("."),
        }
    }

    pub fn with_problem_root(mut self, root: PathBuf) -> Self {
        self.problem_root = root;
        self
    }
}

/// A loaded check.
pub enum Check {
    Function(FunctionCheck),
    Command(CommandCheck),
}

impl Check {
    /// Build a check from a raw spec.
    ///
    /// Command checks with a dynamic expected output run the reference
    /// command here, once.
    pub async fn load(spec: &serde_json::Value, ctx: &CheckContext) -> Result<Check, ConfigError> {
        match CheckSpec::from_json(spec)? {
            CheckSpec::Function(spec) => FunctionCheck::new(spec, ctx).map(Check::Function),
            CheckSpec::Command(spec) => CommandCheck::new(spec, ctx).await.map(Check::Command),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Check::Function(c) => c.name(),
            Check::Command(c) => c.name(),
        }
    }

    /// Run the check against `env`, logging its outcome.
    pub async fn run(&self, env: &Environment, log: &mut dyn LineSink) -> bool {
        tracing::debug!(check = self.name(), "running check");
        match self {
            Check::Function(c) => c.run(env, log),
            Check::Command(c) => c.run(env, log).await,
        }
    }
}

fn pass_line(name: &str) -> String {
    format!("{PASS_MARK} {name}")
}

fn fail_line(name: &str) -> String {
    format!("{FAIL_MARK} {name}")
}
