//! Error types for loading problems and checks.
//!
//! Configuration errors are authoring mistakes in a problem's check list and
//! are surfaced at load time. Evaluation errors raised while running learner
//! code never appear here: checks recover from them and report a failure.

use thiserror::Error;

/// An invalid check specification or check setting.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The spec has neither a `code` nor a `command` key.
    #[error("invalid check specification: {spec}")]
    InvalidCheckSpec { spec: String },

    /// The spec has both `code` and `command`.
    #[error("ambiguous check specification, both `code` and `command` are set: {spec}")]
    AmbiguousCheckSpec { spec: String },

    /// `mode` is something other than `eval` or `exec`.
    #[error("invalid mode: {0:?} (expected \"eval\" or \"exec\")")]
    InvalidMode(String),

    /// A field has the wrong shape or a required field is missing.
    #[error("malformed check specification: {0}")]
    Malformed(String),

    /// The declared expected value cannot be represented as an evaluator value.
    #[error("unsupported expected value for check {name:?}: {reason}")]
    UnsupportedValue { name: String, reason: String },

    /// The command computing a dynamic expected output could not be run.
    #[error("failed to compute expected output with `{command}`: {reason}")]
    ExpectedOutput { command: String, reason: String },
}

/// Errors reported by a problem registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No problem with that name exists.
    #[error("unknown problem: {0}")]
    UnknownProblem(String),

    /// The registry answered but the payload could not be understood.
    #[error("malformed problem {name}: {reason}")]
    Malformed { name: String, reason: String },

    /// Any other failure (IO, network).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors constructing a [`Problem`](crate::problem::Problem).
#[derive(Debug, Error)]
pub enum ProblemError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Check `index` (1-based) of problem `problem` is misconfigured.
    #[error("problem {problem}, check #{index}: {source}")]
    Check {
        problem: String,
        index: usize,
        #[source]
        source: ConfigError,
    },
}

impl ProblemError {
    /// Returns `true` if the problem itself does not exist.
    pub fn is_unknown_problem(&self) -> bool {
        matches!(
            self,
            ProblemError::Registry(RegistryError::UnknownProblem(_))
        )
    }
}
