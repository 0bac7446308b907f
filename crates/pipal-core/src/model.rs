//! Core data model types for pipal.
//!
//! Problem metadata as delivered by a registry, the tagged check
//! specifications built from it, and the verdict of a verification run.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;

/// A named verification task: a target identifier and an ordered list of checks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProblemMetadata {
    /// Problem name. Registries fill this in when the payload omits it.
    #[serde(default)]
    pub name: String,
    /// Function the learner must define in their environment.
    #[serde(default)]
    pub function_name: Option<String>,
    /// Program the learner must write on disk.
    #[serde(default)]
    pub script_name: Option<String>,
    /// Raw check specifications, validated by [`CheckSpec::from_json`].
    #[serde(default)]
    pub checks: Vec<serde_json::Value>,
    /// Directory holding the problem's files, substituted for `{PROBLEM_ROOT}`.
    #[serde(skip)]
    pub root: Option<PathBuf>,
}

/// How a function check runs its code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvalMode {
    /// Evaluate `code` as an expression; its value is the result.
    #[default]
    Eval,
    /// Execute `code` as statements; the block binds `result`.
    Exec,
}

impl fmt::Display for EvalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalMode::Eval => write!(f, "eval"),
            EvalMode::Exec => write!(f, "exec"),
        }
    }
}

impl FromStr for EvalMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eval" => Ok(EvalMode::Eval),
            "exec" => Ok(EvalMode::Exec),
            other => Err(ConfigError::InvalidMode(other.to_string())),
        }
    }
}

/// A validated check specification.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckSpec {
    Function(FunctionCheckSpec),
    Command(CommandCheckSpec),
}

/// Evaluate a snippet against the learner's environment.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCheckSpec {
    pub code: String,
    pub setup_code: Option<String>,
    /// Declared expected value. `Some(Null)` is an explicit null.
    pub expected: Option<serde_json::Value>,
    pub name: Option<String>,
    pub mode: EvalMode,
}

/// Run a shell command and compare or test its output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandCheckSpec {
    pub command: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sort_output: bool,
    #[serde(default)]
    pub expected_output: Option<ExpectedOutputSpec>,
    #[serde(default)]
    pub test: Option<String>,
}

/// Reference output of a command check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpectedOutputSpec {
    /// Literal text.
    Literal(String),
    /// Output of a reference command, run once when the check is loaded.
    Dynamic { command: String },
}

#[derive(Debug, Deserialize)]
struct RawFunctionSpec {
    code: String,
    #[serde(default)]
    setup_code: Option<String>,
    #[serde(default, deserialize_with = "present")]
    expected: Option<serde_json::Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    mode: Option<String>,
}

/// Keeps an explicit `null` distinct from an absent key.
fn present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

impl CheckSpec {
    /// Validate a raw spec. The variant is decided by which of `code` and
    /// `command` is present; exactly one must be.
    pub fn from_json(spec: &serde_json::Value) -> Result<Self, ConfigError> {
        let Some(map) = spec.as_object() else {
            return Err(ConfigError::InvalidCheckSpec {
                spec: spec.to_string(),
            });
        };

        match (map.contains_key("code"), map.contains_key("command")) {
            (true, true) => Err(ConfigError::AmbiguousCheckSpec {
                spec: spec.to_string(),
            }),
            (true, false) => {
                let raw: RawFunctionSpec = serde_json::from_value(spec.clone())
                    .map_err(|e| ConfigError::Malformed(e.to_string()))?;
                let mode = match raw.mode.as_deref() {
                    Some(m) => m.parse()?,
                    None => EvalMode::Eval,
                };
                if mode == EvalMode::Eval && raw.expected.is_none() {
                    return Err(ConfigError::Malformed(format!(
                        "missing field `expected` in eval-mode check {:?}",
                        raw.name.as_deref().unwrap_or(&raw.code)
                    )));
                }
                Ok(CheckSpec::Function(FunctionCheckSpec {
                    code: raw.code,
                    setup_code: raw.setup_code,
                    expected: raw.expected,
                    name: raw.name,
                    mode,
                }))
            }
            (false, true) => serde_json::from_value(spec.clone())
                .map(CheckSpec::Command)
                .map_err(|e| ConfigError::Malformed(e.to_string())),
            (false, false) => Err(ConfigError::InvalidCheckSpec {
                spec: spec.to_string(),
            }),
        }
    }

    /// Display label: the explicit name, else the code or command text.
    pub fn display_name(&self) -> &str {
        match self {
            CheckSpec::Function(f) => f.name.as_deref().unwrap_or(&f.code),
            CheckSpec::Command(c) => c.name.as_deref().unwrap_or(&c.command),
        }
    }
}

/// Aggregate outcome of one verification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail,
    NotSupported,
    NotFound,
}

impl Verdict {
    /// Process exit code the CLI reports for this verdict.
    pub fn exit_code(self) -> i32 {
        match self {
            Verdict::Pass => 0,
            Verdict::Fail => 1,
            Verdict::NotFound => 2,
            Verdict::NotSupported => 3,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => write!(f, "pass"),
            Verdict::Fail => write!(f, "fail"),
            Verdict::NotSupported => write!(f, "not_supported"),
            Verdict::NotFound => write!(f, "not_found"),
        }
    }
}
