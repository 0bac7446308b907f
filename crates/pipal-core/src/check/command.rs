//! Command checks: run a shell command and judge its output.

use std::path::PathBuf;
use std::sync::Arc;

use super::{fail_line, pass_line, CheckContext};
use crate::env::{Environment, Value};
use crate::error::ConfigError;
use crate::evaluator::Evaluator;
use crate::logger::LineSink;
use crate::model::{CommandCheckSpec, ExpectedOutputSpec};
use crate::normalize::{normalize_output, restore_leading_space, sort_lines};
use crate::traits::{ShellRequest, ShellRunner};

/// Placeholder replaced by the problem root in expected-output commands.
pub const PROBLEM_ROOT_PLACEHOLDER: &str = "{PROBLEM_ROOT}";
/// Environment variable holding the problem root for every spawned command.
pub const PROBLEM_ROOT_ENV: &str = "PROBLEM_ROOT";

/// Expected output, normalized once at load time.
#[derive(Debug, Clone, PartialEq)]
struct ExpectedOutput {
    /// What the captured output is compared against (sorted if requested).
    compare: String,
    /// Unsorted copy shown in diagnostics.
    display: String,
}

pub struct CommandCheck {
    name: String,
    command: String,
    sort_output: bool,
    expected: Option<ExpectedOutput>,
    test: Option<String>,
    problem_root: PathBuf,
    shell: Arc<dyn ShellRunner>,
    evaluator: Arc<dyn Evaluator>,
}

impl CommandCheck {
    pub async fn new(spec: CommandCheckSpec, ctx: &CheckContext) -> Result<Self, ConfigError> {
        let root = ctx.problem_root.to_string_lossy().into_owned();

        let raw = match spec.expected_output {
            None => None,
            Some(ExpectedOutputSpec::Literal(text)) => Some(text),
            Some(ExpectedOutputSpec::Dynamic { command }) => {
                let command = command.replace(PROBLEM_ROOT_PLACEHOLDER, &root);
                let request = ShellRequest::new(command.as_str()).with_env(PROBLEM_ROOT_ENV, &root);
                let output = ctx.shell.run(&request).await.map_err(|e| {
                    ConfigError::ExpectedOutput {
                        command: command.clone(),
                        reason: format!("{e:#}"),
                    }
                })?;
                if !output.success() {
                    tracing::debug!(
                        command = %command,
                        exit_code = ?output.exit_code,
                        "expected-output command exited unsuccessfully, using its stdout"
                    );
                }
                Some(output.stdout)
            }
        };

        // the underscore sentinel applies to the text as compared, after sorting
        let expected = raw.map(|text| {
            let normalized = normalize_output(&text);
            let display = restore_leading_space(&normalized).into_owned();
            let compare = if spec.sort_output {
                restore_leading_space(&sort_lines(&normalized)).into_owned()
            } else {
                display.clone()
            };
            ExpectedOutput { compare, display }
        });

        Ok(Self {
            name: spec.name.unwrap_or_else(|| spec.command.clone()),
            command: spec.command,
            sort_output: spec.sort_output,
            expected,
            test: spec.test,
            problem_root: ctx.problem_root.clone(),
            shell: Arc::clone(&ctx.shell),
            evaluator: Arc::clone(&ctx.evaluator),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Normalized expected output as shown in diagnostics, if any.
    pub fn expected_output(&self) -> Option<&str> {
        self.expected.as_ref().map(|e| e.display.as_str())
    }

    pub async fn run(&self, env: &Environment, log: &mut dyn LineSink) -> bool {
        let root = self.problem_root.to_string_lossy().into_owned();
        let request = ShellRequest::new(self.command.as_str())
            .merged()
            .with_env(PROBLEM_ROOT_ENV, root.as_str());

        let output = match self.shell.run(&request).await {
            Ok(output) => output,
            Err(e) => {
                log.log(fail_line(&self.name));
                log.trace(&e);
                return false;
            }
        };
        let found = normalize_output(&output.stdout);

        if let Some(expected) = &self.expected {
            let compare = if self.sort_output {
                sort_lines(&found)
            } else {
                found.clone()
            };
            if compare == expected.compare {
                log.log(pass_line(&self.name));
                true
            } else {
                log.log(fail_line(&self.name));
                log_block(log, "expected", &expected.display);
                log_block(log, "found", &found);
                false
            }
        } else if let Some(test) = &self.test {
            let mut scope = env.clone();
            scope.set_value("stdout", Value::String(found));
            scope.set_value("problem_root", Value::String(root));
            match self.evaluator.exec(test, &mut scope) {
                Ok(()) => {
                    log.log(pass_line(&self.name));
                    true
                }
                Err(e) => {
                    log.log(fail_line(&self.name));
                    log.trace(&e);
                    false
                }
            }
        } else {
            log.log(pass_line(&self.name));
            true
        }
    }
}

fn log_block(log: &mut dyn LineSink, label: &str, text: &str) {
    log.log(format!("  {label}:"));
    for line in text.split('\n') {
        log.log(format!("    {line}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::ExprEvaluator;
    use crate::logger::Logger;
    use crate::mock::MockShell;
    use crate::model::CheckSpec;
    use serde_json::json;

    async fn load(spec: serde_json::Value, shell: Arc<MockShell>) -> Result<CommandCheck, ConfigError> {
        let ctx = CheckContext::new(Arc::new(ExprEvaluator), shell)
            .with_problem_root(PathBuf::from("/course/problems/hello"));
        match CheckSpec::from_json(&spec)? {
            CheckSpec::Command(spec) => CommandCheck::new(spec, &ctx).await,
            other => panic!("not a command spec: {other:?}"),
        }
    }

    #[tokio::test]
    async fn literal_output_matches_after_normalization() {
        let shell = Arc::new(MockShell::new().respond("python hello.py", "Hello  \nworld\n"));
        let check = load(
            json!({"command": "python hello.py", "expected_output": "Hello\nworld\n"}),
            shell.clone(),
        )
        .await
        .unwrap();
        let mut log = Logger::quiet();

        assert!(check.run(&Environment::new(), &mut log).await);
        assert_eq!(log.lines(), ["✓ python hello.py"]);

        let request = shell.last_request().unwrap();
        assert!(request.merge_stderr);
        assert!(request
            .env
            .contains(&("PROBLEM_ROOT".to_string(), "/course/problems/hello".to_string())));
    }

    #[tokio::test]
    async fn sorted_comparison_ignores_order() {
        let shell = Arc::new(MockShell::new().respond("ls", "b\na\nc"));
        let check = load(
            json!({"command": "ls", "sort_output": true, "expected_output": "a\nb\nc"}),
            shell,
        )
        .await
        .unwrap();
        let mut log = Logger::quiet();
        assert!(check.run(&Environment::new(), &mut log).await);
    }

    #[tokio::test]
    async fn unsorted_comparison_respects_order() {
        let shell = Arc::new(MockShell::new().respond("ls", "b\na\nc"));
        let check = load(json!({"command": "ls", "expected_output": "a\nb\nc"}), shell)
            .await
            .unwrap();
        let mut log = Logger::quiet();
        assert!(!check.run(&Environment::new(), &mut log).await);
    }

    #[tokio::test]
    async fn mismatch_shows_unsorted_blocks() {
        let shell = Arc::new(MockShell::new().respond("ls", "c\nb\n"));
        let check = load(
            json!({"command": "ls", "name": "listing", "sort_output": true, "expected_output": "b\na"}),
            shell,
        )
        .await
        .unwrap();
        let mut log = Logger::quiet();

        assert!(!check.run(&Environment::new(), &mut log).await);
        assert_eq!(
            log.lines(),
            [
                "✗ listing",
                "  expected:",
                "    b",
                "    a",
                "  found:",
                "    c",
                "    b"
            ]
        );
    }

    #[tokio::test]
    async fn leading_underscore_restores_space() {
        let shell = Arc::new(MockShell::new().respond("./indent.sh", " indented\nnext\n"));
        let check = load(
            json!({"command": "./indent.sh", "expected_output": "_indented\nnext"}),
            shell,
        )
        .await
        .unwrap();
        let mut log = Logger::quiet();
        assert!(check.run(&Environment::new(), &mut log).await);
        assert_eq!(check.expected_output(), Some(" indented\nnext"));
    }

    #[tokio::test]
    async fn only_first_underscore_is_replaced() {
        let shell = Arc::new(MockShell::new().respond("echo", " a_b\n"));
        let check = load(json!({"command": "echo", "expected_output": "_a_b"}), shell)
            .await
            .unwrap();
        let mut log = Logger::quiet();
        assert!(check.run(&Environment::new(), &mut log).await);
    }

    #[tokio::test]
    async fn underscore_then_space_expects_two_spaces() {
        let spec = json!({"command": "./indent.sh", "expected_output": "_ indented"});

        let shell = Arc::new(MockShell::new().respond("./indent.sh", "  indented\n"));
        let check = load(spec.clone(), shell).await.unwrap();
        assert_eq!(check.expected_output(), Some("  indented"));
        let mut log = Logger::quiet();
        assert!(check.run(&Environment::new(), &mut log).await);

        let shell = Arc::new(MockShell::new().respond("./indent.sh", " indented\n"));
        let check = load(spec, shell).await.unwrap();
        let mut log = Logger::quiet();
        assert!(!check.run(&Environment::new(), &mut log).await);
    }

    #[tokio::test]
    async fn underscore_sentinel_applies_after_sorting() {
        // "_a" sorts first, so its underscore becomes the leading space
        let shell = Arc::new(MockShell::new().respond("ls", "b\n a\n"));
        let check = load(
            json!({"command": "ls", "sort_output": true, "expected_output": "b\n_a"}),
            shell,
        )
        .await
        .unwrap();
        let mut log = Logger::quiet();
        assert!(check.run(&Environment::new(), &mut log).await);

        // "A" sorts before "_b", so the underscore stays literal
        let shell = Arc::new(MockShell::new().respond("ls", " b\nA\n"));
        let check = load(
            json!({"command": "ls", "sort_output": true, "expected_output": "_b\nA"}),
            shell,
        )
        .await
        .unwrap();
        let mut log = Logger::quiet();
        assert!(!check.run(&Environment::new(), &mut log).await);
        assert_eq!(check.expected_output(), Some(" b\nA"));
    }

    #[tokio::test]
    async fn dynamic_expected_output_substitutes_root() {
        let shell = Arc::new(
            MockShell::new()
                .respond("cat /course/problems/hello/expected.txt", "42  \n")
                .respond("python answer.py", "42\n"),
        );
        let check = load(
            json!({
                "command": "python answer.py",
                "expected_output": {"command": "cat {PROBLEM_ROOT}/expected.txt"}
            }),
            shell.clone(),
        )
        .await
        .unwrap();
        assert_eq!(check.expected_output(), Some("42"));

        let requests = shell.requests();
        assert_eq!(requests[0].command, "cat /course/problems/hello/expected.txt");
        assert!(!requests[0].merge_stderr);

        let mut log = Logger::quiet();
        assert!(check.run(&Environment::new(), &mut log).await);
    }

    #[tokio::test]
    async fn dynamic_expected_tolerates_nonzero_exit() {
        let shell = Arc::new(
            MockShell::new()
                .respond_with_exit("reference.sh", "partial\n", 3)
                .respond("solution.sh", "partial\n"),
        );
        let check = load(
            json!({"command": "solution.sh", "expected_output": {"command": "reference.sh"}}),
            shell,
        )
        .await
        .unwrap();
        let mut log = Logger::quiet();
        assert!(check.run(&Environment::new(), &mut log).await);
    }

    #[tokio::test]
    async fn dynamic_expected_spawn_failure_is_config_error() {
        let shell = Arc::new(MockShell::new().fail_on("reference.sh"));
        let err = load(
            json!({"command": "solution.sh", "expected_output": {"command": "reference.sh"}}),
            shell,
        )
        .await
        .err()
        .expect("load should fail");
        assert!(matches!(err, ConfigError::ExpectedOutput { .. }));
    }

    #[tokio::test]
    async fn test_script_sees_stdout() {
        let shell = Arc::new(MockShell::new().respond("wc -l data.txt", "3 data.txt\n"));
        let check = load(
            json!({
                "command": "wc -l data.txt",
                "test": "assert(str::trim(stdout) == \"3 data.txt\")"
            }),
            shell,
        )
        .await
        .unwrap();
        let mut log = Logger::quiet();
        assert!(check.run(&Environment::new(), &mut log).await);
    }

    #[tokio::test]
    async fn failing_test_script_fails_check() {
        let shell = Arc::new(MockShell::new().respond("date", "Monday\n"));
        let check = load(
            json!({"command": "date", "name": "weekday", "test": "assert_eq(stdout, \"Friday\")"}),
            shell,
        )
        .await
        .unwrap();
        let mut log = Logger::quiet();
        assert!(!check.run(&Environment::new(), &mut log).await);
        assert_eq!(log.lines(), ["✗ weekday"]);
    }

    #[tokio::test]
    async fn no_expectation_passes_trivially() {
        let shell = Arc::new(MockShell::new().respond_with_exit("false", "", 1));
        let check = load(json!({"command": "false"}), shell).await.unwrap();
        let mut log = Logger::quiet();
        assert!(check.run(&Environment::new(), &mut log).await);
        assert_eq!(log.lines(), ["✓ false"]);
    }

    #[tokio::test]
    async fn spawn_failure_fails_check() {
        let shell = Arc::new(MockShell::new().fail_on("missing-binary"));
        let check = load(json!({"command": "missing-binary", "expected_output": "x"}), shell)
            .await
            .unwrap();
        let mut log = Logger::quiet();
        assert!(!check.run(&Environment::new(), &mut log).await);
        assert_eq!(log.lines(), ["✗ missing-binary"]);
    }
}
