//! End-to-end verification with a real shell and problems on disk.
//!
//! These tests load problems through `LocalRegistry`, run command checks with
//! `LocalShell`, and evaluate function checks with `ExprEvaluator`.

use std::path::Path;
use std::sync::Arc;

use pipal_core::check::CheckContext;
use pipal_core::env::Environment;
use pipal_core::evaluator::ExprEvaluator;
use pipal_core::model::Verdict;
use pipal_core::parser::LocalRegistry;
use pipal_core::problem::Problem;
use pipal_core::workspace::parse_workspace;
use pipal_runner::LocalShell;

fn context() -> CheckContext {
    CheckContext::new(Arc::new(ExprEvaluator), Arc::new(LocalShell::new()))
}

fn write(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// A problem asking for a shell script that prints a greeting, plus the
/// learner's attempt at it.
fn script_problem(root: &Path, solution: &str) -> LocalRegistry {
    let problems = root.join("problems");
    let script = root.join("work").join("hello.sh");
    write(&script, solution);
    write(&problems.join("hello").join("expected.txt"), "Hello, world!\n");
    write(
        &problems.join("hello").join("problem.toml"),
        &format!(
            r#"
script_name = "{script}"

[[checks]]
name = "prints greeting"
command = "sh {script}"
expected_output = "Hello, world!"

[[checks]]
name = "matches reference"
command = "sh {script}"
expected_output = {{ command = "cat {{PROBLEM_ROOT}}/expected.txt" }}

[[checks]]
name = "one line"
command = "sh {script}"
test = 'assert_eq(len(lines(stdout)), 1)'
"#,
            script = script.display()
        ),
    );
    LocalRegistry::new(problems)
}

#[tokio::test]
async fn e2e_correct_script() {
    let dir = tempfile::tempdir().unwrap();
    let registry = script_problem(dir.path(), "echo 'Hello, world!'\n");

    let mut problem = Problem::load("hello", &registry, &context())
        .await
        .unwrap()
        .quiet();
    let verdict = problem.verify(&Environment::new()).await;

    assert_eq!(verdict, Verdict::Pass, "log: {:#?}", problem.log());
    assert_eq!(problem.log()[0], "Found 3 checks");
    assert!(problem.log().contains(&"✓ matches reference".to_string()));
}

#[tokio::test]
async fn e2e_wrong_script_reports_every_check() {
    let dir = tempfile::tempdir().unwrap();
    let registry = script_problem(dir.path(), "echo 'Hello'\necho 'world'\n");

    let mut problem = Problem::load("hello", &registry, &context())
        .await
        .unwrap()
        .quiet();
    let verdict = problem.verify(&Environment::new()).await;

    assert_eq!(verdict, Verdict::Fail);
    let log = problem.log();
    for name in ["prints greeting", "matches reference", "one line"] {
        assert!(log.contains(&format!("✗ {name}")), "missing {name}: {log:#?}");
    }
    assert!(log.contains(&"    Hello".to_string()));
    assert!(log.contains(&"    world".to_string()));
}

#[tokio::test]
async fn e2e_stderr_is_part_of_output() {
    let dir = tempfile::tempdir().unwrap();
    let registry = script_problem(dir.path(), "echo 'Hello, world!' >&2\n");

    let mut problem = Problem::load("hello", &registry, &context())
        .await
        .unwrap()
        .quiet();
    assert_eq!(problem.verify(&Environment::new()).await, Verdict::Pass);
}

#[tokio::test]
async fn e2e_missing_script() {
    let dir = tempfile::tempdir().unwrap();
    let registry = script_problem(dir.path(), "echo 'Hello, world!'\n");
    std::fs::remove_file(dir.path().join("work").join("hello.sh")).unwrap();

    let mut problem = Problem::load("hello", &registry, &context())
        .await
        .unwrap()
        .quiet();
    assert_eq!(problem.verify(&Environment::new()).await, Verdict::NotFound);
    assert!(problem.log()[0].starts_with("ERROR: Unable to find program"));
}

#[tokio::test]
async fn e2e_function_problem_from_workspace() {
    let dir = tempfile::tempdir().unwrap();
    let problems = dir.path().join("problems");
    write(
        &problems.join("square").join("problem.json"),
        r#"{
            "function_name": "square",
            "checks": [
                {"code": "square(4)", "expected": 16},
                {"code": "square(-3)", "expected": 9},
                {"code": "square(1.5)", "expected": 2.25}
            ]
        }"#,
    );
    let registry = LocalRegistry::new(&problems);

    let env = parse_workspace("# my solution\nfn square(x) = x * x\n").unwrap();
    let mut problem = Problem::load("square", &registry, &context())
        .await
        .unwrap()
        .quiet();
    assert_eq!(problem.verify(&env).await, Verdict::Pass);

    let env = parse_workspace("fn square(x) = x + x\n").unwrap();
    let mut problem = Problem::load("square", &registry, &context())
        .await
        .unwrap()
        .quiet();
    assert_eq!(problem.verify(&env).await, Verdict::Fail);
    assert!(!problem.log().contains(&"✓ square(-3)".to_string()));
    assert!(problem.log().contains(&"  expected: 16".to_string()));
    assert!(problem.log().contains(&"  found: 8".to_string()));
}

#[tokio::test]
async fn e2e_unknown_problem() {
    let dir = tempfile::tempdir().unwrap();
    let registry = LocalRegistry::new(dir.path());
    let err = Problem::load("nope", &registry, &context())
        .await
        .err()
        .expect("load should fail");
    assert!(err.is_unknown_problem());
    assert_eq!(err.to_string(), "unknown problem: nope");
}
