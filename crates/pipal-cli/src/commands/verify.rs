//! The `pipal verify` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use pipal_client::load_config_from;
use pipal_core::check::CheckContext;
use pipal_core::env::Environment;
use pipal_core::evaluator::ExprEvaluator;
use pipal_core::model::Verdict;
use pipal_core::parser::LocalRegistry;
use pipal_core::problem::Problem;
use pipal_core::traits::ProblemRegistry;
use pipal_core::workspace::load_workspace;
use pipal_runner::LocalShell;

pub async fn execute(
    name: String,
    env_file: Option<PathBuf>,
    problems_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<Verdict> {
    let config = load_config_from(config_path.as_deref())?;

    let env = match &env_file {
        Some(path) => load_workspace(path)?,
        None => Environment::new(),
    };
    tracing::debug!(bindings = env.len(), "learner environment loaded");

    let mut shell = LocalShell::new();
    if let Some(secs) = config.command_timeout_secs {
        shell = shell.with_timeout(Duration::from_secs(secs));
    }
    let ctx = CheckContext::new(Arc::new(ExprEvaluator::new()), Arc::new(shell));

    let registry: Box<dyn ProblemRegistry> = match problems_dir.or(config.problems_dir.clone()) {
        Some(dir) => Box::new(LocalRegistry::new(dir)),
        None => Box::new(super::client(&config)?),
    };

    let mut problem = Problem::load(&name, registry.as_ref(), &ctx).await?;
    Ok(problem.verify(&env).await)
}
