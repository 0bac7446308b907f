//! Problems: load a problem's checks and verify a learner environment.

use std::path::Path;

use crate::check::{Check, CheckContext};
use crate::env::Environment;
use crate::error::ProblemError;
use crate::logger::{LineSink, Logger};
use crate::model::{ProblemMetadata, Verdict};
use crate::traits::ProblemRegistry;

/// A named verification task with its loaded checks.
pub struct Problem {
    name: String,
    metadata: ProblemMetadata,
    checks: Vec<Check>,
    logger: Logger,
}

impl Problem {
    /// Fetch `name` from `registry` and load its checks.
    pub async fn load(
        name: &str,
        registry: &dyn ProblemRegistry,
        ctx: &CheckContext,
    ) -> Result<Self, ProblemError> {
        let metadata = registry.fetch(name).await?;
        Self::from_metadata(name, metadata, ctx).await
    }

    /// Load checks from metadata already in hand.
    ///
    /// Every check spec is validated here; the first misconfigured one aborts
    /// loading.
    pub async fn from_metadata(
        name: &str,
        mut metadata: ProblemMetadata,
        ctx: &CheckContext,
    ) -> Result<Self, ProblemError> {
        if metadata.name.is_empty() {
            metadata.name = name.to_string();
        }
        let ctx = match &metadata.root {
            Some(root) => ctx.clone().with_problem_root(root.clone()),
            None => ctx.clone(),
        };

        let mut checks = Vec::with_capacity(metadata.checks.len());
        for (index, spec) in metadata.checks.iter().enumerate() {
            let check = Check::load(spec, &ctx)
                .await
                .map_err(|source| ProblemError::Check {
                    problem: name.to_string(),
                    index: index + 1,
                    source,
                })?;
            checks.push(check);
        }

        Ok(Self {
            name: name.to_string(),
            metadata,
            checks,
            logger: Logger::new(),
        })
    }

    /// Record lines without echoing them to stdout.
    pub fn quiet(mut self) -> Self {
        self.logger = Logger::quiet();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metadata(&self) -> &ProblemMetadata {
        &self.metadata
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    /// Lines logged by the most recent [`verify`](Self::verify).
    pub fn log(&self) -> &[String] {
        self.logger.lines()
    }

    /// Run every check against `env` and return the verdict.
    ///
    /// All checks run in declared order even after a failure, so every
    /// diagnostic is reported.
    pub async fn verify(&mut self, env: &Environment) -> Verdict {
        self.logger.clear();

        let function_name = self.metadata.function_name.as_deref();
        let script_name = self.metadata.script_name.as_deref();

        if function_name.is_none() && script_name.is_none() {
            self.logger
                .log("Sorry, verification is not supported for this problem.".into());
            return Verdict::NotSupported;
        }
        if let Some(func) = function_name {
            if !env.contains(func) {
                self.logger
                    .log(format!("ERROR: Unable to find function with name {func}."));
                return Verdict::NotFound;
            }
        }
        if let Some(script) = script_name {
            if !Path::new(script).exists() {
                self.logger
                    .log(format!("ERROR: Unable to find program {script}."));
                return Verdict::NotFound;
            }
        }

        self.logger
            .log(format!("Found {} checks", self.checks.len()));

        let mut passed = true;
        for check in &self.checks {
            let check_passed = check.run(env, &mut self.logger).await;
            passed = passed && check_passed;
        }
        tracing::debug!(problem = %self.name, passed, "verification finished");

        if passed {
            self.logger.log(format!(
                "🎉 Congratulations! You have successfully solved problem {}!!",
                self.name
            ));
            Verdict::Pass
        } else {
            self.logger.log(format!(
                "💥 Oops! Your solution to problem {} is incorrect or incomplete.",
                self.name
            ));
            Verdict::Fail
        }
    }
}
