//! Function checks: evaluate a snippet in a copy of the learner's environment.

use std::sync::Arc;

use anyhow::{Context, Result};

use super::{fail_line, pass_line, CheckContext};
use crate::env::{Environment, Value};
use crate::error::ConfigError;
use crate::evaluator::{repr, value_from_json, values_equal, Evaluator};
use crate::logger::LineSink;
use crate::model::{EvalMode, FunctionCheckSpec};

/// Name an `exec`-mode block binds its observed value to.
pub const RESULT_VAR: &str = "result";
/// Name an `exec`-mode block may bind to override the declared expected value.
pub const EXPECTED_VAR: &str = "_expected";

pub struct FunctionCheck {
    name: String,
    code: String,
    setup_code: Option<String>,
    expected: Value,
    mode: EvalMode,
    evaluator: Arc<dyn Evaluator>,
}

impl FunctionCheck {
    pub fn new(spec: FunctionCheckSpec, ctx: &CheckContext) -> Result<Self, ConfigError> {
        let name = spec.name.unwrap_or_else(|| spec.code.clone());
        let expected = match &spec.expected {
            Some(json) => value_from_json(json).map_err(|reason| ConfigError::UnsupportedValue {
                name: name.clone(),
                reason,
            })?,
            None => Value::Empty,
        };

        Ok(Self {
            name,
            code: spec.code,
            setup_code: spec.setup_code,
            expected,
            mode: spec.mode,
            evaluator: Arc::clone(&ctx.evaluator),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> EvalMode {
        self.mode
    }

    /// Produce `(observed, expected)` using a private copy of `env`.
    fn evaluate(&self, env: &Environment) -> Result<(Value, Value)> {
        let mut env = env.clone();
        match self.mode {
            EvalMode::Eval => {
                if let Some(setup) = &self.setup_code {
                    self.evaluator
                        .exec(setup, &mut env)
                        .context("setup code failed")?;
                }
                let result = self.evaluator.eval(&self.code, &env)?;
                Ok((result, self.expected.clone()))
            }
            EvalMode::Exec => {
                self.evaluator.exec(&self.code, &mut env)?;
                let result = env
                    .get_value(RESULT_VAR)
                    .cloned()
                    .with_context(|| format!("code did not bind `{RESULT_VAR}`"))?;
                let expected = env
                    .get_value(EXPECTED_VAR)
                    .cloned()
                    .unwrap_or_else(|| self.expected.clone());
                Ok((result, expected))
            }
        }
    }

    pub fn run(&self, env: &Environment, log: &mut dyn LineSink) -> bool {
        match self.evaluate(env) {
            Err(e) => {
                log.log(fail_line(&self.name));
                log.trace(&e);
                false
            }
            Ok((result, expected)) if values_equal(&result, &expected) => {
                log.log(pass_line(&self.name));
                true
            }
            Ok((result, expected)) => {
                log.log(fail_line(&self.name));
                log.log(format!("  expected: {}", repr(&expected)));
                log.log(format!("  found: {}", repr(&result)));
                false
            }
        }
    }
}
