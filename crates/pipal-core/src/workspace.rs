//! Learner workspace files.
//!
//! A workspace file is how a learner hands their definitions to `pipal
//! verify` outside a notebook. Lines are read in order:
//!
//! ```text
//! # comment
//! greeting = "hello";
//! fn square(x) = x * x
//! fn hypot(a, b) = math::sqrt(square(a) + square(b))
//! ```
//!
//! `fn` lines define functions whose body is a single expression. A body sees
//! its parameters plus everything defined above it, so functions cannot
//! recurse. All other lines are statements run by the evaluator.

use std::path::Path;

use anyhow::{bail, Context, Result};
use evalexpr::{build_operator_tree, ContextWithMutableVariables, EvalexprError, Node};

use crate::env::{Environment, Function, Value};
use crate::evaluator::{Evaluator, ExprEvaluator, Scope};

/// Read and parse a workspace file.
pub fn load_workspace(path: &Path) -> Result<Environment> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read workspace file: {}", path.display()))?;
    parse_workspace(&source).with_context(|| format!("in workspace file {}", path.display()))
}

/// Parse workspace source into an environment.
pub fn parse_workspace(source: &str) -> Result<Environment> {
    let evaluator = ExprEvaluator::new();
    let mut env = Environment::new();
    let mut pending = String::new();
    let mut pending_start = 1;

    for (index, line) in source.lines().enumerate() {
        let lineno = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//") {
            continue;
        }

        if let Some(definition) = trimmed.strip_prefix("fn ") {
            flush(&evaluator, &mut pending, pending_start, &mut env)?;
            let (name, function) = parse_function(definition, &env)
                .with_context(|| format!("line {lineno}: invalid function definition"))?;
            env.define_function(name, function);
        } else {
            if pending.is_empty() {
                pending_start = lineno;
            }
            pending.push_str(line);
            pending.push('\n');
        }
    }
    flush(&evaluator, &mut pending, pending_start, &mut env)?;

    Ok(env)
}

fn flush(
    evaluator: &ExprEvaluator,
    pending: &mut String,
    start: usize,
    env: &mut Environment,
) -> Result<()> {
    if pending.trim().is_empty() {
        pending.clear();
        return Ok(());
    }
    evaluator
        .exec(pending, env)
        .with_context(|| format!("line {start}: statement failed"))?;
    pending.clear();
    Ok(())
}

/// Parse `name(a, b) = body` into a callable.
fn parse_function(definition: &str, env: &Environment) -> Result<(String, Function)> {
    let (signature, body) = definition
        .split_once('=')
        .context("expected `fn name(params) = body`")?;

    let signature = signature.trim();
    let (name, params) = signature
        .strip_suffix(')')
        .and_then(|s| s.split_once('('))
        .context("expected a parameter list in parentheses")?;

    let name = name.trim();
    if !is_identifier(name) {
        bail!("invalid function name: {name:?}");
    }

    let params: Vec<String> = params
        .split(',')
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    if let Some(bad) = params.iter().find(|p| !is_identifier(p)) {
        bail!("invalid parameter name: {bad:?}");
    }

    let body = body.trim().trim_end_matches(';').trim();
    if body.is_empty() {
        bail!("function {name} has an empty body");
    }
    let node = build_operator_tree(body)
        .with_context(|| format!("failed to parse body of {name}: `{body}`"))?;

    let scope = ExprEvaluator::context(env, &params)?;
    Ok((name.to_string(), user_function(name.to_string(), params, node, scope)))
}

fn user_function(name: String, params: Vec<String>, body: Node, scope: Scope) -> Function {
    Function::new(move |argument| {
        let args: Vec<Value> = match (params.len(), argument) {
            (0, Value::Empty) => Vec::new(),
            (1, arg) => vec![arg.clone()],
            (n, Value::Tuple(items)) if n > 1 && items.len() == n => items.clone(),
            (n, _) => {
                return Err(EvalexprError::CustomMessage(format!(
                    "{name}() takes {n} argument(s)"
                )))
            }
        };
        let mut ctx = scope.clone();
        for (param, arg) in params.iter().zip(args) {
            ctx.set_value(param.clone(), arg)?;
        }
        body.eval_with_context(&ctx)
    })
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}
