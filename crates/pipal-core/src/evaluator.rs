//! The evaluator capability used by function checks and command test scripts.
//!
//! Checks only see the [`Evaluator`] trait, so the expression language can be
//! replaced (or sandboxed) without touching check or problem logic. The
//! default [`ExprEvaluator`] runs code in the `evalexpr` language.

use std::collections::HashMap;

use anyhow::{Context as _, Result};
use evalexpr::{
    eval_with_context, eval_with_context_mut, Context, ContextWithMutableFunctions,
    ContextWithMutableVariables, EvalexprError, EvalexprResult, HashMapContext,
};

use crate::env::{Binding, Environment, Function, Value};

/// Runs problem- and learner-authored code against an environment.
pub trait Evaluator: Send + Sync {
    /// Evaluate an expression and return its value. Must not mutate `env`.
    fn eval(&self, code: &str, env: &Environment) -> Result<Value>;

    /// Execute a statement block. Every variable the block binds is written
    /// back into `env`.
    fn exec(&self, code: &str, env: &mut Environment) -> Result<()>;
}

/// [`Evaluator`] backed by `evalexpr`.
///
/// Besides the evalexpr builtins, code can call `assert(cond)`,
/// `assert(cond, "message")`, `assert_eq(a, b)` and `lines(text)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExprEvaluator;

impl ExprEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Build an evalexpr context holding the helpers and every binding of
    /// `env` except those named in `skip`.
    pub(crate) fn context(env: &Environment, skip: &[String]) -> Result<Scope> {
        let mut ctx = Scope::default();
        install_helpers(&mut ctx)?;
        for (name, binding) in env.iter() {
            if skip.iter().any(|s| s == name) {
                continue;
            }
            match binding {
                Binding::Value(v) => ctx.set_value(name.to_string(), v.clone())?,
                Binding::Function(f) => ctx.set_function(name.to_string(), f.clone())?,
            }
        }
        Ok(ctx)
    }
}

impl Evaluator for ExprEvaluator {
    fn eval(&self, code: &str, env: &Environment) -> Result<Value> {
        let ctx = Self::context(env, &[])?;
        eval_with_context(code, &ctx).with_context(|| format!("failed to evaluate `{code}`"))
    }

    fn exec(&self, code: &str, env: &mut Environment) -> Result<()> {
        let mut ctx = Self::context(env, &[])?;
        eval_with_context_mut(code, &mut ctx)
            .with_context(|| format!("failed to execute `{}`", first_line(code)))?;
        for (name, value) in ctx.variables {
            env.set_value(name, value);
        }
        Ok(())
    }
}

/// Evaluation context for one eval or exec.
///
/// Unlike `HashMapContext`, assignment replaces a binding whatever the type
/// of its previous value, so `n = 12` works after `n = 1.5`.
///
/// Functions are held in an inner `HashMapContext`, which owns calling them.
#[derive(Clone, Default)]
pub(crate) struct Scope {
    variables: HashMap<String, Value>,
    functions: HashMapContext,
}

impl Context for Scope {
    fn get_value(&self, identifier: &str) -> Option<&Value> {
        self.variables.get(identifier)
    }

    fn call_function(&self, identifier: &str, argument: &Value) -> EvalexprResult<Value> {
        self.functions.call_function(identifier, argument)
    }

    fn are_builtin_functions_disabled(&self) -> bool {
        self.functions.are_builtin_functions_disabled()
    }

    fn set_builtin_functions_disabled(&mut self, disabled: bool) -> EvalexprResult<()> {
        self.functions.set_builtin_functions_disabled(disabled)
    }
}

impl ContextWithMutableVariables for Scope {
    fn set_value(&mut self, identifier: String, value: Value) -> EvalexprResult<()> {
        self.variables.insert(identifier, value);
        Ok(())
    }
}

impl ContextWithMutableFunctions for Scope {
    fn set_function(&mut self, identifier: String, function: Function) -> EvalexprResult<()> {
        self.functions.set_function(identifier, function)
    }
}

fn first_line(code: &str) -> &str {
    code.lines().next().unwrap_or_default()
}

fn install_helpers(ctx: &mut Scope) -> Result<()> {
    ctx.set_function(
        "assert".into(),
        Function::new(|argument| {
            let (condition, message) = match argument {
                Value::Tuple(items) if items.len() == 2 => {
                    (items[0].as_boolean()?, items[1].as_string()?)
                }
                other => (other.as_boolean()?, "assertion failed".to_string()),
            };
            if condition {
                Ok(Value::Empty)
            } else {
                Err(EvalexprError::CustomMessage(message))
            }
        }),
    )?;
    ctx.set_function(
        "assert_eq".into(),
        Function::new(|argument| match argument {
            Value::Tuple(items) if items.len() == 2 => {
                if values_equal(&items[0], &items[1]) {
                    Ok(Value::Empty)
                } else {
                    Err(EvalexprError::CustomMessage(format!(
                        "assertion failed: left == right\n  left: {}\n right: {}",
                        repr(&items[0]),
                        repr(&items[1])
                    )))
                }
            }
            _ => Err(EvalexprError::CustomMessage(
                "assert_eq() takes exactly 2 arguments".into(),
            )),
        }),
    )?;
    ctx.set_function(
        "lines".into(),
        Function::new(|argument| {
            let text = argument.as_string()?;
            Ok(Value::Tuple(
                text.lines().map(|l| Value::String(l.to_string())).collect(),
            ))
        }),
    )?;
    Ok(())
}

/// Value equality with `Int` and `Float` compared numerically.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(i), Value::Float(f)) | (Value::Float(f), Value::Int(i)) => *i as f64 == *f,
        (Value::Tuple(xs), Value::Tuple(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        _ => a == b,
    }
}

/// Debug form of a value for diagnostics.
pub fn repr(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{s:?}"),
        Value::Float(f) => format!("{f:?}"),
        Value::Int(i) => i.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Tuple(items) => {
            let inner: Vec<String> = items.iter().map(repr).collect();
            format!("({})", inner.join(", "))
        }
        Value::Empty => "()".to_string(),
    }
}

/// Convert a declared JSON value into an evaluator value.
///
/// Objects have no counterpart and are rejected.
pub fn value_from_json(json: &serde_json::Value) -> Result<Value, String> {
    match json {
        serde_json::Value::Null => Ok(Value::Empty),
        serde_json::Value::Bool(b) => Ok(Value::Boolean(*b)),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(Value::Int(i)),
            None => n
                .as_f64()
                .map(Value::Float)
                .ok_or_else(|| format!("number out of range: {n}")),
        },
        serde_json::Value::String(s) => Ok(Value::String(s.clone())),
        serde_json::Value::Array(items) => items
            .iter()
            .map(value_from_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Tuple),
        serde_json::Value::Object(_) => Err(format!("objects are not supported: {json}")),
    }
}
