//! The learner's execution environment: named values and functions.

use std::collections::BTreeMap;
use std::fmt;

pub use evalexpr::{Function, Value};

/// One named binding.
#[derive(Clone)]
pub enum Binding {
    Value(Value),
    Function(Function),
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Binding::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// Mapping from name to binding, owned by the caller.
///
/// Checks never mutate the caller's environment; each run works on a clone.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    bindings: BTreeMap<String, Binding>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to a value, replacing any previous binding.
    pub fn set_value(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), Binding::Value(value));
    }

    /// Bind `name` to a callable, replacing any previous binding.
    pub fn define_function(&mut self, name: impl Into<String>, function: Function) {
        self.bindings
            .insert(name.into(), Binding::Function(function));
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    /// The value bound to `name`, if it is a value binding.
    pub fn get_value(&self, name: &str) -> Option<&Value> {
        match self.bindings.get(name) {
            Some(Binding::Value(v)) => Some(v),
            _ => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
