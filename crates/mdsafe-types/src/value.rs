//! Runtime values produced by the sandbox interpreter.

use crate::output::{ComponentRef, OutputNode};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A value in the embedded-script language.
///
/// `Function` and `Component` wrap host-supplied capabilities; everything
/// else is plain data. Values are cheap to clone relative to document size
/// and the interpreter clones freely, as a tree-walker does.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    Object(BTreeMap<String, Value>),
    /// A host function exposed through the binding environment.
    Function(NativeFn),
    /// A renderable component exposed through the binding environment or
    /// the component registry.
    Component(ComponentRef),
    /// An already-materialized output subtree (a tag expression result).
    Node(Box<OutputNode>),
}

impl Value {
    /// The value's type name, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
            Value::Component(_) => "component",
            Value::Node(_) => "element",
        }
    }

    /// Script-language truthiness: `false`, `0`, `NaN`, `""` and `null`
    /// are falsy; every list, object, function and element is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::List(_)
            | Value::Object(_)
            | Value::Function(_)
            | Value::Component(_)
            | Value::Node(_) => true,
        }
    }

    /// The display form used by template interpolation and string
    /// concatenation. Whole numbers print without a trailing `.0`.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{n}")
                }
            }
            Value::String(s) => s.clone(),
            Value::List(items) => items
                .iter()
                .map(Value::to_display_string)
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => "[object]".to_string(),
            Value::Function(_) => "<function>".to_string(),
            Value::Component(_) => "<component>".to_string(),
            Value::Node(_) => "<element>".to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a == b,
            (Value::Component(a), Value::Component(b)) => a == b,
            (Value::Node(a), Value::Node(b)) => a == b,
            _ => false,
        }
    }
}

/// A host function callable from the sandbox.
///
/// Errors are plain strings; the interpreter wraps them into its own
/// runtime fault.
#[derive(Clone)]
pub struct NativeFn(Arc<dyn Fn(Vec<Value>) -> Result<Value, String> + Send + Sync>);

impl NativeFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invoke the function.
    pub fn call(&self, args: Vec<Value>) -> Result<Value, String> {
        (self.0)(args)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<function>")
    }
}

impl PartialEq for NativeFn {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// One module in the binding environment.
#[derive(Debug, Clone, PartialEq)]
pub enum Module {
    /// A single default value: `import thing from "source"`.
    Value(Value),
    /// Named exports: `import { a, b } from "source"`.
    Named(BTreeMap<String, Value>),
}

/// The binding environment: an immutable mapping from import-source
/// strings (logical module paths) to the values they expose.
///
/// Supplied once per evaluation; the only external capability the sandbox
/// can observe. The core never mutates it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    modules: BTreeMap<String, Module>,
}

impl Bindings {
    /// An empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expose a single default value under `source`.
    pub fn with_value(mut self, source: impl Into<String>, value: Value) -> Self {
        self.modules.insert(source.into(), Module::Value(value));
        self
    }

    /// Expose named exports under `source`.
    pub fn with_named<K, I>(mut self, source: impl Into<String>, exports: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let named = exports
            .into_iter()
            .map(|(k, v)| (k.into(), v))
            .collect();
        self.modules.insert(source.into(), Module::Named(named));
        self
    }

    /// Look up a module by source string.
    pub fn get(&self, source: &str) -> Option<&Module> {
        self.modules.get(source)
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
