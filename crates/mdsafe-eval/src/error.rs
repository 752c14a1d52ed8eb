//! Evaluation error types for the mdsafe interpreter.

use std::fmt;

/// Evaluation error — the first one raised aborts the whole document.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// The expression uses a form the sandbox grammar does not model
    /// (assignment, arrow function, unhoisted export).
    UnsupportedConstruct(String),
    /// Reference to a name not in scope and not satisfiable from the
    /// binding environment.
    UnboundIdentifier(String),
    /// A fault while evaluating a supported form: division by zero,
    /// property access on null, calling a non-function.
    RuntimeFault(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedConstruct(msg) => write!(f, "unsupported construct: {msg}"),
            Self::UnboundIdentifier(msg) => write!(f, "unbound identifier: {msg}"),
            Self::RuntimeFault(msg) => write!(f, "runtime fault: {msg}"),
        }
    }
}

impl std::error::Error for EvalError {}

/// Result alias for interpreter operations.
pub type EvalResult<T> = Result<T, EvalError>;
