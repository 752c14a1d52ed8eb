//! mdsafe sandbox interpreter.
//!
//! A restricted tree-walking evaluator for the embedded-script subset:
//! it executes hoisted programs and inline expressions directly from the
//! typed AST, against a caller-supplied binding environment. Input text is
//! never compiled to executable code; any AST form outside the modeled
//! subset is rejected with [`EvalError::UnsupportedConstruct`].

mod env;
mod error;
mod interp;

pub use env::Environment;
pub use error::{EvalError, EvalResult};
pub use interp::Interpreter;
