//! Render pipeline error types.

use mdsafe_eval::EvalError;
use thiserror::Error;

/// Errors raised by the render pipeline.
///
/// All of them are fatal to the current call: the first error aborts the
/// tree walk and there is no partial output.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    /// Conflicting filter configuration, detected before any traversal.
    #[error("invalid policy: {0}")]
    InvalidPolicy(String),

    /// An evaluator failure, propagated unchanged.
    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Result alias for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
