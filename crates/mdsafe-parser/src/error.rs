//! Parser error types.

use mdsafe_types::Span;
use thiserror::Error;

/// Errors raised while turning source text into the document AST.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// The input bytes are not textual (not valid UTF-8).
    #[error("malformed input: document source is not valid UTF-8 text")]
    MalformedInput,

    /// An unexpected character in an embedded script snippet.
    #[error("{span}: unexpected character '{found}'")]
    UnexpectedChar { found: char, span: Span },

    /// The snippet ended where more input was required.
    #[error("{span}: unexpected end of input, expected {expected}")]
    UnexpectedEnd { expected: String, span: Span },

    /// A different token was required at this position.
    #[error("{span}: expected {expected}, found '{found}'")]
    Expected {
        expected: String,
        found: String,
        span: Span,
    },

    /// A string or template literal without a closing quote.
    #[error("{span}: unterminated string literal")]
    UnterminatedString { span: Span },

    /// A numeric literal that does not parse.
    #[error("{span}: invalid number literal '{text}'")]
    InvalidNumber { text: String, span: Span },

    /// An inline `{` without a balancing `}`.
    #[error("{span}: unbalanced braces in embedded expression")]
    UnbalancedBraces { span: Span },

    /// A tag closed under a different name than it was opened with.
    #[error("{span}: closing tag '</{found}>' does not match opening tag '<{expected}>'")]
    MismatchedTag {
        expected: String,
        found: String,
        span: Span,
    },

    /// A tag that was never closed.
    #[error("{span}: unclosed tag '<{name}>'")]
    UnclosedTag { name: String, span: Span },
}

/// Result alias for parser operations.
pub type ParseResult<T> = Result<T, ParseError>;
