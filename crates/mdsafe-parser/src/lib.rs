//! mdsafe parser: Markdown plus embedded script constructs into the
//! document AST.
//!
//! The downstream crates (`mdsafe-eval`, `mdsafe-render`) consume only the
//! AST defined in `mdsafe-types`; any other producer of that AST can stand
//! in for this crate.

mod cursor;
mod document;
mod error;
mod expr;
mod jsx;

pub use document::parse_document;
pub use error::{ParseError, ParseResult};

use mdsafe_types::ast::{Expr, Node, Stmt};
use mdsafe_types::SourceFile;

/// Parse a document from a string.
pub fn parse_str(source: &str) -> ParseResult<Node> {
    parse_document(&SourceFile::new("<document>", source))
}

/// Parse a document from raw bytes.
///
/// Fails with [`ParseError::MalformedInput`] if the bytes are not textual.
pub fn parse_bytes(name: &str, bytes: &[u8]) -> ParseResult<Node> {
    let text = std::str::from_utf8(bytes).map_err(|_| ParseError::MalformedInput)?;
    parse_document(&SourceFile::new(name, text))
}

/// Parse a single embedded expression snippet.
pub fn parse_expression(source: &str) -> ParseResult<Expr> {
    expr::ScriptParser::new(source, 1, 1).parse_single_expression()
}

/// Parse an embedded statement list (an ESM block).
pub fn parse_program(source: &str) -> ParseResult<Vec<Stmt>> {
    expr::ScriptParser::new(source, 1, 1).parse_program()
}
