//! JSX-like tag parsing for embedded expressions and document tags.
//!
//! Grammar:
//!
//! ```text
//! element  = '<' '>' children '</' '>'                    (fragment)
//!          | '<' name attrs '/>'                          (self-closing)
//!          | '<' name attrs '>' children '</' name '>'
//! attr     = name | name '=' string | name '=' '{' expr '}'
//! child    = text | '{' expr '}' | '{' '/*' ... '*/' '}' | element
//! ```
//!
//! Closing-tag names must match their opening tag; mismatches are parse
//! errors rather than recovery points, the same fail-fast stance the rest
//! of the snippet parser takes.

use crate::error::{ParseError, ParseResult};
use crate::expr::ScriptParser;
use mdsafe_types::ast::*;

fn is_tag_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || b == b'-'
}

impl<'src> ScriptParser<'src> {
    /// Parse one tag element. The cursor must be on `<`.
    pub(crate) fn parse_jsx_element(&mut self) -> ParseResult<JsxElement> {
        let mark = self.cur.mark();
        self.cur.advance(); // '<'

        // Fragment: `<>children</>`
        if self.cur.eat(b'>') {
            let children = self.parse_jsx_children(None)?;
            return Ok(JsxElement {
                name: None,
                attrs: Vec::new(),
                children,
                span: self.cur.span_from(mark),
            });
        }

        let name = self.parse_tag_name()?;
        let mut attrs = Vec::new();

        loop {
            self.cur.skip_ws();
            if self.cur.eat_str("/>") {
                return Ok(JsxElement {
                    name: Some(name),
                    attrs,
                    children: Vec::new(),
                    span: self.cur.span_from(mark),
                });
            }
            if self.cur.eat(b'>') {
                let children = self.parse_jsx_children(Some(&name))?;
                return Ok(JsxElement {
                    name: Some(name),
                    attrs,
                    children,
                    span: self.cur.span_from(mark),
                });
            }
            if self.cur.at_end() {
                return Err(ParseError::UnclosedTag {
                    name: name.name,
                    span: self.cur.span_from(mark),
                });
            }
            attrs.push(self.parse_jsx_attr()?);
        }
    }

    /// Parse a lone opening tag (`<Name attrs>`), as emitted for paired
    /// inline tags whose children arrive as separate events.
    pub(crate) fn parse_open_tag(mut self) -> ParseResult<(Ident, Vec<JsxAttr>)> {
        self.cur.skip_ws();
        if !self.cur.eat(b'<') {
            return Err(self.err_expected("'<'"));
        }
        let name = self.parse_tag_name()?;
        let mut attrs = Vec::new();
        loop {
            self.cur.skip_ws();
            if self.cur.eat(b'>') {
                return Ok((name, attrs));
            }
            if self.cur.at_end() || self.cur.starts_with("/>") {
                return Err(ParseError::UnclosedTag {
                    name: name.name,
                    span: self.cur.here(),
                });
            }
            attrs.push(self.parse_jsx_attr()?);
        }
    }

    fn parse_jsx_attr(&mut self) -> ParseResult<JsxAttr> {
        let mark = self.cur.mark();

        // `{...props}` — a spread attribute. Parsed, rejected on
        // evaluation.
        if self.cur.eat(b'{') {
            self.cur.skip_ws();
            if !self.cur.eat_str("...") {
                return Err(self.err_expected("'...' in spread attribute"));
            }
            self.cur.skip_ws();
            let inner = self.parse_expression()?;
            self.cur.skip_ws();
            if !self.cur.eat(b'}') {
                return Err(self.err_expected("'}' after spread attribute"));
            }
            let span = self.cur.span_from(mark);
            return Ok(JsxAttr {
                name: Ident::new("...", span),
                value: JsxAttrValue::Expr(Expr::new(
                    ExprKind::Unsupported("spread attribute".to_string()),
                    inner.span,
                )),
                span,
            });
        }

        let name = self.parse_attr_name()?;
        self.cur.skip_ws();
        let value = if self.cur.eat(b'=') {
            self.cur.skip_ws();
            match self.cur.peek() {
                Some(q @ (b'"' | b'\'')) => JsxAttrValue::String(self.parse_attr_string(q)?),
                Some(b'{') => {
                    self.cur.advance();
                    self.cur.skip_ws();
                    let expr = self.parse_expression()?;
                    self.cur.skip_ws();
                    if !self.cur.eat(b'}') {
                        return Err(self.err_expected("'}' after attribute expression"));
                    }
                    JsxAttrValue::Expr(expr)
                }
                _ => return Err(self.err_expected("attribute value")),
            }
        } else {
            // Bare attribute: `<input disabled/>`
            JsxAttrValue::Bool(true)
        };
        Ok(JsxAttr {
            name,
            value,
            span: self.cur.span_from(mark),
        })
    }

    /// Attribute names follow HTML conventions: `data-count`, `xml:lang`.
    fn parse_attr_name(&mut self) -> ParseResult<Ident> {
        let mark = self.cur.mark();
        let start = self.cur.pos();
        if !self
            .cur
            .peek()
            .is_some_and(|b| b.is_ascii_alphabetic() || b == b'_')
        {
            return Err(self.err_expected("attribute name"));
        }
        while self
            .cur
            .peek()
            .is_some_and(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b':'))
        {
            self.cur.advance();
        }
        let name = self.cur.slice(start, self.cur.pos());
        Ok(Ident::new(name, self.cur.span_from(mark)))
    }

    /// Attribute string values are verbatim; no escape processing, like
    /// HTML.
    fn parse_attr_string(&mut self, quote: u8) -> ParseResult<String> {
        let open_span = self.cur.here();
        self.cur.advance(); // opening quote
        let start = self.cur.pos();
        loop {
            match self.cur.peek() {
                None => return Err(ParseError::UnterminatedString { span: open_span }),
                Some(b) if b == quote => {
                    let value = self.cur.slice(start, self.cur.pos()).to_string();
                    self.cur.advance();
                    return Ok(value);
                }
                _ => {
                    self.cur.advance();
                }
            }
        }
    }

    fn parse_jsx_children(&mut self, open: Option<&Ident>) -> ParseResult<Vec<JsxChild>> {
        let mut children = Vec::new();
        loop {
            if self.cur.starts_with("</") {
                self.cur.eat_str("</");
                self.cur.skip_ws();
                match open {
                    None => {
                        if !self.cur.eat(b'>') {
                            return Err(self.err_expected("'>' to close fragment"));
                        }
                    }
                    Some(open_name) => {
                        let close = self.parse_tag_name()?;
                        self.cur.skip_ws();
                        if !self.cur.eat(b'>') {
                            return Err(self.err_expected("'>' in closing tag"));
                        }
                        if close.name != open_name.name {
                            return Err(ParseError::MismatchedTag {
                                expected: open_name.name.clone(),
                                found: close.name,
                                span: close.span,
                            });
                        }
                    }
                }
                return Ok(children);
            }

            match self.cur.peek() {
                None => {
                    return Err(ParseError::UnclosedTag {
                        name: open.map(|n| n.name.clone()).unwrap_or_default(),
                        span: self.cur.here(),
                    });
                }
                Some(b'<') => {
                    children.push(JsxChild::Element(self.parse_jsx_element()?));
                }
                Some(b'{') => {
                    self.cur.advance();
                    self.cur.skip_ws();
                    // `{/* comment */}` and `{}` contribute nothing.
                    if self.cur.starts_with("/*") {
                        self.skip_block_comment()?;
                        self.cur.skip_ws();
                        if !self.cur.eat(b'}') {
                            return Err(self.err_expected("'}' after comment"));
                        }
                        continue;
                    }
                    if self.cur.eat(b'}') {
                        continue;
                    }
                    let expr = self.parse_expression()?;
                    self.cur.skip_ws();
                    if !self.cur.eat(b'}') {
                        return Err(self.err_expected("'}' after child expression"));
                    }
                    children.push(JsxChild::Expr(expr));
                }
                Some(_) => {
                    if let Some(text) = self.take_jsx_text() {
                        children.push(JsxChild::Text(text));
                    }
                }
            }
        }
    }

    /// Consume a text run up to the next `<`, `{`, or end of input.
    ///
    /// Runs that are pure inter-tag layout (whitespace containing a
    /// newline) are dropped; everything else is kept verbatim.
    fn take_jsx_text(&mut self) -> Option<String> {
        let start = self.cur.pos();
        while !matches!(self.cur.peek(), None | Some(b'<') | Some(b'{')) {
            self.cur.advance();
        }
        let text = self.cur.slice(start, self.cur.pos());
        if text.chars().all(char::is_whitespace) && text.contains('\n') {
            return None;
        }
        Some(text.to_string())
    }

    fn parse_tag_name(&mut self) -> ParseResult<Ident> {
        let mark = self.cur.mark();
        let start = self.cur.pos();
        if !self
            .cur
            .peek()
            .is_some_and(|b| b.is_ascii_alphabetic() || b == b'_')
        {
            return Err(self.err_expected("tag name"));
        }
        while self.cur.peek().is_some_and(is_tag_name_byte) {
            self.cur.advance();
        }
        let name = self.cur.slice(start, self.cur.pos());
        Ok(Ident::new(name, self.cur.span_from(mark)))
    }

    fn skip_block_comment(&mut self) -> ParseResult<()> {
        let open_span = self.cur.here();
        self.cur.eat_str("/*");
        while !self.cur.at_end() {
            if self.cur.eat_str("*/") {
                return Ok(());
            }
            self.cur.advance();
        }
        Err(ParseError::UnexpectedEnd {
            expected: "'*/' to close comment".to_string(),
            span: open_span,
        })
    }
}
