//! Recursive-descent parser for the embedded script subset.
//!
//! Precedence (lowest → highest):
//! 8. `?:` (conditional)
//! 7. `??` (nullish)
//! 6. `||`
//! 5. `&&`
//! 4. `==`, `!=`, `===`, `!==`
//! 3. `<`, `>`, `<=`, `>=`
//! 2. `+`, `-`
//! 1. `*`, `/`, `%`
//! 0. unary `-`, `!`; then postfix `.`, `[]`, `()`; then primary
//!
//! Constructs the sandbox recognises but does not model — assignments,
//! arrow functions, spreads, optional chaining — parse into
//! [`ExprKind::Unsupported`] so the interpreter can reject them if (and
//! only if) they are actually evaluated.

use crate::cursor::Cursor;
use crate::error::{ParseError, ParseResult};
use mdsafe_types::ast::*;

pub(crate) struct ScriptParser<'src> {
    pub(crate) cur: Cursor<'src>,
    /// Current expression nesting depth (max 64).
    depth: u32,
}

const MAX_DEPTH: u32 = 64;

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

impl<'src> ScriptParser<'src> {
    /// Create a parser for a snippet starting at the given document
    /// position.
    pub(crate) fn new(source: &'src str, start_line: u32, start_col: u32) -> Self {
        Self {
            cur: Cursor::new(source, start_line, start_col),
            depth: 0,
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Entry Points
    // ══════════════════════════════════════════════════════════════════════

    /// Parse a statement list (an ESM block) to the end of the snippet.
    pub(crate) fn parse_program(mut self) -> ParseResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        loop {
            self.skip_separators();
            if self.cur.at_end() {
                break;
            }
            stmts.push(self.parse_stmt()?);
        }
        Ok(stmts)
    }

    /// Parse exactly one expression spanning the whole snippet.
    pub(crate) fn parse_single_expression(mut self) -> ParseResult<Expr> {
        self.cur.skip_ws();
        let expr = self.parse_expression()?;
        self.skip_separators();
        if !self.cur.at_end() {
            return Err(self.err_expected("end of expression"));
        }
        Ok(expr)
    }

    /// Parse a run of tag elements spanning the whole snippet.
    pub(crate) fn parse_tag_run(mut self) -> ParseResult<Vec<JsxElement>> {
        let mut elements = Vec::new();
        self.cur.skip_ws();
        while !self.cur.at_end() {
            elements.push(self.parse_jsx_element()?);
            self.cur.skip_ws();
        }
        Ok(elements)
    }

    fn skip_separators(&mut self) {
        self.cur.skip_ws();
        while self.cur.eat(b';') {
            self.cur.skip_ws();
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Statements
    // ══════════════════════════════════════════════════════════════════════

    fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        if self.keyword_ahead("import") {
            return self.parse_import().map(Stmt::Import);
        }
        if self.keyword_ahead("export") {
            return self.parse_export().map(Stmt::Export);
        }
        if self.keyword_ahead("const") || self.keyword_ahead("let") || self.keyword_ahead("var") {
            return self.parse_var_decl().map(Stmt::Var);
        }
        self.parse_expression().map(Stmt::Expr)
    }

    fn parse_import(&mut self) -> ParseResult<ImportDecl> {
        let mark = self.cur.mark();
        self.eat_keyword("import");
        self.cur.skip_ws();

        let mut specifiers = Vec::new();

        // `import "./side-effect"` has no specifiers.
        if !matches!(self.cur.peek(), Some(b'"' | b'\'')) {
            loop {
                self.cur.skip_ws();
                match self.cur.peek() {
                    Some(b'*') => {
                        self.cur.advance();
                        self.cur.skip_ws();
                        if !self.eat_keyword("as") {
                            return Err(self.err_expected("'as' after '*'"));
                        }
                        self.cur.skip_ws();
                        let local = self.parse_ident()?;
                        specifiers.push(ImportSpecifier::Namespace(local));
                    }
                    Some(b'{') => {
                        self.cur.advance();
                        loop {
                            self.cur.skip_ws();
                            if self.cur.eat(b'}') {
                                break;
                            }
                            let imported = self.parse_ident()?;
                            self.cur.skip_ws();
                            let local = if self.eat_keyword("as") {
                                self.cur.skip_ws();
                                self.parse_ident()?
                            } else {
                                imported.clone()
                            };
                            specifiers.push(ImportSpecifier::Named { imported, local });
                            self.cur.skip_ws();
                            if !self.cur.eat(b',') && self.cur.peek() != Some(b'}') {
                                return Err(self.err_expected("',' or '}' in import list"));
                            }
                        }
                    }
                    _ => {
                        let local = self.parse_ident()?;
                        specifiers.push(ImportSpecifier::Default(local));
                    }
                }
                self.cur.skip_ws();
                if !self.cur.eat(b',') {
                    break;
                }
            }
            self.cur.skip_ws();
            if !self.eat_keyword("from") {
                return Err(self.err_expected("'from' in import declaration"));
            }
            self.cur.skip_ws();
        }

        let source = match self.cur.peek() {
            Some(q @ (b'"' | b'\'')) => self.parse_string_body(q)?,
            _ => return Err(self.err_expected("module source string")),
        };
        self.cur.skip_ws();
        self.cur.eat(b';');

        Ok(ImportDecl {
            specifiers,
            source,
            span: self.cur.span_from(mark),
        })
    }

    fn parse_export(&mut self) -> ParseResult<ExportDecl> {
        let mark = self.cur.mark();
        self.eat_keyword("export");
        self.cur.skip_ws();
        if !(self.keyword_ahead("const") || self.keyword_ahead("let") || self.keyword_ahead("var"))
        {
            return Err(self.err_expected("'const' or 'let' after 'export'"));
        }
        let decl = self.parse_var_decl()?;
        Ok(ExportDecl {
            decl,
            span: self.cur.span_from(mark),
        })
    }

    fn parse_var_decl(&mut self) -> ParseResult<VarDecl> {
        let mark = self.cur.mark();
        let kind = if self.eat_keyword("const") {
            DeclKind::Const
        } else {
            // `let` and `var` share semantics in the sandbox.
            self.eat_keyword("let");
            self.eat_keyword("var");
            DeclKind::Let
        };
        self.cur.skip_ws();
        let name = self.parse_ident()?;
        self.cur.skip_ws();
        if !self.cur.eat(b'=') {
            return Err(self.err_expected("'=' in declaration"));
        }
        self.cur.skip_ws();
        let init = self.parse_expression()?;
        self.cur.skip_ws();
        self.cur.eat(b';');
        Ok(VarDecl {
            kind,
            name,
            init,
            span: self.cur.span_from(mark),
        })
    }

    // ══════════════════════════════════════════════════════════════════════
    // Precedence Chain
    // ══════════════════════════════════════════════════════════════════════

    /// Parse an expression, including the recognised-but-unsupported
    /// assignment and arrow forms.
    pub(crate) fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            self.depth -= 1;
            return Err(ParseError::Expected {
                expected: format!("expression nesting below {MAX_DEPTH} levels"),
                found: "deeper nesting".to_string(),
                span: self.cur.here(),
            });
        }
        let result = self.parse_expression_inner();
        self.depth -= 1;
        result
    }

    fn parse_expression_inner(&mut self) -> ParseResult<Expr> {
        let expr = self.parse_conditional()?;
        self.cur.skip_ws();

        // `x => body` — parse the body so the snippet is consumed, but
        // mark the whole thing unsupported.
        if self.cur.eat_str("=>") {
            self.cur.skip_ws();
            let body = self.parse_expression()?;
            return Ok(Expr::new(
                ExprKind::Unsupported("arrow function".to_string()),
                expr.span.merge(body.span),
            ));
        }

        if let Some(op) = self.assignment_ahead() {
            self.cur.eat_str(op);
            self.cur.skip_ws();
            let rhs = self.parse_expression()?;
            return Ok(Expr::new(
                ExprKind::Unsupported("assignment expression".to_string()),
                expr.span.merge(rhs.span),
            ));
        }

        Ok(expr)
    }

    fn assignment_ahead(&self) -> Option<&'static str> {
        let next = self.cur.peek_at(1);
        match self.cur.peek() {
            Some(b'=') if next != Some(b'=') && next != Some(b'>') => Some("="),
            Some(b'+') if next == Some(b'=') => Some("+="),
            Some(b'-') if next == Some(b'=') => Some("-="),
            Some(b'*') if next == Some(b'=') => Some("*="),
            Some(b'/') if next == Some(b'=') => Some("/="),
            Some(b'%') if next == Some(b'=') => Some("%="),
            _ => None,
        }
    }

    fn parse_conditional(&mut self) -> ParseResult<Expr> {
        let cond = self.parse_nullish()?;
        self.cur.skip_ws();
        // A lone '?' is the ternary; '??' and '?.' are handled elsewhere.
        if self.cur.peek() == Some(b'?')
            && !matches!(self.cur.peek_at(1), Some(b'?' | b'.'))
        {
            self.cur.advance();
            self.cur.skip_ws();
            let consequent = self.parse_conditional()?;
            self.cur.skip_ws();
            if !self.cur.eat(b':') {
                return Err(self.err_expected("':' in conditional expression"));
            }
            self.cur.skip_ws();
            let alternate = self.parse_conditional()?;
            let span = cond.span.merge(alternate.span);
            return Ok(Expr::new(
                ExprKind::Conditional {
                    cond: Box::new(cond),
                    consequent: Box::new(consequent),
                    alternate: Box::new(alternate),
                },
                span,
            ));
        }
        Ok(cond)
    }

    fn parse_nullish(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_or()?;
        loop {
            self.cur.skip_ws();
            if self.cur.starts_with("??") && self.cur.peek_at(2) != Some(b'=') {
                self.cur.eat_str("??");
                self.cur.skip_ws();
                let right = self.parse_or()?;
                let span = left.span.merge(right.span);
                left = Expr::new(
                    ExprKind::Logical {
                        left: Box::new(left),
                        op: LogicalOp::Nullish,
                        right: Box::new(right),
                    },
                    span,
                );
            } else {
                break;
            }
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_and()?;
        loop {
            self.cur.skip_ws();
            if self.cur.starts_with("||") && self.cur.peek_at(2) != Some(b'=') {
                self.cur.eat_str("||");
                self.cur.skip_ws();
                let right = self.parse_and()?;
                let span = left.span.merge(right.span);
                left = Expr::new(
                    ExprKind::Logical {
                        left: Box::new(left),
                        op: LogicalOp::Or,
                        right: Box::new(right),
                    },
                    span,
                );
            } else {
                break;
            }
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_equality()?;
        loop {
            self.cur.skip_ws();
            if self.cur.starts_with("&&") && self.cur.peek_at(2) != Some(b'=') {
                self.cur.eat_str("&&");
                self.cur.skip_ws();
                let right = self.parse_equality()?;
                let span = left.span.merge(right.span);
                left = Expr::new(
                    ExprKind::Logical {
                        left: Box::new(left),
                        op: LogicalOp::And,
                        right: Box::new(right),
                    },
                    span,
                );
            } else {
                break;
            }
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_relational()?;
        loop {
            self.cur.skip_ws();
            // Longest operators first.
            let op = if self.cur.eat_str("===") {
                BinOp::StrictEq
            } else if self.cur.eat_str("!==") {
                BinOp::StrictNotEq
            } else if self.cur.eat_str("==") {
                BinOp::Eq
            } else if self.cur.starts_with("!=") && self.cur.peek_at(2) != Some(b'=') {
                self.cur.eat_str("!=");
                BinOp::NotEq
            } else {
                break;
            };
            self.cur.skip_ws();
            let right = self.parse_relational()?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            self.cur.skip_ws();
            let op = if self.cur.eat_str("<=") {
                BinOp::LessEq
            } else if self.cur.eat_str(">=") {
                BinOp::GreaterEq
            } else if self.cur.peek() == Some(b'<') {
                self.cur.advance();
                BinOp::Less
            } else if self.cur.peek() == Some(b'>') {
                self.cur.advance();
                BinOp::Greater
            } else {
                break;
            };
            self.cur.skip_ws();
            let right = self.parse_additive()?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            self.cur.skip_ws();
            let next = self.cur.peek_at(1);
            let op = match self.cur.peek() {
                Some(b'+') if next != Some(b'=') && next != Some(b'+') => BinOp::Add,
                Some(b'-') if next != Some(b'=') && next != Some(b'-') => BinOp::Sub,
                _ => break,
            };
            self.cur.advance();
            self.cur.skip_ws();
            let right = self.parse_multiplicative()?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            self.cur.skip_ws();
            let next = self.cur.peek_at(1);
            let op = match self.cur.peek() {
                Some(b'*') if next != Some(b'=') && next != Some(b'*') => BinOp::Mul,
                Some(b'/') if next != Some(b'=') => BinOp::Div,
                Some(b'%') if next != Some(b'=') => BinOp::Mod,
                _ => break,
            };
            self.cur.advance();
            self.cur.skip_ws();
            let right = self.parse_unary()?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        self.cur.skip_ws();
        let mark = self.cur.mark();

        let op = match self.cur.peek() {
            Some(b'!') if self.cur.peek_at(1) != Some(b'=') => {
                self.cur.advance();
                Some(UnaryOp::Not)
            }
            Some(b'-') => {
                self.cur.advance();
                Some(UnaryOp::Neg)
            }
            _ => None,
        };
        if let Some(op) = op {
            self.cur.skip_ws();
            let operand = self.parse_unary()?;
            let span = self.cur.span_from(mark);
            return Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            ));
        }

        // Recognised prefixes outside the sandbox grammar — consume their
        // operand so parsing continues, reject at evaluation time.
        for kw in ["typeof", "new", "await", "delete", "void"] {
            if self.keyword_ahead(kw) {
                self.eat_keyword(kw);
                self.cur.skip_ws();
                self.parse_unary()?;
                return Ok(Expr::new(
                    ExprKind::Unsupported(format!("'{kw}' expression")),
                    self.cur.span_from(mark),
                ));
            }
        }

        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            // No whitespace skip before '.'/'['/'(' would be stricter than
            // the original language; skip to match it.
            self.cur.skip_ws();
            if self.cur.starts_with("?.") {
                self.cur.eat_str("?.");
                self.cur.skip_ws();
                let prop = self.parse_ident()?;
                expr = Expr::new(
                    ExprKind::Unsupported("optional chaining".to_string()),
                    expr.span.merge(prop.span),
                );
            } else if self.cur.peek() == Some(b'.')
                && self.cur.peek_at(1).is_some_and(is_ident_start)
            {
                self.cur.advance();
                let prop = self.parse_ident()?;
                let span = expr.span.merge(prop.span);
                expr = Expr::new(
                    ExprKind::Member {
                        object: Box::new(expr),
                        property: MemberProp::Name(prop),
                    },
                    span,
                );
            } else if self.cur.eat(b'[') {
                self.cur.skip_ws();
                let key = self.parse_expression()?;
                self.cur.skip_ws();
                if !self.cur.eat(b']') {
                    return Err(self.err_expected("']' after index expression"));
                }
                let span = expr.span.merge(self.cur.here());
                expr = Expr::new(
                    ExprKind::Member {
                        object: Box::new(expr),
                        property: MemberProp::Computed(Box::new(key)),
                    },
                    span,
                );
            } else if self.cur.eat(b'(') {
                let mut args = Vec::new();
                loop {
                    self.cur.skip_ws();
                    if self.cur.eat(b')') {
                        break;
                    }
                    if self.cur.eat_str("...") {
                        let mark = self.cur.mark();
                        self.cur.skip_ws();
                        self.parse_expression()?;
                        args.push(Expr::new(
                            ExprKind::Unsupported("spread argument".to_string()),
                            self.cur.span_from(mark),
                        ));
                    } else {
                        args.push(self.parse_expression()?);
                    }
                    self.cur.skip_ws();
                    if !self.cur.eat(b',') && self.cur.peek() != Some(b')') {
                        return Err(self.err_expected("',' or ')' in argument list"));
                    }
                }
                let span = expr.span.merge(self.cur.here());
                expr = Expr::new(
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    span,
                );
            } else {
                break;
            }
        }
        Ok(expr)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Primary Expressions
    // ══════════════════════════════════════════════════════════════════════

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        self.cur.skip_ws();
        let mark = self.cur.mark();

        match self.cur.peek() {
            None => Err(ParseError::UnexpectedEnd {
                expected: "expression".to_string(),
                span: self.cur.here(),
            }),
            Some(b'(') => self.parse_paren(mark),
            Some(b'[') => self.parse_array(mark),
            Some(b'{') => self.parse_object(mark),
            Some(q @ (b'"' | b'\'')) => {
                let value = self.parse_string_body(q)?;
                Ok(Expr::new(
                    ExprKind::StringLit(value),
                    self.cur.span_from(mark),
                ))
            }
            Some(b'`') => self.parse_template(mark),
            Some(b'<') => {
                let element = self.parse_jsx_element()?;
                let span = element.span;
                Ok(Expr::new(ExprKind::Jsx(Box::new(element)), span))
            }
            Some(b) if b.is_ascii_digit() => self.parse_number(mark),
            Some(b) if is_ident_start(b) => {
                let ident = self.parse_ident()?;
                let kind = match ident.name.as_str() {
                    "true" => ExprKind::BoolLit(true),
                    "false" => ExprKind::BoolLit(false),
                    "null" | "undefined" => ExprKind::NullLit,
                    _ => ExprKind::Identifier(ident.name),
                };
                Ok(Expr::new(kind, ident.span))
            }
            Some(b) => Err(ParseError::UnexpectedChar {
                found: b as char,
                span: self.cur.here(),
            }),
        }
    }

    fn parse_paren(&mut self, mark: (u32, u32)) -> ParseResult<Expr> {
        self.cur.advance(); // '('
        self.cur.skip_ws();
        let first = self.parse_expression()?;
        self.cur.skip_ws();

        // `(a, b)` only occurs as an arrow parameter list or a sequence
        // expression; neither is in the sandbox grammar.
        let mut unsupported = false;
        while self.cur.eat(b',') {
            unsupported = true;
            self.cur.skip_ws();
            self.parse_expression()?;
            self.cur.skip_ws();
        }
        if !self.cur.eat(b')') {
            return Err(self.err_expected("')'"));
        }
        if unsupported {
            return Ok(Expr::new(
                ExprKind::Unsupported("sequence or parameter list".to_string()),
                self.cur.span_from(mark),
            ));
        }
        Ok(Expr::new(first.kind, self.cur.span_from(mark)))
    }

    fn parse_array(&mut self, mark: (u32, u32)) -> ParseResult<Expr> {
        self.cur.advance(); // '['
        let mut elems = Vec::new();
        let mut has_spread = false;
        loop {
            self.cur.skip_ws();
            if self.cur.eat(b']') {
                break;
            }
            if self.cur.eat_str("...") {
                has_spread = true;
                self.cur.skip_ws();
                self.parse_expression()?;
            } else {
                elems.push(self.parse_expression()?);
            }
            self.cur.skip_ws();
            if !self.cur.eat(b',') && self.cur.peek() != Some(b']') {
                return Err(self.err_expected("',' or ']' in array literal"));
            }
        }
        let span = self.cur.span_from(mark);
        if has_spread {
            return Ok(Expr::new(
                ExprKind::Unsupported("array spread".to_string()),
                span,
            ));
        }
        Ok(Expr::new(ExprKind::ArrayLit(elems), span))
    }

    fn parse_object(&mut self, mark: (u32, u32)) -> ParseResult<Expr> {
        self.cur.advance(); // '{'
        let mut entries = Vec::new();
        let mut has_spread = false;
        loop {
            self.cur.skip_ws();
            if self.cur.eat(b'}') {
                break;
            }
            if self.cur.eat_str("...") {
                has_spread = true;
                self.cur.skip_ws();
                self.parse_expression()?;
            } else {
                let entry_mark = self.cur.mark();
                let key = match self.cur.peek() {
                    Some(q @ (b'"' | b'\'')) => self.parse_string_body(q)?,
                    Some(b) if is_ident_start(b) => self.parse_ident()?.name,
                    _ => return Err(self.err_expected("property name in object literal")),
                };
                self.cur.skip_ws();
                let value = if self.cur.eat(b':') {
                    self.cur.skip_ws();
                    self.parse_expression()?
                } else {
                    // Shorthand `{ name }`.
                    Expr::new(
                        ExprKind::Identifier(key.clone()),
                        self.cur.span_from(entry_mark),
                    )
                };
                let span = self.cur.span_from(entry_mark);
                entries.push(ObjectEntry { key, value, span });
            }
            self.cur.skip_ws();
            if !self.cur.eat(b',') && self.cur.peek() != Some(b'}') {
                return Err(self.err_expected("',' or '}' in object literal"));
            }
        }
        let span = self.cur.span_from(mark);
        if has_spread {
            return Ok(Expr::new(
                ExprKind::Unsupported("object spread".to_string()),
                span,
            ));
        }
        Ok(Expr::new(ExprKind::ObjectLit(entries), span))
    }

    fn parse_number(&mut self, mark: (u32, u32)) -> ParseResult<Expr> {
        let start = self.cur.pos();
        while self.cur.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.cur.advance();
        }
        if self.cur.peek() == Some(b'.') && self.cur.peek_at(1).is_some_and(|b| b.is_ascii_digit())
        {
            self.cur.advance();
            while self.cur.peek().is_some_and(|b| b.is_ascii_digit()) {
                self.cur.advance();
            }
        }
        if matches!(self.cur.peek(), Some(b'e' | b'E')) {
            let mut lookahead = 1;
            if matches!(self.cur.peek_at(1), Some(b'+' | b'-')) {
                lookahead = 2;
            }
            if self.cur.peek_at(lookahead).is_some_and(|b| b.is_ascii_digit()) {
                for _ in 0..=lookahead {
                    self.cur.advance();
                }
                while self.cur.peek().is_some_and(|b| b.is_ascii_digit()) {
                    self.cur.advance();
                }
            }
        }
        let text = self.cur.slice(start, self.cur.pos());
        let span = self.cur.span_from(mark);
        let value: f64 = text.parse().map_err(|_| ParseError::InvalidNumber {
            text: text.to_string(),
            span,
        })?;
        Ok(Expr::new(ExprKind::NumberLit(value), span))
    }

    /// Parse the body of a quoted string, consuming both quotes.
    pub(crate) fn parse_string_body(&mut self, quote: u8) -> ParseResult<String> {
        let open_span = self.cur.here();
        self.cur.advance(); // opening quote
        let mut buf: Vec<u8> = Vec::new();
        loop {
            match self.cur.peek() {
                None | Some(b'\n') => {
                    return Err(ParseError::UnterminatedString { span: open_span });
                }
                Some(b'\\') => {
                    self.cur.advance();
                    let Some(esc) = self.cur.advance() else {
                        return Err(ParseError::UnterminatedString { span: open_span });
                    };
                    match esc {
                        b'n' => buf.push(b'\n'),
                        b't' => buf.push(b'\t'),
                        b'r' => buf.push(b'\r'),
                        // Unknown escapes keep the escaped character.
                        other => buf.push(other),
                    }
                }
                Some(b) if b == quote => {
                    self.cur.advance();
                    break;
                }
                Some(b) => {
                    buf.push(b);
                    self.cur.advance();
                }
            }
        }
        String::from_utf8(buf).map_err(|_| ParseError::MalformedInput)
    }

    fn parse_template(&mut self, mark: (u32, u32)) -> ParseResult<Expr> {
        let open_span = self.cur.here();
        self.cur.advance(); // '`'
        let mut parts = Vec::new();
        let mut buf: Vec<u8> = Vec::new();
        loop {
            match self.cur.peek() {
                None => return Err(ParseError::UnterminatedString { span: open_span }),
                Some(b'`') => {
                    self.cur.advance();
                    break;
                }
                Some(b'\\') => {
                    self.cur.advance();
                    let Some(esc) = self.cur.advance() else {
                        return Err(ParseError::UnterminatedString { span: open_span });
                    };
                    match esc {
                        b'n' => buf.push(b'\n'),
                        b't' => buf.push(b'\t'),
                        b'r' => buf.push(b'\r'),
                        other => buf.push(other),
                    }
                }
                Some(b'$') if self.cur.peek_at(1) == Some(b'{') => {
                    if !buf.is_empty() {
                        let text = String::from_utf8(std::mem::take(&mut buf))
                            .map_err(|_| ParseError::MalformedInput)?;
                        parts.push(StringPart::Literal(text));
                    }
                    self.cur.eat_str("${");
                    self.cur.skip_ws();
                    let expr = self.parse_expression()?;
                    self.cur.skip_ws();
                    if !self.cur.eat(b'}') {
                        return Err(self.err_expected("'}' after interpolation"));
                    }
                    parts.push(StringPart::Expr(expr));
                }
                Some(b) => {
                    buf.push(b);
                    self.cur.advance();
                }
            }
        }
        if !buf.is_empty() {
            let text =
                String::from_utf8(buf).map_err(|_| ParseError::MalformedInput)?;
            parts.push(StringPart::Literal(text));
        }
        Ok(Expr::new(
            ExprKind::TemplateLit(parts),
            self.cur.span_from(mark),
        ))
    }

    // ══════════════════════════════════════════════════════════════════════
    // Helpers
    // ══════════════════════════════════════════════════════════════════════

    pub(crate) fn parse_ident(&mut self) -> ParseResult<Ident> {
        self.cur.skip_ws();
        let mark = self.cur.mark();
        let start = self.cur.pos();
        if !self.cur.peek().is_some_and(is_ident_start) {
            return Err(self.err_expected("identifier"));
        }
        while self.cur.peek().is_some_and(is_ident_continue) {
            self.cur.advance();
        }
        let name = self.cur.slice(start, self.cur.pos());
        Ok(Ident::new(name, self.cur.span_from(mark)))
    }

    /// Whether the input starts with `kw` as a whole word.
    pub(crate) fn keyword_ahead(&self, kw: &str) -> bool {
        self.cur.starts_with(kw) && !self.cur.peek_at(kw.len()).is_some_and(is_ident_continue)
    }

    /// Consume `kw` if it is ahead as a whole word.
    pub(crate) fn eat_keyword(&mut self, kw: &str) -> bool {
        if self.keyword_ahead(kw) {
            self.cur.eat_str(kw);
            true
        } else {
            false
        }
    }

    pub(crate) fn err_expected(&self, expected: &str) -> ParseError {
        let found = match self.cur.peek() {
            Some(b) => (b as char).to_string(),
            None => "end of input".to_string(),
        };
        ParseError::Expected {
            expected: expected.to_string(),
            found,
            span: self.cur.here(),
        }
    }
}
