//! Document assembly: Markdown text plus embedded script constructs into
//! the document AST.
//!
//! Three layers:
//! 1. A line-oriented pre-pass extracts ESM blocks (`import`/`export` at
//!    column 0) and block-level component tags, parses them with the
//!    script parser, and blanks them in place so byte offsets of the
//!    remaining Markdown stay stable.
//! 2. `pulldown-cmark` turns the remaining Markdown into an event stream,
//!    converted to element nodes with an explicit open-element stack.
//! 3. Text runs are scanned for balanced `{...}` holes, which become
//!    expression nodes; raw HTML chunks either open/close inline
//!    component elements (capitalized tags) or become `Raw` nodes.

use crate::error::{ParseError, ParseResult};
use crate::expr::ScriptParser;
use mdsafe_types::ast::*;
use mdsafe_types::{SourceFile, Span};
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};

/// Parse a whole document into a [`Node::Root`].
pub fn parse_document(file: &SourceFile) -> ParseResult<Node> {
    let (masked, mut children) = extract_segments(file)?;
    let markdown = markdown_nodes(&masked, file)?;
    children.extend(markdown);
    children.sort_by_key(|(offset, _)| *offset);

    Ok(Node::Root(Root {
        children: children.into_iter().map(|(_, node)| node).collect(),
        span: file.span_of(0, file.source.len()),
    }))
}

// ══════════════════════════════════════════════════════════════════════════════
// Segment pre-pass
// ══════════════════════════════════════════════════════════════════════════════

fn is_esm_start(line: &str) -> bool {
    for kw in ["import", "export"] {
        if let Some(rest) = line.strip_prefix(kw) {
            let boundary = rest
                .bytes()
                .next()
                .map(|b| !b.is_ascii_alphanumeric() && b != b'_' && b != b'$');
            if boundary.unwrap_or(true) {
                return true;
            }
        }
    }
    false
}

fn is_tag_start(line: &str) -> bool {
    let bytes = line.as_bytes();
    bytes.first() == Some(&b'<')
        && bytes
            .get(1)
            .is_some_and(|b| b.is_ascii_uppercase() || *b == b'>')
}

/// Extract ESM and block-tag segments, returning the masked Markdown
/// source and the extracted nodes keyed by byte offset.
fn extract_segments(file: &SourceFile) -> ParseResult<(String, Vec<(usize, Node)>)> {
    let source = &file.source;
    let mut masked = source.as_bytes().to_vec();
    let mut nodes: Vec<(usize, Node)> = Vec::new();

    // (start offset, line text) for each line.
    let lines: Vec<(usize, &str)> = {
        let mut out = Vec::new();
        let mut offset = 0;
        for line in source.split_inclusive('\n') {
            out.push((offset, line.trim_end_matches(['\n', '\r'])));
            offset += line.len();
        }
        out
    };

    let mut in_fence = false;
    let mut i = 0;
    while i < lines.len() {
        let (offset, line) = lines[i];
        let trimmed = line.trim_start();

        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            i += 1;
            continue;
        }
        if in_fence {
            i += 1;
            continue;
        }

        // A paragraph that is a single balanced `{...}` hole is extracted
        // here too: tags inside it would otherwise be carved out of the
        // text run by the Markdown pass.
        if line.starts_with('{') {
            let mut j = i;
            while j < lines.len() && !lines[j].1.trim().is_empty() {
                j += 1;
            }
            let seg_end = lines[j - 1].0 + lines[j - 1].1.len();
            let segment = &source[offset..seg_end];
            if let Some(close) = find_balanced(segment.as_bytes(), 0) {
                if segment[close + 1..].trim().is_empty() {
                    let inner = &segment[1..close];
                    if !inner.trim().is_empty() && !is_comment_only(inner) {
                        let (line_no, col) = file.position(offset + 1);
                        let expr =
                            ScriptParser::new(inner, line_no, col).parse_single_expression()?;
                        let span = file.span_of(offset, offset + close + 1);
                        nodes.push((offset, Node::Expression(ExpressionNode { expr, span })));
                    }
                    for byte in &mut masked[offset..seg_end] {
                        if *byte != b'\n' {
                            *byte = b' ';
                        }
                    }
                    i = j;
                    continue;
                }
            }
        }

        if is_esm_start(line) || is_tag_start(line) {
            // The segment runs to the next blank line.
            let mut j = i;
            while j < lines.len() && !lines[j].1.trim().is_empty() {
                j += 1;
            }
            let seg_end = lines[j - 1].0 + lines[j - 1].1.len();
            let segment = &source[offset..seg_end];
            let (line_no, col) = file.position(offset);

            if is_esm_start(line) {
                let stmts = ScriptParser::new(segment, line_no, col).parse_program()?;
                for (k, stmt) in stmts.into_iter().enumerate() {
                    nodes.push((offset + k, stmt_node(stmt)));
                }
            } else {
                let elements = ScriptParser::new(segment, line_no, col).parse_tag_run()?;
                for (k, element) in elements.into_iter().enumerate() {
                    let span = element.span;
                    nodes.push((
                        offset + k,
                        Node::Expression(ExpressionNode {
                            expr: Expr::new(ExprKind::Jsx(Box::new(element)), span),
                            span,
                        }),
                    ));
                }
            }

            for byte in &mut masked[offset..seg_end] {
                if *byte != b'\n' {
                    *byte = b' ';
                }
            }
            i = j;
            continue;
        }

        i += 1;
    }

    let masked = String::from_utf8(masked).map_err(|_| ParseError::MalformedInput)?;
    Ok((masked, nodes))
}

fn stmt_node(stmt: Stmt) -> Node {
    match stmt {
        Stmt::Import(decl) => {
            let span = decl.span;
            Node::Import(ImportNode { decl, span })
        }
        Stmt::Export(decl) => {
            let span = decl.span;
            Node::Export(ExportNode { decl, span })
        }
        Stmt::Var(decl) => {
            let span = decl.span;
            Node::Declaration(DeclarationNode { decl, span })
        }
        Stmt::Expr(expr) => {
            let span = expr.span;
            Node::Expression(ExpressionNode { expr, span })
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Markdown conversion
// ══════════════════════════════════════════════════════════════════════════════

/// What one `Start` event pushed, so the matching `End` can undo it
/// without inspecting the tag again.
enum OpenKind {
    /// One element on the stack.
    Element,
    /// `pre` + `code` on the stack.
    CodeBlock,
    /// An `img` element collecting alt text.
    Image,
    /// Nothing on the stack.
    Skip,
}

struct StackEntry {
    el: Element,
    offset: usize,
    /// Opened by an inline component tag; closed only by its matching
    /// closing tag, never by a Markdown `End` event.
    inline_component: bool,
}

struct TreeBuilder<'a> {
    file: &'a SourceFile,
    top: Vec<(usize, Node)>,
    stack: Vec<StackEntry>,
    opens: Vec<OpenKind>,
    in_code: bool,
}

fn markdown_nodes(masked: &str, file: &SourceFile) -> ParseResult<Vec<(usize, Node)>> {
    let mut builder = TreeBuilder {
        file,
        top: Vec::new(),
        stack: Vec::new(),
        opens: Vec::new(),
        in_code: false,
    };

    let parser = Parser::new_ext(masked, Options::empty());
    for (event, range) in parser.into_offset_iter() {
        match event {
            Event::Start(tag) => builder.start(tag, range.start)?,
            Event::End(_) => builder.end()?,
            Event::Text(text) => builder.text(&text, range.start)?,
            Event::Code(text) => builder.inline_code(&text, range.start, range.end),
            Event::Html(html) | Event::InlineHtml(html) => {
                builder.raw(&html, range.start)?;
            }
            Event::SoftBreak => builder.attach(
                Node::Text(Text {
                    value: "\n".to_string(),
                    span: file.span_of(range.start, range.end),
                }),
                range.start,
            ),
            Event::HardBreak => {
                let br = Element::new("br", file.span_of(range.start, range.end));
                builder.attach(Node::Element(br), range.start);
            }
            Event::Rule => {
                let hr = Element::new("hr", file.span_of(range.start, range.end));
                builder.attach(Node::Element(hr), range.start);
            }
            _ => {}
        }
    }

    if let Some(open) = builder.stack.iter().find(|e| e.inline_component) {
        return Err(ParseError::UnclosedTag {
            name: open.el.name.clone(),
            span: open.el.span,
        });
    }
    Ok(builder.top)
}

fn heading_name(level: HeadingLevel) -> &'static str {
    match level {
        HeadingLevel::H1 => "h1",
        HeadingLevel::H2 => "h2",
        HeadingLevel::H3 => "h3",
        HeadingLevel::H4 => "h4",
        HeadingLevel::H5 => "h5",
        HeadingLevel::H6 => "h6",
    }
}

impl<'a> TreeBuilder<'a> {
    fn span_at(&self, offset: usize) -> Span {
        self.file.span_at(offset)
    }

    fn open(&mut self, name: &str, offset: usize) {
        self.stack.push(StackEntry {
            el: Element::new(name, self.span_at(offset)),
            offset,
            inline_component: false,
        });
    }

    fn attach(&mut self, node: Node, offset: usize) {
        if let Some(parent) = self.stack.last_mut() {
            parent.el.children.push(node);
        } else {
            self.top.push((offset, node));
        }
    }

    /// Pop the innermost Markdown-opened element and attach it.
    fn close_element(&mut self) -> ParseResult<StackEntry> {
        let Some(entry) = self.stack.pop() else {
            // pulldown events are balanced; a bare End without a Start
            // cannot happen.
            return Err(ParseError::UnexpectedEnd {
                expected: "open element".to_string(),
                span: Span::point(1, 1),
            });
        };
        if entry.inline_component {
            return Err(ParseError::UnclosedTag {
                name: entry.el.name.clone(),
                span: entry.el.span,
            });
        }
        Ok(entry)
    }

    fn finish_element(&mut self, entry: StackEntry) {
        let offset = entry.offset;
        self.attach(Node::Element(entry.el), offset);
    }

    fn start(&mut self, tag: Tag<'_>, offset: usize) -> ParseResult<()> {
        match tag {
            Tag::Paragraph => self.open("p", offset),
            Tag::Heading { level, .. } => self.open(heading_name(level), offset),
            Tag::BlockQuote(..) => self.open("blockquote", offset),
            Tag::CodeBlock(kind) => {
                self.open("pre", offset);
                self.open("code", offset);
                if let CodeBlockKind::Fenced(info) = kind {
                    let lang = info.split([' ', ',']).next().unwrap_or("");
                    if !lang.is_empty() {
                        if let Some(entry) = self.stack.last_mut() {
                            entry
                                .el
                                .set_attr("class", AttrValue::List(vec![format!("language-{lang}")]));
                        }
                    }
                }
                self.in_code = true;
                self.opens.push(OpenKind::CodeBlock);
                return Ok(());
            }
            Tag::List(Some(start)) => {
                self.open("ol", offset);
                if start != 1 {
                    if let Some(entry) = self.stack.last_mut() {
                        entry.el.set_attr("start", AttrValue::String(start.to_string()));
                    }
                }
            }
            Tag::List(None) => self.open("ul", offset),
            Tag::Item => self.open("li", offset),
            Tag::Emphasis => self.open("em", offset),
            Tag::Strong => self.open("strong", offset),
            Tag::Strikethrough => self.open("del", offset),
            Tag::Link {
                dest_url, title, ..
            } => {
                self.open("a", offset);
                if let Some(entry) = self.stack.last_mut() {
                    entry
                        .el
                        .set_attr("href", AttrValue::String(dest_url.to_string()));
                    if !title.is_empty() {
                        entry
                            .el
                            .set_attr("title", AttrValue::String(title.to_string()));
                    }
                }
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                self.open("img", offset);
                if let Some(entry) = self.stack.last_mut() {
                    entry
                        .el
                        .set_attr("src", AttrValue::String(dest_url.to_string()));
                    if !title.is_empty() {
                        entry
                            .el
                            .set_attr("title", AttrValue::String(title.to_string()));
                    }
                }
                self.opens.push(OpenKind::Image);
                return Ok(());
            }
            _ => {
                self.opens.push(OpenKind::Skip);
                return Ok(());
            }
        }
        self.opens.push(OpenKind::Element);
        Ok(())
    }

    fn end(&mut self) -> ParseResult<()> {
        match self.opens.pop() {
            Some(OpenKind::Element) => {
                let entry = self.close_element()?;
                self.finish_element(entry);
            }
            Some(OpenKind::CodeBlock) => {
                let code = self.close_element()?;
                self.finish_element(code);
                let pre = self.close_element()?;
                self.finish_element(pre);
                self.in_code = false;
            }
            Some(OpenKind::Image) => {
                let mut entry = self.close_element()?;
                let alt = collect_text(&entry.el.children);
                entry.el.children.clear();
                entry.el.set_attr("alt", AttrValue::String(alt));
                self.finish_element(entry);
            }
            Some(OpenKind::Skip) | None => {}
        }
        Ok(())
    }

    fn text(&mut self, text: &str, offset: usize) -> ParseResult<()> {
        if self.in_code {
            self.attach(
                Node::Text(Text {
                    value: text.to_string(),
                    span: self.file.span_of(offset, offset + text.len()),
                }),
                offset,
            );
            return Ok(());
        }
        self.split_inline(text, offset)
    }

    fn inline_code(&mut self, text: &str, start: usize, end: usize) {
        let span = self.file.span_of(start, end);
        let mut code = Element::new("code", span);
        // The range covers the backticks; the event text is the content.
        code.children.push(Node::Text(Text {
            value: text.to_string(),
            span,
        }));
        self.attach(Node::Element(code), start);
    }

    // ── Inline expressions ────────────────────────────────────────────────

    /// Split a text run into literal text and `{...}` expression holes.
    fn split_inline(&mut self, text: &str, base: usize) -> ParseResult<()> {
        let bytes = text.as_bytes();
        let mut i = 0;
        let mut lit_start = 0;
        while i < bytes.len() {
            if bytes[i] == b'{' {
                if i > lit_start {
                    self.attach_text(&text[lit_start..i], base + lit_start);
                }
                let close = find_balanced(bytes, i).ok_or(ParseError::UnbalancedBraces {
                    span: self.span_at(base + i),
                })?;
                let inner = &text[i + 1..close];
                if !inner.trim().is_empty() && !is_comment_only(inner) {
                    let (line, col) = self.file.position(base + i + 1);
                    let expr = ScriptParser::new(inner, line, col).parse_single_expression()?;
                    let span = self.file.span_of(base + i, base + close + 1);
                    self.attach(
                        Node::Expression(ExpressionNode { expr, span }),
                        base + i,
                    );
                }
                i = close + 1;
                lit_start = i;
            } else {
                i += 1;
            }
        }
        if lit_start < bytes.len() {
            self.attach_text(&text[lit_start..], base + lit_start);
        }
        Ok(())
    }

    fn attach_text(&mut self, value: &str, offset: usize) {
        self.attach(
            Node::Text(Text {
                value: value.to_string(),
                span: self.file.span_of(offset, offset + value.len()),
            }),
            offset,
        );
    }

    // ── Raw HTML ──────────────────────────────────────────────────────────

    /// Classify a raw HTML chunk: inline component open/close tags,
    /// complete component tags, or verbatim raw markup.
    fn raw(&mut self, html: &str, offset: usize) -> ParseResult<()> {
        let chunk = html.trim_end_matches('\n');
        let bytes = chunk.as_bytes();

        // Closing tag for an open inline component?
        if let Some(name) = closing_tag_name(chunk) {
            if name.as_bytes()[0].is_ascii_uppercase() {
                return match self.stack.pop() {
                    Some(entry) if entry.inline_component && entry.el.name == name => {
                        let entry_offset = entry.offset;
                        self.attach(Node::Element(entry.el), entry_offset);
                        Ok(())
                    }
                    entry => Err(ParseError::MismatchedTag {
                        expected: entry.map(|e| e.el.name).unwrap_or_default(),
                        found: name,
                        span: self.span_at(offset),
                    }),
                };
            }
            self.attach_raw(chunk, offset);
            return Ok(());
        }

        // A component tag chunk?
        if bytes.first() == Some(&b'<') && bytes.get(1).is_some_and(|b| b.is_ascii_uppercase()) {
            let (line, col) = self.file.position(offset);
            if chunk.ends_with("/>") || ends_with_matching_close(chunk) {
                // Complete in one chunk: a tag expression.
                let elements = ScriptParser::new(chunk, line, col).parse_tag_run()?;
                for element in elements {
                    let span = element.span;
                    self.attach(
                        Node::Expression(ExpressionNode {
                            expr: Expr::new(ExprKind::Jsx(Box::new(element)), span),
                            span,
                        }),
                        offset,
                    );
                }
                return Ok(());
            }
            // An opening tag: children arrive as subsequent events.
            let (name, attrs) = ScriptParser::new(chunk, line, col).parse_open_tag()?;
            let mut el = Element::new(&name.name, self.span_at(offset));
            for attr in attrs {
                let value = match attr.value {
                    JsxAttrValue::Bool(b) => AttrValue::Bool(b),
                    JsxAttrValue::String(s) => AttrValue::String(s),
                    JsxAttrValue::Expr(_) => {
                        return Err(ParseError::Expected {
                            expected: "literal attribute value on a paired inline tag"
                                .to_string(),
                            found: format!("expression for '{}'", attr.name.name),
                            span: attr.span,
                        });
                    }
                };
                el.set_attr(&attr.name.name, value);
            }
            self.stack.push(StackEntry {
                el,
                offset,
                inline_component: true,
            });
            return Ok(());
        }

        self.attach_raw(chunk, offset);
        Ok(())
    }

    fn attach_raw(&mut self, chunk: &str, offset: usize) {
        self.attach(
            Node::Raw(Raw {
                value: chunk.to_string(),
                span: self.file.span_of(offset, offset + chunk.len()),
            }),
            offset,
        );
    }
}

/// Gather descendant text content (for image alt text).
fn collect_text(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(&t.value),
            Node::Element(el) => out.push_str(&collect_text(&el.children)),
            _ => {}
        }
    }
    out
}

/// The tag name of a pure closing tag (`</Name>`), if this chunk is one.
fn closing_tag_name(chunk: &str) -> Option<String> {
    let rest = chunk.strip_prefix("</")?;
    let rest = rest.strip_suffix('>')?;
    let name = rest.trim();
    if !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || b == b'-')
    {
        Some(name.to_string())
    } else {
        None
    }
}

/// Whether a chunk that starts with an opening tag also contains its
/// closing tag — i.e. the element is complete within the chunk.
fn ends_with_matching_close(chunk: &str) -> bool {
    let name_end = chunk[1..]
        .find(|c: char| !c.is_ascii_alphanumeric() && c != '_' && c != '.' && c != '-')
        .map(|i| i + 1)
        .unwrap_or(chunk.len());
    let name = &chunk[1..name_end];
    !name.is_empty() && chunk.trim_end().ends_with(&format!("</{name}>"))
}

/// Whether an expression hole contains only a comment.
fn is_comment_only(inner: &str) -> bool {
    let trimmed = inner.trim();
    trimmed.starts_with("/*") && trimmed.ends_with("*/")
}

/// Find the `}` balancing the `{` at `open`, skipping quoted strings.
fn find_balanced(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            q @ (b'"' | b'\'' | b'`') => {
                i += 1;
                while i < bytes.len() && bytes[i] != q {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}
