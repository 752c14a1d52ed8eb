//! AST node types for mdsafe documents and their embedded script snippets.
//!
//! Every node carries a [`Span`] for error reporting.
//! Large recursive types are boxed to keep enum sizes reasonable.
//! Attribute lists and object literals use `Vec`, not maps — the AST
//! preserves source order.

use crate::Span;

// ══════════════════════════════════════════════════════════════════════════════
// Document Nodes
// ══════════════════════════════════════════════════════════════════════════════

/// A node in the document tree.
///
/// `Root`, `Element`, `Text` and `Raw` come from Markdown; `Expression`,
/// `Import` and `Export` come from embedded script constructs.
/// `Declaration` only appears after export hoisting — it is the plain
/// variable declaration an `Export` node is rewritten into.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Root(Root),
    Element(Element),
    Text(Text),
    Raw(Raw),
    Expression(ExpressionNode),
    Import(ImportNode),
    Export(ExportNode),
    Declaration(DeclarationNode),
}

impl Node {
    /// Source location of the node.
    pub fn span(&self) -> Span {
        match self {
            Node::Root(n) => n.span,
            Node::Element(n) => n.span,
            Node::Text(n) => n.span,
            Node::Raw(n) => n.span,
            Node::Expression(n) => n.span,
            Node::Import(n) => n.span,
            Node::Export(n) => n.span,
            Node::Declaration(n) => n.span,
        }
    }

    /// Child list, for node kinds that own one.
    pub fn children(&self) -> Option<&Vec<Node>> {
        match self {
            Node::Root(n) => Some(&n.children),
            Node::Element(n) => Some(&n.children),
            _ => None,
        }
    }

    /// Mutable child list, for node kinds that own one.
    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Root(n) => Some(&mut n.children),
            Node::Element(n) => Some(&mut n.children),
            _ => None,
        }
    }
}

/// The document root.
#[derive(Debug, Clone, PartialEq)]
pub struct Root {
    pub children: Vec<Node>,
    pub span: Span,
}

/// An element: `<p>...</p>`, a heading, a link, a list item.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Tag name, lowercase for Markdown-derived elements: `h1`, `p`, `a`.
    pub name: String,
    /// Attributes in source order.
    pub attrs: Vec<Attr>,
    pub children: Vec<Node>,
    pub span: Span,
}

impl Element {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
            span,
        }
    }

    /// Look up an attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.value)
    }

    /// Set an attribute, replacing any existing value under the same name.
    pub fn set_attr(&mut self, name: &str, value: AttrValue) {
        if let Some(attr) = self.attrs.iter_mut().find(|a| a.name == name) {
            attr.value = value;
        } else {
            self.attrs.push(Attr {
                name: name.to_string(),
                value,
            });
        }
    }
}

/// A single element attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub name: String,
    pub value: AttrValue,
}

impl Attr {
    pub fn new(name: impl Into<String>, value: AttrValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// An attribute value: boolean, string, or space-separated token list.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Bool(bool),
    String(String),
    List(Vec<String>),
}

impl AttrValue {
    /// The string form, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// A text run.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub value: String,
    pub span: Span,
}

/// Verbatim raw markup, passed through from the source without parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct Raw {
    pub value: String,
    pub span: Span,
}

/// An embedded expression: `{count + 1}`.
///
/// Opaque to the sanitizer; evaluated by the interpreter during
/// materialization.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionNode {
    pub expr: Expr,
    pub span: Span,
}

/// `import { Foo } from './bar'`
#[derive(Debug, Clone, PartialEq)]
pub struct ImportNode {
    pub decl: ImportDecl,
    pub span: Span,
}

/// `export const foo = 'bar'`
#[derive(Debug, Clone, PartialEq)]
pub struct ExportNode {
    pub decl: ExportDecl,
    pub span: Span,
}

/// A plain declaration — the post-hoist form of an [`ExportNode`].
#[derive(Debug, Clone, PartialEq)]
pub struct DeclarationNode {
    pub decl: VarDecl,
    pub span: Span,
}

// ══════════════════════════════════════════════════════════════════════════════
// Identifiers
// ══════════════════════════════════════════════════════════════════════════════

/// A spanned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Statements
// ══════════════════════════════════════════════════════════════════════════════

/// A statement in an embedded script block.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `import Foo from './foo'` / `import { A, B } from './ab'`
    Import(ImportDecl),
    /// `export const x = 1` — rejected by the interpreter; the hoister
    /// rewrites it to [`Stmt::Var`] before evaluation.
    Export(ExportDecl),
    /// `const x = 1` / `let y = f(x)`
    Var(VarDecl),
    /// A bare expression (value is discarded).
    Expr(Expr),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Import(d) => d.span,
            Stmt::Export(d) => d.span,
            Stmt::Var(d) => d.span,
            Stmt::Expr(e) => e.span,
        }
    }
}

/// `import <specifiers> from "<source>"`
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub specifiers: Vec<ImportSpecifier>,
    /// The module source string, e.g. `./bar`.
    pub source: String,
    pub span: Span,
}

/// One name bound by an import declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportSpecifier {
    /// `import Foo from '...'`
    Default(Ident),
    /// `import { imported as local } from '...'`
    Named { imported: Ident, local: Ident },
    /// `import * as ns from '...'`
    Namespace(Ident),
}

/// `export <decl>`
#[derive(Debug, Clone, PartialEq)]
pub struct ExportDecl {
    pub decl: VarDecl,
    pub span: Span,
}

/// `const name = init` / `let name = init`
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub kind: DeclKind,
    pub name: Ident,
    pub init: Expr,
    pub span: Span,
}

/// Declaration keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Const,
    Let,
}

impl DeclKind {
    /// Returns the keyword for error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclKind::Const => "const",
            DeclKind::Let => "let",
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

/// An expression node. Uses `Box` for recursive variants.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of expression.
///
/// This enum is the whole sandbox grammar: the interpreter walks exactly
/// these variants and nothing else. [`ExprKind::Unsupported`] marks
/// constructs the parser recognised but the sandbox does not model; it
/// fails only if actually evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    // ── Literals ──
    /// `null` / `undefined`
    NullLit,
    /// `true` / `false`
    BoolLit(bool),
    /// `42`, `3.14`
    NumberLit(f64),
    /// `'hello'` or `"hello"` (no interpolation)
    StringLit(String),
    /// `` `a ${b} c` `` — parts alternate literal text and expressions
    TemplateLit(Vec<StringPart>),
    /// `[a, b, c]`
    ArrayLit(Vec<Expr>),
    /// `{ key: value, ... }`
    ObjectLit(Vec<ObjectEntry>),

    // ── Identifiers, access, calls ──
    /// `count`, `Foo`
    Identifier(String),
    /// `obj.name` / `obj[expr]`
    Member {
        object: Box<Expr>,
        property: MemberProp,
    },
    /// `f(a, b)`
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },

    // ── Operators ──
    /// `-x`, `!x`
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// `a + b`, `a === b`, etc.
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    /// `a && b`, `a || b`, `a ?? b` — short-circuit, operand-valued
    Logical {
        left: Box<Expr>,
        op: LogicalOp,
        right: Box<Expr>,
    },
    /// `cond ? a : b`
    Conditional {
        cond: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },

    // ── Tags ──
    /// `<Tag attr="x">{child}</Tag>` / `<>...</>`
    Jsx(Box<JsxElement>),

    // ── Escape hatch ──
    /// A construct outside the sandbox grammar (assignment, arrow
    /// function). Carries a short description for the error message.
    Unsupported(String),
}

/// A part of a template literal.
#[derive(Debug, Clone, PartialEq)]
pub enum StringPart {
    /// Literal text segment.
    Literal(String),
    /// An interpolated expression `${expr}`.
    Expr(Expr),
}

/// An entry in an object literal: `key: value`.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectEntry {
    pub key: String,
    pub value: Expr,
    pub span: Span,
}

/// The property side of a member expression.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberProp {
    /// `obj.name`
    Name(Ident),
    /// `obj[expr]`
    Computed(Box<Expr>),
}

// ── Operators ─────────────────────────────────────────────────────────────────

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Less,
    Greater,
    LessEq,
    GreaterEq,
}

impl BinOp {
    /// Returns the operator symbol for error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::StrictEq => "===",
            BinOp::StrictNotEq => "!==",
            BinOp::Less => "<",
            BinOp::Greater => ">",
            BinOp::LessEq => "<=",
            BinOp::GreaterEq => ">=",
        }
    }
}

/// Short-circuit operators. These return one of their operands, not a
/// boolean — `{flag && <Badge/>}` relies on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Nullish,
}

impl LogicalOp {
    /// Returns the operator symbol for error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
            LogicalOp::Nullish => "??",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `!x`
    Not,
}

// ══════════════════════════════════════════════════════════════════════════════
// JSX-like Tags
// ══════════════════════════════════════════════════════════════════════════════

/// A tag expression: `<Tag attr="x">{child}</Tag>`.
///
/// `name` is `None` for fragments (`<>...</>`). Capitalized names resolve
/// through the interpreter scope (components); lowercase names become plain
/// output elements.
#[derive(Debug, Clone, PartialEq)]
pub struct JsxElement {
    pub name: Option<Ident>,
    pub attrs: Vec<JsxAttr>,
    pub children: Vec<JsxChild>,
    pub span: Span,
}

/// A tag attribute: `attr="x"`, `attr={expr}`, or bare `attr`.
#[derive(Debug, Clone, PartialEq)]
pub struct JsxAttr {
    pub name: Ident,
    pub value: JsxAttrValue,
    pub span: Span,
}

/// The value of a tag attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum JsxAttrValue {
    /// Bare attribute: `<input disabled/>`
    Bool(bool),
    /// `attr="literal"`
    String(String),
    /// `attr={expr}`
    Expr(Expr),
}

/// A child of a tag expression.
#[derive(Debug, Clone, PartialEq)]
pub enum JsxChild {
    /// A text run between tags.
    Text(String),
    /// `{expr}`
    Expr(Expr),
    /// A nested tag.
    Element(JsxElement),
}
