//! Integration tests for document and snippet parsing.

use mdsafe_parser::{parse_bytes, parse_expression, parse_program, parse_str, ParseError};
use mdsafe_types::ast::*;

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

/// Parse a document and return the root's children (panics on errors).
fn parse(source: &str) -> Vec<Node> {
    let node = parse_str(source).expect("document should parse");
    let Node::Root(root) = node else {
        panic!("parse_str should produce a root node");
    };
    root.children
}

fn as_element(node: &Node) -> &Element {
    let Node::Element(el) = node else {
        panic!("expected element, got {node:?}");
    };
    el
}

fn text_of(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(&t.value),
            Node::Element(el) => out.push_str(&text_of(&el.children)),
            _ => {}
        }
    }
    out
}

// ══════════════════════════════════════════════════════════════════════════════
// Markdown structure
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn heading_and_paragraph() {
    let children = parse("# Hello, world!\n\nThis is a test.");
    assert_eq!(children.len(), 2);

    let h1 = as_element(&children[0]);
    assert_eq!(h1.name, "h1");
    assert_eq!(text_of(&h1.children), "Hello, world!");

    let p = as_element(&children[1]);
    assert_eq!(p.name, "p");
    assert_eq!(text_of(&p.children), "This is a test.");
}

#[test]
fn emphasis_strong_and_inline_code() {
    let children = parse("some *em* and **strong** and `code`");
    let p = as_element(&children[0]);
    let tags: Vec<&str> = p
        .children
        .iter()
        .filter_map(|n| match n {
            Node::Element(el) => Some(el.name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(tags, vec!["em", "strong", "code"]);
}

#[test]
fn link_with_href() {
    let children = parse("[docs](https://example.com \"the title\")");
    let p = as_element(&children[0]);
    let a = as_element(&p.children[0]);
    assert_eq!(a.name, "a");
    assert_eq!(
        a.attr("href"),
        Some(&AttrValue::String("https://example.com".to_string()))
    );
    assert_eq!(
        a.attr("title"),
        Some(&AttrValue::String("the title".to_string()))
    );
    assert_eq!(text_of(&a.children), "docs");
}

#[test]
fn image_collects_alt_text() {
    let children = parse("![an image](/pic.png)");
    let p = as_element(&children[0]);
    let img = as_element(&p.children[0]);
    assert_eq!(img.name, "img");
    assert_eq!(img.attr("src"), Some(&AttrValue::String("/pic.png".to_string())));
    assert_eq!(img.attr("alt"), Some(&AttrValue::String("an image".to_string())));
    assert!(img.children.is_empty());
}

#[test]
fn fenced_code_block() {
    let children = parse("```rust\nfn main() {}\n```");
    let pre = as_element(&children[0]);
    assert_eq!(pre.name, "pre");
    let code = as_element(&pre.children[0]);
    assert_eq!(code.name, "code");
    assert_eq!(
        code.attr("class"),
        Some(&AttrValue::List(vec!["language-rust".to_string()]))
    );
    assert_eq!(text_of(&code.children), "fn main() {}\n");
}

#[test]
fn code_block_content_is_not_scanned_for_expressions() {
    let children = parse("```\n{not + an + expression}\n```");
    let pre = as_element(&children[0]);
    let code = as_element(&pre.children[0]);
    assert!(matches!(&code.children[0], Node::Text(_)));
}

#[test]
fn lists() {
    let children = parse("- one\n- two\n");
    let ul = as_element(&children[0]);
    assert_eq!(ul.name, "ul");
    assert_eq!(ul.children.len(), 2);
    assert_eq!(as_element(&ul.children[0]).name, "li");
}

#[test]
fn ordered_list_start_attribute() {
    let children = parse("3. three\n4. four\n");
    let ol = as_element(&children[0]);
    assert_eq!(ol.name, "ol");
    assert_eq!(ol.attr("start"), Some(&AttrValue::String("3".to_string())));
}

// ══════════════════════════════════════════════════════════════════════════════
// Raw HTML
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn lowercase_html_is_raw() {
    let children = parse("<div class=\"x\">verbatim</div>\n");
    assert!(matches!(&children[0], Node::Raw(r) if r.value.contains("<div")));
}

#[test]
fn inline_lowercase_html_is_raw() {
    let children = parse("before <b>bold</b> after");
    let p = as_element(&children[0]);
    let raws: Vec<&str> = p
        .children
        .iter()
        .filter_map(|n| match n {
            Node::Raw(r) => Some(r.value.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(raws, vec!["<b>", "</b>"]);
}

#[test]
fn inline_component_pair_becomes_element() {
    let children = parse("wrapped in <Callout kind=\"warn\">some *text*</Callout> here");
    let p = as_element(&children[0]);
    let callout = p
        .children
        .iter()
        .find_map(|n| match n {
            Node::Element(el) if el.name == "Callout" => Some(el),
            _ => None,
        })
        .expect("component element should exist");
    assert_eq!(
        callout.attr("kind"),
        Some(&AttrValue::String("warn".to_string()))
    );
    assert_eq!(text_of(&callout.children), "some text");
}

#[test]
fn unclosed_inline_component_is_an_error() {
    let result = parse_str("an <Open> tag without a close\n");
    assert!(matches!(result, Err(ParseError::UnclosedTag { .. })));
}

// ══════════════════════════════════════════════════════════════════════════════
// Embedded script constructs
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn inline_expression_splits_text() {
    let children = parse("foo is: {foo}");
    let p = as_element(&children[0]);
    assert_eq!(p.children.len(), 2);
    assert!(matches!(&p.children[0], Node::Text(t) if t.value == "foo is: "));
    let Node::Expression(expr) = &p.children[1] else {
        panic!("expected an expression node");
    };
    assert!(matches!(&expr.expr.kind, ExprKind::Identifier(name) if name == "foo"));
}

#[test]
fn empty_and_comment_holes_produce_nothing() {
    let children = parse("a {} b {/* note */} c");
    let p = as_element(&children[0]);
    assert!(p.children.iter().all(|n| matches!(n, Node::Text(_))));
}

#[test]
fn unbalanced_brace_is_an_error() {
    let result = parse_str("oops {1 + 2");
    assert!(matches!(result, Err(ParseError::UnbalancedBraces { .. })));
}

#[test]
fn esm_block_extracts_import_and_export() {
    let children = parse("import { Foo } from './bar'\nexport const n = 1\n\ntext\n");
    assert!(matches!(&children[0], Node::Import(i) if i.decl.source == "./bar"));
    assert!(matches!(&children[1], Node::Export(e) if e.decl.decl.name.name == "n"));
    let p = as_element(&children[2]);
    assert_eq!(text_of(&p.children), "text");
}

#[test]
fn esm_block_keeps_document_order() {
    let children = parse("first\n\nexport const n = 1\n\nlast\n");
    assert_eq!(text_of(&as_element(&children[0]).children), "first");
    assert!(matches!(&children[1], Node::Export(_)));
    assert_eq!(text_of(&as_element(&children[2]).children), "last");
}

#[test]
fn block_component_tag_is_an_expression() {
    let children = parse("import { Foo } from './bar'\n\n<Foo label=\"x\"/>\n");
    let Node::Expression(expr) = &children[1] else {
        panic!("expected an expression node, got {:?}", children[1]);
    };
    let ExprKind::Jsx(el) = &expr.expr.kind else {
        panic!("expected a tag expression");
    };
    assert_eq!(el.name.as_ref().map(|n| n.name.as_str()), Some("Foo"));
}

#[test]
fn multiline_block_tag() {
    let children = parse("<Card title=\"hi\">\n  {1 + 1}\n</Card>\n");
    let Node::Expression(expr) = &children[0] else {
        panic!("expected an expression node");
    };
    assert!(matches!(&expr.expr.kind, ExprKind::Jsx(_)));
}

#[test]
fn expression_paragraph_with_tags_inside() {
    let children = parse("{true && <b>shown</b>}\n");
    let Node::Expression(expr) = &children[0] else {
        panic!("expected an expression node, got {:?}", children[0]);
    };
    assert!(matches!(&expr.expr.kind, ExprKind::Logical { .. }));
}

#[test]
fn import_inside_code_fence_is_markdown() {
    let children = parse("```\nimport { x } from './y'\n```");
    assert!(matches!(&children[0], Node::Element(el) if el.name == "pre"));
}

// ══════════════════════════════════════════════════════════════════════════════
// Snippet parsing
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn expression_shapes() {
    assert!(matches!(
        parse_expression("1 + 2 * 3").map(|e| e.kind),
        Ok(ExprKind::Binary { op: BinOp::Add, .. })
    ));
    assert!(matches!(
        parse_expression("a ? b : c").map(|e| e.kind),
        Ok(ExprKind::Conditional { .. })
    ));
    assert!(matches!(
        parse_expression("a.b[0]").map(|e| e.kind),
        Ok(ExprKind::Member { .. })
    ));
    assert!(matches!(
        parse_expression("f(1, 'two')").map(|e| e.kind),
        Ok(ExprKind::Call { .. })
    ));
    assert!(matches!(
        parse_expression("`a ${b} c`").map(|e| e.kind),
        Ok(ExprKind::TemplateLit(_))
    ));
}

#[test]
fn unsupported_constructs_parse_as_markers() {
    assert!(matches!(
        parse_expression("x = 1").map(|e| e.kind),
        Ok(ExprKind::Unsupported(_))
    ));
    assert!(matches!(
        parse_expression("x => x + 1").map(|e| e.kind),
        Ok(ExprKind::Unsupported(_))
    ));
    assert!(matches!(
        parse_expression("(a, b) => a").map(|e| e.kind),
        Ok(ExprKind::Unsupported(_))
    ));
}

#[test]
fn program_statement_kinds() {
    let stmts = parse_program(
        "import Foo, { a as b } from './m'\nconst x = 1;\nlet y = x + 1\nx + y",
    )
    .expect("program should parse");
    assert_eq!(stmts.len(), 4);
    assert!(matches!(&stmts[0], Stmt::Import(i) if i.specifiers.len() == 2));
    assert!(matches!(&stmts[1], Stmt::Var(v) if v.kind == DeclKind::Const));
    assert!(matches!(&stmts[2], Stmt::Var(v) if v.kind == DeclKind::Let));
    assert!(matches!(&stmts[3], Stmt::Expr(_)));
}

#[test]
fn export_statement_wraps_declaration() {
    let stmts = parse_program("export const foo = 'bar'").expect("program should parse");
    let [Stmt::Export(export)] = &stmts[..] else {
        panic!("expected a single export");
    };
    assert_eq!(export.decl.name.name, "foo");
    assert!(matches!(&export.decl.init.kind, ExprKind::StringLit(s) if s == "bar"));
}

#[test]
fn parse_errors() {
    assert!(matches!(
        parse_expression(""),
        Err(ParseError::UnexpectedEnd { .. })
    ));
    assert!(matches!(
        parse_expression("'open"),
        Err(ParseError::UnterminatedString { .. })
    ));
    assert!(matches!(
        parse_expression("1 +"),
        Err(ParseError::UnexpectedEnd { .. })
    ));
    assert!(matches!(
        parse_expression("<A>x</B>"),
        Err(ParseError::MismatchedTag { .. })
    ));
    assert!(matches!(
        parse_program("export default 1"),
        Err(ParseError::Expected { .. })
    ));
}

#[test]
fn malformed_bytes_are_rejected() {
    let result = parse_bytes("doc.md", &[0x66, 0xff, 0xfe]);
    assert!(matches!(result, Err(ParseError::MalformedInput)));
}

#[test]
fn spans_are_document_relative() {
    let children = parse("line one\n\n{value}\n");
    let Node::Expression(expr) = &children[1] else {
        panic!("expected an expression node");
    };
    assert_eq!(expr.span.start_line, 3);
    assert_eq!(expr.span.start_col, 1);
}
