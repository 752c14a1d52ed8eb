//! End-to-end tests for the render pipeline: parse → materialize.
//!
//! Covers the pipeline's contract surface:
//! - pure Markdown documents (no evaluator involvement)
//! - policy validation and element filtering (drop vs unwrap)
//! - raw-HTML defanging and skipping
//! - URL rewriting under the default policy
//! - export hoisting + expression evaluation + component substitution
//! - determinism and sanitizer idempotence

use mdsafe_eval::EvalError;
use mdsafe_render::{
    hoist_exports, materialize, output_to_json, sanitize, RenderError, RenderOptions,
};
use mdsafe_types::ast::*;
use mdsafe_types::{Bindings, ComponentRef, OutputElement, OutputNode, Span, Value};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn parse(source: &str) -> Node {
    mdsafe_parser::parse_str(source).expect("document should parse")
}

fn render(source: &str) -> OutputNode {
    render_with(source, &RenderOptions::default())
}

fn render_with(source: &str, options: &RenderOptions) -> OutputNode {
    let mut doc = parse(source);
    materialize(&mut doc, options).expect("materialize should succeed")
}

/// All text reachable in an output tree, value holes included.
fn text_content(node: &OutputNode) -> String {
    match node {
        OutputNode::Fragment(children) => children.iter().map(text_content).collect(),
        OutputNode::Element(el) => el.children.iter().map(text_content).collect(),
        OutputNode::Text(text) => text.clone(),
        OutputNode::Value(value) => value.to_display_string(),
    }
}

/// Top-level elements of a fragment.
fn elements(node: &OutputNode) -> Vec<&OutputElement> {
    let OutputNode::Fragment(children) = node else {
        panic!("expected a fragment root");
    };
    children
        .iter()
        .filter_map(|n| match n {
            OutputNode::Element(el) => Some(el),
            _ => None,
        })
        .collect()
}

/// A document AST with a `<script>` element, built directly — the core
/// consumes ASTs from any producer.
fn doc_with_script() -> Node {
    let span = Span::point(1, 1);
    let mut script = Element::new("script", span);
    script.children.push(Node::Text(Text {
        value: "alert(1)".into(),
        span,
    }));
    let mut p = Element::new("p", span);
    p.children.push(Node::Text(Text {
        value: "safe".into(),
        span,
    }));
    Node::Root(Root {
        children: vec![Node::Element(script), Node::Element(p)],
        span,
    })
}

// ══════════════════════════════════════════════════════════════════════════════
// Pure Markdown
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn heading_and_paragraph_document() {
    let output = render("# Hello, world!\n\nThis is a test.");
    let els = elements(&output);
    assert_eq!(els.len(), 2);
    assert_eq!(els[0].name, "h1");
    assert_eq!(els[0].children, vec![OutputNode::Text("Hello, world!".into())]);
    assert_eq!(els[1].name, "p");
    assert_eq!(els[1].children, vec![OutputNode::Text("This is a test.".into())]);
}

#[test]
fn expression_free_document_needs_no_bindings() {
    // Evaluator session is a no-op; output is decided by the
    // sanitizer/materializer alone.
    let output = render("plain *markdown* only");
    assert_eq!(text_content(&output), "plain markdown only");
}

#[test]
fn deterministic_output() {
    let source = "# T\n\nexport const n = 2\n\n{n * 3}";
    let a = render(source);
    let b = render(source);
    assert_eq!(a, b);
}

// ══════════════════════════════════════════════════════════════════════════════
// Policy validation & element filtering
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn conflicting_policy_is_invalid_for_any_input() {
    let options = RenderOptions {
        allowed_elements: Some(vec!["p".into()]),
        disallowed_elements: Some(vec!["script".into()]),
        ..RenderOptions::default()
    };

    // Even an empty document fails.
    let mut empty = parse("");
    assert!(matches!(
        materialize(&mut empty, &options),
        Err(RenderError::InvalidPolicy(_))
    ));

    let mut doc = parse("# hi");
    assert!(matches!(
        sanitize(&mut doc, &options),
        Err(RenderError::InvalidPolicy(_))
    ));
}

#[test]
fn disallowed_element_is_removed_with_subtree() {
    let options = RenderOptions {
        disallowed_elements: Some(vec!["script".into()]),
        ..RenderOptions::default()
    };
    let mut doc = doc_with_script();
    let output = materialize(&mut doc, &options).expect("materialize should succeed");
    let els = elements(&output);
    assert_eq!(els.len(), 1);
    assert_eq!(els[0].name, "p");
    assert_eq!(text_content(&output), "safe");
}

#[test]
fn disallowed_element_unwraps_children_when_configured() {
    let options = RenderOptions {
        disallowed_elements: Some(vec!["script".into()]),
        unwrap_disallowed: true,
        ..RenderOptions::default()
    };
    let mut doc = doc_with_script();
    let output = materialize(&mut doc, &options).expect("materialize should succeed");
    // The element is gone but its children were spliced into the parent.
    assert_eq!(text_content(&output), "alert(1)safe");
    assert!(elements(&output).iter().all(|el| el.name != "script"));
}

#[test]
fn allowed_elements_keep_only_listed_tags() {
    let options = RenderOptions {
        allowed_elements: Some(vec!["p".into()]),
        unwrap_disallowed: true,
        ..RenderOptions::default()
    };
    let output = render_with("# Title\n\nbody *em* text", &options);
    // h1 and em are unwrapped; p survives.
    let els = elements(&output);
    assert_eq!(els.len(), 1);
    assert_eq!(els[0].name, "p");
    assert_eq!(text_content(&output), "Titlebody em text");
}

#[test]
fn allow_element_predicate_overrides_keep() {
    let options = RenderOptions {
        allow_element: Some(Box::new(|el: &Element, _index: usize, _parent: Option<&str>| {
            el.name != "em"
        })),
        ..RenderOptions::default()
    };
    let output = render_with("keep *drop* keep", &options);
    assert_eq!(text_content(&output), "keep  keep");
}

#[test]
fn sanitize_is_idempotent() {
    let options = RenderOptions {
        disallowed_elements: Some(vec!["em".into()]),
        unwrap_disallowed: true,
        ..RenderOptions::default()
    };
    let mut doc = parse("a *b* c <span>d</span>\n\n[l](javascript:x)");
    sanitize(&mut doc, &options).expect("first pass");
    let once = doc.clone();
    sanitize(&mut doc, &options).expect("second pass");
    assert_eq!(doc, once);
}

// ══════════════════════════════════════════════════════════════════════════════
// Raw HTML
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn raw_html_is_defanged_to_text() {
    let output = render("before\n\n<div onclick=\"evil()\">x</div>\n");
    // The markup survives as text, not as an element.
    assert!(elements(&output).iter().all(|el| el.name != "div"));
    assert!(text_content(&output).contains("<div onclick=\"evil()\">x</div>"));
}

#[test]
fn skip_raw_html_drops_raw_nodes() {
    let options = RenderOptions {
        skip_raw_html: true,
        ..RenderOptions::default()
    };
    let output = render_with("before\n\n<div>x</div>\n\nafter", &options);
    assert_eq!(text_content(&output), "beforeafter");
}

// ══════════════════════════════════════════════════════════════════════════════
// URL policy
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn unsafe_link_scheme_is_emptied() {
    let output = render("[click](javascript:alert(1))");
    let p = &elements(&output)[0];
    let OutputNode::Element(a) = &p.children[0] else {
        panic!("expected the link element");
    };
    assert_eq!(a.name, "a");
    assert_eq!(a.attrs, vec![Attr::new("href", AttrValue::String(String::new()))]);
}

#[test]
fn safe_and_relative_links_pass_through() {
    let output = render("[a](https://x.com) [b](/relative/path)");
    let p = &elements(&output)[0];
    let hrefs: Vec<&str> = p
        .children
        .iter()
        .filter_map(|n| match n {
            OutputNode::Element(el) => el.attr("href").and_then(AttrValue::as_str),
            _ => None,
        })
        .collect();
    assert_eq!(hrefs, vec!["https://x.com", "/relative/path"]);
}

#[test]
fn custom_url_transform_applies() {
    let options = RenderOptions {
        url_transform: Some(Box::new(|url: &str, _attr: &str, _el: &Element| {
            format!("https://proxy.example/{url}")
        })),
        ..RenderOptions::default()
    };
    let output = render_with("![i](pic.png)", &options);
    let p = &elements(&output)[0];
    let OutputNode::Element(img) = &p.children[0] else {
        panic!("expected the image element");
    };
    assert_eq!(
        img.attr("src").and_then(AttrValue::as_str),
        Some("https://proxy.example/pic.png")
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Evaluation & components
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn export_binding_reaches_sibling_expression() {
    let output = render("export const foo = 'bar'\n\nfoo is: {foo}");
    let els = elements(&output);
    assert_eq!(els.len(), 1);
    assert_eq!(els[0].name, "p");
    assert_eq!(text_content(&output), "foo is: bar");
}

#[test]
fn imported_component_substitutes_for_tag() {
    let foo = ComponentRef::from_fn(|_attrs: &[Attr], children, node: &Element| {
        let mut el = OutputElement::new("section", node.span);
        el.children = children;
        el.children.push(OutputNode::Text("rendered by Foo".into()));
        OutputNode::Element(el)
    });
    let options = RenderOptions {
        bindings: Bindings::new().with_named("./bar", [("Foo", Value::Component(foo))]),
        ..RenderOptions::default()
    };
    let output = render_with("import { Foo } from './bar'\n\n<Foo/>\n", &options);
    let els = elements(&output);
    assert_eq!(els.len(), 1);
    assert_eq!(els[0].name, "section");
    assert_eq!(text_content(&output), "rendered by Foo");
}

#[test]
fn registered_component_overrides_markdown_element() {
    let heading = ComponentRef::from_fn(|_attrs: &[Attr], children, node: &Element| {
        assert_eq!(node.name, "h1");
        let mut el = OutputElement::new("header", node.span);
        el.children = children;
        OutputNode::Element(el)
    });
    let mut components = mdsafe_types::Components::new();
    components.insert("h1".to_string(), heading);
    let options = RenderOptions {
        components,
        ..RenderOptions::default()
    };
    let output = render_with("# Title", &options);
    assert_eq!(elements(&output)[0].name, "header");
}

#[test]
fn conditional_expression_renders_or_drops() {
    let shown = render("{true && <b>shown</b>}\n");
    let els = elements(&shown);
    assert_eq!(els.len(), 1);
    assert_eq!(els[0].name, "b");

    let hidden = render("{false && <b>never</b>}\n");
    assert_eq!(hidden, OutputNode::Fragment(Vec::new()));
}

#[test]
fn evaluation_error_aborts_the_call() {
    let mut doc = parse("before\n\n{missing}\n\nafter");
    let result = materialize(&mut doc, &RenderOptions::default());
    assert!(matches!(
        result,
        Err(RenderError::Eval(EvalError::UnboundIdentifier(_)))
    ));
}

#[test]
fn unsupported_expression_error_surfaces() {
    let mut doc = parse("{x = 1}\n");
    let result = materialize(&mut doc, &RenderOptions::default());
    assert!(matches!(
        result,
        Err(RenderError::Eval(EvalError::UnsupportedConstruct(_)))
    ));
}

#[test]
fn sibling_export_redefinition_is_last_write_wins() {
    let output = render("export const n = 1\nexport const n = 2\n\n{n}");
    assert_eq!(text_content(&output), "2");
}

#[test]
fn hoisting_alone_leaves_declarations_in_place() {
    let mut doc = parse("export const a = 1\n\ntext");
    hoist_exports(&mut doc);
    let Node::Root(root) = &doc else {
        panic!("expected root");
    };
    assert!(matches!(&root.children[0], Node::Declaration(_)));
}

// ══════════════════════════════════════════════════════════════════════════════
// JSON output
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn output_serializes_to_json() {
    let output = render("export const n = 21\n\n# Hi\n\n{n * 2}");
    let json = output_to_json(&output);
    assert_eq!(
        json,
        serde_json::json!([
            { "name": "h1", "attrs": {}, "children": ["Hi"] },
            42
        ])
    );
}
