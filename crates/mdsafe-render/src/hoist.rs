//! Export hoisting: rewrite `export` declarations into plain declarations.
//!
//! The sandbox interpreter supports only local declarations, not module
//! export syntax, so export semantics are erased before interpretation
//! while keeping the declared bindings visible to later sibling and
//! descendant expressions. This is a normalization pass over the document,
//! not part of the interpreter.

use mdsafe_types::ast::{DeclarationNode, Node};

/// Replace every export node, at any depth, with the plain declaration it
/// wraps — in its parent's child list, at the same position.
///
/// Mutates the tree in place. A document without exports is a no-op.
pub fn hoist_exports(node: &mut Node) {
    if let Some(children) = node.children_mut() {
        for child in children.iter_mut() {
            if let Node::Export(export) = child {
                let decl = export.decl.decl.clone();
                let span = decl.span;
                *child = Node::Declaration(DeclarationNode { decl, span });
            }
            hoist_exports(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdsafe_types::ast::*;
    use mdsafe_types::Span;

    fn export_node(name: &str, value: f64) -> Node {
        let span = Span::point(1, 1);
        let decl = VarDecl {
            kind: DeclKind::Const,
            name: Ident::new(name, span),
            init: Expr::new(ExprKind::NumberLit(value), span),
            span,
        };
        Node::Export(ExportNode {
            decl: ExportDecl { decl, span },
            span,
        })
    }

    #[test]
    fn export_becomes_declaration_in_place() {
        let span = Span::point(1, 1);
        let mut root = Node::Root(Root {
            children: vec![
                export_node("a", 1.0),
                Node::Text(Text {
                    value: "x".into(),
                    span,
                }),
                export_node("b", 2.0),
            ],
            span,
        });

        hoist_exports(&mut root);

        let Node::Root(root) = root else {
            panic!("root changed kind")
        };
        assert!(matches!(&root.children[0], Node::Declaration(d) if d.decl.name.name == "a"));
        assert!(matches!(&root.children[1], Node::Text(_)));
        assert!(matches!(&root.children[2], Node::Declaration(d) if d.decl.name.name == "b"));
    }

    #[test]
    fn hoists_at_depth() {
        let span = Span::point(1, 1);
        let mut el = Element::new("section", span);
        el.children.push(export_node("deep", 3.0));
        let mut root = Node::Root(Root {
            children: vec![Node::Element(el)],
            span,
        });

        hoist_exports(&mut root);

        let Node::Root(root) = root else {
            panic!("root changed kind")
        };
        let Node::Element(el) = &root.children[0] else {
            panic!("element changed kind")
        };
        assert!(matches!(&el.children[0], Node::Declaration(_)));
    }

    #[test]
    fn no_exports_is_a_noop() {
        let span = Span::point(1, 1);
        let mut root = Node::Root(Root {
            children: vec![Node::Text(Text {
                value: "hello".into(),
                span,
            })],
            span,
        });
        let before = root.clone();
        hoist_exports(&mut root);
        assert_eq!(root, before);
    }
}
