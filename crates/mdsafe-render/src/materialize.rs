//! Render-tree materialization — the pipeline orchestrator.

use crate::error::RenderResult;
use crate::hoist::hoist_exports;
use crate::options::RenderOptions;
use crate::sanitize::sanitize_tree;
use mdsafe_eval::Interpreter;
use mdsafe_types::ast::{Node, Stmt};
use mdsafe_types::{OutputElement, OutputNode, Value};

/// Materialize a document into an output tree.
///
/// Stages, in order: policy validation, export hoisting, one evaluation
/// session over the hoisted program, sanitization, and a single conversion
/// pass. The AST is mutated in place by the hoister and sanitizer; the
/// evaluator session lives exactly as long as this call, so repeated calls
/// with the same inputs are deterministic and independent calls share no
/// state.
///
/// The first evaluator error aborts the walk; there is no partial output.
pub fn materialize(node: &mut Node, options: &RenderOptions) -> RenderResult<OutputNode> {
    options.validate()?;

    hoist_exports(node);
    let program = collect_program(node);

    let mut interpreter = Interpreter::new(&options.bindings, &options.components);
    interpreter.evaluate_program(&program)?;

    sanitize_tree(node, options);

    let output = convert(node, options, &mut interpreter)?;
    Ok(output.unwrap_or_else(|| OutputNode::Fragment(Vec::new())))
}

/// Collect the document's program: import and declaration statements in
/// document order, at every depth.
fn collect_program(node: &Node) -> Vec<Stmt> {
    let mut stmts = Vec::new();
    collect_into(node, &mut stmts);
    stmts
}

fn collect_into(node: &Node, out: &mut Vec<Stmt>) {
    match node {
        Node::Import(import) => out.push(Stmt::Import(import.decl.clone())),
        Node::Declaration(decl) => out.push(Stmt::Var(decl.decl.clone())),
        // An export here means the hoister did not run; hand it to the
        // interpreter, which rejects it.
        Node::Export(export) => out.push(Stmt::Export(export.decl.clone())),
        _ => {
            if let Some(children) = node.children() {
                for child in children {
                    collect_into(child, out);
                }
            }
        }
    }
}

/// Convert one sanitized node to output. Script nodes produce nothing.
fn convert(
    node: &Node,
    options: &RenderOptions,
    interpreter: &mut Interpreter<'_>,
) -> RenderResult<Option<OutputNode>> {
    match node {
        Node::Root(root) => {
            let children = convert_children(&root.children, options, interpreter)?;
            Ok(Some(OutputNode::Fragment(children)))
        }

        Node::Element(el) => {
            let children = convert_children(&el.children, options, interpreter)?;

            // Registered components substitute for the raw tag; the
            // session scope is consulted next so imported components work
            // as tags too. The component gets the source node back-
            // reference.
            if let Some(component) = options.components.get(&el.name) {
                return Ok(Some(component.render(&el.attrs, children, el)));
            }
            let scoped = interpreter.lookup(&el.name).cloned();
            if let Some(Value::Component(component)) = scoped {
                return Ok(Some(component.render(&el.attrs, children, el)));
            }

            let mut out = OutputElement::new(&el.name, el.span);
            out.attrs = el.attrs.clone();
            out.children = children;
            Ok(Some(OutputNode::Element(out)))
        }

        Node::Text(text) => Ok(Some(OutputNode::Text(text.value.clone()))),

        // The sanitizer has already defanged or removed raw nodes; a raw
        // node reaching this pass is carried as text, never as markup.
        Node::Raw(raw) => Ok(Some(OutputNode::Text(raw.value.clone()))),

        Node::Expression(expr_node) => {
            let value = interpreter.evaluate_expression(&expr_node.expr)?;
            Ok(match value {
                // Tag expressions splice their tree in directly; null and
                // booleans render nothing.
                Value::Node(node) => Some(*node),
                Value::Null | Value::Bool(_) => None,
                other => Some(OutputNode::Value(other)),
            })
        }

        Node::Import(_) | Node::Export(_) | Node::Declaration(_) => Ok(None),
    }
}

fn convert_children(
    children: &[Node],
    options: &RenderOptions,
    interpreter: &mut Interpreter<'_>,
) -> RenderResult<Vec<OutputNode>> {
    let mut out = Vec::with_capacity(children.len());
    for child in children {
        if let Some(node) = convert(child, options, interpreter)? {
            out.push(node);
        }
    }
    Ok(out)
}
