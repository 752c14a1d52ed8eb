//! The output tree handed to the host renderer, and the component
//! capability trait.

use crate::ast::{Attr, Element};
use crate::{Span, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A renderable registered by the host.
///
/// Anything that accepts attributes plus already-materialized children and
/// returns an output node is a component. The materializer looks
/// components up in an explicit registry by tag name; there is no
/// reflection involved. `node` is a back-reference to the source AST
/// element so a component can inspect source position and metadata.
pub trait Component: Send + Sync {
    fn render(&self, attrs: &[Attr], children: Vec<OutputNode>, node: &Element) -> OutputNode;
}

/// A shared handle to a [`Component`].
#[derive(Clone)]
pub struct ComponentRef(Arc<dyn Component>);

impl ComponentRef {
    pub fn new(component: impl Component + 'static) -> Self {
        Self(Arc::new(component))
    }

    /// Wrap a plain closure as a component.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&[Attr], Vec<OutputNode>, &Element) -> OutputNode + Send + Sync + 'static,
    {
        struct FnComponent<F>(F);
        impl<F> Component for FnComponent<F>
        where
            F: Fn(&[Attr], Vec<OutputNode>, &Element) -> OutputNode + Send + Sync,
        {
            fn render(
                &self,
                attrs: &[Attr],
                children: Vec<OutputNode>,
                node: &Element,
            ) -> OutputNode {
                (self.0)(attrs, children, node)
            }
        }
        Self::new(FnComponent(f))
    }

    /// Invoke the component.
    pub fn render(&self, attrs: &[Attr], children: Vec<OutputNode>, node: &Element) -> OutputNode {
        self.0.render(attrs, children, node)
    }
}

impl fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<component>")
    }
}

impl PartialEq for ComponentRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// The component registry: tag name → component.
pub type Components = BTreeMap<String, ComponentRef>;

/// A node in the materialized output tree.
///
/// Created during materialization and owned by the caller thereafter; the
/// core defines no serialization format of its own (but see the render
/// crate's JSON conversion for a host convenience).
#[derive(Debug, Clone, PartialEq)]
pub enum OutputNode {
    /// An ordered sequence with no element of its own (the root, or a
    /// fragment tag).
    Fragment(Vec<OutputNode>),
    Element(OutputElement),
    Text(String),
    /// An evaluated expression spliced into the tree. Not re-parsed as
    /// markup.
    Value(Value),
}

impl OutputNode {
    pub fn text(value: impl Into<String>) -> Self {
        OutputNode::Text(value.into())
    }
}

/// An element in the output tree.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputElement {
    pub name: String,
    pub attrs: Vec<Attr>,
    pub children: Vec<OutputNode>,
    /// Source location of the originating AST node.
    pub span: Span,
}

impl OutputElement {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
            span,
        }
    }

    /// Look up an attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&crate::ast::AttrValue> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.value)
    }
}
