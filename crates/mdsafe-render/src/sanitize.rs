//! Tree sanitization: raw-HTML policy, URL rewriting, and element
//! filtering.
//!
//! One pre-order traversal (parent before children) using index-based
//! iteration over each child list, so in-place removals, replacements and
//! splices stay safe mid-walk: a deleted node is not revisited, and
//! whatever lands at the current index — a replacement text node, spliced
//! children — is visited next.

use crate::error::RenderResult;
use crate::options::{url_attribute_tags, RenderOptions};
use mdsafe_types::ast::{AttrValue, Element, Node, Text};

/// Sanitize a document in place under the given policy.
///
/// Fails with `InvalidPolicy` before touching the tree if the policy is
/// conflicting.
pub fn sanitize(node: &mut Node, options: &RenderOptions) -> RenderResult<()> {
    options.validate()?;
    sanitize_tree(node, options);
    Ok(())
}

/// The traversal itself, without the policy check. The materializer
/// validates once up front and calls this directly.
pub(crate) fn sanitize_tree(node: &mut Node, options: &RenderOptions) {
    match node {
        Node::Root(root) => sanitize_children(&mut root.children, None, options),
        Node::Element(el) => {
            // A bare element has no parent to remove it from; rewrite its
            // URLs and descend.
            rewrite_urls(el, options);
            let name = el.name.clone();
            sanitize_children(&mut el.children, Some(&name), options);
        }
        _ => {}
    }
}

/// What to do with the node at the current index.
enum Step {
    Keep,
    Remove,
    Unwrap,
    DefangRaw,
}

fn sanitize_children(children: &mut Vec<Node>, parent: Option<&str>, options: &RenderOptions) {
    let mut i = 0;
    while i < children.len() {
        let step = match &mut children[i] {
            Node::Raw(_) => {
                if options.skip_raw_html {
                    Step::Remove
                } else {
                    Step::DefangRaw
                }
            }
            Node::Element(el) => {
                rewrite_urls(el, options);
                if options.element_removed(el, i, parent) {
                    if options.unwrap_disallowed {
                        Step::Unwrap
                    } else {
                        Step::Remove
                    }
                } else {
                    let name = el.name.clone();
                    sanitize_children(&mut el.children, Some(&name), options);
                    Step::Keep
                }
            }
            _ => Step::Keep,
        };

        match step {
            Step::Keep => i += 1,
            Step::Remove => {
                children.remove(i);
                // The next node is now at `i`; do not advance.
            }
            Step::Unwrap => {
                let spliced: Vec<Node> = match &mut children[i] {
                    Node::Element(el) => el.children.drain(..).collect(),
                    _ => Vec::new(),
                };
                children.splice(i..=i, spliced);
                // The first spliced child (if any) is at `i` and gets
                // visited next.
            }
            Step::DefangRaw => {
                if let Node::Raw(raw) = &children[i] {
                    let replacement = Node::Text(Text {
                        value: raw.value.clone(),
                        span: raw.span,
                    });
                    children[i] = replacement;
                }
                // The replacement text node is revisited at `i`.
            }
        }
    }
}

/// Rewrite every URL-bearing attribute on an element through the policy's
/// URL transform.
fn rewrite_urls(el: &mut Element, options: &RenderOptions) {
    for idx in 0..el.attrs.len() {
        let attr_name = el.attrs[idx].name.clone();
        let Some(tags) = url_attribute_tags(&attr_name) else {
            continue;
        };
        if let Some(tags) = tags {
            if !tags.contains(&el.name.as_str()) {
                continue;
            }
        }
        let current = match &el.attrs[idx].value {
            AttrValue::String(s) => s.clone(),
            AttrValue::List(items) => items.join(" "),
            AttrValue::Bool(_) => String::new(),
        };
        let rewritten = options.transform_url(&current, &attr_name, el);
        el.attrs[idx].value = AttrValue::String(rewritten);
    }
}
