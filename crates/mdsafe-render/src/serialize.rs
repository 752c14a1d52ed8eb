//! Output-tree serialization to JSON, as a host convenience.
//!
//! The in-memory [`OutputNode`] handoff is the real output contract; this
//! conversion exists for hosts that ship the tree across a process or
//! snapshot it in tests.

use mdsafe_types::ast::{Attr, AttrValue};
use mdsafe_types::{OutputNode, Value};

/// Serialize an output tree to JSON.
pub fn output_to_json(node: &OutputNode) -> serde_json::Value {
    match node {
        OutputNode::Fragment(children) => {
            serde_json::Value::Array(children.iter().map(output_to_json).collect())
        }
        OutputNode::Element(el) => {
            let mut map = serde_json::Map::new();
            map.insert(
                "name".to_string(),
                serde_json::Value::String(el.name.clone()),
            );

            let mut attrs = serde_json::Map::new();
            for Attr { name, value } in &el.attrs {
                attrs.insert(name.clone(), attr_to_json(value));
            }
            map.insert("attrs".to_string(), serde_json::Value::Object(attrs));

            if !el.children.is_empty() {
                map.insert(
                    "children".to_string(),
                    serde_json::Value::Array(el.children.iter().map(output_to_json).collect()),
                );
            }
            serde_json::Value::Object(map)
        }
        OutputNode::Text(text) => serde_json::Value::String(text.clone()),
        OutputNode::Value(value) => value_to_json(value),
    }
}

fn attr_to_json(value: &AttrValue) -> serde_json::Value {
    match value {
        AttrValue::Bool(b) => serde_json::Value::Bool(*b),
        AttrValue::String(s) => serde_json::Value::String(s.clone()),
        AttrValue::List(items) => serde_json::Value::Array(
            items
                .iter()
                .map(|s| serde_json::Value::String(s.clone()))
                .collect(),
        ),
    }
}

/// Convert an evaluated value to JSON.
fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => {
            // Whole numbers serialize as integers.
            if n.fract() == 0.0 && n.is_finite() && *n >= i64::MIN as f64 && *n <= i64::MAX as f64 {
                serde_json::Value::Number(serde_json::Number::from(*n as i64))
            } else {
                serde_json::json!(*n)
            }
        }
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::List(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
        Value::Object(fields) => {
            let mut map = serde_json::Map::new();
            for (k, v) in fields {
                map.insert(k.clone(), value_to_json(v));
            }
            serde_json::Value::Object(map)
        }
        Value::Function(_) => serde_json::Value::String("<function>".to_string()),
        Value::Component(_) => serde_json::Value::String("<component>".to_string()),
        Value::Node(node) => output_to_json(node),
    }
}
