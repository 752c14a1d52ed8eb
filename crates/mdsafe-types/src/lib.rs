//! Shared types for the mdsafe pipeline.
//!
//! This crate defines the document AST, the embedded-script AST, runtime
//! values, the binding environment, and the output tree handed to the host
//! renderer. All pipeline stages depend on it and nothing else in the
//! workspace.

mod output;
mod span;
mod value;
pub mod ast;

pub use output::{Component, ComponentRef, Components, OutputElement, OutputNode};
pub use span::{SourceFile, Span};
pub use value::{Bindings, Module, NativeFn, Value};
