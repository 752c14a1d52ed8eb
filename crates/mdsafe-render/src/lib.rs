//! mdsafe render pipeline.
//!
//! Takes a parsed document AST through export hoisting, one sandboxed
//! evaluation session, sanitization, and materialization into an output
//! tree:
//!
//! ```text
//! raw AST → hoist exports → evaluate program → sanitize → materialize → OutputNode
//! ```
//!
//! Every stage works in place on the caller's AST; [`materialize`] is the
//! orchestrator and the main entry point of the workspace.

mod error;
mod hoist;
mod materialize;
mod options;
mod sanitize;
mod serialize;

pub use error::{RenderError, RenderResult};
pub use hoist::hoist_exports;
pub use materialize::materialize;
pub use options::{default_url_transform, AllowElement, RenderOptions, UrlTransform};
pub use sanitize::sanitize;
pub use serialize::output_to_json;
