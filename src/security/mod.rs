//! Filesystem containment checks.
//!
//! Snapshot paths and workspace scope names come from tool callers, so every
//! path is validated lexically before it touches the filesystem.

mod path;

pub use path::{is_safe_segment, resolve_within_root};
