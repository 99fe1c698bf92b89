//! Tool surface.
//!
//! Exposes the system as named tools taking JSON-object arguments, for a
//! stdio or network transport to host.
//!
//! ## Features
//!
//! - **Tools**: `runtime.info`, `cog.compose`, `cog.split`, `snapshot.save`,
//!   `iteration.build_chain` and the rest listed by [`ToolRegistry::list_tools`]
//! - **Scopes**: every call may carry `manager_service` and `workspace_id`;
//!   each pair gets its own [`WorkspaceRuntime`] rooted at
//!   `<data_root>/<manager_service>/<workspace_id>`
//!
//! ## Usage
//!
//! ```bash
//! cogmesh call cog.add --args '{"id": "a", "content": "invoice ledger"}'
//! cogmesh run calls.jsonl
//! ```

// Allow unnecessary wraps for handlers that return Result for a uniform signature.
#![allow(clippy::unnecessary_wraps)]
// Allow needless_pass_by_value: handlers take ownership of their arguments.
#![allow(clippy::needless_pass_by_value)]

mod dispatch;
mod runtime;
mod tool_types;
mod tools;

pub use dispatch::ToolDispatcher;
pub use runtime::{DEFAULT_WORKSPACE_ID, InteractionScope, RuntimeRegistry, WorkspaceRuntime};
pub use tools::{ToolContent, ToolDefinition, ToolRegistry, ToolResult};
