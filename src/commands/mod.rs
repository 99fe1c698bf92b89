//! Command handlers module.
//!
//! - `tools.rs`: tool listing and invocation (tools, presets, call, run)
//! - `demo.rs`: the sample walkthrough

mod demo;
mod tools;

pub use demo::cmd_demo;
pub use tools::{cmd_call, cmd_presets, cmd_run, cmd_tools};
