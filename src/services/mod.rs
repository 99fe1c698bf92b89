//! Business logic services.
//!
//! [`CogSystem`] owns all state and runs the cascade; graph mutations and
//! cog composition extend it from their own modules. [`IterationEngine`]
//! borrows a system to reorder graphs and build traversal chains.

mod composition;
mod graph_ops;
mod iteration;
mod sample;
mod system;

pub use composition::{
    ComposeOutcome, ComposeRequest, GraphPlacement, SplitMode, SplitOutcome, SplitRequest,
};
pub use iteration::{ChainResult, IterationEngine, MAX_AUTO_ITERATIONS};
pub use sample::{SAMPLE_GRAPH_ID, SAMPLE_SCORE_SET_ID, SAMPLE_STRATEGY_ID, sample_policy, sample_system};
pub use system::{CogSystem, WRITABLE_COG_FIELDS};
