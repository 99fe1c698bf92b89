//! Snapshot persistence.
//!
//! Snapshots are stored as pretty-printed JSON documents. See
//! [`JsonSnapshotStore::schema`] for the format.

mod snapshot_store;

pub use snapshot_store::{JsonSnapshotStore, MAX_SNAPSHOT_SIZE};
