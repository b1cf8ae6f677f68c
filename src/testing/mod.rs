//! Headless testing support: an in-memory target tree and snapshot helpers.
//!
//! Render into a [`MemoryTarget`], drive it with
//! [`MemoryTarget::dispatch`]/[`MemoryTarget::input`], and print it with
//! [`tree_to_string`] for snapshot-style assertions.

pub mod memory;
pub mod snapshot;

pub use memory::{MemNodeId, MemoryTarget};
pub use snapshot::tree_to_string;
