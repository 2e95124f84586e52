//! Ordered key-value storage seen by the runtime
//!
//! - `StoreAdapter`: range reads and point operations over named trees
//! - `GroupSchema`: the tables interleaved in one tree and their hkeys
//! - `MemoryStore`: the in-process implementation
//!
//! Keys in a group tree are packed hkeys; values are the row's column
//! values written with the injected `ValueSerializer`.

mod adapter;
mod errors;
mod group;
mod memory;

pub use adapter::{KeyRange, StoreAdapter};
pub use errors::{StoreError, StoreResult};
pub use group::{GroupSchema, TableDef};
pub use memory::MemoryStore;
