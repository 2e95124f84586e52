//! groupqp - query execution runtime for group-clustered storage
//!
//! Rows of a table group are stored interleaved under hierarchical keys so a
//! parent is immediately followed by its descendants. This crate executes
//! physical plans over that layout: hierarchical scans, hkey-ordered
//! flattening, nested-loop maps with scoped bindings, and sorts that spill
//! to disk when their input outgrows memory.

pub mod bindings;
pub mod caching;
pub mod cli;
pub mod context;
pub mod hkey;
pub mod observability;
pub mod operator;
pub mod sort;
pub mod store;
pub mod types;
