//! Query bindings
//!
//! Positional parameter values and outer-row references for correlated
//! evaluation. A correlated inner plan is re-opened once per outer row under
//! a fresh child scope holding that row, so the outer cursor never needs to
//! know the shape of the inner plan.
//!
//! # Invariants
//!
//! - A lookup checks only the receiving scope; there is no fallback to the parent
//! - `is_ancestor` is reflexive and transitive
//! - `create_bindings(b)` has depth `depth(b) + 1`
//! - Only the receiving scope is mutated by any setter

mod arena;
mod errors;

pub use arena::{BindingsArena, BindingsId, QueryBindings};
pub use errors::{BindingsError, BindingsResult, SlotKind};
