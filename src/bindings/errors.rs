//! Bindings errors
//!
//! Every variant is a programming-contract violation: a composing operator
//! asked for a slot it never bound, or held on to a scope after releasing it.

use std::fmt;

use thiserror::Error;

use super::arena::BindingsId;

/// Which slot namespace a lookup addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Value,
    Row,
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotKind::Value => write!(f, "value"),
            SlotKind::Row => write!(f, "row"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingsError {
    #[error("{kind} slot {slot} is unbound in scope at depth {depth}")]
    UnboundSlot {
        kind: SlotKind,
        slot: usize,
        depth: usize,
    },

    #[error("bindings scope {0} has been released")]
    StaleScope(BindingsId),

    #[error("the root bindings scope cannot be released")]
    RootRelease,
}

pub type BindingsResult<T> = Result<T, BindingsError>;
