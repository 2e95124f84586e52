//! Execution errors
//!
//! Error codes:
//! - GQP_UNBOUND_SLOT, GQP_STALE_BINDINGS, GQP_BINDINGS_CONTRACT (ERROR, contract)
//! - GQP_CURSOR_STATE (ERROR, contract)
//! - GQP_NOT_RESETTABLE (ERROR, contract)
//! - GQP_QUERY_CANCELED (ERROR, canceled)
//! - GQP_SPILL_IO (FATAL, resource)
//! - GQP_SPILL_CORRUPT (FATAL, internal)
//! - GQP_STORE_* (see `StoreError`)
//! - GQP_EVALUATION (ERROR, contract)
//! - GQP_PLAN_INVALID (ERROR, contract)
//! - GQP_INTERNAL (FATAL, internal)
//!
//! Nothing in the runtime retries. Fatal errors destroy the cursor that
//! raised them.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::bindings::BindingsError;
use crate::store::StoreError;

use super::cursor::CursorState;

/// Severity levels for execution errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The statement fails, the engine is healthy
    Error,
    /// Resources or internal state can no longer be trusted
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A caller broke the cursor or bindings protocol
    Contract,
    /// The statement was canceled
    Canceled,
    /// An external resource (disk, store) failed
    Resource,
    /// Data the runtime produced or stored itself is inconsistent
    Internal,
}

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error(transparent)]
    Bindings(#[from] BindingsError),

    #[error("cannot {operation} {cursor} cursor in state {state}")]
    CursorState {
        cursor: &'static str,
        operation: &'static str,
        state: CursorState,
    },

    #[error("position is outside the cached window and cannot be revisited")]
    NotResettable,

    #[error("query canceled")]
    QueryCanceled,

    #[error("sort spill I/O failed: {0}")]
    SpillIo(#[from] io::Error),

    #[error("corrupt spill record at offset {offset}: {reason}")]
    SpillCorrupt { offset: u64, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("expression evaluation failed: {0}")]
    Evaluation(String),

    #[error("invalid plan: {0}")]
    PlanInvalid(String),

    #[error("internal consistency failure: {0}")]
    Internal(String),
}

impl ExecutorError {
    pub fn code(&self) -> &'static str {
        match self {
            ExecutorError::Bindings(BindingsError::UnboundSlot { .. }) => "GQP_UNBOUND_SLOT",
            ExecutorError::Bindings(BindingsError::StaleScope(_)) => "GQP_STALE_BINDINGS",
            ExecutorError::Bindings(_) => "GQP_BINDINGS_CONTRACT",
            ExecutorError::CursorState { .. } => "GQP_CURSOR_STATE",
            ExecutorError::NotResettable => "GQP_NOT_RESETTABLE",
            ExecutorError::QueryCanceled => "GQP_QUERY_CANCELED",
            ExecutorError::SpillIo(_) => "GQP_SPILL_IO",
            ExecutorError::SpillCorrupt { .. } => "GQP_SPILL_CORRUPT",
            ExecutorError::Store(e) => e.code(),
            ExecutorError::Evaluation(_) => "GQP_EVALUATION",
            ExecutorError::PlanInvalid(_) => "GQP_PLAN_INVALID",
            ExecutorError::Internal(_) => "GQP_INTERNAL",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ExecutorError::Bindings(_)
            | ExecutorError::CursorState { .. }
            | ExecutorError::NotResettable
            | ExecutorError::Evaluation(_)
            | ExecutorError::PlanInvalid(_) => ErrorKind::Contract,
            ExecutorError::QueryCanceled => ErrorKind::Canceled,
            ExecutorError::SpillIo(_) => ErrorKind::Resource,
            ExecutorError::Store(e) if e.is_fatal() => ErrorKind::Internal,
            ExecutorError::Store(_) => ErrorKind::Resource,
            ExecutorError::SpillCorrupt { .. } | ExecutorError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            ExecutorError::SpillIo(_)
            | ExecutorError::SpillCorrupt { .. }
            | ExecutorError::Internal(_) => Severity::Fatal,
            ExecutorError::Store(e) if e.is_fatal() => Severity::Fatal,
            _ => Severity::Error,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    pub(crate) fn spill_corrupt(offset: u64, reason: impl Into<String>) -> Self {
        ExecutorError::SpillCorrupt {
            offset,
            reason: reason.into(),
        }
    }
}

/// Result type for cursor and sorter operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;
