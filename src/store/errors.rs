//! Store adapter errors
//!
//! Error codes:
//! - GQP_STORE_UNAVAILABLE (ERROR)
//! - GQP_STORE_UNKNOWN_TREE (ERROR)
//! - GQP_STORE_INVALID_ROW (ERROR)
//! - GQP_STORE_CORRUPTION (FATAL)

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Backend refused or failed the request
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("unknown tree '{0}'")]
    UnknownTree(String),

    /// Row or table definition does not fit the group layout
    #[error("invalid row: {0}")]
    InvalidRow(String),

    /// Stored key or value failed to decode
    #[error("corrupt entry in tree '{tree}': {reason}")]
    Corruption { tree: String, reason: String },
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Unavailable(_) => "GQP_STORE_UNAVAILABLE",
            StoreError::UnknownTree(_) => "GQP_STORE_UNKNOWN_TREE",
            StoreError::InvalidRow(_) => "GQP_STORE_INVALID_ROW",
            StoreError::Corruption { .. } => "GQP_STORE_CORRUPTION",
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Corruption { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
