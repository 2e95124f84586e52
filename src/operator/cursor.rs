//! The cursor protocol
//!
//! ```text
//!            open              close
//!   CLOSED ───────▶ ACTIVE ───────────▶ CLOSED
//!     ▲               │ idle
//!     │     open      ▼
//!     └─────────────  IDLE
//!
//!   any state ── destroy / fatal error ──▶ DESTROYED (terminal)
//! ```
//!
//! `next()` is legal only while ACTIVE. End of stream (`Ok(None)`) leaves the
//! cursor ACTIVE; the owner still closes it. `close()` is legal in every
//! state and always reaches the children.

use std::fmt;

use crate::bindings::{BindingsArena, BindingsId};
use crate::types::Row;

use super::errors::ExecutorResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Closed,
    /// Between bindings activations; resources released, reopenable
    Idle,
    Active,
    Destroyed,
}

impl CursorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CursorState::Closed => "CLOSED",
            CursorState::Idle => "IDLE",
            CursorState::Active => "ACTIVE",
            CursorState::Destroyed => "DESTROYED",
        }
    }

    /// Whether `open()` is legal
    pub fn can_open(&self) -> bool {
        matches!(self, CursorState::Closed | CursorState::Idle)
    }
}

impl fmt::Display for CursorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pull-based row iterator
pub trait Cursor {
    /// Start one activation against the bindings scope `scope`
    fn open(&mut self, bindings: &mut BindingsArena, scope: BindingsId) -> ExecutorResult<()>;

    /// Next row, or `None` at end of stream
    fn next(&mut self, bindings: &mut BindingsArena) -> ExecutorResult<Option<Row>>;

    /// Release the activation. Idempotent.
    fn close(&mut self);

    /// Tear down for good. Later `open()` calls fail.
    fn destroy(&mut self);

    fn state(&self) -> CursorState;
}

/// Pull every remaining row. Does not close the cursor.
pub fn drain<C: Cursor + ?Sized>(
    cursor: &mut C,
    bindings: &mut BindingsArena,
) -> ExecutorResult<Vec<Row>> {
    let mut rows = Vec::new();
    while let Some(row) = cursor.next(bindings)? {
        rows.push(row);
    }
    Ok(rows)
}

/// Open cursor that is closed when the guard goes out of scope, including
/// on early return through `?`
pub struct CursorGuard<'a, C: Cursor + ?Sized> {
    cursor: &'a mut C,
}

impl<'a, C: Cursor + ?Sized> CursorGuard<'a, C> {
    pub fn open(
        cursor: &'a mut C,
        bindings: &mut BindingsArena,
        scope: BindingsId,
    ) -> ExecutorResult<Self> {
        cursor.open(bindings, scope)?;
        Ok(Self { cursor })
    }

    pub fn next(&mut self, bindings: &mut BindingsArena) -> ExecutorResult<Option<Row>> {
        self.cursor.next(bindings)
    }

    pub fn drain(&mut self, bindings: &mut BindingsArena) -> ExecutorResult<Vec<Row>> {
        drain(self.cursor, bindings)
    }

    pub fn cursor(&mut self) -> &mut C {
        self.cursor
    }
}

impl<C: Cursor + ?Sized> Drop for CursorGuard<'_, C> {
    fn drop(&mut self) {
        self.cursor.close();
    }
}

/// Run `cursor` to completion under the root scope and close it
pub fn collect<C: Cursor + ?Sized>(
    cursor: &mut C,
    bindings: &mut BindingsArena,
) -> ExecutorResult<Vec<Row>> {
    let root = bindings.root();
    let mut guard = CursorGuard::open(cursor, bindings, root)?;
    guard.drain(bindings)
}
