//! Per-operator cursor behavior
//!
//! A `Node` is what differs between operators. The lifecycle rules common to
//! all of them live once, in `OperatorCursor`, which only calls a node's
//! `next` while it is active and always calls `close` or `destroy` on it.

use crate::bindings::{BindingsArena, BindingsId};
use crate::types::Row;

use super::errors::ExecutorResult;

pub(crate) trait Node {
    /// Set up for one activation. Children are opened here unless deferred.
    fn open(&mut self, bindings: &mut BindingsArena, scope: BindingsId) -> ExecutorResult<()>;

    fn next(&mut self, bindings: &mut BindingsArena) -> ExecutorResult<Option<Row>>;

    /// Release per-activation state and close every child. Idempotent.
    fn close(&mut self);

    /// Release everything and destroy every child
    fn destroy(&mut self) {
        self.close();
    }
}
