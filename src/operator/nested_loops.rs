//! Correlated nested loop
//!
//! For each outer row: a fresh child scope of the loop's own scope is
//! created, the outer row is bound into it at `binding_position`, and the
//! inner cursor is opened against that scope and drained. Between outer rows
//! the inner cursor idles and the previous child scope is released.

use std::sync::Arc;

use crate::bindings::{BindingsArena, BindingsId};
use crate::context::QueryContext;
use crate::types::Row;

use super::cursor::Cursor;
use super::errors::{ExecutorError, ExecutorResult};
use super::node::Node;
use super::operator_cursor::OperatorCursor;

pub(crate) struct NestedLoopsCursor {
    ctx: Arc<QueryContext>,
    outer: Box<OperatorCursor>,
    inner: Box<OperatorCursor>,
    binding_position: usize,
    scope: Option<BindingsId>,
    /// Scope the inner cursor is currently open under
    inner_scope: Option<BindingsId>,
    /// Scope left behind by a close, released on the next call that has the arena
    abandoned: Option<BindingsId>,
}

impl NestedLoopsCursor {
    pub(crate) fn new(
        ctx: &Arc<QueryContext>,
        outer: OperatorCursor,
        inner: OperatorCursor,
        binding_position: usize,
    ) -> Self {
        Self {
            ctx: Arc::clone(ctx),
            outer: Box::new(outer),
            inner: Box::new(inner),
            binding_position,
            scope: None,
            inner_scope: None,
            abandoned: None,
        }
    }

    fn release_abandoned(&mut self, bindings: &mut BindingsArena) {
        if let Some(id) = self.abandoned.take() {
            // Already gone if an enclosing scope was released first
            let _ = bindings.release(id);
        }
    }

    fn finish_inner(&mut self, bindings: &mut BindingsArena) -> ExecutorResult<()> {
        self.inner.idle();
        if let Some(id) = self.inner_scope.take() {
            bindings.release(id)?;
        }
        Ok(())
    }
}

impl Node for NestedLoopsCursor {
    fn open(&mut self, bindings: &mut BindingsArena, scope: BindingsId) -> ExecutorResult<()> {
        self.release_abandoned(bindings);
        self.outer.open(bindings, scope)?;
        self.scope = Some(scope);
        Ok(())
    }

    fn next(&mut self, bindings: &mut BindingsArena) -> ExecutorResult<Option<Row>> {
        let scope = self
            .scope
            .ok_or_else(|| ExecutorError::Internal("nested loop has no scope".into()))?;
        loop {
            if self.inner_scope.is_some() {
                if let Some(row) = self.inner.next(bindings)? {
                    return Ok(Some(row));
                }
                self.finish_inner(bindings)?;
            }

            self.ctx.check_canceled()?;
            let Some(outer_row) = self.outer.next(bindings)? else {
                return Ok(None);
            };
            let child = bindings.create_bindings(scope)?;
            bindings.set_row(child, self.binding_position, outer_row)?;
            self.inner_scope = Some(child);
            self.inner.open(bindings, child)?;
        }
    }

    fn close(&mut self) {
        self.inner.close();
        self.outer.close();
        if let Some(id) = self.inner_scope.take() {
            self.abandoned = Some(id);
        }
        self.scope = None;
    }

    fn destroy(&mut self) {
        self.inner.destroy();
        self.outer.destroy();
        self.inner_scope = None;
        self.scope = None;
    }
}
