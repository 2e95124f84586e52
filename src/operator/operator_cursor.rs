//! The cursor manufactured by every `Operator`

use std::sync::Arc;

use crate::bindings::{BindingsArena, BindingsId};
use crate::context::QueryContext;
use crate::observability::{log_event, Event, Logger, Severity};
use crate::types::Row;

use super::ancestor_lookup::AncestorLookupCursor;
use super::cursor::{Cursor, CursorState};
use super::errors::{ExecutorError, ExecutorResult};
use super::filter::{FilterCursor, LimitCursor, ProjectCursor, SelectCursor};
use super::flatten::FlattenCursor;
use super::group_scan::GroupScanCursor;
use super::hkey_merge::HKeyMergeCursor;
use super::nested_loops::NestedLoopsCursor;
use super::node::Node;
use super::sort::SortCursor;
use super::values_scan::ValuesScanCursor;

pub(crate) enum CursorKind {
    ValuesScan(ValuesScanCursor),
    GroupScan(GroupScanCursor),
    Filter(FilterCursor),
    Select(SelectCursor),
    Project(ProjectCursor),
    Limit(LimitCursor),
    MapNestedLoops(NestedLoopsCursor),
    Flatten(FlattenCursor),
    HKeyMerge(HKeyMergeCursor),
    AncestorLookup(AncestorLookupCursor),
    Sort(SortCursor),
}

/// Lifecycle-checked cursor over one operator node
pub struct OperatorCursor {
    name: &'static str,
    ctx: Arc<QueryContext>,
    state: CursorState,
    kind: CursorKind,
}

impl OperatorCursor {
    pub(crate) fn new(name: &'static str, ctx: &Arc<QueryContext>, kind: CursorKind) -> Self {
        Self {
            name,
            ctx: Arc::clone(ctx),
            state: CursorState::Closed,
            kind,
        }
    }

    /// Operator name, as shown in plan descriptions
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Release the current activation but stay ready for the next one.
    ///
    /// Used for the inner side of a nested loop between outer rows.
    pub fn idle(&mut self) {
        if self.state == CursorState::Destroyed {
            return;
        }
        self.node().close();
        self.state = CursorState::Idle;
    }

    fn node(&mut self) -> &mut dyn Node {
        match &mut self.kind {
            CursorKind::ValuesScan(c) => c,
            CursorKind::GroupScan(c) => c,
            CursorKind::Filter(c) => c,
            CursorKind::Select(c) => c,
            CursorKind::Project(c) => c,
            CursorKind::Limit(c) => c,
            CursorKind::MapNestedLoops(c) => c,
            CursorKind::Flatten(c) => c,
            CursorKind::HKeyMerge(c) => c,
            CursorKind::AncestorLookup(c) => c,
            CursorKind::Sort(c) => c,
        }
    }

    fn state_error(&self, operation: &'static str) -> ExecutorError {
        ExecutorError::CursorState {
            cursor: self.name,
            operation,
            state: self.state,
        }
    }

    /// Fatal errors leave the node in an unknown state; nothing may reuse it
    fn fail(&mut self, error: ExecutorError) -> ExecutorError {
        if error.is_fatal() {
            let code = error.code();
            let reason = error.to_string();
            log_event(
                Event::CursorDestroyed,
                &[("cursor", self.name), ("code", code), ("reason", &reason)],
            );
            self.destroy();
        }
        error
    }
}

impl Cursor for OperatorCursor {
    fn open(&mut self, bindings: &mut BindingsArena, scope: BindingsId) -> ExecutorResult<()> {
        if !self.state.can_open() {
            return Err(self.state_error("open"));
        }
        self.ctx.metrics().increment_cursors_opened();
        if Logger::enabled(Severity::Trace) {
            let scope_field = scope.to_string();
            log_event(
                Event::CursorOpen,
                &[("cursor", self.name), ("scope", &scope_field)],
            );
        }
        match self.node().open(bindings, scope) {
            Ok(()) => {
                self.state = CursorState::Active;
                Ok(())
            }
            Err(e) => {
                self.node().close();
                self.state = CursorState::Closed;
                Err(self.fail(e))
            }
        }
    }

    fn next(&mut self, bindings: &mut BindingsArena) -> ExecutorResult<Option<Row>> {
        if self.state != CursorState::Active {
            return Err(self.state_error("next"));
        }
        match self.node().next(bindings) {
            Ok(row) => Ok(row),
            Err(e) => Err(self.fail(e)),
        }
    }

    fn close(&mut self) {
        if self.state == CursorState::Active && Logger::enabled(Severity::Trace) {
            log_event(Event::CursorClose, &[("cursor", self.name)]);
        }
        self.node().close();
        if self.state != CursorState::Destroyed {
            self.state = CursorState::Closed;
        }
    }

    fn destroy(&mut self) {
        self.node().destroy();
        self.state = CursorState::Destroyed;
    }

    fn state(&self) -> CursorState {
        self.state
    }
}
