//! Parent/child flattening over an hkey-ordered stream
//!
//! The input carries parent rows each followed by their descendants. Every
//! child that descends from the current parent yields a flattened row of
//! parent fields then child fields, keyed by the child's hkey. Outer join
//! variants fill the missing side with nulls:
//!
//! - LEFT: a parent with no child yields one row, keyed by the parent's hkey
//!   extended with the child ordinal and a null key
//! - RIGHT: a child with no parent (an orphan) yields one row
//!
//! Rows of other types pass through in place. `keep_parent` and
//! `keep_child` also pass the input rows themselves through.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::bindings::{BindingsArena, BindingsId};
use crate::context::QueryContext;
use crate::hkey::HKey;
use crate::types::{Row, RowType, Value};

use super::cursor::Cursor;
use super::errors::{ExecutorError, ExecutorResult};
use super::node::Node;
use super::operator_cursor::OperatorCursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinType {
    fn keeps_childless_parents(&self) -> bool {
        matches!(self, JoinType::Left | JoinType::Full)
    }

    fn keeps_orphans(&self) -> bool {
        matches!(self, JoinType::Right | JoinType::Full)
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JoinType::Inner => "INNER",
            JoinType::Left => "LEFT",
            JoinType::Right => "RIGHT",
            JoinType::Full => "FULL",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlattenOptions {
    pub keep_parent: bool,
    pub keep_child: bool,
}

pub(crate) struct FlattenCursor {
    ctx: Arc<QueryContext>,
    input: Box<OperatorCursor>,
    parent_type: Arc<RowType>,
    child_type: Arc<RowType>,
    output_type: Arc<RowType>,
    join: JoinType,
    options: FlattenOptions,
    parent: Option<Row>,
    /// Key a left join row for the current parent would carry
    left_join_hkey: Option<HKey>,
    childless_parent: bool,
    pending: VecDeque<Row>,
    input_done: bool,
}

impl FlattenCursor {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        ctx: &Arc<QueryContext>,
        input: OperatorCursor,
        parent_type: Arc<RowType>,
        child_type: Arc<RowType>,
        output_type: Arc<RowType>,
        join: JoinType,
        options: FlattenOptions,
    ) -> Self {
        Self {
            ctx: Arc::clone(ctx),
            input: Box::new(input),
            parent_type,
            child_type,
            output_type,
            join,
            options,
            parent: None,
            left_join_hkey: None,
            childless_parent: false,
            pending: VecDeque::new(),
            input_done: false,
        }
    }

    fn reset(&mut self) {
        self.parent = None;
        self.left_join_hkey = None;
        self.childless_parent = false;
        self.pending.clear();
        self.input_done = false;
    }

    fn set_parent(&mut self, parent: Option<Row>) -> ExecutorResult<()> {
        self.left_join_hkey = None;
        self.childless_parent = false;
        if let Some(row) = &parent {
            let hkey = row.hkey().ok_or_else(|| {
                ExecutorError::PlanInvalid(format!("flatten parent {} has no hkey", row))
            })?;
            if self.join.keeps_childless_parents() {
                let ordinal = self.child_type.table_ordinal().ok_or_else(|| {
                    ExecutorError::PlanInvalid(format!(
                        "flatten child type {} is not a table",
                        self.child_type
                    ))
                })?;
                self.left_join_hkey = Some(hkey.extend(ordinal, vec![Value::Null]));
                self.childless_parent = true;
            }
        }
        self.parent = parent;
        Ok(())
    }

    fn parent_is_ancestor_of(&self, row: &Row) -> bool {
        match (self.parent.as_ref().and_then(Row::hkey), row.hkey()) {
            (Some(parent), Some(hkey)) => parent.is_ancestor_of(hkey),
            _ => false,
        }
    }

    /// Whether the current childless parent is finished, so its left join
    /// row must come out before `input`
    fn ready_for_left_join_row(&self, input: Option<&Row>) -> bool {
        if !self.childless_parent || self.parent.is_none() {
            return false;
        }
        let Some(row) = input else {
            return true;
        };
        if row.is_type(&self.parent_type) || !self.parent_is_ancestor_of(row) {
            return true;
        }
        if row.is_type(&self.child_type) {
            return false;
        }
        // A deeper descendant: the left join row goes where a child would
        match (&self.left_join_hkey, row.hkey()) {
            (Some(left), Some(hkey)) => left < hkey,
            _ => false,
        }
    }

    fn flattened(&self, parent: Option<&Row>, child: Option<&Row>, hkey: Option<HKey>) -> Row {
        let mut values = Vec::with_capacity(self.output_type.arity());
        match parent {
            Some(p) => values.extend_from_slice(p.values()),
            None => values.extend(std::iter::repeat(Value::Null).take(self.parent_type.arity())),
        }
        match child {
            Some(c) => values.extend_from_slice(c.values()),
            None => values.extend(std::iter::repeat(Value::Null).take(self.child_type.arity())),
        }
        let row = Row::new(Arc::clone(&self.output_type), values);
        match hkey {
            Some(h) => row.with_hkey(h),
            None => row,
        }
    }

    fn emit_left_join_row(&mut self) {
        if let Some(parent) = &self.parent {
            let row = self.flattened(Some(parent), None, self.left_join_hkey.clone());
            self.pending.push_back(row);
        }
        self.childless_parent = false;
    }
}

impl Node for FlattenCursor {
    fn open(&mut self, bindings: &mut BindingsArena, scope: BindingsId) -> ExecutorResult<()> {
        self.reset();
        self.input.open(bindings, scope)
    }

    fn next(&mut self, bindings: &mut BindingsArena) -> ExecutorResult<Option<Row>> {
        loop {
            if let Some(row) = self.pending.pop_front() {
                return Ok(Some(row));
            }
            self.ctx.check_canceled()?;
            let input = if self.input_done {
                None
            } else {
                self.input.next(bindings)?
            };
            if input.is_none() {
                self.input_done = true;
                if self.parent.is_none() {
                    return Ok(None);
                }
            }

            if self.ready_for_left_join_row(input.as_ref()) {
                self.emit_left_join_row();
            }

            let Some(row) = input else {
                self.set_parent(None)?;
                continue;
            };
            if row.is_type(&self.parent_type) {
                if self.options.keep_parent {
                    self.pending.push_back(row.clone());
                }
                self.set_parent(Some(row))?;
            } else if row.is_type(&self.child_type) {
                if self.options.keep_child {
                    self.pending.push_back(row.clone());
                }
                if self.parent_is_ancestor_of(&row) {
                    let flat = self.flattened(self.parent.as_ref(), Some(&row), row.hkey().cloned());
                    self.pending.push_back(flat);
                    self.childless_parent = false;
                } else {
                    self.set_parent(None)?;
                    if self.join.keeps_orphans() {
                        let flat = self.flattened(None, Some(&row), row.hkey().cloned());
                        self.pending.push_back(flat);
                    }
                }
            } else {
                self.pending.push_back(row);
            }
        }
    }

    fn close(&mut self) {
        self.reset();
        self.input.close();
    }

    fn destroy(&mut self) {
        self.reset();
        self.input.destroy();
    }
}
