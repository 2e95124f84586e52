//! Ancestor lookup by point read
//!
//! For each input row of one table, reads the rows of chosen ancestor tables
//! directly from the group tree. An ancestor's hkey is a prefix of the
//! row's own hkey, so no scan is needed. Ancestors come out root first,
//! followed by the input row when input is kept. A missing ancestor is
//! skipped. Rows of other types trigger no lookup and are emitted only when
//! input is kept.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::bindings::{BindingsArena, BindingsId};
use crate::context::QueryContext;
use crate::hkey::{self, HKey};
use crate::store::GroupSchema;
use crate::types::{read_values, Row, RowType};

use super::cursor::Cursor;
use super::errors::{ExecutorError, ExecutorResult};
use super::node::Node;
use super::operator_cursor::OperatorCursor;

pub(crate) struct AncestorLookupCursor {
    ctx: Arc<QueryContext>,
    input: Box<OperatorCursor>,
    group: Arc<GroupSchema>,
    row_type: Arc<RowType>,
    ancestor_types: Vec<Arc<RowType>>,
    keep_input: bool,
    /// Validated ancestors as (depth, type), root first
    lookups: Vec<(usize, Arc<RowType>)>,
    pending: VecDeque<Row>,
}

impl AncestorLookupCursor {
    pub(crate) fn new(
        ctx: &Arc<QueryContext>,
        input: OperatorCursor,
        group: Arc<GroupSchema>,
        row_type: Arc<RowType>,
        ancestor_types: Vec<Arc<RowType>>,
        keep_input: bool,
    ) -> Self {
        Self {
            ctx: Arc::clone(ctx),
            input: Box::new(input),
            group,
            row_type,
            ancestor_types,
            keep_input,
            lookups: Vec::new(),
            pending: VecDeque::new(),
        }
    }

    /// Check every ancestor type lies on the row type's parent chain
    fn plan_lookups(&self) -> ExecutorResult<Vec<(usize, Arc<RowType>)>> {
        let ordinal = self.table_ordinal(&self.row_type)?;
        let mut chain = Vec::new();
        let mut current = self.group.table(ordinal).and_then(|t| t.parent());
        while let Some(parent) = current {
            chain.push(parent);
            current = self.group.table(parent).and_then(|t| t.parent());
        }

        let mut lookups = Vec::with_capacity(self.ancestor_types.len());
        for ancestor in &self.ancestor_types {
            let ancestor_ordinal = self.table_ordinal(ancestor)?;
            if !chain.contains(&ancestor_ordinal) {
                return Err(ExecutorError::PlanInvalid(format!(
                    "{} is not an ancestor of {} in group {}",
                    ancestor.name(),
                    self.row_type.name(),
                    self.group.name()
                )));
            }
            let depth = self.group.depth_of(ancestor_ordinal).ok_or_else(|| {
                ExecutorError::Internal(format!("no depth for ordinal {}", ancestor_ordinal))
            })?;
            lookups.push((depth, Arc::clone(ancestor)));
        }
        lookups.sort_by_key(|(depth, _)| *depth);
        lookups.dedup_by_key(|(depth, _)| *depth);
        Ok(lookups)
    }

    fn table_ordinal(&self, row_type: &RowType) -> ExecutorResult<u32> {
        row_type
            .table_ordinal()
            .filter(|o| self.group.table(*o).is_some())
            .ok_or_else(|| {
                ExecutorError::PlanInvalid(format!(
                    "{} is not a table of group {}",
                    row_type.name(),
                    self.group.name()
                ))
            })
    }

    /// Point read of the row stored at `hkey`
    fn fetch(&self, row_type: &Arc<RowType>, hkey: HKey) -> ExecutorResult<Option<Row>> {
        let Some(bytes) = self.ctx.store().get(self.group.tree(), &hkey::pack(&hkey))? else {
            return Ok(None);
        };
        let values = read_values(self.ctx.serializer(), &bytes).map_err(|e| {
            ExecutorError::Internal(format!("group {}: row at {}: {}", self.group.name(), hkey, e))
        })?;
        if values.len() != row_type.arity() {
            return Err(ExecutorError::Internal(format!(
                "group {}: row at {} has {} values, {} expects {}",
                self.group.name(),
                hkey,
                values.len(),
                row_type.name(),
                row_type.arity()
            )));
        }
        Ok(Some(Row::new(Arc::clone(row_type), values).with_hkey(hkey)))
    }

    fn expand(&mut self, row: Row) -> ExecutorResult<()> {
        let hkey = row.hkey().cloned().ok_or_else(|| {
            ExecutorError::PlanInvalid(format!("ancestor lookup input {} has no hkey", row))
        })?;
        for (depth, ancestor) in &self.lookups {
            let Some(prefix) = hkey.prefix(*depth) else {
                continue;
            };
            if let Some(found) = self.fetch(ancestor, prefix)? {
                self.pending.push_back(found);
            }
        }
        if self.keep_input {
            self.pending.push_back(row);
        }
        Ok(())
    }
}

impl Node for AncestorLookupCursor {
    fn open(&mut self, bindings: &mut BindingsArena, scope: BindingsId) -> ExecutorResult<()> {
        self.lookups = self.plan_lookups()?;
        self.pending.clear();
        self.input.open(bindings, scope)
    }

    fn next(&mut self, bindings: &mut BindingsArena) -> ExecutorResult<Option<Row>> {
        loop {
            if let Some(row) = self.pending.pop_front() {
                return Ok(Some(row));
            }
            self.ctx.check_canceled()?;
            let Some(row) = self.input.next(bindings)? else {
                return Ok(None);
            };
            if row.is_type(&self.row_type) {
                self.expand(row)?;
            } else if self.keep_input {
                return Ok(Some(row));
            }
        }
    }

    fn close(&mut self) {
        self.pending.clear();
        self.input.close();
    }

    fn destroy(&mut self) {
        self.pending.clear();
        self.input.destroy();
    }
}
