//! Hierarchical scan of a group
//!
//! One ordered range read over the group tree yields every row of every
//! table in hkey order: each parent immediately followed by its subtree.
//! The scan keeps the last row seen at each depth. A row whose parent hkey
//! is not the row kept one level up is an orphan: it is still emitted, with
//! no ancestor link, and counted.
//!
//! One decoded row of look-ahead fills in `child`: the hkey of the next row
//! when that row is a direct child, else nothing.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::bindings::{BindingsArena, BindingsId};
use crate::context::QueryContext;
use crate::hkey::{self, HKey};
use crate::observability::{log_event, Event};
use crate::store::{GroupSchema, KeyRange};
use crate::types::{read_values, Row};

use super::errors::{ExecutorError, ExecutorResult};
use super::node::Node;

pub(crate) struct GroupScanCursor {
    ctx: Arc<QueryContext>,
    group: Arc<GroupSchema>,
    branch_binding: Option<usize>,
    /// Range still to read; `None` once the store returned a short batch
    remaining: Option<KeyRange>,
    batch: VecDeque<(Vec<u8>, Vec<u8>)>,
    lookahead: Option<Row>,
    /// Last hkey seen at each depth, index = depth - 1
    ancestors: Vec<Option<HKey>>,
}

impl GroupScanCursor {
    pub(crate) fn new(
        ctx: &Arc<QueryContext>,
        group: Arc<GroupSchema>,
        branch_binding: Option<usize>,
    ) -> Self {
        Self {
            ctx: Arc::clone(ctx),
            group,
            branch_binding,
            remaining: None,
            batch: VecDeque::new(),
            lookahead: None,
            ancestors: Vec::new(),
        }
    }

    fn reset(&mut self) {
        self.remaining = None;
        self.batch.clear();
        self.lookahead = None;
        self.ancestors.clear();
    }

    /// Next raw entry, fetching a new batch when the current one is used up
    fn next_entry(&mut self) -> ExecutorResult<Option<(Vec<u8>, Vec<u8>)>> {
        if self.batch.is_empty() {
            let Some(range) = self.remaining.take() else {
                return Ok(None);
            };
            let batch_size = self.ctx.config().scan_batch_size.max(1);
            let entries = self
                .ctx
                .store()
                .read_range(self.group.tree(), &range, batch_size)?;
            let metrics = self.ctx.metrics();
            metrics.increment_scan_batches();
            metrics.add_rows_scanned(entries.len() as u64);
            let count = entries.len().to_string();
            log_event(
                Event::GroupScanBatch,
                &[("group", self.group.name()), ("entries", &count)],
            );
            if entries.len() >= batch_size {
                if let Some((last, _)) = entries.last() {
                    self.remaining = Some(range.after(last));
                }
            }
            self.batch.extend(entries);
        }
        Ok(self.batch.pop_front())
    }

    fn next_row(&mut self) -> ExecutorResult<Option<Row>> {
        match self.next_entry()? {
            Some((key, value)) => self.decode(&key, &value).map(Some),
            None => Ok(None),
        }
    }

    fn decode(&self, key: &[u8], value: &[u8]) -> ExecutorResult<Row> {
        let hkey = hkey::unpack(key).map_err(|e| {
            ExecutorError::Internal(format!("group {}: undecodable key: {}", self.group.name(), e))
        })?;
        let ordinal = hkey.ordinal().ok_or_else(|| {
            ExecutorError::Internal(format!("group {}: empty hkey", self.group.name()))
        })?;
        let table = self.group.table(ordinal).ok_or_else(|| {
            ExecutorError::Internal(format!(
                "group {}: unknown table ordinal {} in {}",
                self.group.name(),
                ordinal,
                hkey
            ))
        })?;
        if self.group.depth_of(ordinal) != Some(hkey.depth()) {
            return Err(ExecutorError::Internal(format!(
                "group {}: {} has the wrong depth for table {}",
                self.group.name(),
                hkey,
                table.row_type().name()
            )));
        }
        let values = read_values(self.ctx.serializer(), value).map_err(|e| {
            ExecutorError::Internal(format!("group {}: row at {}: {}", self.group.name(), hkey, e))
        })?;
        if values.len() != table.row_type().arity() {
            return Err(ExecutorError::Internal(format!(
                "group {}: row at {} has {} values, {} expects {}",
                self.group.name(),
                hkey,
                values.len(),
                table.row_type().name(),
                table.row_type().arity()
            )));
        }
        Ok(Row::new(Arc::clone(table.row_type()), values).with_hkey(hkey))
    }

    /// Attach the ancestor link and remember `hkey` at its depth
    fn link_ancestor(&mut self, hkey: &HKey) -> Option<HKey> {
        let depth = hkey.depth();
        let ancestor = match hkey.parent() {
            None => None,
            Some(parent) => {
                let kept = self.ancestors.get(depth - 2).and_then(Option::as_ref);
                if kept == Some(&parent) {
                    Some(parent)
                } else {
                    self.ctx.metrics().increment_orphan_rows();
                    let shown = hkey.to_string();
                    log_event(
                        Event::OrphanRow,
                        &[("group", self.group.name()), ("hkey", &shown)],
                    );
                    None
                }
            }
        };
        self.ancestors.truncate(depth - 1);
        self.ancestors.resize(depth - 1, None);
        self.ancestors.push(Some(hkey.clone()));
        ancestor
    }
}

impl Node for GroupScanCursor {
    fn open(&mut self, bindings: &mut BindingsArena, scope: BindingsId) -> ExecutorResult<()> {
        self.reset();
        match self.branch_binding {
            None => self.remaining = Some(KeyRange::all()),
            Some(slot) => {
                let bound = bindings.get_row(scope, slot)?;
                let root = bound.hkey().ok_or_else(|| {
                    ExecutorError::PlanInvalid(format!(
                        "branch scan of {} needs a group row at slot {}, got {}",
                        self.group.name(),
                        slot,
                        bound
                    ))
                })?;
                // The branch root's ancestors are known from its own hkey
                for depth in 1..root.depth() {
                    self.ancestors.push(root.prefix(depth));
                }
                let start = hkey::pack(root);
                let end = hkey::subtree_end(&start);
                self.remaining = Some(KeyRange::new(start, Some(end)));
            }
        }
        Ok(())
    }

    fn next(&mut self, _bindings: &mut BindingsArena) -> ExecutorResult<Option<Row>> {
        self.ctx.check_canceled()?;
        let current = match self.lookahead.take() {
            Some(row) => row,
            None => match self.next_row()? {
                Some(row) => row,
                None => return Ok(None),
            },
        };
        self.lookahead = self.next_row()?;

        let Some(hkey) = current.hkey().cloned() else {
            return Err(ExecutorError::Internal("group row without hkey".into()));
        };
        let ancestor = self.link_ancestor(&hkey);
        let child = self
            .lookahead
            .as_ref()
            .and_then(Row::hkey)
            .filter(|next| hkey.is_parent_of(next))
            .cloned();
        Ok(Some(current.with_ancestor(ancestor).with_child(child)))
    }

    fn close(&mut self) {
        self.reset();
    }
}
