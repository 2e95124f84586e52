//! Top-N sorter
//!
//! Keeps the best `limit` entries in a sorted buffer and drops the rest as
//! they arrive, so memory is bounded by the limit rather than the input.

use std::sync::Arc;

use crate::bindings::BindingsArena;
use crate::context::QueryContext;
use crate::operator::{Cursor, ExecutorResult};
use crate::types::RowType;

use super::cursor::SortedCursor;
use super::entry::{SortEntry, SortOrder};
use super::spec::SortMode;
use super::{load_entries, Sorter};

pub struct InsertionLimitedSorter {
    ctx: Arc<QueryContext>,
    row_type: Arc<RowType>,
    order: Arc<SortOrder>,
    limit: usize,
}

impl InsertionLimitedSorter {
    pub fn new(
        ctx: Arc<QueryContext>,
        row_type: Arc<RowType>,
        order: Arc<SortOrder>,
        limit: usize,
    ) -> Self {
        Self {
            ctx,
            row_type,
            order,
            limit,
        }
    }
}

impl Sorter for InsertionLimitedSorter {
    fn sort(
        &mut self,
        input: &mut dyn Cursor,
        bindings: &mut BindingsArena,
    ) -> ExecutorResult<SortedCursor> {
        let order = Arc::clone(&self.order);
        let limit = self.limit;
        let suppress = order.mode() == SortMode::SuppressDuplicates;
        let mut buffer: Vec<SortEntry> = Vec::with_capacity(limit.min(1024) + 1);

        let rows = load_entries(&self.ctx, &order, input, bindings, |entry| {
            if limit == 0 {
                return Ok(());
            }
            if buffer.len() == limit {
                if let Some(worst) = buffer.last() {
                    if order.compare(&entry, worst).is_ge() {
                        return Ok(());
                    }
                }
            }
            let at = buffer.partition_point(|e| order.compare(e, &entry).is_lt());
            // Equal keys from earlier rows sort before `entry` by sequence
            if suppress && at > 0 && order.compare_keys(&buffer[at - 1], &entry).is_eq() {
                return Ok(());
            }
            buffer.insert(at, entry);
            buffer.truncate(limit);
            Ok(())
        })?;

        self.ctx.metrics().increment_memory_sorts();
        self.ctx.metrics().add_rows_sorted(rows);
        Ok(SortedCursor::from_memory(
            Arc::clone(&self.row_type),
            order,
            buffer,
        ))
    }

    fn close(&mut self) {}

    fn name(&self) -> &'static str {
        "insertion_limited"
    }
}
