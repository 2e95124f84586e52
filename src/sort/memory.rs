//! In-memory sorter

use std::sync::Arc;

use crate::bindings::BindingsArena;
use crate::context::QueryContext;
use crate::observability::{ObservationScope, Severity};
use crate::operator::{Cursor, ExecutorResult};
use crate::types::RowType;

use super::cursor::SortedCursor;
use super::entry::{SortEntry, SortOrder};
use super::{load_entries, Sorter};

/// Loads the whole input into a vector and sorts it once
pub struct MemorySorter {
    ctx: Arc<QueryContext>,
    row_type: Arc<RowType>,
    order: Arc<SortOrder>,
    entries: Vec<SortEntry>,
}

impl MemorySorter {
    pub fn new(ctx: Arc<QueryContext>, row_type: Arc<RowType>, order: Arc<SortOrder>) -> Self {
        Self {
            ctx,
            row_type,
            order,
            entries: Vec::new(),
        }
    }
}

impl Sorter for MemorySorter {
    fn sort(
        &mut self,
        input: &mut dyn Cursor,
        bindings: &mut BindingsArena,
    ) -> ExecutorResult<SortedCursor> {
        let scope = ObservationScope::with_fields(
            "SORT",
            Severity::Info,
            vec![("sorter", self.name().to_string())],
        );
        self.entries.clear();
        let entries = &mut self.entries;
        let rows = load_entries(&self.ctx, &self.order, input, bindings, |entry| {
            entries.push(entry);
            Ok(())
        })?;

        let order = Arc::clone(&self.order);
        let mut entries = std::mem::take(&mut self.entries);
        // Sequence numbers are unique, so this order is total and stable
        entries.sort_by(|a, b| order.compare(a, b));

        self.ctx.metrics().increment_memory_sorts();
        self.ctx.metrics().add_rows_sorted(rows);
        scope.complete_with_fields(&[("rows", &rows.to_string())]);
        Ok(SortedCursor::from_memory(
            Arc::clone(&self.row_type),
            order,
            entries,
        ))
    }

    fn close(&mut self) {
        self.entries = Vec::new();
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
