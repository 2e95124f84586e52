//! External merge sorter
//!
//! Input is cut into runs of `sort_run_rows` rows. Each full run is sorted in
//! memory and spilled to its own temp file. When the input ends, the final
//! partial run stays in memory and all runs are merged lazily as the sorted
//! cursor is read, so at most one entry per run is resident during output.

use std::sync::Arc;

use crate::bindings::BindingsArena;
use crate::context::QueryContext;
use crate::observability::{log_event, Event, ObservationScope, Severity};
use crate::operator::{Cursor, ExecutorResult};
use crate::types::RowType;

use super::cursor::SortedCursor;
use super::entry::{SortEntry, SortOrder};
use super::merge::{RunMerger, RunSource};
use super::spill::{remove_runs, SpillRun};
use super::{load_entries, Sorter};

pub struct MergeJoinSorter {
    ctx: Arc<QueryContext>,
    row_type: Arc<RowType>,
    order: Arc<SortOrder>,
    run_rows: usize,
    /// Runs spilled by an unfinished sort; removed on close or drop
    runs: Vec<SpillRun>,
}

impl MergeJoinSorter {
    pub fn new(ctx: Arc<QueryContext>, row_type: Arc<RowType>, order: Arc<SortOrder>) -> Self {
        let run_rows = ctx.config().sort_run_rows.max(1);
        Self {
            ctx,
            row_type,
            order,
            run_rows,
            runs: Vec::new(),
        }
    }

    fn spill(&mut self, run: &mut Vec<SortEntry>) -> ExecutorResult<()> {
        let order = Arc::clone(&self.order);
        run.sort_by(|a, b| order.compare(a, b));
        let dir = self.ctx.config().spill_path();
        let session = self.ctx.session_id().to_string();
        let spilled = SpillRun::write(&dir, &session, self.ctx.serializer(), run)?;
        self.ctx.metrics().record_spill_run(spilled.bytes());

        let index = self.runs.len().to_string();
        let rows = spilled.rows().to_string();
        let bytes = spilled.bytes().to_string();
        log_event(
            Event::SpillRunWritten,
            &[("run", &index), ("rows", &rows), ("bytes", &bytes)],
        );
        self.runs.push(spilled);
        run.clear();
        Ok(())
    }

    fn discard_runs(&mut self) {
        remove_runs(self.runs.drain(..));
    }
}

impl Sorter for MergeJoinSorter {
    fn sort(
        &mut self,
        input: &mut dyn Cursor,
        bindings: &mut BindingsArena,
    ) -> ExecutorResult<SortedCursor> {
        self.discard_runs();
        let scope = ObservationScope::with_fields(
            "SORT",
            Severity::Info,
            vec![
                ("sorter", self.name().to_string()),
                ("run_rows", self.run_rows.to_string()),
            ],
        );

        let ctx = Arc::clone(&self.ctx);
        let order = Arc::clone(&self.order);
        let run_rows = self.run_rows;
        let mut current: Vec<SortEntry> = Vec::with_capacity(run_rows.min(4096));
        let rows = load_entries(&ctx, &order, input, bindings, |entry| {
            current.push(entry);
            if current.len() >= run_rows {
                self.spill(&mut current)?;
            }
            Ok(())
        })?;

        current.sort_by(|a, b| order.compare(a, b));
        self.ctx.metrics().increment_external_sorts();
        self.ctx.metrics().add_rows_sorted(rows);

        let runs = std::mem::take(&mut self.runs);
        let spilled = runs.len();
        let cursor = if runs.is_empty() {
            SortedCursor::from_memory(Arc::clone(&self.row_type), order, current)
        } else {
            let run_count = (spilled + usize::from(!current.is_empty())).to_string();
            log_event(Event::SpillMergeStart, &[("runs", &run_count)]);
            let serializer = self.ctx.shared_serializer();
            let mut sources = Vec::with_capacity(spilled + 1);
            for run in &runs {
                sources.push(RunSource::Spilled(run.reader(Arc::clone(&serializer))?));
            }
            if !current.is_empty() {
                sources.push(RunSource::Memory(current.into_iter()));
            }
            let merger = RunMerger::new(sources, Arc::clone(&order))?;
            SortedCursor::from_merge(Arc::clone(&self.row_type), order, merger, runs)
        };

        scope.complete_with_fields(&[
            ("rows", &rows.to_string()),
            ("spilled_runs", &spilled.to_string()),
        ]);
        Ok(cursor)
    }

    fn close(&mut self) {
        self.discard_runs();
    }

    fn name(&self) -> &'static str {
        "external"
    }
}

impl Drop for MergeJoinSorter {
    fn drop(&mut self) {
        self.discard_runs();
    }
}
