//! Sort subsystem
//!
//! A `Sorter` drains an open cursor and returns its rows, ordered, as a new
//! cursor. Three implementations:
//!
//! - `MemorySorter`: one in-memory stable sort
//! - `MergeJoinSorter`: bounded runs spilled to temp files, merged lazily
//! - `InsertionLimitedSorter`: top-N in a bounded buffer
//!
//! `MemorySorter` and `MergeJoinSorter` produce the same order for the same
//! input. `create_sorter` chooses between them from the row estimate.
//!
//! ```ignore
//! let mut sorter = create_sorter(&ctx, row_type, &SortSpec::asc(0), SortMode::PreserveDuplicates, None);
//! let mut sorted = sorter.sort(&mut input, &mut bindings)?;
//! while let Some(row) = sorted.next(&mut bindings)? { /* ... */ }
//! ```

mod cursor;
mod entry;
mod external;
mod limited;
mod memory;
mod merge;
mod spec;
mod spill;

pub use cursor::SortedCursor;
pub use entry::{SortEntry, SortOrder};
pub use external::MergeJoinSorter;
pub use limited::InsertionLimitedSorter;
pub use memory::MemorySorter;
pub use merge::{RunMerger, RunSource};
pub use spec::{SortDirection, SortKeySpec, SortMode, SortSpec};
pub use spill::{SpillReader, SpillRun};

use std::sync::Arc;

use crate::bindings::BindingsArena;
use crate::context::QueryContext;
use crate::observability::{log_event, Event};
use crate::operator::{Cursor, ExecutorError, ExecutorResult};
use crate::types::RowType;

pub trait Sorter {
    /// Drain `input`, which must be open, and return its rows in order.
    /// `input` is left open for its owner to close.
    fn sort(
        &mut self,
        input: &mut dyn Cursor,
        bindings: &mut BindingsArena,
    ) -> ExecutorResult<SortedCursor>;

    /// Release anything left over from an unfinished sort
    fn close(&mut self);

    fn name(&self) -> &'static str;
}

/// Pick the sorter for an input of `estimated_rows` rows.
///
/// In memory when the estimate is known and below
/// `sort_memory_threshold_rows`, external otherwise.
pub fn create_sorter(
    ctx: &Arc<QueryContext>,
    row_type: Arc<RowType>,
    spec: &SortSpec,
    mode: SortMode,
    estimated_rows: Option<u64>,
) -> Box<dyn Sorter> {
    let order = Arc::new(SortOrder::new(
        ctx.shared_comparator(),
        spec,
        mode,
        row_type.arity(),
    ));
    let threshold = ctx.config().sort_memory_threshold_rows as u64;
    let sorter: Box<dyn Sorter> = match estimated_rows {
        Some(rows) if rows < threshold => {
            Box::new(MemorySorter::new(Arc::clone(ctx), row_type, order))
        }
        _ => Box::new(MergeJoinSorter::new(Arc::clone(ctx), row_type, order)),
    };
    let estimate = estimated_rows.map_or_else(|| "unknown".to_string(), |r| r.to_string());
    log_event(
        Event::SorterSelected,
        &[
            ("sorter", sorter.name()),
            ("estimated_rows", &estimate),
            ("mode", mode.as_str()),
        ],
    );
    sorter
}

/// Pull every row of `input` into sort entries, numbering them in arrival
/// order. Cancellation is checked before each row.
pub(crate) fn load_entries<F>(
    ctx: &QueryContext,
    order: &SortOrder,
    input: &mut dyn Cursor,
    bindings: &mut BindingsArena,
    mut sink: F,
) -> ExecutorResult<u64>
where
    F: FnMut(SortEntry) -> ExecutorResult<()>,
{
    let mut sequence = 0u64;
    loop {
        ctx.check_canceled()?;
        let Some(row) = input.next(bindings)? else {
            break;
        };
        let shown = row.to_string();
        let entry = order.entry(row, sequence).ok_or_else(|| {
            ExecutorError::PlanInvalid(format!("row {} lacks a sort column", shown))
        })?;
        sink(entry)?;
        sequence += 1;
    }
    Ok(sequence)
}
