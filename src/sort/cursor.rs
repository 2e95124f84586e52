//! Cursor over a finished sort

use std::sync::Arc;

use crate::bindings::{BindingsArena, BindingsId};
use crate::operator::{Cursor, CursorState, ExecutorError, ExecutorResult};
use crate::types::{Row, RowType, Value};

use super::entry::{SortEntry, SortOrder};
use super::merge::RunMerger;
use super::spec::SortMode;
use super::spill::{remove_runs, SpillRun};

enum Source {
    Memory(std::vec::IntoIter<SortEntry>),
    Merge {
        merger: RunMerger,
        /// Held so the files outlive their readers
        runs: Vec<SpillRun>,
    },
    Released,
}

/// Sorted output, produced already open.
///
/// A sorted cursor is single-use: once closed its entries (and any spill
/// files) are gone, and reopening it is a state error. Re-sort the input to
/// replay.
pub struct SortedCursor {
    row_type: Arc<RowType>,
    order: Arc<SortOrder>,
    source: Source,
    last_key: Option<Vec<Value>>,
    state: CursorState,
}

impl std::fmt::Debug for SortedCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SortedCursor")
            .field("row_type", &self.row_type)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl SortedCursor {
    pub(crate) fn from_memory(
        row_type: Arc<RowType>,
        order: Arc<SortOrder>,
        entries: Vec<SortEntry>,
    ) -> Self {
        Self::with_source(row_type, order, Source::Memory(entries.into_iter()))
    }

    pub(crate) fn from_merge(
        row_type: Arc<RowType>,
        order: Arc<SortOrder>,
        merger: RunMerger,
        runs: Vec<SpillRun>,
    ) -> Self {
        Self::with_source(row_type, order, Source::Merge { merger, runs })
    }

    fn with_source(row_type: Arc<RowType>, order: Arc<SortOrder>, source: Source) -> Self {
        Self {
            row_type,
            order,
            source,
            last_key: None,
            state: CursorState::Active,
        }
    }

    /// Number of spill files still held
    pub fn spill_files(&self) -> usize {
        match &self.source {
            Source::Merge { runs, .. } => runs.len(),
            _ => 0,
        }
    }

    fn next_entry(&mut self) -> ExecutorResult<Option<SortEntry>> {
        match &mut self.source {
            Source::Memory(entries) => Ok(entries.next()),
            Source::Merge { merger, .. } => merger.next_entry(),
            Source::Released => Ok(None),
        }
    }

    fn release(&mut self) {
        if let Source::Merge { runs, .. } = std::mem::replace(&mut self.source, Source::Released) {
            remove_runs(runs);
        }
        self.last_key = None;
    }
}

impl Cursor for SortedCursor {
    fn open(&mut self, _bindings: &mut BindingsArena, _scope: BindingsId) -> ExecutorResult<()> {
        Err(ExecutorError::CursorState {
            cursor: "SortedCursor",
            operation: "open",
            state: self.state,
        })
    }

    fn next(&mut self, _bindings: &mut BindingsArena) -> ExecutorResult<Option<Row>> {
        if self.state != CursorState::Active {
            return Err(ExecutorError::CursorState {
                cursor: "SortedCursor",
                operation: "next",
                state: self.state,
            });
        }
        loop {
            let entry = match self.next_entry() {
                Ok(Some(entry)) => entry,
                Ok(None) => return Ok(None),
                Err(e) => {
                    if e.is_fatal() {
                        self.destroy();
                    }
                    return Err(e);
                }
            };
            if self.order.mode() == SortMode::SuppressDuplicates {
                if let Some(last) = &self.last_key {
                    if self.order.compare_key_values(last, &entry.key).is_eq() {
                        continue;
                    }
                }
                self.last_key = Some(entry.key);
            }
            return Ok(Some(Row::new(Arc::clone(&self.row_type), entry.payload)));
        }
    }

    fn close(&mut self) {
        self.release();
        if self.state != CursorState::Destroyed {
            self.state = CursorState::Closed;
        }
    }

    fn destroy(&mut self) {
        self.release();
        self.state = CursorState::Destroyed;
    }

    fn state(&self) -> CursorState {
        self.state
    }
}

impl Drop for SortedCursor {
    fn drop(&mut self) {
        self.release();
    }
}
