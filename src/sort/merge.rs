//! K-way merge of sorted runs
//!
//! Each run contributes its head entry to a min-heap. Popping the heap yields
//! the globally next entry; the run it came from then refills its slot. Ties
//! cannot occur between distinct inputs because sequence numbers are unique
//! per sort, but run index still breaks them so the heap order is total.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::Arc;

use crate::operator::ExecutorResult;

use super::entry::{SortEntry, SortOrder};
use super::spill::SpillReader;

/// A sorted source of entries
pub enum RunSource {
    Spilled(SpillReader),
    Memory(std::vec::IntoIter<SortEntry>),
}

impl RunSource {
    fn next_entry(&mut self) -> ExecutorResult<Option<SortEntry>> {
        match self {
            RunSource::Spilled(reader) => reader.next_entry(),
            RunSource::Memory(entries) => Ok(entries.next()),
        }
    }
}

struct HeapItem {
    entry: SortEntry,
    run: usize,
    order: Arc<SortOrder>,
}

impl PartialEq for HeapItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapItem {}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order
            .compare(&self.entry, &other.entry)
            .then_with(|| self.run.cmp(&other.run))
    }
}

pub struct RunMerger {
    sources: Vec<RunSource>,
    heap: BinaryHeap<Reverse<HeapItem>>,
    order: Arc<SortOrder>,
}

impl RunMerger {
    /// Prime the heap with the head of every source
    pub fn new(sources: Vec<RunSource>, order: Arc<SortOrder>) -> ExecutorResult<Self> {
        let mut merger = Self {
            heap: BinaryHeap::with_capacity(sources.len()),
            sources,
            order,
        };
        for run in 0..merger.sources.len() {
            merger.refill(run)?;
        }
        Ok(merger)
    }

    pub fn run_count(&self) -> usize {
        self.sources.len()
    }

    pub fn next_entry(&mut self) -> ExecutorResult<Option<SortEntry>> {
        let Some(Reverse(item)) = self.heap.pop() else {
            return Ok(None);
        };
        self.refill(item.run)?;
        Ok(Some(item.entry))
    }

    fn refill(&mut self, run: usize) -> ExecutorResult<()> {
        if let Some(entry) = self.sources[run].next_entry()? {
            self.heap.push(Reverse(HeapItem {
                entry,
                run,
                order: Arc::clone(&self.order),
            }));
        }
        Ok(())
    }
}
