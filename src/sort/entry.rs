//! Sort entries and their ordering
//!
//! An entry pairs the ordering key with the full row payload. The sequence
//! number is the entry's position in the input stream; when duplicates are
//! preserved it breaks key ties, which makes every sorter stable and makes
//! the external merge reproduce the in-memory order exactly.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::types::{Row, Value, ValueComparator};

use super::spec::{SortDirection, SortMode, SortSpec};

#[derive(Debug, Clone, PartialEq)]
pub struct SortEntry {
    pub key: Vec<Value>,
    pub sequence: u64,
    pub payload: Vec<Value>,
}

/// Comparison rules for one sort
#[derive(Clone)]
pub struct SortOrder {
    comparator: Arc<dyn ValueComparator>,
    columns: Vec<usize>,
    directions: Vec<SortDirection>,
    mode: SortMode,
}

impl SortOrder {
    /// Build the order for rows of `arity` columns.
    ///
    /// When suppressing duplicates, every column not already a sort key is
    /// appended ascending, so equal keys mean equal rows.
    pub fn new(
        comparator: Arc<dyn ValueComparator>,
        spec: &SortSpec,
        mode: SortMode,
        arity: usize,
    ) -> Self {
        let mut columns: Vec<usize> = spec.keys().iter().map(|k| k.column).collect();
        let mut directions: Vec<SortDirection> = spec.keys().iter().map(|k| k.direction).collect();
        if mode == SortMode::SuppressDuplicates {
            for column in 0..arity {
                if !columns.contains(&column) {
                    columns.push(column);
                    directions.push(SortDirection::Asc);
                }
            }
        }
        Self {
            comparator,
            columns,
            directions,
            mode,
        }
    }

    pub fn mode(&self) -> SortMode {
        self.mode
    }

    /// Turn the `sequence`-th input row into an entry.
    ///
    /// Returns `None` when the row lacks a key column.
    pub fn entry(&self, row: Row, sequence: u64) -> Option<SortEntry> {
        let key = self
            .columns
            .iter()
            .map(|&c| row.value(c).cloned())
            .collect::<Option<Vec<_>>>()?;
        Some(SortEntry {
            key,
            sequence,
            payload: row.into_values(),
        })
    }

    /// Key-only comparison
    pub fn compare_keys(&self, a: &SortEntry, b: &SortEntry) -> Ordering {
        self.compare_key_values(&a.key, &b.key)
    }

    pub fn compare_key_values(&self, a: &[Value], b: &[Value]) -> Ordering {
        for ((left, right), direction) in a.iter().zip(b).zip(&self.directions) {
            let ordering = self.comparator.compare(left, right);
            let ordering = match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        a.len().cmp(&b.len())
    }

    /// Full entry order: key, then input position
    pub fn compare(&self, a: &SortEntry, b: &SortEntry) -> Ordering {
        self.compare_keys(a, b)
            .then_with(|| a.sequence.cmp(&b.sequence))
    }
}
