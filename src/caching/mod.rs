//! One-step look-back over a forward-only source
//!
//! `CachingCursor` remembers the last record it delivered and at most one
//! record read ahead of it. `go_to` can reposition onto either of those two
//! and nothing else: it is a single step back, not a rewind.
//!
//! ```ignore
//! let mut cached = CachingCursor::new(rows(&mut cursor, &mut bindings));
//! let first = cached.next()?.unwrap();
//! cached.go_to(&first)?;               // ok: last delivered
//! assert_eq!(cached.next()?, Some(first));
//! ```

use crate::bindings::BindingsArena;
use crate::operator::{Cursor, ExecutorError, ExecutorResult};
use crate::types::Row;

pub struct CachingCursor<T, I>
where
    I: Iterator<Item = ExecutorResult<T>>,
{
    source: I,
    last: Option<T>,
    ahead: Option<T>,
    /// `next()` redelivers `last`
    rewound: bool,
}

impl<T, I> CachingCursor<T, I>
where
    T: Clone + PartialEq,
    I: Iterator<Item = ExecutorResult<T>>,
{
    pub fn new(source: I) -> Self {
        Self {
            source,
            last: None,
            ahead: None,
            rewound: false,
        }
    }

    pub fn next(&mut self) -> ExecutorResult<Option<T>> {
        if self.rewound {
            self.rewound = false;
            return Ok(self.last.clone());
        }
        let record = match self.ahead.take() {
            Some(record) => Some(record),
            None => self.source.next().transpose()?,
        };
        if let Some(record) = &record {
            self.last = Some(record.clone());
        }
        Ok(record)
    }

    /// The record `next()` would return, without delivering it
    pub fn peek(&mut self) -> ExecutorResult<Option<&T>> {
        if self.rewound {
            return Ok(self.last.as_ref());
        }
        if self.ahead.is_none() {
            self.ahead = self.source.next().transpose()?;
        }
        Ok(self.ahead.as_ref())
    }

    /// Position so that `next()` returns `target`.
    ///
    /// `target` must be the last delivered record or the one buffered after
    /// it; anything else fails with `NotResettable`.
    pub fn go_to(&mut self, target: &T) -> ExecutorResult<()> {
        if self.last.as_ref() == Some(target) {
            self.rewound = true;
            return Ok(());
        }
        if self.ahead.as_ref() == Some(target) {
            self.rewound = false;
            return Ok(());
        }
        Err(ExecutorError::NotResettable)
    }

    pub fn last_delivered(&self) -> Option<&T> {
        self.last.as_ref()
    }
}

/// Rows of an open cursor as an iterator
pub struct RowSource<'a, C: Cursor + ?Sized> {
    cursor: &'a mut C,
    bindings: &'a mut BindingsArena,
    done: bool,
}

impl<C: Cursor + ?Sized> Iterator for RowSource<'_, C> {
    type Item = ExecutorResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.cursor.next(self.bindings) {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Adapt an open cursor into a `CachingCursor` source
pub fn rows<'a, C: Cursor + ?Sized>(
    cursor: &'a mut C,
    bindings: &'a mut BindingsArena,
) -> RowSource<'a, C> {
    RowSource {
        cursor,
        bindings,
        done: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(n: u32) -> impl Iterator<Item = ExecutorResult<u32>> {
        (0..n).map(Ok)
    }

    #[test]
    fn test_plain_iteration() {
        let mut cached = CachingCursor::new(source(3));
        assert_eq!(cached.next().unwrap(), Some(0));
        assert_eq!(cached.next().unwrap(), Some(1));
        assert_eq!(cached.next().unwrap(), Some(2));
        assert_eq!(cached.next().unwrap(), None);
    }

    #[test]
    fn test_go_to_last_delivered_redelivers() {
        let mut cached = CachingCursor::new(source(5));
        cached.next().unwrap();
        let k = cached.next().unwrap().unwrap();
        cached.go_to(&k).unwrap();
        assert_eq!(cached.next().unwrap(), Some(k));
        assert_eq!(cached.next().unwrap(), Some(k + 1));
    }

    #[test]
    fn test_go_to_outside_window_fails() {
        let mut cached = CachingCursor::new(source(5));
        let first = cached.next().unwrap().unwrap();
        cached.next().unwrap();
        let err = cached.go_to(&first).unwrap_err();
        assert!(matches!(err, ExecutorError::NotResettable));
        assert_eq!(err.code(), "GQP_NOT_RESETTABLE");
    }

    #[test]
    fn test_go_to_buffered_record() {
        let mut cached = CachingCursor::new(source(5));
        assert_eq!(cached.next().unwrap(), Some(0));
        assert_eq!(cached.peek().unwrap(), Some(&1));
        cached.go_to(&0).unwrap();
        cached.go_to(&1).unwrap();
        assert_eq!(cached.next().unwrap(), Some(1));
        assert!(cached.go_to(&3).is_err());
    }

    #[test]
    fn test_source_error_propagates() {
        let items = vec![Ok(1u32), Err(ExecutorError::QueryCanceled)];
        let mut cached = CachingCursor::new(items.into_iter());
        assert_eq!(cached.next().unwrap(), Some(1));
        assert!(matches!(cached.next(), Err(ExecutorError::QueryCanceled)));
    }
}
