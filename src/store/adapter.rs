//! Ordered key-value store interface
//!
//! The runtime never sees the physical transport. It reads through this
//! trait in key order, one bounded batch at a time.

use super::errors::StoreResult;

/// Half-open byte range `[start, end)`. `end = None` is unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    start: Vec<u8>,
    end: Option<Vec<u8>>,
}

impl KeyRange {
    /// Every key in the tree
    pub fn all() -> Self {
        Self {
            start: Vec::new(),
            end: None,
        }
    }

    pub fn new(start: Vec<u8>, end: Option<Vec<u8>>) -> Self {
        Self { start, end }
    }

    /// Every key that starts with `prefix`
    pub fn prefix(prefix: &[u8]) -> Self {
        Self {
            start: prefix.to_vec(),
            end: prefix_successor(prefix),
        }
    }

    /// Continuation range for the keys after `last`, keeping the same end
    pub fn after(&self, last: &[u8]) -> Self {
        let mut start = Vec::with_capacity(last.len() + 1);
        start.extend_from_slice(last);
        start.push(0x00);
        Self {
            start,
            end: self.end.clone(),
        }
    }

    pub fn start(&self) -> &[u8] {
        &self.start
    }

    pub fn end(&self) -> Option<&[u8]> {
        self.end.as_deref()
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        key >= self.start.as_slice() && self.end.as_deref().map_or(true, |end| key < end)
    }
}

/// Smallest key greater than every key with this prefix.
///
/// Trailing 0xFF bytes are dropped and the last remaining byte incremented.
/// A prefix of only 0xFF bytes has no successor.
fn prefix_successor(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last != 0xFF {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

/// Transaction-scoped access to the ordered store.
///
/// One adapter instance serves one statement; it is shared read-only by
/// every cursor in that statement's tree.
pub trait StoreAdapter: Send + Sync {
    /// Up to `limit` entries of `tree` within `range`, in ascending key order
    fn read_range(
        &self,
        tree: &str,
        range: &KeyRange,
        limit: usize,
    ) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>>;

    fn get(&self, tree: &str, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    fn put(&self, tree: &str, key: Vec<u8>, value: Vec<u8>) -> StoreResult<()>;

    /// Returns whether the key was present
    fn delete(&self, tree: &str, key: &[u8]) -> StoreResult<bool>;
}
