//! Hierarchical row key

use std::fmt;

use crate::types::Value;

/// One level of an HKey: the table ordinal and that table's primary-key values
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HKeySegment {
    pub ordinal: u32,
    pub values: Vec<Value>,
}

impl HKeySegment {
    pub fn new(ordinal: u32, values: Vec<Value>) -> Self {
        Self { ordinal, values }
    }
}

/// A row's path from the group root down to the row itself.
///
/// Ordering is lexicographic over segments, and a key sorts directly before
/// its descendants. `codec::pack` preserves this order byte for byte, which
/// is what lets one range scan of a group visit parents before children.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HKey {
    segments: Vec<HKeySegment>,
}

impl HKey {
    /// HKey of a group root row
    pub fn root(ordinal: u32, values: Vec<Value>) -> Self {
        Self {
            segments: vec![HKeySegment::new(ordinal, values)],
        }
    }

    pub fn from_segments(segments: Vec<HKeySegment>) -> Self {
        Self { segments }
    }

    /// HKey of a child row of the row identified by `self`
    pub fn extend(&self, ordinal: u32, values: Vec<Value>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(HKeySegment::new(ordinal, values));
        Self { segments }
    }

    pub fn segments(&self) -> &[HKeySegment] {
        &self.segments
    }

    /// Number of levels, 1 for a root row
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Ordinal of the table the row belongs to
    pub fn ordinal(&self) -> Option<u32> {
        self.segments.last().map(|s| s.ordinal)
    }

    /// The first `depth` levels, if this key has that many
    pub fn prefix(&self, depth: usize) -> Option<HKey> {
        if depth == 0 || depth > self.segments.len() {
            return None;
        }
        Some(Self {
            segments: self.segments[..depth].to_vec(),
        })
    }

    /// HKey of the parent row, `None` for a root
    pub fn parent(&self) -> Option<HKey> {
        self.prefix(self.segments.len().saturating_sub(1))
    }

    /// True if `self` is a proper prefix of `other`
    pub fn is_ancestor_of(&self, other: &HKey) -> bool {
        self.segments.len() < other.segments.len()
            && other.segments[..self.segments.len()] == self.segments[..]
    }

    /// True if `self` is the immediate parent of `other`
    pub fn is_parent_of(&self, other: &HKey) -> bool {
        self.segments.len() + 1 == other.segments.len() && self.is_ancestor_of(other)
    }
}

impl fmt::Display for HKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", segment.ordinal)?;
            for value in &segment.values {
                write!(f, ",{}", value)?;
            }
        }
        write!(f, "}}")
    }
}
