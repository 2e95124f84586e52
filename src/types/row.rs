//! Row shapes and rows
//!
//! A `RowType` is the optimizer's row-shape descriptor reduced to what the
//! runtime needs: identity, arity, and (for group table rows) the table
//! ordinal that appears in HKey segments.

use std::fmt;
use std::sync::Arc;

use crate::hkey::HKey;

use super::value::Value;

/// Row-shape descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowType {
    id: u32,
    name: String,
    arity: usize,
    table_ordinal: Option<u32>,
}

impl RowType {
    /// A derived row type (projection, values scan, flatten output)
    pub fn new(id: u32, name: impl Into<String>, arity: usize) -> Arc<Self> {
        Arc::new(Self {
            id,
            name: name.into(),
            arity,
            table_ordinal: None,
        })
    }

    /// The row type of a group table
    pub fn table(id: u32, name: impl Into<String>, arity: usize, ordinal: u32) -> Arc<Self> {
        Arc::new(Self {
            id,
            name: name.into(),
            arity,
            table_ordinal: Some(ordinal),
        })
    }

    /// Row type of a flattened parent/child row: parent fields followed by child fields
    pub fn flattened(id: u32, parent: &RowType, child: &RowType) -> Arc<Self> {
        Arc::new(Self {
            id,
            name: format!("flatten({}, {})", parent.name, child.name),
            arity: parent.arity + child.arity,
            table_ordinal: None,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn table_ordinal(&self) -> Option<u32> {
        self.table_ordinal
    }
}

impl fmt::Display for RowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}

/// A row flowing between cursors.
///
/// `hkey` is set for rows read from group storage. `ancestor` and `child`
/// carry the hierarchical linkage observed by a group scan: `ancestor` is
/// `None` for roots and orphans, `child` is `None` when no direct child
/// followed the row in the scan.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    row_type: Arc<RowType>,
    values: Vec<Value>,
    hkey: Option<HKey>,
    ancestor: Option<HKey>,
    child: Option<HKey>,
}

impl Row {
    pub fn new(row_type: Arc<RowType>, values: Vec<Value>) -> Self {
        Self {
            row_type,
            values,
            hkey: None,
            ancestor: None,
            child: None,
        }
    }

    pub fn with_hkey(mut self, hkey: HKey) -> Self {
        self.hkey = Some(hkey);
        self
    }

    pub fn with_ancestor(mut self, ancestor: Option<HKey>) -> Self {
        self.ancestor = ancestor;
        self
    }

    pub fn with_child(mut self, child: Option<HKey>) -> Self {
        self.child = child;
        self
    }

    pub fn row_type(&self) -> &Arc<RowType> {
        &self.row_type
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn hkey(&self) -> Option<&HKey> {
        self.hkey.as_ref()
    }

    pub fn ancestor(&self) -> Option<&HKey> {
        self.ancestor.as_ref()
    }

    pub fn child(&self) -> Option<&HKey> {
        self.child.as_ref()
    }

    /// True for a non-root group row whose parent was not observed
    pub fn is_orphan(&self) -> bool {
        match &self.hkey {
            Some(hkey) => hkey.depth() > 1 && self.ancestor.is_none(),
            None => false,
        }
    }

    /// Whether this row is of the given type
    pub fn is_type(&self, row_type: &RowType) -> bool {
        self.row_type.id() == row_type.id()
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.row_type.name())?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, ")")
    }
}
