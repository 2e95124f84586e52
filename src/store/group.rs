//! Group layout: which tables are interleaved in one tree and how
//!
//! Every table in a group has an ordinal that is unique within the group and
//! a parent table (none for the root). A row's hkey is its parent's hkey
//! extended by `(ordinal, primary key values)`.

use std::sync::Arc;

use crate::hkey::HKey;
use crate::types::{Row, RowType};

use super::errors::{StoreError, StoreResult};

#[derive(Debug, Clone)]
pub struct TableDef {
    row_type: Arc<RowType>,
    ordinal: u32,
    parent: Option<u32>,
    pk_columns: Vec<usize>,
}

impl TableDef {
    pub fn row_type(&self) -> &Arc<RowType> {
        &self.row_type
    }

    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    pub fn parent(&self) -> Option<u32> {
        self.parent
    }

    pub fn pk_columns(&self) -> &[usize] {
        &self.pk_columns
    }
}

/// Tables sharing one physical tree
#[derive(Debug, Clone)]
pub struct GroupSchema {
    name: String,
    tables: Vec<TableDef>,
}

impl GroupSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
        }
    }

    /// Add a table. `row_type` must carry a table ordinal; `parent` names the
    /// parent table's ordinal and must already be present.
    pub fn with_table(
        mut self,
        row_type: Arc<RowType>,
        parent: Option<u32>,
        pk_columns: Vec<usize>,
    ) -> StoreResult<Self> {
        let ordinal = row_type.table_ordinal().ok_or_else(|| {
            StoreError::InvalidRow(format!("row type {} is not a table", row_type.name()))
        })?;
        if self.table(ordinal).is_some() {
            return Err(StoreError::InvalidRow(format!(
                "duplicate table ordinal {} in group {}",
                ordinal, self.name
            )));
        }
        if let Some(p) = parent {
            if self.table(p).is_none() {
                return Err(StoreError::InvalidRow(format!(
                    "parent ordinal {} not in group {}",
                    p, self.name
                )));
            }
        }
        if pk_columns.iter().any(|&c| c >= row_type.arity()) {
            return Err(StoreError::InvalidRow(format!(
                "primary key column out of range for {}",
                row_type.name()
            )));
        }
        self.tables.push(TableDef {
            row_type,
            ordinal,
            parent,
            pk_columns,
        });
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the physical tree holding the group
    pub fn tree(&self) -> &str {
        &self.name
    }

    pub fn tables(&self) -> &[TableDef] {
        &self.tables
    }

    pub fn table(&self, ordinal: u32) -> Option<&TableDef> {
        self.tables.iter().find(|t| t.ordinal == ordinal)
    }

    /// Number of hkey segments of a row in table `ordinal`
    pub fn depth_of(&self, ordinal: u32) -> Option<usize> {
        let mut depth = 0;
        let mut current = Some(ordinal);
        while let Some(o) = current {
            current = self.table(o)?.parent;
            depth += 1;
        }
        Some(depth)
    }

    /// HKey for `row` stored under `parent`.
    ///
    /// The parent hkey must end in the table's parent ordinal; it does not
    /// need to exist in the store.
    pub fn hkey_for(&self, row: &Row, parent: Option<&HKey>) -> StoreResult<HKey> {
        let ordinal = row.row_type().table_ordinal().ok_or_else(|| {
            StoreError::InvalidRow(format!("row type {} is not a table", row.row_type().name()))
        })?;
        let table = self.table(ordinal).ok_or_else(|| {
            StoreError::InvalidRow(format!("ordinal {} not in group {}", ordinal, self.name))
        })?;
        let pk = table
            .pk_columns
            .iter()
            .map(|&c| {
                row.value(c).cloned().ok_or_else(|| {
                    StoreError::InvalidRow(format!("{} has no column {}", row.row_type().name(), c))
                })
            })
            .collect::<StoreResult<Vec<_>>>()?;
        match (table.parent, parent) {
            (None, None) => Ok(HKey::root(ordinal, pk)),
            (Some(expected), Some(p)) if p.ordinal() == Some(expected) => Ok(p.extend(ordinal, pk)),
            (expected, given) => Err(StoreError::InvalidRow(format!(
                "table {} expects parent {:?}, got {}",
                table.row_type.name(),
                expected,
                given.map_or_else(|| "none".to_string(), |h| h.to_string())
            ))),
        }
    }
}
