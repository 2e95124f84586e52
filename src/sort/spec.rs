//! Sort specification types

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One ordering column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKeySpec {
    pub column: usize,
    pub direction: SortDirection,
}

/// Ordered list of sort columns, most significant first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    keys: Vec<SortKeySpec>,
}

impl SortSpec {
    pub fn new(keys: Vec<SortKeySpec>) -> Self {
        Self { keys }
    }

    /// Ascending on a single column
    pub fn asc(column: usize) -> Self {
        Self::new(vec![SortKeySpec {
            column,
            direction: SortDirection::Asc,
        }])
    }

    /// Descending on a single column
    pub fn desc(column: usize) -> Self {
        Self::new(vec![SortKeySpec {
            column,
            direction: SortDirection::Desc,
        }])
    }

    pub fn then_asc(mut self, column: usize) -> Self {
        self.keys.push(SortKeySpec {
            column,
            direction: SortDirection::Asc,
        });
        self
    }

    pub fn then_desc(mut self, column: usize) -> Self {
        self.keys.push(SortKeySpec {
            column,
            direction: SortDirection::Desc,
        });
        self
    }

    pub fn keys(&self) -> &[SortKeySpec] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            let dir = match key.direction {
                SortDirection::Asc => "ASC",
                SortDirection::Desc => "DESC",
            };
            write!(f, "${} {}", key.column, dir)?;
        }
        Ok(())
    }
}

/// What happens to rows with equal sort keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    /// Keep every row; equal keys stay in input order
    PreserveDuplicates,
    /// Emit one row per distinct row value
    SuppressDuplicates,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::PreserveDuplicates => "PRESERVE_DUPLICATES",
            SortMode::SuppressDuplicates => "SUPPRESS_DUPLICATES",
        }
    }
}
