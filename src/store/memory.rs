//! In-process ordered store
//!
//! A `BTreeMap` per tree behind one `RwLock`. Serves as the store for tests,
//! the CLI and embedders that keep a group entirely in memory.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::hkey::{self, HKey};
use crate::types::{write_values, DefaultTypes, Row, ValueSerializer};

use super::adapter::{KeyRange, StoreAdapter};
use super::errors::{StoreError, StoreResult};
use super::group::GroupSchema;

type Tree = BTreeMap<Vec<u8>, Vec<u8>>;

pub struct MemoryStore {
    trees: RwLock<BTreeMap<String, Tree>>,
    serializer: Arc<dyn ValueSerializer>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_serializer(Arc::new(DefaultTypes))
    }

    pub fn with_serializer(serializer: Arc<dyn ValueSerializer>) -> Self {
        Self {
            trees: RwLock::new(BTreeMap::new()),
            serializer,
            unavailable: AtomicBool::new(false),
        }
    }

    /// Create the tree backing `group` if it does not exist yet
    pub fn register_group(&self, group: &GroupSchema) -> StoreResult<()> {
        self.write()?.entry(group.tree().to_string()).or_default();
        Ok(())
    }

    /// Store `row` under `parent` and return its hkey.
    ///
    /// The parent row is not required to exist, which is how orphaned
    /// children end up in a group.
    pub fn insert_row(
        &self,
        group: &GroupSchema,
        parent: Option<&HKey>,
        row: &Row,
    ) -> StoreResult<HKey> {
        let hkey = group.hkey_for(row, parent)?;
        let mut value = Vec::new();
        write_values(self.serializer.as_ref(), row.values(), &mut value);
        self.put(group.tree(), hkey::pack(&hkey), value)?;
        Ok(hkey)
    }

    /// Remove the row stored at `hkey`. Descendants stay.
    pub fn delete_row(&self, group: &GroupSchema, hkey: &HKey) -> StoreResult<bool> {
        self.delete(group.tree(), &hkey::pack(hkey))
    }

    /// Number of entries in `tree`
    pub fn entry_count(&self, tree: &str) -> StoreResult<usize> {
        Ok(self.read()?.get(tree).map_or(0, |t| t.len()))
    }

    /// Make every subsequent call fail with `Unavailable` (failure injection)
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("store marked unavailable".into()));
        }
        Ok(())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, BTreeMap<String, Tree>>> {
        self.check_available()?;
        self.trees
            .read()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, BTreeMap<String, Tree>>> {
        self.check_available()?;
        self.trees
            .write()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreAdapter for MemoryStore {
    fn read_range(
        &self,
        tree: &str,
        range: &KeyRange,
        limit: usize,
    ) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let trees = self.read()?;
        let entries = trees
            .get(tree)
            .ok_or_else(|| StoreError::UnknownTree(tree.to_string()))?;
        let upper = match range.end() {
            Some(end) => Bound::Excluded(end.to_vec()),
            None => Bound::Unbounded,
        };
        if let Some(end) = range.end() {
            if end <= range.start() {
                return Ok(Vec::new());
            }
        }
        Ok(entries
            .range((Bound::Included(range.start().to_vec()), upper))
            .take(limit)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn get(&self, tree: &str, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        let trees = self.read()?;
        let entries = trees
            .get(tree)
            .ok_or_else(|| StoreError::UnknownTree(tree.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, tree: &str, key: Vec<u8>, value: Vec<u8>) -> StoreResult<()> {
        let mut trees = self.write()?;
        let entries = trees
            .get_mut(tree)
            .ok_or_else(|| StoreError::UnknownTree(tree.to_string()))?;
        entries.insert(key, value);
        Ok(())
    }

    fn delete(&self, tree: &str, key: &[u8]) -> StoreResult<bool> {
        let mut trees = self.write()?;
        let entries = trees
            .get_mut(tree)
            .ok_or_else(|| StoreError::UnknownTree(tree.to_string()))?;
        Ok(entries.remove(key).is_some())
    }
}
