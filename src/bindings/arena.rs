//! Arena of nested bindings scopes
//!
//! Scopes are addressed by `BindingsId` handles instead of references, so a
//! cursor can keep the handle of the scope it was opened under while the
//! arena itself is passed `&mut` down the cursor tree on each call.
//! A handle carries the generation of its slot; once a scope is released,
//! old handles to it are rejected rather than silently aliasing a new scope.

use std::fmt;

use crate::types::{Row, Value};

use super::errors::{BindingsError, BindingsResult, SlotKind};

/// Handle to a scope in a `BindingsArena`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingsId {
    index: u32,
    generation: u32,
}

impl fmt::Display for BindingsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

/// One scope of positional bindings.
///
/// Values and rows live in separate namespaces. A lookup only ever consults
/// this scope's own slots; the parent link exists for ancestry tests.
#[derive(Debug, Clone, Default)]
pub struct QueryBindings {
    parent: Option<BindingsId>,
    depth: usize,
    values: Vec<Option<Value>>,
    rows: Vec<Option<Row>>,
}

impl QueryBindings {
    fn child_of(parent: BindingsId, parent_depth: usize) -> Self {
        Self {
            parent: Some(parent),
            depth: parent_depth + 1,
            values: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<BindingsId> {
        self.parent
    }

    /// Number of ancestors
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn set_value(&mut self, slot: usize, value: Value) {
        set_slot(&mut self.values, slot, value);
    }

    pub fn get_value(&self, slot: usize) -> BindingsResult<&Value> {
        self.values
            .get(slot)
            .and_then(Option::as_ref)
            .ok_or(BindingsError::UnboundSlot {
                kind: SlotKind::Value,
                slot,
                depth: self.depth,
            })
    }

    pub fn set_row(&mut self, slot: usize, row: Row) {
        set_slot(&mut self.rows, slot, row);
    }

    pub fn get_row(&self, slot: usize) -> BindingsResult<&Row> {
        self.rows
            .get(slot)
            .and_then(Option::as_ref)
            .ok_or(BindingsError::UnboundSlot {
                kind: SlotKind::Row,
                slot,
                depth: self.depth,
            })
    }
}

fn set_slot<T>(slots: &mut Vec<Option<T>>, slot: usize, item: T) {
    if slots.len() <= slot {
        slots.resize_with(slot + 1, || None);
    }
    slots[slot] = Some(item);
}

#[derive(Debug)]
struct Entry {
    generation: u32,
    scope: Option<QueryBindings>,
}

/// Per-statement store of bindings scopes.
///
/// Created with a single root scope at depth 0. Correlated sub-plans create
/// a child scope per activation and release it when their inner cursor closes.
#[derive(Debug)]
pub struct BindingsArena {
    entries: Vec<Entry>,
    free: Vec<u32>,
}

impl BindingsArena {
    pub fn new() -> Self {
        Self {
            entries: vec![Entry {
                generation: 0,
                scope: Some(QueryBindings::default()),
            }],
            free: Vec::new(),
        }
    }

    /// The statement-level scope
    pub fn root(&self) -> BindingsId {
        BindingsId {
            index: 0,
            generation: 0,
        }
    }

    /// Number of scopes currently alive, root included
    pub fn live_scopes(&self) -> usize {
        self.entries.iter().filter(|e| e.scope.is_some()).count()
    }

    pub fn scope(&self, id: BindingsId) -> BindingsResult<&QueryBindings> {
        self.entries
            .get(id.index as usize)
            .filter(|e| e.generation == id.generation)
            .and_then(|e| e.scope.as_ref())
            .ok_or(BindingsError::StaleScope(id))
    }

    pub fn scope_mut(&mut self, id: BindingsId) -> BindingsResult<&mut QueryBindings> {
        self.entries
            .get_mut(id.index as usize)
            .filter(|e| e.generation == id.generation)
            .and_then(|e| e.scope.as_mut())
            .ok_or(BindingsError::StaleScope(id))
    }

    /// Create a scope nested under `parent`, at depth `parent.depth + 1`
    pub fn create_bindings(&mut self, parent: BindingsId) -> BindingsResult<BindingsId> {
        let parent_depth = self.scope(parent)?.depth();
        let scope = QueryBindings::child_of(parent, parent_depth);

        if let Some(index) = self.free.pop() {
            let entry = &mut self.entries[index as usize];
            entry.scope = Some(scope);
            return Ok(BindingsId {
                index,
                generation: entry.generation,
            });
        }

        let index = self.entries.len() as u32;
        self.entries.push(Entry {
            generation: 0,
            scope: Some(scope),
        });
        Ok(BindingsId {
            index,
            generation: 0,
        })
    }

    pub fn depth(&self, id: BindingsId) -> BindingsResult<usize> {
        Ok(self.scope(id)?.depth())
    }

    /// True if `other` is `id` itself or any transitive parent of `id`
    pub fn is_ancestor(&self, id: BindingsId, other: BindingsId) -> BindingsResult<bool> {
        let mut current = Some(id);
        while let Some(cursor) = current {
            if cursor == other {
                return Ok(true);
            }
            current = self.scope(cursor)?.parent();
        }
        Ok(false)
    }

    pub fn set_value(&mut self, id: BindingsId, slot: usize, value: Value) -> BindingsResult<()> {
        self.scope_mut(id)?.set_value(slot, value);
        Ok(())
    }

    pub fn get_value(&self, id: BindingsId, slot: usize) -> BindingsResult<&Value> {
        self.scope(id)?.get_value(slot)
    }

    pub fn set_row(&mut self, id: BindingsId, slot: usize, row: Row) -> BindingsResult<()> {
        self.scope_mut(id)?.set_row(slot, row);
        Ok(())
    }

    pub fn get_row(&self, id: BindingsId, slot: usize) -> BindingsResult<&Row> {
        self.scope(id)?.get_row(slot)
    }

    /// Discard a scope and every scope nested under it.
    ///
    /// Handles to released scopes become stale.
    pub fn release(&mut self, id: BindingsId) -> BindingsResult<()> {
        if id == self.root() {
            return Err(BindingsError::RootRelease);
        }
        self.scope(id)?;

        let doomed: Vec<u32> = (0..self.entries.len() as u32)
            .filter(|&index| {
                let entry = &self.entries[index as usize];
                entry.scope.is_some()
                    && self
                        .is_ancestor(
                            BindingsId {
                                index,
                                generation: entry.generation,
                            },
                            id,
                        )
                        .unwrap_or(false)
            })
            .collect();

        for index in doomed {
            let entry = &mut self.entries[index as usize];
            entry.scope = None;
            entry.generation = entry.generation.wrapping_add(1);
            self.free.push(index);
        }
        Ok(())
    }
}

impl Default for BindingsArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_scope() {
        let arena = BindingsArena::new();
        let root = arena.root();
        assert_eq!(arena.depth(root).unwrap(), 0);
        assert!(arena.is_ancestor(root, root).unwrap());
        assert_eq!(arena.live_scopes(), 1);
    }

    #[test]
    fn test_value_and_row_namespaces_are_separate() {
        use crate::types::RowType;

        let mut arena = BindingsArena::new();
        let root = arena.root();
        arena.set_value(root, 0, Value::Int(5)).unwrap();

        let err = arena.get_row(root, 0).unwrap_err();
        assert_eq!(
            err,
            BindingsError::UnboundSlot {
                kind: SlotKind::Row,
                slot: 0,
                depth: 0
            }
        );

        let row = Row::new(RowType::new(1, "t", 1), vec![Value::Int(9)]);
        arena.set_row(root, 0, row.clone()).unwrap();
        assert_eq!(arena.get_row(root, 0).unwrap(), &row);
        assert_eq!(arena.get_value(root, 0).unwrap(), &Value::Int(5));
    }

    #[test]
    fn test_sparse_slots() {
        let mut arena = BindingsArena::new();
        let root = arena.root();
        arena.set_value(root, 7, Value::from("x")).unwrap();
        assert!(arena.get_value(root, 3).is_err());
        assert_eq!(arena.get_value(root, 7).unwrap(), &Value::from("x"));
    }

    #[test]
    fn test_release_makes_handles_stale() {
        let mut arena = BindingsArena::new();
        let root = arena.root();
        let child = arena.create_bindings(root).unwrap();
        let grandchild = arena.create_bindings(child).unwrap();
        assert_eq!(arena.live_scopes(), 3);

        arena.release(child).unwrap();
        assert_eq!(arena.live_scopes(), 1);
        assert_eq!(arena.scope(child).unwrap_err(), BindingsError::StaleScope(child));
        assert!(arena.scope(grandchild).is_err());

        // Slot reuse must not revive the old handle
        let reused = arena.create_bindings(root).unwrap();
        assert_ne!(reused, child);
        assert!(arena.scope(child).is_err());
        assert!(arena.scope(reused).is_ok());
    }

    #[test]
    fn test_root_cannot_be_released() {
        let mut arena = BindingsArena::new();
        let root = arena.root();
        assert_eq!(arena.release(root), Err(BindingsError::RootRelease));
    }

    #[test]
    fn test_siblings_are_not_ancestors() {
        let mut arena = BindingsArena::new();
        let root = arena.root();
        let a = arena.create_bindings(root).unwrap();
        let b = arena.create_bindings(root).unwrap();
        assert!(!arena.is_ancestor(a, b).unwrap());
        assert!(!arena.is_ancestor(b, a).unwrap());
        assert!(arena.is_ancestor(a, root).unwrap());
    }
}
