//! Edge type interning.
//!
//! User-chosen type labels (any hashable value) are interned to dense
//! [`EdgeTypeId`]s. Ids are recycled through a min-heap free list, and each
//! type tracks how many live edges carry it.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use trellis_common::collections::{fx_map, FxHashMap};
use trellis_common::error::{GraphError, Result};
use trellis_common::types::{AttributeValue, EdgeTypeId, HashableValue};

#[derive(Debug)]
struct TypeEntry {
    label: HashableValue,
    count: usize,
}

/// Interned edge type labels with per-type edge counts.
pub struct EdgeTypeStore {
    slots: Vec<Option<TypeEntry>>,
    garbage: BinaryHeap<Reverse<u32>>,
    label_map: FxHashMap<HashableValue, EdgeTypeId>,
}

impl EdgeTypeStore {
    /// Creates a store holding only the default type.
    #[must_use]
    pub fn new() -> Self {
        let mut store = Self {
            slots: Vec::new(),
            garbage: BinaryHeap::new(),
            label_map: fx_map(),
        };
        let id = store.get_or_create(AttributeValue::Null);
        debug_assert_eq!(id, EdgeTypeId::DEFAULT);
        store
    }

    /// Interns a label, returning its id. The same label always maps to the
    /// same id while it stays interned.
    pub fn get_or_create(&mut self, label: impl Into<AttributeValue>) -> EdgeTypeId {
        let key = HashableValue::new(label.into());
        if let Some(id) = self.label_map.get(&key) {
            return *id;
        }
        let id = match self.garbage.pop() {
            Some(Reverse(slot)) => EdgeTypeId::new(slot),
            None => {
                self.slots.push(None);
                EdgeTypeId::new((self.slots.len() - 1) as u32)
            }
        };
        self.slots[id.index()] = Some(TypeEntry {
            label: key.clone(),
            count: 0,
        });
        self.label_map.insert(key, id);
        id
    }

    /// Looks up the id of an interned label.
    #[must_use]
    pub fn get(&self, label: &AttributeValue) -> Option<EdgeTypeId> {
        self.label_map
            .get(&HashableValue::new(label.clone()))
            .copied()
    }

    /// The label interned under an id.
    #[must_use]
    pub fn label(&self, id: EdgeTypeId) -> Option<&AttributeValue> {
        self.slots
            .get(id.index())
            .and_then(Option::as_ref)
            .map(|e| e.label.as_value())
    }

    /// `true` if the id refers to an interned type.
    #[must_use]
    pub fn contains(&self, id: EdgeTypeId) -> bool {
        !id.is_null() && self.slots.get(id.index()).is_some_and(Option::is_some)
    }

    /// Live edge count for a type.
    #[must_use]
    pub fn count(&self, id: EdgeTypeId) -> usize {
        self.slots
            .get(id.index())
            .and_then(Option::as_ref)
            .map_or(0, |e| e.count)
    }

    /// Removes an interned type and recycles its id.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] if the id is unknown;
    /// [`GraphError::Unsupported`] while edges of this type remain, or for
    /// the default type.
    pub fn remove_type(&mut self, id: EdgeTypeId) -> Result<()> {
        if id == EdgeTypeId::DEFAULT {
            return Err(GraphError::Unsupported("the default edge type cannot be removed"));
        }
        let entry = self
            .slots
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(GraphError::NotOwned)?;
        if entry.count > 0 {
            return Err(GraphError::Unsupported("edge type still has live edges"));
        }
        let entry = self.slots[id.index()].take().expect("checked above");
        self.label_map.remove(&entry.label);
        self.garbage.push(Reverse(id.0));
        Ok(())
    }

    /// Number of interned types.
    #[must_use]
    pub fn size(&self) -> usize {
        self.label_map.len()
    }

    /// Upper bound of assigned type slots; per-node adjacency head tables
    /// size to this.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn increment(&mut self, id: EdgeTypeId) {
        if let Some(Some(entry)) = self.slots.get_mut(id.index()) {
            entry.count += 1;
        }
    }

    pub(crate) fn decrement(&mut self, id: EdgeTypeId) {
        if let Some(Some(entry)) = self.slots.get_mut(id.index()) {
            debug_assert!(entry.count > 0);
            entry.count -= 1;
        }
    }

    /// Resets all per-type counts to zero, keeping the interned labels.
    pub(crate) fn reset_counts(&mut self) {
        for entry in self.slots.iter_mut().flatten() {
            entry.count = 0;
        }
    }
}

impl Default for EdgeTypeStore {
    fn default() -> Self {
        Self::new()
    }
}
