//! The node store.
//!
//! Nodes live in a dense slot array; freed slots queue in a min-heap so the
//! smallest free slot is always reused first. A hash table maps user ids to
//! slots. Each record carries the per-type adjacency chain heads and cached
//! degree counters maintained by the edge store.

use smallvec::SmallVec;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use trellis_common::collections::{fx_map, FxHashMap};
use trellis_common::types::{AttributeValue, EdgeId, EdgeTypeId, HashableValue, NodeId};

type HeadTable = SmallVec<[EdgeId; 2]>;
type DegreeTable = SmallVec<[u32; 2]>;

/// A node record: user id, adjacency chain heads per edge type, cached
/// degrees and the attribute array.
#[derive(Debug)]
pub struct NodeRecord {
    pub(crate) id: HashableValue,
    pub(crate) store_id: NodeId,
    pub(crate) out_head: HeadTable,
    pub(crate) in_head: HeadTable,
    pub(crate) undirected_head: HeadTable,
    pub(crate) out_degree: DegreeTable,
    pub(crate) in_degree: DegreeTable,
    pub(crate) undirected_degree: DegreeTable,
    pub(crate) self_loop_head: EdgeId,
    pub(crate) self_loop_count: u32,
    pub(crate) mutual_count: u32,
    pub(crate) attributes: Vec<AttributeValue>,
}

impl NodeRecord {
    fn new(id: HashableValue, store_id: NodeId, type_capacity: usize) -> Self {
        let mut record = Self {
            id,
            store_id,
            out_head: HeadTable::new(),
            in_head: HeadTable::new(),
            undirected_head: HeadTable::new(),
            out_degree: DegreeTable::new(),
            in_degree: DegreeTable::new(),
            undirected_degree: DegreeTable::new(),
            self_loop_head: EdgeId::NULL,
            self_loop_count: 0,
            mutual_count: 0,
            attributes: Vec::new(),
        };
        record.ensure_type_capacity(type_capacity);
        record
    }

    /// The node's user id.
    #[must_use]
    pub fn user_id(&self) -> &AttributeValue {
        self.id.as_value()
    }

    /// The node's slot id.
    #[must_use]
    pub fn store_id(&self) -> NodeId {
        self.store_id
    }

    /// Grows the per-type head and degree tables to cover `capacity` types.
    pub(crate) fn ensure_type_capacity(&mut self, capacity: usize) {
        while self.out_head.len() < capacity {
            self.out_head.push(EdgeId::NULL);
            self.in_head.push(EdgeId::NULL);
            self.undirected_head.push(EdgeId::NULL);
            self.out_degree.push(0);
            self.in_degree.push(0);
            self.undirected_degree.push(0);
        }
    }

    pub(crate) fn out_head(&self, ty: EdgeTypeId) -> EdgeId {
        self.out_head.get(ty.index()).copied().unwrap_or(EdgeId::NULL)
    }

    pub(crate) fn in_head(&self, ty: EdgeTypeId) -> EdgeId {
        self.in_head.get(ty.index()).copied().unwrap_or(EdgeId::NULL)
    }

    pub(crate) fn undirected_head(&self, ty: EdgeTypeId) -> EdgeId {
        self.undirected_head
            .get(ty.index())
            .copied()
            .unwrap_or(EdgeId::NULL)
    }

    /// Out-degree for one edge type (directed chains only).
    #[must_use]
    pub fn out_degree_of(&self, ty: EdgeTypeId) -> u32 {
        self.out_degree.get(ty.index()).copied().unwrap_or(0)
    }

    /// In-degree for one edge type (directed chains only).
    #[must_use]
    pub fn in_degree_of(&self, ty: EdgeTypeId) -> u32 {
        self.in_degree.get(ty.index()).copied().unwrap_or(0)
    }

    /// Undirected degree for one edge type (undirected chains only).
    #[must_use]
    pub fn undirected_degree_of(&self, ty: EdgeTypeId) -> u32 {
        self.undirected_degree.get(ty.index()).copied().unwrap_or(0)
    }

    /// Total degree: every incident edge counted once, self-loops once.
    #[must_use]
    pub fn degree(&self) -> u32 {
        let directed: u32 = self.out_degree.iter().chain(self.in_degree.iter()).sum();
        let undirected: u32 = self.undirected_degree.iter().sum();
        directed + undirected + self.self_loop_count
    }

    /// Out-degree: directed out edges, undirected edges and self-loops.
    #[must_use]
    pub fn out_degree(&self) -> u32 {
        let out: u32 = self.out_degree.iter().sum();
        let undirected: u32 = self.undirected_degree.iter().sum();
        out + undirected + self.self_loop_count
    }

    /// In-degree: directed in edges, undirected edges and self-loops.
    #[must_use]
    pub fn in_degree(&self) -> u32 {
        let inc: u32 = self.in_degree.iter().sum();
        let undirected: u32 = self.undirected_degree.iter().sum();
        inc + undirected + self.self_loop_count
    }

    /// Degree in the undirected sense: a mutual pair of directed edges
    /// counts once, a self-loop counts once.
    #[must_use]
    pub fn undirected_degree(&self) -> u32 {
        self.degree() - self.mutual_count
    }

    /// Number of self-loops on this node.
    #[must_use]
    pub fn self_loop_count(&self) -> u32 {
        self.self_loop_count
    }

    /// Number of mutual directed-edge pairs incident to this node.
    #[must_use]
    pub fn mutual_count(&self) -> u32 {
        self.mutual_count
    }
}

/// Dense slot store for nodes.
pub struct NodeStore {
    slots: Vec<Option<NodeRecord>>,
    garbage: BinaryHeap<Reverse<u32>>,
    id_map: FxHashMap<HashableValue, NodeId>,
}

impl NodeStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            garbage: BinaryHeap::new(),
            id_map: fx_map(),
        }
    }

    /// Adds a node under a user id, assigning the smallest free slot.
    /// Returns `None` if the id is already taken (no mutation).
    pub(crate) fn add(&mut self, id: HashableValue, type_capacity: usize) -> Option<NodeId> {
        if self.id_map.contains_key(&id) {
            return None;
        }
        let slot = match self.garbage.pop() {
            Some(Reverse(slot)) => NodeId::new(slot),
            None => {
                self.slots.push(None);
                NodeId::new((self.slots.len() - 1) as u32)
            }
        };
        self.id_map.insert(id.clone(), slot);
        self.slots[slot.index()] = Some(NodeRecord::new(id, slot, type_capacity));
        Some(slot)
    }

    /// Removes a node, freeing its slot. The caller must have removed every
    /// incident edge first.
    pub(crate) fn remove(&mut self, id: NodeId) -> Option<NodeRecord> {
        let record = self.slots.get_mut(id.index())?.take()?;
        debug_assert_eq!(record.store_id, id);
        debug_assert_eq!(record.degree(), 0, "node removed with live edges");
        self.id_map.remove(&record.id);
        self.garbage.push(Reverse(id.0));
        Some(record)
    }

    /// Resolves a user id to its slot.
    #[must_use]
    pub fn get(&self, id: &HashableValue) -> Option<NodeId> {
        self.id_map.get(id).copied()
    }

    /// The record at a slot, if live.
    #[must_use]
    pub fn record(&self, id: NodeId) -> Option<&NodeRecord> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn record_mut(&mut self, id: NodeId) -> Option<&mut NodeRecord> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// `true` if the slot holds a live node.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        !id.is_null() && self.record(id).is_some()
    }

    /// Number of live nodes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.id_map.len()
    }

    /// Length of the slot array (live + freed slots).
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Iterates live records in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &NodeRecord> {
        self.slots.iter().flatten()
    }

    /// The first live slot at or after `from`, for restart-safe walkers.
    #[must_use]
    pub(crate) fn next_live_from(&self, from: u32) -> Option<NodeId> {
        self.slots
            .get(from as usize..)?
            .iter()
            .position(Option::is_some)
            .map(|offset| NodeId::new(from + offset as u32))
    }

    /// Drops every node and recycles nothing: the store starts fresh.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.garbage.clear();
        self.id_map.clear();
    }
}

impl Default for NodeStore {
    fn default() -> Self {
        Self::new()
    }
}
