//! The edge store.
//!
//! Edges live in a dense slot array like nodes, but each record also carries
//! the adjacency linkage: two (prev, next) pairs of edge slot ids threading
//! the record into its endpoints' chains. For a directed edge the source
//! pair threads the source's out-chain and the target pair the target's
//! in-chain (one chain per edge type); for an undirected edge the pairs
//! thread the undirected chains at each endpoint. Chains are LIFO: the head
//! is the most recently added edge.
//!
//! Self-loops are kept out of those chains entirely - they live in a
//! per-node singly-linked self-loop chain plus a global set - so neighbor
//! iteration never sees the same edge twice.
//!
//! The parallel-edge table maps `(source, target, type)` - sorted endpoints
//! for undirected edges - to the unique edge carrying that key. It rejects
//! duplicates and answers mutual-edge lookups.

use super::node::{NodeRecord, NodeStore};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use trellis_common::collections::{fx_map, fx_set, FxHashMap, FxHashSet};
use trellis_common::types::{AttributeValue, EdgeId, EdgeTypeId, HashableValue, NodeId};

/// Which chain of a node an operation walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChainKind {
    Out,
    In,
    Undirected,
}

/// Key of the parallel-edge table. Undirected edges store the smaller
/// endpoint first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct EdgeKey {
    source: NodeId,
    target: NodeId,
    ty: EdgeTypeId,
}

fn edge_key(source: NodeId, target: NodeId, ty: EdgeTypeId, directed: bool) -> EdgeKey {
    if directed || source <= target {
        EdgeKey { source, target, ty }
    } else {
        EdgeKey {
            source: target,
            target: source,
            ty,
        }
    }
}

/// An edge record: endpoints, type, direction, chain links and attributes.
#[derive(Debug)]
pub struct EdgeRecord {
    pub(crate) id: HashableValue,
    pub(crate) store_id: EdgeId,
    pub(crate) source: NodeId,
    pub(crate) target: NodeId,
    pub(crate) type_id: EdgeTypeId,
    pub(crate) directed: bool,
    source_prev: EdgeId,
    source_next: EdgeId,
    target_prev: EdgeId,
    target_next: EdgeId,
    self_loop_next: EdgeId,
    pub(crate) attributes: Vec<AttributeValue>,
}

impl EdgeRecord {
    /// The edge's user id.
    #[must_use]
    pub fn user_id(&self) -> &AttributeValue {
        self.id.as_value()
    }

    /// The edge's slot id.
    #[must_use]
    pub fn store_id(&self) -> EdgeId {
        self.store_id
    }

    /// Source node slot.
    #[must_use]
    pub fn source(&self) -> NodeId {
        self.source
    }

    /// Target node slot.
    #[must_use]
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// The edge type id.
    #[must_use]
    pub fn type_id(&self) -> EdgeTypeId {
        self.type_id
    }

    /// `true` for directed edges.
    #[must_use]
    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// `true` when both endpoints are the same node.
    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    /// The endpoint opposite to `node`.
    #[must_use]
    pub fn opposite(&self, node: NodeId) -> NodeId {
        if self.source == node {
            self.target
        } else {
            self.source
        }
    }

    /// `true` if `node` is an endpoint.
    #[must_use]
    pub fn is_incident_to(&self, node: NodeId) -> bool {
        self.source == node || self.target == node
    }

    /// The next link of the node's self-loop chain.
    pub(crate) fn self_loop_next(&self) -> EdgeId {
        self.self_loop_next
    }

    /// The next link of the chain this record occupies at endpoint `node`.
    pub(crate) fn next_at(&self, node: NodeId) -> EdgeId {
        if self.source == node {
            self.source_next
        } else {
            self.target_next
        }
    }

    fn prev_at(&self, node: NodeId) -> EdgeId {
        if self.source == node {
            self.source_prev
        } else {
            self.target_prev
        }
    }

    fn set_next_at(&mut self, node: NodeId, next: EdgeId) {
        if self.source == node {
            self.source_next = next;
        } else {
            self.target_next = next;
        }
    }

    fn set_prev_at(&mut self, node: NodeId, prev: EdgeId) {
        if self.source == node {
            self.source_prev = prev;
        } else {
            self.target_prev = prev;
        }
    }
}

/// Dense slot store for edges, with the adjacency linkage and the
/// parallel-edge table.
pub struct EdgeStore {
    slots: Vec<Option<EdgeRecord>>,
    garbage: BinaryHeap<Reverse<u32>>,
    id_map: FxHashMap<HashableValue, EdgeId>,
    parallel: FxHashMap<EdgeKey, EdgeId>,
    self_loops: FxHashSet<EdgeId>,
    directed_count: usize,
    undirected_count: usize,
}

impl EdgeStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            garbage: BinaryHeap::new(),
            id_map: fx_map(),
            parallel: fx_map(),
            self_loops: fx_set(),
            directed_count: 0,
            undirected_count: 0,
        }
    }

    /// Adds an edge, splicing it into its endpoints' chains.
    ///
    /// Returns `None` without mutating when the user id is taken or an edge
    /// with the same `(source, target, type)` key exists. Endpoint and type
    /// validity are the caller's responsibility.
    pub(crate) fn add(
        &mut self,
        id: HashableValue,
        source: NodeId,
        target: NodeId,
        ty: EdgeTypeId,
        directed: bool,
        nodes: &mut NodeStore,
        type_capacity: usize,
    ) -> Option<EdgeId> {
        if self.id_map.contains_key(&id) {
            return None;
        }
        let key = edge_key(source, target, ty, directed);
        if self.parallel.contains_key(&key) {
            return None;
        }

        let slot = match self.garbage.pop() {
            Some(Reverse(s)) => EdgeId::new(s),
            None => {
                self.slots.push(None);
                EdgeId::new((self.slots.len() - 1) as u32)
            }
        };
        let record = EdgeRecord {
            id: id.clone(),
            store_id: slot,
            source,
            target,
            type_id: ty,
            directed,
            source_prev: EdgeId::NULL,
            source_next: EdgeId::NULL,
            target_prev: EdgeId::NULL,
            target_next: EdgeId::NULL,
            self_loop_next: EdgeId::NULL,
            attributes: Vec::new(),
        };
        self.slots[slot.index()] = Some(record);

        nodes
            .record_mut(source)
            .expect("validated by caller")
            .ensure_type_capacity(type_capacity);
        nodes
            .record_mut(target)
            .expect("validated by caller")
            .ensure_type_capacity(type_capacity);

        if source == target {
            let node = nodes.record_mut(source).expect("validated by caller");
            let head = node.self_loop_head;
            node.self_loop_head = slot;
            node.self_loop_count += 1;
            self.record_mut_internal(slot).self_loop_next = head;
            self.self_loops.insert(slot);
        } else if directed {
            self.link_front(nodes, slot, source, ChainKind::Out, ty);
            self.link_front(nodes, slot, target, ChainKind::In, ty);
            self.adjust_mutual(nodes, source, target, ty, 1);
        } else {
            self.link_front(nodes, slot, source, ChainKind::Undirected, ty);
            self.link_front(nodes, slot, target, ChainKind::Undirected, ty);
        }

        if directed {
            self.directed_count += 1;
        } else {
            self.undirected_count += 1;
        }
        self.parallel.insert(key, slot);
        self.id_map.insert(id, slot);
        Some(slot)
    }

    /// Removes an edge, splicing every chain in O(1) (self-loop chains are
    /// singly linked and spliced in O(loops)).
    pub(crate) fn remove(&mut self, slot: EdgeId, nodes: &mut NodeStore) -> Option<EdgeRecord> {
        // Detach the record first so chain fixups can't alias it.
        let record = self.slots.get_mut(slot.index())?.take()?;
        debug_assert_eq!(record.store_id, slot);

        if record.is_self_loop() {
            let node = nodes.record_mut(record.source).expect("endpoint is live");
            if node.self_loop_head == slot {
                node.self_loop_head = record.self_loop_next;
            } else {
                let mut cursor = node.self_loop_head;
                loop {
                    debug_assert!(!cursor.is_null(), "self-loop chain is consistent");
                    let cursor_record = self.record_mut_internal(cursor);
                    if cursor_record.self_loop_next == slot {
                        cursor_record.self_loop_next = record.self_loop_next;
                        break;
                    }
                    cursor = cursor_record.self_loop_next;
                }
            }
            let node = nodes.record_mut(record.source).expect("endpoint is live");
            node.self_loop_count -= 1;
            self.self_loops.remove(&slot);
        } else if record.directed {
            self.unlink(nodes, &record, record.source, ChainKind::Out, record.type_id);
            self.unlink(nodes, &record, record.target, ChainKind::In, record.type_id);
            self.adjust_mutual(nodes, record.source, record.target, record.type_id, -1);
        } else {
            self.unlink(
                nodes,
                &record,
                record.source,
                ChainKind::Undirected,
                record.type_id,
            );
            self.unlink(
                nodes,
                &record,
                record.target,
                ChainKind::Undirected,
                record.type_id,
            );
        }

        if record.directed {
            self.directed_count -= 1;
        } else {
            self.undirected_count -= 1;
        }
        let key = edge_key(record.source, record.target, record.type_id, record.directed);
        self.parallel.remove(&key);
        self.id_map.remove(&record.id);
        self.garbage.push(Reverse(slot.0));
        Some(record)
    }

    /// Splices `slot` at the front of one chain of `node`.
    fn link_front(
        &mut self,
        nodes: &mut NodeStore,
        slot: EdgeId,
        node: NodeId,
        kind: ChainKind,
        ty: EdgeTypeId,
    ) {
        let node_record = nodes.record_mut(node).expect("validated by caller");
        let head = match kind {
            ChainKind::Out => node_record.out_head(ty),
            ChainKind::In => node_record.in_head(ty),
            ChainKind::Undirected => node_record.undirected_head(ty),
        };
        match kind {
            ChainKind::Out => {
                node_record.out_head[ty.index()] = slot;
                node_record.out_degree[ty.index()] += 1;
            }
            ChainKind::In => {
                node_record.in_head[ty.index()] = slot;
                node_record.in_degree[ty.index()] += 1;
            }
            ChainKind::Undirected => {
                node_record.undirected_head[ty.index()] = slot;
                node_record.undirected_degree[ty.index()] += 1;
            }
        }
        let record = self.record_mut_internal(slot);
        record.set_next_at(node, head);
        record.set_prev_at(node, EdgeId::NULL);
        if !head.is_null() {
            self.record_mut_internal(head).set_prev_at(node, slot);
        }
    }

    /// Splices a detached record out of one chain of `node` using its stored
    /// prev/next links.
    fn unlink(
        &mut self,
        nodes: &mut NodeStore,
        record: &EdgeRecord,
        node: NodeId,
        kind: ChainKind,
        ty: EdgeTypeId,
    ) {
        let prev = record.prev_at(node);
        let next = record.next_at(node);
        if prev.is_null() {
            let node_record = nodes.record_mut(node).expect("endpoint is live");
            match kind {
                ChainKind::Out => node_record.out_head[ty.index()] = next,
                ChainKind::In => node_record.in_head[ty.index()] = next,
                ChainKind::Undirected => node_record.undirected_head[ty.index()] = next,
            }
        } else {
            self.record_mut_internal(prev).set_next_at(node, next);
        }
        if !next.is_null() {
            self.record_mut_internal(next).set_prev_at(node, prev);
        }
        let node_record = nodes.record_mut(node).expect("endpoint is live");
        match kind {
            ChainKind::Out => node_record.out_degree[ty.index()] -= 1,
            ChainKind::In => node_record.in_degree[ty.index()] -= 1,
            ChainKind::Undirected => node_record.undirected_degree[ty.index()] -= 1,
        }
    }

    /// Updates both endpoints' mutual-pair counts when a directed edge
    /// appears or disappears and its reverse exists.
    fn adjust_mutual(
        &mut self,
        nodes: &mut NodeStore,
        source: NodeId,
        target: NodeId,
        ty: EdgeTypeId,
        delta: i32,
    ) {
        let reverse = EdgeKey {
            source: target,
            target: source,
            ty,
        };
        let has_reverse = self
            .parallel
            .get(&reverse)
            .and_then(|&e| self.record(e))
            .is_some_and(EdgeRecord::is_directed);
        if has_reverse {
            for node in [source, target] {
                let record = nodes.record_mut(node).expect("endpoint is live");
                record.mutual_count = record.mutual_count.wrapping_add_signed(delta);
            }
        }
    }

    /// Resolves an edge user id to its slot.
    #[must_use]
    pub fn get(&self, id: &HashableValue) -> Option<EdgeId> {
        self.id_map.get(id).copied()
    }

    /// The record at a slot, if live.
    #[must_use]
    pub fn record(&self, id: EdgeId) -> Option<&EdgeRecord> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn record_mut(&mut self, id: EdgeId) -> Option<&mut EdgeRecord> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    fn record_mut_internal(&mut self, id: EdgeId) -> &mut EdgeRecord {
        self.slots[id.index()].as_mut().expect("chain link points at a live edge")
    }

    /// `true` if the slot holds a live edge.
    #[must_use]
    pub fn contains(&self, id: EdgeId) -> bool {
        !id.is_null() && self.record(id).is_some()
    }

    /// The unique edge from `source` to `target` of the given type: a
    /// directed edge in that orientation, or an undirected edge between the
    /// pair.
    #[must_use]
    pub fn get_between(&self, source: NodeId, target: NodeId, ty: EdgeTypeId) -> Option<EdgeId> {
        if let Some(&slot) = self.parallel.get(&EdgeKey { source, target, ty }) {
            return Some(slot);
        }
        if source > target {
            // Undirected edges store sorted endpoints; a directed hit in
            // the reverse orientation must not count.
            if let Some(&slot) = self.parallel.get(&EdgeKey {
                source: target,
                target: source,
                ty,
            }) {
                if self.record(slot).is_some_and(|r| !r.is_directed()) {
                    return Some(slot);
                }
            }
        }
        None
    }

    /// All edges connecting `source` and `target` of the given type, in
    /// either orientation.
    #[must_use]
    pub fn all_between(&self, source: NodeId, target: NodeId, ty: EdgeTypeId) -> Vec<EdgeId> {
        let mut result = Vec::new();
        if let Some(slot) = self.get_between(source, target, ty) {
            result.push(slot);
        }
        if source != target {
            if let Some(&slot) = self.parallel.get(&EdgeKey {
                source: target,
                target: source,
                ty,
            }) {
                if self.record(slot).is_some_and(EdgeRecord::is_directed) {
                    result.push(slot);
                }
            }
        }
        result
    }

    /// The reverse-direction counterpart of a directed edge, if present.
    #[must_use]
    pub fn mutual(&self, slot: EdgeId) -> Option<EdgeId> {
        let record = self.record(slot)?;
        if !record.directed || record.is_self_loop() {
            return None;
        }
        let reverse = EdgeKey {
            source: record.target,
            target: record.source,
            ty: record.type_id,
        };
        self.parallel
            .get(&reverse)
            .copied()
            .filter(|&e| self.record(e).is_some_and(EdgeRecord::is_directed))
    }

    /// Walks one chain of `node`, front (most recent) first.
    pub(crate) fn collect_chain(&self, node: &NodeRecord, kind: ChainKind, ty: EdgeTypeId) -> Vec<EdgeId> {
        let mut result = Vec::new();
        let mut cursor = match kind {
            ChainKind::Out => node.out_head(ty),
            ChainKind::In => node.in_head(ty),
            ChainKind::Undirected => node.undirected_head(ty),
        };
        while !cursor.is_null() {
            result.push(cursor);
            cursor = self
                .record(cursor)
                .expect("chain link points at a live edge")
                .next_at(node.store_id());
        }
        result
    }

    /// Every edge incident to `node`: out, in and undirected chains across
    /// all types, then self-loops. Each edge appears once.
    pub(crate) fn incident_edges(&self, node: &NodeRecord) -> Vec<EdgeId> {
        let mut result = Vec::with_capacity(node.degree() as usize);
        let type_count = node.out_head.len();
        for ty in (0..type_count).map(|t| EdgeTypeId::new(t as u32)) {
            result.extend(self.collect_chain(node, ChainKind::Out, ty));
            result.extend(self.collect_chain(node, ChainKind::In, ty));
            result.extend(self.collect_chain(node, ChainKind::Undirected, ty));
        }
        result.extend(self.collect_self_loops(node));
        result
    }

    /// Walks the self-loop chain of `node`, front first.
    pub(crate) fn collect_self_loops(&self, node: &NodeRecord) -> Vec<EdgeId> {
        let mut result = Vec::new();
        let mut cursor = node.self_loop_head;
        while !cursor.is_null() {
            result.push(cursor);
            cursor = self
                .record(cursor)
                .expect("chain link points at a live edge")
                .self_loop_next;
        }
        result
    }

    /// All self-loops in the graph.
    pub fn self_loops(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.self_loops.iter().copied()
    }

    /// Number of live edges.
    #[must_use]
    pub fn size(&self) -> usize {
        self.id_map.len()
    }

    /// Number of live directed edges.
    #[must_use]
    pub fn directed_count(&self) -> usize {
        self.directed_count
    }

    /// Number of live undirected edges.
    #[must_use]
    pub fn undirected_count(&self) -> usize {
        self.undirected_count
    }

    /// `true` if every edge is directed (or there are none).
    #[must_use]
    pub fn is_directed_graph(&self) -> bool {
        self.undirected_count == 0
    }

    /// `true` if every edge is undirected (or there are none).
    #[must_use]
    pub fn is_undirected_graph(&self) -> bool {
        self.directed_count == 0
    }

    /// `true` if both directed and undirected edges exist.
    #[must_use]
    pub fn is_mixed_graph(&self) -> bool {
        self.directed_count > 0 && self.undirected_count > 0
    }

    /// Length of the slot array (live + freed slots).
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Iterates live records in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &EdgeRecord> {
        self.slots.iter().flatten()
    }

    /// The first live slot at or after `from`, for restart-safe walkers.
    #[must_use]
    pub(crate) fn next_live_from(&self, from: u32) -> Option<EdgeId> {
        self.slots
            .get(from as usize..)?
            .iter()
            .position(Option::is_some)
            .map(|offset| EdgeId::new(from + offset as u32))
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.garbage.clear();
        self.id_map.clear();
        self.parallel.clear();
        self.self_loops.clear();
        self.directed_count = 0;
        self.undirected_count = 0;
    }
}

impl Default for EdgeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hv(s: &str) -> HashableValue {
        HashableValue::new(AttributeValue::from(s))
    }

    struct Fixture {
        nodes: NodeStore,
        edges: EdgeStore,
    }

    impl Fixture {
        fn new(node_count: usize) -> Self {
            let mut nodes = NodeStore::new();
            for i in 0..node_count {
                nodes.add(hv(&format!("n{i}")), 1).unwrap();
            }
            Self {
                nodes,
                edges: EdgeStore::new(),
            }
        }

        fn add(&mut self, id: &str, s: u32, t: u32, directed: bool) -> Option<EdgeId> {
            self.edges.add(
                hv(id),
                NodeId::new(s),
                NodeId::new(t),
                EdgeTypeId::DEFAULT,
                directed,
                &mut self.nodes,
                1,
            )
        }

        fn node(&self, slot: u32) -> &NodeRecord {
            self.nodes.record(NodeId::new(slot)).unwrap()
        }
    }

    #[test]
    fn test_add_links_chains() {
        let mut fx = Fixture::new(3);
        let e0 = fx.add("e0", 0, 1, true).unwrap();
        let e1 = fx.add("e1", 0, 2, true).unwrap();

        // LIFO: most recent first.
        let out = fx
            .edges
            .collect_chain(fx.node(0), ChainKind::Out, EdgeTypeId::DEFAULT);
        assert_eq!(out, vec![e1, e0]);

        assert_eq!(fx.node(0).out_degree_of(EdgeTypeId::DEFAULT), 2);
        assert_eq!(fx.node(1).in_degree_of(EdgeTypeId::DEFAULT), 1);
        assert_eq!(fx.node(2).in_degree_of(EdgeTypeId::DEFAULT), 1);
    }

    #[test]
    fn test_parallel_edge_rejected() {
        let mut fx = Fixture::new(2);
        assert!(fx.add("e0", 0, 1, true).is_some());
        assert!(fx.add("e1", 0, 1, true).is_none());
        assert_eq!(fx.edges.size(), 1);

        // The reverse orientation is a different key.
        assert!(fx.add("e2", 1, 0, true).is_some());
    }

    #[test]
    fn test_undirected_key_sorts_endpoints() {
        let mut fx = Fixture::new(2);
        assert!(fx.add("e0", 1, 0, false).is_some());
        assert!(fx.add("e1", 0, 1, false).is_none());
        assert_eq!(fx.edges.undirected_count(), 1);

        let e = fx
            .edges
            .get_between(NodeId::new(0), NodeId::new(1), EdgeTypeId::DEFAULT);
        assert!(e.is_some());
        let e = fx
            .edges
            .get_between(NodeId::new(1), NodeId::new(0), EdgeTypeId::DEFAULT);
        assert!(e.is_some());
    }

    #[test]
    fn test_remove_splices_middle_of_chain() {
        let mut fx = Fixture::new(4);
        let e0 = fx.add("e0", 0, 1, true).unwrap();
        let e1 = fx.add("e1", 0, 2, true).unwrap();
        let e2 = fx.add("e2", 0, 3, true).unwrap();

        fx.edges.remove(e1, &mut fx.nodes).unwrap();
        let out = fx
            .edges
            .collect_chain(fx.node(0), ChainKind::Out, EdgeTypeId::DEFAULT);
        assert_eq!(out, vec![e2, e0]);
        assert_eq!(fx.node(0).out_degree_of(EdgeTypeId::DEFAULT), 2);

        fx.edges.remove(e2, &mut fx.nodes).unwrap();
        fx.edges.remove(e0, &mut fx.nodes).unwrap();
        assert_eq!(fx.node(0).degree(), 0);
        assert_eq!(fx.edges.size(), 0);
    }

    #[test]
    fn test_removed_slot_is_reused_smallest_first() {
        let mut fx = Fixture::new(4);
        let e0 = fx.add("e0", 0, 1, true).unwrap();
        let e1 = fx.add("e1", 0, 2, true).unwrap();
        fx.add("e2", 0, 3, true).unwrap();

        fx.edges.remove(e1, &mut fx.nodes).unwrap();
        fx.edges.remove(e0, &mut fx.nodes).unwrap();

        assert_eq!(fx.add("e3", 1, 2, true), Some(EdgeId::new(0)));
        assert_eq!(fx.add("e4", 1, 3, true), Some(EdgeId::new(1)));
        assert_eq!(fx.add("e5", 2, 3, true), Some(EdgeId::new(3)));
    }

    #[test]
    fn test_self_loop_chain_and_counts() {
        let mut fx = Fixture::new(1);
        let e0 = fx.add("e0", 0, 0, true).unwrap();
        assert!(fx.add("e1", 0, 0, true).is_none());

        assert_eq!(fx.edges.self_loops().collect::<Vec<_>>(), vec![e0]);
        let node = fx.node(0);
        assert_eq!(node.self_loop_count(), 1);
        assert_eq!(node.degree(), 1);
        assert_eq!(node.in_degree(), 1);
        assert_eq!(node.out_degree(), 1);
        assert_eq!(node.undirected_degree(), 1);

        // Out/in chains never contain the loop.
        assert!(fx
            .edges
            .collect_chain(node, ChainKind::Out, EdgeTypeId::DEFAULT)
            .is_empty());

        fx.edges.remove(e0, &mut fx.nodes).unwrap();
        assert_eq!(fx.node(0).degree(), 0);
        assert_eq!(fx.edges.self_loops().count(), 0);
    }

    #[test]
    fn test_self_loop_splice_from_middle() {
        let mut nodes = NodeStore::new();
        nodes.add(hv("n0"), 2).unwrap();
        let mut edges = EdgeStore::new();
        let n = NodeId::new(0);
        let t0 = EdgeTypeId::new(0);
        let t1 = EdgeTypeId::new(1);
        let a = edges.add(hv("a"), n, n, t0, true, &mut nodes, 2).unwrap();
        let b = edges.add(hv("b"), n, n, t1, true, &mut nodes, 2).unwrap();

        // Chain is [b, a]; removing a exercises the non-head splice.
        edges.remove(a, &mut nodes).unwrap();
        assert_eq!(
            edges.collect_self_loops(nodes.record(n).unwrap()),
            vec![b]
        );
        assert_eq!(nodes.record(n).unwrap().self_loop_count(), 1);
    }

    #[test]
    fn test_mutual_pair_counting() {
        let mut fx = Fixture::new(2);
        let ab = fx.add("ab", 0, 1, true).unwrap();
        assert_eq!(fx.edges.mutual(ab), None);
        assert_eq!(fx.node(0).mutual_count(), 0);

        let ba = fx.add("ba", 1, 0, true).unwrap();
        assert_eq!(fx.edges.mutual(ab), Some(ba));
        assert_eq!(fx.edges.mutual(ba), Some(ab));
        assert_eq!(fx.node(0).mutual_count(), 1);
        assert_eq!(fx.node(1).mutual_count(), 1);

        // Pair degree semantics: two directed edges, undirected degree 1.
        assert_eq!(fx.node(0).out_degree() + fx.node(0).in_degree(), 2);
        assert_eq!(fx.node(0).undirected_degree(), 1);

        fx.edges.remove(ba, &mut fx.nodes).unwrap();
        assert_eq!(fx.edges.mutual(ab), None);
        assert_eq!(fx.node(0).mutual_count(), 0);
    }

    #[test]
    fn test_get_between_directed_orientation() {
        let mut fx = Fixture::new(2);
        let e = fx.add("e0", 1, 0, true).unwrap();
        // Directed 1->0 must not answer a 0->1 probe.
        assert_eq!(
            fx.edges
                .get_between(NodeId::new(0), NodeId::new(1), EdgeTypeId::DEFAULT),
            None
        );
        assert_eq!(
            fx.edges
                .get_between(NodeId::new(1), NodeId::new(0), EdgeTypeId::DEFAULT),
            Some(e)
        );
        assert_eq!(
            fx.edges
                .all_between(NodeId::new(0), NodeId::new(1), EdgeTypeId::DEFAULT),
            vec![e]
        );
    }

    #[test]
    fn test_graph_direction_classification() {
        let mut fx = Fixture::new(3);
        assert!(fx.edges.is_directed_graph());
        assert!(fx.edges.is_undirected_graph());

        fx.add("d", 0, 1, true).unwrap();
        assert!(fx.edges.is_directed_graph());
        assert!(!fx.edges.is_mixed_graph());

        fx.add("u", 1, 2, false).unwrap();
        assert!(fx.edges.is_mixed_graph());
        assert!(!fx.edges.is_directed_graph());
        assert!(!fx.edges.is_undirected_graph());
    }

    #[test]
    fn test_undirected_chain_walks_both_sides() {
        let mut fx = Fixture::new(3);
        let e0 = fx.add("e0", 0, 1, false).unwrap();
        let e1 = fx.add("e1", 2, 0, false).unwrap();

        let chain0 = fx
            .edges
            .collect_chain(fx.node(0), ChainKind::Undirected, EdgeTypeId::DEFAULT);
        assert_eq!(chain0, vec![e1, e0]);
        assert_eq!(
            fx.edges
                .collect_chain(fx.node(1), ChainKind::Undirected, EdgeTypeId::DEFAULT),
            vec![e0]
        );
        assert_eq!(fx.node(0).undirected_degree_of(EdgeTypeId::DEFAULT), 2);
        assert_eq!(fx.node(0).degree(), 2);

        fx.edges.remove(e1, &mut fx.nodes).unwrap();
        assert_eq!(
            fx.edges
                .collect_chain(fx.node(0), ChainKind::Undirected, EdgeTypeId::DEFAULT),
            vec![e0]
        );
    }
}
