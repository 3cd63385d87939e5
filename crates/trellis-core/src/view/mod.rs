//! Graph views: bitmap-backed subgraphs over the base graph.
//!
//! A view owns two roaring bitmaps - node slots and edge slots - and stays
//! coherent under base-graph mutation: removing a base element clears its
//! bit in every view. The edge set is always closed over the node set: an
//! edge bit implies both endpoint bits.
//!
//! Views carry a `storeId` recycled through a min-heap, like nodes and
//! edges. A destroyed view keeps [`ViewId::NULL`] and every operation on it
//! fails with `NotOwned`.

use roaring::RoaringBitmap;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tracing::debug;
use trellis_common::error::{GraphError, Result};
use trellis_common::types::{EdgeId, NodeId, ViewId};

use crate::store::edge::{EdgeRecord, EdgeStore};
use crate::store::node::NodeStore;

/// Per-view creation options.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewConfig {
    /// The view tracks nodes only; its edge set is derived on read as every
    /// base edge whose endpoints are both in the view.
    pub node_view_only: bool,
    /// Base-graph additions propagate into the view: new nodes are included,
    /// and new edges are included when both endpoints are already present.
    pub auto_include: bool,
}

/// One view's bitsets and flags.
pub struct GraphView {
    store_id: ViewId,
    nodes: RoaringBitmap,
    edges: RoaringBitmap,
    node_view_only: bool,
    auto_include: bool,
}

impl GraphView {
    fn new(store_id: ViewId, config: ViewConfig) -> Self {
        Self {
            store_id,
            nodes: RoaringBitmap::new(),
            edges: RoaringBitmap::new(),
            node_view_only: config.node_view_only,
            auto_include: config.auto_include,
        }
    }

    /// The view's slot id, [`ViewId::NULL`] once destroyed.
    #[must_use]
    pub fn store_id(&self) -> ViewId {
        self.store_id
    }

    /// `true` if the edge set is derived from the node set on read.
    #[must_use]
    pub fn is_node_view_only(&self) -> bool {
        self.node_view_only
    }

    /// `true` if base additions propagate into this view.
    #[must_use]
    pub fn is_auto_include(&self) -> bool {
        self.auto_include
    }

    /// `true` if the node slot is in the view.
    #[must_use]
    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.contains(node.0)
    }

    /// Number of nodes in the view.
    #[must_use]
    pub fn node_count(&self) -> u64 {
        self.nodes.len()
    }

    fn derived_edge_bits(&self, edges: &EdgeStore) -> RoaringBitmap {
        edges
            .iter()
            .filter(|r| self.nodes.contains(r.source().0) && self.nodes.contains(r.target().0))
            .map(|r| r.store_id().0)
            .collect()
    }

    /// The view's edge bits, deriving them for node-only views.
    pub(crate) fn edge_bits(&self, edges: &EdgeStore) -> RoaringBitmap {
        if self.node_view_only {
            self.derived_edge_bits(edges)
        } else {
            self.edges.clone()
        }
    }

    /// `true` if the edge is in the view (derived membership for node-only
    /// views).
    #[must_use]
    pub fn contains_edge_record(&self, record: &EdgeRecord) -> bool {
        if self.node_view_only {
            self.nodes.contains(record.source().0) && self.nodes.contains(record.target().0)
        } else {
            self.edges.contains(record.store_id().0)
        }
    }

    /// Number of edges in the view.
    #[must_use]
    pub fn edge_count(&self, edges: &EdgeStore) -> u64 {
        if self.node_view_only {
            self.derived_edge_bits(edges).len()
        } else {
            self.edges.len()
        }
    }

    /// Iterates node slots in ascending order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().map(NodeId::new)
    }
}

/// The store of views.
pub struct ViewStore {
    views: Vec<Option<GraphView>>,
    garbage: BinaryHeap<Reverse<u32>>,
}

impl ViewStore {
    /// Creates an empty view store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            views: Vec::new(),
            garbage: BinaryHeap::new(),
        }
    }

    /// Creates a view, recycling the smallest free slot id.
    pub(crate) fn create(&mut self, config: ViewConfig) -> ViewId {
        let id = match self.garbage.pop() {
            Some(Reverse(slot)) => ViewId::new(slot),
            None => {
                self.views.push(None);
                ViewId::new((self.views.len() - 1) as u32)
            }
        };
        self.views[id.index()] = Some(GraphView::new(id, config));
        debug!(view = id.0, "created graph view");
        id
    }

    /// Destroys a view, recycling its id.
    pub(crate) fn destroy(&mut self, id: ViewId) -> Result<()> {
        let view = self
            .views
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(GraphError::NotOwned)?;
        debug_assert_eq!(view.store_id, id);
        self.garbage.push(Reverse(id.0));
        debug!(view = id.0, "destroyed graph view");
        Ok(())
    }

    /// Borrows a live view.
    pub fn view(&self, id: ViewId) -> Result<&GraphView> {
        if id == ViewId::MAIN || id.is_null() {
            return Err(GraphError::NotOwned);
        }
        self.views
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(GraphError::NotOwned)
    }

    fn view_mut(&mut self, id: ViewId) -> Result<&mut GraphView> {
        if id == ViewId::MAIN || id.is_null() {
            return Err(GraphError::NotOwned);
        }
        self.views
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(GraphError::NotOwned)
    }

    /// Number of live views.
    #[must_use]
    pub fn size(&self) -> usize {
        self.views.iter().flatten().count()
    }

    /// Adds a node to the view. Returns `false` if it was already present.
    pub(crate) fn add_node(&mut self, id: ViewId, node: NodeId, nodes: &NodeStore) -> Result<bool> {
        if !nodes.contains(node) {
            return Err(GraphError::NotOwned);
        }
        Ok(self.view_mut(id)?.nodes.insert(node.0))
    }

    /// Removes a node from the view, clearing its incident view edges to
    /// keep the closure invariant.
    pub(crate) fn remove_node(
        &mut self,
        id: ViewId,
        node: NodeId,
        nodes: &NodeStore,
        edges: &EdgeStore,
    ) -> Result<bool> {
        let node_record = nodes.record(node).ok_or(GraphError::NotOwned)?;
        let incident = edges.incident_edges(node_record);
        let view = self.view_mut(id)?;
        for edge in incident {
            view.edges.remove(edge.0);
        }
        Ok(view.nodes.remove(node.0))
    }

    /// Adds an edge to the view. Both endpoints must already be in the view.
    pub(crate) fn add_edge(&mut self, id: ViewId, edge: EdgeId, edges: &EdgeStore) -> Result<bool> {
        let record = edges.record(edge).ok_or(GraphError::NotOwned)?;
        let view = self.view_mut(id)?;
        if view.node_view_only {
            return Err(GraphError::Unsupported(
                "node-only views derive their edge set",
            ));
        }
        if !view.nodes.contains(record.source().0) || !view.nodes.contains(record.target().0) {
            return Err(GraphError::ProgrammingError(
                "edge endpoints must be in the view",
            ));
        }
        Ok(view.edges.insert(edge.0))
    }

    /// Removes an edge from the view.
    pub(crate) fn remove_edge(&mut self, id: ViewId, edge: EdgeId) -> Result<bool> {
        let view = self.view_mut(id)?;
        if view.node_view_only {
            return Err(GraphError::Unsupported(
                "node-only views derive their edge set",
            ));
        }
        Ok(view.edges.remove(edge.0))
    }

    /// Unions `other` into `id`.
    pub(crate) fn union(&mut self, id: ViewId, other: ViewId) -> Result<()> {
        let (node_bits, edge_bits) = {
            let other = self.view(other)?;
            (other.nodes.clone(), other.edges.clone())
        };
        let view = self.view_mut(id)?;
        view.nodes |= node_bits;
        view.edges |= edge_bits;
        Ok(())
    }

    /// Intersects `id` with `other`.
    pub(crate) fn intersection(&mut self, id: ViewId, other: ViewId) -> Result<()> {
        let (node_bits, edge_bits) = {
            let other = self.view(other)?;
            (other.nodes.clone(), other.edges.clone())
        };
        let view = self.view_mut(id)?;
        view.nodes &= node_bits;
        view.edges &= edge_bits;
        Ok(())
    }

    /// Fills the view with every live base element.
    pub(crate) fn fill(&mut self, id: ViewId, nodes: &NodeStore, edges: &EdgeStore) -> Result<()> {
        let node_bits: RoaringBitmap = nodes.iter().map(|r| r.store_id().0).collect();
        let edge_bits: RoaringBitmap = edges.iter().map(|r| r.store_id().0).collect();
        let view = self.view_mut(id)?;
        view.nodes = node_bits;
        view.edges = edge_bits;
        Ok(())
    }

    /// Complements the view within the live base elements. Surviving edges
    /// are those not previously in the view whose endpoints are both in the
    /// complemented node set.
    pub(crate) fn not(&mut self, id: ViewId, nodes: &NodeStore, edges: &EdgeStore) -> Result<()> {
        let view = self.view(id)?;
        let node_bits: RoaringBitmap = nodes
            .iter()
            .map(|r| r.store_id().0)
            .filter(|slot| !view.nodes.contains(*slot))
            .collect();
        let edge_bits: RoaringBitmap = edges
            .iter()
            .filter(|r| {
                !view.edges.contains(r.store_id().0)
                    && node_bits.contains(r.source().0)
                    && node_bits.contains(r.target().0)
            })
            .map(|r| r.store_id().0)
            .collect();
        let view = self.view_mut(id)?;
        view.nodes = node_bits;
        view.edges = edge_bits;
        Ok(())
    }

    /// Empties the view.
    pub(crate) fn clear(&mut self, id: ViewId) -> Result<()> {
        let view = self.view_mut(id)?;
        view.nodes.clear();
        view.edges.clear();
        Ok(())
    }

    /// Empties the view's edge set.
    pub(crate) fn clear_edges(&mut self, id: ViewId) -> Result<()> {
        self.view_mut(id)?.edges.clear();
        Ok(())
    }

    // Base-graph mutation hooks.

    pub(crate) fn on_base_node_added(&mut self, node: NodeId) {
        for view in self.views.iter_mut().flatten() {
            if view.auto_include {
                view.nodes.insert(node.0);
            }
        }
    }

    pub(crate) fn on_base_node_removed(&mut self, node: NodeId) {
        for view in self.views.iter_mut().flatten() {
            view.nodes.remove(node.0);
        }
    }

    pub(crate) fn on_base_edge_added(&mut self, record: &EdgeRecord) {
        for view in self.views.iter_mut().flatten() {
            if view.auto_include
                && !view.node_view_only
                && view.nodes.contains(record.source().0)
                && view.nodes.contains(record.target().0)
            {
                view.edges.insert(record.store_id().0);
            }
        }
    }

    pub(crate) fn on_base_edge_removed(&mut self, edge: EdgeId) {
        for view in self.views.iter_mut().flatten() {
            view.edges.remove(edge.0);
        }
    }

    pub(crate) fn on_base_edges_cleared(&mut self) {
        for view in self.views.iter_mut().flatten() {
            view.edges.clear();
        }
    }

    pub(crate) fn on_base_cleared(&mut self) {
        for view in self.views.iter_mut().flatten() {
            view.nodes.clear();
            view.edges.clear();
        }
    }
}

impl Default for ViewStore {
    fn default() -> Self {
        Self::new()
    }
}
