//! Iteration over the store: version-checked walkers, the removable edge
//! cursor and the view-restricted subgraph facade.
//!
//! Walkers iterate without holding any lock across steps; they stamp the
//! structural version at creation and fail with
//! [`GraphError::StaleIterator`] once the graph changes, unless made
//! [`resilient`](NodeWalker::resilient) (the caller consents to best-effort
//! iteration). Version detection needs observers enabled.
//!
//! [`EdgeCursor`] holds the write path for its whole lifetime: it walks a
//! node's chains in LIFO order and supports removing the current edge
//! mid-iteration - the next pointer is prefetched before an edge is
//! yielded, so splicing the current edge never derails the walk.

use parking_lot::RwLockWriteGuard;
use trellis_common::collections::FxHashSet;
use trellis_common::error::{GraphError, Result};
use trellis_common::types::{EdgeId, EdgeTypeId, NodeId, ViewId};

use super::edge::ChainKind;
use super::{GraphInner, GraphStore};

/// Walks every live node slot in ascending order without holding a lock
/// between steps.
pub struct NodeWalker<'a> {
    store: &'a GraphStore,
    cursor: u32,
    observed: u64,
    resilient: bool,
}

impl NodeWalker<'_> {
    /// Disables staleness detection; the walk continues over whatever slots
    /// are live at each step.
    #[must_use]
    pub fn resilient(mut self) -> Self {
        self.resilient = true;
        self
    }

    /// The next live node.
    ///
    /// # Errors
    ///
    /// [`GraphError::StaleIterator`] if the node set changed since the
    /// walker was created (and the walker is not resilient).
    pub fn try_next(&mut self) -> Result<Option<NodeId>> {
        let inner = self.store.inner.read();
        if !self.resilient && self.store.version.node_version() != self.observed {
            return Err(GraphError::StaleIterator);
        }
        match inner.nodes.next_live_from(self.cursor) {
            Some(id) => {
                self.cursor = id.0 + 1;
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    /// Drains the walker into a vector.
    ///
    /// # Errors
    ///
    /// As [`try_next`](Self::try_next).
    pub fn collect_all(mut self) -> Result<Vec<NodeId>> {
        let mut result = Vec::new();
        while let Some(id) = self.try_next()? {
            result.push(id);
        }
        Ok(result)
    }
}

/// Walks every live edge slot in ascending order without holding a lock
/// between steps.
pub struct EdgeWalker<'a> {
    store: &'a GraphStore,
    cursor: u32,
    observed: u64,
    resilient: bool,
}

impl EdgeWalker<'_> {
    /// Disables staleness detection.
    #[must_use]
    pub fn resilient(mut self) -> Self {
        self.resilient = true;
        self
    }

    /// The next live edge.
    ///
    /// # Errors
    ///
    /// [`GraphError::StaleIterator`] if the edge set changed since the
    /// walker was created (and the walker is not resilient).
    pub fn try_next(&mut self) -> Result<Option<EdgeId>> {
        let inner = self.store.inner.read();
        if !self.resilient && self.store.version.edge_version() != self.observed {
            return Err(GraphError::StaleIterator);
        }
        match inner.edges.next_live_from(self.cursor) {
            Some(id) => {
                self.cursor = id.0 + 1;
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    /// Drains the walker into a vector.
    ///
    /// # Errors
    ///
    /// As [`try_next`](Self::try_next).
    pub fn collect_all(mut self) -> Result<Vec<EdgeId>> {
        let mut result = Vec::new();
        while let Some(id) = self.try_next()? {
            result.push(id);
        }
        Ok(result)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum CursorPhase {
    Chain(ChainKind, EdgeTypeId),
    SelfLoops,
}

/// A write cursor over a node's incident edges supporting removal
/// mid-iteration.
///
/// Traversal order is per-chain LIFO: out chains, then in chains, then
/// undirected chains (each per type, ascending), then self-loops. Holds the
/// write path for its lifetime; in auto-locking mode the advisory write
/// lock is taken at construction and released on drop.
pub struct EdgeCursor<'a> {
    store: &'a GraphStore,
    guard: RwLockWriteGuard<'a, GraphInner>,
    node: NodeId,
    ty: Option<EdgeTypeId>,
    schedule: Vec<CursorPhase>,
    schedule_pos: usize,
    phase: CursorPhase,
    next: EdgeId,
    current: Option<EdgeId>,
    auto_locked: bool,
}

impl EdgeCursor<'_> {
    /// Advances to the next incident edge, or `None` at the end.
    pub fn next_edge(&mut self) -> Option<EdgeId> {
        loop {
            if self.next.is_null() {
                let phase = *self.schedule.get(self.schedule_pos)?;
                self.schedule_pos += 1;
                self.phase = phase;
                let record = self
                    .guard
                    .nodes
                    .record(self.node)
                    .expect("cursor node stays live under the held guard");
                self.next = match phase {
                    CursorPhase::Chain(ChainKind::Out, t) => record.out_head(t),
                    CursorPhase::Chain(ChainKind::In, t) => record.in_head(t),
                    CursorPhase::Chain(ChainKind::Undirected, t) => record.undirected_head(t),
                    CursorPhase::SelfLoops => record.self_loop_head,
                };
                continue;
            }

            let current = self.next;
            let record = self
                .guard
                .edges
                .record(current)
                .expect("chain link points at a live edge");
            self.next = match self.phase {
                CursorPhase::SelfLoops => record.self_loop_next(),
                CursorPhase::Chain(..) => record.next_at(self.node),
            };
            // The self-loop chain mixes types; honor the filter here.
            if self.phase == CursorPhase::SelfLoops {
                if let Some(t) = self.ty {
                    if record.type_id() != t {
                        continue;
                    }
                }
            }
            self.current = Some(current);
            return Some(current);
        }
    }

    /// The edge most recently yielded, if it has not been removed.
    #[must_use]
    pub fn current(&self) -> Option<EdgeId> {
        self.current
    }

    /// Removes the current edge from the graph - chains, parallel table,
    /// counters, indices, views and time registrations included. Iteration
    /// continues from the prefetched next edge.
    ///
    /// # Errors
    ///
    /// [`GraphError::ProgrammingError`] before the first
    /// [`next_edge`](Self::next_edge), after the end, or twice for the same
    /// edge.
    pub fn remove_current(&mut self) -> Result<()> {
        let current = self.current.take().ok_or(GraphError::ProgrammingError(
            "cursor has no current edge to remove",
        ))?;
        self.guard.remove_edge_internal(current)?;
        self.store.touch_edge(current, false);
        Ok(())
    }
}

impl Drop for EdgeCursor<'_> {
    fn drop(&mut self) {
        if self.auto_locked {
            let released = self.store.lock.write_unlock();
            debug_assert!(released.is_ok(), "cursor releases the lock it took");
        }
    }
}

/// A graph view exposed through the base-graph interface: counts, degrees
/// and traversal restricted to the view's members.
///
/// Obtained from [`GraphStore::subgraph`]. [`ViewId::MAIN`] yields the
/// whole base graph.
pub struct Subgraph<'a> {
    store: &'a GraphStore,
    view: ViewId,
}

impl Subgraph<'_> {
    /// The view this subgraph reads through.
    #[must_use]
    pub fn view_id(&self) -> ViewId {
        self.view
    }

    /// Number of nodes in the view.
    #[must_use]
    pub fn node_count(&self) -> u64 {
        let _auto = self.store.auto_read();
        let inner = self.store.inner.read();
        if self.view == ViewId::MAIN {
            inner.nodes.size() as u64
        } else {
            inner.views.view(self.view).map_or(0, |v| v.node_count())
        }
    }

    /// Number of edges in the view (derived for node-only views).
    #[must_use]
    pub fn edge_count(&self) -> u64 {
        let _auto = self.store.auto_read();
        let inner = self.store.inner.read();
        if self.view == ViewId::MAIN {
            inner.edges.size() as u64
        } else {
            inner
                .views
                .view(self.view)
                .map_or(0, |v| v.edge_count(&inner.edges))
        }
    }

    /// `true` if the node is in the view.
    #[must_use]
    pub fn contains_node(&self, node: NodeId) -> bool {
        let _auto = self.store.auto_read();
        let inner = self.store.inner.read();
        if self.view == ViewId::MAIN {
            inner.nodes.contains(node)
        } else {
            inner
                .views
                .view(self.view)
                .is_ok_and(|v| v.contains_node(node))
        }
    }

    /// `true` if the edge is in the view.
    #[must_use]
    pub fn contains_edge(&self, edge: EdgeId) -> bool {
        let _auto = self.store.auto_read();
        let inner = self.store.inner.read();
        if self.view == ViewId::MAIN {
            return inner.edges.contains(edge);
        }
        let Ok(view) = inner.views.view(self.view) else {
            return false;
        };
        inner
            .edges
            .record(edge)
            .is_some_and(|record| view.contains_edge_record(record))
    }

    /// The view's nodes, ascending by slot.
    #[must_use]
    pub fn nodes(&self) -> Vec<NodeId> {
        let _auto = self.store.auto_read();
        let inner = self.store.inner.read();
        if self.view == ViewId::MAIN {
            inner.nodes.iter().map(|r| r.store_id()).collect()
        } else {
            inner
                .views
                .view(self.view)
                .map_or_else(|_| Vec::new(), |v| v.nodes().collect())
        }
    }

    /// The view's edges, ascending by slot.
    #[must_use]
    pub fn edges(&self) -> Vec<EdgeId> {
        let _auto = self.store.auto_read();
        let inner = self.store.inner.read();
        if self.view == ViewId::MAIN {
            inner.edges.iter().map(|r| r.store_id()).collect()
        } else {
            inner.views.view(self.view).map_or_else(
                |_| Vec::new(),
                |v| v.edge_bits(&inner.edges).iter().map(EdgeId::new).collect(),
            )
        }
    }

    /// Number of view edges incident to the node (self-loops once).
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for a dead node or view.
    pub fn degree(&self, node: NodeId) -> Result<u32> {
        Ok(self.incident_in_view(node)?.len() as u32)
    }

    /// Number of view edges entering the node (undirected and self-loop
    /// edges count).
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for a dead node or view.
    pub fn in_degree(&self, node: NodeId) -> Result<u32> {
        let _auto = self.store.auto_read();
        let inner = self.store.inner.read();
        let mut count = 0;
        for edge in self.incident_in_view_locked(&inner, node)? {
            let record = inner.edges.record(edge).expect("view edge is live");
            if record.is_self_loop()
                || !record.is_directed()
                || record.target() == node
            {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Number of view edges leaving the node (undirected and self-loop
    /// edges count).
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for a dead node or view.
    pub fn out_degree(&self, node: NodeId) -> Result<u32> {
        let _auto = self.store.auto_read();
        let inner = self.store.inner.read();
        let mut count = 0;
        for edge in self.incident_in_view_locked(&inner, node)? {
            let record = inner.edges.record(edge).expect("view edge is live");
            if record.is_self_loop()
                || !record.is_directed()
                || record.source() == node
            {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Distinct neighbors of the node through view edges.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for a dead node or view.
    pub fn neighbors(&self, node: NodeId) -> Result<Vec<NodeId>> {
        let _auto = self.store.auto_read();
        let inner = self.store.inner.read();
        let mut seen = FxHashSet::default();
        let mut result = Vec::new();
        for edge in self.incident_in_view_locked(&inner, node)? {
            let opposite = inner
                .edges
                .record(edge)
                .expect("view edge is live")
                .opposite(node);
            if seen.insert(opposite) {
                result.push(opposite);
            }
        }
        Ok(result)
    }

    /// View edges incident to the node, chain order.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for a dead node or view.
    pub fn edges_of(&self, node: NodeId) -> Result<Vec<EdgeId>> {
        self.incident_in_view(node)
    }

    fn incident_in_view(&self, node: NodeId) -> Result<Vec<EdgeId>> {
        let _auto = self.store.auto_read();
        let inner = self.store.inner.read();
        self.incident_in_view_locked(&inner, node)
    }

    fn incident_in_view_locked(&self, inner: &GraphInner, node: NodeId) -> Result<Vec<EdgeId>> {
        let record = inner.nodes.record(node).ok_or(GraphError::NotOwned)?;
        let incident = inner.edges.incident_edges(record);
        if self.view == ViewId::MAIN {
            return Ok(incident);
        }
        let view = inner.views.view(self.view)?;
        Ok(incident
            .into_iter()
            .filter(|edge| {
                inner
                    .edges
                    .record(*edge)
                    .is_some_and(|r| view.contains_edge_record(r))
            })
            .collect())
    }
}

impl GraphStore {
    /// Starts a version-checked walk over every node.
    #[must_use]
    pub fn node_walker(&self) -> NodeWalker<'_> {
        NodeWalker {
            store: self,
            cursor: 0,
            observed: self.version.node_version(),
            resilient: false,
        }
    }

    /// Starts a version-checked walk over every edge.
    #[must_use]
    pub fn edge_walker(&self) -> EdgeWalker<'_> {
        EdgeWalker {
            store: self,
            cursor: 0,
            observed: self.version.edge_version(),
            resilient: false,
        }
    }

    /// Opens a removable cursor over a node's incident edges.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for a dead node,
    /// [`GraphError::ProgrammingError`] on an illegal lock upgrade in
    /// auto-locking mode.
    pub fn edge_cursor(&self, node: NodeId) -> Result<EdgeCursor<'_>> {
        self.cursor_impl(node, None)
    }

    /// Opens a removable cursor filtered to one edge type.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for a dead node or unknown type.
    pub fn edge_cursor_of_type(&self, node: NodeId, ty: EdgeTypeId) -> Result<EdgeCursor<'_>> {
        self.cursor_impl(node, Some(ty))
    }

    fn cursor_impl(&self, node: NodeId, ty: Option<EdgeTypeId>) -> Result<EdgeCursor<'_>> {
        let auto_locked = if self.config.enable_auto_locking {
            self.lock.write_lock()?;
            true
        } else {
            false
        };
        let release_on_err = |e: trellis_common::error::GraphError| {
            if auto_locked {
                let _ = self.lock.write_unlock();
            }
            e
        };

        let guard = self.inner.write();
        if guard.nodes.record(node).is_none() {
            return Err(release_on_err(GraphError::NotOwned));
        }
        if let Some(t) = ty {
            if !guard.edge_types.contains(t) {
                return Err(release_on_err(GraphError::NotOwned));
            }
        }

        let types: Vec<EdgeTypeId> = match ty {
            Some(t) => vec![t],
            None => (0..guard.edge_types.capacity())
                .map(|t| EdgeTypeId::new(t as u32))
                .collect(),
        };
        let mut schedule = Vec::with_capacity(types.len() * 3 + 1);
        for kind in [ChainKind::Out, ChainKind::In, ChainKind::Undirected] {
            for t in &types {
                schedule.push(CursorPhase::Chain(kind, *t));
            }
        }
        schedule.push(CursorPhase::SelfLoops);

        Ok(EdgeCursor {
            store: self,
            guard,
            node,
            ty,
            schedule,
            schedule_pos: 0,
            phase: CursorPhase::SelfLoops,
            next: EdgeId::NULL,
            current: None,
            auto_locked,
        })
    }

    /// Opens the subgraph facade over a view. [`ViewId::MAIN`] exposes the
    /// whole base graph.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for a destroyed or foreign view.
    pub fn subgraph(&self, view: ViewId) -> Result<Subgraph<'_>> {
        if view != ViewId::MAIN {
            let _auto = self.auto_read();
            self.inner.read().views.view(view)?;
        }
        Ok(Subgraph { store: self, view })
    }
}
