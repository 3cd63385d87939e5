//! View management surface of [`GraphStore`].
//!
//! Views are created against the base graph and destroyed explicitly; their
//! ids recycle through a min-heap. Set algebra is rejected on the main view.

use trellis_common::error::{GraphError, Result};
use trellis_common::types::{EdgeId, NodeId, ViewId};

use crate::view::ViewConfig;

use super::GraphStore;

fn reject_main(view: ViewId) -> Result<()> {
    if view == ViewId::MAIN {
        return Err(GraphError::Unsupported("not supported on the main view"));
    }
    Ok(())
}

impl GraphStore {
    /// The main (unfiltered) view of the base graph.
    #[must_use]
    pub fn main_view(&self) -> ViewId {
        ViewId::MAIN
    }

    /// Creates an empty view with default options.
    ///
    /// # Errors
    ///
    /// [`GraphError::ProgrammingError`] on an illegal lock upgrade in
    /// auto-locking mode.
    pub fn create_view(&self) -> Result<ViewId> {
        self.create_view_with(ViewConfig::default())
    }

    /// Creates an empty view with explicit options.
    ///
    /// # Errors
    ///
    /// As [`create_view`](Self::create_view).
    pub fn create_view_with(&self, config: ViewConfig) -> Result<ViewId> {
        let _auto = self.auto_write()?;
        Ok(self.inner.write().views.create(config))
    }

    /// Destroys a view, recycling its id. Further operations on the id fail
    /// with [`GraphError::NotOwned`].
    ///
    /// # Errors
    ///
    /// [`GraphError::Unsupported`] for the main view,
    /// [`GraphError::NotOwned`] for an already-destroyed view.
    pub fn destroy_view(&self, view: ViewId) -> Result<()> {
        reject_main(view)?;
        let _auto = self.auto_write()?;
        self.inner.write().views.destroy(view)
    }

    /// Number of live views.
    #[must_use]
    pub fn view_count(&self) -> usize {
        let _auto = self.auto_read();
        self.inner.read().views.size()
    }

    /// Adds a base node to the view. Returns `false` if it was already in.
    ///
    /// # Errors
    ///
    /// [`GraphError::Unsupported`] for the main view,
    /// [`GraphError::NotOwned`] for a dead node or view.
    pub fn view_add_node(&self, view: ViewId, node: NodeId) -> Result<bool> {
        reject_main(view)?;
        let _auto = self.auto_write()?;
        let mut inner = self.inner.write();
        let (views, nodes) = inner.views_and_nodes();
        views.add_node(view, node, nodes)
    }

    /// Removes a node from the view, dropping its incident view edges.
    ///
    /// # Errors
    ///
    /// [`GraphError::Unsupported`] for the main view,
    /// [`GraphError::NotOwned`] for a dead node or view.
    pub fn view_remove_node(&self, view: ViewId, node: NodeId) -> Result<bool> {
        reject_main(view)?;
        let _auto = self.auto_write()?;
        let mut inner = self.inner.write();
        let (views, nodes, edges) = inner.views_nodes_edges();
        views.remove_node(view, node, nodes, edges)
    }

    /// Adds a base edge to the view; both endpoints must be in the view.
    ///
    /// # Errors
    ///
    /// [`GraphError::Unsupported`] for the main view or a node-only view,
    /// [`GraphError::NotOwned`] for a dead edge or view,
    /// [`GraphError::ProgrammingError`] when an endpoint is missing.
    pub fn view_add_edge(&self, view: ViewId, edge: EdgeId) -> Result<bool> {
        reject_main(view)?;
        let _auto = self.auto_write()?;
        let mut inner = self.inner.write();
        let (views, _, edges) = inner.views_nodes_edges();
        views.add_edge(view, edge, edges)
    }

    /// Removes an edge from the view.
    ///
    /// # Errors
    ///
    /// [`GraphError::Unsupported`] for the main view or a node-only view,
    /// [`GraphError::NotOwned`] for a dead view.
    pub fn view_remove_edge(&self, view: ViewId, edge: EdgeId) -> Result<bool> {
        reject_main(view)?;
        let _auto = self.auto_write()?;
        self.inner.write().views.remove_edge(view, edge)
    }

    /// Unions another view's elements into `view`.
    ///
    /// # Errors
    ///
    /// [`GraphError::Unsupported`] when either side is the main view,
    /// [`GraphError::NotOwned`] for dead views.
    pub fn view_union(&self, view: ViewId, other: ViewId) -> Result<()> {
        reject_main(view)?;
        reject_main(other)?;
        let _auto = self.auto_write()?;
        self.inner.write().views.union(view, other)
    }

    /// Intersects `view` with another view.
    ///
    /// # Errors
    ///
    /// As [`view_union`](Self::view_union).
    pub fn view_intersection(&self, view: ViewId, other: ViewId) -> Result<()> {
        reject_main(view)?;
        reject_main(other)?;
        let _auto = self.auto_write()?;
        self.inner.write().views.intersection(view, other)
    }

    /// Fills the view with every live base element.
    ///
    /// # Errors
    ///
    /// [`GraphError::Unsupported`] for the main view,
    /// [`GraphError::NotOwned`] for a dead view.
    pub fn view_fill(&self, view: ViewId) -> Result<()> {
        reject_main(view)?;
        let _auto = self.auto_write()?;
        let mut inner = self.inner.write();
        let (views, nodes, edges) = inner.views_nodes_edges();
        views.fill(view, nodes, edges)
    }

    /// Complements the view within the live base elements.
    ///
    /// # Errors
    ///
    /// [`GraphError::Unsupported`] for the main view,
    /// [`GraphError::NotOwned`] for a dead view.
    pub fn view_not(&self, view: ViewId) -> Result<()> {
        reject_main(view)?;
        let _auto = self.auto_write()?;
        let mut inner = self.inner.write();
        let (views, nodes, edges) = inner.views_nodes_edges();
        views.not(view, nodes, edges)
    }

    /// Empties the view.
    ///
    /// # Errors
    ///
    /// [`GraphError::Unsupported`] for the main view,
    /// [`GraphError::NotOwned`] for a dead view.
    pub fn view_clear(&self, view: ViewId) -> Result<()> {
        reject_main(view)?;
        let _auto = self.auto_write()?;
        self.inner.write().views.clear(view)
    }

    /// Empties the view's edge set.
    ///
    /// # Errors
    ///
    /// [`GraphError::Unsupported`] for the main view,
    /// [`GraphError::NotOwned`] for a dead view.
    pub fn view_clear_edges(&self, view: ViewId) -> Result<()> {
        reject_main(view)?;
        let _auto = self.auto_write()?;
        self.inner.write().views.clear_edges(view)
    }

    /// `true` if the view contains the node.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for a dead view.
    pub fn view_contains_node(&self, view: ViewId, node: NodeId) -> Result<bool> {
        let _auto = self.auto_read();
        let inner = self.inner.read();
        if view == ViewId::MAIN {
            return Ok(inner.nodes.contains(node));
        }
        Ok(inner.views.view(view)?.contains_node(node))
    }

    /// `true` if the view contains the edge (derived for node-only views).
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for a dead view.
    pub fn view_contains_edge(&self, view: ViewId, edge: EdgeId) -> Result<bool> {
        let _auto = self.auto_read();
        let inner = self.inner.read();
        if view == ViewId::MAIN {
            return Ok(inner.edges.contains(edge));
        }
        let record = inner.edges.record(edge);
        Ok(record.is_some_and(|r| {
            inner
                .views
                .view(view)
                .is_ok_and(|v| v.contains_edge_record(r))
        }))
    }

    /// Number of nodes in the view.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for a dead view.
    pub fn view_node_count(&self, view: ViewId) -> Result<u64> {
        let _auto = self.auto_read();
        let inner = self.inner.read();
        if view == ViewId::MAIN {
            return Ok(inner.nodes.size() as u64);
        }
        Ok(inner.views.view(view)?.node_count())
    }

    /// Number of edges in the view (derived for node-only views).
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for a dead view.
    pub fn view_edge_count(&self, view: ViewId) -> Result<u64> {
        let _auto = self.auto_read();
        let inner = self.inner.read();
        if view == ViewId::MAIN {
            return Ok(inner.edges.size() as u64);
        }
        Ok(inner.views.view(view)?.edge_count(&inner.edges))
    }
}
