//! Spatial index collaborator interface.
//!
//! The spatial index itself lives outside the core; the store only dispatches
//! element lifecycle events to it when `enable_spatial_index` is set.

use trellis_common::types::{EdgeId, NodeId};

/// Hooks a spatial index implementation receives from the store.
///
/// All methods default to no-ops so partial implementations stay small.
/// Implementations are called under the store's write path, never
/// concurrently.
pub trait SpatialIndex: Send + Sync {
    /// A node was added to the base graph.
    fn node_added(&mut self, _node: NodeId) {}

    /// A node was removed from the base graph.
    fn node_removed(&mut self, _node: NodeId) {}

    /// An edge was added to the base graph.
    fn edge_added(&mut self, _edge: EdgeId) {}

    /// An edge was removed from the base graph.
    fn edge_removed(&mut self, _edge: EdgeId) {}

    /// A node's position attributes changed.
    fn node_moved(&mut self, _node: NodeId) {}

    /// Everything was cleared.
    fn cleared(&mut self) {}
}
