//! Change observers.
//!
//! An observer snapshots the `(node_version, edge_version)` pair at creation
//! and answers "has the graph changed since I last asked?". Observers created
//! with diff tracking additionally accumulate the node/edge slots added and
//! removed since the last poll.

use crate::lock::GraphVersion;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use trellis_common::error::{GraphError, Result};
use trellis_common::types::{EdgeId, NodeId};

/// The structural diff accumulated between observer polls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphDiff {
    /// Nodes added since the last poll.
    pub added_nodes: Vec<NodeId>,
    /// Nodes removed since the last poll.
    pub removed_nodes: Vec<NodeId>,
    /// Edges added since the last poll.
    pub added_edges: Vec<EdgeId>,
    /// Edges removed since the last poll.
    pub removed_edges: Vec<EdgeId>,
}

impl GraphDiff {
    /// `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added_nodes.is_empty()
            && self.removed_nodes.is_empty()
            && self.added_edges.is_empty()
            && self.removed_edges.is_empty()
    }
}

pub(crate) struct ObserverState {
    snapshot: Mutex<(u64, u64)>,
    diff: Option<Mutex<GraphDiff>>,
    destroyed: AtomicBool,
}

impl ObserverState {
    fn record<T: Copy + Eq>(added: &mut Vec<T>, removed: &mut Vec<T>, id: T, is_add: bool) {
        if is_add {
            added.push(id);
        } else if let Some(pos) = added.iter().position(|x| *x == id) {
            // An element added and removed between polls cancels out.
            added.swap_remove(pos);
        } else {
            removed.push(id);
        }
    }

    pub(crate) fn record_node(&self, id: NodeId, is_add: bool) {
        if let Some(diff) = &self.diff {
            let mut diff = diff.lock();
            let GraphDiff {
                added_nodes,
                removed_nodes,
                ..
            } = &mut *diff;
            Self::record(added_nodes, removed_nodes, id, is_add);
        }
    }

    pub(crate) fn record_edge(&self, id: EdgeId, is_add: bool) {
        if let Some(diff) = &self.diff {
            let mut diff = diff.lock();
            let GraphDiff {
                added_edges,
                removed_edges,
                ..
            } = &mut *diff;
            Self::record(added_edges, removed_edges, id, is_add);
        }
    }
}

/// Registry of live observers, owned by the store.
#[derive(Default)]
pub(crate) struct ObserverRegistry {
    observers: Mutex<Vec<Arc<ObserverState>>>,
}

impl ObserverRegistry {
    pub(crate) fn register(&self, with_diff: bool, version: &GraphVersion) -> Arc<ObserverState> {
        let state = Arc::new(ObserverState {
            snapshot: Mutex::new(version.snapshot()),
            diff: with_diff.then(|| Mutex::new(GraphDiff::default())),
            destroyed: AtomicBool::new(false),
        });
        self.observers.lock().push(Arc::clone(&state));
        state
    }

    pub(crate) fn unregister(&self, state: &Arc<ObserverState>) -> bool {
        let mut observers = self.observers.lock();
        let before = observers.len();
        observers.retain(|o| !Arc::ptr_eq(o, state));
        observers.len() != before
    }

    pub(crate) fn record_node(&self, id: NodeId, is_add: bool) {
        for observer in self.observers.lock().iter() {
            observer.record_node(id, is_add);
        }
    }

    pub(crate) fn record_edge(&self, id: EdgeId, is_add: bool) {
        for observer in self.observers.lock().iter() {
            observer.record_edge(id, is_add);
        }
    }
}

/// A handle polling the graph for structural change.
///
/// Create through [`GraphStore::create_observer`](crate::GraphStore::create_observer)
/// and release through [`GraphStore::destroy_observer`](crate::GraphStore::destroy_observer).
pub struct GraphObserver {
    pub(crate) version: Arc<GraphVersion>,
    pub(crate) state: Arc<ObserverState>,
}

impl GraphObserver {
    /// Compares the live version counters to the snapshot taken at the last
    /// poll, refreshing the snapshot.
    ///
    /// Counters are read without a lock; a mutation racing this call is
    /// simply reported on the next poll.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::ProgrammingError`] if the observer was destroyed.
    pub fn has_graph_changed(&self) -> Result<bool> {
        self.check_alive()?;
        let live = self.version.snapshot();
        let mut snapshot = self.state.snapshot.lock();
        let changed = *snapshot != live;
        *snapshot = live;
        Ok(changed)
    }

    /// Emits and clears the accumulated diff.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Unsupported`] if the observer was created
    /// without diff tracking, or [`GraphError::ProgrammingError`] if it was
    /// destroyed.
    pub fn get_diff(&self) -> Result<GraphDiff> {
        self.check_alive()?;
        let diff = self
            .state
            .diff
            .as_ref()
            .ok_or(GraphError::Unsupported("observer was created without diff tracking"))?;
        Ok(std::mem::take(&mut *diff.lock()))
    }

    /// `true` once [`GraphStore::destroy_observer`](crate::GraphStore::destroy_observer)
    /// has been called.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.state.destroyed.load(Ordering::Acquire)
    }

    pub(crate) fn destroy(&self) {
        self.state.destroyed.store(true, Ordering::Release);
    }

    fn check_alive(&self) -> Result<()> {
        if self.is_destroyed() {
            return Err(GraphError::ProgrammingError("observer was destroyed"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observer(with_diff: bool) -> (Arc<GraphVersion>, ObserverRegistry, GraphObserver) {
        let version = Arc::new(GraphVersion::new());
        let registry = ObserverRegistry::default();
        let state = registry.register(with_diff, &version);
        let observer = GraphObserver {
            version: Arc::clone(&version),
            state,
        };
        (version, registry, observer)
    }

    #[test]
    fn test_has_graph_changed() {
        let (version, _registry, observer) = observer(false);
        assert!(!observer.has_graph_changed().unwrap());
        version.bump_node();
        assert!(observer.has_graph_changed().unwrap());
        // Snapshot refreshed by the previous poll.
        assert!(!observer.has_graph_changed().unwrap());
    }

    #[test]
    fn test_diff_accumulates_and_clears(){
        let (_version, registry, observer) = observer(true);
        registry.record_node(NodeId::new(0), true);
        registry.record_edge(EdgeId::new(4), false);

        let diff = observer.get_diff().unwrap();
        assert_eq!(diff.added_nodes, vec![NodeId::new(0)]);
        assert_eq!(diff.removed_edges, vec![EdgeId::new(4)]);

        assert!(observer.get_diff().unwrap().is_empty());
    }

    #[test]
    fn test_add_then_remove_cancels() {
        let (_version, registry, observer) = observer(true);
        registry.record_node(NodeId::new(7), true);
        registry.record_node(NodeId::new(7), false);
        assert!(observer.get_diff().unwrap().is_empty());
    }

    #[test]
    fn test_diff_unsupported_without_tracking() {
        let (_version, _registry, observer) = observer(false);
        assert!(matches!(
            observer.get_diff(),
            Err(GraphError::Unsupported(_))
        ));
    }

    #[test]
    fn test_destroyed_observer_errors() {
        let (_version, registry, observer) = observer(true);
        assert!(registry.unregister(&observer.state));
        observer.destroy();
        assert!(observer.has_graph_changed().is_err());
        assert!(observer.is_destroyed());
    }
}
