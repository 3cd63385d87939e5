//! The mutable graph core of Trellis.
//!
//! An embedded, in-memory store for large property graphs - directed,
//! undirected and mixed - with typed edges, columnar attributes, secondary
//! indices, time-indexed values and bitmap-backed views over a shared base
//! graph.
//!
//! Everything revolves around [`GraphStore`]:
//!
//! ```
//! use trellis_core::GraphStore;
//!
//! let store = GraphStore::new();
//! let alice = store.add_node("alice").unwrap().unwrap();
//! let bob = store.add_node("bob").unwrap().unwrap();
//! let knows = store.edge_type("KNOWS").unwrap();
//! store.add_edge("e0", alice, bob, knows, true).unwrap();
//!
//! assert_eq!(store.node_count(), 2);
//! assert_eq!(store.successors(alice).unwrap(), vec![bob]);
//! ```
//!
//! Key structural choices:
//! - nodes and edges live in dense slot arrays; freed slots are recycled
//!   smallest-first and all adjacency "pointers" are slot indices
//! - per-node, per-type doubly-linked adjacency chains are threaded through
//!   the edge records themselves (head-of-chain is the most recent edge)
//! - `(source, target, type)` keys a parallel-edge table that rejects
//!   duplicates and answers mutual-edge lookups
//! - views are roaring-bitmap subsets kept coherent under base mutation

pub mod column;
pub mod config;
pub mod lock;
pub mod observer;
pub mod spatial;
pub mod store;
pub mod time;
pub mod view;

pub use config::{Config, TimeRepresentation};
pub use lock::{GraphLock, GraphVersion};
pub use observer::{GraphDiff, GraphObserver};
pub use store::{EdgeCursor, EdgeWalker, ElementKind, GraphStore, NodeWalker, Subgraph};
pub use view::ViewConfig;

pub use trellis_common::error::{GraphError, Result};
pub use trellis_common::types::{
    AttributeType, AttributeValue, ColumnId, EdgeId, EdgeTypeId, Interval, NodeId, ViewId,
};
