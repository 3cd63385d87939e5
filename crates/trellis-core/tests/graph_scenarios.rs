//! Integration scenarios over the graph core: structure, degrees, slot
//! recycling, parallel-edge and self-loop policies, versions.

use trellis_core::{AttributeValue, EdgeTypeId, GraphError, GraphStore, NodeId};

fn triangle() -> (GraphStore, NodeId, NodeId, NodeId) {
    let store = GraphStore::new();
    let a = store.add_node("A").unwrap().unwrap();
    let b = store.add_node("B").unwrap().unwrap();
    let c = store.add_node("C").unwrap().unwrap();
    store.add_edge("ab", a, b, EdgeTypeId::DEFAULT, true).unwrap().unwrap();
    store.add_edge("bc", b, c, EdgeTypeId::DEFAULT, true).unwrap().unwrap();
    store.add_edge("ca", c, a, EdgeTypeId::DEFAULT, true).unwrap().unwrap();
    (store, a, b, c)
}

#[test]
fn directed_triangle() {
    let (store, a, b, c) = triangle();

    assert_eq!(store.node_count(), 3);
    assert_eq!(store.edge_count(), 3);
    assert_eq!(store.out_degree(a).unwrap(), 1);
    assert_eq!(store.in_degree(a).unwrap(), 1);
    assert_eq!(store.degree(a).unwrap(), 2);

    let mut neighbors = store.neighbors(a).unwrap();
    neighbors.sort_unstable();
    assert_eq!(neighbors, vec![b, c]);

    let ab = store.get_edge_between(a, b, EdgeTypeId::DEFAULT).unwrap();
    assert_eq!(store.get_edge(&AttributeValue::from("ab")), Some(ab));
    assert_eq!(store.get_mutual_edge(ab), None);

    assert_eq!(store.successors(a).unwrap(), vec![b]);
    assert_eq!(store.predecessors(a).unwrap(), vec![c]);
    assert!(store.is_adjacent(a, b));
    assert!(!store.is_adjacent_of_type(a, b, EdgeTypeId::new(64)));
    assert!(store.is_directed_graph());
}

#[test]
fn parallel_edge_rejected() {
    let store = GraphStore::new();
    let a = store.add_node("A").unwrap().unwrap();
    let b = store.add_node("B").unwrap().unwrap();

    assert!(store
        .add_edge("e0", a, b, EdgeTypeId::DEFAULT, true)
        .unwrap()
        .is_some());
    // Same endpoints, same type: rejected without mutation.
    assert!(store
        .add_edge("e1", a, b, EdgeTypeId::DEFAULT, true)
        .unwrap()
        .is_none());
    assert_eq!(store.edge_count(), 1);

    // A different type is a different key.
    let likes = store.edge_type("LIKES").unwrap();
    assert!(store.add_edge("e2", a, b, likes, true).unwrap().is_some());
    assert_eq!(store.edge_count(), 2);
    assert_eq!(store.edge_count_of_type(likes), 1);
}

#[test]
fn self_loop_policy() {
    let store = GraphStore::new();
    let a = store.add_node("A").unwrap().unwrap();
    let loop_edge = store
        .add_edge("loop", a, a, EdgeTypeId::DEFAULT, true)
        .unwrap()
        .unwrap();

    assert_eq!(store.self_loops(), vec![loop_edge]);
    assert!(store.is_self_loop(loop_edge).unwrap());
    assert_eq!(store.degree(a).unwrap(), 1);
    assert_eq!(store.in_degree(a).unwrap(), 1);
    assert_eq!(store.out_degree(a).unwrap(), 1);
    assert_eq!(store.undirected_degree(a).unwrap(), 1);

    // A second self-loop of the same type is a parallel edge.
    assert!(store
        .add_edge("loop2", a, a, EdgeTypeId::DEFAULT, true)
        .unwrap()
        .is_none());

    // The loop shows up once in the node's incident edges.
    assert_eq!(store.edges_of(a).unwrap(), vec![loop_edge]);
    assert_eq!(store.neighbors(a).unwrap(), vec![a]);
}

#[test]
fn mutual_edges() {
    let store = GraphStore::new();
    let a = store.add_node("A").unwrap().unwrap();
    let b = store.add_node("B").unwrap().unwrap();
    let ab = store
        .add_edge("ab", a, b, EdgeTypeId::DEFAULT, true)
        .unwrap()
        .unwrap();
    let ba = store
        .add_edge("ba", b, a, EdgeTypeId::DEFAULT, true)
        .unwrap()
        .unwrap();

    assert_eq!(store.get_mutual_edge(ab), Some(ba));
    assert_eq!(store.get_mutual_edge(ba), Some(ab));

    // Directed degrees see both edges; the undirected sense sees one.
    assert_eq!(store.out_degree(a).unwrap() + store.in_degree(a).unwrap(), 2);
    assert_eq!(store.undirected_degree(a).unwrap(), 1);
    assert_eq!(store.undirected_degree(b).unwrap(), 1);

    store.remove_edge(ba).unwrap();
    assert_eq!(store.get_mutual_edge(ab), None);
    assert_eq!(store.undirected_degree(a).unwrap(), 1);
    assert_eq!(store.degree(a).unwrap(), 1);
}

#[test]
fn node_slot_recycling() {
    let store = GraphStore::new();
    let n1 = store.add_node("N1").unwrap().unwrap();
    let n2 = store.add_node("N2").unwrap().unwrap();
    let n3 = store.add_node("N3").unwrap().unwrap();
    assert_eq!((n1.0, n2.0, n3.0), (0, 1, 2));

    store.remove_node(n2).unwrap();
    let n4 = store.add_node("N4").unwrap().unwrap();
    assert_eq!(n4.0, 1);

    store.remove_node(n1).unwrap();
    let n5 = store.add_node("N5").unwrap().unwrap();
    let n6 = store.add_node("N6").unwrap().unwrap();
    assert_eq!(n5.0, 0);
    assert_eq!(n6.0, 3);
}

#[test]
fn edge_slot_recycling_smallest_first() {
    let store = GraphStore::new();
    let nodes: Vec<NodeId> = (0..4)
        .map(|i| store.add_node(format!("n{i}")).unwrap().unwrap())
        .collect();
    let e0 = store
        .add_edge("e0", nodes[0], nodes[1], EdgeTypeId::DEFAULT, true)
        .unwrap()
        .unwrap();
    let e1 = store
        .add_edge("e1", nodes[1], nodes[2], EdgeTypeId::DEFAULT, true)
        .unwrap()
        .unwrap();
    store
        .add_edge("e2", nodes[2], nodes[3], EdgeTypeId::DEFAULT, true)
        .unwrap()
        .unwrap();

    store.remove_edge(e1).unwrap();
    store.remove_edge(e0).unwrap();

    let e3 = store
        .add_edge("e3", nodes[0], nodes[2], EdgeTypeId::DEFAULT, true)
        .unwrap()
        .unwrap();
    assert_eq!(e3.0, 0);
    let e4 = store
        .add_edge("e4", nodes[0], nodes[3], EdgeTypeId::DEFAULT, true)
        .unwrap()
        .unwrap();
    assert_eq!(e4.0, 1);
}

#[test]
fn duplicate_node_id_is_a_noop() {
    let store = GraphStore::new();
    store.add_node("A").unwrap().unwrap();
    assert!(store.add_node("A").unwrap().is_none());
    assert_eq!(store.node_count(), 1);

    // Wrong id type errors instead.
    assert!(matches!(
        store.add_node(7i32),
        Err(GraphError::TypeMismatch { .. })
    ));
}

#[test]
fn add_remove_round_trip_restores_state() {
    let (store, a, b, c) = triangle();
    let (node_version, edge_version) = store.version();
    let degree_a = store.degree(a).unwrap();

    let d = store.add_node("D").unwrap().unwrap();
    let ad = store
        .add_edge("ad", a, d, EdgeTypeId::DEFAULT, true)
        .unwrap()
        .unwrap();
    store.remove_edge(ad).unwrap();
    store.remove_node(d).unwrap();

    assert_eq!(store.node_count(), 3);
    assert_eq!(store.edge_count(), 3);
    assert_eq!(store.degree(a).unwrap(), degree_a);
    assert_eq!(store.get_node(&AttributeValue::from("D")), None);
    assert_eq!(store.get_edge(&AttributeValue::from("ad")), None);
    let mut neighbors = store.neighbors(a).unwrap();
    neighbors.sort_unstable();
    assert_eq!(neighbors, vec![b, c]);

    // Versions move forward, never back.
    let (nv, ev) = store.version();
    assert!(nv > node_version);
    assert!(ev > edge_version);
}

#[test]
fn removing_node_removes_incident_edges() {
    let (store, a, b, c) = triangle();
    store.remove_node(b).unwrap();

    assert_eq!(store.node_count(), 2);
    assert_eq!(store.edge_count(), 1);
    assert_eq!(store.degree(a).unwrap(), 1);
    assert_eq!(store.degree(c).unwrap(), 1);
    assert_eq!(store.get_edge(&AttributeValue::from("ab")), None);
    assert_eq!(store.get_edge(&AttributeValue::from("bc")), None);
    assert!(store.get_edge(&AttributeValue::from("ca")).is_some());
}

#[test]
fn degree_sums_match_edge_count() {
    let (store, ..) = triangle();
    let mut out_sum = 0;
    let mut in_sum = 0;
    for node in store.nodes() {
        out_sum += store.out_degree(node).unwrap();
        in_sum += store.in_degree(node).unwrap();
    }
    assert_eq!(out_sum as usize, store.edge_count());
    assert_eq!(in_sum as usize, store.edge_count());
}

#[test]
fn adjacency_is_lifo() {
    let store = GraphStore::new();
    let hub = store.add_node("hub").unwrap().unwrap();
    let mut expected = Vec::new();
    for i in 0..4 {
        let spoke = store.add_node(format!("s{i}")).unwrap().unwrap();
        let edge = store
            .add_edge(format!("e{i}"), hub, spoke, EdgeTypeId::DEFAULT, true)
            .unwrap()
            .unwrap();
        expected.push(edge);
    }
    expected.reverse();
    assert_eq!(store.out_edges(hub).unwrap(), expected);
}

#[test]
fn mixed_graph_classification() {
    let store = GraphStore::new();
    let a = store.add_node("A").unwrap().unwrap();
    let b = store.add_node("B").unwrap().unwrap();
    let c = store.add_node("C").unwrap().unwrap();
    assert!(store.is_directed_graph() && store.is_undirected_graph());

    store.add_edge("d", a, b, EdgeTypeId::DEFAULT, true).unwrap().unwrap();
    assert!(store.is_directed_graph());
    assert!(!store.is_mixed_graph());

    store.add_edge("u", b, c, EdgeTypeId::DEFAULT, false).unwrap().unwrap();
    assert!(store.is_mixed_graph());

    // Undirected lookups work in both orientations.
    assert!(store.get_edge_between(c, b, EdgeTypeId::DEFAULT).is_some());
    assert!(store.get_edge_between(b, c, EdgeTypeId::DEFAULT).is_some());
}

#[test]
fn clear_and_clear_edges() {
    let (store, a, ..) = triangle();
    store.clear_edges().unwrap();
    assert_eq!(store.node_count(), 3);
    assert_eq!(store.edge_count(), 0);
    assert_eq!(store.degree(a).unwrap(), 0);
    assert_eq!(store.edge_count_of_type(EdgeTypeId::DEFAULT), 0);

    store.clear().unwrap();
    assert_eq!(store.node_count(), 0);
    assert_eq!(store.get_node(&AttributeValue::from("A")), None);

    // The store is fully reusable after a clear.
    let a2 = store.add_node("A").unwrap().unwrap();
    assert_eq!(a2, NodeId::new(0));
}

#[test]
fn clear_node_edges_via_cursor() {
    let (store, a, b, c) = triangle();
    store.clear_node_edges(a).unwrap();

    assert_eq!(store.degree(a).unwrap(), 0);
    assert_eq!(store.edge_count(), 1);
    assert!(store.get_edge_between(b, c, EdgeTypeId::DEFAULT).is_some());
}

#[test]
fn cursor_interleaves_removal_with_iteration() {
    let store = GraphStore::new();
    let hub = store.add_node("hub").unwrap().unwrap();
    for i in 0..6 {
        let spoke = store.add_node(format!("s{i}")).unwrap().unwrap();
        store
            .add_edge(format!("e{i}"), hub, spoke, EdgeTypeId::DEFAULT, true)
            .unwrap()
            .unwrap();
    }

    // Remove every other edge mid-iteration.
    let mut cursor = store.edge_cursor(hub).unwrap();
    let mut keep = true;
    let mut visited = 0;
    while cursor.next_edge().is_some() {
        visited += 1;
        if !keep {
            cursor.remove_current().unwrap();
        }
        keep = !keep;
    }
    drop(cursor);

    assert_eq!(visited, 6);
    assert_eq!(store.degree(hub).unwrap(), 3);
    assert_eq!(store.edge_count(), 3);
}

#[test]
fn cursor_remove_twice_is_an_error() {
    let store = GraphStore::new();
    let a = store.add_node("A").unwrap().unwrap();
    let b = store.add_node("B").unwrap().unwrap();
    store.add_edge("ab", a, b, EdgeTypeId::DEFAULT, true).unwrap().unwrap();

    let mut cursor = store.edge_cursor(a).unwrap();
    assert!(cursor.next_edge().is_some());
    cursor.remove_current().unwrap();
    assert!(matches!(
        cursor.remove_current(),
        Err(GraphError::ProgrammingError(_))
    ));
}

#[test]
fn walker_detects_structural_change() {
    let (store, ..) = triangle();
    let mut walker = store.node_walker();
    assert!(walker.try_next().unwrap().is_some());

    store.add_node("D").unwrap().unwrap();
    assert!(matches!(walker.try_next(), Err(GraphError::StaleIterator)));

    // A resilient walker keeps going over the changed store.
    let mut walker = store.node_walker().resilient();
    store.add_node("E").unwrap().unwrap();
    let mut count = 0;
    while walker.try_next().unwrap().is_some() {
        count += 1;
    }
    assert_eq!(count, 5);
}

#[test]
fn stale_handles_are_rejected() {
    let store = GraphStore::new();
    let a = store.add_node("A").unwrap().unwrap();
    store.remove_node(a).unwrap();

    assert!(matches!(store.degree(a), Err(GraphError::NotOwned)));
    assert!(matches!(store.remove_node(a), Err(GraphError::NotOwned)));
    assert!(matches!(
        store.add_edge("e", a, a, EdgeTypeId::DEFAULT, true),
        Err(GraphError::NotOwned)
    ));
}

#[test]
fn deep_equals_ignores_versions() {
    let (x, ..) = triangle();
    let (y, ..) = triangle();
    assert!(x.deep_equals(&y));
    assert!(x.deep_equals(&x));

    // Extra churn on one store changes versions but not content.
    let tmp = y.add_node("tmp").unwrap().unwrap();
    y.remove_node(tmp).unwrap();
    assert!(x.deep_equals(&y));
    assert_ne!(x.version(), y.version());

    y.set_edge_weight(y.get_edge(&AttributeValue::from("ab")).unwrap(), 2.0)
        .unwrap();
    assert!(!x.deep_equals(&y));
}

#[test]
fn bulk_adds() {
    let store = GraphStore::new();
    let added = store
        .add_all_nodes(["a", "b", "c", "a"])
        .unwrap();
    assert_eq!(added, 3);

    let a = store.get_node(&AttributeValue::from("a")).unwrap();
    let b = store.get_node(&AttributeValue::from("b")).unwrap();
    let c = store.get_node(&AttributeValue::from("c")).unwrap();
    let added = store
        .add_all_edges([
            (AttributeValue::from("ab"), a, b, EdgeTypeId::DEFAULT, true),
            (AttributeValue::from("bc"), b, c, EdgeTypeId::DEFAULT, true),
            (AttributeValue::from("ab2"), a, b, EdgeTypeId::DEFAULT, true),
        ])
        .unwrap();
    assert_eq!(added, 2);
    assert_eq!(store.edge_count(), 2);
}
