//! Integration scenarios over views, columnar attributes, secondary
//! indices, the time layer, observers and the locking contract.

use trellis_core::column::Column;
use trellis_core::{
    AttributeType, AttributeValue, Config, EdgeTypeId, ElementKind, GraphError, GraphStore,
    Interval, ViewConfig, ViewId,
};

fn pair() -> (GraphStore, trellis_core::NodeId, trellis_core::NodeId) {
    let store = GraphStore::new();
    let a = store.add_node("A").unwrap().unwrap();
    let b = store.add_node("B").unwrap().unwrap();
    (store, a, b)
}

// === Views ===

#[test]
fn view_coherence_under_base_mutation() {
    let (store, a, b) = pair();
    let manual = store.create_view().unwrap();
    let auto = store
        .create_view_with(ViewConfig {
            auto_include: true,
            ..Default::default()
        })
        .unwrap();
    for view in [manual, auto] {
        store.view_add_node(view, a).unwrap();
        store.view_add_node(view, b).unwrap();
    }

    let ab = store
        .add_edge("ab", a, b, EdgeTypeId::DEFAULT, true)
        .unwrap()
        .unwrap();

    // Only the auto-include view picked up the new edge.
    assert_eq!(store.view_edge_count(manual).unwrap(), 0);
    assert_eq!(store.view_edge_count(auto).unwrap(), 1);

    store.view_add_edge(manual, ab).unwrap();
    assert_eq!(store.view_edge_count(manual).unwrap(), 1);

    // Removing the base node clears both bitsets in every view.
    store.remove_node(a).unwrap();
    for view in [manual, auto] {
        assert!(!store.view_contains_node(view, a).unwrap());
        assert_eq!(store.view_edge_count(view).unwrap(), 0);
    }
}

#[test]
fn view_set_algebra() {
    let (store, a, b) = pair();
    let c = store.add_node("C").unwrap().unwrap();
    let ab = store
        .add_edge("ab", a, b, EdgeTypeId::DEFAULT, true)
        .unwrap()
        .unwrap();
    store
        .add_edge("bc", b, c, EdgeTypeId::DEFAULT, true)
        .unwrap()
        .unwrap();

    let v = store.create_view().unwrap();
    let w = store.create_view().unwrap();
    store.view_add_node(v, a).unwrap();
    store.view_add_node(w, a).unwrap();
    store.view_add_node(w, b).unwrap();
    store.view_add_edge(w, ab).unwrap();

    store.view_union(v, w).unwrap();
    assert_eq!(store.view_node_count(v).unwrap(), 2);
    assert_eq!(store.view_edge_count(v).unwrap(), 1);

    // union then intersection with the same operand is identity.
    store.view_intersection(v, w).unwrap();
    assert_eq!(store.view_node_count(v).unwrap(), 2);
    assert_eq!(store.view_edge_count(v).unwrap(), 1);

    store.view_not(v).unwrap();
    assert!(!store.view_contains_node(v, a).unwrap());
    assert!(store.view_contains_node(v, c).unwrap());

    store.view_fill(v).unwrap();
    assert_eq!(store.view_node_count(v).unwrap(), 3);
    assert_eq!(store.view_edge_count(v).unwrap(), 2);

    store.view_clear(v).unwrap();
    assert_eq!(store.view_node_count(v).unwrap(), 0);
}

#[test]
fn main_view_rejects_set_algebra() {
    let store = GraphStore::new();
    let main = store.main_view();
    let v = store.create_view().unwrap();

    assert!(matches!(
        store.view_union(main, v),
        Err(GraphError::Unsupported(_))
    ));
    assert!(matches!(
        store.view_not(main),
        Err(GraphError::Unsupported(_))
    ));
    assert!(matches!(
        store.view_fill(main),
        Err(GraphError::Unsupported(_))
    ));
}

#[test]
fn destroyed_view_rejects_operations() {
    let (store, a, _b) = pair();
    let v = store.create_view().unwrap();
    store.destroy_view(v).unwrap();

    assert!(matches!(
        store.view_add_node(v, a),
        Err(GraphError::NotOwned)
    ));
    assert!(matches!(store.destroy_view(v), Err(GraphError::NotOwned)));

    // The freed id is recycled smallest-first.
    let v2 = store.create_view().unwrap();
    assert_eq!(v2, v);
}

#[test]
fn subgraph_restricts_the_graph_interface() {
    let (store, a, b) = pair();
    let c = store.add_node("C").unwrap().unwrap();
    let ab = store
        .add_edge("ab", a, b, EdgeTypeId::DEFAULT, true)
        .unwrap()
        .unwrap();
    store
        .add_edge("bc", b, c, EdgeTypeId::DEFAULT, true)
        .unwrap()
        .unwrap();

    let v = store.create_view().unwrap();
    store.view_add_node(v, a).unwrap();
    store.view_add_node(v, b).unwrap();
    store.view_add_edge(v, ab).unwrap();

    let sub = store.subgraph(v).unwrap();
    assert_eq!(sub.node_count(), 2);
    assert_eq!(sub.edge_count(), 1);
    assert!(sub.contains_node(a));
    assert!(!sub.contains_node(c));
    assert!(sub.contains_edge(ab));

    // b touches two base edges but only one view edge.
    assert_eq!(sub.degree(b).unwrap(), 1);
    assert_eq!(sub.in_degree(b).unwrap(), 1);
    assert_eq!(sub.out_degree(b).unwrap(), 0);
    assert_eq!(sub.neighbors(b).unwrap(), vec![a]);
    assert_eq!(sub.edges_of(b).unwrap(), vec![ab]);

    // The main view exposes the whole base graph.
    let main = store.subgraph(ViewId::MAIN).unwrap();
    assert_eq!(main.node_count(), 3);
    assert_eq!(main.edge_count(), 2);
    assert_eq!(main.degree(b).unwrap(), 2);
}

#[test]
fn node_only_view_derives_edges() {
    let (store, a, b) = pair();
    store
        .add_edge("ab", a, b, EdgeTypeId::DEFAULT, true)
        .unwrap()
        .unwrap();
    let v = store
        .create_view_with(ViewConfig {
            node_view_only: true,
            ..Default::default()
        })
        .unwrap();
    store.view_add_node(v, a).unwrap();
    assert_eq!(store.view_edge_count(v).unwrap(), 0);

    store.view_add_node(v, b).unwrap();
    assert_eq!(store.view_edge_count(v).unwrap(), 1);
}

// === Columns & indices ===

#[test]
fn weight_index_range_queries() {
    let (store, a, b) = pair();
    let c = store.add_node("C").unwrap().unwrap();
    let e1 = store
        .add_edge("e1", a, b, EdgeTypeId::DEFAULT, true)
        .unwrap()
        .unwrap();
    let e2 = store
        .add_edge("e2", b, c, EdgeTypeId::DEFAULT, true)
        .unwrap()
        .unwrap();
    let e3 = store
        .add_edge("e3", c, a, EdgeTypeId::DEFAULT, true)
        .unwrap()
        .unwrap();

    store.set_edge_weight(e1, 0.5).unwrap();
    store.set_edge_weight(e2, 1.5).unwrap();
    store.set_edge_weight(e3, 1.0).unwrap();

    assert_eq!(
        store.index_min_value(ElementKind::Edge, "weight").unwrap(),
        Some(AttributeValue::Double(0.5))
    );
    assert_eq!(
        store.index_max_value(ElementKind::Edge, "weight").unwrap(),
        Some(AttributeValue::Double(1.5))
    );
    assert_eq!(
        store
            .count_edges_with("weight", &AttributeValue::Double(1.0))
            .unwrap(),
        1
    );
    assert_eq!(
        store.edges_with("weight", &AttributeValue::Double(1.5)).unwrap(),
        vec![e2]
    );
    assert!(store.index_is_sortable(ElementKind::Edge, "weight").unwrap());

    let values = store.index_values(ElementKind::Edge, "weight").unwrap();
    assert_eq!(
        values,
        vec![
            AttributeValue::Double(0.5),
            AttributeValue::Double(1.0),
            AttributeValue::Double(1.5)
        ]
    );
}

#[test]
fn defaults_appear_in_the_index() {
    let (store, a, b) = pair();
    store
        .add_edge("ab", a, b, EdgeTypeId::DEFAULT, true)
        .unwrap()
        .unwrap();

    // The weight default (1.0) is registered at insertion.
    assert_eq!(
        store
            .count_edges_with("weight", &AttributeValue::Double(1.0))
            .unwrap(),
        1
    );
}

#[test]
fn user_columns_grow_existing_elements() {
    let (store, a, _b) = pair();
    let col = store
        .add_column(
            ElementKind::Node,
            Column::new("age", AttributeType::Integer)
                .with_default(AttributeValue::Integer(0))
                .indexed(),
        )
        .unwrap();

    // Existing elements carry the default, and the default is indexed.
    assert_eq!(
        store.get_node_attribute(a, "age").unwrap(),
        AttributeValue::Integer(0)
    );
    assert_eq!(
        store.count_nodes_with("age", &AttributeValue::Integer(0)).unwrap(),
        2
    );

    store.set_node_attribute(a, "age", 33i32).unwrap();
    assert_eq!(
        store.nodes_with("age", &AttributeValue::Integer(33)).unwrap(),
        vec![a]
    );
    assert_eq!(
        store.count_nodes_with("age", &AttributeValue::Integer(0)).unwrap(),
        1
    );

    // Removing the column drops values and index entries; the id is dead.
    store.remove_column(ElementKind::Node, col).unwrap();
    assert!(store.get_node_attribute(a, "age").is_err());
    assert!(store.get_column(ElementKind::Node, "age").is_none());
}

#[test]
fn attribute_type_and_read_only_enforcement() {
    let (store, a, _b) = pair();
    store
        .add_column(ElementKind::Node, Column::new("age", AttributeType::Integer))
        .unwrap();

    assert!(matches!(
        store.set_node_attribute(a, "age", "old"),
        Err(GraphError::TypeMismatch { .. })
    ));
    assert!(matches!(
        store.set_node_attribute(a, "id", "other"),
        Err(GraphError::Unsupported(_))
    ));
    assert!(matches!(
        store.set_node_attribute(a, "nope", 1i32),
        Err(GraphError::NotOwned)
    ));

    // Duplicate column keys are rejected, case-insensitively.
    assert!(matches!(
        store.add_column(ElementKind::Node, Column::new("AGE", AttributeType::Long)),
        Err(GraphError::Duplicate)
    ));
}

#[test]
fn removed_element_leaves_the_index() {
    let (store, a, b) = pair();
    store
        .add_column(
            ElementKind::Node,
            Column::new("city", AttributeType::String).indexed(),
        )
        .unwrap();
    store.set_node_attribute(a, "city", "oslo").unwrap();
    store.set_node_attribute(b, "city", "oslo").unwrap();
    assert_eq!(
        store.count_nodes_with("city", &AttributeValue::from("oslo")).unwrap(),
        2
    );

    store.remove_node(a).unwrap();
    assert_eq!(
        store.nodes_with("city", &AttributeValue::from("oslo")).unwrap(),
        vec![b]
    );
}

// === Dynamic attributes & the time layer ===

#[test]
fn timestamped_attributes_and_time_index() {
    let (store, a, b) = pair();
    store
        .add_column(
            ElementKind::Node,
            Column::new("size", AttributeType::TimestampMap),
        )
        .unwrap();

    store.set_node_attribute_at(a, "size", 1.0f64, 2000.0).unwrap();
    store.set_node_attribute_at(a, "size", 2.0f64, 2005.0).unwrap();
    store.set_node_attribute_at(b, "size", 3.0f64, 2005.0).unwrap();

    assert_eq!(
        store.get_node_attribute_at(a, "size", 2000.0).unwrap(),
        Some(AttributeValue::Double(1.0))
    );
    assert_eq!(store.get_node_attribute_at(a, "size", 2001.0).unwrap(), None);

    let probe = Interval::new(2004.0, 2006.0).unwrap();
    assert_eq!(
        store.get_node_attribute_over(a, "size", &probe).unwrap(),
        Some(AttributeValue::Double(2.0))
    );

    // The reverse index answers "who is active at t".
    assert_eq!(store.nodes_at(2000.0), vec![a]);
    let mut at_2005 = store.nodes_at(2005.0);
    at_2005.sort_unstable();
    assert_eq!(at_2005, vec![a, b]);
    assert_eq!(store.time_min(ElementKind::Node), Some(2000.0));
    assert_eq!(store.time_max(ElementKind::Node), Some(2005.0));

    // Removal purges the reverse index.
    store.remove_node(a).unwrap();
    assert_eq!(store.nodes_at(2000.0), Vec::<trellis_core::NodeId>::new());
}

#[test]
fn interval_representation() {
    let config = Config::default()
        .with_interval_representation()
        .with_edge_weight_type(AttributeType::IntervalMap);
    let store = GraphStore::with_config(config).unwrap();
    let a = store.add_node("A").unwrap().unwrap();
    store
        .add_column(
            ElementKind::Node,
            Column::new("size", AttributeType::IntervalMap),
        )
        .unwrap();

    let early = Interval::new(2000.0, 2004.0).unwrap();
    let late = Interval::new(2005.0, 2009.0).unwrap();
    store.set_node_attribute_over(a, "size", 1.0f64, early).unwrap();
    store.set_node_attribute_over(a, "size", 2.0f64, late).unwrap();

    assert_eq!(
        store.get_node_attribute_at(a, "size", 2001.0).unwrap(),
        Some(AttributeValue::Double(1.0))
    );
    assert_eq!(
        store
            .get_node_attribute_over(a, "size", &Interval::new(2006.0, 2007.0).unwrap())
            .unwrap(),
        Some(AttributeValue::Double(2.0))
    );
    assert_eq!(store.nodes_at(2003.0), vec![a]);
    assert_eq!(
        store.nodes_overlapping(&Interval::new(2008.0, 2020.0).unwrap()),
        vec![a]
    );

    // Timestamp sets are rejected under interval representation.
    assert!(matches!(
        store.set_node_attribute_at(a, "size", 1.0f64, 2000.0),
        Err(GraphError::Unsupported(_))
    ));
}

#[test]
fn dynamic_edge_weight() {
    let config = Config::default().with_edge_weight_type(AttributeType::TimestampMap);
    let store = GraphStore::with_config(config).unwrap();
    let a = store.add_node("A").unwrap().unwrap();
    let b = store.add_node("B").unwrap().unwrap();
    let ab = store
        .add_edge("ab", a, b, EdgeTypeId::DEFAULT, true)
        .unwrap()
        .unwrap();

    store.set_edge_weight_at(ab, 0.5, 2000.0).unwrap();
    store.set_edge_weight_at(ab, 2.5, 2010.0).unwrap();

    assert_eq!(store.edge_weight_at(ab, 2000.0).unwrap(), Some(0.5));
    assert_eq!(store.edge_weight_at(ab, 2010.0).unwrap(), Some(2.5));
    assert_eq!(store.edge_weight_at(ab, 1999.0).unwrap(), None);
    assert!(store.edge_weight(ab).is_err());
    assert_eq!(store.edges_at(2000.0), vec![ab]);
}

#[test]
fn graph_level_attributes() {
    let store = GraphStore::new();
    assert!(store.set_attribute("title", "demo").unwrap().is_none());
    assert_eq!(
        store.get_attribute("title"),
        Some(AttributeValue::from("demo"))
    );

    store.set_attribute_at("population", 100i64, 2000.0).unwrap();
    store.set_attribute_at("population", 200i64, 2010.0).unwrap();
    assert_eq!(
        store.get_attribute_at("population", 2010.0),
        Some(AttributeValue::Long(200))
    );
    assert_eq!(store.get_attribute_at("population", 2005.0), None);

    let mut keys = store.attribute_keys();
    keys.sort_unstable();
    assert_eq!(keys, vec!["population", "title"]);

    store.remove_attribute("title").unwrap();
    assert_eq!(store.get_attribute("title"), None);
}

// === Observers ===

#[test]
fn observer_versions_and_diffs() {
    let store = GraphStore::new();
    let observer = store.create_observer(true).unwrap();
    assert!(!observer.has_graph_changed().unwrap());

    let a = store.add_node("A").unwrap().unwrap();
    let b = store.add_node("B").unwrap().unwrap();
    let ab = store
        .add_edge("ab", a, b, EdgeTypeId::DEFAULT, true)
        .unwrap()
        .unwrap();
    assert!(observer.has_graph_changed().unwrap());
    assert!(!observer.has_graph_changed().unwrap());

    let diff = observer.get_diff().unwrap();
    assert_eq!(diff.added_nodes, vec![a, b]);
    assert_eq!(diff.added_edges, vec![ab]);
    assert!(diff.removed_nodes.is_empty());

    // Add-then-remove between polls cancels out.
    let tmp = store.add_node("tmp").unwrap().unwrap();
    store.remove_node(tmp).unwrap();
    let diff = observer.get_diff().unwrap();
    assert!(diff.is_empty());

    store.remove_edge(ab).unwrap();
    let diff = observer.get_diff().unwrap();
    assert_eq!(diff.removed_edges, vec![ab]);

    store.destroy_observer(&observer).unwrap();
    assert!(observer.has_graph_changed().is_err());
    assert!(matches!(
        store.destroy_observer(&observer),
        Err(GraphError::NotOwned)
    ));
}

#[test]
fn observers_disabled_by_config() {
    let store = GraphStore::with_config(Config::default().without_observers()).unwrap();
    assert!(matches!(
        store.create_observer(false),
        Err(GraphError::Unsupported(_))
    ));

    // Version counters stay frozen without observers.
    store.add_node("A").unwrap().unwrap();
    assert_eq!(store.version(), (0, 0));
}

// === Locking contract ===

#[test]
fn manual_locking_mode() {
    let store = GraphStore::with_config(Config::default().without_auto_locking()).unwrap();
    store.write_lock().unwrap();
    let a = store.add_node("A").unwrap().unwrap();
    store.write_unlock().unwrap();

    store.read_lock();
    assert_eq!(store.degree(a).unwrap(), 0);
    // Upgrading a held read lock is a programming error.
    assert!(matches!(
        store.write_lock(),
        Err(GraphError::ProgrammingError(_))
    ));
    store.read_unlock().unwrap();
}

#[test]
fn auto_locking_rejects_upgrade_from_held_read() {
    let store = GraphStore::new();
    store.add_node("A").unwrap().unwrap();

    store.read_lock();
    // The mutator auto-acquires the write lock and trips on the held read.
    assert!(matches!(
        store.add_node("B"),
        Err(GraphError::ProgrammingError(_))
    ));
    store.read_unlock_all();

    assert!(store.add_node("B").unwrap().is_some());
}

#[test]
fn graph_shape_queries_under_config() {
    let store = GraphStore::with_config(Config::default().without_edge_weight_column()).unwrap();
    let a = store.add_node("A").unwrap().unwrap();
    let b = store.add_node("B").unwrap().unwrap();
    let ab = store
        .add_edge("ab", a, b, EdgeTypeId::DEFAULT, true)
        .unwrap()
        .unwrap();

    assert!(matches!(
        store.edge_weight(ab),
        Err(GraphError::Unsupported(_))
    ));
    assert!(store.get_column(ElementKind::Edge, "weight").is_none());
}
