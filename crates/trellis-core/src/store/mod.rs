//! The graph store facade.
//!
//! [`GraphStore`] owns every component - node/edge slot stores, the edge
//! type catalog, tables and indices, the time store, views and observers -
//! and orchestrates them under a single writer discipline: all state lives
//! behind one inner `RwLock`, and the advisory [`GraphLock`] carries the
//! observable locking contract for callers that drive locking manually.
//!
//! Mutators validate, delegate to the component stores, then fan out to the
//! dependents: type counts, views, column indices, the time store, version
//! counters and observer diffs.

mod attributes;
pub mod edge;
pub mod edge_type;
pub mod iter;
pub mod node;
mod views;

use arcstr::ArcStr;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;
use trellis_common::collections::{FxHashMap, FxHashSet};
use trellis_common::error::{GraphError, Result};
use trellis_common::types::{
    AttributeType, AttributeValue, ColumnId, EdgeId, EdgeTypeId, HashableValue, Interval,
    IntervalMap, IntervalSet, NodeId, TimestampMap, TimestampSet,
};

use crate::column::index::IndexStore;
use crate::column::{Column, Origin, Table};
use crate::config::{Config, TimeRepresentation};
use crate::lock::{GraphLock, GraphVersion};
use crate::observer::{GraphObserver, ObserverRegistry};
use crate::spatial::SpatialIndex;
use crate::time::TimeStore;
use crate::view::ViewStore;

use edge::{ChainKind, EdgeRecord, EdgeStore};
use edge_type::EdgeTypeStore;
use node::{NodeRecord, NodeStore};

pub use iter::{EdgeCursor, EdgeWalker, NodeWalker, Subgraph};

/// The column key of the built-in user id column.
pub const ID_COLUMN: &str = "id";
/// The column key of the built-in label column.
pub const LABEL_COLUMN: &str = "label";
/// The column key of the built-in edge weight column.
pub const WEIGHT_COLUMN: &str = "weight";
/// The column key of the built-in timeset column (timestamp representation).
pub const TIMESTAMP_COLUMN: &str = "timestamp";
/// The column key of the built-in timeset column (interval representation).
pub const INTERVAL_COLUMN: &str = "interval";

/// Which element kind an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// Nodes.
    Node,
    /// Edges.
    Edge,
}

/// Graph-level attributes: a keyed value map with optional time indexing.
#[derive(Default)]
pub(crate) struct GraphAttributes {
    values: FxHashMap<ArcStr, AttributeValue>,
}

impl GraphAttributes {
    fn set(&mut self, key: &str, value: AttributeValue) -> Option<AttributeValue> {
        self.values.insert(ArcStr::from(key), value)
    }

    fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.values.get(key)
    }

    fn remove(&mut self, key: &str) -> Option<AttributeValue> {
        self.values.remove(key)
    }

    fn keys(&self) -> Vec<String> {
        self.values.keys().map(|k| k.to_string()).collect()
    }

    fn set_at(&mut self, key: &str, value: AttributeValue, timestamp: f64) -> Result<()> {
        let slot = self
            .values
            .entry(ArcStr::from(key))
            .or_insert_with(|| AttributeValue::TimestampMap(Arc::new(TimestampMap::new())));
        match slot {
            AttributeValue::TimestampMap(map) => {
                Arc::make_mut(map).put(timestamp, value);
                Ok(())
            }
            _ => Err(GraphError::Unsupported(
                "attribute already holds a static value",
            )),
        }
    }

    fn set_over(&mut self, key: &str, value: AttributeValue, interval: Interval) -> Result<()> {
        let slot = self
            .values
            .entry(ArcStr::from(key))
            .or_insert_with(|| AttributeValue::IntervalMap(Arc::new(IntervalMap::new())));
        match slot {
            AttributeValue::IntervalMap(map) => {
                Arc::make_mut(map).put(interval, value);
                Ok(())
            }
            _ => Err(GraphError::Unsupported(
                "attribute already holds a static value",
            )),
        }
    }

    fn clear(&mut self) {
        self.values.clear();
    }
}

/// All mutable graph state, guarded by the store's inner lock.
pub(crate) struct GraphInner {
    pub(crate) config: Config,
    pub(crate) nodes: NodeStore,
    pub(crate) edges: EdgeStore,
    pub(crate) edge_types: EdgeTypeStore,
    pub(crate) node_table: Table,
    pub(crate) edge_table: Table,
    pub(crate) node_index: IndexStore,
    pub(crate) edge_index: IndexStore,
    pub(crate) views: ViewStore,
    pub(crate) time: TimeStore,
    pub(crate) attributes: GraphAttributes,
    pub(crate) spatial: Option<Box<dyn SpatialIndex>>,
}

/// Outcome of removing a node: the freed record plus every edge that went
/// with it, for version/observer bookkeeping.
pub(crate) struct NodeRemoval {
    pub(crate) node: NodeId,
    pub(crate) removed_edges: Vec<EdgeId>,
}

impl GraphInner {
    fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let mut inner = Self {
            nodes: NodeStore::new(),
            edges: EdgeStore::new(),
            edge_types: EdgeTypeStore::new(),
            node_table: Table::new(),
            edge_table: Table::new(),
            node_index: IndexStore::new(),
            edge_index: IndexStore::new(),
            views: ViewStore::new(),
            time: TimeStore::new(config.enable_index_time),
            attributes: GraphAttributes::default(),
            spatial: None,
            config,
        };
        inner.install_default_columns();
        Ok(inner)
    }

    fn install_default_columns(&mut self) {
        let config = self.config.clone();
        let timeset_column = || match config.time_representation {
            TimeRepresentation::Timestamp => {
                Column::new(TIMESTAMP_COLUMN, AttributeType::TimestampSet)
                    .with_title("Timestamp")
                    .with_origin(Origin::Property)
            }
            TimeRepresentation::Interval => Column::new(INTERVAL_COLUMN, AttributeType::IntervalSet)
                .with_title("Interval")
                .with_origin(Origin::Property),
        };

        for (table, index, id_type) in [
            (&mut self.node_table, &mut self.node_index, config.node_id_type),
            (&mut self.edge_table, &mut self.edge_index, config.edge_id_type),
        ] {
            let id = table
                .add_column(
                    Column::new(ID_COLUMN, id_type)
                        .with_title("Id")
                        .with_origin(Origin::Property)
                        .read_only(),
                )
                .expect("fresh table accepts the id column");
            index.on_column_added(table.column_by_id(id).expect("just added"));

            let label = table
                .add_column(
                    Column::new(LABEL_COLUMN, AttributeType::String)
                        .with_title("Label")
                        .with_origin(Origin::Property),
                )
                .expect("fresh table accepts the label column");
            index.on_column_added(table.column_by_id(label).expect("just added"));

            let timeset = table
                .add_column(timeset_column())
                .expect("fresh table accepts the timeset column");
            index.on_column_added(table.column_by_id(timeset).expect("just added"));
        }

        if config.edge_weight_column {
            let default = if config.edge_weight_type == AttributeType::Double {
                AttributeValue::Double(1.0)
            } else {
                AttributeValue::Null
            };
            let weight = self
                .edge_table
                .add_column(
                    Column::new(WEIGHT_COLUMN, config.edge_weight_type)
                        .with_title("Weight")
                        .with_origin(Origin::Property)
                        .with_default(default)
                        .indexed(),
                )
                .expect("fresh table accepts the weight column");
            self.edge_index
                .on_column_added(self.edge_table.column_by_id(weight).expect("just added"));
        }
    }

    fn table(&self, kind: ElementKind) -> &Table {
        match kind {
            ElementKind::Node => &self.node_table,
            ElementKind::Edge => &self.edge_table,
        }
    }

    fn index(&self, kind: ElementKind) -> &IndexStore {
        match kind {
            ElementKind::Node => &self.node_index,
            ElementKind::Edge => &self.edge_index,
        }
    }

    fn node_record(&self, node: NodeId) -> Result<&NodeRecord> {
        self.nodes.record(node).ok_or(GraphError::NotOwned)
    }

    pub(crate) fn views_and_nodes(&mut self) -> (&mut ViewStore, &NodeStore) {
        (&mut self.views, &self.nodes)
    }

    pub(crate) fn views_nodes_edges(&mut self) -> (&mut ViewStore, &NodeStore, &EdgeStore) {
        (&mut self.views, &self.nodes, &self.edges)
    }

    fn edge_record(&self, edge: EdgeId) -> Result<&EdgeRecord> {
        self.edges.record(edge).ok_or(GraphError::NotOwned)
    }

    pub(crate) fn add_node_internal(&mut self, id: AttributeValue) -> Result<Option<NodeId>> {
        if id.is_null() {
            return Err(GraphError::NullArgument);
        }
        if !self.config.node_id_type.is_assignable(&id) {
            return Err(GraphError::TypeMismatch {
                expected: self.config.node_id_type,
                actual: id.attribute_type(),
            });
        }
        let key = HashableValue::new(id.clone());
        let Some(slot) = self.nodes.add(key, self.edge_types.capacity()) else {
            return Ok(None);
        };

        let mut attributes = self.node_table.default_attributes();
        let id_slot = self
            .node_table
            .column(ID_COLUMN)
            .expect("id column always exists")
            .store_id();
        attributes[id_slot.index()] = id;
        for column in self.node_table.iter() {
            self.node_index
                .put(column.store_id(), &attributes[column.store_id().index()], slot.0);
        }
        self.nodes
            .record_mut(slot)
            .expect("just added")
            .attributes = attributes;

        self.views.on_base_node_added(slot);
        if self.config.enable_spatial_index {
            if let Some(spatial) = self.spatial.as_mut() {
                spatial.node_added(slot);
            }
        }
        Ok(Some(slot))
    }

    pub(crate) fn remove_node_internal(&mut self, node: NodeId) -> Result<NodeRemoval> {
        let record = self.node_record(node)?;
        let incident = self.edges.incident_edges(record);
        let mut removed_edges = Vec::with_capacity(incident.len());
        for edge in incident {
            self.remove_edge_internal(edge)?;
            removed_edges.push(edge);
        }

        let record = self.nodes.remove(node).expect("checked above");
        for column in self.node_table.iter() {
            let slot = column.store_id().index();
            if let Some(value) = record.attributes.get(slot) {
                self.node_index.remove(column.store_id(), value, node.0);
            }
        }
        self.time.node_removed(node.0);
        self.views.on_base_node_removed(node);
        if self.config.enable_spatial_index {
            if let Some(spatial) = self.spatial.as_mut() {
                spatial.node_removed(node);
            }
        }
        Ok(NodeRemoval {
            node,
            removed_edges,
        })
    }

    pub(crate) fn add_edge_internal(
        &mut self,
        id: AttributeValue,
        source: NodeId,
        target: NodeId,
        ty: EdgeTypeId,
        directed: bool,
    ) -> Result<Option<EdgeId>> {
        if id.is_null() {
            return Err(GraphError::NullArgument);
        }
        if !self.config.edge_id_type.is_assignable(&id) {
            return Err(GraphError::TypeMismatch {
                expected: self.config.edge_id_type,
                actual: id.attribute_type(),
            });
        }
        if !self.nodes.contains(source) || !self.nodes.contains(target) {
            return Err(GraphError::NotOwned);
        }
        if !self.edge_types.contains(ty) {
            return Err(GraphError::NotOwned);
        }

        let key = HashableValue::new(id.clone());
        let capacity = self.edge_types.capacity();
        let Some(slot) = self
            .edges
            .add(key, source, target, ty, directed, &mut self.nodes, capacity)
        else {
            return Ok(None);
        };

        let mut attributes = self.edge_table.default_attributes();
        let id_slot = self
            .edge_table
            .column(ID_COLUMN)
            .expect("id column always exists")
            .store_id();
        attributes[id_slot.index()] = id;
        for column in self.edge_table.iter() {
            self.edge_index
                .put(column.store_id(), &attributes[column.store_id().index()], slot.0);
        }
        self.edges
            .record_mut(slot)
            .expect("just added")
            .attributes = attributes;

        self.edge_types.increment(ty);
        let record = self.edges.record(slot).expect("just added");
        self.views.on_base_edge_added(record);
        if self.config.enable_spatial_index {
            if let Some(spatial) = self.spatial.as_mut() {
                spatial.edge_added(slot);
            }
        }
        Ok(Some(slot))
    }

    pub(crate) fn remove_edge_internal(&mut self, edge: EdgeId) -> Result<EdgeRecord> {
        if !self.edges.contains(edge) {
            return Err(GraphError::NotOwned);
        }
        let record = self
            .edges
            .remove(edge, &mut self.nodes)
            .expect("checked above");
        for column in self.edge_table.iter() {
            let slot = column.store_id().index();
            if let Some(value) = record.attributes.get(slot) {
                self.edge_index.remove(column.store_id(), value, edge.0);
            }
        }
        self.edge_types.decrement(record.type_id);
        self.time.edge_removed(edge.0);
        self.views.on_base_edge_removed(edge);
        if self.config.enable_spatial_index {
            if let Some(spatial) = self.spatial.as_mut() {
                spatial.edge_removed(edge);
            }
        }
        Ok(record)
    }

    fn attributes_of(&self, kind: ElementKind, element: u32) -> Result<&Vec<AttributeValue>> {
        match kind {
            ElementKind::Node => Ok(&self.node_record(NodeId::new(element))?.attributes),
            ElementKind::Edge => Ok(&self.edge_record(EdgeId::new(element))?.attributes),
        }
    }

    fn attributes_of_mut(
        &mut self,
        kind: ElementKind,
        element: u32,
    ) -> Result<&mut Vec<AttributeValue>> {
        match kind {
            ElementKind::Node => Ok(&mut self
                .nodes
                .record_mut(NodeId::new(element))
                .ok_or(GraphError::NotOwned)?
                .attributes),
            ElementKind::Edge => Ok(&mut self
                .edges
                .record_mut(EdgeId::new(element))
                .ok_or(GraphError::NotOwned)?
                .attributes),
        }
    }

    fn column_for(&self, kind: ElementKind, key: &str) -> Result<Column> {
        self.table(kind)
            .column(key)
            .cloned()
            .ok_or(GraphError::NotOwned)
    }

    pub(crate) fn set_attribute_internal(
        &mut self,
        kind: ElementKind,
        element: u32,
        key: &str,
        value: AttributeValue,
    ) -> Result<AttributeValue> {
        let column = self.column_for(kind, key)?;
        if column.is_read_only() {
            return Err(GraphError::Unsupported("column is read-only"));
        }
        if !column.value_type().is_assignable(&value) {
            return Err(GraphError::TypeMismatch {
                expected: column.value_type(),
                actual: value.attribute_type(),
            });
        }
        let slot = column.store_id().index();
        let attributes = self.attributes_of_mut(kind, element)?;
        while attributes.len() <= slot {
            attributes.push(AttributeValue::Null);
        }
        let old = std::mem::replace(&mut attributes[slot], value.clone());
        match kind {
            ElementKind::Node => {
                self.node_index
                    .replace(column.store_id(), &old, &value, element);
            }
            ElementKind::Edge => {
                self.edge_index
                    .replace(column.store_id(), &old, &value, element);
            }
        }
        Ok(old)
    }

    pub(crate) fn get_attribute_internal(
        &self,
        kind: ElementKind,
        element: u32,
        key: &str,
    ) -> Result<AttributeValue> {
        let column = self.column_for(kind, key)?;
        let attributes = self.attributes_of(kind, element)?;
        Ok(attributes
            .get(column.store_id().index())
            .cloned()
            .unwrap_or(AttributeValue::Null))
    }

    fn timeset_key(&self) -> &'static str {
        match self.config.time_representation {
            TimeRepresentation::Timestamp => TIMESTAMP_COLUMN,
            TimeRepresentation::Interval => INTERVAL_COLUMN,
        }
    }

    pub(crate) fn set_attribute_at_internal(
        &mut self,
        kind: ElementKind,
        element: u32,
        key: &str,
        value: AttributeValue,
        timestamp: f64,
    ) -> Result<()> {
        if self.config.time_representation != TimeRepresentation::Timestamp {
            return Err(GraphError::Unsupported(
                "graph is configured for interval representation",
            ));
        }
        let column = self.column_for(kind, key)?;
        if column.value_type() != AttributeType::TimestampMap {
            return Err(GraphError::TypeMismatch {
                expected: AttributeType::TimestampMap,
                actual: column.value_type(),
            });
        }
        let slot = column.store_id().index();
        let attributes = self.attributes_of_mut(kind, element)?;
        while attributes.len() <= slot {
            attributes.push(AttributeValue::Null);
        }
        match &mut attributes[slot] {
            AttributeValue::TimestampMap(map) => {
                Arc::make_mut(map).put(timestamp, value);
            }
            stale @ AttributeValue::Null => {
                let mut map = TimestampMap::new();
                map.put(timestamp, value);
                *stale = AttributeValue::TimestampMap(Arc::new(map));
            }
            _ => {
                return Err(GraphError::ProgrammingError(
                    "dynamic column holds a non-dynamic value",
                ))
            }
        }
        self.touch_timeset_point(kind, element, timestamp)?;
        Ok(())
    }

    pub(crate) fn set_attribute_over_internal(
        &mut self,
        kind: ElementKind,
        element: u32,
        key: &str,
        value: AttributeValue,
        interval: Interval,
    ) -> Result<()> {
        if self.config.time_representation != TimeRepresentation::Interval {
            return Err(GraphError::Unsupported(
                "graph is configured for timestamp representation",
            ));
        }
        let column = self.column_for(kind, key)?;
        if column.value_type() != AttributeType::IntervalMap {
            return Err(GraphError::TypeMismatch {
                expected: AttributeType::IntervalMap,
                actual: column.value_type(),
            });
        }
        let slot = column.store_id().index();
        let attributes = self.attributes_of_mut(kind, element)?;
        while attributes.len() <= slot {
            attributes.push(AttributeValue::Null);
        }
        match &mut attributes[slot] {
            AttributeValue::IntervalMap(map) => {
                Arc::make_mut(map).put(interval, value);
            }
            stale @ AttributeValue::Null => {
                let mut map = IntervalMap::new();
                map.put(interval, value);
                *stale = AttributeValue::IntervalMap(Arc::new(map));
            }
            _ => {
                return Err(GraphError::ProgrammingError(
                    "dynamic column holds a non-dynamic value",
                ))
            }
        }
        self.touch_timeset_interval(kind, element, interval)?;
        Ok(())
    }

    fn touch_timeset_point(&mut self, kind: ElementKind, element: u32, timestamp: f64) -> Result<()> {
        let timeset_key = self.timeset_key();
        let column = self.column_for(kind, timeset_key)?;
        let slot = column.store_id().index();
        let attributes = self.attributes_of_mut(kind, element)?;
        match &mut attributes[slot] {
            AttributeValue::TimestampSet(set) => {
                Arc::make_mut(set).add(timestamp);
            }
            stale @ AttributeValue::Null => {
                let mut set = TimestampSet::new();
                set.add(timestamp);
                *stale = AttributeValue::TimestampSet(Arc::new(set));
            }
            _ => return Err(GraphError::ProgrammingError("timeset column corrupted")),
        }
        match kind {
            ElementKind::Node => self.time.node_point_added(timestamp, element),
            ElementKind::Edge => self.time.edge_point_added(timestamp, element),
        }
        Ok(())
    }

    fn touch_timeset_interval(
        &mut self,
        kind: ElementKind,
        element: u32,
        interval: Interval,
    ) -> Result<()> {
        let timeset_key = self.timeset_key();
        let column = self.column_for(kind, timeset_key)?;
        let slot = column.store_id().index();
        let attributes = self.attributes_of_mut(kind, element)?;
        match &mut attributes[slot] {
            AttributeValue::IntervalSet(set) => {
                Arc::make_mut(set).add(interval);
            }
            stale @ AttributeValue::Null => {
                let mut set = IntervalSet::new();
                set.add(interval);
                *stale = AttributeValue::IntervalSet(Arc::new(set));
            }
            _ => return Err(GraphError::ProgrammingError("timeset column corrupted")),
        }
        match kind {
            ElementKind::Node => self.time.node_interval_added(interval, element),
            ElementKind::Edge => self.time.edge_interval_added(interval, element),
        }
        Ok(())
    }

    pub(crate) fn add_column_internal(
        &mut self,
        kind: ElementKind,
        column: Column,
    ) -> Result<ColumnId> {
        let (table, index) = match kind {
            ElementKind::Node => (&mut self.node_table, &mut self.node_index),
            ElementKind::Edge => (&mut self.edge_table, &mut self.edge_index),
        };
        let id = table.add_column(column)?;
        let column = table.column_by_id(id).expect("just added").clone();
        index.on_column_added(&column);

        // Every element grows its attribute array and (decision: defaults
        // are indexed) registers the default value.
        let default = column.default_value().clone();
        let slot = id.index();
        match kind {
            ElementKind::Node => {
                let mut elements = Vec::new();
                for record in self.nodes.iter() {
                    elements.push(record.store_id().0);
                }
                for element in &elements {
                    let attributes = &mut self
                        .nodes
                        .record_mut(NodeId::new(*element))
                        .expect("iterating live slots")
                        .attributes;
                    while attributes.len() <= slot {
                        attributes.push(AttributeValue::Null);
                    }
                    attributes[slot] = default.clone();
                    self.node_index.put(id, &default, *element);
                }
            }
            ElementKind::Edge => {
                let mut elements = Vec::new();
                for record in self.edges.iter() {
                    elements.push(record.store_id().0);
                }
                for element in &elements {
                    let attributes = &mut self
                        .edges
                        .record_mut(EdgeId::new(*element))
                        .expect("iterating live slots")
                        .attributes;
                    while attributes.len() <= slot {
                        attributes.push(AttributeValue::Null);
                    }
                    attributes[slot] = default.clone();
                    self.edge_index.put(id, &default, *element);
                }
            }
        }
        Ok(id)
    }

    pub(crate) fn remove_column_internal(
        &mut self,
        kind: ElementKind,
        id: ColumnId,
    ) -> Result<Column> {
        let (table, index) = match kind {
            ElementKind::Node => (&mut self.node_table, &mut self.node_index),
            ElementKind::Edge => (&mut self.edge_table, &mut self.edge_index),
        };
        let column = table.remove_column(id)?;
        index.on_column_removed(id);
        let slot = id.index();
        match kind {
            ElementKind::Node => {
                let elements: Vec<u32> = self.nodes.iter().map(|r| r.store_id().0).collect();
                for element in elements {
                    if let Some(record) = self.nodes.record_mut(NodeId::new(element)) {
                        if let Some(value) = record.attributes.get_mut(slot) {
                            *value = AttributeValue::Null;
                        }
                    }
                }
            }
            ElementKind::Edge => {
                let elements: Vec<u32> = self.edges.iter().map(|r| r.store_id().0).collect();
                for element in elements {
                    if let Some(record) = self.edges.record_mut(EdgeId::new(element)) {
                        if let Some(value) = record.attributes.get_mut(slot) {
                            *value = AttributeValue::Null;
                        }
                    }
                }
            }
        }
        Ok(column)
    }

    /// Neighbor slots of `node`, deduplicated, most recent chains first.
    fn neighbors_internal(
        &self,
        node: NodeId,
        ty: Option<EdgeTypeId>,
        kinds: &[ChainKind],
        include_self_loops: bool,
    ) -> Result<Vec<NodeId>> {
        let record = self.node_record(node)?;
        let mut seen = FxHashSet::default();
        let mut result = Vec::new();
        for edge in self.incident_internal(record, ty, kinds, include_self_loops) {
            let opposite = self
                .edges
                .record(edge)
                .expect("chain link points at a live edge")
                .opposite(node);
            if seen.insert(opposite) {
                result.push(opposite);
            }
        }
        Ok(result)
    }

    fn incident_internal(
        &self,
        record: &NodeRecord,
        ty: Option<EdgeTypeId>,
        kinds: &[ChainKind],
        include_self_loops: bool,
    ) -> Vec<EdgeId> {
        let type_count = self.edge_types.capacity();
        let types: Vec<EdgeTypeId> = match ty {
            Some(t) => vec![t],
            None => (0..type_count).map(|t| EdgeTypeId::new(t as u32)).collect(),
        };
        let mut result = Vec::new();
        for kind in kinds {
            for t in &types {
                result.extend(self.edges.collect_chain(record, *kind, *t));
            }
        }
        if include_self_loops {
            match ty {
                Some(t) => result.extend(
                    self.edges
                        .collect_self_loops(record)
                        .into_iter()
                        .filter(|e| {
                            self.edges
                                .record(*e)
                                .is_some_and(|r| r.type_id() == t)
                        }),
                ),
                None => result.extend(self.edges.collect_self_loops(record)),
            }
        }
        result
    }

    pub(crate) fn clear_internal(&mut self) -> (Vec<NodeId>, Vec<EdgeId>) {
        let removed_nodes: Vec<NodeId> = self.nodes.iter().map(NodeRecord::store_id).collect();
        let removed_edges: Vec<EdgeId> = self.edges.iter().map(EdgeRecord::store_id).collect();
        self.edges.clear();
        self.nodes.clear();
        self.edge_types.reset_counts();
        self.node_index.clear();
        self.edge_index.clear();
        self.time.clear();
        self.views.on_base_cleared();
        if self.config.enable_spatial_index {
            if let Some(spatial) = self.spatial.as_mut() {
                spatial.cleared();
            }
        }
        (removed_nodes, removed_edges)
    }

    pub(crate) fn clear_edges_internal(&mut self) -> Vec<EdgeId> {
        let removed: Vec<EdgeId> = self.edges.iter().map(EdgeRecord::store_id).collect();
        for &edge in &removed {
            // Full per-edge removal keeps node degrees and indices exact.
            let _ = self.remove_edge_internal(edge);
        }
        self.time.clear_edges();
        self.views.on_base_edges_cleared();
        removed
    }
}

/// The embedded in-memory graph store.
///
/// See the [crate docs](crate) for an overview. All methods take `&self`;
/// internal state is guarded by one reader/writer lock, and operations
/// additionally honor the advisory [`GraphLock`] when auto-locking is
/// enabled (the default).
pub struct GraphStore {
    pub(crate) config: Config,
    pub(crate) lock: GraphLock,
    pub(crate) version: Arc<GraphVersion>,
    pub(crate) observers: ObserverRegistry,
    pub(crate) inner: RwLock<GraphInner>,
}

/// RAII hold of the advisory lock in auto-locking mode.
pub(crate) struct AutoGuard<'a> {
    lock: Option<&'a GraphLock>,
    write: bool,
}

impl Drop for AutoGuard<'_> {
    fn drop(&mut self) {
        if let Some(lock) = self.lock {
            let released = if self.write {
                lock.write_unlock()
            } else {
                lock.read_unlock()
            };
            debug_assert!(released.is_ok(), "auto guard releases what it acquired");
        }
    }
}

impl GraphStore {
    /// Creates a store with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default()).expect("default configuration is valid")
    }

    /// Creates a store with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Unsupported`] for invalid configurations.
    pub fn with_config(config: Config) -> Result<Self> {
        let inner = GraphInner::new(config.clone())?;
        Ok(Self {
            config,
            lock: GraphLock::new(),
            version: Arc::new(GraphVersion::new()),
            observers: ObserverRegistry::default(),
            inner: RwLock::new(inner),
        })
    }

    /// The configuration this store was created with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The advisory graph lock, for manual-locking callers.
    #[must_use]
    pub fn graph_lock(&self) -> &GraphLock {
        &self.lock
    }

    pub(crate) fn auto_read(&self) -> AutoGuard<'_> {
        if self.config.enable_auto_locking {
            self.lock.read_lock();
            AutoGuard {
                lock: Some(&self.lock),
                write: false,
            }
        } else {
            AutoGuard {
                lock: None,
                write: false,
            }
        }
    }

    pub(crate) fn auto_write(&self) -> Result<AutoGuard<'_>> {
        if self.config.enable_auto_locking {
            self.lock.write_lock()?;
            Ok(AutoGuard {
                lock: Some(&self.lock),
                write: true,
            })
        } else {
            Ok(AutoGuard {
                lock: None,
                write: true,
            })
        }
    }

    fn touch_node(&self, node: NodeId, is_add: bool) {
        if self.config.enable_observers {
            self.version.bump_node();
            self.observers.record_node(node, is_add);
        }
    }

    pub(crate) fn touch_edge(&self, edge: EdgeId, is_add: bool) {
        if self.config.enable_observers {
            self.version.bump_edge();
            self.observers.record_edge(edge, is_add);
        }
    }

    // === Nodes ===

    /// Adds a node under a user id. Returns `Ok(None)` (no mutation) when
    /// the id is already present.
    ///
    /// # Errors
    ///
    /// [`GraphError::NullArgument`] for a null id,
    /// [`GraphError::TypeMismatch`] when the id does not match the
    /// configured node id type.
    pub fn add_node(&self, id: impl Into<AttributeValue>) -> Result<Option<NodeId>> {
        let _auto = self.auto_write()?;
        let added = self.inner.write().add_node_internal(id.into())?;
        if let Some(node) = added {
            self.touch_node(node, true);
        }
        Ok(added)
    }

    /// Adds several nodes; returns how many were actually inserted.
    ///
    /// # Errors
    ///
    /// Fails fast on the first invalid id; previously inserted nodes stay.
    pub fn add_all_nodes<I>(&self, ids: I) -> Result<usize>
    where
        I: IntoIterator,
        I::Item: Into<AttributeValue>,
    {
        let _auto = self.auto_write()?;
        let mut added = 0;
        for id in ids {
            let inserted = self.inner.write().add_node_internal(id.into())?;
            if let Some(node) = inserted {
                self.touch_node(node, true);
                added += 1;
            }
        }
        Ok(added)
    }

    /// Removes a node and every incident edge.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] if the slot is not live in this store.
    pub fn remove_node(&self, node: NodeId) -> Result<()> {
        let _auto = self.auto_write()?;
        let removal = self.inner.write().remove_node_internal(node)?;
        for edge in &removal.removed_edges {
            self.touch_edge(*edge, false);
        }
        self.touch_node(removal.node, false);
        Ok(())
    }

    /// Resolves a user id to its node slot.
    #[must_use]
    pub fn get_node(&self, id: &AttributeValue) -> Option<NodeId> {
        let _auto = self.auto_read();
        self.inner
            .read()
            .nodes
            .get(&HashableValue::new(id.clone()))
    }

    /// The user id stored at a node slot.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] if the slot is not live.
    pub fn node_id(&self, node: NodeId) -> Result<AttributeValue> {
        let _auto = self.auto_read();
        let inner = self.inner.read();
        Ok(inner.node_record(node)?.user_id().clone())
    }

    /// `true` if the node slot is live in this store.
    #[must_use]
    pub fn contains_node(&self, node: NodeId) -> bool {
        let _auto = self.auto_read();
        self.inner.read().nodes.contains(node)
    }

    /// Number of live nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        let _auto = self.auto_read();
        self.inner.read().nodes.size()
    }

    /// Every live node slot, in slot order.
    #[must_use]
    pub fn nodes(&self) -> Vec<NodeId> {
        let _auto = self.auto_read();
        self.inner.read().nodes.iter().map(NodeRecord::store_id).collect()
    }

    // === Edge types ===

    /// Interns an edge type label, creating it if needed. The default type
    /// is interned under the null label at construction and reachable as
    /// [`EdgeTypeId::DEFAULT`].
    ///
    /// # Errors
    ///
    /// [`GraphError::ProgrammingError`] on an illegal lock upgrade in
    /// auto-locking mode.
    pub fn edge_type(&self, label: impl Into<AttributeValue>) -> Result<EdgeTypeId> {
        let _auto = self.auto_write()?;
        Ok(self.inner.write().edge_types.get_or_create(label))
    }

    /// Looks up an interned edge type.
    #[must_use]
    pub fn get_edge_type(&self, label: &AttributeValue) -> Option<EdgeTypeId> {
        let _auto = self.auto_read();
        self.inner.read().edge_types.get(label)
    }

    /// The label interned under a type id.
    #[must_use]
    pub fn edge_type_label(&self, ty: EdgeTypeId) -> Option<AttributeValue> {
        let _auto = self.auto_read();
        self.inner.read().edge_types.label(ty).cloned()
    }

    /// Number of interned edge types (including the default type).
    #[must_use]
    pub fn edge_type_count(&self) -> usize {
        let _auto = self.auto_read();
        self.inner.read().edge_types.size()
    }

    // === Edges ===

    /// Adds an edge. Returns `Ok(None)` (no mutation) when the user id is
    /// taken or an edge with the same `(source, target, type)` key exists -
    /// parallel edges are rejected. Self-loops are always permitted, once
    /// per `(node, type)`.
    ///
    /// # Errors
    ///
    /// [`GraphError::NullArgument`] / [`GraphError::TypeMismatch`] for bad
    /// ids, [`GraphError::NotOwned`] for unknown endpoints or type.
    pub fn add_edge(
        &self,
        id: impl Into<AttributeValue>,
        source: NodeId,
        target: NodeId,
        ty: EdgeTypeId,
        directed: bool,
    ) -> Result<Option<EdgeId>> {
        let _auto = self.auto_write()?;
        let added = self
            .inner
            .write()
            .add_edge_internal(id.into(), source, target, ty, directed)?;
        if let Some(edge) = added {
            self.touch_edge(edge, true);
        }
        Ok(added)
    }

    /// Adds several edges; returns how many were actually inserted.
    ///
    /// # Errors
    ///
    /// Fails fast on the first invalid edge; previously inserted edges stay.
    pub fn add_all_edges<I>(&self, edges: I) -> Result<usize>
    where
        I: IntoIterator<Item = (AttributeValue, NodeId, NodeId, EdgeTypeId, bool)>,
    {
        let _auto = self.auto_write()?;
        let mut added = 0;
        for (id, source, target, ty, directed) in edges {
            let inserted = self
                .inner
                .write()
                .add_edge_internal(id, source, target, ty, directed)?;
            if let Some(edge) = inserted {
                self.touch_edge(edge, true);
                added += 1;
            }
        }
        Ok(added)
    }

    /// Removes an edge, splicing it out of every adjacency chain.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] if the slot is not live.
    pub fn remove_edge(&self, edge: EdgeId) -> Result<()> {
        let _auto = self.auto_write()?;
        self.inner.write().remove_edge_internal(edge)?;
        self.touch_edge(edge, false);
        Ok(())
    }

    /// Resolves a user id to its edge slot.
    #[must_use]
    pub fn get_edge(&self, id: &AttributeValue) -> Option<EdgeId> {
        let _auto = self.auto_read();
        self.inner
            .read()
            .edges
            .get(&HashableValue::new(id.clone()))
    }

    /// The user id stored at an edge slot.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] if the slot is not live.
    pub fn edge_id(&self, edge: EdgeId) -> Result<AttributeValue> {
        let _auto = self.auto_read();
        let inner = self.inner.read();
        Ok(inner.edge_record(edge)?.user_id().clone())
    }

    /// `true` if the edge slot is live in this store.
    #[must_use]
    pub fn contains_edge(&self, edge: EdgeId) -> bool {
        let _auto = self.auto_read();
        self.inner.read().edges.contains(edge)
    }

    /// Number of live edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        let _auto = self.auto_read();
        self.inner.read().edges.size()
    }

    /// Number of live edges of one type.
    #[must_use]
    pub fn edge_count_of_type(&self, ty: EdgeTypeId) -> usize {
        let _auto = self.auto_read();
        self.inner.read().edge_types.count(ty)
    }

    /// Every live edge slot, in slot order.
    #[must_use]
    pub fn edges(&self) -> Vec<EdgeId> {
        let _auto = self.auto_read();
        self.inner.read().edges.iter().map(EdgeRecord::store_id).collect()
    }

    /// Every live edge of one type, in slot order.
    #[must_use]
    pub fn edges_of_type(&self, ty: EdgeTypeId) -> Vec<EdgeId> {
        let _auto = self.auto_read();
        self.inner
            .read()
            .edges
            .iter()
            .filter(|r| r.type_id() == ty)
            .map(EdgeRecord::store_id)
            .collect()
    }

    /// The endpoints `(source, target)` of an edge.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] if the slot is not live.
    pub fn endpoints(&self, edge: EdgeId) -> Result<(NodeId, NodeId)> {
        let _auto = self.auto_read();
        let inner = self.inner.read();
        let record = inner.edge_record(edge)?;
        Ok((record.source(), record.target()))
    }

    /// The type id of an edge.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] if the slot is not live.
    pub fn edge_type_of(&self, edge: EdgeId) -> Result<EdgeTypeId> {
        let _auto = self.auto_read();
        Ok(self.inner.read().edge_record(edge)?.type_id())
    }

    /// `true` if the edge is directed.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] if the slot is not live.
    pub fn is_directed(&self, edge: EdgeId) -> Result<bool> {
        let _auto = self.auto_read();
        Ok(self.inner.read().edge_record(edge)?.is_directed())
    }

    /// `true` if the edge is a self-loop.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] if the slot is not live.
    pub fn is_self_loop(&self, edge: EdgeId) -> Result<bool> {
        let _auto = self.auto_read();
        Ok(self.inner.read().edge_record(edge)?.is_self_loop())
    }

    /// The unique edge from `source` to `target` of the given type, if any:
    /// a directed edge in that orientation or an undirected edge between
    /// the pair.
    #[must_use]
    pub fn get_edge_between(
        &self,
        source: NodeId,
        target: NodeId,
        ty: EdgeTypeId,
    ) -> Option<EdgeId> {
        let _auto = self.auto_read();
        self.inner.read().edges.get_between(source, target, ty)
    }

    /// All edges connecting two nodes across every type, in either
    /// orientation.
    #[must_use]
    pub fn get_edges_between(&self, source: NodeId, target: NodeId) -> Vec<EdgeId> {
        let _auto = self.auto_read();
        let inner = self.inner.read();
        let mut result = Vec::new();
        for ty in (0..inner.edge_types.capacity()).map(|t| EdgeTypeId::new(t as u32)) {
            result.extend(inner.edges.all_between(source, target, ty));
        }
        result
    }

    /// All edges of one type connecting two nodes, in either orientation.
    #[must_use]
    pub fn get_edges_between_of_type(
        &self,
        source: NodeId,
        target: NodeId,
        ty: EdgeTypeId,
    ) -> Vec<EdgeId> {
        let _auto = self.auto_read();
        self.inner.read().edges.all_between(source, target, ty)
    }

    /// The reverse-direction counterpart of a directed edge with the same
    /// type, if present.
    #[must_use]
    pub fn get_mutual_edge(&self, edge: EdgeId) -> Option<EdgeId> {
        let _auto = self.auto_read();
        self.inner.read().edges.mutual(edge)
    }

    /// Every self-loop in the graph.
    #[must_use]
    pub fn self_loops(&self) -> Vec<EdgeId> {
        let _auto = self.auto_read();
        let mut loops: Vec<EdgeId> = self.inner.read().edges.self_loops().collect();
        loops.sort_unstable();
        loops
    }

    /// The endpoint of `edge` opposite to `node`.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for a dead edge or a node that is not an
    /// endpoint.
    pub fn opposite(&self, node: NodeId, edge: EdgeId) -> Result<NodeId> {
        let _auto = self.auto_read();
        let inner = self.inner.read();
        let record = inner.edge_record(edge)?;
        if !record.is_incident_to(node) {
            return Err(GraphError::NotOwned);
        }
        Ok(record.opposite(node))
    }

    /// `true` if any edge connects the two nodes, in either orientation.
    #[must_use]
    pub fn is_adjacent(&self, a: NodeId, b: NodeId) -> bool {
        !self.get_edges_between(a, b).is_empty() || !self.get_edges_between(b, a).is_empty()
    }

    /// `true` if an edge of the given type connects the two nodes.
    #[must_use]
    pub fn is_adjacent_of_type(&self, a: NodeId, b: NodeId, ty: EdgeTypeId) -> bool {
        let _auto = self.auto_read();
        let inner = self.inner.read();
        !inner.edges.all_between(a, b, ty).is_empty()
            || !inner.edges.all_between(b, a, ty).is_empty()
    }

    /// `true` if the two edges share an endpoint.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] if either slot is dead.
    pub fn is_incident(&self, a: EdgeId, b: EdgeId) -> Result<bool> {
        let _auto = self.auto_read();
        let inner = self.inner.read();
        let ra = inner.edge_record(a)?;
        let rb = inner.edge_record(b)?;
        Ok(ra.is_incident_to(rb.source()) || ra.is_incident_to(rb.target()))
    }

    /// `true` if the node is an endpoint of the edge.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] if either handle is dead.
    pub fn is_incident_to(&self, node: NodeId, edge: EdgeId) -> Result<bool> {
        let _auto = self.auto_read();
        let inner = self.inner.read();
        inner.node_record(node)?;
        Ok(inner.edge_record(edge)?.is_incident_to(node))
    }

    // === Adjacency ===

    /// Outgoing edges of a node: directed out chains, undirected chains and
    /// self-loops, most recently added first per chain.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] if the node is dead.
    pub fn out_edges(&self, node: NodeId) -> Result<Vec<EdgeId>> {
        let _auto = self.auto_read();
        let inner = self.inner.read();
        let record = inner.node_record(node)?;
        Ok(inner.incident_internal(record, None, &[ChainKind::Out, ChainKind::Undirected], true))
    }

    /// Outgoing edges of one type.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] if the node is dead.
    pub fn out_edges_of_type(&self, node: NodeId, ty: EdgeTypeId) -> Result<Vec<EdgeId>> {
        let _auto = self.auto_read();
        let inner = self.inner.read();
        let record = inner.node_record(node)?;
        Ok(inner.incident_internal(record, Some(ty), &[ChainKind::Out, ChainKind::Undirected], true))
    }

    /// Incoming edges of a node: directed in chains, undirected chains and
    /// self-loops.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] if the node is dead.
    pub fn in_edges(&self, node: NodeId) -> Result<Vec<EdgeId>> {
        let _auto = self.auto_read();
        let inner = self.inner.read();
        let record = inner.node_record(node)?;
        Ok(inner.incident_internal(record, None, &[ChainKind::In, ChainKind::Undirected], true))
    }

    /// Incoming edges of one type.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] if the node is dead.
    pub fn in_edges_of_type(&self, node: NodeId, ty: EdgeTypeId) -> Result<Vec<EdgeId>> {
        let _auto = self.auto_read();
        let inner = self.inner.read();
        let record = inner.node_record(node)?;
        Ok(inner.incident_internal(record, Some(ty), &[ChainKind::In, ChainKind::Undirected], true))
    }

    /// Every edge incident to a node, each once.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] if the node is dead.
    pub fn edges_of(&self, node: NodeId) -> Result<Vec<EdgeId>> {
        let _auto = self.auto_read();
        let inner = self.inner.read();
        let record = inner.node_record(node)?;
        Ok(inner.incident_internal(
            record,
            None,
            &[ChainKind::Out, ChainKind::In, ChainKind::Undirected],
            true,
        ))
    }

    /// Every edge of one type incident to a node.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] if the node is dead.
    pub fn edges_of_with_type(&self, node: NodeId, ty: EdgeTypeId) -> Result<Vec<EdgeId>> {
        let _auto = self.auto_read();
        let inner = self.inner.read();
        let record = inner.node_record(node)?;
        Ok(inner.incident_internal(
            record,
            Some(ty),
            &[ChainKind::Out, ChainKind::In, ChainKind::Undirected],
            true,
        ))
    }

    /// All distinct neighbors of a node (successors, predecessors and
    /// undirected neighbors; the node itself for self-loops).
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] if the node is dead.
    pub fn neighbors(&self, node: NodeId) -> Result<Vec<NodeId>> {
        let _auto = self.auto_read();
        self.inner.read().neighbors_internal(
            node,
            None,
            &[ChainKind::Out, ChainKind::In, ChainKind::Undirected],
            true,
        )
    }

    /// Distinct neighbors through edges of one type.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] if the node is dead.
    pub fn neighbors_of_type(&self, node: NodeId, ty: EdgeTypeId) -> Result<Vec<NodeId>> {
        let _auto = self.auto_read();
        self.inner.read().neighbors_internal(
            node,
            Some(ty),
            &[ChainKind::Out, ChainKind::In, ChainKind::Undirected],
            true,
        )
    }

    /// Distinct successors: targets of out edges plus undirected neighbors.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] if the node is dead.
    pub fn successors(&self, node: NodeId) -> Result<Vec<NodeId>> {
        let _auto = self.auto_read();
        self.inner
            .read()
            .neighbors_internal(node, None, &[ChainKind::Out, ChainKind::Undirected], true)
    }

    /// Distinct predecessors: sources of in edges plus undirected neighbors.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] if the node is dead.
    pub fn predecessors(&self, node: NodeId) -> Result<Vec<NodeId>> {
        let _auto = self.auto_read();
        self.inner
            .read()
            .neighbors_internal(node, None, &[ChainKind::In, ChainKind::Undirected], true)
    }

    // === Degrees ===

    /// Total degree: each incident edge counted once, self-loops once.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] if the node is dead.
    pub fn degree(&self, node: NodeId) -> Result<u32> {
        let _auto = self.auto_read();
        Ok(self.inner.read().node_record(node)?.degree())
    }

    /// In-degree: directed in edges, undirected edges and self-loops.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] if the node is dead.
    pub fn in_degree(&self, node: NodeId) -> Result<u32> {
        let _auto = self.auto_read();
        Ok(self.inner.read().node_record(node)?.in_degree())
    }

    /// Out-degree: directed out edges, undirected edges and self-loops.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] if the node is dead.
    pub fn out_degree(&self, node: NodeId) -> Result<u32> {
        let _auto = self.auto_read();
        Ok(self.inner.read().node_record(node)?.out_degree())
    }

    /// Degree in the undirected sense: a mutual directed pair counts once.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] if the node is dead.
    pub fn undirected_degree(&self, node: NodeId) -> Result<u32> {
        let _auto = self.auto_read();
        Ok(self.inner.read().node_record(node)?.undirected_degree())
    }

    // === Graph shape ===

    /// `true` while every edge is directed.
    #[must_use]
    pub fn is_directed_graph(&self) -> bool {
        let _auto = self.auto_read();
        self.inner.read().edges.is_directed_graph()
    }

    /// `true` while every edge is undirected.
    #[must_use]
    pub fn is_undirected_graph(&self) -> bool {
        let _auto = self.auto_read();
        self.inner.read().edges.is_undirected_graph()
    }

    /// `true` once directed and undirected edges coexist.
    #[must_use]
    pub fn is_mixed_graph(&self) -> bool {
        let _auto = self.auto_read();
        self.inner.read().edges.is_mixed_graph()
    }

    // === Bulk removal ===

    /// Removes everything: nodes, edges, indices, time registrations; views
    /// empty out but stay alive.
    ///
    /// # Errors
    ///
    /// [`GraphError::ProgrammingError`] on an illegal lock upgrade in
    /// auto-locking mode.
    pub fn clear(&self) -> Result<()> {
        let _auto = self.auto_write()?;
        let (removed_nodes, removed_edges) = self.inner.write().clear_internal();
        for edge in removed_edges {
            self.touch_edge(edge, false);
        }
        for node in removed_nodes {
            self.touch_node(node, false);
        }
        debug!("cleared graph store");
        Ok(())
    }

    /// Removes every edge, keeping nodes.
    ///
    /// # Errors
    ///
    /// [`GraphError::ProgrammingError`] on an illegal lock upgrade in
    /// auto-locking mode.
    pub fn clear_edges(&self) -> Result<()> {
        let _auto = self.auto_write()?;
        let removed = self.inner.write().clear_edges_internal();
        for edge in removed {
            self.touch_edge(edge, false);
        }
        Ok(())
    }

    /// Removes every edge of one type.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for an unknown type.
    pub fn clear_edges_of_type(&self, ty: EdgeTypeId) -> Result<()> {
        let _auto = self.auto_write()?;
        let mut inner = self.inner.write();
        if !inner.edge_types.contains(ty) {
            return Err(GraphError::NotOwned);
        }
        let doomed: Vec<EdgeId> = inner
            .edges
            .iter()
            .filter(|r| r.type_id() == ty)
            .map(EdgeRecord::store_id)
            .collect();
        for &edge in &doomed {
            inner.remove_edge_internal(edge)?;
        }
        drop(inner);
        for edge in doomed {
            self.touch_edge(edge, false);
        }
        Ok(())
    }

    /// Removes every edge incident to a node.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] if the node is dead.
    pub fn clear_node_edges(&self, node: NodeId) -> Result<()> {
        let mut cursor = self.edge_cursor(node)?;
        while cursor.next_edge().is_some() {
            cursor.remove_current()?;
        }
        Ok(())
    }

    /// Removes every edge of one type incident to a node.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] if the node or type is dead.
    pub fn clear_node_edges_of_type(&self, node: NodeId, ty: EdgeTypeId) -> Result<()> {
        let mut cursor = self.edge_cursor_of_type(node, ty)?;
        while cursor.next_edge().is_some() {
            cursor.remove_current()?;
        }
        Ok(())
    }

    // === Versions & observers ===

    /// The `(node_version, edge_version)` snapshot.
    #[must_use]
    pub fn version(&self) -> (u64, u64) {
        self.version.snapshot()
    }

    /// The node structural version.
    #[must_use]
    pub fn node_version(&self) -> u64 {
        self.version.node_version()
    }

    /// The edge structural version.
    #[must_use]
    pub fn edge_version(&self) -> u64 {
        self.version.edge_version()
    }

    /// Creates an observer, optionally with diff tracking.
    ///
    /// # Errors
    ///
    /// [`GraphError::Unsupported`] when observers are disabled by
    /// configuration.
    pub fn create_observer(&self, with_diff: bool) -> Result<GraphObserver> {
        if !self.config.enable_observers {
            return Err(GraphError::Unsupported("observers are disabled"));
        }
        let state = self.observers.register(with_diff, &self.version);
        Ok(GraphObserver {
            version: Arc::clone(&self.version),
            state,
        })
    }

    /// Destroys an observer, removing it from the store's list.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] if the observer does not belong to this
    /// store or was already destroyed.
    pub fn destroy_observer(&self, observer: &GraphObserver) -> Result<()> {
        if !self.observers.unregister(&observer.state) {
            return Err(GraphError::NotOwned);
        }
        observer.destroy();
        Ok(())
    }

    // === Manual locking passthrough ===

    /// Acquires a read hold on the advisory graph lock.
    pub fn read_lock(&self) {
        self.lock.read_lock();
    }

    /// Releases one read hold.
    ///
    /// # Errors
    ///
    /// See [`GraphLock::read_unlock`].
    pub fn read_unlock(&self) -> Result<()> {
        self.lock.read_unlock()
    }

    /// Releases every read hold of the current thread.
    pub fn read_unlock_all(&self) {
        self.lock.read_unlock_all()
    }

    /// Acquires the advisory write lock.
    ///
    /// # Errors
    ///
    /// See [`GraphLock::write_lock`].
    pub fn write_lock(&self) -> Result<()> {
        self.lock.write_lock()
    }

    /// Releases one write hold.
    ///
    /// # Errors
    ///
    /// See [`GraphLock::write_unlock`].
    pub fn write_unlock(&self) -> Result<()> {
        self.lock.write_unlock()
    }

    // === Spatial collaborator ===

    /// Installs the spatial index collaborator. Only dispatched to when
    /// `enable_spatial_index` is set.
    pub fn set_spatial_index(&self, spatial: Box<dyn SpatialIndex>) {
        self.inner.write().spatial = Some(spatial);
    }

    /// Structural equality with another store: same nodes, edges, types,
    /// attributes and columns. Version counters and observers are
    /// deliberately excluded.
    #[must_use]
    pub fn deep_equals(&self, other: &GraphStore) -> bool {
        let _auto = self.auto_read();
        let _other_auto = other.auto_read();
        // Recursive reads keep self-comparison safe.
        let a = self.inner.read_recursive();
        let b = other.inner.read_recursive();

        if a.nodes.size() != b.nodes.size() || a.edges.size() != b.edges.size() {
            return false;
        }
        for record in a.nodes.iter() {
            let Some(other_slot) = b.nodes.get(&HashableValue::new(record.user_id().clone()))
            else {
                return false;
            };
            let other_record = b.nodes.record(other_slot).expect("mapped slot is live");
            if record.attributes != other_record.attributes {
                return false;
            }
        }
        for record in a.edges.iter() {
            let Some(other_slot) = b.edges.get(&HashableValue::new(record.user_id().clone()))
            else {
                return false;
            };
            let other_record = b.edges.record(other_slot).expect("mapped slot is live");
            let endpoints_match = {
                let a_src = a.nodes.record(record.source()).expect("endpoint live");
                let a_dst = a.nodes.record(record.target()).expect("endpoint live");
                let b_src = b.nodes.record(other_record.source()).expect("endpoint live");
                let b_dst = b.nodes.record(other_record.target()).expect("endpoint live");
                HashableValue::new(a_src.user_id().clone())
                    == HashableValue::new(b_src.user_id().clone())
                    && HashableValue::new(a_dst.user_id().clone())
                        == HashableValue::new(b_dst.user_id().clone())
            };
            if !endpoints_match
                || record.is_directed() != other_record.is_directed()
                || record.attributes != other_record.attributes
            {
                return false;
            }
            let a_label = a.edge_types.label(record.type_id());
            let b_label = b.edge_types.label(other_record.type_id());
            if a_label != b_label {
                return false;
            }
        }
        true
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}
