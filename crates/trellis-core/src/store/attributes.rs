//! Attribute, column, index and time-query surface of [`GraphStore`].
//!
//! Setters route through the column indices and - for dynamic columns -
//! the element timeset and the graph-wide time index, all under the write
//! path.

use trellis_common::error::{GraphError, Result};
use trellis_common::types::{
    AttributeType, AttributeValue, ColumnId, EdgeId, Interval, NodeId,
};

use crate::column::Column;

use super::{ElementKind, GraphStore, WEIGHT_COLUMN};

impl GraphStore {
    // === Columns ===

    /// Adds a column to the node or edge table. Every live element's
    /// attribute array grows with the column default, and - when the column
    /// is indexed - the default is registered in the index.
    ///
    /// # Errors
    ///
    /// [`GraphError::Duplicate`] for a taken key,
    /// [`GraphError::TypeMismatch`] when the default does not fit.
    pub fn add_column(&self, kind: ElementKind, column: Column) -> Result<ColumnId> {
        let _auto = self.auto_write()?;
        self.inner.write().add_column_internal(kind, column)
    }

    /// Removes a column; its store id is never reused and all values drop.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for an unknown id.
    pub fn remove_column(&self, kind: ElementKind, id: ColumnId) -> Result<Column> {
        let _auto = self.auto_write()?;
        self.inner.write().remove_column_internal(kind, id)
    }

    /// Looks up a column definition by key (case-insensitive).
    #[must_use]
    pub fn get_column(&self, kind: ElementKind, key: &str) -> Option<Column> {
        let _auto = self.auto_read();
        self.inner.read().table(kind).column(key).cloned()
    }

    /// Looks up a column definition by store id.
    #[must_use]
    pub fn get_column_by_index(&self, kind: ElementKind, id: ColumnId) -> Option<Column> {
        let _auto = self.auto_read();
        self.inner.read().table(kind).column_by_id(id).cloned()
    }

    /// Every live column in store id order.
    #[must_use]
    pub fn columns(&self, kind: ElementKind) -> Vec<Column> {
        let _auto = self.auto_read();
        self.inner.read().table(kind).iter().cloned().collect()
    }

    /// Number of live columns.
    #[must_use]
    pub fn column_count(&self, kind: ElementKind) -> usize {
        let _auto = self.auto_read();
        self.inner.read().table(kind).column_count()
    }

    // === Node attributes ===

    /// Sets a node attribute, returning the previous value.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for a dead node or unknown column,
    /// [`GraphError::Unsupported`] for a read-only column,
    /// [`GraphError::TypeMismatch`] when the value does not fit.
    pub fn set_node_attribute(
        &self,
        node: NodeId,
        key: &str,
        value: impl Into<AttributeValue>,
    ) -> Result<AttributeValue> {
        let _auto = self.auto_write()?;
        self.inner
            .write()
            .set_attribute_internal(ElementKind::Node, node.0, key, value.into())
    }

    /// Reads a node attribute (the column default until set).
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for a dead node or unknown column.
    pub fn get_node_attribute(&self, node: NodeId, key: &str) -> Result<AttributeValue> {
        let _auto = self.auto_read();
        self.inner
            .read()
            .get_attribute_internal(ElementKind::Node, node.0, key)
    }

    /// Sets a dynamic node attribute value at a timestamp.
    ///
    /// # Errors
    ///
    /// [`GraphError::Unsupported`] unless the graph uses timestamp
    /// representation, [`GraphError::TypeMismatch`] unless the column is a
    /// timestamp map.
    pub fn set_node_attribute_at(
        &self,
        node: NodeId,
        key: &str,
        value: impl Into<AttributeValue>,
        timestamp: f64,
    ) -> Result<()> {
        let _auto = self.auto_write()?;
        self.inner.write().set_attribute_at_internal(
            ElementKind::Node,
            node.0,
            key,
            value.into(),
            timestamp,
        )
    }

    /// Sets a dynamic node attribute value over an interval.
    ///
    /// # Errors
    ///
    /// [`GraphError::Unsupported`] unless the graph uses interval
    /// representation, [`GraphError::TypeMismatch`] unless the column is an
    /// interval map.
    pub fn set_node_attribute_over(
        &self,
        node: NodeId,
        key: &str,
        value: impl Into<AttributeValue>,
        interval: Interval,
    ) -> Result<()> {
        let _auto = self.auto_write()?;
        self.inner.write().set_attribute_over_internal(
            ElementKind::Node,
            node.0,
            key,
            value.into(),
            interval,
        )
    }

    /// Reads a node attribute resolved at a timestamp: dynamic columns look
    /// up their container, static columns return their value.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for a dead node or unknown column.
    pub fn get_node_attribute_at(
        &self,
        node: NodeId,
        key: &str,
        timestamp: f64,
    ) -> Result<Option<AttributeValue>> {
        let _auto = self.auto_read();
        let value = self
            .inner
            .read()
            .get_attribute_internal(ElementKind::Node, node.0, key)?;
        Ok(value.at_timestamp(timestamp))
    }

    /// Reads a node attribute resolved over an interval.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for a dead node or unknown column.
    pub fn get_node_attribute_over(
        &self,
        node: NodeId,
        key: &str,
        interval: &Interval,
    ) -> Result<Option<AttributeValue>> {
        let _auto = self.auto_read();
        let value = self
            .inner
            .read()
            .get_attribute_internal(ElementKind::Node, node.0, key)?;
        Ok(value.over_interval(interval))
    }

    // === Edge attributes ===

    /// Sets an edge attribute, returning the previous value.
    ///
    /// # Errors
    ///
    /// As [`set_node_attribute`](Self::set_node_attribute).
    pub fn set_edge_attribute(
        &self,
        edge: EdgeId,
        key: &str,
        value: impl Into<AttributeValue>,
    ) -> Result<AttributeValue> {
        let _auto = self.auto_write()?;
        self.inner
            .write()
            .set_attribute_internal(ElementKind::Edge, edge.0, key, value.into())
    }

    /// Reads an edge attribute (the column default until set).
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for a dead edge or unknown column.
    pub fn get_edge_attribute(&self, edge: EdgeId, key: &str) -> Result<AttributeValue> {
        let _auto = self.auto_read();
        self.inner
            .read()
            .get_attribute_internal(ElementKind::Edge, edge.0, key)
    }

    /// Sets a dynamic edge attribute value at a timestamp.
    ///
    /// # Errors
    ///
    /// As [`set_node_attribute_at`](Self::set_node_attribute_at).
    pub fn set_edge_attribute_at(
        &self,
        edge: EdgeId,
        key: &str,
        value: impl Into<AttributeValue>,
        timestamp: f64,
    ) -> Result<()> {
        let _auto = self.auto_write()?;
        self.inner.write().set_attribute_at_internal(
            ElementKind::Edge,
            edge.0,
            key,
            value.into(),
            timestamp,
        )
    }

    /// Sets a dynamic edge attribute value over an interval.
    ///
    /// # Errors
    ///
    /// As [`set_node_attribute_over`](Self::set_node_attribute_over).
    pub fn set_edge_attribute_over(
        &self,
        edge: EdgeId,
        key: &str,
        value: impl Into<AttributeValue>,
        interval: Interval,
    ) -> Result<()> {
        let _auto = self.auto_write()?;
        self.inner.write().set_attribute_over_internal(
            ElementKind::Edge,
            edge.0,
            key,
            value.into(),
            interval,
        )
    }

    /// Reads an edge attribute resolved at a timestamp.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for a dead edge or unknown column.
    pub fn get_edge_attribute_at(
        &self,
        edge: EdgeId,
        key: &str,
        timestamp: f64,
    ) -> Result<Option<AttributeValue>> {
        let _auto = self.auto_read();
        let value = self
            .inner
            .read()
            .get_attribute_internal(ElementKind::Edge, edge.0, key)?;
        Ok(value.at_timestamp(timestamp))
    }

    // === Edge weight ===

    /// The static edge weight (the column default, `1.0`, until set).
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for a dead edge,
    /// [`GraphError::Unsupported`] without a weight column or for a dynamic
    /// weight (use [`edge_weight_at`](Self::edge_weight_at)).
    pub fn edge_weight(&self, edge: EdgeId) -> Result<f64> {
        if !self.config.edge_weight_column {
            return Err(GraphError::Unsupported("no edge weight column"));
        }
        match self.get_edge_attribute(edge, WEIGHT_COLUMN)? {
            AttributeValue::Double(w) => Ok(w),
            AttributeValue::Null => Ok(1.0),
            _ => Err(GraphError::Unsupported(
                "weight is dynamic; query it at a timestamp",
            )),
        }
    }

    /// Sets the static edge weight.
    ///
    /// # Errors
    ///
    /// [`GraphError::Unsupported`] without a weight column,
    /// [`GraphError::TypeMismatch`] when the weight column is dynamic.
    pub fn set_edge_weight(&self, edge: EdgeId, weight: f64) -> Result<()> {
        if !self.config.edge_weight_column {
            return Err(GraphError::Unsupported("no edge weight column"));
        }
        self.set_edge_attribute(edge, WEIGHT_COLUMN, weight)?;
        Ok(())
    }

    /// The edge weight resolved at a timestamp (dynamic weight columns).
    ///
    /// # Errors
    ///
    /// [`GraphError::Unsupported`] without a weight column.
    pub fn edge_weight_at(&self, edge: EdgeId, timestamp: f64) -> Result<Option<f64>> {
        if !self.config.edge_weight_column {
            return Err(GraphError::Unsupported("no edge weight column"));
        }
        let value = self.get_edge_attribute_at(edge, WEIGHT_COLUMN, timestamp)?;
        Ok(value.and_then(|v| v.as_f64()))
    }

    /// Sets the edge weight at a timestamp (dynamic weight columns).
    ///
    /// # Errors
    ///
    /// [`GraphError::Unsupported`] without a weight column or a
    /// non-timestamp weight representation.
    pub fn set_edge_weight_at(&self, edge: EdgeId, weight: f64, timestamp: f64) -> Result<()> {
        if !self.config.edge_weight_column {
            return Err(GraphError::Unsupported("no edge weight column"));
        }
        self.set_edge_attribute_at(edge, WEIGHT_COLUMN, weight, timestamp)
    }

    // === Index queries ===

    /// Nodes whose value for the column equals `value`, sorted by slot.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for an unknown column.
    pub fn nodes_with(&self, key: &str, value: &AttributeValue) -> Result<Vec<NodeId>> {
        let _auto = self.auto_read();
        let inner = self.inner.read();
        let column = inner.node_table.column(key).ok_or(GraphError::NotOwned)?;
        Ok(inner
            .node_index
            .get(column.store_id(), value)
            .into_iter()
            .map(NodeId::new)
            .collect())
    }

    /// Number of nodes whose value for the column equals `value`.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for an unknown column.
    pub fn count_nodes_with(&self, key: &str, value: &AttributeValue) -> Result<usize> {
        let _auto = self.auto_read();
        let inner = self.inner.read();
        let column = inner.node_table.column(key).ok_or(GraphError::NotOwned)?;
        Ok(inner.node_index.count(column.store_id(), value))
    }

    /// Edges whose value for the column equals `value`, sorted by slot.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for an unknown column.
    pub fn edges_with(&self, key: &str, value: &AttributeValue) -> Result<Vec<EdgeId>> {
        let _auto = self.auto_read();
        let inner = self.inner.read();
        let column = inner.edge_table.column(key).ok_or(GraphError::NotOwned)?;
        Ok(inner
            .edge_index
            .get(column.store_id(), value)
            .into_iter()
            .map(EdgeId::new)
            .collect())
    }

    /// Number of edges whose value for the column equals `value`.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for an unknown column.
    pub fn count_edges_with(&self, key: &str, value: &AttributeValue) -> Result<usize> {
        let _auto = self.auto_read();
        let inner = self.inner.read();
        let column = inner.edge_table.column(key).ok_or(GraphError::NotOwned)?;
        Ok(inner.edge_index.count(column.store_id(), value))
    }

    /// The distinct values present in an indexed column.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for an unknown column.
    pub fn index_values(&self, kind: ElementKind, key: &str) -> Result<Vec<AttributeValue>> {
        let _auto = self.auto_read();
        let inner = self.inner.read();
        let column = inner.table(kind).column(key).ok_or(GraphError::NotOwned)?;
        Ok(inner.index(kind).values(column.store_id()))
    }

    /// Number of distinct values present in an indexed column.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for an unknown column.
    pub fn index_count_values(&self, kind: ElementKind, key: &str) -> Result<usize> {
        let _auto = self.auto_read();
        let inner = self.inner.read();
        let column = inner.table(kind).column(key).ok_or(GraphError::NotOwned)?;
        Ok(inner.index(kind).count_values(column.store_id()))
    }

    /// Number of (element, value) registrations in an indexed column.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for an unknown column.
    pub fn index_count_elements(&self, kind: ElementKind, key: &str) -> Result<usize> {
        let _auto = self.auto_read();
        let inner = self.inner.read();
        let column = inner.table(kind).column(key).ok_or(GraphError::NotOwned)?;
        Ok(inner.index(kind).count_elements(column.store_id()))
    }

    /// The smallest value in a sortable indexed column.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for an unknown column.
    pub fn index_min_value(&self, kind: ElementKind, key: &str) -> Result<Option<AttributeValue>> {
        let _auto = self.auto_read();
        let inner = self.inner.read();
        let column = inner.table(kind).column(key).ok_or(GraphError::NotOwned)?;
        Ok(inner.index(kind).min_value(column.store_id()))
    }

    /// The largest value in a sortable indexed column.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for an unknown column.
    pub fn index_max_value(&self, kind: ElementKind, key: &str) -> Result<Option<AttributeValue>> {
        let _auto = self.auto_read();
        let inner = self.inner.read();
        let column = inner.table(kind).column(key).ok_or(GraphError::NotOwned)?;
        Ok(inner.index(kind).max_value(column.store_id()))
    }

    /// `true` when the column's index supports ordered min/max queries.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for an unknown column.
    pub fn index_is_sortable(&self, kind: ElementKind, key: &str) -> Result<bool> {
        let _auto = self.auto_read();
        let inner = self.inner.read();
        let column = inner.table(kind).column(key).ok_or(GraphError::NotOwned)?;
        Ok(inner.index(kind).is_sortable(column.store_id()))
    }

    // === Time queries ===

    /// Nodes carrying at least one dynamic value at this timestamp.
    #[must_use]
    pub fn nodes_at(&self, timestamp: f64) -> Vec<NodeId> {
        let _auto = self.auto_read();
        self.inner
            .read()
            .time
            .nodes
            .elements_at(timestamp)
            .into_iter()
            .map(NodeId::new)
            .collect()
    }

    /// Edges carrying at least one dynamic value at this timestamp.
    #[must_use]
    pub fn edges_at(&self, timestamp: f64) -> Vec<EdgeId> {
        let _auto = self.auto_read();
        self.inner
            .read()
            .time
            .edges
            .elements_at(timestamp)
            .into_iter()
            .map(EdgeId::new)
            .collect()
    }

    /// Nodes active somewhere in the probe interval.
    #[must_use]
    pub fn nodes_overlapping(&self, probe: &Interval) -> Vec<NodeId> {
        let _auto = self.auto_read();
        self.inner
            .read()
            .time
            .nodes
            .elements_overlapping(probe)
            .into_iter()
            .map(NodeId::new)
            .collect()
    }

    /// Edges active somewhere in the probe interval.
    #[must_use]
    pub fn edges_overlapping(&self, probe: &Interval) -> Vec<EdgeId> {
        let _auto = self.auto_read();
        self.inner
            .read()
            .time
            .edges
            .elements_overlapping(probe)
            .into_iter()
            .map(EdgeId::new)
            .collect()
    }

    /// The earliest dynamic registration of the element kind.
    #[must_use]
    pub fn time_min(&self, kind: ElementKind) -> Option<f64> {
        let _auto = self.auto_read();
        let inner = self.inner.read();
        match kind {
            ElementKind::Node => inner.time.nodes.min_timestamp(),
            ElementKind::Edge => inner.time.edges.min_timestamp(),
        }
    }

    /// The latest dynamic registration of the element kind.
    #[must_use]
    pub fn time_max(&self, kind: ElementKind) -> Option<f64> {
        let _auto = self.auto_read();
        let inner = self.inner.read();
        match kind {
            ElementKind::Node => inner.time.nodes.max_timestamp(),
            ElementKind::Edge => inner.time.edges.max_timestamp(),
        }
    }

    // === Graph attributes ===

    /// Sets a graph-level attribute, returning the previous value.
    ///
    /// # Errors
    ///
    /// [`GraphError::ProgrammingError`] on an illegal lock upgrade in
    /// auto-locking mode.
    pub fn set_attribute(
        &self,
        key: &str,
        value: impl Into<AttributeValue>,
    ) -> Result<Option<AttributeValue>> {
        let _auto = self.auto_write()?;
        Ok(self.inner.write().attributes.set(key, value.into()))
    }

    /// Reads a graph-level attribute.
    #[must_use]
    pub fn get_attribute(&self, key: &str) -> Option<AttributeValue> {
        let _auto = self.auto_read();
        self.inner.read().attributes.get(key).cloned()
    }

    /// Removes a graph-level attribute.
    ///
    /// # Errors
    ///
    /// [`GraphError::ProgrammingError`] on an illegal lock upgrade in
    /// auto-locking mode.
    pub fn remove_attribute(&self, key: &str) -> Result<Option<AttributeValue>> {
        let _auto = self.auto_write()?;
        Ok(self.inner.write().attributes.remove(key))
    }

    /// Every graph-level attribute key.
    #[must_use]
    pub fn attribute_keys(&self) -> Vec<String> {
        let _auto = self.auto_read();
        self.inner.read().attributes.keys()
    }

    /// Sets a graph-level attribute value at a timestamp.
    ///
    /// # Errors
    ///
    /// [`GraphError::Unsupported`] when the key already holds a static
    /// value.
    pub fn set_attribute_at(
        &self,
        key: &str,
        value: impl Into<AttributeValue>,
        timestamp: f64,
    ) -> Result<()> {
        let _auto = self.auto_write()?;
        self.inner
            .write()
            .attributes
            .set_at(key, value.into(), timestamp)
    }

    /// Reads a graph-level attribute resolved at a timestamp.
    #[must_use]
    pub fn get_attribute_at(&self, key: &str, timestamp: f64) -> Option<AttributeValue> {
        let _auto = self.auto_read();
        self.inner
            .read()
            .attributes
            .get(key)
            .and_then(|v| v.at_timestamp(timestamp))
    }

    /// Sets a graph-level attribute value over an interval.
    ///
    /// # Errors
    ///
    /// [`GraphError::Unsupported`] when the key already holds a static
    /// value.
    pub fn set_attribute_over(
        &self,
        key: &str,
        value: impl Into<AttributeValue>,
        interval: Interval,
    ) -> Result<()> {
        let _auto = self.auto_write()?;
        self.inner
            .write()
            .attributes
            .set_over(key, value.into(), interval)
    }

    /// Reads a graph-level attribute resolved over an interval.
    #[must_use]
    pub fn get_attribute_over(&self, key: &str, interval: &Interval) -> Option<AttributeValue> {
        let _auto = self.auto_read();
        self.inner
            .read()
            .attributes
            .get(key)
            .and_then(|v| v.over_interval(interval))
    }

    /// Clears every graph-level attribute.
    ///
    /// # Errors
    ///
    /// [`GraphError::ProgrammingError`] on an illegal lock upgrade in
    /// auto-locking mode.
    pub fn clear_attributes(&self) -> Result<()> {
        let _auto = self.auto_write()?;
        self.inner.write().attributes.clear();
        Ok(())
    }

    /// The static type of a column, by key.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for an unknown column.
    pub fn column_type(&self, kind: ElementKind, key: &str) -> Result<AttributeType> {
        let _auto = self.auto_read();
        let inner = self.inner.read();
        inner
            .table(kind)
            .column(key)
            .map(Column::value_type)
            .ok_or(GraphError::NotOwned)
    }
}
