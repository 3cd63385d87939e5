//! Graph store configuration.

use trellis_common::error::{GraphError, Result};
use trellis_common::types::AttributeType;

/// How dynamic attribute values are keyed in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRepresentation {
    /// Values keyed by point timestamps.
    #[default]
    Timestamp,
    /// Values keyed by intervals with open/closed bounds.
    Interval,
}

/// Configuration for a [`GraphStore`](crate::GraphStore).
///
/// A value struct captured at construction; there is no process-wide state.
/// The defaults match a general-purpose mixed graph with observers and
/// auto-locking on.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)] // Config structs naturally have many toggles
pub struct Config {
    /// Static type enforced for node user ids.
    pub node_id_type: AttributeType,

    /// Static type enforced for edge user ids.
    pub edge_id_type: AttributeType,

    /// Type of the edge weight column; `Double` for static weights, or
    /// `TimestampMap`/`IntervalMap` for time-indexed weights.
    pub edge_weight_type: AttributeType,

    /// Whether the edge table carries a weight column at all.
    pub edge_weight_column: bool,

    /// Whether dynamic values are timestamp- or interval-keyed.
    pub time_representation: TimeRepresentation,

    /// Acquire the graph lock automatically on every operation. Turn off for
    /// single-threaded callers that want zero locking overhead and manual
    /// control.
    pub enable_auto_locking: bool,

    /// Maintain version counters and the observer list.
    pub enable_observers: bool,

    /// Dispatch element movement to the spatial index collaborator.
    pub enable_spatial_index: bool,

    /// Maintain the graph-wide reverse time index.
    pub enable_index_time: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node_id_type: AttributeType::String,
            edge_id_type: AttributeType::String,
            edge_weight_type: AttributeType::Double,
            edge_weight_column: true,
            time_representation: TimeRepresentation::default(),
            enable_auto_locking: true,
            enable_observers: true,
            enable_spatial_index: false,
            enable_index_time: true,
        }
    }
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Unsupported`] when an id type is not hashable
    /// and static, or the weight type is neither `Double` nor a dynamic map.
    pub fn validate(&self) -> Result<()> {
        if !self.node_id_type.is_id_type() {
            return Err(GraphError::Unsupported("node id type must be a static scalar"));
        }
        if !self.edge_id_type.is_id_type() {
            return Err(GraphError::Unsupported("edge id type must be a static scalar"));
        }
        match self.edge_weight_type {
            AttributeType::Double => Ok(()),
            AttributeType::TimestampMap if self.time_representation == TimeRepresentation::Timestamp => Ok(()),
            AttributeType::IntervalMap if self.time_representation == TimeRepresentation::Interval => Ok(()),
            _ => Err(GraphError::Unsupported(
                "edge weight type must be Double or the dynamic map matching the time representation",
            )),
        }
    }

    /// Sets the node user id type.
    #[must_use]
    pub fn with_node_id_type(mut self, ty: AttributeType) -> Self {
        self.node_id_type = ty;
        self
    }

    /// Sets the edge user id type.
    #[must_use]
    pub fn with_edge_id_type(mut self, ty: AttributeType) -> Self {
        self.edge_id_type = ty;
        self
    }

    /// Sets the edge weight type.
    #[must_use]
    pub fn with_edge_weight_type(mut self, ty: AttributeType) -> Self {
        self.edge_weight_type = ty;
        self
    }

    /// Drops the edge weight column entirely.
    #[must_use]
    pub fn without_edge_weight_column(mut self) -> Self {
        self.edge_weight_column = false;
        self
    }

    /// Selects interval-keyed dynamic values.
    #[must_use]
    pub fn with_interval_representation(mut self) -> Self {
        self.time_representation = TimeRepresentation::Interval;
        self
    }

    /// Disables automatic locking; callers drive the graph lock manually.
    #[must_use]
    pub fn without_auto_locking(mut self) -> Self {
        self.enable_auto_locking = false;
        self
    }

    /// Disables version counters and observers.
    #[must_use]
    pub fn without_observers(mut self) -> Self {
        self.enable_observers = false;
        self
    }

    /// Enables spatial index dispatch.
    #[must_use]
    pub fn with_spatial_index(mut self) -> Self {
        self.enable_spatial_index = true;
        self
    }

    /// Disables the graph-wide time index.
    #[must_use]
    pub fn without_time_index(mut self) -> Self {
        self.enable_index_time = false;
        self
    }
}
