//! Core types for graph elements and their attributes.
//!
//! - [`id`] - store identifiers (`NodeId`, `EdgeId`, ...)
//! - [`value`] - [`AttributeValue`], the [`AttributeType`] catalog and
//!   [`HashableValue`]
//! - [`interval`] - time [`Interval`] with open/closed bounds
//! - [`time`] - timestamp/interval maps and sets backing dynamic attributes

pub mod id;
pub mod interval;
pub mod time;
pub mod value;

pub use id::{ColumnId, EdgeId, EdgeTypeId, NodeId, ViewId};
pub use interval::{Interval, IntervalWithValue};
pub use time::{IntervalMap, IntervalSet, Timestamp, TimestampMap, TimestampSet};
pub use value::{AttributeType, AttributeValue, HashableValue};
