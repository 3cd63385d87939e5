//! Error types shared across the Trellis crates.

use crate::types::AttributeType;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors surfaced by the graph core.
///
/// Validation errors leave the store untouched; the failed operation is a
/// no-op. Internal invariant breakage never surfaces here - it is asserted
/// in debug builds instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A required argument was absent or null-valued.
    #[error("argument must not be null")]
    NullArgument,

    /// A value does not match the expected attribute or element type.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The type the operation required.
        expected: AttributeType,
        /// The type that was actually supplied.
        actual: AttributeType,
    },

    /// The node, edge, view or column handle does not belong to this store,
    /// or refers to a slot that has since been freed.
    #[error("element does not belong to this store")]
    NotOwned,

    /// An identifier is already taken.
    #[error("duplicate identifier")]
    Duplicate,

    /// The operation is not supported on this target.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// API misuse: illegal lock upgrade, cursor misuse, operations on a
    /// destroyed view or observer.
    #[error("programming error: {0}")]
    ProgrammingError(&'static str),

    /// A walker observed a structural change since it was created.
    #[error("graph was structurally modified during iteration")]
    StaleIterator,

    /// A textual value could not be parsed into the requested type.
    #[error("parse error: {0}")]
    Parse(String),
}
