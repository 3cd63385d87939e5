//! Identifier types for graph elements.
//!
//! Every entity kind lives in a dense slot array; an id is the stable index
//! of a live entity's slot. Freed slots are recycled smallest-first, so ids
//! stay compact. `NULL` (`u32::MAX`) doubles as the end-of-chain marker in
//! adjacency links.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! store_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[repr(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// The null id, used for freed slots and chain terminators.
            pub const NULL: Self = Self(u32::MAX);

            /// Creates an id from a raw slot index.
            #[inline]
            #[must_use]
            pub const fn new(id: u32) -> Self {
                Self(id)
            }

            /// Returns the raw slot index.
            #[inline]
            #[must_use]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            /// Returns `true` if this id refers to no slot.
            #[inline]
            #[must_use]
            pub const fn is_null(self) -> bool {
                self.0 == u32::MAX
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::NULL
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_null() {
                    write!(f, concat!(stringify!($name), "(NULL)"))
                } else {
                    write!(f, concat!(stringify!($name), "({})"), self.0)
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(id: u32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

store_id! {
    /// Stable slot identifier of a node within its store.
    NodeId
}

store_id! {
    /// Stable slot identifier of an edge within its store.
    ///
    /// Adjacency chains are threaded through edge records as `EdgeId` links,
    /// with [`EdgeId::NULL`] terminating each chain.
    EdgeId
}

store_id! {
    /// Dense identifier of an interned edge type label.
    EdgeTypeId
}

store_id! {
    /// Dense identifier of a column within a table. Column ids are not
    /// recycled after removal.
    ColumnId
}

store_id! {
    /// Identifier of a graph view. Destroyed views keep `NULL` and reject
    /// further operations.
    ViewId
}

impl EdgeTypeId {
    /// The default edge type, always present.
    pub const DEFAULT: Self = Self(0);
}

impl ViewId {
    /// The main (unfiltered) view of the base graph. It is not backed by a
    /// view slot; set algebra on it is unsupported.
    pub const MAIN: Self = Self(u32::MAX - 1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_basics() {
        let id = NodeId::new(42);
        assert_eq!(id.index(), 42);
        assert!(!id.is_null());
        assert!(NodeId::NULL.is_null());
        assert_eq!(NodeId::default(), NodeId::NULL);
    }

    #[test]
    fn test_id_ordering() {
        assert!(EdgeId::new(1) < EdgeId::new(2));
        assert!(EdgeId::new(2) < EdgeId::NULL);
    }

    #[test]
    fn test_debug_format() {
        assert_eq!(format!("{:?}", NodeId::new(3)), "NodeId(3)");
        assert_eq!(format!("{:?}", NodeId::NULL), "NodeId(NULL)");
    }

    #[test]
    fn test_main_view_is_not_null() {
        assert!(!ViewId::MAIN.is_null());
        assert_ne!(ViewId::MAIN, ViewId::NULL);
    }
}
