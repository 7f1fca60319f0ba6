//! Identifier newtypes shared by all components.

use std::sync::Arc;

/// Identifier of a data element in the external data-element table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementId(pub u64);

/// Identifier of a path (granularity level) in the data-element table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathId(pub u32);

/// Identifier of a live query registered with a partition comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueryId(pub u64);

/// Identifier of an additional identification registered with an indexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IdentificationId(pub u32);

/// Identifier of a tree inside a [`Forest`](crate::Forest).
///
/// A fresh id is allocated on every split, so two trees produced by one
/// split are never confused with each other or with the tree they came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeId(pub u64);

/// Integer rank of a partition inside a comparison, defining group order.
///
/// A reserved gap key represents "no partition matched"; it is an ordinary
/// `OrderKey` value, not a sentinel outside the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrderKey(pub u32);

/// Stable cross-structure identity of a data element.
///
/// The three variants keep the source value spaces apart: explicit string
/// identities, negative numeric identities assigned by identification
/// functions, and non-negative numeric identities (the default is the
/// element's own id).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Identity {
    /// String identity.
    Str(Arc<str>),
    /// Negative numeric identity.
    Neg(i64),
    /// Non-negative numeric identity.
    Pos(u64),
}

impl From<ElementId> for Identity {
    fn from(id: ElementId) -> Self {
        Identity::Pos(id.0)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Identity::Str(Arc::from(s))
    }
}
