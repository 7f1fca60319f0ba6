//! Typed runtime values and their total comparison order.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::ElementId;

/// A runtime value produced by a value-projecting sub-query or stored in a
/// range aggregate.
///
/// The set of types is closed; [`ValueKind`] enumerates the tags.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// A number. `NaN` participates via `f64::total_cmp`.
    Num(f64),
    /// A string.
    Str(Arc<str>),
    /// A boolean.
    Bool(bool),
    /// A reference to a data element.
    Elem(ElementId),
}

/// Type tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueKind {
    /// Numbers, orderable.
    Num,
    /// Strings, orderable.
    Str,
    /// Booleans, not orderable.
    Bool,
    /// Element references, not orderable.
    Elem,
}

impl ValueKind {
    /// Whether values of this kind carry a meaningful order.
    ///
    /// Non-orderable kinds force a [`RangeKey`](crate::RangeKey) inactive
    /// even when all members share the kind.
    pub fn is_orderable(self) -> bool {
        matches!(self, ValueKind::Num | ValueKind::Str)
    }
}

impl Value {
    /// The type tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Num(_) => ValueKind::Num,
            Value::Str(_) => ValueKind::Str,
            Value::Bool(_) => ValueKind::Bool,
            Value::Elem(_) => ValueKind::Elem,
        }
    }

    /// Total order over all values: kind tags compare first, values of the
    /// same kind compare second.
    ///
    /// This is the mixed-type fallback used by comparators, so heterogeneous
    /// results stay a total order instead of failing.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Num(a), Value::Num(b)) => a.total_cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Elem(a), Value::Elem(b)) => a.cmp(b),
            (a, b) => a.kind().cmp(&b.kind()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Num(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_classification() {
        assert!(ValueKind::Num.is_orderable());
        assert!(ValueKind::Str.is_orderable());
        assert!(!ValueKind::Bool.is_orderable());
        assert!(!ValueKind::Elem.is_orderable());
    }

    #[test]
    fn same_kind_comparison() {
        assert_eq!(
            Value::Num(1.0).total_cmp(&Value::Num(2.0)),
            Ordering::Less
        );
        assert_eq!(
            Value::from("a").total_cmp(&Value::from("b")),
            Ordering::Less
        );
        assert_eq!(
            Value::Bool(false).total_cmp(&Value::Bool(true)),
            Ordering::Less
        );
    }

    #[test]
    fn mixed_kind_falls_back_to_tag_order() {
        // Num < Str < Bool < Elem by tag rank.
        assert_eq!(
            Value::Num(1e9).total_cmp(&Value::from("")),
            Ordering::Less
        );
        assert_eq!(
            Value::from("zzz").total_cmp(&Value::Bool(false)),
            Ordering::Less
        );
        assert_eq!(
            Value::Bool(true).total_cmp(&Value::Elem(ElementId(0))),
            Ordering::Less
        );
    }

    #[test]
    fn nan_is_ordered() {
        let nan = Value::Num(f64::NAN);
        assert_eq!(nan.total_cmp(&nan), Ordering::Equal);
        assert_eq!(Value::Num(f64::INFINITY).total_cmp(&nan), Ordering::Less);
    }
}
