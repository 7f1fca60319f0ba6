//! Incrementally maintained min/max aggregate over typed values.
//!
//! A [`RangeKey`] tracks a set of `(ElementId, Value)` members and answers
//! min/max queries while all members share one orderable [`ValueKind`]. A
//! heap is only kept in that uniform state; mixing in a second kind demotes
//! the range to flat storage (the member table alone) until it becomes
//! uniform again. Value kinds are stable in the expected workloads, so the
//! O(n) demotion and kind re-derivation are rare.

use std::cmp::Ordering;

use ahash::AHashMap;
use tracing::trace;

use crate::heap::PositionedHeap;
use crate::{ElementId, Value, ValueKind};

fn value_cmp(a: &Value, b: &Value) -> Ordering {
    a.total_cmp(b)
}

type ValueHeap = PositionedHeap<Value, fn(&Value, &Value) -> Ordering>;

/// Min/max aggregate with open/closed interval endpoint metadata.
#[derive(Debug)]
pub struct RangeKey {
    members: AHashMap<ElementId, Value>,
    /// Adopted kind; `None` while empty.
    kind: Option<ValueKind>,
    /// Members of the adopted kind.
    kind_count: usize,
    /// Members of any other kind.
    other_kind_count: usize,
    /// Present exactly while the range is active with members to order.
    heap: Option<ValueHeap>,
    min_open: bool,
    max_open: bool,
}

impl RangeKey {
    /// Create an empty range; `min_open`/`max_open` describe the interval
    /// endpoints for [`RangeKey::value_in_range`] and
    /// [`RangeKey::intersects_with`].
    pub fn new(min_open: bool, max_open: bool) -> Self {
        Self {
            members: AHashMap::new(),
            kind: None,
            kind_count: 0,
            other_kind_count: 0,
            heap: None,
            min_open,
            max_open,
        }
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the range has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether the min-open endpoint flag is set.
    pub fn min_open(&self) -> bool {
        self.min_open
    }

    /// Whether the max-open endpoint flag is set.
    pub fn max_open(&self) -> bool {
        self.max_open
    }

    /// Whether min/max are queryable: no member of a foreign kind, and the
    /// adopted kind orderable (or no members of it left).
    pub fn is_active(&self) -> bool {
        self.other_kind_count == 0
            && (self.kind_count == 0 || self.kind.is_some_and(ValueKind::is_orderable))
    }

    /// Add (or replace) the member `id` with `value`.
    pub fn add(&mut self, id: ElementId, value: Value) {
        if self.members.contains_key(&id) {
            self.remove(id);
        }
        let kind = value.kind();
        match self.kind {
            None => {
                self.kind = Some(kind);
                self.kind_count = 1;
            }
            Some(adopted) if adopted == kind => self.kind_count += 1,
            Some(_) => self.other_kind_count += 1,
        }
        if let Some(heap) = &mut self.heap {
            if self.other_kind_count == 0 {
                heap.insert(id, value.clone());
            }
        }
        self.members.insert(id, value);
        self.sync_storage();
    }

    /// Remove the member `id`. Unknown ids are a no-op.
    pub fn remove(&mut self, id: ElementId) {
        let Some(value) = self.members.remove(&id) else {
            return;
        };
        if Some(value.kind()) == self.kind {
            self.kind_count -= 1;
            if self.kind_count == 0 {
                self.rederive_kind();
            }
        } else {
            self.other_kind_count -= 1;
        }
        if let Some(heap) = &mut self.heap {
            heap.remove(id);
        }
        self.sync_storage();
    }

    /// The smallest member value, when active and non-empty.
    pub fn min_key(&self) -> Option<&Value> {
        self.heap.as_ref()?.peek_min().map(|(_, v)| v)
    }

    /// The largest member value, when active and non-empty.
    pub fn max_key(&self) -> Option<&Value> {
        self.heap.as_ref()?.peek_max().map(|(_, v)| v)
    }

    /// Whether `value` lies inside the current [min, max] span, honoring the
    /// open-endpoint flags. `false` while the range is inactive or empty.
    pub fn value_in_range(&self, value: &Value) -> bool {
        let (Some(min), Some(max)) = (self.min_key(), self.max_key()) else {
            return false;
        };
        let above = match value.total_cmp(min) {
            Ordering::Greater => true,
            Ordering::Equal => !self.min_open,
            Ordering::Less => false,
        };
        let below = match value.total_cmp(max) {
            Ordering::Less => true,
            Ordering::Equal => !self.max_open,
            Ordering::Greater => false,
        };
        above && below
    }

    /// Whether the spans of two ranges overlap, honoring the open-endpoint
    /// flags at equal boundary values. `false` when either side has no span.
    pub fn intersects_with(&self, other: &Self) -> bool {
        let (Some(self_min), Some(self_max)) = (self.min_key(), self.max_key()) else {
            return false;
        };
        let (Some(other_min), Some(other_max)) = (other.min_key(), other.max_key()) else {
            return false;
        };
        let left_ok = match self_min.total_cmp(other_max) {
            Ordering::Less => true,
            Ordering::Equal => !self.min_open && !other.max_open,
            Ordering::Greater => false,
        };
        let right_ok = match other_min.total_cmp(self_max) {
            Ordering::Less => true,
            Ordering::Equal => !other.min_open && !self.max_open,
            Ordering::Greater => false,
        };
        left_ok && right_ok
    }

    /// The dominant kind's count dropped to zero: adopt the kind of an
    /// arbitrary remaining member and recount. O(n), rare.
    fn rederive_kind(&mut self) {
        let Some(value) = self.members.values().next() else {
            self.kind = None;
            self.other_kind_count = 0;
            return;
        };
        let kind = value.kind();
        self.kind = Some(kind);
        self.kind_count = self.members.values().filter(|v| v.kind() == kind).count();
        self.other_kind_count = self.members.len() - self.kind_count;
    }

    /// Keep the heap's existence in sync with activity: activate (migrate
    /// all members into a fresh heap) when the range becomes uniform and
    /// orderable, drop the heap on demotion.
    fn sync_storage(&mut self) {
        let want_heap = self.is_active() && !self.members.is_empty();
        match (&self.heap, want_heap) {
            (None, true) => {
                trace!(members = self.members.len(), "range key activate");
                let mut heap: ValueHeap = PositionedHeap::new(value_cmp);
                for (&id, value) in &self.members {
                    heap.insert(id, value.clone());
                }
                self.heap = Some(heap);
            }
            (Some(_), false) => {
                trace!(members = self.members.len(), "range key deactivate");
                self.heap = None;
            }
            _ => {}
        }
    }
}
