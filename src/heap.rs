//! Array-backed min-max heap with stable external ids.
//!
//! Entries are addressed by [`ElementId`] through a parallel id-to-index map
//! that is kept current on every swap, so deleting an arbitrary entry is
//! O(log n) without searching. Min levels are the even levels, max levels the
//! odd ones; both `peek_min` and `peek_max` are O(1).

use std::cmp::Ordering;

use ahash::AHashMap;

use crate::ElementId;

/// A min-max binary heap over `(ElementId, T)` entries, parameterized over
/// the comparator.
pub struct PositionedHeap<T, C> {
    items: Vec<(ElementId, T)>,
    pos: AHashMap<ElementId, usize>,
    cmp: C,
}

impl<T, C> std::fmt::Debug for PositionedHeap<T, C>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PositionedHeap")
            .field("items", &self.items)
            .finish()
    }
}

fn is_min_level(index: usize) -> bool {
    (index + 1).ilog2() % 2 == 0
}

fn parent(index: usize) -> usize {
    (index - 1) / 2
}

fn has_grandparent(index: usize) -> bool {
    index >= 3
}

impl<T, C> PositionedHeap<T, C>
where
    C: Fn(&T, &T) -> Ordering,
{
    /// Create an empty heap using `cmp` as the entry order.
    pub fn new(cmp: C) -> Self {
        Self {
            items: Vec::new(),
            pos: AHashMap::new(),
            cmp,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the heap has no entries.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether `id` has an entry.
    pub fn contains(&self, id: ElementId) -> bool {
        self.pos.contains_key(&id)
    }

    /// The value stored for `id`, if any.
    pub fn get(&self, id: ElementId) -> Option<&T> {
        self.pos.get(&id).map(|&i| &self.items[i].1)
    }

    /// Insert `value` under `id`, replacing any previous entry for `id`.
    pub fn insert(&mut self, id: ElementId, value: T) {
        if self.pos.contains_key(&id) {
            self.remove(id);
        }
        let index = self.items.len();
        self.items.push((id, value));
        self.pos.insert(id, index);
        self.bubble_up(index);
    }

    /// Remove the entry for `id`, returning its value.
    ///
    /// Unknown ids are a no-op returning `None`.
    pub fn remove(&mut self, id: ElementId) -> Option<T> {
        let index = *self.pos.get(&id)?;
        let last = self.items.len() - 1;
        self.swap(index, last);
        let (_, value) = self.items.pop().expect("entry present");
        self.pos.remove(&id);
        if index < self.items.len() {
            let moved = self.items[index].0;
            self.trickle_down(index);
            // The replacement came from the bottom; if trickling left it in
            // place it may still belong further up.
            if self.pos[&moved] == index {
                self.bubble_up(index);
            }
        }
        Some(value)
    }

    /// The entry with the smallest value.
    pub fn peek_min(&self) -> Option<(ElementId, &T)> {
        self.items.first().map(|(id, v)| (*id, v))
    }

    /// The entry with the largest value.
    pub fn peek_max(&self) -> Option<(ElementId, &T)> {
        let index = self.max_index()?;
        let (id, v) = &self.items[index];
        Some((*id, v))
    }

    /// Iterate over all entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &T)> {
        self.items.iter().map(|(id, v)| (*id, v))
    }

    fn max_index(&self) -> Option<usize> {
        match self.items.len() {
            0 => None,
            1 => Some(0),
            2 => Some(1),
            _ => {
                if self.less(1, 2) {
                    Some(2)
                } else {
                    Some(1)
                }
            }
        }
    }

    fn less(&self, a: usize, b: usize) -> bool {
        (self.cmp)(&self.items[a].1, &self.items[b].1) == Ordering::Less
    }

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.items.swap(a, b);
        self.pos.insert(self.items[a].0, a);
        self.pos.insert(self.items[b].0, b);
    }

    fn bubble_up(&mut self, index: usize) {
        if index == 0 {
            return;
        }
        let p = parent(index);
        if is_min_level(index) {
            if self.less(p, index) {
                self.swap(index, p);
                self.bubble_up_max(p);
            } else {
                self.bubble_up_min(index);
            }
        } else if self.less(index, p) {
            self.swap(index, p);
            self.bubble_up_min(p);
        } else {
            self.bubble_up_max(index);
        }
    }

    fn bubble_up_min(&mut self, mut index: usize) {
        while has_grandparent(index) {
            let gp = parent(parent(index));
            if self.less(index, gp) {
                self.swap(index, gp);
                index = gp;
            } else {
                break;
            }
        }
    }

    fn bubble_up_max(&mut self, mut index: usize) {
        while has_grandparent(index) {
            let gp = parent(parent(index));
            if self.less(gp, index) {
                self.swap(index, gp);
                index = gp;
            } else {
                break;
            }
        }
    }

    fn trickle_down(&mut self, index: usize) {
        if is_min_level(index) {
            self.trickle_down_min(index);
        } else {
            self.trickle_down_max(index);
        }
    }

    /// Indices of existing children and grandchildren of `index`.
    fn descendants(&self, index: usize) -> impl Iterator<Item = usize> {
        let len = self.items.len();
        let first_child = 2 * index + 1;
        let first_grandchild = 4 * index + 3;
        (first_child..first_child + 2)
            .chain(first_grandchild..first_grandchild + 4)
            .filter(move |&i| i < len)
    }

    fn trickle_down_min(&mut self, mut index: usize) {
        loop {
            let Some(m) = self
                .descendants(index)
                .min_by(|&a, &b| (self.cmp)(&self.items[a].1, &self.items[b].1))
            else {
                return;
            };
            let is_grandchild = m >= 4 * index + 3;
            if is_grandchild {
                if self.less(m, index) {
                    self.swap(m, index);
                    if self.less(parent(m), m) {
                        self.swap(m, parent(m));
                    }
                    index = m;
                    continue;
                }
            } else if self.less(m, index) {
                self.swap(m, index);
            }
            return;
        }
    }

    fn trickle_down_max(&mut self, mut index: usize) {
        loop {
            let Some(m) = self
                .descendants(index)
                .max_by(|&a, &b| (self.cmp)(&self.items[a].1, &self.items[b].1))
            else {
                return;
            };
            let is_grandchild = m >= 4 * index + 3;
            if is_grandchild {
                if self.less(index, m) {
                    self.swap(m, index);
                    if self.less(m, parent(m)) {
                        self.swap(m, parent(m));
                    }
                    index = m;
                    continue;
                }
            } else if self.less(index, m) {
                self.swap(m, index);
            }
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heap() -> PositionedHeap<i64, impl Fn(&i64, &i64) -> Ordering> {
        PositionedHeap::new(|a: &i64, b: &i64| a.cmp(b))
    }

    #[test]
    fn empty() {
        let h = heap();
        assert!(h.is_empty());
        assert!(h.peek_min().is_none());
        assert!(h.peek_max().is_none());
    }

    #[test]
    fn min_and_max_track_inserts() {
        let mut h = heap();
        for (i, v) in [5, 3, 9, 1, 7, 9, -2].into_iter().enumerate() {
            h.insert(ElementId(i as u64), v);
        }
        assert_eq!(h.peek_min().map(|(_, v)| *v), Some(-2));
        assert_eq!(h.peek_max().map(|(_, v)| *v), Some(9));
        assert_eq!(h.len(), 7);
    }

    #[test]
    fn remove_by_id() {
        let mut h = heap();
        for (i, v) in [4, 8, 2, 6].into_iter().enumerate() {
            h.insert(ElementId(i as u64), v);
        }
        assert_eq!(h.remove(ElementId(2)), Some(2));
        assert_eq!(h.peek_min().map(|(_, v)| *v), Some(4));
        assert_eq!(h.remove(ElementId(1)), Some(8));
        assert_eq!(h.peek_max().map(|(_, v)| *v), Some(6));
        assert_eq!(h.remove(ElementId(7)), None);
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn insert_replaces_existing_id() {
        let mut h = heap();
        h.insert(ElementId(1), 10);
        h.insert(ElementId(1), 3);
        assert_eq!(h.len(), 1);
        assert_eq!(h.get(ElementId(1)), Some(&3));
        assert_eq!(h.peek_min().map(|(_, v)| *v), Some(3));
        assert_eq!(h.peek_max().map(|(_, v)| *v), Some(3));
    }

    // Deterministic pseudo-random interleaving of inserts and removals,
    // checked against a naive reference on every step.
    #[test]
    fn matches_naive_reference() {
        let mut h = heap();
        let mut reference: std::collections::BTreeMap<u64, i64> = Default::default();
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        for _ in 0..2000 {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let id = ElementId(state >> 56);
            let value = ((state >> 16) & 0xff) as i64 - 128;
            if state % 3 == 0 {
                h.remove(id);
                reference.remove(&id.0);
            } else {
                h.insert(id, value);
                reference.insert(id.0, value);
            }
            assert_eq!(h.len(), reference.len());
            assert_eq!(
                h.peek_min().map(|(_, v)| *v),
                reference.values().min().copied()
            );
            assert_eq!(
                h.peek_max().map(|(_, v)| *v),
                reference.values().max().copied()
            );
        }
    }
}
