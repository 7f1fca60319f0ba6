//! Incremental multi-key partition comparator.
//!
//! A [`PartitionCompCalc`] turns an ordered list of live partition queries
//! into one comparator over raised element ids. Each partition owns an
//! [`OrderKey`]; an element's first key is the smallest order key among the
//! partitions matching it, or the reserved gap key when none does ("no
//! match" is a first-class key, never an error). Within a first-key group,
//! elements order by a projected second key, scalar while one partition
//! matches and an order-keyed sequence the moment a second one does.
//!
//! The external live-query engine drives the sink surface
//! ([`add_matches`](PartitionCompCalc::add_matches) and friends). Removals
//! are never applied inline: they queue per partition and apply in a
//! dedicated flush scheduled through the [`Scheduler`], after all pending
//! additions of the same cycle, so comparators never observe a transient
//! unmatched state during multi-step updates.

use std::cmp::Ordering;

use ahash::AHashMap;
use tracing::debug;

use crate::element::ElementTable;
use crate::schedule::{Pending, Scheduler, Task};
use crate::{ElementId, OrderKey, PathId, QueryId, Value};

/// Pull-side contract of an external live-query result node, used when a
/// partition is first wired in or resynchronized.
pub trait MatchSource {
    /// All element ids the query currently matches.
    fn dominated_matches(&self) -> Vec<ElementId>;

    /// The subset of `ids` the query currently matches.
    fn filter_dominated_positions(&self, ids: &[ElementId]) -> Vec<ElementId>;
}

/// One partition in an [`PartitionCompCalc::update_partition`] call.
pub struct PartitionSpec<'a> {
    /// Identity of the live query backing this partition.
    pub query: QueryId,
    /// The query's result node, consulted for initial population.
    pub source: &'a dyn MatchSource,
    /// Whether a value-projecting sub-query feeds second keys for this
    /// partition.
    pub with_value: bool,
}

#[derive(Debug, Clone)]
struct Partition {
    query: QueryId,
    order_key: OrderKey,
    with_value: bool,
}

/// Per-element second key: scalar while exactly one partition contributes a
/// value, an order-keyed sequence otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum SecondKey {
    /// A single projected value and the partition it came from.
    Scalar(OrderKey, Value),
    /// Values from several partitions, sorted by order key.
    PerPartition(Vec<(OrderKey, Value)>),
}

enum SecondKeyIter<'a> {
    One(Option<(OrderKey, &'a Value)>),
    Many(std::slice::Iter<'a, (OrderKey, Value)>),
}

impl<'a> Iterator for SecondKeyIter<'a> {
    type Item = (OrderKey, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            SecondKeyIter::One(slot) => slot.take(),
            SecondKeyIter::Many(iter) => iter.next().map(|(k, v)| (*k, v)),
        }
    }
}

impl SecondKey {
    fn entries(&self) -> SecondKeyIter<'_> {
        match self {
            SecondKey::Scalar(key, value) => SecondKeyIter::One(Some((*key, value))),
            SecondKey::PerPartition(list) => SecondKeyIter::Many(list.iter()),
        }
    }

    fn set(&mut self, key: OrderKey, value: Value) {
        match self {
            SecondKey::Scalar(existing, slot) if *existing == key => *slot = value,
            SecondKey::Scalar(existing, slot) => {
                let mut list = vec![(*existing, slot.clone()), (key, value)];
                list.sort_by_key(|(k, _)| *k);
                *self = SecondKey::PerPartition(list);
            }
            SecondKey::PerPartition(list) => {
                match list.binary_search_by_key(&key, |(k, _)| *k) {
                    Ok(index) => list[index].1 = value,
                    Err(index) => list.insert(index, (key, value)),
                }
            }
        }
    }

    /// Remove the value for `key`; returns `false` when the whole second
    /// key is now empty and should be dropped.
    fn clear(&mut self, key: OrderKey) -> bool {
        match self {
            SecondKey::Scalar(existing, _) => *existing != key,
            SecondKey::PerPartition(list) => {
                if let Ok(index) = list.binary_search_by_key(&key, |(k, _)| *k) {
                    list.remove(index);
                }
                match list.len() {
                    0 => false,
                    1 => {
                        let (k, v) = list.pop().expect("one entry left");
                        *self = SecondKey::Scalar(k, v);
                        true
                    }
                    _ => true,
                }
            }
        }
    }
}

fn cmp_second(a: Option<&SecondKey>, b: Option<&SecondKey>, ascending: bool) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => {
            let mut a_entries = a.entries();
            let mut b_entries = b.entries();
            loop {
                match (a_entries.next(), b_entries.next()) {
                    (None, None) => return Ordering::Equal,
                    (None, Some(_)) => return Ordering::Less,
                    (Some(_), None) => return Ordering::Greater,
                    (Some((a_key, a_value)), Some((b_key, b_value))) => {
                        // Order keys always compare ascending; only value
                        // comparisons honor the configured direction.
                        match a_key.cmp(&b_key) {
                            Ordering::Equal => {
                                let by_value = a_value.total_cmp(b_value);
                                let by_value =
                                    if ascending { by_value } else { by_value.reverse() };
                                if by_value != Ordering::Equal {
                                    return by_value;
                                }
                            }
                            unequal => return unequal,
                        }
                    }
                }
            }
        }
    }
}

/// Incremental comparator over raised element ids, grouped by partition.
pub struct PartitionCompCalc {
    granularity: Option<PathId>,
    partitions: Vec<Partition>,
    by_query: AHashMap<QueryId, usize>,
    gap_key: OrderKey,
    value_ascending: bool,
    /// Per raised element, matching partitions' order keys with match
    /// counts (several finer-path matches can raise to one element),
    /// sorted ascending.
    matches: AHashMap<ElementId, Vec<(OrderKey, u32)>>,
    /// Per raised element, projected second key.
    values: AHashMap<ElementId, SecondKey>,
    /// Removals queued per query until the flush phase.
    pending_removals: AHashMap<QueryId, Vec<ElementId>>,
    pending: Pending,
}

impl PartitionCompCalc {
    /// Create a comparison raising matches to `granularity` (`None` keeps
    /// matches at their own path).
    pub fn new(granularity: Option<PathId>) -> Self {
        Self {
            granularity,
            partitions: Vec::new(),
            by_query: AHashMap::new(),
            gap_key: OrderKey(0),
            value_ascending: true,
            matches: AHashMap::new(),
            values: AHashMap::new(),
            pending_removals: AHashMap::new(),
            pending: Pending::Idle,
        }
    }

    /// The reserved "no partition matched" key.
    pub fn gap_key(&self) -> OrderKey {
        self.gap_key
    }

    /// The order key of `query`'s partition.
    pub fn order_key_of(&self, query: QueryId) -> Option<OrderKey> {
        self.by_query
            .get(&query)
            .map(|&index| self.partitions[index].order_key)
    }

    /// Whether removals are queued and unflushed.
    pub fn has_pending_removals(&self) -> bool {
        self.pending_removals.values().any(|v| !v.is_empty())
    }

    /// Element ids currently matched by at least one partition.
    pub fn matched_elements(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.matches.keys().copied()
    }

    /// Reconfigure the partition list, gap position, and value direction.
    ///
    /// Existing queries keep their order key when it is already at least the
    /// next needed key (stability); removed queries are torn down; new
    /// queries are populated from their [`MatchSource`] only after key
    /// bookkeeping is consistent, so their matches cannot race key
    /// assignment. Existing first/second keys are remapped in place through
    /// an old-to-new key translation table.
    pub fn update_partition(
        &mut self,
        specs: &[PartitionSpec<'_>],
        gap_pos: Option<usize>,
        value_ascending: bool,
        elements: &ElementTable,
    ) {
        let gap_slot = gap_pos.unwrap_or(specs.len()).min(specs.len());
        let had_config = !self.partitions.is_empty();
        let mut translation: AHashMap<OrderKey, OrderKey> = AHashMap::new();
        let mut new_keys: Vec<OrderKey> = Vec::with_capacity(specs.len());
        let mut next = 0u32;
        let mut spec_index = 0;
        for position in 0..=specs.len() {
            if position == gap_slot {
                let key = if had_config && self.gap_key.0 >= next {
                    self.gap_key
                } else {
                    OrderKey(next)
                };
                next = key.0 + 1;
                self.gap_key = key;
            } else {
                let spec = &specs[spec_index];
                spec_index += 1;
                let key = match self.by_query.get(&spec.query) {
                    Some(&index) => {
                        let old = self.partitions[index].order_key;
                        let key = if old.0 >= next { old } else { OrderKey(next) };
                        translation.insert(old, key);
                        key
                    }
                    None => OrderKey(next),
                };
                next = key.0 + 1;
                new_keys.push(key);
            }
        }

        // Remap kept keys in place; keys of removed partitions drop out,
        // which leaves elements with no match on the gap key implicitly.
        self.matches.retain(|_, counts| {
            counts.retain_mut(|(key, _)| match translation.get(key) {
                Some(&new) => {
                    *key = new;
                    true
                }
                None => false,
            });
            counts.sort_by_key(|(key, _)| *key);
            !counts.is_empty()
        });
        self.values.retain(|_, second| {
            let kept: Vec<(OrderKey, Value)> = second
                .entries()
                .filter_map(|(key, value)| {
                    translation.get(&key).map(|&new| (new, value.clone()))
                })
                .collect();
            match kept.len() {
                0 => false,
                1 => {
                    let (key, value) = kept.into_iter().next().expect("one entry");
                    *second = SecondKey::Scalar(key, value);
                    true
                }
                _ => {
                    let mut kept = kept;
                    kept.sort_by_key(|(key, _)| *key);
                    *second = SecondKey::PerPartition(kept);
                    true
                }
            }
        });

        let previous: AHashMap<QueryId, usize> = std::mem::take(&mut self.by_query);
        self.partitions = specs
            .iter()
            .zip(new_keys)
            .map(|(spec, order_key)| Partition {
                query: spec.query,
                order_key,
                with_value: spec.with_value,
            })
            .collect();
        for (index, partition) in self.partitions.iter().enumerate() {
            self.by_query.insert(partition.query, index);
        }
        self.pending_removals
            .retain(|query, _| self.by_query.contains_key(query));
        self.value_ascending = value_ascending;

        // Wire new queries only now that keys are consistent.
        for spec in specs {
            if !previous.contains_key(&spec.query) {
                let initial = spec.source.dominated_matches();
                self.add_matches(spec.query, &initial, elements);
            }
        }
        debug!(
            partitions = self.partitions.len(),
            gap = self.gap_key.0,
            "partition update"
        );
    }

    /// Reconcile the tracked matches of `query` against its result node:
    /// elements no longer matched are queued for removal, fresh matches are
    /// added.
    pub fn resync_matches(
        &mut self,
        query: QueryId,
        source: &dyn MatchSource,
        elements: &ElementTable,
        scheduler: &mut impl Scheduler,
    ) {
        let Some(order_key) = self.order_key_of(query) else {
            return;
        };
        let tracked: Vec<ElementId> = self
            .matches
            .iter()
            .filter(|(_, counts)| counts.iter().any(|&(key, _)| key == order_key))
            .map(|(&element, _)| element)
            .collect();
        let still_matched = source.filter_dominated_positions(&tracked);
        for element in &tracked {
            if !still_matched.contains(element) {
                self.queue_removal(query, *element, scheduler);
            }
        }
        let current = source.dominated_matches();
        let fresh: Vec<ElementId> = current
            .into_iter()
            .filter(|id| {
                self.raise(*id, elements)
                    .is_some_and(|raised| !tracked.contains(&raised))
            })
            .collect();
        self.add_matches(query, &fresh, elements);
    }

    fn raise(&self, id: ElementId, elements: &ElementTable) -> Option<ElementId> {
        match self.granularity {
            Some(path) => elements.raise_to_path(id, path),
            None => Some(id),
        }
    }

    /// The live-query engine reports new matches for `query`.
    ///
    /// An addition cancels a pending queued removal of the same element in
    /// the same partition instead of double-counting it (a remove+re-add
    /// within one cycle is a net addition).
    pub fn add_matches(&mut self, query: QueryId, ids: &[ElementId], elements: &ElementTable) {
        let Some(&index) = self.by_query.get(&query) else {
            return;
        };
        let order_key = self.partitions[index].order_key;
        for &id in ids {
            let Some(raised) = self.raise(id, elements) else {
                continue;
            };
            if let Some(pending) = self.pending_removals.get_mut(&query) {
                if let Some(position) = pending.iter().position(|&e| e == raised) {
                    pending.swap_remove(position);
                    continue;
                }
            }
            let counts = self.matches.entry(raised).or_default();
            match counts.binary_search_by_key(&order_key, |(key, _)| *key) {
                Ok(found) => counts[found].1 += 1,
                Err(insert_at) => counts.insert(insert_at, (order_key, 1)),
            }
        }
    }

    /// The live-query engine reports dropped matches for `query`. Applied
    /// only at the next [`PartitionCompCalc::flush_removals`].
    pub fn remove_matches(
        &mut self,
        query: QueryId,
        ids: &[ElementId],
        elements: &ElementTable,
        scheduler: &mut impl Scheduler,
    ) {
        if !self.by_query.contains_key(&query) {
            return;
        }
        for &id in ids {
            let Some(raised) = self.raise(id, elements) else {
                continue;
            };
            self.queue_removal(query, raised, scheduler);
        }
    }

    /// The live-query engine dropped every match of `query` at once.
    pub fn remove_all_matches(&mut self, query: QueryId, scheduler: &mut impl Scheduler) {
        let Some(order_key) = self.order_key_of(query) else {
            return;
        };
        let drops: Vec<(ElementId, u32)> = self
            .matches
            .iter()
            .filter_map(|(&element, counts)| {
                counts
                    .iter()
                    .find(|&&(key, _)| key == order_key)
                    .map(|&(_, count)| (element, count))
            })
            .collect();
        for (element, count) in drops {
            for _ in 0..count {
                self.queue_removal(query, element, scheduler);
            }
        }
    }

    fn queue_removal(&mut self, query: QueryId, raised: ElementId, scheduler: &mut impl Scheduler) {
        self.pending_removals.entry(query).or_default().push(raised);
        self.pending
            .request(scheduler, Task::FlushPartitionRemovals);
    }

    /// Apply all queued removals. Runs after every pending addition of the
    /// cycle so cross-source updates of one element reconcile first.
    pub fn flush_removals(&mut self) {
        self.pending.take();
        let queued = std::mem::take(&mut self.pending_removals);
        let mut applied = 0usize;
        for (query, elements) in queued {
            let Some(order_key) = self.order_key_of(query) else {
                continue;
            };
            for element in elements {
                applied += 1;
                let Some(counts) = self.matches.get_mut(&element) else {
                    continue;
                };
                let mut unmatched = false;
                if let Ok(found) = counts.binary_search_by_key(&order_key, |(key, _)| *key) {
                    counts[found].1 -= 1;
                    if counts[found].1 == 0 {
                        counts.remove(found);
                        unmatched = true;
                    }
                }
                if counts.is_empty() {
                    self.matches.remove(&element);
                }
                // The projected value follows the last finer-path match out.
                if unmatched {
                    self.clear_value_key(element, order_key);
                }
            }
        }
        debug!(applied, "partition removal flush");
    }

    /// A value-projecting sub-query produced `value` for `id` under `query`.
    pub fn set_match_value(
        &mut self,
        query: QueryId,
        id: ElementId,
        value: Value,
        elements: &ElementTable,
    ) {
        let Some(&index) = self.by_query.get(&query) else {
            return;
        };
        if !self.partitions[index].with_value {
            return;
        }
        let order_key = self.partitions[index].order_key;
        let Some(raised) = self.raise(id, elements) else {
            return;
        };
        match self.values.get_mut(&raised) {
            Some(second) => second.set(order_key, value),
            None => {
                self.values.insert(raised, SecondKey::Scalar(order_key, value));
            }
        }
    }

    /// Drop the projected value of `id` under `query`.
    pub fn clear_match_value(&mut self, query: QueryId, id: ElementId, elements: &ElementTable) {
        let Some(order_key) = self.order_key_of(query) else {
            return;
        };
        let Some(raised) = self.raise(id, elements) else {
            return;
        };
        self.clear_value_key(raised, order_key);
    }

    fn clear_value_key(&mut self, element: ElementId, order_key: OrderKey) {
        if let Some(second) = self.values.get_mut(&element) {
            if !second.clear(order_key) {
                self.values.remove(&element);
            }
        }
    }

    /// The element's first key: smallest matching order key, or the gap key.
    pub fn first_key(&self, element: ElementId) -> OrderKey {
        self.matches
            .get(&element)
            .and_then(|counts| counts.first())
            .map(|&(key, _)| key)
            .unwrap_or(self.gap_key)
    }

    /// The element's second key, if any value was projected for it.
    pub fn second_key(&self, element: ElementId) -> Option<&SecondKey> {
        self.values.get(&element)
    }

    /// Compare two raised elements: first keys ascending always, ties by
    /// second key with the configured direction.
    pub fn compare(&self, a: ElementId, b: ElementId) -> Ordering {
        self.first_key(a)
            .cmp(&self.first_key(b))
            .then_with(|| {
                cmp_second(
                    self.values.get(&a),
                    self.values.get(&b),
                    self.value_ascending,
                )
            })
    }

    /// The comparator as a closure, for handing to an external sort/order
    /// service.
    pub fn compare_fn(&self) -> impl Fn(ElementId, ElementId) -> Ordering + '_ {
        move |a, b| self.compare(a, b)
    }
}
