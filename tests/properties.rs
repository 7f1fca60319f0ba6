//! Model-based property tests against naive reference implementations.

use std::cmp::Ordering;

use ahash::AHashMap;
use proptest::prelude::*;

use keyflow::{
    ElementId, ElementTable, FifoScheduler, Forest, NoopForestObserver, OrderKey,
    PartitionCompCalc, PartitionSpec, QueryId, RangeKey, SecondKey, Value,
};

const POINTS: [&str; 6] = ["p0", "p1", "p2", "p3", "p4", "p5"];

#[derive(Debug, Clone)]
enum ForestOp {
    Add(usize, usize),
    Remove(usize, usize),
}

fn forest_ops() -> impl Strategy<Value = Vec<ForestOp>> {
    prop::collection::vec(
        (any::<bool>(), 0..POINTS.len(), 0..POINTS.len()).prop_map(|(add, a, b)| {
            if add {
                ForestOp::Add(a, b)
            } else {
                ForestOp::Remove(a, b)
            }
        }),
        1..60,
    )
}

/// Undirected reachability over the reference edge list.
fn connected(edges: &[(usize, usize)], from: usize, to: usize) -> bool {
    let mut seen = [false; POINTS.len()];
    let mut stack = vec![from];
    seen[from] = true;
    while let Some(current) = stack.pop() {
        if current == to {
            return true;
        }
        for &(a, b) in edges {
            let next = if a == current {
                b
            } else if b == current {
                a
            } else {
                continue;
            };
            if !seen[next] {
                seen[next] = true;
                stack.push(next);
            }
        }
    }
    false
}

fn degree(edges: &[(usize, usize)], point: usize) -> usize {
    edges.iter().filter(|&&(a, b)| a == point || b == point).count()
}

proptest! {
    #[test]
    fn forest_connectivity_matches_reference(ops in forest_ops()) {
        let mut forest = Forest::new();
        let mut observer = NoopForestObserver;
        let mut edges: Vec<(usize, usize)> = Vec::new();

        for op in ops {
            match op {
                ForestOp::Add(a, b) => {
                    let cycle = a == b
                        || (degree(&edges, a) > 0
                            && degree(&edges, b) > 0
                            && connected(&edges, a, b));
                    let added = forest.add_edge(POINTS[a], POINTS[b], &mut observer);
                    prop_assert_eq!(added, !cycle);
                    if added {
                        edges.push((a, b));
                    }
                }
                ForestOp::Remove(a, b) => {
                    let position = edges
                        .iter()
                        .position(|&(x, y)| (x, y) == (a, b) || (x, y) == (b, a));
                    let removed = forest.remove_edge(POINTS[a], POINTS[b], &mut observer);
                    prop_assert_eq!(removed, position.is_some());
                    if let Some(position) = position {
                        edges.swap_remove(position);
                    }
                }
            }

            for i in 0..POINTS.len() {
                for j in 0..POINTS.len() {
                    let exists = degree(&edges, i) > 0 && degree(&edges, j) > 0;
                    let expect = exists && connected(&edges, i, j);
                    prop_assert_eq!(forest.in_same_tree(POINTS[i], POINTS[j]), expect);
                    if exists && !expect {
                        // Disconnected components never share a tree id.
                        let ti = forest.tree_id(POINTS[i]);
                        let tj = forest.tree_id(POINTS[j]);
                        prop_assert!(ti.is_some() && tj.is_some() && ti != tj);
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
enum RangeOp {
    AddNum(u64, u8),
    AddStr(u64, u8),
    Remove(u64),
}

fn range_ops() -> impl Strategy<Value = Vec<RangeOp>> {
    prop::collection::vec(
        (0..3u8, 0..8u64, 0..5u8).prop_map(|(kind, id, value)| match kind {
            0 => RangeOp::AddNum(id, value),
            1 => RangeOp::AddStr(id, value),
            _ => RangeOp::Remove(id),
        }),
        1..50,
    )
}

const STRINGS: [&str; 5] = ["alpha", "bravo", "charlie", "delta", "echo"];

proptest! {
    #[test]
    fn range_key_min_max_matches_reference(ops in range_ops()) {
        let mut range = RangeKey::new(false, false);
        let mut model: AHashMap<u64, Value> = AHashMap::new();

        for op in ops {
            match op {
                RangeOp::AddNum(id, value) => {
                    let value = Value::Num(f64::from(value));
                    range.add(ElementId(id), value.clone());
                    model.insert(id, value);
                }
                RangeOp::AddStr(id, value) => {
                    let value = Value::from(STRINGS[value as usize]);
                    range.add(ElementId(id), value.clone());
                    model.insert(id, value);
                }
                RangeOp::Remove(id) => {
                    range.remove(ElementId(id));
                    model.remove(&id);
                }
            }

            let kinds: Vec<_> = {
                let mut kinds: Vec<_> = model.values().map(Value::kind).collect();
                kinds.sort_by_key(|k| format!("{k:?}"));
                kinds.dedup();
                kinds
            };
            let uniform = kinds.len() <= 1;
            prop_assert_eq!(range.is_active(), uniform);
            if uniform && !model.is_empty() {
                let min = model.values().min_by(|a, b| a.total_cmp(b));
                let max = model.values().max_by(|a, b| a.total_cmp(b));
                prop_assert_eq!(range.min_key(), min);
                prop_assert_eq!(range.max_key(), max);
            } else {
                prop_assert!(range.min_key().is_none());
                prop_assert!(range.max_key().is_none());
            }
        }
    }
}

struct NoMatches;

impl keyflow::MatchSource for NoMatches {
    fn dominated_matches(&self) -> Vec<ElementId> {
        Vec::new()
    }
    fn filter_dominated_positions(&self, _ids: &[ElementId]) -> Vec<ElementId> {
        Vec::new()
    }
}

/// Per element: which of the three partitions match it, and the projected
/// value index for each matching one.
type Assignment = Vec<([bool; 3], [u8; 3])>;

fn assignments() -> impl Strategy<Value = Assignment> {
    prop::collection::vec((any::<[bool; 3]>(), any::<[u8; 3]>()), 1..7)
}

fn build_calc(assignment: &Assignment, elements: &ElementTable) -> PartitionCompCalc {
    let mut calc = PartitionCompCalc::new(None);
    let source = NoMatches;
    let specs: Vec<PartitionSpec<'_>> = (1..=3)
        .map(|q| PartitionSpec {
            query: QueryId(q),
            source: &source,
            with_value: true,
        })
        .collect();
    calc.update_partition(&specs, None, true, elements);
    for (index, (matched, values)) in assignment.iter().enumerate() {
        let element = ElementId(index as u64);
        for q in 0..3 {
            if matched[q] {
                calc.add_matches(QueryId(q as u64 + 1), &[element], elements);
                calc.set_match_value(
                    QueryId(q as u64 + 1),
                    element,
                    Value::Num(f64::from(values[q] % 5)),
                    elements,
                );
            }
        }
    }
    calc
}

proptest! {
    #[test]
    fn partition_comparator_is_total_and_stable(assignment in assignments()) {
        let elements = ElementTable::new();
        let mut calc = build_calc(&assignment, &elements);
        // One extra element nothing matches, sitting on the gap key.
        let ids: Vec<ElementId> = (0..=assignment.len() as u64).map(ElementId).collect();

        for &a in &ids {
            prop_assert_eq!(calc.compare(a, a), Ordering::Equal);
            for &b in &ids {
                prop_assert_eq!(calc.compare(a, b), calc.compare(b, a).reverse());
                for &c in &ids {
                    if calc.compare(a, b) != Ordering::Greater
                        && calc.compare(b, c) != Ordering::Greater
                    {
                        prop_assert_ne!(calc.compare(a, c), Ordering::Greater);
                    }
                }
            }
        }

        let before: Vec<Ordering> = ids
            .iter()
            .flat_map(|&a| ids.iter().map(move |&b| (a, b)))
            .map(|(a, b)| calc.compare(a, b))
            .collect();
        // An identical reconfiguration must not reorder anything.
        let source = NoMatches;
        let specs: Vec<PartitionSpec<'_>> = (1..=3)
            .map(|q| PartitionSpec {
                query: QueryId(q),
                source: &source,
                with_value: true,
            })
            .collect();
        calc.update_partition(&specs, None, true, &elements);
        let after: Vec<Ordering> = ids
            .iter()
            .flat_map(|&a| ids.iter().map(move |&b| (a, b)))
            .map(|(a, b)| calc.compare(a, b))
            .collect();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn remove_and_re_add_is_a_net_addition(first in 0..100u8, second in 0..100u8) {
        let elements = ElementTable::new();
        let mut scheduler = FifoScheduler::new();
        let mut calc = PartitionCompCalc::new(None);
        let source = NoMatches;
        calc.update_partition(
            &[PartitionSpec { query: QueryId(1), source: &source, with_value: true }],
            None,
            true,
            &elements,
        );
        let element = ElementId(7);
        calc.add_matches(QueryId(1), &[element], &elements);
        calc.set_match_value(QueryId(1), element, Value::Num(f64::from(first)), &elements);
        // Same cycle: drop and re-add with a different projected value.
        calc.remove_matches(QueryId(1), &[element], &elements, &mut scheduler);
        calc.add_matches(QueryId(1), &[element], &elements);
        calc.set_match_value(QueryId(1), element, Value::Num(f64::from(second)), &elements);
        calc.flush_removals();

        prop_assert_eq!(Some(calc.first_key(element)), calc.order_key_of(QueryId(1)));
        prop_assert_eq!(
            calc.second_key(element),
            Some(&SecondKey::Scalar(OrderKey(0), Value::Num(f64::from(second))))
        );
    }
}
