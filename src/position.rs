//! Watched geometric pairs over an external constraint solver.
//!
//! [`Positioning`] owns the callback bookkeeping the solver knows nothing
//! about: which `(caller, callback)` registrations watch which pair of named
//! points, which direction each registration reads the pair in, and what
//! value was last delivered so a pair touched repeatedly by one solve still
//! notifies at most once.

use std::cmp::Ordering;
use std::sync::Arc;

use ahash::AHashMap;
use slab::Slab;
use tracing::trace;

use crate::error::PositionError;
use crate::schedule::Deadline;

/// The external geometry constraint solver ("PosCalc" seam).
///
/// The solver resolves pair offsets from its own constraint set; it has no
/// knowledge of watcher registrations. Pairs are always named in canonical
/// (lexicographically sorted) point order.
pub trait ConstraintSolver {
    /// Start resolving the pair `(low, high)`.
    fn register_pair(&mut self, low: &str, high: &str);

    /// Stop resolving the pair `(low, high)`.
    fn unregister_pair(&mut self, low: &str, high: &str);

    /// The current offset of the pair, `None` while unresolved.
    fn pair_offset(&self, low: &str, high: &str) -> Option<f64>;

    /// Recalculate all constraint variables.
    fn solve(&mut self);

    /// Whether anything changed since the last [`ConstraintSolver::solve`].
    fn need_recalc(&self) -> bool;

    /// Drain the pairs whose value the last solve touched.
    fn changed_pairs(&mut self) -> Vec<(Arc<str>, Arc<str>)>;
}

/// Callback interface for watched-pair changes.
///
/// Delivered with the points in the orientation the watcher registered and
/// the offset already sign-adjusted to that orientation. Errors abort the
/// surrounding [`Positioning::reposition`] call.
pub trait PairWatcher {
    /// The pair's resolved offset changed.
    fn pair_changed(&mut self, p1: &str, p2: &str, offset: f64) -> anyhow::Result<()>;
}

/// Handle to one watcher registration; removing it is deterministic cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchHandle(usize);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PairKey {
    low: Arc<str>,
    high: Arc<str>,
}

impl PairKey {
    /// Canonicalize an unordered point pair; `dir` is +1 when the given
    /// order already was canonical, -1 otherwise.
    fn canonical(p1: &str, p2: &str) -> (Self, f64) {
        match p1.cmp(p2) {
            Ordering::Less | Ordering::Equal => (
                Self {
                    low: Arc::from(p1),
                    high: Arc::from(p2),
                },
                1.0,
            ),
            Ordering::Greater => (
                Self {
                    low: Arc::from(p2),
                    high: Arc::from(p1),
                },
                -1.0,
            ),
        }
    }
}

struct Registration {
    key: PairKey,
    p1: Arc<str>,
    p2: Arc<str>,
    dir: f64,
    watcher: Box<dyn PairWatcher>,
}

#[derive(Default)]
struct PairState {
    registrations: Vec<usize>,
    /// A constraint still references this pair; keeps it alive with no
    /// registrations left.
    normal: bool,
    /// Rounded value last delivered to watchers.
    last_delivered: Option<i64>,
}

/// Watched-pair registration and change delivery over a [`ConstraintSolver`].
pub struct Positioning<S> {
    solver: S,
    pairs: AHashMap<PairKey, PairState>,
    registrations: Slab<Registration>,
    refreshing: bool,
}

impl<S: ConstraintSolver> Positioning<S> {
    /// Wrap `solver`.
    pub fn new(solver: S) -> Self {
        Self {
            solver,
            pairs: AHashMap::new(),
            registrations: Slab::new(),
            refreshing: false,
        }
    }

    /// The wrapped solver.
    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Mutable access to the wrapped solver, for feeding constraint input.
    pub fn solver_mut(&mut self) -> &mut S {
        &mut self.solver
    }

    /// Number of distinct watched pairs.
    pub fn watched_pair_count(&self) -> usize {
        self.pairs.len()
    }

    /// Number of live watcher registrations.
    pub fn registration_count(&self) -> usize {
        self.registrations.len()
    }

    /// Register `watcher` for changes of the pair `(p1, p2)`.
    ///
    /// A pair of a point with itself is trivially zero-offset and never
    /// registered; `None` is returned. Multiple registrations share one
    /// underlying pair.
    pub fn add_watched_pair(
        &mut self,
        p1: &str,
        p2: &str,
        watcher: Box<dyn PairWatcher>,
    ) -> Option<WatchHandle> {
        if p1 == p2 {
            return None;
        }
        let (key, dir) = PairKey::canonical(p1, p2);
        let state = self.pairs.entry(key.clone()).or_default();
        if state.registrations.is_empty() && !state.normal {
            self.solver.register_pair(&key.low, &key.high);
        }
        let index = self.registrations.insert(Registration {
            key: key.clone(),
            p1: Arc::from(p1),
            p2: Arc::from(p2),
            dir,
            watcher,
        });
        self.pairs
            .get_mut(&key)
            .expect("pair state just ensured")
            .registrations
            .push(index);
        Some(WatchHandle(index))
    }

    /// Remove one watcher registration. The underlying pair is dropped once
    /// its last registration goes and no constraint-bearing use remains.
    /// Stale handles are a silent no-op returning `false`.
    pub fn remove_watched_pair(&mut self, handle: WatchHandle) -> bool {
        let Some(registration) = self.registrations.try_remove(handle.0) else {
            return false;
        };
        let Some(state) = self.pairs.get_mut(&registration.key) else {
            return false;
        };
        state.registrations.retain(|&r| r != handle.0);
        if state.registrations.is_empty() && !state.normal {
            self.pairs.remove(&registration.key);
            self.solver
                .unregister_pair(&registration.key.low, &registration.key.high);
        }
        true
    }

    /// Mark or unmark the pair as referenced by a constraint ("normal").
    /// Clearing the mark drops the pair when no registration watches it.
    pub fn set_pair_normal(&mut self, p1: &str, p2: &str, normal: bool) {
        if p1 == p2 {
            return;
        }
        let (key, _) = PairKey::canonical(p1, p2);
        if normal {
            let state = self.pairs.entry(key.clone()).or_default();
            if state.registrations.is_empty() && !state.normal {
                self.solver.register_pair(&key.low, &key.high);
            }
            state.normal = true;
        } else if let Some(state) = self.pairs.get_mut(&key) {
            state.normal = false;
            if state.registrations.is_empty() {
                self.pairs.remove(&key);
                self.solver.unregister_pair(&key.low, &key.high);
            }
        }
    }

    /// The resolved offset from `p1` to `p2`; zero for a point with itself,
    /// `None` while unresolved or unknown.
    pub fn pair_offset(&self, p1: &str, p2: &str) -> Option<f64> {
        if p1 == p2 {
            return Some(0.0);
        }
        let (key, dir) = PairKey::canonical(p1, p2);
        self.solver
            .pair_offset(&key.low, &key.high)
            .map(|offset| offset * dir)
    }

    /// Whether the solver reports unprocessed constraint changes.
    pub fn needs_reposition(&self) -> bool {
        self.solver.need_recalc()
    }

    /// Drive the solver to a fixed point, delivering watcher callbacks for
    /// pairs whose rounded value changed since last delivered.
    ///
    /// Returns `Ok(true)` once settled, `Ok(false)` when `deadline` ran out
    /// (call again later; resuming converges to the same fixed point).
    /// Re-entry from inside a watcher callback is blocked by a `refreshing`
    /// guard; changes a callback triggers are picked up by the next loop
    /// iteration instead.
    pub fn reposition(&mut self, deadline: Deadline) -> Result<bool, PositionError> {
        if self.refreshing {
            return Ok(false);
        }
        self.refreshing = true;
        let result = self.reposition_loop(deadline);
        self.refreshing = false;
        result
    }

    fn reposition_loop(&mut self, deadline: Deadline) -> Result<bool, PositionError> {
        while self.solver.need_recalc() {
            if deadline.expired() {
                return Ok(false);
            }
            self.solver.solve();
            let mut deliveries: Vec<(usize, f64)> = Vec::new();
            for (low, high) in self.solver.changed_pairs() {
                let key = PairKey {
                    low: low.clone(),
                    high: high.clone(),
                };
                let Some(state) = self.pairs.get_mut(&key) else {
                    continue;
                };
                let Some(offset) = self.solver.pair_offset(&low, &high) else {
                    continue;
                };
                let rounded = offset.round() as i64;
                if state.last_delivered == Some(rounded) {
                    continue;
                }
                state.last_delivered = Some(rounded);
                for &registration in &state.registrations {
                    deliveries.push((registration, offset));
                }
            }
            trace!(deliveries = deliveries.len(), "reposition pass");
            for (index, offset) in deliveries {
                let Some(registration) = self.registrations.get_mut(index) else {
                    continue;
                };
                registration.watcher.pair_changed(
                    &registration.p1,
                    &registration.p2,
                    offset * registration.dir,
                )?;
            }
        }
        Ok(true)
    }
}
