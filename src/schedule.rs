//! The cooperative scheduling seam.
//!
//! The core never owns an event loop. Components that defer work hand a
//! [`Task`] to a [`Scheduler`] and expose an explicit flush entry point; the
//! embedding task queue calls the flush back later, passing a [`Deadline`]
//! where the work is resumable.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// A deferrable unit of work owned by one of the core components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    /// Flush queued base-identity updates ([`IdentityIndexer::flush`](crate::IdentityIndexer::flush)).
    FlushIdentityUpdates,
    /// Flush queued partition removals ([`PartitionCompCalc::flush_removals`](crate::PartitionCompCalc::flush_removals)).
    FlushPartitionRemovals,
    /// Re-run the positioning loop ([`Positioning::reposition`](crate::Positioning::reposition)).
    Reposition,
}

/// The external task queue the core defers work to.
pub trait Scheduler {
    /// Ask for `task` to be executed later, after the current run-to-completion
    /// step finishes.
    fn schedule(&mut self, task: Task);
}

/// A queue-backed [`Scheduler`] for tests and embedders without a real task
/// queue. Drain it with [`FifoScheduler::pop`] and dispatch each task to the
/// owning component's flush entry point.
#[derive(Debug, Default)]
pub struct FifoScheduler {
    queue: VecDeque<Task>,
}

impl FifoScheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next scheduled task, if any.
    pub fn pop(&mut self) -> Option<Task> {
        self.queue.pop_front()
    }

    /// Number of queued tasks.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether no tasks are queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Scheduler for FifoScheduler {
    fn schedule(&mut self, task: Task) {
        self.queue.push_back(task);
    }
}

/// Per-pending-operation scheduling state: either nothing is queued or one
/// flush has been requested.
///
/// Requesting while already scheduled is a no-op, so a burst of changes
/// produces exactly one flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pending {
    /// No flush requested.
    #[default]
    Idle,
    /// A flush has been scheduled and not yet taken.
    Scheduled,
}

impl Pending {
    /// Request `task` once; subsequent requests before [`Pending::take`] do
    /// not re-schedule.
    pub fn request(&mut self, scheduler: &mut impl Scheduler, task: Task) {
        if *self == Pending::Idle {
            scheduler.schedule(task);
            *self = Pending::Scheduled;
        }
    }

    /// Consume the pending request at the start of a flush. Returns whether
    /// a flush was actually scheduled.
    pub fn take(&mut self) -> bool {
        std::mem::replace(self, Pending::Idle) == Pending::Scheduled
    }

    /// Whether a flush is currently scheduled.
    pub fn is_scheduled(&self) -> bool {
        *self == Pending::Scheduled
    }
}

/// A cooperative time budget handed to resumable operations.
///
/// `Deadline::none()` never expires; a bounded deadline makes long
/// recomputation batches yield back to the caller, which must re-invoke the
/// operation later with identical semantics.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    until: Option<Instant>,
}

impl Deadline {
    /// A deadline that never expires.
    pub fn none() -> Self {
        Self { until: None }
    }

    /// A deadline `budget` from now.
    pub fn within(budget: Duration) -> Self {
        Self {
            until: Some(Instant::now() + budget),
        }
    }

    /// A deadline that has already expired, useful for single-step draining
    /// in tests.
    pub fn expired_now() -> Self {
        Self {
            until: Some(Instant::now() - Duration::from_nanos(1)),
        }
    }

    /// Whether the budget has run out.
    pub fn expired(&self) -> bool {
        match self.until {
            Some(until) => Instant::now() >= until,
            None => false,
        }
    }
}
