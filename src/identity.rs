//! Base and additional identity tracking for data elements.
//!
//! Every data element has a base identity, either set explicitly or
//! defaulted on creation (an only child at its path inherits the parent's
//! base identity, anything else gets its own element id). Additional
//! identifications lay per-element overlay identities over the base table;
//! a lookup falls back to base when the overlay has no entry.
//!
//! Base changes are applied immediately while nothing listens on the
//! element's path, and otherwise queue per path for a batched flush. Within
//! one path batch the order is fixed: additional identifications without an
//! explicit overlay are notified first (they observe the base change
//! through fallback), then the base change itself, then the new value is
//! committed. Inheritance cascades re-dirty the children's paths and drain
//! through a work-list, so one batch never touches an element and its
//! parent together.

use ahash::{AHashMap, AHashSet};
use slab::Slab;
use tracing::{debug, trace};

use crate::element::ElementTable;
use crate::error::IdentityError;
use crate::schedule::{Deadline, Pending, Scheduler, Task};
use crate::{ElementId, Identity, IdentificationId, PathId};

/// Compute hook behind an additional identification. `activate` runs when
/// the identification is both registered and requested; `deactivate` when
/// either side lets go.
pub trait IdentitySource {
    /// Start computing overlay identities.
    fn activate(&mut self) -> anyhow::Result<()>;
    /// Stop computing. Cached overlays are cleared by the indexer
    /// afterwards, the source only has to stop producing.
    fn deactivate(&mut self) -> anyhow::Result<()>;
}

/// Observer of identity changes on one path, registered through
/// [`IdentityIndexer::register_listener`].
pub trait IdentityListener {
    /// An identification without an explicit overlay for `elem` sees the
    /// base change through fallback. Called before the base notification.
    fn fallback_identity_changed(
        &mut self,
        identification: IdentificationId,
        elem: ElementId,
        identity: Option<&Identity>,
    ) {
        let _ = (identification, elem, identity);
    }

    /// The base identity of `elem` is about to change to `identity`
    /// (`None` for a removal). Called before the commit.
    fn base_identity_changed(&mut self, elem: ElementId, identity: Option<&Identity>);
}

/// Handle returned by [`IdentityIndexer::register_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(usize);

#[derive(Debug, Clone, PartialEq)]
enum PendingChange {
    Set(Identity),
    Clear,
}

struct Identification {
    source: Box<dyn IdentitySource>,
    requests: u32,
    active: bool,
    overlay: AHashMap<ElementId, Identity>,
}

/// Identity tables plus the queued-update machinery around them.
#[derive(Default)]
pub struct IdentityIndexer {
    base: AHashMap<ElementId, Identity>,
    identifications: AHashMap<IdentificationId, Identification>,
    listeners: Slab<(PathId, Box<dyn IdentityListener>)>,
    listener_counts: AHashMap<PathId, usize>,
    /// Dirty base changes, batched per path.
    queued: AHashMap<PathId, AHashMap<ElementId, PendingChange>>,
    /// Overlays of deactivated identifications, cleared at the next flush.
    queued_overlay_clears: AHashSet<IdentificationId>,
    pending: Pending,
}

impl IdentityIndexer {
    /// Create an empty indexer.
    pub fn new() -> Self {
        Self::default()
    }

    /// The identity of `elem`: the identification's overlay entry when one
    /// is given and set, the base identity otherwise.
    pub fn identity(
        &self,
        identification: Option<IdentificationId>,
        elem: ElementId,
    ) -> Option<&Identity> {
        if let Some(id) = identification {
            if let Some(entry) = self.identifications.get(&id) {
                if let Some(identity) = entry.overlay.get(&elem) {
                    return Some(identity);
                }
            }
        }
        self.base.get(&elem)
    }

    /// Whether base updates are queued and unflushed.
    pub fn has_pending_updates(&self) -> bool {
        !self.queued.is_empty() || !self.queued_overlay_clears.is_empty()
    }

    /// Subscribe `listener` to identity changes on `path`.
    pub fn register_listener(
        &mut self,
        path: PathId,
        listener: Box<dyn IdentityListener>,
    ) -> ListenerHandle {
        *self.listener_counts.entry(path).or_insert(0) += 1;
        ListenerHandle(self.listeners.insert((path, listener)))
    }

    /// Drop a listener registration. Stale handles are a no-op returning
    /// `false`.
    pub fn unregister_listener(&mut self, handle: ListenerHandle) -> bool {
        let Some((path, _)) = self.listeners.try_remove(handle.0) else {
            return false;
        };
        if let Some(count) = self.listener_counts.get_mut(&path) {
            *count -= 1;
            if *count == 0 {
                self.listener_counts.remove(&path);
            }
        }
        true
    }

    fn has_listener(&self, path: PathId) -> bool {
        self.listener_counts.contains_key(&path)
    }

    /// A data element was created: assign its default base identity. An
    /// only child at its path inherits the parent's base identity, anything
    /// else gets its own element id. A pre-existing only child that just
    /// gained a sibling re-defaults to its own id on the next cycle.
    pub fn add_data_element(
        &mut self,
        elem: ElementId,
        elements: &ElementTable,
        scheduler: &mut impl Scheduler,
    ) {
        let parent_base = elements
            .parent_of(elem)
            .and_then(|parent| self.base.get(&parent).cloned());
        let default = match (elements.only_child_at_path(elem), parent_base.clone()) {
            (true, Some(inherited)) => inherited,
            _ => Identity::from(elem),
        };
        self.set_base_identity(elem, default, elements, scheduler);

        // A sibling that was the only child until now loses its inherited
        // identity; queued so the change lands in the next cycle.
        let Some(parent) = elements.parent_of(elem) else {
            return;
        };
        let Some(path) = elements.path_of(elem) else {
            return;
        };
        let siblings: Vec<ElementId> = elements
            .children_of(parent)
            .filter(|&sibling| sibling != elem && elements.path_of(sibling) == Some(path))
            .collect();
        for sibling in siblings {
            if self.base.get(&sibling).is_some() && self.base.get(&sibling) == parent_base.as_ref()
            {
                self.queue_change(path, sibling, PendingChange::Set(Identity::from(sibling)), scheduler);
            }
        }
    }

    /// Set the base identity of `elem`. Applied immediately while nothing
    /// listens on the element's path, queued per path otherwise. An
    /// explicit set cancels a pending clear for the same element.
    pub fn set_base_identity(
        &mut self,
        elem: ElementId,
        identity: Identity,
        elements: &ElementTable,
        scheduler: &mut impl Scheduler,
    ) {
        let Some(path) = elements.path_of(elem) else {
            return;
        };
        if self.has_listener(path) {
            self.queue_change(path, elem, PendingChange::Set(identity), scheduler);
        } else {
            if let Some(changes) = self.queued.get_mut(&path) {
                changes.remove(&elem);
            }
            self.base.insert(elem, identity);
        }
    }

    /// Drop the base identity and every overlay entry of `elem`. Deferred
    /// to the flush when anyone listens on the element's path; a set
    /// arriving before the flush cancels the pending clear for that element
    /// only.
    pub fn remove_all_identities(
        &mut self,
        elem: ElementId,
        elements: &ElementTable,
        scheduler: &mut impl Scheduler,
    ) {
        let Some(path) = elements.path_of(elem) else {
            return;
        };
        if self.has_listener(path) {
            self.queue_change(path, elem, PendingChange::Clear, scheduler);
        } else {
            self.base.remove(&elem);
            for entry in self.identifications.values_mut() {
                entry.overlay.remove(&elem);
            }
        }
    }

    /// Attach the compute source of an additional identification.
    ///
    /// # Panics
    ///
    /// Panics when `id` is already registered; that is a caller bug.
    pub fn register_identification(&mut self, id: IdentificationId, source: Box<dyn IdentitySource>) {
        assert!(
            !self.identifications.contains_key(&id),
            "identification registered twice"
        );
        self.identifications.insert(
            id,
            Identification {
                source,
                requests: 0,
                active: false,
                overlay: AHashMap::new(),
            },
        );
    }

    /// Detach an identification's source. Its cached overlays go with it.
    pub fn unregister_identification(
        &mut self,
        id: IdentificationId,
    ) -> Result<(), IdentityError> {
        let Some(mut entry) = self.identifications.remove(&id) else {
            return Ok(());
        };
        self.queued_overlay_clears.remove(&id);
        if entry.active {
            entry.source.deactivate()?;
        }
        Ok(())
    }

    /// Someone wants the identification's output. The source activates on
    /// the first request of a registered identification.
    pub fn request_identification(
        &mut self,
        id: IdentificationId,
        scheduler: &mut impl Scheduler,
    ) -> Result<(), IdentityError> {
        let Some(entry) = self.identifications.get_mut(&id) else {
            return Ok(());
        };
        entry.requests += 1;
        self.sync_activation(id, scheduler)
    }

    /// A request is withdrawn. The source deactivates when the last one
    /// goes, and its cached overlays are cleared at the next flush rather
    /// than left stale.
    pub fn release_identification(
        &mut self,
        id: IdentificationId,
        scheduler: &mut impl Scheduler,
    ) -> Result<(), IdentityError> {
        let Some(entry) = self.identifications.get_mut(&id) else {
            return Ok(());
        };
        if entry.requests > 0 {
            entry.requests -= 1;
        }
        self.sync_activation(id, scheduler)
    }

    fn sync_activation(
        &mut self,
        id: IdentificationId,
        scheduler: &mut impl Scheduler,
    ) -> Result<(), IdentityError> {
        let Some(entry) = self.identifications.get_mut(&id) else {
            return Ok(());
        };
        let want_active = entry.requests > 0;
        if want_active && !entry.active {
            entry.source.activate()?;
            entry.active = true;
            trace!(identification = id.0, "identification activated");
        } else if !want_active && entry.active {
            entry.source.deactivate()?;
            entry.active = false;
            self.queued_overlay_clears.insert(id);
            self.pending.request(scheduler, Task::FlushIdentityUpdates);
            trace!(identification = id.0, "identification deactivated");
        }
        Ok(())
    }

    /// Store an overlay identity computed by an identification. Unknown or
    /// inactive identifications are a no-op.
    pub fn set_additional_identity(
        &mut self,
        id: IdentificationId,
        elem: ElementId,
        identity: Identity,
    ) {
        if let Some(entry) = self.identifications.get_mut(&id) {
            if entry.active {
                entry.overlay.insert(elem, identity);
            }
        }
    }

    /// Drop one overlay entry.
    pub fn clear_additional_identity(&mut self, id: IdentificationId, elem: ElementId) {
        if let Some(entry) = self.identifications.get_mut(&id) {
            entry.overlay.remove(&elem);
        }
    }

    fn queue_change(
        &mut self,
        path: PathId,
        elem: ElementId,
        change: PendingChange,
        scheduler: &mut impl Scheduler,
    ) {
        self.queued.entry(path).or_default().insert(elem, change);
        self.pending.request(scheduler, Task::FlushIdentityUpdates);
    }

    /// Apply queued base updates and overlay clears. Returns `false` when
    /// the deadline expired with work left; calling again resumes with
    /// identical semantics.
    pub fn flush(&mut self, elements: &ElementTable, deadline: Deadline) -> bool {
        self.pending.take();
        for id in std::mem::take(&mut self.queued_overlay_clears) {
            if let Some(entry) = self.identifications.get_mut(&id) {
                entry.overlay.clear();
            }
        }
        let mut worklist: Vec<PathId> = self.queued.keys().copied().collect();
        while let Some(path) = worklist.pop() {
            if deadline.expired() {
                debug!("identity flush yielding to deadline");
                return false;
            }
            let Some(changes) = self.queued.remove(&path) else {
                continue;
            };
            for (elem, change) in changes {
                let new = match &change {
                    PendingChange::Set(identity) => Some(identity.clone()),
                    PendingChange::Clear => None,
                };
                // Identifications falling back to base observe the change
                // first.
                let inheriting: Vec<IdentificationId> = self
                    .identifications
                    .iter()
                    .filter(|(_, entry)| entry.active && !entry.overlay.contains_key(&elem))
                    .map(|(&id, _)| id)
                    .collect();
                for (listener_path, listener) in self.listeners.iter_mut().map(|(_, l)| l) {
                    if *listener_path != path {
                        continue;
                    }
                    for &identification in &inheriting {
                        listener.fallback_identity_changed(identification, elem, new.as_ref());
                    }
                    listener.base_identity_changed(elem, new.as_ref());
                }
                let old = match new {
                    Some(identity) => self.base.insert(elem, identity),
                    None => {
                        for entry in self.identifications.values_mut() {
                            entry.overlay.remove(&elem);
                        }
                        self.base.remove(&elem)
                    }
                };
                // An only child inheriting the old value follows along;
                // its path lands in a later batch, never this one.
                let cascaded: Vec<(PathId, ElementId)> = elements
                    .children_of(elem)
                    .filter(|&child| {
                        elements.only_child_at_path(child)
                            && old.is_some()
                            && self.base.get(&child) == old.as_ref()
                    })
                    .filter_map(|child| elements.path_of(child).map(|p| (p, child)))
                    .collect();
                for (child_path, child) in cascaded {
                    self.queued
                        .entry(child_path)
                        .or_default()
                        .insert(child, change.clone());
                    worklist.push(child_path);
                }
            }
        }
        true
    }
}
