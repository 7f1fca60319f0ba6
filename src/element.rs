//! The data-element table: parent chains, paths, and granularity raising.
//!
//! This is the storage-layer collaborator the indexing components consult.
//! Elements form a tree; each element sits at a path (a granularity level),
//! and matches found at a finer path are raised along the parent chain to
//! the comparison's coarser unit of ordering.

use ahash::{AHashMap, AHashSet};

use crate::{ElementId, PathId};

#[derive(Debug)]
struct ElementNode {
    parent: Option<ElementId>,
    path: PathId,
    children: AHashSet<ElementId>,
}

/// Table of data elements keyed by [`ElementId`].
#[derive(Debug, Default)]
pub struct ElementTable {
    nodes: AHashMap<ElementId, ElementNode>,
    next: u64,
}

impl ElementTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `id` exists.
    pub fn contains(&self, id: ElementId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Create a new element under `parent` at `path`.
    ///
    /// # Panics
    ///
    /// Panics when `parent` names an unknown element; that is a caller bug,
    /// not a runtime condition.
    pub fn add_element(&mut self, parent: Option<ElementId>, path: PathId) -> ElementId {
        let id = ElementId(self.next);
        self.next += 1;
        if let Some(parent) = parent {
            let node = self
                .nodes
                .get_mut(&parent)
                .expect("parent element must exist");
            node.children.insert(id);
        }
        self.nodes.insert(
            id,
            ElementNode {
                parent,
                path,
                children: AHashSet::new(),
            },
        );
        id
    }

    /// Remove `id` and its whole subtree. Unknown ids are a no-op returning
    /// `false`.
    pub fn remove_element(&mut self, id: ElementId) -> bool {
        let Some(node) = self.nodes.remove(&id) else {
            return false;
        };
        if let Some(parent) = node.parent {
            if let Some(parent_node) = self.nodes.get_mut(&parent) {
                parent_node.children.remove(&id);
            }
        }
        // Work-list over descendants; they no longer need parent unlinking.
        let mut stack: Vec<ElementId> = node.children.into_iter().collect();
        while let Some(child) = stack.pop() {
            if let Some(child_node) = self.nodes.remove(&child) {
                stack.extend(child_node.children);
            }
        }
        true
    }

    /// The parent of `id`, if any.
    pub fn parent_of(&self, id: ElementId) -> Option<ElementId> {
        self.nodes.get(&id)?.parent
    }

    /// The path `id` sits at.
    pub fn path_of(&self, id: ElementId) -> Option<PathId> {
        Some(self.nodes.get(&id)?.path)
    }

    /// The children of `id`, in arbitrary order.
    pub fn children_of(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        self.nodes
            .get(&id)
            .into_iter()
            .flat_map(|node| node.children.iter().copied())
    }

    /// Whether `id` has no sibling at its own path.
    ///
    /// Drives the default base-identity rule: an only child inherits its
    /// parent's base identity.
    pub fn only_child_at_path(&self, id: ElementId) -> bool {
        let Some(node) = self.nodes.get(&id) else {
            return false;
        };
        let Some(parent) = node.parent else {
            return false;
        };
        self.nodes[&parent]
            .children
            .iter()
            .all(|&sibling| sibling == id || self.nodes[&sibling].path != node.path)
    }

    /// Walk the parent chain from `id` to the ancestor at `path`.
    ///
    /// Returns `id` itself when it already sits at `path`, `None` when no
    /// ancestor does.
    pub fn raise_to_path(&self, id: ElementId, path: PathId) -> Option<ElementId> {
        let mut current = id;
        loop {
            let node = self.nodes.get(&current)?;
            if node.path == path {
                return Some(current);
            }
            current = node.parent?;
        }
    }
}
