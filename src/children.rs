//! Ordered child collection and the add/remove half of the reparent protocol.

use std::slice;
use tracing::{debug, instrument};

use crate::arena::{NodeId, Tree};
use crate::errors::{TreeError, TreeResult};
use crate::events::{CollectionChange, Dispatch, Property, TreeEvent};

/// Children of one node, in insertion order.
///
/// Only the owning [`Tree`] mutates it, so membership always mirrors the
/// children's parent pointers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildCollection {
    items: Vec<NodeId>,
}

impl ChildCollection {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.items.contains(&id)
    }

    pub fn get(&self, index: usize) -> Option<NodeId> {
        self.items.get(index).copied()
    }

    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.items.iter().position(|&item| item == id)
    }

    pub fn iter(&self) -> std::iter::Copied<slice::Iter<'_, NodeId>> {
        self.items.iter().copied()
    }

    pub fn as_slice(&self) -> &[NodeId] {
        &self.items
    }

    fn push(&mut self, id: NodeId) -> usize {
        self.items.push(id);
        self.items.len() - 1
    }

    fn remove_at(&mut self, index: usize) -> NodeId {
        self.items.remove(index)
    }
}

impl<'a> IntoIterator for &'a ChildCollection {
    type Item = NodeId;
    type IntoIter = std::iter::Copied<slice::Iter<'a, NodeId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Mutable handle on the children of `owner`.
///
/// `add` and `remove` always update the child's parent pointer as well.
pub struct ChildrenMut<'a, T> {
    tree: &'a mut Tree<T>,
    owner: NodeId,
}

impl<T> ChildrenMut<'_, T> {
    pub fn owner(&self) -> NodeId {
        self.owner
    }

    /// Appends `child`, detaching it from its previous parent first.
    pub fn add(&mut self, child: NodeId) -> TreeResult<()> {
        let result = self.tree.insert_child(self.owner, child, true);
        self.tree.flush();
        result
    }

    /// Removes `child` and clears its parent. Returns whether it was a child.
    pub fn remove(&mut self, child: NodeId) -> TreeResult<bool> {
        let result = self.tree.remove_child(self.owner, child, true);
        self.tree.flush();
        result
    }

    pub fn contains(&self, child: NodeId) -> bool {
        self.tree
            .arena
            .get(self.owner.0)
            .map_or(false, |node| node.children.contains(child))
    }

    pub fn len(&self) -> usize {
        self.tree
            .arena
            .get(self.owner.0)
            .map_or(0, |node| node.children.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Tree<T> {
    pub fn children(&self, id: NodeId) -> TreeResult<&ChildCollection> {
        Ok(&self.node(id)?.children)
    }

    pub fn children_mut(&mut self, id: NodeId) -> TreeResult<ChildrenMut<'_, T>> {
        self.ensure_live(id)?;
        Ok(ChildrenMut { tree: self, owner: id })
    }

    /// Collection-side entry of the reparent protocol.
    ///
    /// With `update_parent` the child's parent pointer is moved via
    /// `link_parent(.., update_child_collections = false)`, which must not add
    /// the child to this collection a second time.
    #[instrument(level = "trace", skip(self))]
    pub(crate) fn insert_child(
        &mut self,
        owner: NodeId,
        child: NodeId,
        update_parent: bool,
    ) -> TreeResult<()> {
        self.ensure_live(owner)?;
        self.ensure_live(child)?;
        if child == owner || self.is_ancestor_of(child, owner) {
            return Err(TreeError::CycleDetected {
                node: child,
                parent: owner,
            });
        }
        if self.node(owner)?.children.contains(child) {
            return Ok(());
        }

        if update_parent {
            self.link_parent(child, Some(owner), false)?;
        }

        let index = self.node_mut(owner)?.children.push(child);
        debug!(%owner, %child, index, "child added");
        self.queue_collection_change(owner, CollectionChange::Added { node: child, index });
        Ok(())
    }

    #[instrument(level = "trace", skip(self))]
    pub(crate) fn remove_child(
        &mut self,
        owner: NodeId,
        child: NodeId,
        update_parent: bool,
    ) -> TreeResult<bool> {
        if update_parent {
            self.ensure_live(owner)?;
        }
        let Some(index) = self.node(owner)?.children.position(child) else {
            return Ok(false);
        };
        if update_parent {
            self.ensure_live(child)?;
        }

        self.node_mut(owner)?.children.remove_at(index);
        debug!(%owner, %child, index, "child removed");
        self.queue_collection_change(owner, CollectionChange::Removed { node: child, index });

        if update_parent {
            self.link_parent(child, None, false)?;
        }
        Ok(true)
    }

    /// Re-raises a collection change as the owner's own notifications.
    fn queue_collection_change(&mut self, owner: NodeId, change: CollectionChange) {
        self.queue(owner, Dispatch::Local(TreeEvent::PropertyChanged(Property::Count)));
        self.queue(owner, Dispatch::Local(TreeEvent::PropertyChanged(Property::Items)));
        self.queue(owner, Dispatch::Local(TreeEvent::ChildrenChanged(change)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_sets_parent_and_keeps_insertion_order() {
        let mut tree: Tree<i32> = Tree::new();
        let root = tree.create_root(0);
        let a = tree.create_root(1);
        let b = tree.create_root(2);

        let mut children = tree.children_mut(root).unwrap();
        children.add(b).unwrap();
        children.add(a).unwrap();
        assert_eq!(children.len(), 2);

        assert_eq!(tree.children(root).unwrap().as_slice(), &[b, a]);
        assert_eq!(tree.parent(a), Some(root));
        assert_eq!(tree.parent(b), Some(root));
    }

    #[test]
    fn adding_an_existing_child_does_not_duplicate_it() {
        let mut tree: Tree<i32> = Tree::new();
        let root = tree.create_root(0);
        let a = tree.create_node(Some(1), Some(root)).unwrap();

        tree.children_mut(root).unwrap().add(a).unwrap();
        assert_eq!(tree.children(root).unwrap().len(), 1);
    }

    #[test]
    fn add_moves_child_away_from_previous_parent() {
        let mut tree: Tree<i32> = Tree::new();
        let first = tree.create_root(0);
        let second = tree.create_root(1);
        let child = tree.create_node(Some(2), Some(first)).unwrap();

        tree.children_mut(second).unwrap().add(child).unwrap();

        assert!(tree.children(first).unwrap().is_empty());
        assert!(tree.children(second).unwrap().contains(child));
        assert_eq!(tree.parent(child), Some(second));
    }

    #[test]
    fn remove_reports_membership() {
        let mut tree: Tree<i32> = Tree::new();
        let root = tree.create_root(0);
        let a = tree.create_node(Some(1), Some(root)).unwrap();
        let stranger = tree.create_root(2);

        assert!(!tree.children_mut(root).unwrap().remove(stranger).unwrap());
        assert!(tree.children_mut(root).unwrap().remove(a).unwrap());
        assert_eq!(tree.parent(a), None);
        assert!(!tree.children_mut(root).unwrap().remove(a).unwrap());
    }

    #[test]
    fn adding_an_ancestor_is_rejected_without_mutation() {
        let mut tree: Tree<i32> = Tree::new();
        let root = tree.create_root(0);
        let a = tree.create_node(Some(1), Some(root)).unwrap();

        let err = tree.children_mut(a).unwrap().add(root).unwrap_err();
        assert_eq!(err, TreeError::CycleDetected { node: root, parent: a });
        assert!(tree.children(a).unwrap().is_empty());
        assert_eq!(tree.parent(root), None);

        let err = tree.children_mut(a).unwrap().add(a).unwrap_err();
        assert_eq!(err, TreeError::CycleDetected { node: a, parent: a });
    }
}
