//! Lazy traversals. Each call starts a fresh walk; nothing is cached on the tree.

use tracing::instrument;

use crate::arena::{NodeId, Tree};

/// Pre-order depth-first walk driven by an explicit stack.
pub struct PreOrder<'a, T> {
    tree: &'a Tree<T>,
    stack: Vec<NodeId>,
}

impl<'a, T> PreOrder<'a, T> {
    fn starting_at(tree: &'a Tree<T>, start: Vec<NodeId>) -> Self {
        Self { tree, stack: start }
    }

    fn push_children(&mut self, id: NodeId) {
        if let Some(node) = self.tree.arena.get(id.0) {
            // Push children in reverse order for left-to-right traversal
            for child in node.children.as_slice().iter().rev() {
                self.stack.push(*child);
            }
        }
    }
}

impl<T> Iterator for PreOrder<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        self.push_children(current);
        Some(current)
    }
}

/// Parent, grandparent, ... up to the root.
pub struct Ancestors<'a, T> {
    tree: &'a Tree<T>,
    next: Option<NodeId>,
}

impl<T> Iterator for Ancestors<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

impl<T> Tree<T> {
    /// Immediate children in collection order.
    pub fn child_nodes(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.arena
            .get(id.0)
            .into_iter()
            .flat_map(|node| node.children.iter())
    }

    /// Everything strictly below `id`, pre-order.
    #[instrument(level = "trace", skip(self))]
    pub fn descendants(&self, id: NodeId) -> PreOrder<'_, T> {
        let mut walk = PreOrder::starting_at(self, Vec::new());
        walk.push_children(id);
        walk
    }

    /// `id` followed by its descendants.
    #[instrument(level = "trace", skip(self))]
    pub fn subtree(&self, id: NodeId) -> PreOrder<'_, T> {
        let start = if self.contains(id) { vec![id] } else { Vec::new() };
        PreOrder::starting_at(self, start)
    }

    /// Empty for a root.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_, T> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }
}
