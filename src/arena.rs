use generational_arena::{Arena, Index};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, instrument};

use crate::children::ChildCollection;
use crate::config::TreeSettings;
use crate::dispose::DisposeTraversal;
use crate::errors::{TreeError, TreeResult};
use crate::events::{Dispatch, Listener, Property, SubscriptionId, TreeEvent};
use crate::value::TreeValue;

/// Handle of a node inside a [`Tree`].
///
/// Ids are generational: an id outlives nothing it points to, a stale id is
/// reported as [`TreeError::NodeNotFound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) Index);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (slot, generation) = self.0.into_raw_parts();
        write!(f, "#{}v{}", slot, generation)
    }
}

/// Callback slot for consumers (e.g. a view expanding its children).
/// The tree stores it and never calls it on its own.
pub type ExpandAction = Box<dyn FnMut()>;

/// Arena entry for one node.
pub struct TreeNode<T> {
    /// Payload, `None` until a value is assigned
    pub(crate) value: Option<T>,
    /// Non-owning back-reference, None for roots
    pub(crate) parent: Option<NodeId>,
    /// Ordered children, created with the node and never replaced
    pub(crate) children: ChildCollection,
    pub(crate) dispose_traversal: DisposeTraversal,
    pub(crate) disposed: bool,
    pub(crate) expand_action: Option<ExpandAction>,
}

impl<T: fmt::Debug> fmt::Debug for TreeNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeNode")
            .field("value", &self.value)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("dispose_traversal", &self.dispose_traversal)
            .field("disposed", &self.disposed)
            .field("expand_action", &self.expand_action.is_some())
            .finish()
    }
}

/// Arena-backed observable tree.
///
/// All nodes of any number of disjoint trees live in one arena. Every
/// structural mutation goes through [`Tree::set_parent`] or the child
/// collection handle returned by [`Tree::children_mut`]; both keep the
/// parent pointer and the owner's child list in sync and dispatch change
/// events only after the pointers are consistent again.
///
/// Slots are never freed: a disposed node keeps its entry so `is_disposed`
/// stays answerable, only its subscriptions are dropped.
pub struct Tree<T> {
    pub(crate) arena: Arena<TreeNode<T>>,
    pub(crate) settings: TreeSettings,
    pub(crate) listeners: HashMap<NodeId, Vec<(SubscriptionId, Listener<T>)>>,
    pub(crate) pending: Vec<(NodeId, Dispatch)>,
    pub(crate) next_subscription: u64,
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Tree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("nodes", &self.arena.len())
            .field("settings", &self.settings)
            .finish()
    }
}

impl<T> Tree<T> {
    pub fn new() -> Self {
        Self::with_settings(TreeSettings::default())
    }

    pub fn with_settings(settings: TreeSettings) -> Self {
        Self {
            arena: Arena::new(),
            settings,
            listeners: HashMap::new(),
            pending: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn settings(&self) -> &TreeSettings {
        &self.settings
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id.0)
    }

    /// Nodes without a parent, in arena slot order.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.arena
            .iter()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(idx, _)| NodeId(idx))
    }

    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_, T>> {
        self.arena.get(id.0).map(|_| NodeRef { tree: self, id })
    }

    pub(crate) fn node(&self, id: NodeId) -> TreeResult<&TreeNode<T>> {
        self.arena.get(id.0).ok_or(TreeError::NodeNotFound(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> TreeResult<&mut TreeNode<T>> {
        self.arena.get_mut(id.0).ok_or(TreeError::NodeNotFound(id))
    }

    /// Existing and not yet disposed.
    pub(crate) fn ensure_live(&self, id: NodeId) -> TreeResult<&TreeNode<T>> {
        let node = self.node(id)?;
        if node.disposed {
            return Err(TreeError::AlreadyDisposed(id));
        }
        Ok(node)
    }

    pub(crate) fn ensure_live_mut(&mut self, id: NodeId) -> TreeResult<&mut TreeNode<T>> {
        let node = self.node_mut(id)?;
        if node.disposed {
            return Err(TreeError::AlreadyDisposed(id));
        }
        Ok(node)
    }

    /// Inserts a detached node. Used by every constructor.
    fn insert_entry(&mut self, value: Option<T>) -> NodeId {
        let node = TreeNode {
            value,
            parent: None,
            children: ChildCollection::default(),
            dispose_traversal: self.settings.dispose_traversal,
            disposed: false,
            expand_action: None,
        };
        NodeId(self.arena.insert(node))
    }

    pub fn value(&self, id: NodeId) -> Option<&T> {
        self.arena.get(id.0).and_then(|node| node.value.as_ref())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id.0).and_then(|node| node.parent)
    }

    /// Untyped read view of the parent.
    pub fn parent_node(&self, id: NodeId) -> Option<NodeRef<'_, T>> {
        self.parent(id).and_then(|parent| self.get(parent))
    }

    #[instrument(level = "trace", skip(self))]
    pub fn root(&self, id: NodeId) -> NodeId {
        match self.parent(id) {
            Some(parent) => self.root(parent),
            None => id,
        }
    }

    /// Edge count from `id` up to its root, recomputed on every call.
    #[instrument(level = "trace", skip(self))]
    pub fn depth(&self, id: NodeId) -> TreeResult<usize> {
        self.node(id)?;
        Ok(self.depth_of(id))
    }

    /// Longest downward path from `id` to a leaf, recomputed on every call.
    #[instrument(level = "trace", skip(self))]
    pub fn height(&self, id: NodeId) -> TreeResult<usize> {
        self.node(id)?;
        Ok(self.height_of(id))
    }

    pub(crate) fn depth_of(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    pub(crate) fn height_of(&self, id: NodeId) -> usize {
        match self.arena.get(id.0) {
            Some(node) => node
                .children
                .iter()
                .map(|child| 1 + self.height_of(child))
                .max()
                .unwrap_or(0),
            None => 0,
        }
    }

    /// True if `ancestor` is on the parent chain of `id` (excluding `id`).
    pub fn is_ancestor_of(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|candidate| candidate == ancestor)
    }

    pub fn is_disposed(&self, id: NodeId) -> TreeResult<bool> {
        Ok(self.node(id)?.disposed)
    }

    pub fn set_expand_action(&mut self, id: NodeId, action: Option<ExpandAction>) -> TreeResult<()> {
        self.ensure_live_mut(id)?.expand_action = action;
        Ok(())
    }

    pub fn has_expand_action(&self, id: NodeId) -> bool {
        self.arena
            .get(id.0)
            .map_or(false, |node| node.expand_action.is_some())
    }

    /// Runs the consumer's expand callback. Returns false if none is set.
    pub fn invoke_expand_action(&mut self, id: NodeId) -> TreeResult<bool> {
        match self.ensure_live_mut(id)?.expand_action.as_mut() {
            Some(action) => {
                action();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl<T: TreeValue> Tree<T> {
    /// Creates a detached node holding `value`.
    pub fn create_root(&mut self, value: T) -> NodeId {
        let id = self.insert_entry(Some(value));
        self.attach_value(id);
        debug!(node = %id, "created root");
        id
    }

    /// Creates a node and, if `parent` is given, attaches it as the last child.
    ///
    /// The parent is validated before anything is inserted, so a failed call
    /// leaves the tree untouched.
    #[instrument(level = "debug", skip(self, value))]
    pub fn create_node(&mut self, value: Option<T>, parent: Option<NodeId>) -> TreeResult<NodeId> {
        if let Some(parent) = parent {
            self.ensure_live(parent)?;
        }
        let id = self.insert_entry(value);
        self.attach_value(id);
        if parent.is_some() {
            let result = self.link_parent(id, parent, true);
            self.flush();
            result?;
        }
        debug!(node = %id, "created node");
        Ok(id)
    }

    /// Tells a node-aware value which node holds it.
    fn attach_value(&mut self, id: NodeId) {
        if let Some(node) = self.arena.get_mut(id.0) {
            if let Some(aware) = node.value.as_mut().and_then(|value| value.as_node_aware()) {
                aware.set_node(id);
            }
        }
    }
}

impl<T: TreeValue + PartialEq> Tree<T> {
    /// Replaces the payload. Writing `None` over `None` or an equal value is a
    /// no-op and fires nothing.
    #[instrument(level = "trace", skip(self, value))]
    pub fn set_value(&mut self, id: NodeId, value: Option<T>) -> TreeResult<()> {
        let node = self.ensure_live_mut(id)?;
        match (&node.value, &value) {
            (None, None) => return Ok(()),
            (Some(current), Some(new)) if current == new => return Ok(()),
            _ => {}
        }
        node.value = value;
        self.attach_value(id);

        self.queue(id, Dispatch::Local(TreeEvent::PropertyChanged(Property::Value)));
        self.flush();
        Ok(())
    }
}

/// Read-only view of one node, independent of how the caller got the id.
pub struct NodeRef<'a, T> {
    tree: &'a Tree<T>,
    id: NodeId,
}

impl<T> Clone for NodeRef<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for NodeRef<'_, T> {}

impl<'a, T> NodeRef<'a, T> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'a Tree<T> {
        self.tree
    }

    pub fn value(&self) -> Option<&'a T> {
        self.tree.value(self.id)
    }

    pub fn parent(&self) -> Option<NodeRef<'a, T>> {
        self.tree.parent_node(self.id)
    }

    pub fn depth(&self) -> usize {
        self.tree.depth_of(self.id)
    }

    pub fn height(&self) -> usize {
        self.tree.height_of(self.id)
    }

    pub fn child_count(&self) -> usize {
        self.tree
            .arena
            .get(self.id.0)
            .map_or(0, |node| node.children.len())
    }

    pub fn is_disposed(&self) -> bool {
        self.tree
            .arena
            .get(self.id.0)
            .map_or(false, |node| node.disposed)
    }
}

impl<T> fmt::Display for NodeRef<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Depth={}, Height={}, Children={}",
            self.depth(),
            self.height(),
            self.child_count()
        )
    }
}
