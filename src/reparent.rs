//! Node-side entry of the reparent protocol.

use tracing::{debug, instrument};

use crate::arena::{NodeId, Tree};
use crate::errors::{TreeError, TreeResult};
use crate::events::{Dispatch, NodeChangeType, Property, TreeEvent};

impl<T> Tree<T> {
    /// Moves `id` under `parent`, or detaches it with `None`.
    ///
    /// Setting the current parent again is a no-op and fires nothing.
    pub fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) -> TreeResult<()> {
        let result = self.link_parent(id, parent, true);
        self.flush();
        result
    }

    /// Shared by `set_parent` and the child collection.
    ///
    /// `update_child_collections = false` is passed by the collection when it
    /// has already taken care of its own membership. Every contract check runs
    /// before the first write.
    #[instrument(level = "trace", skip(self))]
    pub(crate) fn link_parent(
        &mut self,
        id: NodeId,
        new_parent: Option<NodeId>,
        update_child_collections: bool,
    ) -> TreeResult<()> {
        let old_parent = self.ensure_live(id)?.parent;
        if let Some(parent) = new_parent {
            self.ensure_live(parent)?;
            if parent == id || self.is_ancestor_of(id, parent) {
                return Err(TreeError::CycleDetected { node: id, parent });
            }
        }
        if old_parent == new_parent {
            return Ok(());
        }

        let old_depth = self.depth_of(id);
        let parent_height_before = new_parent.map(|parent| self.height_of(parent));

        if let Some(old) = old_parent {
            if self.node(old)?.children.contains(id) {
                self.remove_child(old, id, false)?;
            }
        }

        self.node_mut(id)?.parent = new_parent;

        if update_child_collections {
            if let Some(parent) = new_parent {
                self.insert_child(parent, id, false)?;
            }
        }
        debug!(node = %id, ?old_parent, ?new_parent, "reparented");

        if let Some(old) = old_parent {
            self.queue(
                old,
                Dispatch::BubbleUp(TreeEvent::DescendantChanged {
                    kind: NodeChangeType::NodeRemoved,
                    node: id,
                }),
            );
            let removed = TreeEvent::AncestorChanged {
                kind: NodeChangeType::NodeRemoved,
                node: id,
            };
            self.queue(old, Dispatch::BroadcastDown(removed));
            // the moved subtree still hears about the detach once it left `old`
            if !self.is_ancestor_of(old, id) {
                self.queue(id, Dispatch::BroadcastDown(removed));
            }
        }

        if old_depth != self.depth_of(id) {
            self.queue(id, Dispatch::BubbleUp(TreeEvent::PropertyChanged(Property::Depth)));
        }

        if let (Some(parent), Some(before)) = (new_parent, parent_height_before) {
            // evaluated at dispatch time, once the collection side has settled
            self.queue(parent, Dispatch::HeightCheck { before });
            self.queue(
                parent,
                Dispatch::BubbleUp(TreeEvent::DescendantChanged {
                    kind: NodeChangeType::NodeAdded,
                    node: id,
                }),
            );
            self.queue(
                parent,
                Dispatch::BroadcastDown(TreeEvent::AncestorChanged {
                    kind: NodeChangeType::NodeAdded,
                    node: id,
                }),
            );
        }

        self.queue(id, Dispatch::Local(TreeEvent::PropertyChanged(Property::Parent)));
        self.queue(
            id,
            Dispatch::Local(TreeEvent::ParentChanged {
                old: old_parent,
                new: new_parent,
            }),
        );
        Ok(())
    }
}
