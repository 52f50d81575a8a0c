//! Change events and their propagation.
//!
//! Mutations only queue what has to be announced. The queue is flushed when
//! the public operation has finished updating pointers, so listeners never
//! observe a child whose parent pointer disagrees with its owner's collection.

use std::fmt;
use tracing::{debug, trace};

use crate::arena::{NodeId, Tree};
use crate::errors::TreeResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeChangeType {
    NodeAdded,
    NodeRemoved,
}

/// Names carried by [`TreeEvent::PropertyChanged`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    Value,
    Parent,
    Height,
    Depth,
    /// Forwarded from the child collection
    Count,
    /// Forwarded from the child collection
    Items,
}

impl Property {
    pub fn name(&self) -> &'static str {
        match self {
            Property::Value => "Value",
            Property::Parent => "Parent",
            Property::Height => "Height",
            Property::Depth => "Depth",
            Property::Count => "Count",
            Property::Items => "Item[]",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionChange {
    Added { node: NodeId, index: usize },
    Removed { node: NodeId, index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEvent {
    /// Generic property notification. `Depth` bubbles up to every ancestor,
    /// `Height` is broadcast down to every descendant.
    PropertyChanged(Property),
    ChildrenChanged(CollectionChange),
    /// Something above the receiving node changed. Broadcast downward.
    AncestorChanged { kind: NodeChangeType, node: NodeId },
    /// Something below the receiving node changed. Bubbles upward.
    DescendantChanged { kind: NodeChangeType, node: NodeId },
    ParentChanged {
        old: Option<NodeId>,
        new: Option<NodeId>,
    },
    Disposing,
}

impl fmt::Display for TreeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeEvent::PropertyChanged(property) => {
                write!(f, "PropertyChanged({})", property.name())
            }
            TreeEvent::ChildrenChanged(CollectionChange::Added { node, index }) => {
                write!(f, "ChildrenChanged(added {} at {})", node, index)
            }
            TreeEvent::ChildrenChanged(CollectionChange::Removed { node, index }) => {
                write!(f, "ChildrenChanged(removed {} from {})", node, index)
            }
            TreeEvent::AncestorChanged { kind, node } => {
                write!(f, "AncestorChanged({:?}, {})", kind, node)
            }
            TreeEvent::DescendantChanged { kind, node } => {
                write!(f, "DescendantChanged({:?}, {})", kind, node)
            }
            TreeEvent::ParentChanged { old, new } => {
                let show = |id: &Option<NodeId>| id.map_or("none".to_string(), |id| id.to_string());
                write!(f, "ParentChanged({} -> {})", show(old), show(new))
            }
            TreeEvent::Disposing => write!(f, "Disposing"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Listener callback: the tree (read-only), the node it is subscribed on,
/// and the event that reached that node.
pub type Listener<T> = Box<dyn FnMut(&Tree<T>, NodeId, &TreeEvent)>;

/// How a queued event travels from its origin.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Dispatch {
    Local(TreeEvent),
    /// origin, then every ancestor
    BubbleUp(TreeEvent),
    /// origin, then every descendant in pre-order
    BroadcastDown(TreeEvent),
    /// broadcast `Height` from the origin if its height differs from `before`
    HeightCheck { before: usize },
}

impl<T> Tree<T> {
    pub fn subscribe<F>(&mut self, id: NodeId, listener: F) -> TreeResult<SubscriptionId>
    where
        F: FnMut(&Tree<T>, NodeId, &TreeEvent) + 'static,
    {
        self.node(id)?;
        let subscription = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners
            .entry(id)
            .or_default()
            .push((subscription, Box::new(listener)));
        Ok(subscription)
    }

    /// Returns false if the subscription was already gone.
    pub fn unsubscribe(&mut self, subscription: SubscriptionId) -> bool {
        for listeners in self.listeners.values_mut() {
            if let Some(pos) = listeners.iter().position(|(sub, _)| *sub == subscription) {
                drop(listeners.remove(pos));
                return true;
            }
        }
        false
    }

    pub(crate) fn queue(&mut self, origin: NodeId, dispatch: Dispatch) {
        self.pending.push((origin, dispatch));
    }

    /// Delivers everything queued so far, in queue order.
    pub(crate) fn flush(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for (origin, dispatch) in pending {
            self.dispatch(origin, dispatch);
        }
    }

    fn dispatch(&mut self, origin: NodeId, dispatch: Dispatch) {
        match dispatch {
            Dispatch::Local(event) => self.notify(origin, &event),
            Dispatch::BubbleUp(event) => {
                let chain: Vec<NodeId> = std::iter::once(origin)
                    .chain(self.ancestors(origin))
                    .collect();
                for id in chain {
                    self.notify(id, &event);
                }
            }
            Dispatch::BroadcastDown(event) => {
                let subtree: Vec<NodeId> = self.subtree(origin).collect();
                for id in subtree {
                    self.notify(id, &event);
                }
            }
            Dispatch::HeightCheck { before } => {
                if self.height_of(origin) != before {
                    self.dispatch(
                        origin,
                        Dispatch::BroadcastDown(TreeEvent::PropertyChanged(Property::Height)),
                    );
                }
            }
        }
    }

    fn notify(&mut self, target: NodeId, event: &TreeEvent) {
        if self.settings.log_events {
            debug!(%target, %event, "event");
        } else {
            trace!(%target, %event, "event");
        }
        // Listeners only get `&Tree`, so nothing can subscribe while they run.
        let Some(mut listeners) = self.listeners.remove(&target) else {
            return;
        };
        for (_, listener) in listeners.iter_mut() {
            listener(&*self, target, event);
        }
        self.listeners.insert(target, listeners);
    }
}
