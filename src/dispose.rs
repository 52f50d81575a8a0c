use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::arena::{NodeId, Tree};
use crate::errors::{TreeError, TreeResult};
use crate::events::{Dispatch, TreeEvent};
use crate::value::TreeValue;

/// Order in which a node disposes its children relative to its own value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisposeTraversal {
    /// Children first, then the value
    #[default]
    BottomUp,
    /// Value first, then the children
    TopDown,
}

impl<T> Tree<T> {
    pub fn dispose_traversal(&self, id: NodeId) -> TreeResult<DisposeTraversal> {
        Ok(self.node(id)?.dispose_traversal)
    }

    pub fn set_dispose_traversal(&mut self, id: NodeId, traversal: DisposeTraversal) -> TreeResult<()> {
        self.ensure_live_mut(id)?.dispose_traversal = traversal;
        Ok(())
    }
}

impl<T: TreeValue> Tree<T> {
    /// Disposes `id`.
    ///
    /// Children are only disposed when the value itself is disposable.
    /// Children that were disposed earlier on their own are skipped. The node
    /// is marked disposed in every case; a second call fails with
    /// [`TreeError::AlreadyDisposed`].
    #[instrument(level = "debug", skip(self))]
    pub fn dispose(&mut self, id: NodeId) -> TreeResult<()> {
        let node = self.node(id)?;
        if node.disposed {
            return Err(TreeError::AlreadyDisposed(id));
        }
        let traversal = node.dispose_traversal;

        self.queue(id, Dispatch::Local(TreeEvent::Disposing));
        self.flush();

        let node = self.node_mut(id)?;
        let value_disposable = node
            .value
            .as_mut()
            .map_or(false, |value| value.as_disposable().is_some());

        if value_disposable {
            let mut children: Vec<NodeId> = node.children.iter().collect();
            children.retain(|child| !self.is_disposed(*child).unwrap_or(true));
            if traversal == DisposeTraversal::BottomUp {
                for child in &children {
                    self.dispose(*child)?;
                }
            }
            self.dispose_value(id)?;
            if traversal == DisposeTraversal::TopDown {
                for child in &children {
                    self.dispose(*child)?;
                }
            }
        }

        self.node_mut(id)?.disposed = true;
        // the slot stays for `is_disposed`; nothing is delivered here any more
        drop(self.listeners.remove(&id));
        debug!(node = %id, ?traversal, value_disposable, "disposed");
        Ok(())
    }

    fn dispose_value(&mut self, id: NodeId) -> TreeResult<()> {
        if let Some(disposable) = self
            .node_mut(id)?
            .value
            .as_mut()
            .and_then(|value| value.as_disposable())
        {
            disposable.dispose();
        }
        Ok(())
    }
}
