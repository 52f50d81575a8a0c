//! Observable n-ary tree.
//!
//! Nodes live in a [`Tree`] arena and are addressed by [`NodeId`]. A node has
//! an optional value, one non-owning parent link and an ordered
//! [`ChildCollection`]. Depth and height are derived on every read. Every
//! structural change is announced through [`TreeEvent`]s that bubble up to
//! ancestors or broadcast down to descendants.

pub mod arena;
pub mod children;
pub mod cli;
pub mod config;
pub mod dispose;
pub mod errors;
pub mod events;
pub mod exitcode;
mod reparent;
pub mod traversal;
pub mod tree_traits;
pub mod util;
pub mod value;

pub use arena::{ExpandAction, NodeId, NodeRef, Tree};
pub use children::{ChildCollection, ChildrenMut};
pub use config::TreeSettings;
pub use dispose::DisposeTraversal;
pub use errors::{TreeError, TreeResult};
pub use events::{CollectionChange, NodeChangeType, Property, SubscriptionId, TreeEvent};
pub use traversal::{Ancestors, PreOrder};
pub use tree_traits::TreeNodeConvert;
pub use value::{Disposable, NodeAware, TreeValue};
