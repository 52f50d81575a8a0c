use std::fmt::Display;

use termtree::Tree as TermTree;
use tracing::instrument;

use crate::arena::{NodeId, NodeRef, Tree};

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> TermTree<String>;
}

impl<T: Display> TreeNodeConvert for NodeRef<'_, T> {
    #[instrument(level = "trace", skip(self), fields(node = %self.id()))]
    fn to_tree_string(&self) -> TermTree<String> {
        let tree = self.tree();
        let label = match self.value() {
            Some(value) => format!("{} [depth={}, height={}]", value, self.depth(), self.height()),
            None => format!("<none> [depth={}, height={}]", self.depth(), self.height()),
        };

        let leaves: Vec<_> = tree
            .child_nodes(self.id())
            .filter_map(|child| tree.get(child))
            .map(|child| child.to_tree_string())
            .collect();

        TermTree::new(label).with_leaves(leaves)
    }
}

impl<T: Display> TreeNodeConvert for Tree<T> {
    fn to_tree_string(&self) -> TermTree<String> {
        let roots: Vec<NodeId> = self.roots().collect();
        match roots.as_slice() {
            [] => TermTree::new("Empty tree".to_string()),
            [single] => render(self, *single),
            _ => TermTree::new("*".to_string())
                .with_leaves(roots.iter().map(|&root| render(self, root))),
        }
    }
}

fn render<T: Display>(tree: &Tree<T>, id: NodeId) -> TermTree<String> {
    tree.get(id)
        .map(|node| node.to_tree_string())
        .unwrap_or_else(|| TermTree::new(id.to_string()))
}
