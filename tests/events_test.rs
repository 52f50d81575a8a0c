//! Change notifications: bubbling direction, ordering and no-op suppression.

use std::cell::RefCell;
use std::rc::Rc;

use rstest::rstest;

use canopy::util::testing;
use canopy::{CollectionChange, NodeChangeType, NodeId, Property, Tree, TreeEvent};

type Log = Rc<RefCell<Vec<TreeEvent>>>;

fn record<T: 'static>(tree: &mut Tree<T>, id: NodeId) -> Log {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    tree.subscribe(id, move |_, _, event| sink.borrow_mut().push(*event))
        .unwrap();
    log
}

fn descendant(kind: NodeChangeType, node: NodeId) -> TreeEvent {
    TreeEvent::DescendantChanged { kind, node }
}

fn ancestor(kind: NodeChangeType, node: NodeId) -> TreeEvent {
    TreeEvent::AncestorChanged { kind, node }
}

fn chain() -> (Tree<&'static str>, NodeId, NodeId, NodeId) {
    testing::init_test_setup();
    let mut tree = Tree::new();
    let r = tree.create_root("R");
    let a = tree.create_node(Some("A"), Some(r)).unwrap();
    let b = tree.create_node(Some("B"), Some(a)).unwrap();
    (tree, r, a, b)
}

#[test]
fn given_chain_when_moving_leaf_under_root_then_each_node_sees_its_share() {
    let (mut tree, r, a, b) = chain();
    let on_r = record(&mut tree, r);
    let on_a = record(&mut tree, a);
    let on_b = record(&mut tree, b);

    tree.set_parent(b, Some(r)).unwrap();

    use NodeChangeType::{NodeAdded, NodeRemoved};
    assert_eq!(
        *on_r.borrow(),
        vec![
            TreeEvent::PropertyChanged(Property::Count),
            TreeEvent::PropertyChanged(Property::Items),
            TreeEvent::ChildrenChanged(CollectionChange::Added { node: b, index: 1 }),
            descendant(NodeRemoved, b),
            TreeEvent::PropertyChanged(Property::Depth),
            TreeEvent::PropertyChanged(Property::Height),
            descendant(NodeAdded, b),
            ancestor(NodeAdded, b),
        ]
    );
    assert_eq!(
        *on_a.borrow(),
        vec![
            TreeEvent::PropertyChanged(Property::Count),
            TreeEvent::PropertyChanged(Property::Items),
            TreeEvent::ChildrenChanged(CollectionChange::Removed { node: b, index: 0 }),
            descendant(NodeRemoved, b),
            ancestor(NodeRemoved, b),
            TreeEvent::PropertyChanged(Property::Height),
            ancestor(NodeAdded, b),
        ]
    );
    assert_eq!(
        *on_b.borrow(),
        vec![
            ancestor(NodeRemoved, b),
            TreeEvent::PropertyChanged(Property::Depth),
            TreeEvent::PropertyChanged(Property::Height),
            ancestor(NodeAdded, b),
            TreeEvent::PropertyChanged(Property::Parent),
            TreeEvent::ParentChanged {
                old: Some(a),
                new: Some(r),
            },
        ]
    );
}

#[test]
fn given_chain_when_moving_leaf_under_root_then_root_sees_ancestor_and_descendant_pair() {
    let (mut tree, r, _a, b) = chain();
    let on_r = record(&mut tree, r);

    tree.set_parent(b, Some(r)).unwrap();

    let log = on_r.borrow();
    assert!(log.contains(&ancestor(NodeChangeType::NodeAdded, b)));
    assert!(log.contains(&descendant(NodeChangeType::NodeAdded, b)));
    assert!(log.contains(&descendant(NodeChangeType::NodeRemoved, b)));
}

#[test]
fn given_descendant_change_when_dispatched_then_every_ancestor_is_notified() {
    let (mut tree, r, a, b) = chain();
    let on_r = record(&mut tree, r);
    let on_a = record(&mut tree, a);
    let leaf = tree.create_root("leaf");

    tree.children_mut(b).unwrap().add(leaf).unwrap();

    let added = descendant(NodeChangeType::NodeAdded, leaf);
    assert!(on_r.borrow().contains(&added));
    assert!(on_a.borrow().contains(&added));
    // depth of the new leaf bubbles up as well
    assert!(on_r
        .borrow()
        .contains(&TreeEvent::PropertyChanged(Property::Depth)));
}

#[test]
fn given_subtree_moved_when_dispatched_then_both_parents_and_moved_subtree_see_ancestor_change() {
    let (mut tree, r, a, b) = chain();
    let other = tree.create_root("other");
    let on_a = record(&mut tree, a);
    let on_b = record(&mut tree, b);
    let on_r = record(&mut tree, r);
    let on_other = record(&mut tree, other);

    tree.set_parent(a, Some(other)).unwrap();

    for log in [&on_a, &on_b] {
        let log = log.borrow();
        assert!(log.contains(&ancestor(NodeChangeType::NodeRemoved, a)));
        assert!(log.contains(&ancestor(NodeChangeType::NodeAdded, a)));
    }
    assert!(on_r
        .borrow()
        .contains(&ancestor(NodeChangeType::NodeRemoved, a)));
    assert!(!on_r
        .borrow()
        .contains(&ancestor(NodeChangeType::NodeAdded, a)));
    assert_eq!(
        *on_other.borrow(),
        vec![
            TreeEvent::PropertyChanged(Property::Count),
            TreeEvent::PropertyChanged(Property::Items),
            TreeEvent::ChildrenChanged(CollectionChange::Added { node: a, index: 0 }),
            TreeEvent::PropertyChanged(Property::Height),
            descendant(NodeChangeType::NodeAdded, a),
            ancestor(NodeChangeType::NodeAdded, a),
        ]
    );
}

#[test]
fn given_height_change_when_dispatched_then_broadcast_reaches_descendants() {
    let (mut tree, r, a, b) = chain();
    let on_b = record(&mut tree, b);
    let sibling = tree.create_root("sibling");
    let nephew = tree.create_node(Some("nephew"), Some(sibling)).unwrap();
    tree.create_node(Some("grand-nephew"), Some(nephew)).unwrap();

    // R grows from height 2 to 3
    tree.children_mut(r).unwrap().add(sibling).unwrap();

    assert_eq!(tree.height(r).unwrap(), 3);
    assert_eq!(tree.height(a).unwrap(), 1);
    assert_eq!(
        *on_b.borrow(),
        vec![
            TreeEvent::PropertyChanged(Property::Height),
            ancestor(NodeChangeType::NodeAdded, sibling),
        ]
    );
}

#[test]
fn given_unchanged_parent_height_when_adding_leaf_then_no_height_event() {
    let (mut tree, r, _a, _b) = chain();
    let on_r = record(&mut tree, r);
    let leaf = tree.create_root("leaf");

    tree.set_parent(leaf, Some(r)).unwrap();

    assert!(!on_r
        .borrow()
        .contains(&TreeEvent::PropertyChanged(Property::Height)));
}

// ============================================================
// No-op writes
// ============================================================

#[test]
fn given_current_parent_when_set_again_then_nothing_fires() {
    let (mut tree, r, a, b) = chain();
    let logs = [record(&mut tree, r), record(&mut tree, a), record(&mut tree, b)];

    tree.set_parent(b, Some(a)).unwrap();
    tree.children_mut(a).unwrap().add(b).unwrap();
    tree.set_parent(r, None).unwrap();

    for log in &logs {
        assert!(log.borrow().is_empty());
    }
}

#[rstest]
#[case(None, None, false)]
#[case(Some(1), Some(1), false)]
#[case(None, Some(1), true)]
#[case(Some(1), None, true)]
#[case(Some(1), Some(2), true)]
fn given_value_write_when_compared_then_fires_only_on_change(
    #[case] initial: Option<i32>,
    #[case] next: Option<i32>,
    #[case] fires: bool,
) {
    let mut tree: Tree<i32> = Tree::new();
    let id = tree.create_node(initial, None).unwrap();
    let log = record(&mut tree, id);

    tree.set_value(id, next).unwrap();

    assert_eq!(tree.value(id).copied(), next);
    let expected = if fires {
        vec![TreeEvent::PropertyChanged(Property::Value)]
    } else {
        Vec::new()
    };
    assert_eq!(*log.borrow(), expected);
}

// ============================================================
// Symmetry between the two entry points
// ============================================================

fn detach(via_collection: bool) -> (Vec<TreeEvent>, Vec<TreeEvent>) {
    let (mut tree, _r, a, b) = chain();
    let on_a = record(&mut tree, a);
    let on_b = record(&mut tree, b);
    if via_collection {
        assert!(tree.children_mut(a).unwrap().remove(b).unwrap());
    } else {
        tree.set_parent(b, None).unwrap();
    }
    let a_events = on_a.borrow().clone();
    let b_events = on_b.borrow().clone();
    (a_events, b_events)
}

#[test]
fn given_remove_and_set_parent_none_when_compared_then_events_match() {
    assert_eq!(detach(true), detach(false));
}

#[test]
fn given_listener_when_event_arrives_then_tree_is_readable() {
    let (mut tree, r, _a, b) = chain();
    let depths = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&depths);
    tree.subscribe(b, move |tree, target, event| {
        if *event == TreeEvent::PropertyChanged(Property::Depth) {
            sink.borrow_mut().push(tree.depth(target).unwrap());
        }
    })
    .unwrap();

    tree.set_parent(b, Some(r)).unwrap();

    assert_eq!(*depths.borrow(), vec![1]);
}
