use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::arena::{NodeId, Tree};
use crate::cli::args::{Cli, Commands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, TreeSettings};
use crate::events::{CollectionChange, NodeChangeType, TreeEvent};
use crate::tree_traits::TreeNodeConvert;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let settings = TreeSettings::load(cli.config.as_deref())?;
    debug!(?settings, "effective settings");

    match &cli.command {
        Some(Commands::Demo { reparent }) => _demo(settings, *reparent),
        Some(Commands::Scenario) => _scenario(settings),
        Some(Commands::Config) => _config(&settings),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::Usage(
            "no command given, see `canopy --help`".to_string(),
        )),
    }
}

fn label<T: ToString>(tree: &Tree<T>, id: NodeId) -> String {
    tree.value(id)
        .map(|value| value.to_string())
        .unwrap_or_else(|| id.to_string())
}

/// Event text with node ids replaced by their values.
fn describe<T: ToString>(tree: &Tree<T>, event: &TreeEvent) -> String {
    let kind = |kind: &NodeChangeType| match kind {
        NodeChangeType::NodeAdded => "added",
        NodeChangeType::NodeRemoved => "removed",
    };
    let maybe = |id: &Option<NodeId>| id.map_or("none".to_string(), |id| label(tree, id));
    match event {
        TreeEvent::AncestorChanged { kind: k, node } => {
            format!("AncestorChanged({} {})", kind(k), label(tree, *node))
        }
        TreeEvent::DescendantChanged { kind: k, node } => {
            format!("DescendantChanged({} {})", kind(k), label(tree, *node))
        }
        TreeEvent::ChildrenChanged(CollectionChange::Added { node, index }) => {
            format!("ChildrenChanged(added {} at {})", label(tree, *node), index)
        }
        TreeEvent::ChildrenChanged(CollectionChange::Removed { node, index }) => {
            format!("ChildrenChanged(removed {} from {})", label(tree, *node), index)
        }
        TreeEvent::ParentChanged { old, new } => {
            format!("ParentChanged({} -> {})", maybe(old), maybe(new))
        }
        other => other.to_string(),
    }
}

/// Subscribes a logger on every node currently in the tree.
fn record_events(tree: &mut Tree<String>) -> CliResult<Rc<RefCell<Vec<String>>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let ids: Vec<NodeId> = tree.roots().flat_map(|root| tree.subtree(root)).collect();
    for id in ids {
        let sink = Rc::clone(&log);
        tree.subscribe(id, move |tree, target, event| {
            sink.borrow_mut()
                .push(format!("{:<10} {}", label(tree, target), describe(tree, event)));
        })?;
    }
    Ok(log)
}

#[instrument(skip(settings))]
fn _demo(settings: TreeSettings, reparent: bool) -> CliResult<()> {
    let mut tree: Tree<String> = Tree::with_settings(settings);
    let projects = tree.create_root("projects".to_string());
    let canopy = tree.create_node(Some("canopy".to_string()), Some(projects))?;
    tree.create_node(Some("src".to_string()), Some(canopy))?;
    tree.create_node(Some("tests".to_string()), Some(canopy))?;
    let notes = tree.create_node(Some("notes".to_string()), Some(projects))?;
    let ideas = tree.create_node(Some("ideas".to_string()), Some(notes))?;

    output::header("Tree");
    println!("{}", tree.to_tree_string());

    if reparent {
        let log = record_events(&mut tree)?;
        tree.set_parent(ideas, Some(canopy))?;

        output::header("After moving ideas under canopy");
        println!("{}", tree.to_tree_string());
        output::header("Events");
        for line in log.borrow().iter() {
            println!("  {}", line);
        }
    }

    let order = tree.subtree(projects).map(|id| label(&tree, id)).join(", ");
    output::action("pre-order", &order);
    Ok(())
}

#[instrument(skip(settings))]
fn _scenario(settings: TreeSettings) -> CliResult<()> {
    let mut tree: Tree<&'static str> = Tree::with_settings(settings);
    let r = tree.create_root("R");
    let a = tree.create_node(Some("A"), Some(r))?;
    let b = tree.create_node(Some("B"), Some(a))?;

    let mut checks: Vec<(&str, bool)> = vec![
        ("height(R) == 2", tree.height(r)? == 2),
        ("depth(B) == 2", tree.depth(b)? == 2),
        (
            "subtree(R) == [R, A, B]",
            tree.subtree(r).collect::<Vec<_>>() == vec![r, a, b],
        ),
    ];

    let on_r = Rc::new(RefCell::new(Vec::new()));
    let on_b = Rc::new(RefCell::new(Vec::new()));
    for (id, seen) in [(r, &on_r), (b, &on_b)] {
        let sink = Rc::clone(seen);
        tree.subscribe(id, move |_, _, event| sink.borrow_mut().push(*event))?;
    }

    tree.set_parent(b, Some(r))?;

    let removed = TreeEvent::DescendantChanged {
        kind: NodeChangeType::NodeRemoved,
        node: b,
    };
    let added = TreeEvent::DescendantChanged {
        kind: NodeChangeType::NodeAdded,
        node: b,
    };
    checks.extend([
        ("height(R) == 1", tree.height(r)? == 1),
        ("depth(B) == 1", tree.depth(b)? == 1),
        ("height(A) == 0", tree.height(a)? == 0),
        (
            "R observed DescendantChanged removed/added for B",
            on_r.borrow().contains(&removed) && on_r.borrow().contains(&added),
        ),
        (
            "R observed AncestorChanged for B",
            on_r.borrow().contains(&TreeEvent::AncestorChanged {
                kind: NodeChangeType::NodeAdded,
                node: b,
            }),
        ),
        (
            "B observed AncestorChanged",
            on_b.borrow()
                .iter()
                .any(|event| matches!(event, TreeEvent::AncestorChanged { .. })),
        ),
    ]);

    output::header("Scenario: R <- A <- B, then move B under R");
    let mut failed = 0;
    for (name, ok) in &checks {
        if *ok {
            output::success_detail(name);
        } else {
            output::failure(name);
            failed += 1;
        }
    }
    if failed > 0 {
        return Err(CliError::ScenarioFailed(failed));
    }
    Ok(())
}

fn _config(settings: &TreeSettings) -> CliResult<()> {
    output::header("Settings");
    output::action("dispose_traversal", &format!("{:?}", settings.dispose_traversal));
    output::action("log_events", &settings.log_events);
    let global = global_config_path()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unavailable>".to_string());
    output::action("global config", &global);
    Ok(())
}
