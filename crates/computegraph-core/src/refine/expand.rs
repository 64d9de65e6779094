//! Macro expansion of generated ops

use crate::callers::map_nodes;
use crate::error::{Error, Result};
use crate::graph::{Graph, NodeId};
use crate::opstore::OpStore;
use tracing::{debug, warn};

/// Repeatedly expand generated ops under `node` until none remain.
///
/// Gives up after `max_depth` rounds, logging a warning and returning the
/// partially expanded graph.
pub fn expand_all(store: &OpStore, graph: &mut Graph, node: NodeId, max_depth: usize) -> Result<NodeId> {
    let mut current = node;
    for round in 0..max_depth {
        if !contains_generated(store, graph, current) {
            return Ok(current);
        }
        debug!("expansion round {} at {}", round + 1, current);
        current = expand_once(store, graph, current)?;
    }
    if contains_generated(store, graph, current) {
        warn!(
            "generated ops remain under {} after {} expansion rounds",
            current, max_depth
        );
    }
    Ok(current)
}

/// True if any op under `node` has an expansion.
pub fn contains_generated(store: &OpStore, graph: &Graph, node: NodeId) -> bool {
    graph.any_node(node, |_, n| {
        n.op_name()
            .and_then(|name| store.get(name))
            .is_some_and(|def| def.is_generated())
    })
}

fn expand_once(store: &OpStore, graph: &mut Graph, node: NodeId) -> Result<NodeId> {
    let mut failure: Option<Error> = None;
    let expanded = map_nodes(
        graph,
        node,
        &mut |graph: &mut Graph, id: NodeId| {
            if failure.is_some() {
                return id;
            }
            let Some(op) = graph.node(id).as_op() else {
                return id;
            };
            let Some(expansion) = store.get(&op.name).and_then(|def| def.expansion.clone()) else {
                return id;
            };
            let inputs = op.inputs.clone();
            match expansion(store, graph, &inputs) {
                Ok(replacement) => replacement,
                Err(err) => {
                    failure = Some(err);
                    id
                }
            }
        },
        false,
    );
    match failure {
        Some(err) => Err(err),
        None => Ok(expanded),
    }
}
