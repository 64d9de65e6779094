//! Parameter types for function arguments of higher-order ops
//!
//! Without generics, the element type a lambda receives is approximated by
//! building `index(dropna(arr), 0)` and taking its type.

use crate::callers::dereference_all_vars;
use crate::graph::{Graph, NodeId, Stack};
use crate::opstore::{names, OpStore};
use crate::types::{list_object_type, non_none, Type};
use indexmap::IndexMap;

/// Name of the lambda parameter that receives the element position.
pub const INDEX_PARAM: &str = "index";

/// Types for the parameters of the lambda passed as `fn_input` to a
/// higher-order op, given the op's already refined inputs.
pub(crate) fn param_types(
    store: &OpStore,
    graph: &mut Graph,
    op_name: &str,
    fn_input: &str,
    params: &IndexMap<String, Type>,
    inputs: &IndexMap<String, NodeId>,
    stack: &Stack,
) -> IndexMap<String, Type> {
    let row = match source_array(op_name, fn_input, inputs) {
        Some(arr) => {
            let arr = dereference_all_vars(graph, arr, stack);
            if op_name == names::JOIN_ALL {
                match first_row(store, graph, arr) {
                    Some(inner) => row_type(store, graph, inner),
                    None => list_object_type(&non_none(&list_object_type(&non_none(graph.ty(arr))))),
                }
            } else {
                row_type(store, graph, arr)
            }
        }
        None => Type::any(),
    };

    params
        .keys()
        .map(|name| {
            let ty = if name == INDEX_PARAM { Type::number() } else { row.clone() };
            (name.clone(), ty)
        })
        .collect()
}

/// The list input a lambda iterates over. For ops with several lists the
/// lambda's digit suffix picks the list with the same suffix.
fn source_array(op_name: &str, fn_input: &str, inputs: &IndexMap<String, NodeId>) -> Option<NodeId> {
    if op_name == names::JOIN {
        let suffix: String = fn_input.chars().filter(char::is_ascii_digit).collect();
        if !suffix.is_empty() {
            let matched = inputs
                .iter()
                .find(|(name, _)| name.as_str() != fn_input && name.ends_with(&suffix) && !name.ends_with("Fn"));
            if let Some((_, id)) = matched {
                return Some(*id);
            }
        }
    }
    inputs.values().next().copied()
}

/// Build `index(dropna(arr), 0)`; `None` when the store lacks either op.
fn first_row(store: &OpStore, graph: &mut Graph, arr: NodeId) -> Option<NodeId> {
    if !store.contains(names::DROPNA) || !store.contains(names::INDEX) {
        return None;
    }
    let dropped = store.make_op(graph, names::DROPNA, [(names::ARR_INPUT, arr)]).ok()?;
    let zero = graph.const_int(0);
    store
        .make_op(graph, names::INDEX, [(names::ARR_INPUT, dropped), (names::INDEX_INPUT, zero)])
        .ok()
}

fn row_type(store: &OpStore, graph: &mut Graph, arr: NodeId) -> Type {
    match first_row(store, graph, arr) {
        Some(row) => graph.ty(row).clone(),
        None => list_object_type(&non_none(graph.ty(arr))),
    }
}
