//! Rewrite rules over `index(...)` nodes
//!
//! Each rule returns `Ok(None)` when it does not apply or when it cannot
//! show the rewrite is safe.

use crate::callers::{call_function, chain_ancestors};
use crate::error::Result;
use crate::executor::Executor;
use crate::graph::{ConstValue, Graph, Node, NodeId, Op};
use crate::opstore::{names, OpStore};
use crate::types::{is_assignable_to, non_none, tagged_value_value_type, SimpleType, Type};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

/// The parts of an `index(arr, i)` node.
struct IndexApplication {
    arr: NodeId,
    index: NodeId,
    position: Option<i64>,
}

fn as_index(graph: &Graph, node: NodeId) -> Option<IndexApplication> {
    let op = graph.node(node).as_op()?;
    if op.name != names::INDEX {
        return None;
    }
    let arr = *op.inputs.get_index(0)?.1;
    let index = *op.inputs.get_index(1)?.1;
    Some(IndexApplication {
        arr,
        index,
        position: const_integer(graph, index),
    })
}

/// Integer value of a numeric constant.
fn const_integer(graph: &Graph, node: NodeId) -> Option<i64> {
    match graph.node(node) {
        Node::Const {
            val: ConstValue::Json(val),
            ..
        } => val
            .as_i64()
            .or_else(|| {
                val.as_f64()
                    .filter(|f| f.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(f))
                    .map(|f| f as i64)
            }),
        _ => None,
    }
}

/// `(name, first input, second input)` of an op node.
fn unary_chain(graph: &Graph, node: NodeId) -> Option<(&Op, NodeId, Option<NodeId>)> {
    let op = graph.node(node).as_op()?;
    let first = *op.inputs.get_index(0)?.1;
    let second = op.inputs.get_index(1).map(|(_, id)| *id);
    Some((op, first, second))
}

/// `index(limit(arr, k), i)` becomes `index(arr, i)` when `k > i`.
pub(crate) fn index_of_limit(store: &OpStore, graph: &mut Graph, node: NodeId) -> Result<Option<NodeId>> {
    let Some(IndexApplication {
        arr,
        index,
        position: Some(i),
    }) = as_index(graph, node)
    else {
        return Ok(None);
    };
    let Some((op, inner, Some(limit))) = unary_chain(graph, arr) else {
        return Ok(None);
    };
    if op.name != names::LIMIT {
        return Ok(None);
    }
    match const_integer(graph, limit) {
        Some(k) if i >= 0 && k > i => Ok(Some(store.make_op_positional(graph, names::INDEX, &[inner, index])?)),
        _ => Ok(None),
    }
}

/// `index(offset(arr, k), i)` becomes `index(arr, i + k)`.
pub(crate) fn index_of_offset(store: &OpStore, graph: &mut Graph, node: NodeId) -> Result<Option<NodeId>> {
    let Some(IndexApplication {
        arr,
        position: Some(i),
        ..
    }) = as_index(graph, node)
    else {
        return Ok(None);
    };
    let Some((op, inner, Some(offset))) = unary_chain(graph, arr) else {
        return Ok(None);
    };
    if op.name != names::OFFSET {
        return Ok(None);
    }
    let Some(k) = const_integer(graph, offset) else {
        return Ok(None);
    };
    // Negative positions count from the end, which offset does not preserve
    if i < 0 || k < 0 {
        return Ok(None);
    }
    let Some(position) = i.checked_add(k) else {
        debug!("index {} past offset {} overflows, skipping rewrite", i, k);
        return Ok(None);
    };
    let shifted = graph.const_int(position);
    Ok(Some(store.make_op_positional(graph, names::INDEX, &[inner, shifted])?))
}

/// `index(<filter|sort|identity map>*(groupby(arr, fn)), i)` becomes
/// `filter(arr, row => fn(row) == key)` where `key` is the group key found
/// at position `i`.
pub(crate) async fn index_of_groupby(
    executor: &dyn Executor,
    store: &OpStore,
    graph: &mut Graph,
    node: NodeId,
) -> Result<Option<NodeId>> {
    let Some(IndexApplication {
        arr: groups,
        index,
        position: Some(_),
    }) = as_index(graph, node)
    else {
        return Ok(None);
    };

    let mut current = groups;
    let (source, group_fn) = loop {
        let Some((op, first, second)) = unary_chain(graph, current) else {
            return Ok(None);
        };
        match op.name.as_str() {
            names::FILTER | names::SORT => current = first,
            names::MAP if second.is_some_and(|f| is_identity_lambda(graph, f)) => current = first,
            names::GROUPBY => match second {
                Some(group_fn) => break (first, group_fn),
                None => return Ok(None),
            },
            _ => return Ok(None),
        }
    };

    let Some((group_body, params)) = graph
        .node(group_fn)
        .as_function_literal()
        .map(|(body, params)| (body, params.clone()))
    else {
        return Ok(None);
    };
    let Some(row_param) = params.keys().next().cloned() else {
        return Ok(None);
    };
    if !graph.is_executable(groups) {
        debug!("groupby chain under {} is not executable, skipping rewrite", node);
        return Ok(None);
    }

    // fn(index(index(groups, i), 0)) is the key of group i
    let group = store.make_op_positional(graph, names::INDEX, &[groups, index])?;
    let zero = graph.const_int(0);
    let first_row = store.make_op_positional(graph, names::INDEX, &[group, zero])?;
    let args: IndexMap<String, NodeId> = [(row_param, first_row)].into_iter().collect();
    let key_expr = call_function(graph, group_body, &args);
    if !graph.is_executable(key_expr) {
        return Ok(None);
    }
    let Some(key) = query_or_skip(executor, graph, key_expr).await else {
        return Ok(None);
    };

    let Some(predicate) = equality(store, graph, group_body, &key)? else {
        debug!("group key {} has no supported equality, skipping rewrite", key);
        return Ok(None);
    };
    let pred_fn = graph.lambda(params, predicate);
    Ok(Some(store.make_op_positional(graph, names::FILTER, &[source, pred_fn])?))
}

fn is_identity_lambda(graph: &Graph, node: NodeId) -> bool {
    match graph.node(node).as_function_literal() {
        Some((body, params)) => match (graph.node(body), params.keys().next()) {
            (Node::Var { name, .. }, Some(first)) => name == first,
            _ => false,
        },
        None => false,
    }
}

/// Build `expr == key`, field by field when `expr` is a dict literal.
fn equality(store: &OpStore, graph: &mut Graph, expr: NodeId, key: &Value) -> Result<Option<NodeId>> {
    if let (Some(op), Value::Object(fields)) = (graph.node(expr).as_op(), key) {
        if op.name == names::DICT {
            let entries: Vec<(String, NodeId)> = op.inputs.iter().map(|(k, v)| (k.clone(), *v)).collect();
            let mut conjunction: Option<NodeId> = None;
            for (field, field_expr) in entries {
                let Some(field_key) = fields.get(&field) else {
                    return Ok(None);
                };
                let Some(eq) = equality(store, graph, field_expr, field_key)? else {
                    return Ok(None);
                };
                conjunction = Some(match conjunction {
                    None => eq,
                    Some(acc) => store.make_op_positional(graph, names::AND, &[acc, eq])?,
                });
            }
            return Ok(conjunction);
        }
    }

    let (eq_op, literal_ty) = match key {
        Value::String(_) => (names::STRING_EQUAL, Type::string()),
        Value::Number(_) => (names::NUMBER_EQUAL, Type::number()),
        _ => return Ok(None),
    };
    if !store.contains(eq_op) {
        return Ok(None);
    }
    let literal = graph.constant(literal_ty, key.clone());
    Ok(Some(store.make_op_positional(graph, eq_op, &[expr, literal])?))
}

/// `index(...)` producing an artifact or artifact version under a project
/// becomes a direct lookup on that project by name.
pub(crate) async fn index_to_project_lookup(
    executor: &dyn Executor,
    store: &OpStore,
    graph: &mut Graph,
    node: NodeId,
) -> Result<Option<NodeId>> {
    if as_index(graph, node).is_none() {
        return Ok(None);
    }
    let value_ty = underlying(graph.ty(node));
    let is_artifact = is_assignable_to(&value_ty, &Type::simple(SimpleType::Artifact));
    let is_version = is_assignable_to(&value_ty, &Type::simple(SimpleType::ArtifactVersion));
    if !is_artifact && !is_version {
        return Ok(None);
    }

    let project_ty = Type::simple(SimpleType::Project);
    let Some(project) = chain_ancestors(graph, node)
        .into_iter()
        .find(|id| is_assignable_to(&underlying(graph.ty(*id)), &project_ty))
    else {
        return Ok(None);
    };
    if !graph.is_executable(node) {
        return Ok(None);
    }

    if is_artifact {
        let name_node = store.make_op_positional(graph, names::ARTIFACT_NAME, &[node])?;
        let Some(Value::String(name)) = query_or_skip(executor, graph, name_node).await else {
            return Ok(None);
        };
        let name = graph.const_string(name);
        Ok(Some(store.make_op_positional(graph, names::PROJECT_ARTIFACT, &[project, name])?))
    } else {
        let name_node = store.make_op_positional(graph, names::ARTIFACT_VERSION_NAME, &[node])?;
        let Some(Value::String(full_name)) = query_or_skip(executor, graph, name_node).await else {
            return Ok(None);
        };
        let Some((name, alias)) = full_name.rsplit_once(':') else {
            debug!("artifact version name '{}' has no alias, skipping rewrite", full_name);
            return Ok(None);
        };
        let name = graph.const_string(name);
        let alias = graph.const_string(alias);
        Ok(Some(store.make_op_positional(
            graph,
            names::PROJECT_ARTIFACT_VERSION,
            &[project, name, alias],
        )?))
    }
}

fn underlying(ty: &Type) -> Type {
    tagged_value_value_type(&non_none(ty)).unwrap_const().clone()
}

/// A failed query means the rewrite cannot be proven safe.
async fn query_or_skip(executor: &dyn Executor, graph: &Graph, node: NodeId) -> Option<Value> {
    match executor.query(graph, node).await {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("query for {} failed, skipping rewrite: {}", node, err);
            None
        }
    }
}
