//! Flattened JSON form of graphs
//!
//! ```json
//! {"nodes": [{"nodeType": "const", "type": "number", "val": 1},
//!            {"nodeType": "output", "type": "number",
//!             "fromOp": {"name": "number-add", "inputs": {"lhs": 0, "rhs": 0}}}],
//!  "roots": [1]}
//! ```
//!
//! Nodes are listed inputs-first and refer to each other by position, so a
//! node shared by several consumers is written once and stays shared after
//! loading. A function literal's `val` is the position of its body.

use crate::error::{Error, Result};
use crate::graph::{ConstValue, Graph, Node, NodeId, Op};
use crate::types::Type;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedGraph {
    pub nodes: Vec<SerializedNode>,
    pub roots: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "nodeType", rename_all = "camelCase")]
pub enum SerializedNode {
    Void,
    Var {
        #[serde(rename = "varName")]
        var_name: String,
        #[serde(rename = "type")]
        ty: Type,
    },
    Const {
        #[serde(rename = "type")]
        ty: Type,
        val: Value,
    },
    Output {
        #[serde(rename = "type")]
        ty: Type,
        #[serde(rename = "fromOp")]
        from_op: SerializedOp,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedOp {
    pub name: String,
    pub inputs: IndexMap<String, usize>,
}

/// Flatten the trees under `roots`.
pub fn serialize_graph(graph: &Graph, roots: &[NodeId]) -> SerializedGraph {
    let mut positions: HashMap<NodeId, usize> = HashMap::new();
    let mut nodes = Vec::new();

    for root in roots {
        for id in graph.post_order(*root) {
            if positions.contains_key(&id) {
                continue;
            }
            let serialized = match graph.node(id) {
                Node::Void => SerializedNode::Void,
                Node::Var { name, ty } => SerializedNode::Var {
                    var_name: name.clone(),
                    ty: ty.clone(),
                },
                Node::Const {
                    ty,
                    val: ConstValue::Json(val),
                } => SerializedNode::Const {
                    ty: ty.clone(),
                    val: val.clone(),
                },
                Node::Const {
                    ty,
                    val: ConstValue::Function(body),
                } => SerializedNode::Const {
                    ty: ty.clone(),
                    val: Value::from(positions[body]),
                },
                Node::Output { ty, op } => SerializedNode::Output {
                    ty: ty.clone(),
                    from_op: SerializedOp {
                        name: op.name.clone(),
                        inputs: op.inputs.iter().map(|(k, v)| (k.clone(), positions[v])).collect(),
                    },
                },
            };
            positions.insert(id, nodes.len());
            nodes.push(serialized);
        }
    }

    SerializedGraph {
        roots: roots.iter().map(|r| positions[r]).collect(),
        nodes,
    }
}

/// Rebuild a graph, returning it with the root handles.
pub fn deserialize_graph(serialized: &SerializedGraph) -> Result<(Graph, Vec<NodeId>)> {
    let mut graph = Graph::new();
    let mut ids: Vec<NodeId> = Vec::with_capacity(serialized.nodes.len());

    let lookup = |ids: &[NodeId], position: usize, at: usize| -> Result<NodeId> {
        if position >= at {
            return Err(Error::Serialization(format!(
                "node {at} refers to node {position}, which does not precede it"
            )));
        }
        Ok(ids[position])
    };

    for (at, node) in serialized.nodes.iter().enumerate() {
        let id = match node {
            SerializedNode::Void => graph.void(),
            SerializedNode::Var { var_name, ty } => graph.var(var_name.clone(), ty.clone()),
            SerializedNode::Const { ty, val } if ty.is_function() => {
                let position = val
                    .as_u64()
                    .ok_or_else(|| Error::Serialization(format!("function literal {at} has no body index")))?;
                let body = lookup(&ids, position as usize, at)?;
                graph.add(Node::Const {
                    ty: ty.clone(),
                    val: ConstValue::Function(body),
                })
            }
            SerializedNode::Const { ty, val } => graph.constant(ty.clone(), val.clone()),
            SerializedNode::Output { ty, from_op } => {
                let mut inputs = IndexMap::with_capacity(from_op.inputs.len());
                for (name, position) in &from_op.inputs {
                    inputs.insert(name.clone(), lookup(&ids, *position, at)?);
                }
                graph.output(ty.clone(), Op::new(from_op.name.clone(), inputs))
            }
        };
        ids.push(id);
    }

    let roots = serialized
        .roots
        .iter()
        .map(|r| {
            ids.get(*r)
                .copied()
                .ok_or_else(|| Error::Serialization(format!("root {r} is out of range")))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((graph, roots))
}

pub fn graph_to_json(graph: &Graph, roots: &[NodeId]) -> Result<String> {
    Ok(serde_json::to_string_pretty(&serialize_graph(graph, roots))?)
}

pub fn graph_from_json(text: &str) -> Result<(Graph, Vec<NodeId>)> {
    let serialized: SerializedGraph = serde_json::from_str(text)?;
    deserialize_graph(&serialized)
}
