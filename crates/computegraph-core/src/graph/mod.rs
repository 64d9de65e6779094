//! Graph IR
//!
//! Nodes live in an append-only arena ([`Graph`]) and are referred to by
//! [`NodeId`] handles. A node is never modified once added; edits allocate new
//! nodes and reuse the ids of unchanged subtrees. Because of that, two
//! handles being equal means "the same node", and every change-detection fast
//! path in the crate (`map_nodes`, the refine cache, the simplifier) compares
//! handles, never node contents.

mod builder;
mod stack;

pub use builder::GraphBuilder;
pub use stack::{Frame, Resolved, Stack};

use crate::error::{Error, Result};
use crate::types::{Type, INVALID};
use indexmap::IndexMap;
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;

/// Handle to a node in a [`Graph`].
///
/// Handles are ordered by allocation, so inputs always compare lower than
/// the nodes that consume them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Create a handle from a raw index. Use only for deserialization.
    #[inline]
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A named op applied to named inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct Op {
    pub name: String,
    pub inputs: IndexMap<String, NodeId>,
}

impl Op {
    pub fn new(name: impl Into<String>, inputs: IndexMap<String, NodeId>) -> Self {
        Self {
            name: name.into(),
            inputs,
        }
    }

    /// First input in declaration order; the "chain" parent.
    pub fn first_input(&self) -> Option<NodeId> {
        self.inputs.values().next().copied()
    }
}

/// Payload of a `Const` node.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Json(Value),
    /// A function literal; the node is the lambda body.
    Function(NodeId),
}

impl ConstValue {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ConstValue::Json(v) => Some(v),
            ConstValue::Function(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// An editing-time hole.
    Void,
    Var { name: String, ty: Type },
    Const { ty: Type, val: ConstValue },
    Output { ty: Type, op: Op },
}

impl Node {
    /// Type of the node; `Void` is `invalid`.
    pub fn ty(&self) -> &Type {
        match self {
            Node::Void => &INVALID,
            Node::Var { ty, .. } | Node::Const { ty, .. } | Node::Output { ty, .. } => ty,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Node::Void)
    }

    pub fn as_op(&self) -> Option<&Op> {
        match self {
            Node::Output { op, .. } => Some(op),
            _ => None,
        }
    }

    pub fn op_name(&self) -> Option<&str> {
        self.as_op().map(|op| op.name.as_str())
    }

    /// Body and parameter types of a function literal.
    pub fn as_function_literal(&self) -> Option<(NodeId, &IndexMap<String, Type>)> {
        match self {
            Node::Const {
                ty: Type::Function { input_types, .. },
                val: ConstValue::Function(body),
            } => Some((*body, input_types)),
            _ => None,
        }
    }

    /// Direct children: op inputs, or the body of a function literal.
    pub fn children(&self) -> SmallVec<[NodeId; 4]> {
        match self {
            Node::Output { op, .. } => op.inputs.values().copied().collect(),
            Node::Const {
                val: ConstValue::Function(body),
                ..
            } => SmallVec::from_slice(&[*body]),
            _ => SmallVec::new(),
        }
    }
}

/// A node tree bundled with its own arena, used for op bodies and
/// graph-computed output types.
#[derive(Debug, Clone)]
pub struct GraphFragment {
    pub graph: Graph,
    pub root: NodeId,
}

impl GraphFragment {
    pub fn new(graph: Graph, root: NodeId) -> Self {
        Self { graph, root }
    }
}

/// Append-only node arena.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn add(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// # Panics
    /// Panics if `id` was not allocated by this graph.
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn try_node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id.index()).ok_or(Error::UnknownNode(id))
    }

    #[inline]
    pub fn ty(&self, id: NodeId) -> &Type {
        self.node(id).ty()
    }

    pub fn void(&mut self) -> NodeId {
        self.add(Node::Void)
    }

    pub fn var(&mut self, name: impl Into<String>, ty: Type) -> NodeId {
        self.add(Node::Var { name: name.into(), ty })
    }

    pub fn constant(&mut self, ty: Type, val: Value) -> NodeId {
        self.add(Node::Const {
            ty,
            val: ConstValue::Json(val),
        })
    }

    pub fn const_number(&mut self, n: f64) -> NodeId {
        let val = serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null);
        self.constant(Type::number(), val)
    }

    pub fn const_int(&mut self, n: i64) -> NodeId {
        self.constant(Type::number(), Value::from(n))
    }

    pub fn const_string(&mut self, s: impl Into<String>) -> NodeId {
        self.constant(Type::string(), Value::String(s.into()))
    }

    pub fn const_none(&mut self) -> NodeId {
        self.constant(Type::none(), Value::Null)
    }

    /// A function literal whose output type is the body's current type.
    pub fn lambda<K: Into<String>>(&mut self, params: impl IntoIterator<Item = (K, Type)>, body: NodeId) -> NodeId {
        let output = self.ty(body).clone();
        self.add(Node::Const {
            ty: Type::function(params, output),
            val: ConstValue::Function(body),
        })
    }

    pub fn output(&mut self, ty: Type, op: Op) -> NodeId {
        self.add(Node::Output { ty, op })
    }

    /// Iterate all nodes reachable from `root`, each once, inputs before
    /// consumers.
    pub fn post_order(&self, root: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut visited = std::collections::HashSet::new();
        let mut stack = vec![(root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            if !visited.insert(id) {
                continue;
            }
            stack.push((id, true));
            for child in self.node(id).children().into_iter().rev() {
                if !visited.contains(&child) {
                    stack.push((child, false));
                }
            }
        }
        order
    }

    /// True if any node reachable from `root` satisfies `pred`.
    pub fn any_node(&self, root: NodeId, mut pred: impl FnMut(NodeId, &Node) -> bool) -> bool {
        self.post_order(root).into_iter().any(|id| pred(id, self.node(id)))
    }

    /// An executable node contains no `Void` and no free variable.
    ///
    /// Parameters of enclosing function literals are not free.
    pub fn is_executable(&self, root: NodeId) -> bool {
        self.executable_under(root, &mut Vec::new())
    }

    fn executable_under(&self, id: NodeId, bound: &mut Vec<String>) -> bool {
        match self.node(id) {
            Node::Void => false,
            Node::Var { name, .. } => bound.iter().any(|b| b == name),
            Node::Const {
                ty,
                val: ConstValue::Function(body),
            } => {
                let params: Vec<String> = match ty {
                    Type::Function { input_types, .. } => input_types.keys().cloned().collect(),
                    _ => Vec::new(),
                };
                let depth = bound.len();
                bound.extend(params);
                let ok = self.executable_under(*body, bound);
                bound.truncate(depth);
                ok
            }
            Node::Const { .. } => true,
            Node::Output { op, .. } => op.inputs.values().all(|input| self.executable_under(*input, bound)),
        }
    }

    /// Copy the tree rooted at `root` out of `other` into this graph,
    /// preserving sharing. Returns the new root.
    pub fn import(&mut self, other: &Graph, root: NodeId) -> NodeId {
        let mut mapping: HashMap<NodeId, NodeId> = HashMap::new();
        for id in other.post_order(root) {
            let copied = match other.node(id) {
                Node::Output { ty, op } => Node::Output {
                    ty: ty.clone(),
                    op: Op::new(op.name.clone(), remap_inputs(&op.inputs, &mapping)),
                },
                Node::Const {
                    ty,
                    val: ConstValue::Function(body),
                } => Node::Const {
                    ty: ty.clone(),
                    val: ConstValue::Function(mapping[body]),
                },
                other => other.clone(),
            };
            let new_id = self.add(copied);
            mapping.insert(id, new_id);
        }
        mapping[&root]
    }
}

fn remap_inputs(inputs: &IndexMap<String, NodeId>, mapping: &HashMap<NodeId, NodeId>) -> IndexMap<String, NodeId> {
    inputs.iter().map(|(k, v)| (k.clone(), mapping[v])).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_op(graph: &mut Graph, name: &str, inputs: &[(&str, NodeId)]) -> NodeId {
        let inputs = inputs.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        graph.output(Type::number(), Op::new(name, inputs))
    }

    #[test]
    fn test_post_order_visits_shared_nodes_once() {
        let mut graph = Graph::new();
        let a = graph.const_int(1);
        let sum = add_op(&mut graph, "number-add", &[("lhs", a), ("rhs", a)]);
        assert_eq!(graph.post_order(sum), vec![a, sum]);
    }

    #[test]
    fn test_void_is_invalid() {
        let mut graph = Graph::new();
        let hole = graph.void();
        assert!(graph.ty(hole).is_invalid());
        assert!(!graph.is_executable(hole));
    }

    #[test]
    fn test_executable_respects_lambda_params() {
        let mut graph = Graph::new();
        let row = graph.var("row", Type::number());
        let one = graph.const_int(1);
        let body = add_op(&mut graph, "number-add", &[("lhs", row), ("rhs", one)]);
        assert!(!graph.is_executable(body));
        let lambda = graph.lambda([("row", Type::number())], body);
        assert!(graph.is_executable(lambda));
    }

    #[test]
    fn test_import_preserves_sharing() {
        let mut source = Graph::new();
        let x = source.var("x", Type::number());
        let root = add_op(&mut source, "number-mul", &[("lhs", x), ("rhs", x)]);

        let mut target = Graph::new();
        target.const_int(7);
        let imported = target.import(&source, root);
        assert_eq!(target.len(), 3);
        let op = target.node(imported).as_op().unwrap();
        assert_eq!(op.inputs["lhs"], op.inputs["rhs"]);
    }

    #[test]
    fn test_try_node_reports_unknown() {
        let graph = Graph::new();
        assert!(matches!(graph.try_node(NodeId::from_raw(3)), Err(Error::UnknownNode(_))));
    }
}
