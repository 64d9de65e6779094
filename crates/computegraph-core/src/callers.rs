//! Variable substitution and resolution over node trees
//!
//! Every rewrite here allocates new nodes only along paths where something
//! actually changed, so an unchanged input yields the very same [`NodeId`].

use crate::graph::{ConstValue, Frame, Graph, Node, NodeId, Op, Stack};
use crate::types::Type;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Post-order rewrite of the tree under `root`.
///
/// `f` sees every node after its inputs have been rewritten. When no input
/// changed, `f` receives the original node id, not a copy. Shared subtrees
/// are visited once. Function literal bodies are skipped when
/// `exclude_fn_bodies` is set.
pub fn map_nodes<F>(graph: &mut Graph, root: NodeId, f: &mut F, exclude_fn_bodies: bool) -> NodeId
where
    F: FnMut(&mut Graph, NodeId) -> NodeId,
{
    let mut memo = HashMap::new();
    map_nodes_inner(graph, root, f, exclude_fn_bodies, &mut memo)
}

fn map_nodes_inner<F>(
    graph: &mut Graph,
    id: NodeId,
    f: &mut F,
    exclude_fn_bodies: bool,
    memo: &mut HashMap<NodeId, NodeId>,
) -> NodeId
where
    F: FnMut(&mut Graph, NodeId) -> NodeId,
{
    if let Some(done) = memo.get(&id) {
        return *done;
    }

    let rebuilt = match graph.node(id).clone() {
        Node::Output { ty, op } => {
            let mut changed = false;
            let mut inputs = IndexMap::with_capacity(op.inputs.len());
            for (name, input) in op.inputs {
                let mapped = map_nodes_inner(graph, input, f, exclude_fn_bodies, memo);
                changed |= mapped != input;
                inputs.insert(name, mapped);
            }
            if changed {
                graph.output(ty, Op::new(op.name, inputs))
            } else {
                id
            }
        }
        Node::Const {
            ty,
            val: ConstValue::Function(body),
        } if !exclude_fn_bodies => {
            let mapped = map_nodes_inner(graph, body, f, exclude_fn_bodies, memo);
            if mapped != body {
                graph.add(Node::Const {
                    ty,
                    val: ConstValue::Function(mapped),
                })
            } else {
                id
            }
        }
        _ => id,
    };

    let result = f(graph, rebuilt);
    memo.insert(id, result);
    result
}

/// Substitute call arguments into a function body.
///
/// Every `Var` named in `args` is replaced by its argument. Nested function
/// literals are entered, but names they declare as parameters are not
/// substituted inside them.
pub fn call_function(graph: &mut Graph, body: NodeId, args: &IndexMap<String, NodeId>) -> NodeId {
    if args.is_empty() {
        return body;
    }
    let mut memo = HashMap::new();
    substitute(graph, body, args, &mut memo)
}

fn substitute(
    graph: &mut Graph,
    id: NodeId,
    args: &IndexMap<String, NodeId>,
    memo: &mut HashMap<NodeId, NodeId>,
) -> NodeId {
    if let Some(done) = memo.get(&id) {
        return *done;
    }

    let result = match graph.node(id).clone() {
        Node::Var { name, .. } => args.get(&name).copied().unwrap_or(id),
        Node::Output { ty, op } => {
            let mut changed = false;
            let mut inputs = IndexMap::with_capacity(op.inputs.len());
            for (name, input) in op.inputs {
                let replaced = substitute(graph, input, args, memo);
                changed |= replaced != input;
                inputs.insert(name, replaced);
            }
            if changed {
                graph.output(ty, Op::new(op.name, inputs))
            } else {
                id
            }
        }
        Node::Const {
            ty,
            val: ConstValue::Function(inner),
        } => {
            let params: Vec<String> = match &ty {
                Type::Function { input_types, .. } => input_types.keys().cloned().collect(),
                _ => Vec::new(),
            };
            let visible: IndexMap<String, NodeId> = args
                .iter()
                .filter(|(name, _)| !params.contains(*name))
                .map(|(name, node)| (name.clone(), *node))
                .collect();
            if visible.is_empty() {
                id
            } else {
                // Shadowing changes the substitution, so inner nodes get their own memo
                let mut inner_memo = HashMap::new();
                let replaced = substitute(graph, inner, &visible, &mut inner_memo);
                if replaced != inner {
                    graph.add(Node::Const {
                        ty,
                        val: ConstValue::Function(replaced),
                    })
                } else {
                    id
                }
            }
        }
        _ => id,
    };

    memo.insert(id, result);
    result
}

/// Frame binding each parameter to a same-named variable. Resolving such a
/// binding stops at the parameter instead of recursing.
pub fn param_frame(graph: &mut Graph, params: &IndexMap<String, Type>) -> Frame {
    params
        .iter()
        .map(|(name, ty)| (name.clone(), graph.var(name.clone(), ty.clone())))
        .collect()
}

/// True if `resolved` is the parameter marker for `name`.
pub(crate) fn is_param_marker(graph: &Graph, name: &str, resolved: NodeId) -> bool {
    matches!(graph.node(resolved), Node::Var { name: bound, .. } if bound == name)
}

/// Inline every variable bound in `stack`, transitively.
///
/// Bound values are themselves dereferenced against the stack where they
/// were bound. Unbound variables and function parameters are left as they
/// are.
pub fn dereference_all_vars(graph: &mut Graph, node: NodeId, stack: &Stack) -> NodeId {
    let mut memo = HashMap::new();
    dereference(graph, node, stack, &mut memo)
}

fn dereference(graph: &mut Graph, id: NodeId, stack: &Stack, memo: &mut HashMap<NodeId, NodeId>) -> NodeId {
    if let Some(done) = memo.get(&id) {
        return *done;
    }

    let result = match graph.node(id).clone() {
        Node::Var { name, .. } => match stack.resolve(&name) {
            Some(resolved) if !is_param_marker(graph, &name, resolved.node) => {
                let mut closure_memo = HashMap::new();
                dereference(graph, resolved.node, &resolved.closure, &mut closure_memo)
            }
            _ => id,
        },
        Node::Output { ty, op } => {
            let mut changed = false;
            let mut inputs = IndexMap::with_capacity(op.inputs.len());
            for (name, input) in op.inputs {
                let inlined = dereference(graph, input, stack, memo);
                changed |= inlined != input;
                inputs.insert(name, inlined);
            }
            if changed {
                graph.output(ty, Op::new(op.name, inputs))
            } else {
                id
            }
        }
        Node::Const {
            ty,
            val: ConstValue::Function(body),
        } => {
            let frame = match &ty {
                Type::Function { input_types, .. } => param_frame(graph, input_types),
                _ => Frame::new(),
            };
            let inner = stack.push(frame);
            let mut inner_memo = HashMap::new();
            let inlined = dereference(graph, body, &inner, &mut inner_memo);
            if inlined != body {
                graph.add(Node::Const {
                    ty,
                    val: ConstValue::Function(inlined),
                })
            } else {
                id
            }
        }
        _ => id,
    };

    memo.insert(id, result);
    result
}

/// Find every node under `root` satisfying `pred`, in post-order.
pub fn find_nodes(graph: &Graph, root: NodeId, mut pred: impl FnMut(&Node) -> bool) -> Vec<NodeId> {
    graph
        .post_order(root)
        .into_iter()
        .filter(|id| pred(graph.node(*id)))
        .collect()
}

/// Follow first inputs from `node` upwards, yielding each ancestor.
pub fn chain_ancestors(graph: &Graph, node: NodeId) -> Vec<NodeId> {
    let mut chain = Vec::new();
    let mut current = graph.node(node).as_op().and_then(Op::first_input);
    while let Some(id) = current {
        chain.push(id);
        current = graph.node(id).as_op().and_then(Op::first_input);
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(graph: &mut Graph, name: &str, inputs: &[(&str, NodeId)]) -> NodeId {
        let inputs = inputs.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        graph.output(Type::number(), Op::new(name, inputs))
    }

    fn args(pairs: &[(&str, NodeId)]) -> IndexMap<String, NodeId> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_map_nodes_identity_returns_same_node() {
        let mut graph = Graph::new();
        let x = graph.var("x", Type::number());
        let one = graph.const_int(1);
        let sum = op(&mut graph, "number-add", &[("lhs", x), ("rhs", one)]);
        let lambda = graph.lambda([("x", Type::number())], sum);
        let before = graph.len();
        assert_eq!(map_nodes(&mut graph, lambda, &mut |_, id| id, false), lambda);
        assert_eq!(graph.len(), before);
    }

    #[test]
    fn test_map_nodes_rebuilds_changed_path_only() {
        let mut graph = Graph::new();
        let a = graph.const_int(1);
        let b = graph.const_int(2);
        let lhs = op(&mut graph, "number-negate", &[("val", a)]);
        let sum = op(&mut graph, "number-add", &[("lhs", lhs), ("rhs", b)]);
        let replacement = graph.const_int(3);
        let mapped = map_nodes(
            &mut graph,
            sum,
            &mut |_, id| if id == b { replacement } else { id },
            false,
        );
        assert_ne!(mapped, sum);
        let new_op = graph.node(mapped).as_op().unwrap();
        assert_eq!(new_op.inputs["lhs"], lhs);
        assert_eq!(new_op.inputs["rhs"], replacement);
    }

    #[test]
    fn test_map_nodes_can_skip_function_bodies() {
        let mut graph = Graph::new();
        let row = graph.var("row", Type::number());
        let lambda = graph.lambda([("row", Type::number())], row);
        let mut seen = Vec::new();
        map_nodes(&mut graph, lambda, &mut |_, id| { seen.push(id); id }, true);
        assert_eq!(seen, vec![lambda]);
    }

    #[test]
    fn test_call_function_substitutes_args() {
        let mut graph = Graph::new();
        let x = graph.var("x", Type::number());
        let one = graph.const_int(1);
        let body = op(&mut graph, "number-add", &[("lhs", x), ("rhs", one)]);
        let five = graph.const_int(5);
        let called = call_function(&mut graph, body, &args(&[("x", five)]));
        assert_eq!(graph.node(called).as_op().unwrap().inputs["lhs"], five);
    }

    #[test]
    fn test_call_function_without_match_is_unchanged() {
        let mut graph = Graph::new();
        let y = graph.var("y", Type::number());
        let five = graph.const_int(5);
        assert_eq!(call_function(&mut graph, y, &args(&[("x", five)])), y);
    }

    #[test]
    fn test_call_function_respects_shadowing() {
        let mut graph = Graph::new();
        let inner_x = graph.var("x", Type::number());
        let inner_lambda = graph.lambda([("x", Type::number())], inner_x);
        let outer_x = graph.var("x", Type::number());
        let body = op(&mut graph, "apply", &[("fn", inner_lambda), ("val", outer_x)]);

        let five = graph.const_int(5);
        let called = call_function(&mut graph, body, &args(&[("x", five)]));
        let applied = graph.node(called).as_op().unwrap();
        assert_eq!(applied.inputs["val"], five);
        assert_eq!(applied.inputs["fn"], inner_lambda);
    }

    #[test]
    fn test_call_function_enters_lambdas_for_free_names() {
        let mut graph = Graph::new();
        let row = graph.var("row", Type::number());
        let k = graph.var("k", Type::number());
        let sum = op(&mut graph, "number-add", &[("lhs", row), ("rhs", k)]);
        let lambda = graph.lambda([("row", Type::number())], sum);
        let two = graph.const_int(2);
        let called = call_function(&mut graph, lambda, &args(&[("k", two)]));
        let (body, _) = graph.node(called).as_function_literal().unwrap();
        let inputs = &graph.node(body).as_op().unwrap().inputs;
        assert_eq!(inputs["lhs"], row);
        assert_eq!(inputs["rhs"], two);
    }

    #[test]
    fn test_dereference_follows_closures() {
        let mut graph = Graph::new();
        let one = graph.const_int(1);
        let y = graph.var("y", Type::number());
        let x_value = op(&mut graph, "number-add", &[("lhs", y), ("rhs", one)]);
        let ten = graph.const_int(10);
        let outer: Frame = args(&[("y", ten)]);
        let inner: Frame = args(&[("x", x_value), ("y", one)]);
        let stack = Stack::new().push(outer).push(inner);

        let x = graph.var("x", Type::number());
        let inlined = dereference_all_vars(&mut graph, x, &stack);
        // y inside x's value resolves where x was bound, not at the use site
        assert_eq!(graph.node(inlined).as_op().unwrap().inputs["lhs"], ten);
        assert!(graph.is_executable(inlined));
    }

    #[test]
    fn test_dereference_stops_at_param_marker() {
        let mut graph = Graph::new();
        let mut params = IndexMap::new();
        params.insert("row".to_string(), Type::number());
        let frame = param_frame(&mut graph, &params);
        let stack = Stack::new().push(frame);
        let row = graph.var("row", Type::number());
        assert_eq!(dereference_all_vars(&mut graph, row, &stack), row);
    }

    #[test]
    fn test_dereference_does_not_capture_lambda_params() {
        let mut graph = Graph::new();
        let ten = graph.const_int(10);
        let stack = Stack::new().push(args(&[("row", ten)]));
        let row = graph.var("row", Type::number());
        let lambda = graph.lambda([("row", Type::number())], row);
        assert_eq!(dereference_all_vars(&mut graph, lambda, &stack), lambda);
    }

    #[test]
    fn test_chain_ancestors() {
        let mut graph = Graph::new();
        let a = graph.const_int(1);
        let neg = op(&mut graph, "number-negate", &[("val", a)]);
        let abs = op(&mut graph, "number-abs", &[("val", neg)]);
        assert_eq!(chain_ancestors(&graph, abs), vec![neg, a]);
        assert_eq!(find_nodes(&graph, abs, |n| n.op_name().is_some()), vec![neg, abs]);
    }
}
