//! Read-only op queries for editors and autocompletion

use crate::graph::{Graph, NodeId};
use crate::opstore::{OpDef, OpStore, RenderInfo};
use crate::types::is_assignable_to;

/// Ops that can be chained onto `node`: non-hidden ops rendered after their
/// first argument (`node.op()`, `node + x`, `node[x]`) whose first input
/// accepts the node's type.
pub fn available_ops_for_chain<'s>(store: &'s OpStore, graph: &Graph, node: NodeId) -> Vec<&'s OpDef> {
    let ty = graph.ty(node);
    store
        .ops()
        .filter(|def| {
            !def.hidden
                && matches!(
                    def.render_info,
                    RenderInfo::Chain | RenderInfo::Binary { .. } | RenderInfo::Brackets
                )
                && def.first_input_type().is_some_and(|first| is_assignable_to(ty, first))
        })
        .collect()
}

/// Ops that could replace the op at `node` without touching its inputs:
/// same arity, and every current input is assignable to the candidate's
/// input at the same position.
pub fn valid_replacement_ops<'s>(store: &'s OpStore, graph: &Graph, node: NodeId) -> Vec<&'s OpDef> {
    let Some(op) = graph.node(node).as_op() else {
        return Vec::new();
    };
    let input_types: Vec<_> = op.inputs.values().map(|id| graph.ty(*id)).collect();
    store
        .ops()
        .filter(|def| !def.hidden && def.name != op.name && def.input_types.len() == input_types.len())
        .filter(|def| {
            def.input_types
                .values()
                .zip(&input_types)
                .all(|(declared, actual)| is_assignable_to(actual, declared))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    fn store() -> OpStore {
        let mut store = OpStore::unchecked();
        let binary = |name: &str, repr: &str, ty: Type| {
            OpDef::new(name)
                .input("lhs", ty.clone())
                .input("rhs", ty.clone())
                .returns(ty)
                .render(RenderInfo::binary(repr))
        };
        store.register_op(binary("number-add", "+", Type::number())).unwrap();
        store.register_op(binary("number-sub", "-", Type::number())).unwrap();
        store.register_op(binary("string-add", "+", Type::string())).unwrap();
        store
            .register_op(
                OpDef::new("number-abs")
                    .input("val", Type::number())
                    .returns(Type::number())
                    .render(RenderInfo::Function),
            )
            .unwrap();
        store
    }

    #[test]
    fn test_available_ops_for_chain() {
        let store = store();
        let mut graph = Graph::new();
        let n = graph.const_int(1);
        let names: Vec<&str> = available_ops_for_chain(&store, &graph, n)
            .into_iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(names, vec!["number-add", "number-sub"]);
    }

    #[test]
    fn test_valid_replacement_ops() {
        let store = store();
        let mut graph = Graph::new();
        let a = graph.const_int(1);
        let b = graph.const_int(2);
        let sum = store.make_op(&mut graph, "number-add", [("lhs", a), ("rhs", b)]).unwrap();
        let names: Vec<&str> = valid_replacement_ops(&store, &graph, sum)
            .into_iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(names, vec!["number-sub"]);
        assert!(valid_replacement_ops(&store, &graph, a).is_empty());
    }
}
