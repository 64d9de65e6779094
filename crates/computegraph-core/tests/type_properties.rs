//! Algebraic properties of the type system and graph rewriting

use computegraph_core::{is_assignable_to, map_nodes, maybe, tagged_value, union, Graph, NodeId, SimpleType, Type};
use proptest::prelude::*;

fn simple() -> impl Strategy<Value = Type> {
    prop::sample::select(SimpleType::ALL.to_vec()).prop_map(Type::simple)
}

fn any_type() -> impl Strategy<Value = Type> {
    simple().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(Type::list),
            inner.clone().prop_map(Type::dict),
            prop::collection::vec(inner.clone(), 1..4).prop_map(|members| union(members)),
            (inner.clone(), inner.clone()).prop_map(|(tag, value)| tagged_value(tag, value)),
            prop::collection::vec(("[a-d]", inner.clone()), 0..3).prop_map(|props| Type::typed_dict(props)),
            (inner.clone(), inner).prop_map(|(arg, out)| Type::function([("row", arg)], out)),
        ]
    })
}

proptest! {
    #[test]
    fn prop_assignability_is_reflexive(ty in any_type()) {
        prop_assert!(is_assignable_to(&ty, &ty), "{} not assignable to itself", ty);
    }

    #[test]
    fn prop_union_is_idempotent(members in prop::collection::vec(any_type(), 1..5)) {
        let once = union(members);
        let twice = union([once.clone()]);
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn prop_maybe_is_idempotent(ty in any_type()) {
        let once = maybe(ty);
        prop_assert_eq!(maybe(once.clone()), once);
    }

    #[test]
    fn prop_everything_is_assignable_to_any(ty in any_type()) {
        prop_assert!(is_assignable_to(&ty, &Type::any()));
    }

    #[test]
    fn prop_map_nodes_identity_keeps_root(depth in 1usize..12) {
        let mut graph = Graph::new();
        let mut node = graph.const_int(0);
        for i in 0..depth {
            let rhs = graph.const_int(i as i64);
            node = graph.output(
                Type::number(),
                computegraph_core::Op::new(
                    "number-add",
                    [("lhs".to_string(), node), ("rhs".to_string(), rhs)].into_iter().collect(),
                ),
            );
        }
        let before = graph.len();
        let mapped = map_nodes(&mut graph, node, &mut |_: &mut Graph, id: NodeId| id, false);
        prop_assert_eq!(mapped, node);
        prop_assert_eq!(graph.len(), before);
    }
}

#[test]
fn test_typed_dict_width_subtyping() {
    let wide = Type::typed_dict([("a", Type::number())]);
    let empty = Type::typed_dict::<String>([]);
    assert!(is_assignable_to(&wide, &empty));
    assert!(!is_assignable_to(&empty, &wide));
}

#[test]
fn test_numeric_aliases_cross_assign() {
    for a in [Type::int(), Type::float(), Type::number()] {
        for b in [Type::int(), Type::float(), Type::number()] {
            assert!(is_assignable_to(&a, &b));
        }
    }
}

#[test]
fn test_tagged_value_assignable_to_untagged() {
    let tagged = tagged_value(Type::simple(SimpleType::Run), Type::string());
    assert!(is_assignable_to(&tagged, &Type::string()));
    assert!(!is_assignable_to(&Type::string(), &tagged));
}
