//! Positional list ops

use computegraph_core::opstore::{names, INPUT_TYPES_VAR};
use computegraph_core::types::{list_object_type, non_none};
use computegraph_core::{maybe, Graph, GraphFragment, OpDef, OpStore, RenderInfo, Result, Type};
use indexmap::IndexMap;

fn list_input() -> Type {
    maybe(Type::list(Type::any()))
}

/// Output type of ops that return a slice of their `arr` input.
fn same_as_arr(inputs: &IndexMap<String, Type>) -> Type {
    inputs
        .get(names::ARR_INPUT)
        .map(|ty| ty.unwrap_const().clone())
        .unwrap_or_else(Type::unknown)
}

/// `type-elementType(pick(input_types, "arr"))`
fn element_type_graph(store: &OpStore) -> Result<GraphFragment> {
    let mut graph = Graph::new();
    let env = graph.var(INPUT_TYPES_VAR, Type::any());
    let key = graph.const_string(names::ARR_INPUT);
    let arr_type = store.make_op_positional(&mut graph, names::PICK, &[env, key])?;
    let root = store.make_op_positional(&mut graph, "type-elementType", &[arr_type])?;
    Ok(GraphFragment::new(graph, root))
}

pub(crate) fn register(store: &mut OpStore) -> Result<()> {
    let element_type = element_type_graph(store)?;
    store.register_op(
        OpDef::new(names::INDEX)
            .arg(names::ARR_INPUT, list_input(), "The list to index into")
            .arg(names::INDEX_INPUT, maybe(Type::number()), "Zero-based position; negative counts from the end")
            .graph_computed(element_type)
            .render(RenderInfo::Brackets)
            .description("Returns the element at a position")
            .return_description("The element, or none when the position is out of range"),
    )?;

    store.register_op(
        OpDef::new("count")
            .arg(names::ARR_INPUT, list_input(), "The list to count")
            .returns(Type::number())
            .description("Number of elements in a list")
            .return_description("The element count"),
    )?;

    store.register_op(
        OpDef::new(names::LIMIT)
            .arg(names::ARR_INPUT, list_input(), "The list to truncate")
            .arg(names::LIMIT, Type::number(), "Maximum number of elements to keep")
            .computed(same_as_arr)
            .description("Keeps the first elements of a list")
            .return_description("At most `limit` leading elements"),
    )?;

    store.register_op(
        OpDef::new(names::OFFSET)
            .arg(names::ARR_INPUT, list_input(), "The list to skip into")
            .arg(names::OFFSET, Type::number(), "Number of leading elements to skip")
            .computed(same_as_arr)
            .description("Drops the first elements of a list")
            .return_description("The elements after the first `offset`"),
    )?;

    store.register_op(
        OpDef::new(names::DROPNA)
            .arg(names::ARR_INPUT, list_input(), "The list to filter")
            .computed(|inputs| match inputs.get(names::ARR_INPUT) {
                Some(arr) => Type::list(non_none(&list_object_type(&non_none(arr)))),
                None => Type::unknown(),
            })
            .description("Removes none elements from a list")
            .return_description("The list without none elements"),
    )?;

    store.register_op(
        OpDef::new("concat")
            .arg(names::ARR_INPUT, maybe(Type::list(list_input())), "A list of lists")
            .computed(|inputs| match inputs.get(names::ARR_INPUT) {
                Some(arr) => {
                    let inner = list_object_type(&non_none(arr));
                    Type::list(list_object_type(&non_none(&inner)))
                }
                None => Type::unknown(),
            })
            .description("Flattens a list of lists by one level")
            .return_description("The elements of every inner list, in order"),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use computegraph_core::StoreConfig;
    use serde_json::json;

    fn store() -> OpStore {
        crate::standard_op_store(&StoreConfig::default()).unwrap()
    }

    #[test]
    fn test_index_type_comes_from_type_graph() {
        let store = store();
        let mut graph = Graph::new();
        let arr = graph.constant(Type::list(Type::string()), json!(["a", "b"]));
        let zero = graph.const_int(0);
        let node = store.make_op_positional(&mut graph, names::INDEX, &[arr, zero]).unwrap();
        assert_eq!(*graph.ty(node), Type::string());
    }

    #[test]
    fn test_dropna_strips_none_elements() {
        let store = store();
        let mut graph = Graph::new();
        let arr = graph.constant(Type::list(maybe(Type::number())), json!([1, null]));
        let node = store.make_op_positional(&mut graph, names::DROPNA, &[arr]).unwrap();
        assert_eq!(*graph.ty(node), Type::list(Type::number()));
    }

    #[test]
    fn test_limit_keeps_list_type() {
        let store = store();
        let mut graph = Graph::new();
        let arr = graph.constant(Type::list(Type::number()), json!([1, 2, 3]));
        let two = graph.const_int(2);
        let node = store.make_op_positional(&mut graph, names::LIMIT, &[arr, two]).unwrap();
        assert_eq!(*graph.ty(node), Type::list(Type::number()));
    }
}
