//! List ops that take function literals
//!
//! Lambdas passed to these ops get their parameter types from the list they
//! iterate over during refinement, so the declared parameter types here are
//! only placeholders.

use crate::literals::pick_type;
use computegraph_core::opstore::names;
use computegraph_core::refine::INDEX_PARAM;
use computegraph_core::types::{list_object_type, non_none};
use computegraph_core::{maybe, tagged_value, Graph, NodeId, OpDef, OpStore, Result, Type};
use indexmap::IndexMap;
use serde_json::Value;

/// Key of the tag attached to each group produced by `groupby`.
pub(crate) const GROUP_KEY_PROP: &str = "groupKey";

fn row_fn(output: Type) -> Type {
    Type::function([("row", Type::any()), (INDEX_PARAM, Type::number())], output)
}

fn list_input() -> Type {
    maybe(Type::list(Type::any()))
}

fn element_of(arr: Option<&Type>) -> Type {
    arr.map(|ty| list_object_type(&non_none(ty)))
        .unwrap_or_else(Type::unknown)
}

fn fn_output(inputs: &IndexMap<String, Type>, name: &str) -> Type {
    match inputs.get(name) {
        Some(Type::Function { output_type, .. }) => (**output_type).clone(),
        _ => Type::unknown(),
    }
}

fn const_str<'a>(inputs: &'a IndexMap<String, Type>, name: &str) -> Option<&'a str> {
    inputs.get(name).and_then(Type::const_value).and_then(Value::as_str)
}

fn const_true(inputs: &IndexMap<String, Type>, name: &str) -> bool {
    inputs
        .get(name)
        .and_then(Type::const_value)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// `map(arr, row => pick(row, key))`
fn expand_pluck(store: &OpStore, graph: &mut Graph, inputs: &IndexMap<String, NodeId>) -> Result<NodeId> {
    let arr = match inputs.get(names::ARR_INPUT) {
        Some(arr) => *arr,
        None => graph.void(),
    };
    let key = match inputs.get("key") {
        Some(key) => *key,
        None => graph.void(),
    };
    let row_ty = list_object_type(&non_none(graph.ty(arr)));
    let row = graph.var("row", row_ty.clone());
    let picked = store.make_op_positional(graph, names::PICK, &[row, key])?;
    let pick_fn = graph.lambda([("row", row_ty)], picked);
    store.make_op_positional(graph, names::MAP, &[arr, pick_fn])
}

pub(crate) fn register(store: &mut OpStore) -> Result<()> {
    store.register_op(
        OpDef::new(names::MAP)
            .arg(names::ARR_INPUT, list_input(), "The list to map over")
            .arg("mapFn", row_fn(Type::any()), "Function applied to each element")
            .computed(|inputs| Type::list(fn_output(inputs, "mapFn")))
            .description("Applies a function to every element of a list")
            .return_description("The list of results"),
    )?;

    store.register_op(
        OpDef::new(names::FILTER)
            .arg(names::ARR_INPUT, list_input(), "The list to filter")
            .arg("filterFn", row_fn(maybe(Type::boolean())), "Predicate deciding which elements to keep")
            .computed(|inputs| {
                inputs
                    .get(names::ARR_INPUT)
                    .map(|ty| ty.unwrap_const().clone())
                    .unwrap_or_else(Type::unknown)
            })
            .description("Keeps the elements of a list for which a predicate holds")
            .return_description("The matching elements, in order"),
    )?;

    store.register_op(
        OpDef::new(names::SORT)
            .arg(names::ARR_INPUT, list_input(), "The list to sort")
            .arg("compFn", row_fn(Type::any()), "Function producing the sort key of an element")
            .computed(|inputs| {
                inputs
                    .get(names::ARR_INPUT)
                    .map(|ty| ty.unwrap_const().clone())
                    .unwrap_or_else(Type::unknown)
            })
            .description("Sorts a list by a key")
            .return_description("The elements ordered by key"),
    )?;

    store.register_op(
        OpDef::new(names::GROUPBY)
            .arg(names::ARR_INPUT, list_input(), "The list to group")
            .arg("groupByFn", row_fn(Type::any()), "Function producing the group key of an element")
            .computed(|inputs| {
                let row = element_of(inputs.get(names::ARR_INPUT));
                let key = fn_output(inputs, "groupByFn");
                Type::list(tagged_value(
                    Type::typed_dict([(GROUP_KEY_PROP, key)]),
                    Type::list(row),
                ))
            })
            .description("Groups the elements of a list by key")
            .return_description("One list per distinct key, tagged with that key"),
    )?;

    store.register_op(
        OpDef::new(names::JOIN)
            .arg("arr1", list_input(), "The left list")
            .arg("arr2", list_input(), "The right list")
            .arg("join1Fn", row_fn(Type::any()), "Join key of a left element")
            .arg("join2Fn", row_fn(Type::any()), "Join key of a right element")
            .arg("alias1", maybe(Type::string()), "Property holding the left element")
            .arg("alias2", maybe(Type::string()), "Property holding the right element")
            .arg("leftOuter", maybe(Type::boolean()), "Keep left elements without a match")
            .arg("rightOuter", maybe(Type::boolean()), "Keep right elements without a match")
            .computed(|inputs| {
                let mut left = element_of(inputs.get("arr1"));
                let mut right = element_of(inputs.get("arr2"));
                if const_true(inputs, "rightOuter") {
                    left = maybe(left);
                }
                if const_true(inputs, "leftOuter") {
                    right = maybe(right);
                }
                let alias1 = const_str(inputs, "alias1").unwrap_or("0").to_string();
                let alias2 = const_str(inputs, "alias2").unwrap_or("1").to_string();
                Type::list(Type::typed_dict([(alias1, left), (alias2, right)]))
            })
            .description("Pairs the elements of two lists whose join keys are equal")
            .return_description("One dict per matching pair"),
    )?;

    store.register_op(
        OpDef::new(names::JOIN_ALL)
            .arg("arrs", maybe(Type::list(list_input())), "The lists to join")
            .arg("joinFn", row_fn(Type::any()), "Join key of an element")
            .arg("outer", maybe(Type::boolean()), "Keep keys missing from some lists")
            .computed(|inputs| {
                let inner = element_of(inputs.get("arrs"));
                let mut row = list_object_type(&non_none(&inner));
                if const_true(inputs, "outer") {
                    row = maybe(row);
                }
                Type::list(Type::list(row))
            })
            .description("Joins any number of lists on a shared key")
            .return_description("For each key, the matching element of every list"),
    )?;

    store.register_op(
        OpDef::new("list-pluck")
            .arg(names::ARR_INPUT, list_input(), "A list of dicts")
            .arg("key", Type::string(), "The key to read from each dict")
            .computed(|inputs| match inputs.get("key") {
                Some(key) => Type::list(pick_type(&element_of(inputs.get(names::ARR_INPUT)), key)),
                None => Type::unknown(),
            })
            .expansion(expand_pluck)
            .description("Reads one key from every dict in a list")
            .return_description("The values under the key"),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use computegraph_core::StoreConfig;
    use serde_json::json;

    #[test]
    fn test_groupby_output_is_tagged_groups() {
        let store = crate::standard_op_store(&StoreConfig::default()).unwrap();
        let row_ty = Type::typed_dict([("color", Type::string())]);
        let mut graph = Graph::new();
        let arr = graph.constant(Type::list(row_ty.clone()), json!([{"color": "red"}]));
        let row = graph.var("row", row_ty.clone());
        let key = graph.const_string("color");
        let picked = store.make_op_positional(&mut graph, names::PICK, &[row, key]).unwrap();
        let group_fn = graph.lambda([("row", row_ty.clone())], picked);
        let grouped = store.make_op_positional(&mut graph, names::GROUPBY, &[arr, group_fn]).unwrap();

        let expected = Type::list(tagged_value(
            Type::typed_dict([(GROUP_KEY_PROP, Type::string())]),
            Type::list(row_ty),
        ));
        assert_eq!(*graph.ty(grouped), expected);
    }

    #[test]
    fn test_join_uses_constant_aliases() {
        let store = crate::standard_op_store(&StoreConfig::default()).unwrap();
        let mut graph = Graph::new();
        let a = graph.constant(Type::list(Type::number()), json!([1]));
        let b = graph.constant(Type::list(Type::string()), json!(["x"]));
        let row1 = graph.var("row", Type::number());
        let fn1 = graph.lambda([("row", Type::number())], row1);
        let row2 = graph.var("row", Type::string());
        let fn2 = graph.lambda([("row", Type::string())], row2);
        let left = graph.const_string("n");
        let right = graph.const_string("s");
        let joined = store
            .make_op_positional(&mut graph, names::JOIN, &[a, b, fn1, fn2, left, right])
            .unwrap();
        assert_eq!(
            *graph.ty(joined),
            Type::list(Type::typed_dict([("n", Type::number()), ("s", Type::string())]))
        );
    }
}
