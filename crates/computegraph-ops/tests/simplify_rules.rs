//! Simplifier rewrites against the standard op catalogue

use computegraph_core::opstore::names;
use computegraph_core::{
    simplify, ConstValue, Executor, Graph, GraphBuilder, Node, NodeId, OpStore, Simplifier, SimplifyConfig, StoreConfig, Type,
};
use computegraph_ops::{standard_op_store, ScriptedExecutor, GROUP_KEY};
use serde_json::{json, Value};

fn store() -> OpStore {
    standard_op_store(&StoreConfig::default()).unwrap()
}

fn const_json(graph: &Graph, node: NodeId) -> Option<&Value> {
    match graph.node(node) {
        Node::Const {
            val: ConstValue::Json(val),
            ..
        } => Some(val),
        _ => None,
    }
}

fn input(graph: &Graph, node: NodeId, name: &str) -> NodeId {
    graph.node(node).as_op().unwrap().inputs[name]
}

/// `index(<wrapper>(arr, k), i)`, returning `(arr, node)`.
fn index_of_wrapped(store: &OpStore, wrapper: &str, k: i64, i: i64) -> (Graph, NodeId, NodeId) {
    let mut b = GraphBuilder::new(store);
    let arr = b.const_json(json!([10, 20, 30, 40, 50, 60]));
    let k = b.const_int(k);
    let wrapped = b.op(wrapper, &[(names::ARR_INPUT, arr), (wrapper, k)]).unwrap();
    let i = b.const_int(i);
    let node = b.op(names::INDEX, &[(names::ARR_INPUT, wrapped), (names::INDEX_INPUT, i)]).unwrap();
    (b.finish(), arr, node)
}

/// `index(groupby(rows, row => <key>), i)` where the key is built by `key_fn`.
fn index_of_groupby(
    store: &OpStore,
    i: i64,
    key_fn: impl FnOnce(&mut GraphBuilder<'_>, NodeId) -> NodeId,
) -> (Graph, NodeId, NodeId) {
    let mut b = GraphBuilder::new(store);
    let rows = b.const_json(json!([{"color": "red", "n": 1}, {"color": "blue", "n": 2}]));
    let row = b.var("row", Type::any());
    let key = key_fn(&mut b, row);
    let group_fn = b.lambda(&[("row", Type::any())], key);
    let groups = b.op(names::GROUPBY, &[(names::ARR_INPUT, rows), ("groupByFn", group_fn)]).unwrap();
    let i = b.const_int(i);
    let node = b.op(names::INDEX, &[(names::ARR_INPUT, groups), (names::INDEX_INPUT, i)]).unwrap();
    (b.finish(), rows, node)
}

fn pick(b: &mut GraphBuilder<'_>, obj: NodeId, key: &str) -> NodeId {
    let key = b.const_string(key);
    b.op(names::PICK, &[("obj", obj), ("key", key)]).unwrap()
}

#[tokio::test]
async fn test_index_of_limit_within_bounds() {
    let executor = ScriptedExecutor::new(store());
    let (mut graph, arr, node) = index_of_wrapped(executor.op_store(), names::LIMIT, 5, 2);
    let simplified = simplify(&executor, &mut graph, node).await.unwrap();

    assert_eq!(graph.node(simplified).op_name(), Some(names::INDEX));
    assert_eq!(input(&graph, simplified, names::ARR_INPUT), arr);
    assert_eq!(const_json(&graph, input(&graph, simplified, names::INDEX_INPUT)), Some(&json!(2)));
}

#[tokio::test]
async fn test_index_past_limit_unchanged() {
    let executor = ScriptedExecutor::new(store());
    let (mut graph, _, node) = index_of_wrapped(executor.op_store(), names::LIMIT, 1, 2);
    assert_eq!(simplify(&executor, &mut graph, node).await.unwrap(), node);
}

#[tokio::test]
async fn test_index_of_offset_shifts_position() {
    let executor = ScriptedExecutor::new(store());
    let (mut graph, arr, node) = index_of_wrapped(executor.op_store(), names::OFFSET, 3, 1);
    let simplified = simplify(&executor, &mut graph, node).await.unwrap();

    assert_eq!(input(&graph, simplified, names::ARR_INPUT), arr);
    assert_eq!(const_json(&graph, input(&graph, simplified, names::INDEX_INPUT)), Some(&json!(4)));
}

#[tokio::test]
async fn test_index_past_huge_offset_unchanged() {
    let executor = ScriptedExecutor::new(store());
    let (mut graph, _, node) = index_of_wrapped(executor.op_store(), names::OFFSET, i64::MAX, 1);
    assert_eq!(simplify(&executor, &mut graph, node).await.unwrap(), node);
}

#[tokio::test]
async fn test_index_of_groupby_becomes_filter() {
    let executor = ScriptedExecutor::new(store()).respond(names::PICK, json!("blue"));
    let (mut graph, rows, node) = index_of_groupby(executor.op_store(), 1, |b, row| pick(b, row, "color"));
    let simplified = simplify(&executor, &mut graph, node).await.unwrap();

    assert_eq!(graph.node(simplified).op_name(), Some(names::FILTER));
    assert_eq!(input(&graph, simplified, names::ARR_INPUT), rows);
    let pred_fn = input(&graph, simplified, "filterFn");
    let (body, params) = graph.node(pred_fn).as_function_literal().unwrap();
    assert!(params.contains_key("row"));
    assert_eq!(graph.node(body).op_name(), Some(names::STRING_EQUAL));
    assert_eq!(const_json(&graph, input(&graph, body, "rhs")), Some(&json!("blue")));
    assert_eq!(executor.queried(), vec![names::PICK.to_string()]);
}

#[tokio::test]
async fn test_dict_group_key_becomes_conjunction() {
    let executor = ScriptedExecutor::new(store()).respond(names::DICT, json!({"color": "red", "n": 1}));
    let (mut graph, _, node) = index_of_groupby(executor.op_store(), 0, |b, row| {
        let color = pick(b, row, "color");
        let n = pick(b, row, "n");
        b.op(names::DICT, &[("color", color), ("n", n)]).unwrap()
    });
    let simplified = simplify(&executor, &mut graph, node).await.unwrap();

    let pred_fn = input(&graph, simplified, "filterFn");
    let (body, _) = graph.node(pred_fn).as_function_literal().unwrap();
    assert_eq!(graph.node(body).op_name(), Some(names::AND));
    let lhs = input(&graph, body, "lhs");
    let rhs = input(&graph, body, "rhs");
    assert_eq!(graph.node(lhs).op_name(), Some(names::STRING_EQUAL));
    assert_eq!(graph.node(rhs).op_name(), Some(names::NUMBER_EQUAL));
}

#[tokio::test]
async fn test_failed_group_key_query_skips_rewrite() {
    let executor = ScriptedExecutor::new(store()).fail(names::PICK, "backend unavailable");
    let (mut graph, _, node) = index_of_groupby(executor.op_store(), 0, |b, row| pick(b, row, "color"));
    assert_eq!(simplify(&executor, &mut graph, node).await.unwrap(), node);
}

#[tokio::test]
async fn test_tag_getter_blocks_simplification() {
    let executor = ScriptedExecutor::new(store()).respond(names::PICK, json!("red"));
    let (mut graph, _, node) = index_of_groupby(executor.op_store(), 0, |b, row| pick(b, row, "color"));
    let getter = executor
        .op_store()
        .make_op(&mut graph, GROUP_KEY, [("obj", node)])
        .unwrap();

    assert_eq!(simplify(&executor, &mut graph, getter).await.unwrap(), getter);
    assert!(executor.queried().is_empty());
}

#[tokio::test]
async fn test_artifact_index_becomes_project_lookup() {
    let executor = ScriptedExecutor::new(store()).respond(names::ARTIFACT_NAME, json!("model"));
    let mut b = GraphBuilder::new(executor.op_store());
    let entity = b.const_string("acme");
    let name = b.const_string("vision");
    let project = b.op("root-project", &[("entityName", entity), ("projectName", name)]).unwrap();
    let artifacts = b.op("project-artifacts", &[("project", project)]).unwrap();
    let zero = b.const_int(0);
    let node = b.op(names::INDEX, &[(names::ARR_INPUT, artifacts), (names::INDEX_INPUT, zero)]).unwrap();
    let mut graph = b.finish();

    let simplified = simplify(&executor, &mut graph, node).await.unwrap();
    assert_eq!(graph.node(simplified).op_name(), Some(names::PROJECT_ARTIFACT));
    assert_eq!(input(&graph, simplified, "project"), project);
    assert_eq!(const_json(&graph, input(&graph, simplified, "artifactName")), Some(&json!("model")));
}

#[tokio::test]
async fn test_artifact_version_index_splits_name_and_alias() {
    let executor = ScriptedExecutor::new(store()).respond(names::ARTIFACT_VERSION_NAME, json!("model:v3"));
    let mut b = GraphBuilder::new(executor.op_store());
    let entity = b.const_string("acme");
    let name = b.const_string("vision");
    let project = b.op("root-project", &[("entityName", entity), ("projectName", name)]).unwrap();
    let artifacts = b.op("project-artifacts", &[("project", project)]).unwrap();
    let zero = b.const_int(0);
    let artifact = b.op(names::INDEX, &[(names::ARR_INPUT, artifacts), (names::INDEX_INPUT, zero)]).unwrap();
    let versions = b.op("artifact-versions", &[("artifact", artifact)]).unwrap();
    let three = b.const_int(3);
    let node = b.op(names::INDEX, &[(names::ARR_INPUT, versions), (names::INDEX_INPUT, three)]).unwrap();
    let mut graph = b.finish();

    let simplified = simplify(&executor, &mut graph, node).await.unwrap();
    assert_eq!(graph.node(simplified).op_name(), Some(names::PROJECT_ARTIFACT_VERSION));
    assert_eq!(input(&graph, simplified, "project"), project);
    assert_eq!(const_json(&graph, input(&graph, simplified, "artifactName")), Some(&json!("model")));
    assert_eq!(
        const_json(&graph, input(&graph, simplified, "artifactVersionAlias")),
        Some(&json!("v3"))
    );
}

#[tokio::test]
async fn test_rewrite_budget_is_respected() {
    let executor = ScriptedExecutor::new(store());
    let (mut graph, _, node) = index_of_wrapped(executor.op_store(), names::LIMIT, 5, 2);
    let simplifier = Simplifier::new(&executor).with_config(SimplifyConfig {
        enabled: true,
        max_rewrites_per_node: 1,
    });
    let simplified = simplifier.simplify(&mut graph, node).await.unwrap();
    assert_eq!(graph.node(simplified).op_name(), Some(names::INDEX));
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_limit_rewrite_only_within_bounds(k in 0i64..8, i in 0i64..8) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let executor = ScriptedExecutor::new(store());
            let (mut graph, arr, node) = index_of_wrapped(executor.op_store(), names::LIMIT, k, i);
            let simplified = runtime.block_on(simplify(&executor, &mut graph, node)).unwrap();
            if k > i {
                prop_assert_eq!(input(&graph, simplified, names::ARR_INPUT), arr);
            } else {
                prop_assert_eq!(simplified, node);
            }
        }
    }
}
