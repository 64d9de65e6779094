//! An executor answering queries from canned responses
//!
//! Responses are keyed by the name of the queried node's op. Used by tests
//! and by the CLI, where no backend is available.

use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use computegraph_core::{Executor, Graph, NodeId, OpStore};
use indexmap::IndexMap;
use serde_json::Value;
use std::cell::RefCell;
use tracing::debug;

#[derive(Debug, Clone)]
enum Response {
    Value(Value),
    Failure(String),
}

#[derive(Debug)]
pub struct ScriptedExecutor {
    store: OpStore,
    responses: IndexMap<String, Response>,
    queried: RefCell<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new(store: OpStore) -> Self {
        Self {
            store,
            responses: IndexMap::new(),
            queried: RefCell::new(Vec::new()),
        }
    }

    /// Load responses from a JSON object mapping op names to values.
    pub fn from_json(store: OpStore, responses: &Value) -> anyhow::Result<Self> {
        let entries = responses
            .as_object()
            .context("responses must be a JSON object keyed by op name")?;
        let mut executor = Self::new(store);
        for (op, value) in entries {
            executor = executor.respond(op, value.clone());
        }
        Ok(executor)
    }

    /// Answer queries rooted at `op` with `value`.
    pub fn respond(mut self, op: &str, value: Value) -> Self {
        self.responses.insert(op.to_string(), Response::Value(value));
        self
    }

    /// Fail queries rooted at `op`.
    pub fn fail(mut self, op: &str, message: &str) -> Self {
        self.responses
            .insert(op.to_string(), Response::Failure(message.to_string()));
        self
    }

    /// Op names of the queries made so far, in order.
    pub fn queried(&self) -> Vec<String> {
        self.queried.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Executor for ScriptedExecutor {
    async fn query(&self, graph: &Graph, node: NodeId) -> anyhow::Result<Value> {
        let op = graph
            .try_node(node)?
            .op_name()
            .ok_or_else(|| anyhow!("{} is not an op application", node))?
            .to_string();
        debug!("scripted query for '{}' at {}", op, node);
        self.queried.borrow_mut().push(op.clone());
        match self.responses.get(&op) {
            Some(Response::Value(value)) => Ok(value.clone()),
            Some(Response::Failure(message)) => bail!("query for '{}' failed: {}", op, message),
            None => bail!("no scripted response for '{}'", op),
        }
    }

    fn op_store(&self) -> &OpStore {
        &self.store
    }
}
