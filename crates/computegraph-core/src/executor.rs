//! Query execution capability
//!
//! Refinement hooks and simplifier rules sometimes need a concrete value to
//! decide a type or prove a rewrite safe. They get it through this trait,
//! which keeps the rest of the engine free of I/O.

use crate::graph::{Graph, NodeId};
use crate::opstore::OpStore;
use async_trait::async_trait;
use serde_json::Value;

#[async_trait(?Send)]
pub trait Executor {
    /// Execute an executable node (no `Void`, no free variables) and return
    /// its value.
    async fn query(&self, graph: &Graph, node: NodeId) -> anyhow::Result<Value>;

    /// The registry ops are resolved against.
    fn op_store(&self) -> &OpStore;
}
