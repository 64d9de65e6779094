//! Behavior-preserving graph simplification
//!
//! Rules are applied to a node until none fires, then the pass moves on to
//! the node's inputs. Function literal bodies are left alone. Graphs that
//! read tags are never simplified, since a rewrite can change which tags a
//! value carries.

mod rules;

use crate::config::SimplifyConfig;
use crate::error::Result;
use crate::executor::Executor;
use crate::graph::{Graph, Node, NodeId, Op};
use crate::opstore::{OpKind, OpStore};
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::debug;

/// Simplify `node` with the default configuration.
pub async fn simplify(executor: &dyn Executor, graph: &mut Graph, node: NodeId) -> Result<NodeId> {
    Simplifier::new(executor).simplify(graph, node).await
}

/// True if any op under `node` reads a tag.
pub fn contains_tag_getter(store: &OpStore, graph: &Graph, node: NodeId) -> bool {
    graph.any_node(node, |_, n| {
        n.op_name()
            .and_then(|name| store.get(name))
            .is_some_and(|def| def.kind == OpKind::TagGetter)
    })
}

pub struct Simplifier<'e> {
    executor: &'e dyn Executor,
    config: SimplifyConfig,
}

impl<'e> Simplifier<'e> {
    pub fn new(executor: &'e dyn Executor) -> Self {
        Self {
            executor,
            config: SimplifyConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SimplifyConfig) -> Self {
        self.config = config;
        self
    }

    pub async fn simplify(&self, graph: &mut Graph, node: NodeId) -> Result<NodeId> {
        if !self.config.enabled {
            return Ok(node);
        }
        if contains_tag_getter(self.executor.op_store(), graph, node) {
            debug!("graph under {} reads tags, not simplifying", node);
            return Ok(node);
        }
        let mut memo = HashMap::new();
        self.simplify_node(graph, node, &mut memo).await
    }

    async fn simplify_node(
        &self,
        graph: &mut Graph,
        node: NodeId,
        memo: &mut HashMap<NodeId, NodeId>,
    ) -> Result<NodeId> {
        if let Some(done) = memo.get(&node) {
            return Ok(*done);
        }

        let mut current = node;
        for _ in 0..self.config.max_rewrites_per_node {
            match self.rewrite_once(graph, current).await? {
                Some(next) => {
                    debug!(
                        "simplified {} ({}) to {} ({})",
                        current,
                        graph.node(current).op_name().unwrap_or("?"),
                        next,
                        graph.node(next).op_name().unwrap_or("?")
                    );
                    current = next;
                }
                None => break,
            }
        }

        let result = match graph.node(current).clone() {
            Node::Output { ty, op } => {
                let mut changed = false;
                let mut inputs = IndexMap::with_capacity(op.inputs.len());
                for (name, input) in op.inputs {
                    let simplified = Box::pin(self.simplify_node(graph, input, memo)).await?;
                    changed |= simplified != input;
                    inputs.insert(name, simplified);
                }
                if changed {
                    graph.output(ty, Op::new(op.name, inputs))
                } else {
                    current
                }
            }
            _ => current,
        };

        memo.insert(node, result);
        Ok(result)
    }

    /// Apply the first rule that fires at `node`.
    async fn rewrite_once(&self, graph: &mut Graph, node: NodeId) -> Result<Option<NodeId>> {
        let store = self.executor.op_store();
        if let Some(next) = rules::index_of_limit(store, graph, node)? {
            return Ok(Some(next));
        }
        if let Some(next) = rules::index_of_offset(store, graph, node)? {
            return Ok(Some(next));
        }
        if let Some(next) = rules::index_of_groupby(self.executor, store, graph, node).await? {
            return Ok(Some(next));
        }
        rules::index_to_project_lookup(self.executor, store, graph, node).await
    }
}
