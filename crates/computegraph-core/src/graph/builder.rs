use super::{Graph, NodeId};
use crate::error::Result;
use crate::opstore::OpStore;
use crate::types::Type;
use serde_json::Value;

/// Builds a graph through an op store so op nodes get their output types at
/// construction time.
pub struct GraphBuilder<'s> {
    store: &'s OpStore,
    graph: Graph,
}

impl<'s> GraphBuilder<'s> {
    pub fn new(store: &'s OpStore) -> Self {
        Self::with_graph(store, Graph::new())
    }

    /// Continue building into an existing graph.
    pub fn with_graph(store: &'s OpStore, graph: Graph) -> Self {
        Self { store, graph }
    }

    pub fn store(&self) -> &'s OpStore {
        self.store
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn finish(self) -> Graph {
        self.graph
    }

    pub fn void(&mut self) -> NodeId {
        self.graph.void()
    }

    pub fn var(&mut self, name: &str, ty: Type) -> NodeId {
        self.graph.var(name, ty)
    }

    pub fn const_number(&mut self, n: f64) -> NodeId {
        self.graph.const_number(n)
    }

    pub fn const_int(&mut self, n: i64) -> NodeId {
        self.graph.const_int(n)
    }

    pub fn const_string(&mut self, s: &str) -> NodeId {
        self.graph.const_string(s)
    }

    pub fn const_value(&mut self, ty: Type, val: Value) -> NodeId {
        self.graph.constant(ty, val)
    }

    /// A literal whose type is inferred from the JSON value.
    pub fn const_json(&mut self, val: Value) -> NodeId {
        let ty = Type::of_json(&val);
        self.graph.constant(ty, val)
    }

    pub fn lambda(&mut self, params: &[(&str, Type)], body: NodeId) -> NodeId {
        self.graph.lambda(params.iter().map(|(k, t)| (*k, t.clone())), body)
    }

    pub fn op(&mut self, name: &str, inputs: &[(&str, NodeId)]) -> Result<NodeId> {
        self.store.make_op(&mut self.graph, name, inputs.iter().copied())
    }
}
