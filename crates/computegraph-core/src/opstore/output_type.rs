//! Output type resolution
//!
//! `Static` and `Computed` modes are plain values and closures. The
//! `GraphComputed` mode runs a small synchronous evaluator over a meta graph:
//! the only free variable, `input_types`, is bound to a dict of the reified
//! input types, and every op in the meta graph must carry a meta resolver.

use super::{OpDef, OpStore, OutputTypeMode};
use crate::graph::{ConstValue, Graph, GraphFragment, Node, NodeId};
use crate::types::{SimpleType, Type};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Name of the variable bound to the reified input types.
pub const INPUT_TYPES_VAR: &str = "input_types";

/// A value in meta evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Json(Value),
    Type(Type),
    Dict(IndexMap<String, MetaValue>),
    List(Vec<MetaValue>),
}

impl MetaValue {
    pub fn as_type(&self) -> Option<&Type> {
        match self {
            MetaValue::Type(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::Json(Value::String(s)) => Some(s),
            _ => None,
        }
    }
}

impl OpStore {
    /// Output type of `def` applied to inputs of the given types.
    pub fn determine_output_type(&self, def: &OpDef, inputs: &IndexMap<String, Type>) -> Type {
        match &def.output_type {
            OutputTypeMode::Static(ty) => ty.clone(),
            OutputTypeMode::Computed(f) => f(inputs),
            OutputTypeMode::GraphComputed(fragment) => self.evaluate_type_graph(fragment, inputs),
        }
    }

    /// Types of the given input nodes, with plain constants coerced to
    /// `Const` types so computed output types can see literal values.
    pub fn input_types_of(&self, graph: &Graph, inputs: &IndexMap<String, NodeId>) -> IndexMap<String, Type> {
        inputs
            .iter()
            .map(|(name, id)| (name.clone(), const_coerced_type(graph.node(*id))))
            .collect()
    }

    fn evaluate_type_graph(&self, fragment: &GraphFragment, inputs: &IndexMap<String, Type>) -> Type {
        let env = MetaValue::Dict(
            inputs
                .iter()
                .map(|(name, ty)| (name.clone(), MetaValue::Type(ty.clone())))
                .collect(),
        );
        let mut evaluator = MetaEvaluator {
            store: self,
            graph: &fragment.graph,
            env: &env,
            memo: HashMap::new(),
        };
        match evaluator.eval(fragment.root) {
            Some(MetaValue::Type(ty)) => ty,
            other => {
                debug!("type graph produced {:?}, using unknown", other);
                Type::unknown()
            }
        }
    }
}

fn const_coerced_type(node: &Node) -> Type {
    match node {
        Node::Const {
            ty,
            val: ConstValue::Json(val),
        } if !ty.is_const() && !ty.is_function() => Type::constant(ty.clone(), val.clone()),
        other => other.ty().clone(),
    }
}

struct MetaEvaluator<'a> {
    store: &'a OpStore,
    graph: &'a Graph,
    env: &'a MetaValue,
    memo: HashMap<NodeId, Option<MetaValue>>,
}

impl MetaEvaluator<'_> {
    fn eval(&mut self, id: NodeId) -> Option<MetaValue> {
        if let Some(cached) = self.memo.get(&id) {
            return cached.clone();
        }
        let value = self.eval_uncached(id);
        self.memo.insert(id, value.clone());
        value
    }

    fn eval_uncached(&mut self, id: NodeId) -> Option<MetaValue> {
        match self.graph.node(id) {
            Node::Var { name, .. } if name == INPUT_TYPES_VAR => Some(self.env.clone()),
            Node::Const {
                ty,
                val: ConstValue::Json(val),
            } => {
                if ty.unwrap_const().is_simple(SimpleType::Type) {
                    Type::from_json(val).ok().map(MetaValue::Type)
                } else {
                    Some(MetaValue::Json(val.clone()))
                }
            }
            Node::Output { op, .. } => {
                let resolver = self.store.get(&op.name)?.resolver.clone()?;
                let mut args = IndexMap::with_capacity(op.inputs.len());
                for (name, input) in &op.inputs {
                    args.insert(name.clone(), self.eval(*input)?);
                }
                resolver(&args)
            }
            Node::Var { .. } | Node::Const { .. } | Node::Void => None,
        }
    }
}
