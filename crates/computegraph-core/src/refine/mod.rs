//! Refinement: assigning concrete types to an editing-time graph
//!
//! Refinement walks a node tree and rebuilds each node with the type its
//! inputs actually imply. It never fails on type errors: a node whose inputs
//! do not fit its op is rebuilt with type `invalid`, an unknown op is left
//! alone, and an unbound variable keeps its type. The only errors it returns
//! come from executor queries made by custom refine hooks, or from op
//! expansions.
//!
//! Results are memoized in a [`RefineCache`] keyed by node handle. Unchanged
//! nodes come back with their original handle, which makes refinement of an
//! already refined graph a no-op.

mod cache;
mod expand;
mod higher_order;

pub use cache::RefineCache;
pub use expand::{contains_generated, expand_all};
pub use higher_order::INDEX_PARAM;

use crate::callers::{call_function, dereference_all_vars, is_param_marker, param_frame};
use crate::config::RefineConfig;
use crate::error::Result;
use crate::executor::Executor;
use crate::graph::{ConstValue, Graph, Node, NodeId, Op, Stack};
use crate::opstore::{names, OpDef, OpStore};
use crate::types::{is_assignable_to, is_nullable, Type};
use indexmap::IndexMap;
use tracing::{debug, warn};

/// Refine `node` against `stack`, sharing `cache` with the caller.
pub async fn refine_editing_node(
    executor: &dyn Executor,
    graph: &mut Graph,
    node: NodeId,
    stack: &Stack,
    cache: &mut RefineCache,
) -> Result<NodeId> {
    Refiner::new(executor).refine(graph, node, stack, cache).await
}

/// Refinement engine bound to an executor.
pub struct Refiner<'e> {
    executor: &'e dyn Executor,
    config: RefineConfig,
}

impl<'e> Refiner<'e> {
    pub fn new(executor: &'e dyn Executor) -> Self {
        Self {
            executor,
            config: RefineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RefineConfig) -> Self {
        self.config = config;
        self
    }

    fn store(&self) -> &'e OpStore {
        self.executor.op_store()
    }

    pub async fn refine(
        &self,
        graph: &mut Graph,
        node: NodeId,
        stack: &Stack,
        cache: &mut RefineCache,
    ) -> Result<NodeId> {
        if let Some(hit) = cache.get(node) {
            return Ok(hit);
        }
        let refined = match graph.node(node).clone() {
            // Function literal bodies are refined by the op that receives them
            Node::Void | Node::Const { .. } => node,
            Node::Var { name, ty } => self.refine_var(graph, node, &name, &ty, stack).await?,
            Node::Output { ty, op } => self.refine_output(graph, node, &ty, op, stack, cache).await?,
        };
        cache.insert(node, refined);
        Ok(refined)
    }

    async fn refine_var(
        &self,
        graph: &mut Graph,
        node: NodeId,
        name: &str,
        ty: &Type,
        stack: &Stack,
    ) -> Result<NodeId> {
        let Some(resolved) = stack.resolve(name) else {
            return Ok(node);
        };

        let bound_ty = if is_param_marker(graph, name, resolved.node) {
            graph.ty(resolved.node).clone()
        } else {
            // The binding is typed under its own scope, not the use site's
            let mut closure_cache = RefineCache::new();
            let bound = Box::pin(self.refine(graph, resolved.node, &resolved.closure, &mut closure_cache)).await?;
            match graph.node(bound) {
                Node::Const {
                    ty,
                    val: ConstValue::Json(val),
                } if !ty.is_const() && !ty.is_function() => Type::constant(ty.clone(), val.clone()),
                other => other.ty().clone(),
            }
        };

        if bound_ty == *ty {
            Ok(node)
        } else {
            Ok(graph.var(name, bound_ty))
        }
    }

    async fn refine_output(
        &self,
        graph: &mut Graph,
        node: NodeId,
        ty: &Type,
        op: Op,
        stack: &Stack,
        cache: &mut RefineCache,
    ) -> Result<NodeId> {
        let store = self.store();
        let Some(def) = store.get(&op.name) else {
            warn!("unknown op '{}' during refinement, leaving {} unchanged", op.name, node);
            return Ok(node);
        };

        let mut inputs: IndexMap<String, NodeId> = IndexMap::with_capacity(op.inputs.len());
        for (name, input) in &op.inputs {
            let refined = if graph.node(*input).as_function_literal().is_some() {
                self.refine_function_arg(graph, def, name, *input, &inputs, stack).await?
            } else {
                Box::pin(self.refine(graph, *input, stack, cache)).await?
            };
            inputs.insert(name.clone(), refined);
        }

        if !inputs_valid(graph, def, &inputs, stack) {
            debug!("inputs of '{}' at {} do not fit its signature", op.name, node);
            return Ok(rebuild(graph, node, ty, &op, inputs, Type::invalid()));
        }

        let output_ty = if let Some(body) = &def.body {
            let body_root = graph.import(&body.graph, body.root);
            // Absent nullable inputs are passed as none so the body has no free params
            let mut args = inputs.clone();
            for name in def.input_types.keys() {
                if !args.contains_key(name) {
                    let none = graph.const_none();
                    args.insert(name.clone(), none);
                }
            }
            let expanded = call_function(graph, body_root, &args);
            let mut body_cache = RefineCache::new();
            let refined = Box::pin(self.refine(graph, expanded, stack, &mut body_cache)).await?;
            graph.ty(refined).clone()
        } else if def.is_generated() {
            let applied = graph.output(ty.clone(), Op::new(op.name.clone(), inputs.clone()));
            let expanded = expand_all(store, graph, applied, self.config.max_expansion_depth)?;
            let mut expansion_cache = RefineCache::new();
            let refined = Box::pin(self.refine(graph, expanded, stack, &mut expansion_cache)).await?;
            graph.ty(refined).clone()
        } else if let Some(hook) = def.refine_node.clone() {
            let declared = store.determine_output_type(def, &store.input_types_of(graph, &inputs));
            let applied = graph.output(declared.clone(), Op::new(op.name.clone(), inputs.clone()));
            let executable = dereference_all_vars(graph, applied, stack);
            if graph.is_executable(executable) {
                hook.refine_output_type(self.executor, graph, executable).await?
            } else {
                debug!("'{}' at {} is not executable, skipping its refine hook", op.name, node);
                declared
            }
        } else {
            store.determine_output_type(def, &store.input_types_of(graph, &inputs))
        };

        Ok(rebuild(graph, node, ty, &op, inputs, output_ty))
    }

    /// Refine a lambda passed as input `input_name`, typing its parameters
    /// from the op signature or, for higher-order ops, from a list input.
    async fn refine_function_arg(
        &self,
        graph: &mut Graph,
        def: &OpDef,
        input_name: &str,
        literal: NodeId,
        refined_inputs: &IndexMap<String, NodeId>,
        stack: &Stack,
    ) -> Result<NodeId> {
        let Some((body, params)) = graph
            .node(literal)
            .as_function_literal()
            .map(|(body, params)| (body, params.clone()))
        else {
            return Ok(literal);
        };

        let param_types = if names::is_higher_order(&def.name) {
            higher_order::param_types(
                self.store(),
                graph,
                &def.name,
                input_name,
                &params,
                refined_inputs,
                stack,
            )
        } else if let Some(Type::Function { input_types, .. }) = def.input_types.get(input_name) {
            params
                .iter()
                .map(|(name, ty)| (name.clone(), input_types.get(name).cloned().unwrap_or_else(|| ty.clone())))
                .collect()
        } else {
            params
        };

        let frame = param_frame(graph, &param_types);
        let inner = stack.push(frame);
        // The body sees a different stack than the rest of the graph
        let mut body_cache = RefineCache::new();
        let refined_body = Box::pin(self.refine(graph, body, &inner, &mut body_cache)).await?;

        let fn_ty = Type::Function {
            input_types: param_types,
            output_type: Box::new(graph.ty(refined_body).clone()),
        };
        if refined_body == body && *graph.ty(literal) == fn_ty {
            Ok(literal)
        } else {
            Ok(graph.add(Node::Const {
                ty: fn_ty,
                val: ConstValue::Function(refined_body),
            }))
        }
    }
}

/// Every declared input must be present (or nullable), not a hole, and
/// assignable to its declared type. Unresolved variables are not checked.
fn inputs_valid(graph: &Graph, def: &OpDef, inputs: &IndexMap<String, NodeId>, stack: &Stack) -> bool {
    def.input_types.iter().all(|(name, declared)| match inputs.get(name) {
        None => is_nullable(declared),
        Some(id) => match graph.node(*id) {
            Node::Void => false,
            Node::Var { name: var, .. } if stack.resolve(var).is_none() => true,
            other => is_assignable_to(other.ty(), declared),
        },
    })
}

/// Reuse `node` when neither inputs nor type changed.
fn rebuild(
    graph: &mut Graph,
    node: NodeId,
    ty: &Type,
    op: &Op,
    inputs: IndexMap<String, NodeId>,
    output_ty: Type,
) -> NodeId {
    if inputs == op.inputs && output_ty == *ty {
        node
    } else {
        graph.output(output_ty, Op::new(op.name.clone(), inputs))
    }
}
