//! `get`: load a stored object by URI
//!
//! The type of a stored object is only known to the backend, so `get`
//! declares `unknown` and asks the executor for the real type during
//! refinement.

use async_trait::async_trait;
use computegraph_core::opstore::RefineNodeHook;
use computegraph_core::{Executor, Graph, NodeId, OpDef, OpStore, RenderInfo, Result, Type};
use tracing::debug;

pub const GET: &str = "get";

/// Hidden op whose value is the JSON form of the type stored at a URI.
pub const REFINE_GET_TYPE: &str = "refine-get-type";

/// Resolves the output type of `get(uri)` by querying
/// `refine-get-type(uri)`.
pub struct GetTypeHook;

#[async_trait(?Send)]
impl RefineNodeHook for GetTypeHook {
    async fn refine_output_type(
        &self,
        executor: &dyn Executor,
        graph: &mut Graph,
        node: NodeId,
    ) -> anyhow::Result<Type> {
        let uri = graph
            .node(node)
            .as_op()
            .and_then(|op| op.inputs.get("uri").copied())
            .ok_or_else(|| anyhow::anyhow!("{} is not a get with a uri input", node))?;
        let type_node = executor.op_store().make_op(graph, REFINE_GET_TYPE, [("uri", uri)])?;
        let value = executor.query(graph, type_node).await?;
        let ty = Type::from_json(&value)?;
        debug!("get at {} resolved to {}", node, ty);
        Ok(ty)
    }
}

pub(crate) fn register(store: &mut OpStore) -> Result<()> {
    store.register_op(
        OpDef::new(REFINE_GET_TYPE)
            .input("uri", Type::string())
            .returns(Type::type_type())
            .hidden(),
    )?;
    store.register_op(
        OpDef::new(GET)
            .arg("uri", Type::string(), "URI of the stored object")
            .returns(Type::unknown())
            .render(RenderInfo::Function)
            .refine_hook(GetTypeHook)
            .description("Loads a stored object")
            .return_description("The object stored at the URI"),
    )?;
    Ok(())
}
