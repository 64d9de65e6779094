//! Standard op catalogue
//!
//! Each module registers one family of ops. [`standard_op_store`] builds a
//! store with all of them; the order matters only in that ops used to build
//! another op's body or type graph are registered first.

mod boolean;
mod get;
mod higher_order;
mod lists;
mod literals;
mod meta;
mod numbers;
mod project;
mod scripted;
mod strings;
mod tags;

pub use get::{GetTypeHook, GET, REFINE_GET_TYPE};
pub use literals::pick_type;
pub use scripted::ScriptedExecutor;
pub use tags::GROUP_KEY;

use computegraph_core::{OpStore, Result, StoreConfig};
use tracing::debug;

/// Build a store holding every standard op.
pub fn standard_op_store(config: &StoreConfig) -> Result<OpStore> {
    let mut store = OpStore::new(config.clone());

    meta::register(&mut store)?;
    literals::register(&mut store)?;
    numbers::register(&mut store)?;
    strings::register(&mut store)?;
    boolean::register(&mut store)?;
    lists::register(&mut store)?;
    higher_order::register(&mut store)?;
    tags::register(&mut store)?;
    project::register(&mut store)?;
    get::register(&mut store)?;

    debug!("standard op store holds {} ops", store.len());
    Ok(store)
}
