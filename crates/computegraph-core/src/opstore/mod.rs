//! Op registry and output-type resolution

mod display;
pub mod names;
mod opdef;
mod output_type;
mod store;

pub use display::{display_name, signatures_conflict};
pub use opdef::{
    CachePolicy, ComputedOutputFn, ExpansionFn, MetaResolverFn, OpDef, OpKind, OutputTypeMode, RefineNodeHook,
    RenderInfo,
};
pub use output_type::{MetaValue, INPUT_TYPES_VAR};
pub use store::OpStore;
