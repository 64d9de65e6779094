//! Typed compute graphs
//!
//! Expressions over nested and columnar data are built as trees of op
//! applications. This crate provides the pieces needed before anything runs:
//!
//! - [`types`]: the structural type system (subtyping, unions, tags)
//! - [`graph`]: the node arena, lexical stacks and a builder
//! - [`callers`]: argument substitution and variable dereferencing
//! - [`opstore`]: the op registry and output-type resolution
//! - [`refine`]: editing-time type refinement, including op expansion
//! - [`simplify`]: behavior-preserving rewrites
//!
//! Refinement and simplification may need to run queries; callers supply an
//! [`Executor`] for that.
//!
//! # Example
//! ```ignore
//! let store = computegraph_ops::standard_op_store(&StoreConfig::default())?;
//! let executor = computegraph_ops::ScriptedExecutor::new(store);
//! let mut b = GraphBuilder::new(executor.op_store());
//! let row = b.var("row", Type::any());
//! let one = b.const_int(1);
//! let body = b.op("number-add", &[("lhs", row), ("rhs", one)])?;
//! let mut graph = b.finish();
//! let refined = refine_editing_node(&executor, &mut graph, body, &Stack::new(), &mut RefineCache::new()).await?;
//! ```

pub mod callers;
pub mod config;
pub mod error;
pub mod executor;
pub mod graph;
pub mod opstore;
pub mod refine;
pub mod serialize;
pub mod simplify;
pub mod suggest;
pub mod types;

pub use callers::{call_function, dereference_all_vars, map_nodes};
pub use config::{EngineConfig, RefineConfig, SimplifyConfig, StoreConfig};
pub use error::{Error, Result};
pub use executor::Executor;
pub use graph::{ConstValue, Frame, Graph, GraphBuilder, GraphFragment, Node, NodeId, Op, Stack};
pub use opstore::{OpDef, OpKind, OpStore, OutputTypeMode, RenderInfo};
pub use refine::{expand_all, refine_editing_node, RefineCache, Refiner};
pub use simplify::{simplify, Simplifier};
pub use types::{is_assignable_to, maybe, tagged_value, union, SimpleType, Type};
