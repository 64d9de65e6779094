//! Op definitions

use super::output_type::MetaValue;
use super::OpStore;
use crate::error::Result;
use crate::executor::Executor;
use crate::graph::{Graph, GraphFragment, NodeId};
use crate::types::Type;
use async_trait::async_trait;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

pub type ComputedOutputFn = Arc<dyn Fn(&IndexMap<String, Type>) -> Type + Send + Sync>;

/// Evaluates an op at the meta level, over reified types and literals.
pub type MetaResolverFn = Arc<dyn Fn(&IndexMap<String, MetaValue>) -> Option<MetaValue> + Send + Sync>;

/// Rewrites an op application into an equivalent graph of other ops.
pub type ExpansionFn = Arc<dyn Fn(&OpStore, &mut Graph, &IndexMap<String, NodeId>) -> Result<NodeId> + Send + Sync>;

/// Custom output-type resolution that may run queries.
///
/// The node handed to the hook is executable: every variable has been
/// dereferenced against the refine stack.
#[async_trait(?Send)]
pub trait RefineNodeHook: Send + Sync {
    async fn refine_output_type(&self, executor: &dyn Executor, graph: &mut Graph, node: NodeId)
        -> anyhow::Result<Type>;
}

/// How an op's output type is derived from its input types.
#[derive(Clone)]
pub enum OutputTypeMode {
    Static(Type),
    Computed(ComputedOutputFn),
    /// A meta graph evaluated with the variable `input_types` bound to a
    /// dict of the reified input types.
    GraphComputed(GraphFragment),
}

impl fmt::Debug for OutputTypeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputTypeMode::Static(ty) => f.debug_tuple("Static").field(ty).finish(),
            OutputTypeMode::Computed(_) => f.write_str("Computed(..)"),
            OutputTypeMode::GraphComputed(fragment) => f.debug_tuple("GraphComputed").field(&fragment.root).finish(),
        }
    }
}

/// How the concrete syntax layer renders an op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderInfo {
    Unary { repr: String },
    Binary { repr: String },
    Brackets,
    Chain,
    Function,
    ArrayLiteral,
    DictionaryLiteral,
}

impl RenderInfo {
    pub fn unary(repr: impl Into<String>) -> Self {
        RenderInfo::Unary { repr: repr.into() }
    }

    pub fn binary(repr: impl Into<String>) -> Self {
        RenderInfo::Binary { repr: repr.into() }
    }

    pub fn category(&self) -> &'static str {
        match self {
            RenderInfo::Unary { .. } => "unary",
            RenderInfo::Binary { .. } => "binary",
            RenderInfo::Brackets => "brackets",
            RenderInfo::Chain => "chain",
            RenderInfo::Function => "function",
            RenderInfo::ArrayLiteral => "arrayLiteral",
            RenderInfo::DictionaryLiteral => "dictionaryLiteral",
        }
    }

    pub fn repr(&self) -> Option<&str> {
        match self {
            RenderInfo::Unary { repr } | RenderInfo::Binary { repr } => Some(repr),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpKind {
    #[default]
    Standard,
    /// Reads a value out of a type's tag chain.
    TagGetter,
    /// Operates on reified types; used inside graph-computed output types.
    Meta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    #[default]
    Default,
    Never,
    TtlSeconds(u64),
}

/// Registered metadata and behavior for an op.
#[derive(Clone)]
pub struct OpDef {
    pub name: String,
    pub input_types: IndexMap<String, Type>,
    pub output_type: OutputTypeMode,
    pub resolver: Option<MetaResolverFn>,
    /// Weave body: a graph over variables named after the inputs.
    pub body: Option<GraphFragment>,
    pub expansion: Option<ExpansionFn>,
    pub refine_node: Option<Arc<dyn RefineNodeHook>>,
    pub render_info: RenderInfo,
    pub kind: OpKind,
    pub hidden: bool,
    pub cache_policy: CachePolicy,
    pub description: Option<String>,
    pub arg_descriptions: IndexMap<String, String>,
    pub return_value_description: Option<String>,
}

impl fmt::Debug for OpDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpDef")
            .field("name", &self.name)
            .field("input_types", &self.input_types)
            .field("output_type", &self.output_type)
            .field("render_info", &self.render_info)
            .field("kind", &self.kind)
            .field("hidden", &self.hidden)
            .finish_non_exhaustive()
    }
}

impl OpDef {
    /// A chain-rendered op with no inputs and an `any` output.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input_types: IndexMap::new(),
            output_type: OutputTypeMode::Static(Type::any()),
            resolver: None,
            body: None,
            expansion: None,
            refine_node: None,
            render_info: RenderInfo::Chain,
            kind: OpKind::Standard,
            hidden: false,
            cache_policy: CachePolicy::Default,
            description: None,
            arg_descriptions: IndexMap::new(),
            return_value_description: None,
        }
    }

    pub fn input(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.input_types.insert(name.into(), ty);
        self
    }

    /// Declare an input together with its documentation.
    pub fn arg(mut self, name: impl Into<String>, ty: Type, description: impl Into<String>) -> Self {
        let name = name.into();
        self.arg_descriptions.insert(name.clone(), description.into());
        self.input_types.insert(name, ty);
        self
    }

    pub fn returns(mut self, ty: Type) -> Self {
        self.output_type = OutputTypeMode::Static(ty);
        self
    }

    pub fn computed(mut self, f: impl Fn(&IndexMap<String, Type>) -> Type + Send + Sync + 'static) -> Self {
        self.output_type = OutputTypeMode::Computed(Arc::new(f));
        self
    }

    pub fn graph_computed(mut self, fragment: GraphFragment) -> Self {
        self.output_type = OutputTypeMode::GraphComputed(fragment);
        self
    }

    pub fn resolver(
        mut self,
        f: impl Fn(&IndexMap<String, MetaValue>) -> Option<MetaValue> + Send + Sync + 'static,
    ) -> Self {
        self.resolver = Some(Arc::new(f));
        self
    }

    pub fn body(mut self, fragment: GraphFragment) -> Self {
        self.body = Some(fragment);
        self
    }

    pub fn expansion(
        mut self,
        f: impl Fn(&OpStore, &mut Graph, &IndexMap<String, NodeId>) -> Result<NodeId> + Send + Sync + 'static,
    ) -> Self {
        self.expansion = Some(Arc::new(f));
        self
    }

    pub fn refine_hook(mut self, hook: impl RefineNodeHook + 'static) -> Self {
        self.refine_node = Some(Arc::new(hook));
        self
    }

    pub fn render(mut self, render_info: RenderInfo) -> Self {
        self.render_info = render_info;
        self
    }

    pub fn kind(mut self, kind: OpKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache_policy = policy;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn return_description(mut self, description: impl Into<String>) -> Self {
        self.return_value_description = Some(description.into());
        self
    }

    pub fn is_weave(&self) -> bool {
        self.body.is_some()
    }

    pub fn is_generated(&self) -> bool {
        self.expansion.is_some()
    }

    /// Literal ops take arbitrary input names (dict keys, array positions).
    pub fn accepts_any_inputs(&self) -> bool {
        matches!(self.render_info, RenderInfo::ArrayLiteral | RenderInfo::DictionaryLiteral)
    }

    /// First declared input, used for chain rendering and autosuggest.
    pub fn first_input_type(&self) -> Option<&Type> {
        self.input_types.values().next()
    }

    /// Name of the first missing documentation field, if any.
    pub(crate) fn missing_documentation(&self) -> Option<String> {
        if self.description.as_deref().map_or(true, str::is_empty) {
            return Some("description".to_string());
        }
        if let Some(arg) = self
            .input_types
            .keys()
            .find(|name| self.arg_descriptions.get(*name).map_or(true, String::is_empty))
        {
            return Some(format!("argDescriptions.{arg}"));
        }
        if self.return_value_description.as_deref().map_or(true, str::is_empty) {
            return Some("returnValueDescription".to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let def = OpDef::new("count").input("arr", Type::list(Type::any())).returns(Type::number());
        assert_eq!(def.render_info, RenderInfo::Chain);
        assert_eq!(def.kind, OpKind::Standard);
        assert!(!def.is_weave() && !def.is_generated());
        assert_eq!(def.first_input_type(), Some(&Type::list(Type::any())));
    }

    #[test]
    fn test_missing_documentation_reports_first_gap() {
        let def = OpDef::new("count").input("arr", Type::list(Type::any()));
        assert_eq!(def.missing_documentation().as_deref(), Some("description"));

        let def = def.description("Number of elements");
        assert_eq!(def.missing_documentation().as_deref(), Some("argDescriptions.arr"));

        let def = OpDef::new("count")
            .arg("arr", Type::list(Type::any()), "The list")
            .description("Number of elements")
            .return_description("The count");
        assert_eq!(def.missing_documentation(), None);
    }

    #[test]
    fn test_render_categories() {
        assert_eq!(RenderInfo::binary("+").category(), "binary");
        assert_eq!(RenderInfo::binary("+").repr(), Some("+"));
        assert_eq!(RenderInfo::Chain.repr(), None);
    }
}
