use super::display::signatures_conflict;
use super::OpDef;
use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::graph::{Graph, NodeId, Op};
use crate::types::is_assignable_to;
use crate::types::Type;
use indexmap::IndexMap;
use tracing::{debug, warn};

/// Registry of op definitions.
///
/// Built once at startup and then shared by reference; nothing mutates a
/// registered definition.
#[derive(Debug, Default)]
pub struct OpStore {
    ops: IndexMap<String, OpDef>,
    config: StoreConfig,
}

impl OpStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            ops: IndexMap::new(),
            config,
        }
    }

    /// A store that accepts undocumented ops and skips conflict checks.
    pub fn unchecked() -> Self {
        Self::new(StoreConfig {
            check_ambiguous_signatures: false,
            require_documentation: false,
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Register an op definition.
    ///
    /// Fails only for missing documentation on a non-hidden op. Re-registering
    /// a name replaces the previous definition.
    pub fn register_op(&mut self, def: OpDef) -> Result<()> {
        if self.config.require_documentation && !def.hidden {
            if let Some(field) = def.missing_documentation() {
                return Err(Error::MissingDocumentation { op: def.name, field });
            }
        }

        if self.config.check_ambiguous_signatures {
            for existing in self.ops.values().filter(|existing| signatures_conflict(existing, &def)) {
                warn!(
                    "ops '{}' and '{}' render the same and accept overlapping inputs",
                    existing.name, def.name
                );
            }
        }

        if self.ops.contains_key(&def.name) {
            warn!("op '{}' registered twice, replacing previous definition", def.name);
        } else {
            debug!("registered op '{}'", def.name);
        }
        self.ops.insert(def.name.clone(), def);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&OpDef> {
        self.ops.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ops.contains_key(name)
    }

    pub fn ops(&self) -> impl Iterator<Item = &OpDef> {
        self.ops.values()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Build an op node, computing its output type immediately.
    ///
    /// Inputs are not validated against the declared types; refinement
    /// handles mismatches by poisoning the node.
    pub fn make_op<K: Into<String>>(
        &self,
        graph: &mut Graph,
        name: &str,
        inputs: impl IntoIterator<Item = (K, NodeId)>,
    ) -> Result<NodeId> {
        let def = self.get(name).ok_or_else(|| Error::UnknownOp(name.to_string()))?;
        let inputs: IndexMap<String, NodeId> = inputs.into_iter().map(|(k, v)| (k.into(), v)).collect();
        if let Some(unexpected) = inputs
            .keys()
            .find(|k| !def.accepts_any_inputs() && !def.input_types.contains_key(*k))
        {
            return Err(Error::UnexpectedInput {
                op: name.to_string(),
                input: unexpected.clone(),
            });
        }
        let input_types = self.input_types_of(graph, &inputs);
        let ty = self.determine_output_type(def, &input_types);
        Ok(graph.output(ty, Op::new(name, inputs)))
    }

    /// Build an op node from inputs given in declaration order.
    pub fn make_op_positional(&self, graph: &mut Graph, name: &str, inputs: &[NodeId]) -> Result<NodeId> {
        let def = self.get(name).ok_or_else(|| Error::UnknownOp(name.to_string()))?;
        if inputs.len() > def.input_types.len() {
            return Err(Error::UnexpectedInput {
                op: name.to_string(),
                input: format!("#{}", def.input_types.len()),
            });
        }
        let named: Vec<(String, NodeId)> = def.input_types.keys().cloned().zip(inputs.iter().copied()).collect();
        self.make_op(graph, name, named)
    }

    /// Non-hidden ops whose first input accepts `ty`.
    pub fn ops_for_input_type<'a>(&'a self, ty: &'a Type) -> impl Iterator<Item = &'a OpDef> + 'a {
        self.ops.values().filter(move |def| {
            !def.hidden && def.first_input_type().is_some_and(|first| is_assignable_to(ty, first))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::opstore::RenderInfo;

    fn documented(name: &str) -> OpDef {
        OpDef::new(name)
            .arg("lhs", Type::number(), "Left operand")
            .arg("rhs", Type::number(), "Right operand")
            .returns(Type::number())
            .render(RenderInfo::binary("+"))
            .description("Add two numbers")
            .return_description("The sum")
    }

    #[test]
    fn test_register_requires_documentation() {
        let mut store = OpStore::new(StoreConfig::default());
        let err = store
            .register_op(OpDef::new("number-add").input("lhs", Type::number()))
            .unwrap_err();
        assert!(matches!(err, Error::MissingDocumentation { ref field, .. } if field == "description"));
        assert!(store.is_empty());

        store.register_op(OpDef::new("secret").input("x", Type::any()).hidden()).unwrap();
        store.register_op(documented("number-add")).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_duplicate_registration_replaces() {
        let mut store = OpStore::unchecked();
        store.register_op(documented("number-add")).unwrap();
        store
            .register_op(documented("number-add").returns(Type::string()))
            .unwrap();
        assert_eq!(store.len(), 1);
        let def = store.get("number-add").unwrap();
        assert_eq!(store.determine_output_type(def, &IndexMap::new()), Type::string());
    }

    #[test]
    fn test_make_op_computes_type_eagerly() {
        let mut store = OpStore::unchecked();
        store.register_op(documented("number-add")).unwrap();
        let mut graph = Graph::new();
        let a = graph.const_int(1);
        let b = graph.const_string("not a number");
        let sum = store.make_op(&mut graph, "number-add", [("lhs", a), ("rhs", b)]).unwrap();
        assert_eq!(graph.ty(sum), &Type::number());
    }

    #[test]
    fn test_make_op_errors() {
        let mut store = OpStore::unchecked();
        store.register_op(documented("number-add")).unwrap();
        let mut graph = Graph::new();
        let a = graph.const_int(1);
        assert!(matches!(
            store.make_op(&mut graph, "nope", [("lhs", a)]),
            Err(Error::UnknownOp(_))
        ));
        assert!(matches!(
            store.make_op(&mut graph, "number-add", [("bogus", a)]),
            Err(Error::UnexpectedInput { .. })
        ));
    }

    #[test]
    fn test_ops_for_input_type() {
        let mut store = OpStore::unchecked();
        store.register_op(documented("number-add")).unwrap();
        store
            .register_op(OpDef::new("string-len").input("str", Type::string()).returns(Type::number()))
            .unwrap();
        store
            .register_op(OpDef::new("hidden-op").input("n", Type::number()).hidden())
            .unwrap();
        let ty = Type::int();
        let names: Vec<&str> = store.ops_for_input_type(&ty).map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["number-add"]);
    }
}
