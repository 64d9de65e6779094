//! Ops over reified types, evaluated only inside graph-computed output types

use computegraph_core::opstore::{MetaValue, OpKind};
use computegraph_core::types::{list_object_type, non_none};
use computegraph_core::{maybe, OpDef, OpStore, Result, Type};
use indexmap::IndexMap;

fn type_op(name: &str, f: fn(&Type) -> Type) -> OpDef {
    OpDef::new(name)
        .input("ty", Type::type_type())
        .returns(Type::type_type())
        .kind(OpKind::Meta)
        .hidden()
        .resolver(move |args: &IndexMap<String, MetaValue>| {
            args.get("ty").and_then(MetaValue::as_type).map(|ty| MetaValue::Type(f(ty)))
        })
}

pub(crate) fn register(store: &mut OpStore) -> Result<()> {
    store.register_op(type_op("type-elementType", list_object_type))?;
    store.register_op(type_op("type-list", |ty| Type::list(ty.clone())))?;
    store.register_op(type_op("type-maybe", |ty| maybe(ty.clone())))?;
    store.register_op(type_op("type-nonNone", non_none))?;
    Ok(())
}
