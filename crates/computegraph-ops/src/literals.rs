//! Dict and array literals, and key lookup

use computegraph_core::opstore::{names, MetaValue};
use computegraph_core::types::{is_nullable, non_none, tagged_value_tag_type, tagged_value_value_type};
use computegraph_core::{maybe, tagged_value, union, OpDef, OpStore, RenderInfo, Result, Type};
use indexmap::IndexMap;
use serde_json::Value;

/// Type of `pick(obj, key)` for an object of type `obj` and a key of type
/// `key`. The key must be a constant string to look into a typed dict.
pub fn pick_type(obj: &Type, key: &Type) -> Type {
    let obj = obj.unwrap_const();
    let nullable = is_nullable(obj);
    let present = non_none(obj);
    let value = tagged_value_value_type(&present);
    let key = key.const_value().and_then(Value::as_str);

    let picked = match (value, key) {
        (Type::TypedDict { property_types, .. }, Some(key)) => {
            property_types.get(key).cloned().unwrap_or_else(Type::none)
        }
        (Type::TypedDict { property_types, .. }, None) => maybe(union(property_types.values().cloned())),
        (Type::Dict { object_type }, _) => maybe((**object_type).clone()),
        _ => Type::unknown(),
    };
    let picked = match tagged_value_tag_type(&present) {
        Some(tag) => tagged_value(tag.clone(), picked),
        None => picked,
    };
    if nullable {
        maybe(picked)
    } else {
        picked
    }
}

fn object_input() -> Type {
    maybe(union([
        Type::typed_dict::<String>([]),
        Type::dict(Type::any()),
    ]))
}

pub(crate) fn register(store: &mut OpStore) -> Result<()> {
    store.register_op(
        OpDef::new(names::PICK)
            .arg("obj", object_input(), "The dict to read from")
            .arg("key", Type::string(), "The key to look up")
            .computed(|inputs| match (inputs.get("obj"), inputs.get("key")) {
                (Some(obj), Some(key)) => pick_type(obj, key),
                _ => Type::unknown(),
            })
            .resolver(|args: &IndexMap<String, MetaValue>| match (args.get("obj"), args.get("key")) {
                (Some(MetaValue::Dict(entries)), Some(key)) => key.as_str().and_then(|k| entries.get(k)).cloned(),
                (Some(MetaValue::Json(Value::Object(entries))), Some(key)) => key
                    .as_str()
                    .and_then(|k| entries.get(k))
                    .map(|v| MetaValue::Json(v.clone())),
                _ => None,
            })
            .description("Returns the value stored under a key")
            .return_description("The value under the key, or none when the key is absent"),
    )?;

    store.register_op(
        OpDef::new(names::DICT)
            .render(RenderInfo::DictionaryLiteral)
            .computed(|inputs| {
                Type::typed_dict(
                    inputs
                        .iter()
                        .map(|(key, ty)| (key.clone(), ty.unwrap_const().clone())),
                )
            })
            .description("Builds a dict from its inputs, keyed by input name")
            .return_description("A typed dict with one property per input"),
    )?;

    store.register_op(
        OpDef::new("list")
            .render(RenderInfo::ArrayLiteral)
            .computed(|inputs| {
                let element = if inputs.is_empty() {
                    Type::unknown()
                } else {
                    union(inputs.values().map(|ty| ty.unwrap_const().clone()))
                };
                Type::list_with_length(element, Some(inputs.len()), Some(inputs.len()))
            })
            .description("Builds a list from its inputs, in input order")
            .return_description("A list with one element per input"),
    )?;
    Ok(())
}
