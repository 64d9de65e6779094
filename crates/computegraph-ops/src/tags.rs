//! Ops that read values out of a type's tags

use crate::higher_order::GROUP_KEY_PROP;
use computegraph_core::opstore::OpKind;
use computegraph_core::types::find_tag;
use computegraph_core::{OpDef, OpStore, Result, Type};

/// Reads the key a `groupby` group was tagged with.
pub const GROUP_KEY: &str = "group-groupkey";

fn group_key_type(obj: &Type) -> Type {
    let wanted = Type::typed_dict([(GROUP_KEY_PROP, Type::any())]);
    match find_tag(obj.unwrap_const(), &wanted) {
        Some(Type::TypedDict { property_types, .. }) => property_types
            .get(GROUP_KEY_PROP)
            .cloned()
            .unwrap_or_else(Type::unknown),
        _ => Type::invalid(),
    }
}

pub(crate) fn register(store: &mut OpStore) -> Result<()> {
    store.register_op(
        OpDef::new(GROUP_KEY)
            .arg("obj", Type::any(), "A group produced by groupby, or a value taken from one")
            .computed(|inputs| inputs.get("obj").map(group_key_type).unwrap_or_else(Type::unknown))
            .kind(OpKind::TagGetter)
            .description("Returns the key of the group a value belongs to")
            .return_description("The group key"),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use computegraph_core::tagged_value;

    #[test]
    fn test_group_key_read_from_tag() {
        let group = tagged_value(
            Type::typed_dict([(GROUP_KEY_PROP, Type::string())]),
            Type::list(Type::number()),
        );
        assert_eq!(group_key_type(&group), Type::string());
        assert_eq!(group_key_type(&Type::number()), Type::invalid());
    }
}
