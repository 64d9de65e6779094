//! One-directional subtyping

use super::{SimpleType, Type};

/// Check whether a value of type `ty` may be used where `to` is expected.
///
/// This is subtyping, not equality: `to = any` always succeeds, unions on the
/// source side must be fully covered, unions on the target side need one
/// matching member, and tagged values are assignable through their value.
pub fn is_assignable_to(ty: &Type, to: &Type) -> bool {
    if to.is_any() {
        return true;
    }

    match (ty, to) {
        // Every member of a source union must fit
        (Type::Union { members }, _) => members.iter().all(|m| is_assignable_to(m, to)),

        (Type::Const { val_type: a, val: va }, Type::Const { val_type: b, val: vb }) => {
            va == vb && is_assignable_to(a, b)
        }
        (Type::Const { val_type, .. }, _) => is_assignable_to(val_type, to),
        (_, Type::Const { .. }) => false,

        (Type::TaggedValue { tag, value }, Type::TaggedValue { tag: to_tag, value: to_value }) => {
            is_assignable_to(value, to_value) && tag_chain_assignable(tag, to_tag)
        }
        (Type::TaggedValue { .. }, Type::Union { members }) => members.iter().any(|m| is_assignable_to(ty, m)),
        (Type::TaggedValue { value, .. }, _) => is_assignable_to(value, to),

        (_, Type::Union { members }) => members.iter().any(|m| is_assignable_to(ty, m)),
        (_, Type::TaggedValue { .. }) => false,

        (Type::Simple(a), Type::Simple(b)) => a == b || (a.is_numeric() && b.is_numeric()),

        // Functions are covariant in their output only
        (Type::Function { output_type, .. }, Type::Function { output_type: to_output, .. }) => {
            is_assignable_to(output_type, to_output)
        }

        (
            Type::List {
                object_type,
                min_length,
                max_length,
            },
            Type::List {
                object_type: to_object,
                min_length: to_min,
                max_length: to_max,
            },
        ) => {
            let max_ok = match (to_max, max_length) {
                (None, _) => true,
                (Some(to_max), Some(max)) => to_max >= max,
                (Some(_), None) => false,
            };
            let min_ok = match (to_min, min_length) {
                (None, _) => true,
                (Some(to_min), Some(min)) => to_min <= min,
                (Some(_), None) => false,
            };
            max_ok && min_ok && is_assignable_to(object_type, to_object)
        }

        (
            Type::TypedDict {
                property_types,
                not_required_keys,
            },
            Type::TypedDict {
                property_types: to_props,
                not_required_keys: to_optional,
            },
        ) => to_props.iter().all(|(key, to_prop)| match property_types.get(key) {
            Some(prop) => {
                let may_be_absent = not_required_keys.contains(key) && !to_optional.contains(key);
                !may_be_absent && is_assignable_to(prop, to_prop)
            }
            None => to_optional.contains(key),
        }),

        (Type::TypedDict { property_types, .. }, Type::Dict { object_type }) => {
            !property_types.is_empty() && property_types.values().all(|p| is_assignable_to(p, object_type))
        }
        (Type::Dict { object_type }, Type::TypedDict { property_types, .. }) => {
            property_types.values().all(|p| is_assignable_to(object_type, p))
        }
        (Type::Dict { object_type }, Type::Dict { object_type: to_object }) => is_assignable_to(object_type, to_object),

        (
            Type::File {
                extension,
                wb_object_type,
            },
            Type::File {
                extension: to_extension,
                wb_object_type: to_object_type,
            },
        ) => {
            let ext_ok = to_extension.is_none() || extension == to_extension;
            let object_ok = match (wb_object_type, to_object_type) {
                (_, None) => true,
                (Some(a), Some(b)) => is_assignable_to(a, b),
                (None, Some(_)) => false,
            };
            ext_ok && object_ok
        }

        (Type::Table { column_types }, Type::Table { column_types: to_columns }) => to_columns
            .iter()
            .all(|(name, to_col)| column_types.get(name).is_some_and(|c| is_assignable_to(c, to_col))),

        _ => false,
    }
}

/// Walk a source tag chain looking for a link assignable to `to_tag`.
fn tag_chain_assignable(tag: &Type, to_tag: &Type) -> bool {
    if is_assignable_to(tag, to_tag) {
        return true;
    }
    match tag {
        Type::TaggedValue { tag: outer, .. } => tag_chain_assignable(outer, to_tag),
        _ => false,
    }
}

/// Whether two types can describe a common value. Used to detect ambiguous
/// op signatures at registration.
pub fn types_overlap(a: &Type, b: &Type) -> bool {
    if is_assignable_to(a, b) || is_assignable_to(b, a) {
        return true;
    }
    match (a, b) {
        (Type::Union { members }, _) => members.iter().any(|m| types_overlap(m, b)),
        (_, Type::Union { .. }) => types_overlap(b, a),
        (Type::TaggedValue { value, .. }, _) => types_overlap(value, b),
        (_, Type::TaggedValue { .. }) => types_overlap(b, a),
        (Type::Const { val_type, .. }, _) => types_overlap(val_type, b),
        (_, Type::Const { .. }) => types_overlap(b, a),
        (Type::List { object_type: x, .. }, Type::List { object_type: y, .. }) => types_overlap(x, y),
        (Type::Dict { object_type: x }, Type::Dict { object_type: y }) => types_overlap(x, y),
        (Type::Simple(SimpleType::Unknown), _) | (_, Type::Simple(SimpleType::Unknown)) => true,
        _ => false,
    }
}
