//! Union and tag normalization

use super::{is_assignable_to, is_nullable, Type};

/// Build a normalized union.
///
/// Nested unions and unions distributed under a tag are flattened, mutually
/// assignable members are collapsed to the first occurrence, and tagged
/// members sharing an identical tag are merged into one member whose value
/// is the union of their values. An empty union is `invalid`.
pub fn union(members: impl IntoIterator<Item = Type>) -> Type {
    let mut flat = Vec::new();
    for member in members {
        flatten_into(member, &mut flat);
    }

    let mut deduped: Vec<Type> = Vec::with_capacity(flat.len());
    for member in flat {
        if !deduped.iter().any(|existing| mutually_assignable(existing, &member)) {
            deduped.push(member);
        }
    }

    let mut merged = merge_tagged(deduped);
    match merged.len() {
        0 => Type::invalid(),
        1 => merged.remove(0),
        _ => Type::Union { members: merged },
    }
}

/// `none | t`, idempotent for types that are already nullable.
pub fn maybe(ty: Type) -> Type {
    if is_nullable(&ty) {
        ty
    } else {
        union([Type::none(), ty])
    }
}

/// Attach `tag` to `value`.
///
/// Tagging an already tagged value chains the tags on the tag side, so the
/// result's value is never itself tagged. Tagging a union tags each member.
pub fn tagged_value(tag: Type, value: Type) -> Type {
    match value {
        Type::TaggedValue {
            tag: inner_tag,
            value: inner_value,
        } => Type::TaggedValue {
            tag: Box::new(tagged_value(tag, *inner_tag)),
            value: inner_value,
        },
        Type::Union { members } if members.iter().any(Type::is_tagged) => {
            union(members.into_iter().map(|m| tagged_value(tag.clone(), m)))
        }
        value => Type::TaggedValue {
            tag: Box::new(tag),
            value: Box::new(value),
        },
    }
}

fn flatten_into(ty: Type, out: &mut Vec<Type>) {
    match ty {
        Type::Union { members } => {
            for member in members {
                flatten_into(member, out);
            }
        }
        Type::TaggedValue { tag, value } if value.is_union() => {
            if let Type::Union { members } = *value {
                for member in members {
                    flatten_into(tagged_value((*tag).clone(), member), out);
                }
            }
        }
        other => out.push(other),
    }
}

fn mutually_assignable(a: &Type, b: &Type) -> bool {
    a == b || (is_assignable_to(a, b) && is_assignable_to(b, a))
}

/// Merge tagged members with identical tags, keeping first-occurrence order.
fn merge_tagged(members: Vec<Type>) -> Vec<Type> {
    let mut out: Vec<Type> = Vec::with_capacity(members.len());
    let mut groups: Vec<(usize, Vec<Type>)> = Vec::new();

    for member in members {
        match member {
            Type::TaggedValue { tag, value } => {
                let existing = groups.iter_mut().find(|(slot, _)| match &out[*slot] {
                    Type::TaggedValue { tag: seen, .. } => **seen == *tag,
                    _ => false,
                });
                match existing {
                    Some((_, values)) => values.push(*value),
                    None => {
                        groups.push((out.len(), vec![(*value).clone()]));
                        out.push(Type::TaggedValue { tag, value });
                    }
                }
            }
            other => out.push(other),
        }
    }

    for (slot, values) in groups {
        if values.len() < 2 {
            continue;
        }
        if let Type::TaggedValue { value, .. } = &mut out[slot] {
            **value = union(values);
        }
    }
    out
}
