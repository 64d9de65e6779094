//! Display names and signature conflict detection

use super::{OpDef, RenderInfo};
use crate::types::types_overlap;

/// The name an op is rendered under.
///
/// Unary and binary ops render as their symbol. Other ops drop the
/// `prefix-` part of their name, so `number-floor` renders as `floor`.
pub fn display_name(def: &OpDef) -> String {
    match &def.render_info {
        RenderInfo::Unary { repr } | RenderInfo::Binary { repr } => repr.clone(),
        _ => match def.name.split_once('-') {
            Some((_, rest)) if !rest.is_empty() => rest.to_string(),
            _ => def.name.clone(),
        },
    }
}

/// Two ops conflict when they render identically and a single call could
/// match both signatures.
pub fn signatures_conflict(a: &OpDef, b: &OpDef) -> bool {
    if a.name == b.name || a.render_info.category() != b.render_info.category() {
        return false;
    }
    if display_name(a) != display_name(b) || a.input_types.len() != b.input_types.len() {
        return false;
    }
    a.input_types
        .values()
        .zip(b.input_types.values())
        .all(|(x, y)| types_overlap(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    #[test]
    fn test_display_names() {
        let add = OpDef::new("number-add").render(RenderInfo::binary("+"));
        assert_eq!(display_name(&add), "+");
        let floor = OpDef::new("number-floor");
        assert_eq!(display_name(&floor), "floor");
        let count = OpDef::new("count");
        assert_eq!(display_name(&count), "count");
    }

    #[test]
    fn test_disjoint_signatures_do_not_conflict() {
        let numbers = OpDef::new("number-add")
            .input("lhs", Type::number())
            .input("rhs", Type::number())
            .render(RenderInfo::binary("+"));
        let strings = OpDef::new("string-add")
            .input("lhs", Type::string())
            .input("rhs", Type::string())
            .render(RenderInfo::binary("+"));
        assert!(!signatures_conflict(&numbers, &strings));
    }

    #[test]
    fn test_overlapping_signatures_conflict() {
        let a = OpDef::new("number-add")
            .input("lhs", Type::number())
            .input("rhs", Type::number())
            .render(RenderInfo::binary("+"));
        let b = OpDef::new("int-add")
            .input("lhs", Type::int())
            .input("rhs", Type::number())
            .render(RenderInfo::binary("+"));
        assert!(signatures_conflict(&a, &b));
        let chained = b.clone().render(RenderInfo::Chain);
        assert!(!signatures_conflict(&a, &chained));
    }
}
