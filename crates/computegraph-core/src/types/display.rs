use super::{SimpleType, Type};
use std::fmt;

impl fmt::Display for SimpleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Simple(s) => write!(f, "{s}"),
            Type::List {
                object_type,
                min_length,
                max_length,
            } => match (min_length, max_length) {
                (None, None) => write!(f, "List<{object_type}>"),
                (min, max) => write!(
                    f,
                    "List<{object_type}>[{}..{}]",
                    min.map(|n| n.to_string()).unwrap_or_default(),
                    max.map(|n| n.to_string()).unwrap_or_default()
                ),
            },
            Type::TypedDict {
                property_types,
                not_required_keys,
            } => {
                f.write_str("{")?;
                for (i, (key, ty)) in property_types.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    let marker = if not_required_keys.contains(key) { "?" } else { "" };
                    write!(f, "{key}{marker}: {ty}")?;
                }
                f.write_str("}")
            }
            Type::Dict { object_type } => write!(f, "Dict<string, {object_type}>"),
            Type::Union { members } => {
                let non_none: Vec<&Type> = members.iter().filter(|m| !m.is_simple(SimpleType::None)).collect();
                if non_none.len() + 1 == members.len() && non_none.len() == 1 {
                    return write!(f, "Maybe<{}>", non_none[0]);
                }
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
            Type::TaggedValue { tag, value } => write!(f, "Tagged<{tag}, {value}>"),
            Type::Function {
                input_types,
                output_type,
            } => {
                f.write_str("(")?;
                for (i, (name, ty)) in input_types.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {ty}")?;
                }
                write!(f, ") => {output_type}")
            }
            Type::Const { val_type, val } => write!(f, "Const<{val_type}, {val}>"),
            Type::File { extension, .. } => match extension {
                Some(ext) => write!(f, "File<{ext}>"),
                None => f.write_str("File"),
            },
            Type::Table { column_types } => {
                f.write_str("Table<")?;
                for (i, (name, ty)) in column_types.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {ty}")?;
                }
                f.write_str(">")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::types::{maybe, Type};

    #[test]
    fn test_display_compound_types() {
        assert_eq!(Type::list(Type::number()).to_string(), "List<number>");
        assert_eq!(maybe(Type::string()).to_string(), "Maybe<string>");
        assert_eq!(
            Type::typed_dict_with_optional([("a", Type::number()), ("b", Type::string())], ["b"]).to_string(),
            "{a: number, b?: string}"
        );
        assert_eq!(
            Type::function([("row", Type::number())], Type::boolean()).to_string(),
            "(row: number) => boolean"
        );
    }
}
