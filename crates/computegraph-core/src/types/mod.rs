//! Structural type system for compute graphs
//!
//! `Type` is a closed algebraic sum type. Values are immutable and are built
//! through the helpers in this module (`union`, `maybe`, `tagged_value`, ...)
//! which keep the representation normalized:
//! - a `Union` never directly contains another `Union`
//! - a `TaggedValue`'s value is never itself a `TaggedValue`; nested tags are
//!   chained on the tag side
//! - `not_required_keys` only exists on `TypedDict`

mod assign;
mod display;
mod json;
mod union;

pub use assign::{is_assignable_to, types_overlap};
pub use union::{maybe, tagged_value, union};

use indexmap::IndexMap;
use serde_json::Value;
use std::collections::BTreeSet;
use std::str::FromStr;

/// Named leaf types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SimpleType {
    None,
    Any,
    Unknown,
    Invalid,
    String,
    Number,
    Int,
    Float,
    Boolean,
    Id,
    /// The type of reified types (meta-level values).
    Type,
    Date,
    Timestamp,
    Project,
    Artifact,
    ArtifactVersion,
    Run,
    Entity,
    User,
}

impl SimpleType {
    pub const ALL: [SimpleType; 19] = [
        SimpleType::None,
        SimpleType::Any,
        SimpleType::Unknown,
        SimpleType::Invalid,
        SimpleType::String,
        SimpleType::Number,
        SimpleType::Int,
        SimpleType::Float,
        SimpleType::Boolean,
        SimpleType::Id,
        SimpleType::Type,
        SimpleType::Date,
        SimpleType::Timestamp,
        SimpleType::Project,
        SimpleType::Artifact,
        SimpleType::ArtifactVersion,
        SimpleType::Run,
        SimpleType::Entity,
        SimpleType::User,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SimpleType::None => "none",
            SimpleType::Any => "any",
            SimpleType::Unknown => "unknown",
            SimpleType::Invalid => "invalid",
            SimpleType::String => "string",
            SimpleType::Number => "number",
            SimpleType::Int => "int",
            SimpleType::Float => "float",
            SimpleType::Boolean => "boolean",
            SimpleType::Id => "id",
            SimpleType::Type => "type",
            SimpleType::Date => "date",
            SimpleType::Timestamp => "timestamp",
            SimpleType::Project => "project",
            SimpleType::Artifact => "artifact",
            SimpleType::ArtifactVersion => "artifactVersion",
            SimpleType::Run => "run",
            SimpleType::Entity => "entity",
            SimpleType::User => "user",
        }
    }

    /// `int`, `float` and `number` alias each other.
    pub fn is_numeric(self) -> bool {
        matches!(self, SimpleType::Number | SimpleType::Int | SimpleType::Float)
    }
}

impl FromStr for SimpleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SimpleType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown simple type '{s}'"))
    }
}

/// A structural type.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Simple(SimpleType),
    List {
        object_type: Box<Type>,
        min_length: Option<usize>,
        max_length: Option<usize>,
    },
    TypedDict {
        property_types: IndexMap<String, Type>,
        not_required_keys: BTreeSet<String>,
    },
    Dict {
        object_type: Box<Type>,
    },
    /// Build with [`union`], never directly.
    Union {
        members: Vec<Type>,
    },
    /// Build with [`tagged_value`], never directly.
    TaggedValue {
        tag: Box<Type>,
        value: Box<Type>,
    },
    Function {
        input_types: IndexMap<String, Type>,
        output_type: Box<Type>,
    },
    Const {
        val_type: Box<Type>,
        val: Value,
    },
    File {
        extension: Option<String>,
        wb_object_type: Option<Box<Type>>,
    },
    Table {
        column_types: IndexMap<String, Type>,
    },
}

/// Type of `Void` nodes and poisoned outputs.
pub static INVALID: Type = Type::Simple(SimpleType::Invalid);

impl Type {
    pub const fn simple(t: SimpleType) -> Self {
        Type::Simple(t)
    }

    pub const fn none() -> Self {
        Type::Simple(SimpleType::None)
    }

    pub const fn any() -> Self {
        Type::Simple(SimpleType::Any)
    }

    pub const fn unknown() -> Self {
        Type::Simple(SimpleType::Unknown)
    }

    pub const fn invalid() -> Self {
        Type::Simple(SimpleType::Invalid)
    }

    pub const fn string() -> Self {
        Type::Simple(SimpleType::String)
    }

    pub const fn number() -> Self {
        Type::Simple(SimpleType::Number)
    }

    pub const fn int() -> Self {
        Type::Simple(SimpleType::Int)
    }

    pub const fn float() -> Self {
        Type::Simple(SimpleType::Float)
    }

    pub const fn boolean() -> Self {
        Type::Simple(SimpleType::Boolean)
    }

    /// The type of reified types.
    pub const fn type_type() -> Self {
        Type::Simple(SimpleType::Type)
    }

    pub fn list(object_type: Type) -> Self {
        Type::List {
            object_type: Box::new(object_type),
            min_length: None,
            max_length: None,
        }
    }

    pub fn list_with_length(object_type: Type, min_length: Option<usize>, max_length: Option<usize>) -> Self {
        Type::List {
            object_type: Box::new(object_type),
            min_length,
            max_length,
        }
    }

    pub fn typed_dict<K: Into<String>>(props: impl IntoIterator<Item = (K, Type)>) -> Self {
        Type::TypedDict {
            property_types: props.into_iter().map(|(k, t)| (k.into(), t)).collect(),
            not_required_keys: BTreeSet::new(),
        }
    }

    /// A typed dict where `optional` keys may be absent.
    pub fn typed_dict_with_optional<K: Into<String>>(
        props: impl IntoIterator<Item = (K, Type)>,
        optional: impl IntoIterator<Item = K>,
    ) -> Self {
        Type::TypedDict {
            property_types: props.into_iter().map(|(k, t)| (k.into(), t)).collect(),
            not_required_keys: optional.into_iter().map(Into::into).collect(),
        }
    }

    pub fn dict(object_type: Type) -> Self {
        Type::Dict {
            object_type: Box::new(object_type),
        }
    }

    pub fn function<K: Into<String>>(inputs: impl IntoIterator<Item = (K, Type)>, output: Type) -> Self {
        Type::Function {
            input_types: inputs.into_iter().map(|(k, t)| (k.into(), t)).collect(),
            output_type: Box::new(output),
        }
    }

    pub fn constant(val_type: Type, val: Value) -> Self {
        Type::Const {
            val_type: Box::new(val_type),
            val,
        }
    }

    pub fn file(extension: Option<&str>) -> Self {
        Type::File {
            extension: extension.map(str::to_string),
            wb_object_type: None,
        }
    }

    pub fn table<K: Into<String>>(columns: impl IntoIterator<Item = (K, Type)>) -> Self {
        Type::Table {
            column_types: columns.into_iter().map(|(k, t)| (k.into(), t)).collect(),
        }
    }

    /// Infer the type of a plain JSON literal.
    pub fn of_json(value: &Value) -> Self {
        match value {
            Value::Null => Type::none(),
            Value::Bool(_) => Type::boolean(),
            Value::Number(_) => Type::number(),
            Value::String(_) => Type::string(),
            Value::Array(items) => {
                let len = items.len();
                let object_type = if items.is_empty() {
                    Type::unknown()
                } else {
                    union(items.iter().map(Type::of_json))
                };
                Type::list_with_length(object_type, Some(len), Some(len))
            }
            Value::Object(map) => Type::typed_dict(map.iter().map(|(k, v)| (k.clone(), Type::of_json(v)))),
        }
    }

    pub fn is_simple(&self, t: SimpleType) -> bool {
        matches!(self, Type::Simple(s) if *s == t)
    }

    pub fn is_any(&self) -> bool {
        self.is_simple(SimpleType::Any)
    }

    pub fn is_invalid(&self) -> bool {
        self.is_simple(SimpleType::Invalid)
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Type::Function { .. })
    }

    pub fn is_tagged(&self) -> bool {
        matches!(self, Type::TaggedValue { .. })
    }

    pub fn is_union(&self) -> bool {
        matches!(self, Type::Union { .. })
    }

    pub fn is_const(&self) -> bool {
        matches!(self, Type::Const { .. })
    }

    /// Strip a `Const` marker, leaving the underlying value type.
    pub fn unwrap_const(&self) -> &Type {
        match self {
            Type::Const { val_type, .. } => val_type.unwrap_const(),
            other => other,
        }
    }

    /// The literal value carried by a `Const` type.
    pub fn const_value(&self) -> Option<&Value> {
        match self {
            Type::Const { val, .. } => Some(val),
            _ => None,
        }
    }

    pub fn union_members(&self) -> &[Type] {
        match self {
            Type::Union { members } => members,
            other => std::slice::from_ref(other),
        }
    }
}

/// True if `none` is a possible value.
pub fn is_nullable(ty: &Type) -> bool {
    match ty {
        Type::Simple(SimpleType::None) => true,
        Type::Union { members } => members.iter().any(is_nullable),
        Type::TaggedValue { value, .. } => is_nullable(value),
        Type::Const { val_type, .. } => is_nullable(val_type),
        _ => false,
    }
}

/// Remove `none` from a type. `none` alone becomes `invalid`.
pub fn non_none(ty: &Type) -> Type {
    match ty {
        Type::Simple(SimpleType::None) => Type::invalid(),
        Type::Union { members } => union(members.iter().filter(|m| !is_none_member(m)).map(non_none)),
        Type::TaggedValue { tag, value } => tagged_value((**tag).clone(), non_none(value)),
        Type::Const { val_type, .. } => non_none(val_type),
        other => other.clone(),
    }
}

fn is_none_member(ty: &Type) -> bool {
    match ty {
        Type::Simple(SimpleType::None) => true,
        Type::TaggedValue { value, .. } => value.is_simple(SimpleType::None),
        _ => false,
    }
}

/// Element type of a list-like type. Tags on the list carry over to the
/// element, and nullable lists yield nullable elements.
pub fn list_object_type(ty: &Type) -> Type {
    match ty {
        Type::List { object_type, .. } => (**object_type).clone(),
        Type::Table { column_types } => Type::TypedDict {
            property_types: column_types.clone(),
            not_required_keys: BTreeSet::new(),
        },
        Type::TaggedValue { tag, value } => tagged_value((**tag).clone(), list_object_type(value)),
        Type::Union { members } => union(members.iter().map(|m| {
            if m.is_simple(SimpleType::None) {
                Type::none()
            } else {
                list_object_type(m)
            }
        })),
        Type::Const { val_type, .. } => list_object_type(val_type),
        Type::Simple(SimpleType::Any) => Type::any(),
        _ => Type::invalid(),
    }
}

/// The value side of a tagged type; untagged types are returned as-is.
pub fn tagged_value_value_type(ty: &Type) -> &Type {
    match ty {
        Type::TaggedValue { value, .. } => value,
        other => other,
    }
}

/// The tag side of a tagged type.
pub fn tagged_value_tag_type(ty: &Type) -> Option<&Type> {
    match ty {
        Type::TaggedValue { tag, .. } => Some(tag),
        _ => None,
    }
}

/// Search a type's tag chain for a tag assignable to `wanted`, innermost
/// (most recently applied) tag first.
pub fn find_tag(ty: &Type, wanted: &Type) -> Option<Type> {
    match ty {
        Type::TaggedValue { tag, .. } => find_in_tag_chain(tag, wanted),
        Type::Union { members } => {
            let found: Vec<Type> = members.iter().filter_map(|m| find_tag(m, wanted)).collect();
            if found.is_empty() {
                None
            } else {
                Some(union(found))
            }
        }
        _ => None,
    }
}

fn find_in_tag_chain(tag: &Type, wanted: &Type) -> Option<Type> {
    match tag {
        Type::TaggedValue { tag: outer, value } => {
            if is_assignable_to(value, wanted) {
                Some((**value).clone())
            } else {
                find_in_tag_chain(outer, wanted)
            }
        }
        other if is_assignable_to(other, wanted) => Some(other.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_type_names_round_trip() {
        for t in SimpleType::ALL {
            assert_eq!(t.as_str().parse::<SimpleType>().unwrap(), t);
        }
        assert!("nope".parse::<SimpleType>().is_err());
    }

    #[test]
    fn test_of_json_literal() {
        assert_eq!(Type::of_json(&json!(5)), Type::number());
        assert_eq!(Type::of_json(&json!(null)), Type::none());
        assert_eq!(
            Type::of_json(&json!({"a": "x"})),
            Type::typed_dict([("a", Type::string())])
        );
        assert_eq!(
            Type::of_json(&json!([1, 2])),
            Type::list_with_length(Type::number(), Some(2), Some(2))
        );
    }

    #[test]
    fn test_non_none_strips_none() {
        assert_eq!(non_none(&maybe(Type::string())), Type::string());
        assert_eq!(non_none(&Type::none()), Type::invalid());
        assert!(!is_nullable(&non_none(&maybe(Type::number()))));
    }

    #[test]
    fn test_list_object_type_keeps_tags() {
        let run_tag = Type::typed_dict([("run", Type::simple(SimpleType::Run))]);
        let tagged_list = tagged_value(run_tag.clone(), Type::list(Type::number()));
        assert_eq!(list_object_type(&tagged_list), tagged_value(run_tag, Type::number()));
        assert_eq!(list_object_type(&maybe(Type::list(Type::string()))), maybe(Type::string()));
        assert_eq!(list_object_type(&Type::number()), Type::invalid());
    }

    #[test]
    fn test_find_tag_prefers_innermost() {
        let project = Type::simple(SimpleType::Project);
        let run = Type::simple(SimpleType::Run);
        let ty = tagged_value(project.clone(), tagged_value(run.clone(), Type::number()));
        assert_eq!(find_tag(&ty, &run), Some(run.clone()));
        assert_eq!(find_tag(&ty, &project), Some(project));
        assert_eq!(find_tag(&Type::number(), &run), None);
    }

    #[test]
    fn test_unwrap_const() {
        let c = Type::constant(Type::number(), json!(5));
        assert_eq!(c.unwrap_const(), &Type::number());
        assert_eq!(c.const_value(), Some(&json!(5)));
    }
}
