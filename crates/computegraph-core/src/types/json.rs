//! JSON form of types
//!
//! Simple types are bare strings (`"number"`); compound types are objects
//! discriminated by a `type` field (`{"type": "list", "objectType": ...}`).
//! Decoding goes through the normalizing constructors, so decoded unions and
//! tagged values always satisfy the representation invariants.

use super::{tagged_value, union, SimpleType, Type};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;

impl Type {
    pub fn to_json(&self) -> Value {
        match self {
            Type::Simple(s) => Value::String(s.as_str().to_string()),
            Type::List {
                object_type,
                min_length,
                max_length,
            } => {
                let mut obj = Map::new();
                obj.insert("type".into(), json!("list"));
                obj.insert("objectType".into(), object_type.to_json());
                if let Some(min) = min_length {
                    obj.insert("minLength".into(), json!(min));
                }
                if let Some(max) = max_length {
                    obj.insert("maxLength".into(), json!(max));
                }
                Value::Object(obj)
            }
            Type::TypedDict {
                property_types,
                not_required_keys,
            } => {
                let mut obj = Map::new();
                obj.insert("type".into(), json!("typedDict"));
                obj.insert("propertyTypes".into(), types_to_json(property_types));
                if !not_required_keys.is_empty() {
                    obj.insert("notRequiredKeys".into(), json!(not_required_keys));
                }
                Value::Object(obj)
            }
            Type::Dict { object_type } => json!({"type": "dict", "objectType": object_type.to_json()}),
            Type::Union { members } => {
                json!({"type": "union", "members": members.iter().map(Type::to_json).collect::<Vec<_>>()})
            }
            Type::TaggedValue { tag, value } => {
                json!({"type": "tagged", "tag": tag.to_json(), "value": value.to_json()})
            }
            Type::Function {
                input_types,
                output_type,
            } => json!({
                "type": "function",
                "inputTypes": types_to_json(input_types),
                "outputType": output_type.to_json(),
            }),
            Type::Const { val_type, val } => json!({"type": "const", "valType": val_type.to_json(), "val": val}),
            Type::File {
                extension,
                wb_object_type,
            } => {
                let mut obj = Map::new();
                obj.insert("type".into(), json!("file"));
                if let Some(ext) = extension {
                    obj.insert("extension".into(), json!(ext));
                }
                if let Some(object_type) = wb_object_type {
                    obj.insert("wbObjectType".into(), object_type.to_json());
                }
                Value::Object(obj)
            }
            Type::Table { column_types } => json!({"type": "table", "columnTypes": types_to_json(column_types)}),
        }
    }

    pub fn from_json(value: &Value) -> Result<Type> {
        match value {
            Value::String(name) => name.parse::<SimpleType>().map(Type::Simple).map_err(Error::InvalidType),
            Value::Object(obj) => {
                let kind = obj
                    .get("type")
                    .and_then(Value::as_str)
                    .ok_or_else(|| Error::InvalidType(format!("missing 'type' field in {value}")))?;
                match kind {
                    "list" => Ok(Type::List {
                        object_type: Box::new(field_type(obj, "objectType")?),
                        min_length: optional_usize(obj, "minLength")?,
                        max_length: optional_usize(obj, "maxLength")?,
                    }),
                    "typedDict" => {
                        let not_required_keys = match obj.get("notRequiredKeys") {
                            None => BTreeSet::new(),
                            Some(Value::Array(keys)) => keys
                                .iter()
                                .map(|k| {
                                    k.as_str()
                                        .map(str::to_string)
                                        .ok_or_else(|| Error::InvalidType(format!("non-string key {k}")))
                                })
                                .collect::<Result<_>>()?,
                            Some(other) => return Err(Error::InvalidType(format!("bad notRequiredKeys {other}"))),
                        };
                        Ok(Type::TypedDict {
                            property_types: field_types(obj, "propertyTypes")?,
                            not_required_keys,
                        })
                    }
                    "dict" => Ok(Type::dict(field_type(obj, "objectType")?)),
                    "union" => {
                        let members = match obj.get("members") {
                            Some(Value::Array(items)) => items.iter().map(Type::from_json).collect::<Result<Vec<_>>>()?,
                            _ => return Err(Error::InvalidType("union without members".into())),
                        };
                        Ok(union(members))
                    }
                    "tagged" => Ok(tagged_value(field_type(obj, "tag")?, field_type(obj, "value")?)),
                    "function" => Ok(Type::Function {
                        input_types: field_types(obj, "inputTypes")?,
                        output_type: Box::new(field_type(obj, "outputType")?),
                    }),
                    "const" => Ok(Type::Const {
                        val_type: Box::new(field_type(obj, "valType")?),
                        val: obj.get("val").cloned().unwrap_or(Value::Null),
                    }),
                    "file" => Ok(Type::File {
                        extension: obj.get("extension").and_then(Value::as_str).map(str::to_string),
                        wb_object_type: match obj.get("wbObjectType") {
                            Some(v) => Some(Box::new(Type::from_json(v)?)),
                            None => None,
                        },
                    }),
                    "table" => Ok(Type::Table {
                        column_types: field_types(obj, "columnTypes")?,
                    }),
                    other => Err(Error::InvalidType(format!("unknown type kind '{other}'"))),
                }
            }
            other => Err(Error::InvalidType(format!("cannot decode type from {other}"))),
        }
    }
}

fn types_to_json(types: &IndexMap<String, Type>) -> Value {
    Value::Object(types.iter().map(|(k, t)| (k.clone(), t.to_json())).collect())
}

fn field_type(obj: &Map<String, Value>, field: &str) -> Result<Type> {
    let value = obj
        .get(field)
        .ok_or_else(|| Error::InvalidType(format!("missing '{field}' field")))?;
    Type::from_json(value)
}

fn field_types(obj: &Map<String, Value>, field: &str) -> Result<IndexMap<String, Type>> {
    match obj.get(field) {
        Some(Value::Object(map)) => map
            .iter()
            .map(|(k, v)| Ok((k.clone(), Type::from_json(v)?)))
            .collect(),
        Some(other) => Err(Error::InvalidType(format!("'{field}' must be an object, got {other}"))),
        None => Err(Error::InvalidType(format!("missing '{field}' field"))),
    }
}

fn optional_usize(obj: &Map<String, Value>, field: &str) -> Result<Option<usize>> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .map(|n| Some(n as usize))
            .ok_or_else(|| Error::InvalidType(format!("'{field}' must be a non-negative integer"))),
    }
}

impl Serialize for Type {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Type {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Type::from_json(&value).map_err(D::Error::custom)
    }
}
