#![deny(missing_docs)]

//! # Type Mapping
//!
//! Converts JSON Schema fragments into the simplified type vocabulary used by the generator.
//! Handles primitives, collections, references and nullability (`type: [T, "null"]`).

use crate::error::{AppError, AppResult};
use crate::oas::arena::schema_name_from_ref;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Display;

/// A primitive leaf type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PrimitiveType {
    /// A plain string.
    String,
    /// An integer of the given `format` (`int32`, `int64`, `uint64`...).
    Integer {
        /// Declared format, if any.
        format: Option<String>,
    },
    /// A floating point number.
    Number,
    /// A boolean.
    Boolean,
    /// A string carrying a `date` or `date-time` format.
    Timestamp,
}

impl Display for PrimitiveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl PrimitiveType {
    /// Classifies a schema as a primitive, if it is one.
    pub fn from_schema(schema: &Value) -> Option<Self> {
        let (type_name, _) = schema_type(schema);
        let format = schema.get("format").and_then(Value::as_str);
        match type_name? {
            "string" => match format {
                Some("date-time") | Some("date") => Some(Self::Timestamp),
                _ => Some(Self::String),
            },
            "integer" => Some(Self::Integer {
                format: format.map(str::to_string),
            }),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }

    /// Category label: integer widths are `number`, timestamps are `string`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::String | Self::Timestamp => "string",
            Self::Integer { .. } | Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }

    /// True for string-shaped primitives.
    pub fn is_string(&self) -> bool {
        matches!(self, Self::String | Self::Timestamp)
    }

    /// The owned Rust type.
    pub fn rust_type(&self) -> &'static str {
        match self {
            Self::String | Self::Timestamp => "String",
            Self::Integer { format } => match format.as_deref() {
                Some("int32") => "i32",
                Some("uint8") => "u8",
                Some("uint16") => "u16",
                Some("uint32") => "u32",
                Some("uint64") => "u64",
                _ => "i64",
            },
            Self::Number => "f64",
            Self::Boolean => "bool",
        }
    }

    /// The Rust type used for method arguments (strings are borrowed).
    pub fn rust_arg_type(&self) -> &'static str {
        if self.is_string() {
            "&str"
        } else {
            self.rust_type()
        }
    }

    /// A deterministic literal of the argument type, used by generated tests.
    pub fn example_literal(&self) -> &'static str {
        match self {
            Self::String | Self::Timestamp => "\"example\"",
            Self::Integer { .. } => "1",
            Self::Number => "1.0",
            Self::Boolean => "true",
        }
    }

    /// The query-string rendering of `example_literal`.
    pub fn example_query_value(&self) -> &'static str {
        match self {
            Self::String | Self::Timestamp => "example",
            Self::Integer { .. } => "1",
            Self::Number => "1",
            Self::Boolean => "true",
        }
    }

    /// Zero value embedded by generated code for a native return type.
    ///
    /// Only strings have one; asking for any other primitive is a generator error.
    pub fn native_default(&self) -> AppResult<&'static str> {
        if self.is_string() {
            Ok("String::new()")
        } else {
            Err(AppError::UnsupportedNativeDefault(self.label().to_string()))
        }
    }
}

/// The simplified shape of a schema, one level deep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaType {
    /// A primitive leaf.
    Primitive(PrimitiveType),
    /// A reference to a named component schema.
    Named(String),
    /// An array of the inner shape.
    Array(Box<SchemaType>),
    /// Anything else (free-form objects, compositions).
    Any,
}

impl SchemaType {
    /// Classifies a schema without following references.
    pub fn classify(schema: &Value) -> Self {
        if let Some(name) = schema
            .get("$ref")
            .and_then(Value::as_str)
            .and_then(schema_name_from_ref)
        {
            return Self::Named(name);
        }
        if let Some(primitive) = PrimitiveType::from_schema(schema) {
            return Self::Primitive(primitive);
        }
        let (type_name, _) = schema_type(schema);
        if type_name == Some("array") || schema.get("items").is_some() {
            let inner = schema
                .get("items")
                .map(Self::classify)
                .unwrap_or(Self::Any);
            return Self::Array(Box::new(inner));
        }
        Self::Any
    }
}

/// Reads the `type` keyword, accepting both the scalar form and the 3.1 array form.
///
/// Returns the non-null type name and whether `null` was allowed.
pub fn schema_type(schema: &Value) -> (Option<&str>, bool) {
    match schema.get("type") {
        Some(Value::String(s)) => (Some(s.as_str()), false),
        Some(Value::Array(items)) => {
            let nullable = items.iter().any(|v| v.as_str() == Some("null"));
            let name = items
                .iter()
                .filter_map(Value::as_str)
                .find(|s| *s != "null");
            (name, nullable)
        }
        _ => (None, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_primitive_classification() {
        assert_eq!(
            PrimitiveType::from_schema(&json!({"type": "string"})),
            Some(PrimitiveType::String)
        );
        assert_eq!(
            PrimitiveType::from_schema(&json!({"type": "string", "format": "date-time"})),
            Some(PrimitiveType::Timestamp)
        );
        assert_eq!(
            PrimitiveType::from_schema(&json!({"type": ["integer", "null"], "format": "int32"})),
            Some(PrimitiveType::Integer {
                format: Some("int32".into())
            })
        );
        assert_eq!(PrimitiveType::from_schema(&json!({"type": "object"})), None);
    }

    #[test]
    fn test_labels() {
        assert_eq!(PrimitiveType::Timestamp.label(), "string");
        assert_eq!(PrimitiveType::Integer { format: None }.label(), "number");
        assert_eq!(PrimitiveType::Boolean.label(), "boolean");
    }

    #[test]
    fn test_native_default_only_for_strings() {
        assert_eq!(PrimitiveType::String.native_default().unwrap(), "String::new()");
        let err = PrimitiveType::Boolean.native_default().unwrap_err();
        assert!(matches!(err, AppError::UnsupportedNativeDefault(t) if t == "boolean"));
    }

    #[test]
    fn test_schema_type_classification() {
        assert_eq!(
            SchemaType::classify(&json!({"$ref": "#/components/schemas/Thing"})),
            SchemaType::Named("Thing".into())
        );
        assert_eq!(
            SchemaType::classify(&json!({"type": "array", "items": {"$ref": "#/components/schemas/Thing"}})),
            SchemaType::Array(Box::new(SchemaType::Named("Thing".into())))
        );
        assert_eq!(SchemaType::classify(&json!({"type": "object"})), SchemaType::Any);
    }

    #[test]
    fn test_nullable_array_form() {
        let schema = json!({"type": ["string", "null"]});
        let (name, nullable) = schema_type(&schema);
        assert_eq!(name, Some("string"));
        assert!(nullable);
    }
}
