//! Rust type expressions for schema shapes, as seen from generated code.

use crate::config::GeneratorConfig;
use crate::error::AppResult;
use crate::naming::type_ident;
use crate::oas::arena::SchemaArena;
use crate::oas::models::{DataType, ResponseType};
use crate::type_mapping::{schema_type, SchemaType};
use serde_json::Value;
use std::collections::BTreeSet;

const MAX_ALIAS_DEPTH: usize = 8;

/// True for schemas emitted as model structs.
pub fn is_object_schema(schema: &Value) -> bool {
    schema_type(schema).0 == Some("object") || schema.get("properties").is_some()
}

/// Classifies a property schema, seeing through a single-element `allOf` wrapper.
pub fn classify_property(schema: &Value) -> SchemaType {
    match schema.get("allOf").and_then(Value::as_array) {
        Some(parts) if parts.len() == 1 => SchemaType::classify(&parts[0]),
        _ => SchemaType::classify(schema),
    }
}

/// Resolves schema shapes against the arena and the runtime type table.
pub struct TypeResolver<'a> {
    arena: &'a SchemaArena,
    config: &'a GeneratorConfig,
}

impl<'a> TypeResolver<'a> {
    /// Creates a resolver.
    pub fn new(arena: &'a SchemaArena, config: &'a GeneratorConfig) -> Self {
        Self { arena, config }
    }

    /// True when `name` is emitted as a model struct.
    pub fn is_model(&self, name: &str) -> bool {
        self.config.runtime_type(name).is_none()
            && self.arena.get(name).map(is_object_schema).unwrap_or(false)
    }

    /// The Rust type for a schema shape.
    pub fn rust_type(&self, ty: &SchemaType) -> String {
        self.rust_type_at(ty, 0)
    }

    fn rust_type_at(&self, ty: &SchemaType, depth: usize) -> String {
        match ty {
            SchemaType::Primitive(p) => p.rust_type().to_string(),
            SchemaType::Array(inner) => format!("Vec<{}>", self.rust_type_at(inner, depth)),
            SchemaType::Any => "serde_json::Value".to_string(),
            SchemaType::Named(name) => {
                if let Some(runtime) = self.config.runtime_type(name) {
                    return runtime;
                }
                if self.is_model(name) {
                    return type_ident(name);
                }
                match self.arena.get(name) {
                    Some(schema) if depth < MAX_ALIAS_DEPTH => {
                        self.rust_type_at(&SchemaType::classify(schema), depth + 1)
                    }
                    _ => "serde_json::Value".to_string(),
                }
            }
        }
    }

    /// Model structs mentioned by a shape, for import manifests.
    pub fn models_in(&self, ty: &SchemaType, out: &mut BTreeSet<String>) {
        match ty {
            SchemaType::Named(name) if self.is_model(name) => {
                out.insert(type_ident(name));
            }
            SchemaType::Array(inner) => self.models_in(inner, out),
            _ => {}
        }
    }

    /// The test fixture expression for a response data shape.
    ///
    /// Native leaves use their zero value; only strings have one.
    pub fn fixture_expr(&self, ty: &SchemaType) -> AppResult<String> {
        self.fixture_expr_at(ty, 0)
    }

    fn fixture_expr_at(&self, ty: &SchemaType, depth: usize) -> AppResult<String> {
        match ty {
            SchemaType::Primitive(p) => Ok(p.native_default()?.to_string()),
            SchemaType::Array(inner) => Ok(format!("vec![{}]", self.fixture_expr_at(inner, depth)?)),
            SchemaType::Any => Ok("serde_json::Value::default()".to_string()),
            SchemaType::Named(name) => {
                if let Some(runtime) = self.config.runtime_type(name) {
                    return Ok(format!("{}::default()", runtime));
                }
                if self.is_model(name) {
                    return Ok(format!("{}::fixture()", type_ident(name)));
                }
                match self.arena.get(name) {
                    Some(schema) if depth < MAX_ALIAS_DEPTH => {
                        self.fixture_expr_at(&SchemaType::classify(schema), depth + 1)
                    }
                    _ => Ok("serde_json::Value::default()".to_string()),
                }
            }
        }
    }
}

/// The element shape of a response's data, ignoring collection wrapping.
pub fn data_element(response: &ResponseType) -> Option<SchemaType> {
    response.data.as_ref().map(|data| match data {
        DataType::Schema(name) => SchemaType::Named(name.clone()),
        DataType::Native(p) => SchemaType::Primitive(p.clone()),
    })
}

/// The full shape of a response's data, including collection wrapping.
pub fn data_shape(response: &ResponseType) -> Option<SchemaType> {
    data_element(response).map(|element| {
        if response.is_collection {
            SchemaType::Array(Box::new(element))
        } else {
            element
        }
    })
}
