#![deny(missing_docs)]

//! # Schema Arena
//!
//! Component schemas stored by name. The operation model only ever holds schema names,
//! so cyclic schema graphs never need to be traversed.

use crate::error::{AppError, AppResult};
use indexmap::IndexMap;
use percent_encoding::percent_decode_str;
use serde_json::Value;

const SCHEMA_PREFIX: &str = "#/components/schemas/";

/// Extracts the schema name from a local `#/components/schemas/{name}` reference.
///
/// JSON Pointer escapes (`~0`, `~1`) and percent-encoding are decoded.
pub fn schema_name_from_ref(reference: &str) -> Option<String> {
    component_name_from_ref(reference, "schemas")
}

/// Extracts the component name from `#/components/{section}/{name}`.
pub fn component_name_from_ref(reference: &str, section: &str) -> Option<String> {
    let pointer = reference.strip_prefix("#/components/")?;
    let (found_section, name) = pointer.split_once('/')?;
    if found_section != section || name.is_empty() || name.contains('/') {
        return None;
    }
    let decoded = percent_decode_str(name).decode_utf8().ok()?;
    Some(decoded.replace("~1", "/").replace("~0", "~"))
}

/// Arena of component schemas keyed by name, in document order.
#[derive(Debug, Clone, Default)]
pub struct SchemaArena {
    schemas: IndexMap<String, Value>,
}

impl SchemaArena {
    /// Wraps the `components.schemas` map.
    pub fn new(schemas: IndexMap<String, Value>) -> Self {
        Self { schemas }
    }

    /// Looks up a schema by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schemas.get(name)
    }

    /// True when the arena holds a schema with this name.
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Iterates schemas in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.schemas.iter()
    }

    /// Number of schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// True when no schemas are defined.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Resolves a `$ref` string to its schema name, failing when it does not resolve.
    pub fn resolve_ref(&self, reference: &str) -> AppResult<String> {
        let name = schema_name_from_ref(reference)
            .ok_or_else(|| AppError::UnresolvedReference(reference.to_string()))?;
        if !self.contains(&name) {
            return Err(AppError::UnresolvedReference(reference.to_string()));
        }
        Ok(name)
    }

    /// Validates every `$ref` found anywhere inside `schema`.
    pub fn validate_refs(&self, schema: &Value) -> AppResult<()> {
        match schema {
            Value::Object(map) => {
                if let Some(reference) = map.get("$ref").and_then(Value::as_str) {
                    self.resolve_ref(reference)?;
                }
                for (key, value) in map {
                    if key != "$ref" {
                        self.validate_refs(value)?;
                    }
                }
                Ok(())
            }
            Value::Array(items) => items.iter().try_for_each(|v| self.validate_refs(v)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn arena() -> SchemaArena {
        let mut schemas = IndexMap::new();
        schemas.insert("Thing".to_string(), json!({"type": "object"}));
        schemas.insert("a/b".to_string(), json!({"type": "string"}));
        SchemaArena::new(schemas)
    }

    #[test]
    fn test_name_from_ref() {
        assert_eq!(
            schema_name_from_ref("#/components/schemas/Thing").as_deref(),
            Some("Thing")
        );
        assert_eq!(
            schema_name_from_ref("#/components/schemas/a~1b").as_deref(),
            Some("a/b")
        );
        assert_eq!(schema_name_from_ref("#/components/parameters/Thing"), None);
        assert_eq!(schema_name_from_ref("other.yaml#/Thing"), None);
    }

    #[test]
    fn test_resolve_ref() {
        let arena = arena();
        assert_eq!(arena.resolve_ref("#/components/schemas/Thing").unwrap(), "Thing");
        assert!(matches!(
            arena.resolve_ref("#/components/schemas/Missing"),
            Err(AppError::UnresolvedReference(_))
        ));
    }

    #[test]
    fn test_validate_nested_refs() {
        let arena = arena();
        let ok = json!({"allOf": [{"$ref": "#/components/schemas/Thing"}]});
        assert!(arena.validate_refs(&ok).is_ok());
        let bad = json!({"properties": {"data": {"items": {"$ref": "#/components/schemas/Nope"}}}});
        assert!(arena.validate_refs(&bad).is_err());
    }
}
