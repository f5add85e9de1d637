#![deny(missing_docs)]

//! # Shims
//!
//! Generic structures acting as an Intermediate Deserialization Layer.
//! These structs map directly to OpenAPI YAML/JSON objects; schemas stay as raw
//! `serde_json::Value` trees and are classified later.

use indexmap::IndexMap;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Root of an OpenAPI document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShimOpenApi {
    /// `openapi` version string.
    #[serde(default)]
    pub openapi: Option<String>,
    /// Path items keyed by template.
    #[serde(default)]
    pub paths: ShimPaths,
    /// Reusable components.
    #[serde(default)]
    pub components: ShimComponents,
}

/// Represents the Paths Object; `x-` extensions are dropped.
#[derive(Debug, Clone, Default)]
pub struct ShimPaths {
    /// Parsed path items keyed by path template, in lexical order.
    pub items: BTreeMap<String, ShimPathItem>,
}

impl<'de> Deserialize<'de> for ShimPaths {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
        let mut items = BTreeMap::new();

        for (key, value) in raw {
            if key.starts_with("x-") {
                continue;
            }
            let path_item = serde_json::from_value::<ShimPathItem>(value).map_err(|e| {
                DeError::custom(format!("Failed to parse path item '{}': {}", key, e))
            })?;
            items.insert(key, path_item);
        }

        Ok(Self { items })
    }
}

/// The `components` object, restricted to the sections the model consumes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShimComponents {
    /// Schemas in document order.
    #[serde(default)]
    pub schemas: IndexMap<String, Value>,
    /// Reusable parameters.
    #[serde(default)]
    pub parameters: IndexMap<String, ShimParameter>,
    /// Reusable request bodies.
    #[serde(default)]
    pub request_bodies: IndexMap<String, ShimRequestBody>,
    /// Reusable responses.
    #[serde(default)]
    pub responses: IndexMap<String, ShimResponse>,
}

/// A Path Item Object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShimPathItem {
    /// GET operation.
    pub get: Option<ShimOperation>,
    /// POST operation.
    pub post: Option<ShimOperation>,
    /// PUT operation.
    pub put: Option<ShimOperation>,
    /// PATCH operation.
    pub patch: Option<ShimOperation>,
    /// DELETE operation.
    pub delete: Option<ShimOperation>,
    /// Parameters shared by every operation on the path.
    #[serde(default)]
    pub parameters: Vec<ShimParameter>,
}

/// An Operation Object.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShimOperation {
    /// Unique operation id.
    pub operation_id: Option<String>,
    /// Short summary, reused in generated doc comments.
    pub summary: Option<String>,
    /// Operation level parameters.
    #[serde(default)]
    pub parameters: Vec<ShimParameter>,
    /// Request body, inline or `$ref`.
    pub request_body: Option<ShimRequestBody>,
    /// Responses keyed by status code.
    #[serde(default)]
    pub responses: BTreeMap<String, ShimResponse>,
    /// Specification extensions (`x-...`).
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

impl ShimOperation {
    /// True when the boolean extension `name` is present and set.
    pub fn extension_flag(&self, name: &str) -> bool {
        self.extensions
            .get(name)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// A Parameter Object or a `$ref` to one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShimParameter {
    /// Reference to `#/components/parameters/...`.
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    /// Parameter name.
    pub name: Option<String>,
    /// Location (`path`, `query`, `header`, `cookie`).
    #[serde(rename = "in")]
    pub location: Option<String>,
    /// Whether the parameter is required.
    #[serde(default)]
    pub required: bool,
    /// Parameter schema.
    pub schema: Option<Value>,
}

/// A Request Body Object or a `$ref` to one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShimRequestBody {
    /// Reference to `#/components/requestBodies/...`.
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    /// Media types.
    #[serde(default)]
    pub content: IndexMap<String, ShimMediaType>,
    /// Whether the body is required.
    #[serde(default)]
    pub required: bool,
}

/// A Response Object or a `$ref` to one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShimResponse {
    /// Reference to `#/components/responses/...`.
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    /// Response description.
    pub description: Option<String>,
    /// Media types.
    #[serde(default)]
    pub content: IndexMap<String, ShimMediaType>,
}

/// A Media Type Object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShimMediaType {
    /// Schema of the payload.
    pub schema: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_drop_extensions() {
        let yaml = r#"
openapi: 3.1.0
paths:
  x-internal: { note: ignored }
  /things:
    get:
      operationId: GetThings
      x-return-raw-response: true
      responses:
        '200': { description: ok }
"#;
        let doc: ShimOpenApi = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(doc.paths.items.len(), 1);
        let op = doc.paths.items["/things"].get.clone().unwrap();
        assert_eq!(op.operation_id.as_deref(), Some("GetThings"));
        assert!(op.extension_flag("x-return-raw-response"));
        assert!(!op.extension_flag("x-other"));
        assert!(op.responses.contains_key("200"));
    }

    #[test]
    fn test_parameter_ref_shape() {
        let param: ShimParameter =
            serde_json::from_str(r##"{"$ref": "#/components/parameters/Limit"}"##).unwrap();
        assert_eq!(param.reference.as_deref(), Some("#/components/parameters/Limit"));
        assert!(param.name.is_none());
    }
}
