#![deny(missing_docs)]

//! # Response Resolution
//!
//! Picks the success response of an operation and unwraps the `{envelope, {data: ...}}`
//! composition one level deep to find the data type.

use crate::error::{AppError, AppResult};
use crate::oas::arena::{component_name_from_ref, SchemaArena};
use crate::oas::models::{DataType, ResponseType};
use crate::oas::shims::{ShimComponents, ShimMediaType, ShimResponse};
use crate::type_mapping::SchemaType;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::BTreeMap;

/// Success codes considered, in priority order.
pub const SUCCESS_STATUSES: [u16; 4] = [200, 201, 202, 204];

/// Returns the first present success response among 200, 201, 202, 204.
pub fn select_success_response(
    responses: &BTreeMap<String, ShimResponse>,
) -> Option<(u16, &ShimResponse)> {
    SUCCESS_STATUSES
        .iter()
        .find_map(|code| responses.get(&code.to_string()).map(|r| (*code, r)))
}

/// Follows a `$ref` to `#/components/responses/...`.
pub fn resolve_response(
    response: &ShimResponse,
    components: &ShimComponents,
) -> AppResult<ShimResponse> {
    match &response.reference {
        None => Ok(response.clone()),
        Some(reference) => component_name_from_ref(reference, "responses")
            .and_then(|name| components.responses.get(&name))
            .cloned()
            .ok_or_else(|| AppError::UnresolvedReference(reference.clone())),
    }
}

/// Picks the JSON media type; other content types are ignored.
pub fn select_json_media(content: &IndexMap<String, ShimMediaType>) -> Option<&ShimMediaType> {
    content.get("application/json").or_else(|| {
        content
            .iter()
            .find(|(media, _)| media.starts_with("application/") && media.ends_with("+json"))
            .map(|(_, m)| m)
    })
}

/// Extracts the response type of a resolved success response.
pub fn extract_response_type(
    response: &ShimResponse,
    arena: &SchemaArena,
) -> AppResult<ResponseType> {
    let mut response_type = ResponseType::default();
    let Some(schema) = select_json_media(&response.content).and_then(|m| m.schema.as_ref()) else {
        return Ok(response_type);
    };
    arena.validate_refs(schema)?;

    if let Some(parts) = schema.get("allOf").and_then(Value::as_array) {
        for part in parts {
            if let Some(reference) = part.get("$ref").and_then(Value::as_str) {
                response_type.container = Some(arena.resolve_ref(reference)?);
            }
            if let Some(data) = part.get("properties").and_then(|p| p.get("data")) {
                apply_data_schema(&mut response_type, data);
            }
        }
    } else {
        apply_data_schema(&mut response_type, schema);
    }

    Ok(response_type)
}

fn apply_data_schema(response_type: &mut ResponseType, data: &Value) {
    match SchemaType::classify(data) {
        SchemaType::Named(name) => response_type.data = Some(DataType::Schema(name)),
        SchemaType::Primitive(primitive) => response_type.data = Some(DataType::Native(primitive)),
        SchemaType::Array(inner) => {
            response_type.is_collection = true;
            response_type.data = match *inner {
                SchemaType::Named(name) => Some(DataType::Schema(name)),
                SchemaType::Primitive(primitive) => Some(DataType::Native(primitive)),
                _ => None,
            };
        }
        SchemaType::Any => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_mapping::PrimitiveType;
    use serde_json::json;

    fn arena() -> SchemaArena {
        let mut schemas = IndexMap::new();
        schemas.insert("APIResponse".to_string(), json!({"type": "object"}));
        schemas.insert("Thing".to_string(), json!({"type": "object"}));
        SchemaArena::new(schemas)
    }

    fn response(schema: Value) -> ShimResponse {
        let mut content = IndexMap::new();
        content.insert(
            "application/json".to_string(),
            ShimMediaType {
                schema: Some(schema),
            },
        );
        ShimResponse {
            content,
            ..Default::default()
        }
    }

    #[test]
    fn test_first_success_status_wins() {
        let mut responses = BTreeMap::new();
        responses.insert("204".to_string(), ShimResponse::default());
        responses.insert("201".to_string(), ShimResponse::default());
        responses.insert("400".to_string(), ShimResponse::default());
        let (code, _) = select_success_response(&responses).unwrap();
        assert_eq!(code, 201);
    }

    #[test]
    fn test_envelope_unwrapping() {
        let schema = json!({"allOf": [
            {"$ref": "#/components/schemas/APIResponse"},
            {"properties": {"data": {"$ref": "#/components/schemas/Thing"}}}
        ]});
        let rt = extract_response_type(&response(schema), &arena()).unwrap();
        assert_eq!(rt.container.as_deref(), Some("APIResponse"));
        assert_eq!(rt.data, Some(DataType::Schema("Thing".into())));
        assert!(!rt.is_collection);
    }

    #[test]
    fn test_collection_and_native_data() {
        let list = json!({"allOf": [
            {"$ref": "#/components/schemas/APIResponse"},
            {"properties": {"data": {"type": "array", "items": {"$ref": "#/components/schemas/Thing"}}}}
        ]});
        let rt = extract_response_type(&response(list), &arena()).unwrap();
        assert!(rt.is_collection);
        assert_eq!(rt.data, Some(DataType::Schema("Thing".into())));

        let native = json!({"allOf": [
            {"$ref": "#/components/schemas/APIResponse"},
            {"properties": {"data": {"type": "string"}}}
        ]});
        let rt = extract_response_type(&response(native), &arena()).unwrap();
        assert_eq!(rt.data, Some(DataType::Native(PrimitiveType::String)));
    }

    #[test]
    fn test_unresolved_reference_is_fatal() {
        let schema = json!({"allOf": [{"$ref": "#/components/schemas/Missing"}]});
        assert!(matches!(
            extract_response_type(&response(schema), &arena()),
            Err(AppError::UnresolvedReference(_))
        ));
    }

    #[test]
    fn test_unknown_content_type_ignored() {
        let mut content = IndexMap::new();
        content.insert(
            "text/mermaid".to_string(),
            ShimMediaType {
                schema: Some(json!({"$ref": "#/components/schemas/Missing"})),
            },
        );
        let r = ShimResponse {
            content,
            ..Default::default()
        };
        let rt = extract_response_type(&r, &arena()).unwrap();
        assert_eq!(rt, ResponseType::default());
    }
}
