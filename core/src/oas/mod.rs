#![deny(missing_docs)]

//! # OpenAPI Module
//!
//! Loads an OpenAPI 3.1 document (YAML or JSON) into the `ApiSpec` model:
//! - `shims`: raw deserialization layer.
//! - `arena`: component schemas addressed by name.
//! - `operations` / `responses`: the per-operation extraction rules.
//! - `models`: the resulting IR.

pub mod arena;
pub mod models;
pub mod operations;
pub mod responses;
pub mod shims;

use crate::config::GeneratorConfig;
use crate::error::{AppError, AppResult};
use arena::SchemaArena;
use models::ApiSpec;
use shims::ShimOpenApi;

/// Parses an OpenAPI document into the operation model.
///
/// YAML is a superset of JSON, so both encodings are accepted.
pub fn parse_openapi_document(raw: &str, config: &GeneratorConfig) -> AppResult<ApiSpec> {
    let doc: ShimOpenApi = serde_yaml::from_str(raw)?;

    match doc.openapi.as_deref() {
        Some(version) if version.starts_with("3.") => {}
        other => {
            return Err(AppError::General(format!(
                "Unsupported OpenAPI version: {}",
                other.unwrap_or("<missing>")
            )))
        }
    }

    let schemas = SchemaArena::new(doc.components.schemas.clone());
    for (_, schema) in schemas.iter() {
        schemas.validate_refs(schema)?;
    }

    let operations = operations::build_operations(&doc, &schemas, config)?;
    Ok(ApiSpec {
        operations,
        schemas,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_json_documents() {
        let json = r#"{
            "openapi": "3.1.0",
            "paths": {
                "/things/{thingID}": {
                    "get": {
                        "operationId": "GetThing",
                        "parameters": [{"name": "thingID", "in": "path", "required": true, "schema": {"type": "string"}}],
                        "responses": {"200": {"description": "ok"}}
                    }
                }
            }
        }"#;
        let spec = parse_openapi_document(json, &GeneratorConfig::default()).unwrap();
        assert_eq!(spec.operations.len(), 1);
        let op = spec.operation("GetThing").unwrap();
        assert_eq!(op.path_params[0].name, "thingID");
        assert!(!op.skip);
    }

    #[test]
    fn test_rejects_swagger_documents() {
        let err = parse_openapi_document("swagger: '2.0'\npaths: {}\n", &GeneratorConfig::default())
            .unwrap_err();
        assert!(matches!(err, AppError::General(_)));
    }

    #[test]
    fn test_dangling_component_reference_is_fatal() {
        let yaml = r##"
openapi: 3.1.0
paths: {}
components:
  schemas:
    Thing:
      type: object
      properties:
        owner: { $ref: '#/components/schemas/Owner' }
"##;
        assert!(matches!(
            parse_openapi_document(yaml, &GeneratorConfig::default()),
            Err(AppError::UnresolvedReference(_))
        ));
    }
}
