#![deny(missing_docs)]

//! # Operation Model
//!
//! Intermediate Representation of the API: one `Operation` per `(path, method)`.
//! Schemas are referenced by name only; their bodies live in the `SchemaArena`.

use crate::oas::arena::SchemaArena;
use crate::type_mapping::PrimitiveType;
use serde::Serialize;
use std::fmt::Display;

/// Query parameters whose joint presence marks a paginated list operation.
pub const PAGINATION_MARKERS: [&str; 8] = [
    "limit",
    "page",
    "createdBefore",
    "createdAfter",
    "updatedBefore",
    "updatedAfter",
    "sortBy",
    "includeArchived",
];

/// The name of the free-text search query parameter.
pub const SEARCH_QUERY_PARAM: &str = "q";

/// HTTP methods an operation may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET.
    Get,
    /// POST.
    Post,
    /// PUT.
    Put,
    /// PATCH.
    Patch,
    /// DELETE.
    Delete,
}

/// Static behaviour attached to each HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodTraits {
    /// Whether the method sends a JSON body (subject to the bodyless POST table).
    pub uses_body: bool,
    /// Whether the generated method hands decoded data back to the caller.
    pub returns_body: bool,
    /// Success status assumed when the document declares none.
    pub default_status: u16,
}

impl HttpMethod {
    /// All methods in visiting order.
    pub const ALL: [HttpMethod; 5] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
    ];

    /// The upper-case method token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// The method's traits record.
    pub fn traits(self) -> MethodTraits {
        match self {
            Self::Get => MethodTraits {
                uses_body: false,
                returns_body: true,
                default_status: 200,
            },
            Self::Post => MethodTraits {
                uses_body: true,
                returns_body: true,
                default_status: 201,
            },
            Self::Put | Self::Patch => MethodTraits {
                uses_body: true,
                returns_body: false,
                default_status: 200,
            },
            Self::Delete => MethodTraits {
                uses_body: false,
                returns_body: false,
                default_status: 204,
            },
        }
    }
}

impl Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A path or query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param {
    /// Name as written in the document (`mealPlanID`).
    pub name: String,
    /// Primitive type of the value.
    pub ty: PrimitiveType,
    /// Whether the parameter is required.
    pub required: bool,
}

/// Where the response data type comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "camelCase")]
pub enum DataType {
    /// A component schema by name.
    Schema(String),
    /// A primitive leaf.
    Native(PrimitiveType),
}

/// The success response of an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseType {
    /// The data type carried (inside the envelope when `container` is set).
    pub data: Option<DataType>,
    /// Envelope schema name when the response composes `{envelope, {data: ...}}`.
    pub container: Option<String>,
    /// `data` is an array.
    pub is_collection: bool,
    /// `data` is an array returned with pagination.
    pub is_paginated: bool,
    /// The caller receives the raw HTTP response.
    pub is_raw: bool,
}

/// One API operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Unique operation id (`CreateMealPlanEvent`).
    pub operation_id: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Path template with `{placeholder}` segments.
    pub path_template: String,
    /// Path parameters in placeholder order.
    pub path_params: Vec<Param>,
    /// Query parameters in declaration order.
    pub query_params: Vec<Param>,
    /// Request body schema name.
    pub request_body_type: Option<String>,
    /// Response shape.
    pub response_type: ResponseType,
    /// Success status: 200, 201, 202 or 204.
    pub success_status: u16,
    /// The query parameters contain the full pagination marker set.
    pub returns_list: bool,
    /// Modelled but excluded from generation.
    pub skip: bool,
    /// Summary from the document.
    pub summary: Option<String>,
}

impl Operation {
    /// Query parameters that are not pagination markers.
    pub fn extra_query_params(&self) -> Vec<&Param> {
        self.query_params
            .iter()
            .filter(|p| !self.returns_list || !PAGINATION_MARKERS.contains(&p.name.as_str()))
            .collect()
    }

    /// Whether a body is sent with the request.
    pub fn has_body(&self) -> bool {
        self.request_body_type.is_some()
    }

    /// Whether the generated method returns decoded data.
    pub fn returns_data(&self) -> bool {
        !self.response_type.is_raw
            && self.response_type.data.is_some()
            && (self.returns_list || self.method.traits().returns_body)
    }
}

/// The loaded document: operations plus the schema arena.
#[derive(Debug, Clone, Default)]
pub struct ApiSpec {
    /// Operations in path then method order.
    pub operations: Vec<Operation>,
    /// Component schemas.
    pub schemas: SchemaArena,
}

impl ApiSpec {
    /// Operations that are not skipped.
    pub fn emitted_operations(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter().filter(|op| !op.skip)
    }

    /// Finds an operation by id.
    pub fn operation(&self, operation_id: &str) -> Option<&Operation> {
        self.operations
            .iter()
            .find(|op| op.operation_id == operation_id)
    }
}

/// True when `names` contains every pagination marker.
pub fn contains_pagination_markers<'a>(names: impl IntoIterator<Item = &'a str>) -> bool {
    let names: Vec<&str> = names.into_iter().collect();
    PAGINATION_MARKERS.iter().all(|m| names.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_traits() {
        assert!(!HttpMethod::Get.traits().uses_body);
        assert!(HttpMethod::Post.traits().uses_body);
        assert!(!HttpMethod::Put.traits().returns_body);
        assert_eq!(HttpMethod::Delete.traits().default_status, 204);
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
    }

    #[test]
    fn test_pagination_marker_detection() {
        let mut names: Vec<&str> = PAGINATION_MARKERS.to_vec();
        names.push("q");
        assert!(contains_pagination_markers(names.iter().copied()));
        names.retain(|n| *n != "includeArchived");
        assert!(!contains_pagination_markers(names.iter().copied()));
    }
}
