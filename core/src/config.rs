#![deny(missing_docs)]

//! # Generator Configuration
//!
//! The single record of tables that steer generation: which operations are skipped,
//! which POST paths carry no body, which operations return the raw HTTP response,
//! and which schemas are provided by the runtime instead of being emitted as models.
//!
//! The record is passed explicitly to `ClientGenerator::new` and to the document loader.

use crate::error::AppResult;
use indexmap::IndexMap;
use larder_shared::DEFAULT_QUERY_FILTER_LIMIT;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Banner placed at the top of every generated file.
pub const GENERATED_BANNER: &str = "// GENERATED CODE, DO NOT EDIT MANUALLY";

/// Configuration consumed by the document loader and the client generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneratorConfig {
    /// Operation ids that are modelled but never emitted.
    pub skip_operations: BTreeSet<String>,
    /// POST path templates that never carry a request body.
    pub bodyless_post_paths: BTreeSet<String>,
    /// Operation ids that return the raw HTTP response instead of an envelope.
    pub raw_response_operations: BTreeSet<String>,
    /// Operation extension attribute that opts an operation into raw responses.
    pub raw_response_extension: String,
    /// Schemas implemented by the runtime, mapped to the Rust path that replaces them.
    pub runtime_schemas: IndexMap<String, String>,
    /// Path of the runtime module as seen from the generated code.
    ///
    /// Generated methods are inherent `impl Client` blocks, so this always names a
    /// module of the crate that defines `Client`.
    pub runtime_crate: String,
    /// Page size generated list methods request when the caller passes no filter.
    pub default_query_limit: u8,
    /// First line of every generated file.
    pub banner: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        let skip_operations = ["CheckForLiveness", "CheckForReadiness", "GetRecipeDAG"];
        let bodyless_post_paths = [
            "/api/v1/households/{householdID}/default",
            "/api/v1/recipes/{recipeID}/clone",
            "/api/v1/meal_plans/{mealPlanID}/finalize",
        ];
        let raw_response_operations = ["UpdatePassword", "LoginForToken", "AdminLoginForToken"];
        let runtime_schemas = [
            ("APIResponse", "ApiResponse"),
            ("APIError", "ApiError"),
            ("Pagination", "Pagination"),
            ("ResponseDetails", "ResponseDetails"),
        ];

        Self {
            skip_operations: skip_operations.iter().map(|s| s.to_string()).collect(),
            bodyless_post_paths: bodyless_post_paths.iter().map(|s| s.to_string()).collect(),
            raw_response_operations: raw_response_operations
                .iter()
                .map(|s| s.to_string())
                .collect(),
            raw_response_extension: "x-return-raw-response".to_string(),
            runtime_schemas: runtime_schemas
                .iter()
                .map(|(schema, ty)| (schema.to_string(), ty.to_string()))
                .collect(),
            runtime_crate: "crate".to_string(),
            default_query_limit: DEFAULT_QUERY_FILTER_LIMIT,
            banner: GENERATED_BANNER.to_string(),
        }
    }
}

impl GeneratorConfig {
    /// Loads a configuration from YAML (or JSON) text.
    /// Missing fields fall back to the defaults.
    pub fn from_yaml_str(raw: &str) -> AppResult<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Overrides the runtime module path.
    pub fn with_runtime_crate(mut self, runtime_crate: impl Into<String>) -> Self {
        self.runtime_crate = runtime_crate.into();
        self
    }

    /// True when the operation is modelled but not emitted.
    pub fn is_skipped(&self, operation_id: &str) -> bool {
        self.skip_operations.contains(operation_id)
    }

    /// True when a POST on this path template must be sent without a body.
    pub fn is_bodyless_post(&self, path: &str) -> bool {
        self.bodyless_post_paths.contains(path)
    }

    /// Resolves the runtime type path replacing a component schema, if any.
    pub fn runtime_type(&self, schema_name: &str) -> Option<String> {
        self.runtime_schemas
            .get(schema_name)
            .map(|ty| format!("{}::{}", self.runtime_crate, ty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables() {
        let config = GeneratorConfig::default();
        assert!(config.is_skipped("CheckForLiveness"));
        assert!(config.is_skipped("GetRecipeDAG"));
        assert!(!config.is_skipped("GetMealPlan"));
        assert!(config.is_bodyless_post("/api/v1/meal_plans/{mealPlanID}/finalize"));
        assert!(config.raw_response_operations.contains("LoginForToken"));
        assert_eq!(config.default_query_limit, 50);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = GeneratorConfig::from_yaml_str(
            "skipOperations: [Foo]\nruntimeCrate: crate::api\n",
        )
        .unwrap();
        assert!(config.is_skipped("Foo"));
        assert!(!config.is_skipped("CheckForLiveness"));
        assert!(config.is_bodyless_post("/api/v1/recipes/{recipeID}/clone"));
        assert_eq!(
            config.runtime_type("Pagination").as_deref(),
            Some("crate::api::Pagination")
        );
    }
}
