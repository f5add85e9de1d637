#![deny(missing_docs)]

//! # Larder Codegen
//!
//! Loads the meal planning OpenAPI document into an operation model and generates the
//! Rust API client from it.
//!
//! ```text
//! spec text --parse_openapi_document--> ApiSpec --ClientGenerator::generate--> GeneratedClient
//! ```

/// Shared error types.
pub mod error;

/// Generator configuration tables.
pub mod config;

/// Identifier and observability key naming.
pub mod naming;

/// Schema to type vocabulary mapping.
pub mod type_mapping;

/// OpenAPI loading and the operation model.
pub mod oas;

/// Client source generation.
pub mod codegen;

pub use codegen::{ClientGenerator, GeneratedClient, GeneratedFile, GeneratedFileKind};
pub use config::{GeneratorConfig, GENERATED_BANNER};
pub use error::{AppError, AppResult};
pub use oas::models::{ApiSpec, DataType, HttpMethod, Operation, Param, ResponseType};
pub use oas::parse_openapi_document;
pub use type_mapping::PrimitiveType;
