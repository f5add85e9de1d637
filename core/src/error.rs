//! # Error Handling
//!
//! Provides the unified `AppError` enum used by the document loader and the generator.

use derive_more::{Display, From};

/// The Global Error Enum.
///
/// Every variant is fatal for a generation run: the generator never emits partial output.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// Wrapper for JSON (de)serialization errors.
    #[display("JSON Error: {_0}")]
    Json(serde_json::Error),

    /// Wrapper for YAML parsing errors.
    #[display("YAML Error: {_0}")]
    Yaml(serde_yaml::Error),

    /// An operation without an `operationId`.
    #[from(ignore)]
    #[display("Operation {method} {path} has no operationId")]
    MissingOperationId {
        /// HTTP method of the offending operation.
        method: String,
        /// Path template of the offending operation.
        path: String,
    },

    /// A `$ref` that does not point at a known component.
    #[from(ignore)]
    #[display("Unresolved reference: {_0}")]
    UnresolvedReference(String),

    /// A `{placeholder}` in a path template with no matching path parameter.
    #[from(ignore)]
    #[display("Operation {operation} uses undeclared path parameter '{name}'")]
    UndeclaredPathParameter {
        /// Operation id.
        operation: String,
        /// Placeholder name.
        name: String,
    },

    /// Two operations (or files) collapse onto the same generated identifier.
    #[from(ignore)]
    #[display("Duplicate generated identifier: {_0}")]
    DuplicateIdentifier(String),

    /// A fixture default was requested for a primitive that has none.
    #[from(ignore)]
    #[display("No native default exists for type '{_0}'")]
    UnsupportedNativeDefault(String),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_io_conversion() {
        let io_err = Error::new(ErrorKind::Other, "test");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
    }

    #[test]
    fn test_string_conversion() {
        let msg = String::from("something wrong");
        let app_err: AppError = msg.into();
        match app_err {
            AppError::General(s) => assert_eq!(s, "something wrong"),
            _ => panic!("String should convert to AppError::General"),
        }
    }

    #[test]
    fn test_missing_operation_id_display() {
        let app_err = AppError::MissingOperationId {
            method: "GET".into(),
            path: "/api/v1/things".into(),
        };
        assert_eq!(
            app_err.to_string(),
            "Operation GET /api/v1/things has no operationId"
        );
    }
}
