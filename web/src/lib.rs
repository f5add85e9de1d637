#![deny(missing_docs)]

//! # Larder Web Library
//!
//! Route handlers, the Postgres store and the database schema of the meal plan
//! voting server.

/// Re-export diesel so the schema and row structs can access `crate::diesel`.
pub use diesel;

/// Server settings.
pub mod config;

/// Error types.
pub mod error;

/// Row structs for the voting tables.
pub mod models;

/// Route handlers.
pub mod routes;

/// Auto-generated database schema.
pub mod schema;

/// Postgres implementation of the voting store.
pub mod store;

pub use config::WebConfig;
pub use error::{WebError, WebResult};
pub use routes::configure;
pub use store::PgStore;
