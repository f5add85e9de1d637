#![deny(missing_docs)]

//! # Larder Client
//!
//! HTTP client for the meal planning API. The per-operation methods, the
//! observability keys and the request/response models are generated at build time
//! from `openapi.yaml`; this crate supplies the runtime they are written against.
//!
//! ```no_run
//! # async fn demo() -> Result<(), larder_client::ClientError> {
//! use larder_client::{Client, Context};
//!
//! let client = Client::parse("http://localhost:8080")?;
//! let plan = client.get_meal_plan(&Context::background(), "plan-id").await?;
//! println!("{}", plan.status);
//! # Ok(())
//! # }
//! ```

mod client;
mod envelope;
mod validate;

/// Client error types.
pub mod error;

/// Logging and span helpers used by generated methods.
pub mod observability;

#[cfg(test)]
mod test_support;

pub use client::Client;
pub use envelope::ResponseEnvelope;
pub use error::{ClientError, ClientResult};
pub use larder_shared::{
    ApiError, ApiResponse, CancelHandle, Context, Pagination, QueryFilter, QueryFilteredResult,
    QueryValues, ResponseDetails, SortBy, QUERY_KEY_SEARCH,
};
pub use validate::Validate;

include!(concat!(env!("OUT_DIR"), "/client_operations.rs"));
