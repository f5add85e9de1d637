#![deny(missing_docs)]

//! # Larder Shared
//!
//! The wire contract spoken by the meal planning server and its generated client:
//! the response envelope, pagination, the list query filter and the cancellation
//! context threaded through every async entry point.

/// Cancellation and deadlines.
pub mod context;

/// Response envelope types.
pub mod envelope;

/// List query filters and query string accumulation.
pub mod query_filter;

pub use context::{CancelHandle, Cancelled, Context};
pub use envelope::{ApiError, ApiResponse, Pagination, QueryFilteredResult, ResponseDetails};
pub use query_filter::{
    QueryFilter, QueryValues, SortBy, DEFAULT_QUERY_FILTER_LIMIT, MAX_QUERY_FILTER_LIMIT,
    QUERY_KEY_SEARCH,
};
