//! # Response Envelope
//!
//! Every route answers with `{data, pagination?, details, error?}`. A response whose
//! `error` is present and non-empty is a protocol error regardless of its status code.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Server-side error payload.
#[derive(Debug, Display, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[display("{code}: {message}")]
pub struct ApiError {
    /// Human readable message.
    #[serde(default)]
    pub message: String,
    /// Machine readable code (`E_NOT_FOUND`, ...).
    #[serde(default)]
    pub code: String,
}

impl ApiError {
    /// Creates an error payload.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
        }
    }

    /// True when neither a message nor a code is set.
    pub fn is_empty(&self) -> bool {
        self.message.is_empty() && self.code.is_empty()
    }
}

impl std::error::Error for ApiError {}

/// Pagination metadata for list responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Pagination {
    /// 1-based page number.
    pub page: u64,
    /// Page size.
    pub limit: u8,
    /// Rows matching the filter.
    pub filtered_count: u64,
    /// Rows in the collection.
    pub total_count: u64,
}

/// Request metadata echoed by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseDetails {
    /// Household the request was served for.
    #[serde(rename = "currentHouseholdID")]
    pub current_household_id: String,
    /// Trace id of the request.
    #[serde(rename = "traceID")]
    pub trace_id: String,
}

/// The uniform response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    /// Payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Present on list responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    /// Request metadata.
    #[serde(default)]
    pub details: ResponseDetails,
    /// Present when the request failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl<T> Default for ApiResponse<T> {
    fn default() -> Self {
        Self {
            data: None,
            pagination: None,
            details: ResponseDetails::default(),
            error: None,
        }
    }
}

impl<T> ApiResponse<T> {
    /// An envelope carrying nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// An envelope carrying `data`.
    pub fn with_data(data: T) -> Self {
        Self {
            data: Some(data),
            ..Self::default()
        }
    }

    /// An envelope carrying only an error.
    pub fn from_error(error: ApiError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    /// Attaches request metadata.
    pub fn with_details(mut self, details: ResponseDetails) -> Self {
        self.details = details;
        self
    }

    /// The error, if present and non-empty.
    pub fn protocol_error(&self) -> Option<&ApiError> {
        self.error.as_ref().filter(|e| !e.is_empty())
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// A list envelope.
    pub fn with_page(data: Vec<T>, pagination: Pagination) -> Self {
        Self {
            data: Some(data),
            pagination: Some(pagination),
            ..Self::default()
        }
    }
}

/// A decoded page of a list operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryFilteredResult<T> {
    /// Items on this page.
    pub data: Vec<T>,
    /// Pagination as reported by the server.
    pub pagination: Pagination,
}
