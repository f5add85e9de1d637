//! # Client Errors
//!
//! Every failure of a generated method is one of these variants. Guards on the
//! caller's input fail before any I/O; transport and build failures carry the
//! description of the step that failed.

use derive_more::Display;
use larder_shared::{ApiError, Cancelled};

/// The error returned by generated client methods.
#[derive(Debug, Display, Clone, PartialEq)]
pub enum ClientError {
    /// A required request body was `None`.
    #[display("nil input provided")]
    NilInputProvided,

    /// A path identifier (or required search term) was empty.
    #[display("invalid ID provided: {name}")]
    InvalidIdProvided {
        /// Parameter name as declared in the API document.
        name: String,
    },

    /// The request body failed its `Validate` check.
    #[display("input validation failed: {_0}")]
    InputValidationFailed(String),

    /// The URL or request could not be assembled.
    #[display("{context}: {message}")]
    BuildRequestFailed {
        /// The step that failed.
        context: String,
        /// Underlying cause.
        message: String,
    },

    /// The round trip failed or the response could not be decoded.
    #[display("{context}: {message}")]
    TransportFailed {
        /// The step that failed.
        context: String,
        /// Underlying cause.
        message: String,
    },

    /// The server answered with a non-empty envelope error.
    #[display("protocol error: {_0}")]
    ProtocolError(ApiError),

    /// The caller's context was cancelled or its deadline passed.
    #[display("request cancelled")]
    Cancelled,
}

impl ClientError {
    /// `InvalidIdProvided` for `name`.
    pub fn invalid_id(name: &str) -> Self {
        Self::InvalidIdProvided {
            name: name.to_string(),
        }
    }

    pub(crate) fn build(message: impl ToString) -> Self {
        Self::BuildRequestFailed {
            context: String::new(),
            message: message.to_string(),
        }
    }

    pub(crate) fn transport(message: impl ToString) -> Self {
        Self::TransportFailed {
            context: String::new(),
            message: message.to_string(),
        }
    }

    /// Fills in the failing step of build and transport errors that have none yet.
    pub fn with_context(self, description: &str) -> Self {
        match self {
            Self::BuildRequestFailed { context, message } if context.is_empty() => {
                Self::BuildRequestFailed {
                    context: description.to_string(),
                    message,
                }
            }
            Self::TransportFailed { context, message } if context.is_empty() => {
                Self::TransportFailed {
                    context: description.to_string(),
                    message,
                }
            }
            other => other,
        }
    }
}

impl std::error::Error for ClientError {}

impl From<Cancelled> for ClientError {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}

impl From<ApiError> for ClientError {
    fn from(err: ApiError) -> Self {
        Self::ProtocolError(err)
    }
}

/// Helper type alias for Result using ClientError.
pub type ClientResult<T> = Result<T, ClientError>;
