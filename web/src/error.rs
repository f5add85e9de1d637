//! # Error Handling
//!
//! Every failing route answers with the standard envelope carrying
//! `error = {message, code}`; the status follows the voting error's kind.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use derive_more::{Display, From};
use larder_shared::{ApiError, ApiResponse};
use larder_voting::{ErrorKind, VotingError};

/// Errors raised by the web layer.
#[derive(Debug, Display, From)]
pub enum WebError {
    /// The voting engine refused or failed.
    #[display("{_0}")]
    Voting(VotingError),

    /// A required identity header was absent or empty.
    #[from(ignore)]
    #[display("missing {_0} header")]
    MissingHeader(&'static str),

    /// The request body or path could not be decoded.
    #[from(ignore)]
    #[display("invalid request: {_0}")]
    BadRequest(String),

    /// Startup failures: socket binding, pool construction.
    #[from(ignore)]
    #[display("{_0}")]
    Startup(String),
}

impl std::error::Error for WebError {}

impl From<std::io::Error> for WebError {
    fn from(err: std::io::Error) -> Self {
        Self::Startup(err.to_string())
    }
}

impl WebError {
    /// Stable machine-readable code carried in the envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Voting(err) => match err.kind() {
                ErrorKind::InvalidInput => "E_INVALID_INPUT",
                ErrorKind::NotFound => "E_NOT_FOUND",
                ErrorKind::Conflict => "E_CONFLICT",
                ErrorKind::Unauthorized => "E_FORBIDDEN",
                ErrorKind::Internal => "E_INTERNAL",
            },
            Self::MissingHeader(_) => "E_UNAUTHENTICATED",
            Self::BadRequest(_) => "E_INVALID_INPUT",
            Self::Startup(_) => "E_INTERNAL",
        }
    }
}

impl ResponseError for WebError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Voting(err) => match err.kind() {
                ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::MissingHeader(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Startup(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        // Internal details stay in the log.
        let message = if status.is_server_error() {
            "internal error".to_string()
        } else {
            self.to_string()
        };
        HttpResponse::build(status).json(ApiResponse::<()>::from_error(ApiError::new(
            self.code(),
            message,
        )))
    }
}

/// Helper type alias for Result using WebError.
pub type WebResult<T> = Result<T, WebError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn test_conflict_renders_envelope() {
        let err = WebError::from(VotingError::PlanAlreadyFinalized("p".into()));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let envelope: ApiResponse<()> = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            envelope.error,
            Some(ApiError::new("E_CONFLICT", "meal plan p is already finalized"))
        );
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            WebError::MissingHeader("X-User-ID").status_code(),
            StatusCode::UNAUTHORIZED
        );
        let forbidden = WebError::from(VotingError::VoterNotEligible {
            voter_id: "u".into(),
            meal_plan_id: "p".into(),
        });
        assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            WebError::from(VotingError::Storage("boom".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
