//! Conversion of decoded envelopes into method results.

use crate::error::{ClientError, ClientResult};
use larder_shared::{ApiResponse, QueryFilteredResult};

/// Unwraps an `ApiResponse` into what a generated method returns.
///
/// Each conversion turns a non-empty envelope error into `ProtocolError`.
pub trait ResponseEnvelope<D> {
    /// The payload; a missing payload is a decoding failure.
    fn into_data(self) -> ClientResult<D>;

    /// Nothing, for operations that return no data.
    fn into_empty(self) -> ClientResult<()>;

    /// The payload plus pagination, for list operations.
    fn into_query_filtered_result<T>(self) -> ClientResult<QueryFilteredResult<T>>
    where
        D: Into<Vec<T>>;
}

impl<D> ResponseEnvelope<D> for ApiResponse<D> {
    fn into_data(self) -> ClientResult<D> {
        if let Some(err) = self.protocol_error() {
            return Err(ClientError::ProtocolError(err.clone()));
        }
        self.data
            .ok_or_else(|| ClientError::transport("response envelope carried no data"))
    }

    fn into_empty(self) -> ClientResult<()> {
        match self.protocol_error() {
            Some(err) => Err(ClientError::ProtocolError(err.clone())),
            None => Ok(()),
        }
    }

    fn into_query_filtered_result<T>(self) -> ClientResult<QueryFilteredResult<T>>
    where
        D: Into<Vec<T>>,
    {
        if let Some(err) = self.protocol_error() {
            return Err(ClientError::ProtocolError(err.clone()));
        }
        Ok(QueryFilteredResult {
            data: self.data.map(Into::into).unwrap_or_default(),
            pagination: self.pagination.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use larder_shared::{ApiError, Pagination};

    #[test]
    fn test_into_data() {
        assert_eq!(ApiResponse::with_data(3).into_data(), Ok(3));
        assert!(matches!(
            ApiResponse::<u8>::empty().into_data(),
            Err(ClientError::TransportFailed { .. })
        ));
    }

    #[test]
    fn test_errors_win_over_data() {
        let mut response = ApiResponse::with_data("x".to_string());
        response.error = Some(ApiError::new("E_CONFLICT", "plan finalized"));
        assert_eq!(
            response.clone().into_data(),
            Err(ClientError::ProtocolError(ApiError::new(
                "E_CONFLICT",
                "plan finalized"
            )))
        );
        assert!(response.into_empty().is_err());
    }

    #[test]
    fn test_into_query_filtered_result() {
        let pagination = Pagination {
            page: 2,
            limit: 1,
            filtered_count: 3,
            total_count: 4,
        };
        let result = ApiResponse::with_page(vec!["a"], pagination.clone())
            .into_query_filtered_result()
            .unwrap();
        assert_eq!(
            result,
            QueryFilteredResult {
                data: vec!["a"],
                pagination
            }
        );
    }
}
