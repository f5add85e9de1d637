//! # HTTP Client
//!
//! The transport half of the generated API: URL assembly, request building and
//! envelope decoding. Generated methods only ever talk to the network through the
//! helpers below.

use crate::error::{ClientError, ClientResult};
use crate::observability::Logger;
use larder_shared::{ApiResponse, Context, QueryValues};
use reqwest::{Method, Request, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

/// Client for the meal planning API.
///
/// Authentication is left to the supplied `reqwest::Client` (default headers,
/// cookie store).
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    http: reqwest::Client,
    logger: Logger,
}

impl Client {
    /// A client using a default transport.
    pub fn new(base_url: Url) -> Self {
        Self::with_http_client(base_url, reqwest::Client::new())
    }

    /// A client using the given transport.
    pub fn with_http_client(base_url: Url, http: reqwest::Client) -> Self {
        Self {
            base_url,
            http,
            logger: Logger::new("larder_client"),
        }
    }

    /// Parses `base_url` and builds a client for it.
    pub fn parse(base_url: &str) -> ClientResult<Self> {
        let url = Url::parse(base_url)
            .map_err(|e| ClientError::build(format!("parsing base URL {}: {}", base_url, e)))?;
        Ok(Self::new(url))
    }

    /// The server root.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The logger every call starts from.
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Resolves `path` against the base URL; an empty `values` leaves no query string.
    pub(crate) fn build_url(&self, values: Option<&QueryValues>, path: &str) -> ClientResult<Url> {
        if self.base_url.cannot_be_a_base() {
            return Err(ClientError::build(format!(
                "base URL {} cannot carry a path",
                self.base_url
            )));
        }
        let mut url = self.base_url.clone();
        let prefix = self.base_url.path().trim_end_matches('/');
        url.set_path(&format!("{}{}", prefix, path));
        match values {
            Some(values) if !values.is_empty() => url.set_query(Some(&values.encode())),
            _ => url.set_query(None),
        }
        Ok(url)
    }

    /// A request without a body.
    pub(crate) fn build_request(&self, method: Method, url: Url) -> ClientResult<Request> {
        self.http
            .request(method, url)
            .build()
            .map_err(ClientError::build)
    }

    /// A request carrying `input` as JSON.
    pub(crate) fn build_data_request<T: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        input: &T,
    ) -> ClientResult<Request> {
        let body = serde_json::to_vec(input).map_err(ClientError::build)?;
        self.http
            .request(method, url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .build()
            .map_err(ClientError::build)
    }

    /// Executes `req`, returning the response whatever its status.
    pub(crate) async fn fetch_response(&self, ctx: &Context, req: Request) -> ClientResult<Response> {
        ctx.run(self.http.execute(req))
            .await?
            .map_err(ClientError::transport)
    }

    /// Executes `req` and decodes the envelope.
    ///
    /// An empty success body decodes as an empty envelope. A non-empty envelope
    /// error becomes `ProtocolError` whatever the status; any other non-2xx answer
    /// is a transport failure.
    pub(crate) async fn fetch_and_unmarshal<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        req: Request,
    ) -> ClientResult<ApiResponse<T>> {
        let res = self.fetch_response(ctx, req).await?;
        let status = res.status();
        let body = ctx.run(res.bytes()).await?.map_err(ClientError::transport)?;

        if body.iter().all(u8::is_ascii_whitespace) {
            return if status.is_success() {
                Ok(ApiResponse::default())
            } else {
                Err(ClientError::transport(format!("unexpected status {}", status)))
            };
        }

        let decoded: ApiResponse<T> = serde_json::from_slice(&body).map_err(|e| {
            if status.is_success() {
                ClientError::transport(format!("decoding response body: {}", e))
            } else {
                ClientError::transport(format!(
                    "unexpected status {}: {}",
                    status,
                    String::from_utf8_lossy(&body)
                ))
            }
        })?;
        if let Some(err) = decoded.protocol_error() {
            return Err(ClientError::ProtocolError(err.clone()));
        }
        if !status.is_success() {
            return Err(ClientError::transport(format!("unexpected status {}", status)));
        }
        Ok(decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{self, RequestSpec};
    use larder_shared::{ApiError, QueryFilter};

    #[test]
    fn test_build_url_keeps_base_path_and_sorts_query() {
        let client = Client::parse("http://localhost:8080/larder/").unwrap();
        let mut values = QueryFilter::default().to_values();
        values.set("q", "kale");
        let url = client
            .build_url(Some(&values), "/api/v1/valid_ingredients/search")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/larder/api/v1/valid_ingredients/search?limit=50&page=1&q=kale&sortBy=asc"
        );
        let bare = client.build_url(Some(&QueryValues::new()), "/x").unwrap();
        assert_eq!(bare.query(), None);
    }

    #[test]
    fn test_build_url_rejects_opaque_bases() {
        let client = test_support::build_test_client_with_invalid_url();
        assert!(matches!(
            client.build_url(None, "/api/v1/meal_plans"),
            Err(ClientError::BuildRequestFailed { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            Client::parse("not a url"),
            Err(ClientError::BuildRequestFailed { .. })
        ));
    }

    #[actix_web::test]
    async fn test_non_envelope_error_status_is_transport_failure() {
        let spec = RequestSpec::new("GET", "/broken", "", 502, false);
        let (client, _server) = test_support::build_test_client_with_body(spec, "bad gateway").await;
        let url = client.build_url(None, "/broken").unwrap();
        let req = client.build_request(Method::GET, url).unwrap();

        let err = client
            .fetch_and_unmarshal::<serde_json::Value>(&Context::background(), req)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("502"));
    }

    #[actix_web::test]
    async fn test_envelope_error_is_protocol_error() {
        let spec = RequestSpec::new("GET", "/missing", "", 404, false);
        let expected = ApiResponse::<()>::from_error(ApiError::new("E_NOT_FOUND", "no such plan"));
        let (client, _server) = test_support::build_test_client_with_json_response(spec, &expected).await;
        let url = client.build_url(None, "/missing").unwrap();
        let req = client.build_request(Method::GET, url).unwrap();

        let err = client
            .fetch_and_unmarshal::<serde_json::Value>(&Context::background(), req)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ClientError::ProtocolError(ApiError::new("E_NOT_FOUND", "no such plan"))
        );
    }

    #[actix_web::test]
    async fn test_cancelled_context_short_circuits() {
        let (ctx, handle) = Context::with_cancel();
        handle.cancel();
        let client = test_support::build_test_client_with_unreachable_server();
        let url = client.build_url(None, "/api/v1/meal_plans").unwrap();
        let req = client.build_request(Method::GET, url).unwrap();
        assert_eq!(
            client.fetch_response(&ctx, req).await.unwrap_err(),
            ClientError::Cancelled
        );
    }
}
