//! Test helpers for client methods: an in-process actix-web server that checks the
//! incoming request against a `RequestSpec` and answers with a canned body.

use crate::Client;
use actix_web::dev::ServerHandle;
use actix_web::http::StatusCode;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use serde::Serialize;
use std::net::TcpListener;
use url::{form_urlencoded, Url};

/// A random identifier for path parameters.
pub(crate) fn fake_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// What the mock server expects to receive.
#[derive(Debug, Clone)]
pub(crate) struct RequestSpec {
    method: String,
    path: String,
    query: String,
    status: u16,
    body_expected: bool,
}

impl RequestSpec {
    pub(crate) fn new(
        method: &str,
        path: impl Into<String>,
        query: &str,
        status: u16,
        body_expected: bool,
    ) -> Self {
        Self {
            method: method.to_string(),
            path: path.into(),
            query: query.to_string(),
            status,
            body_expected,
        }
    }

    fn mismatch(&self, req: &HttpRequest, body: &[u8]) -> Option<String> {
        if req.method().as_str() != self.method {
            return Some(format!("method: expected {}, got {}", self.method, req.method()));
        }
        if req.path() != self.path {
            return Some(format!("path: expected {}, got {}", self.path, req.path()));
        }
        let expected = sorted_pairs(&self.query);
        let actual = sorted_pairs(req.query_string());
        if expected != actual {
            return Some(format!("query: expected {:?}, got {:?}", expected, actual));
        }
        if self.body_expected == body.is_empty() {
            return Some(format!(
                "body: expected {}, got {} bytes",
                if self.body_expected { "a body" } else { "no body" },
                body.len()
            ));
        }
        None
    }
}

fn sorted_pairs(query: &str) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();
    pairs.sort();
    pairs
}

struct MockResponse {
    spec: RequestSpec,
    status: u16,
    body: String,
}

async fn respond(req: HttpRequest, body: web::Bytes, mock: web::Data<MockResponse>) -> HttpResponse {
    if let Some(mismatch) = mock.spec.mismatch(&req, &body) {
        return HttpResponse::build(StatusCode::IM_A_TEAPOT).body(mismatch);
    }
    let status = StatusCode::from_u16(mock.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status)
        .content_type("application/json")
        .body(mock.body.clone())
}

/// Stops the mock server when dropped.
pub(crate) struct TestServer {
    handle: ServerHandle,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        // The stop command is sent eagerly; the returned future only awaits completion.
        let _ = self.handle.stop(false);
    }
}

async fn serve(spec: RequestSpec, status: u16, body: String) -> (Client, TestServer) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock server");
    let addr = listener.local_addr().expect("mock server address");
    let mock = web::Data::new(MockResponse { spec, status, body });

    let server = HttpServer::new(move || {
        App::new()
            .app_data(mock.clone())
            .default_service(web::to(respond))
    })
    .workers(1)
    .listen(listener)
    .expect("listen on mock server socket")
    .run();
    let handle = server.handle();
    actix_web::rt::spawn(server);

    let client = Client::parse(&format!("http://{}", addr)).expect("mock server URL");
    (client, TestServer { handle })
}

/// A server answering `expected` as JSON with the operation's success status.
pub(crate) async fn build_test_client_with_json_response<T: Serialize>(
    spec: RequestSpec,
    expected: &T,
) -> (Client, TestServer) {
    let body = serde_json::to_string(expected).expect("serialize expected response");
    build_test_client_with_body(spec, body).await
}

/// A server answering `body` verbatim with the operation's success status.
pub(crate) async fn build_test_client_with_body(
    spec: RequestSpec,
    body: impl Into<String>,
) -> (Client, TestServer) {
    let status = spec.status;
    serve(spec, status, body.into()).await
}

/// A server answering a body that is not JSON.
pub(crate) async fn build_test_client_with_invalid_response(spec: RequestSpec) -> (Client, TestServer) {
    serve(spec, 200, "}{ not json".to_string()).await
}

/// A client that is never expected to reach the network.
pub(crate) fn build_simple_test_client() -> Client {
    Client::parse("http://127.0.0.1:9").expect("static URL")
}

/// A client whose base URL cannot carry a path.
pub(crate) fn build_test_client_with_invalid_url() -> Client {
    Client::new(Url::parse("mailto:larder@example.com").expect("static URL"))
}

/// A client pointed at a port nothing listens on.
pub(crate) fn build_test_client_with_unreachable_server() -> Client {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind probe socket");
    let addr = listener.local_addr().expect("probe address");
    drop(listener);
    Client::parse(&format!("http://{}", addr)).expect("probe URL")
}
