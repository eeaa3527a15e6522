//! Shared helpers for tests that talk to a local HTTP backend.

use axum::http::HeaderMap;
use axum::Router;
use std::sync::Arc;

use crate::api::{ApiClient, DEFAULT_TIMEOUT};
use crate::session::Session;

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    format!("http://{addr}")
}

/// Client signed in as `seller01` with access token `acc-1` / refresh `ref-1`.
pub fn signed_in_client(base_url: &str) -> ApiClient {
    let session = Arc::new(Session::new("seller01", "Bearer", "acc-1", "ref-1"));
    ApiClient::new(base_url, DEFAULT_TIMEOUT, session).expect("client")
}

pub fn anonymous_client(base_url: &str) -> ApiClient {
    ApiClient::new(base_url, DEFAULT_TIMEOUT, Arc::new(Session::anonymous())).expect("client")
}

pub fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
