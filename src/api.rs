//! Seller backend API client.
//!
//! Provides authenticated HTTP communication with the marketplace backend.
//! Every authenticated request carries the session's token pair; a `403`
//! triggers one token refresh and a replay of the original request.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::session::{Session, AUTHORIZATION_HEADER, REFRESH_TOKEN_HEADER};

/// Default timeout for API requests (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_API_URL: &str = "http://localhost:8080";

const TOKEN_REFRESH_PATH: &str = "/api/auth/token/refresh";
const REQUEST_ID_HEADER: &str = "X-Request-Id";

// ---------------------------------------------------------------------------
// URL normalisation
// ---------------------------------------------------------------------------

/// Normalise the backend URL:
/// - strip trailing slashes
/// - strip a trailing `/api` segment
/// - ensure a scheme is present (https, or http for localhost)
pub fn normalize_api_url(url: &str) -> String {
    let mut url = url.trim().to_string();
    if url.is_empty() {
        return DEFAULT_API_URL.to_string();
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    while url.ends_with('/') {
        url.pop();
    }

    if url.ends_with("/api") {
        url.truncate(url.len() - 4);
    }

    // "/api/" leaves a trailing slash behind
    while url.ends_with('/') {
        url.pop();
    }

    url
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Convert a `reqwest::Error` into a user-friendly message.
fn friendly_error(url: &str, err: &reqwest::Error) -> ApiError {
    if err.is_connect() {
        return ApiError::Transport(format!("Cannot reach seller backend at {url}"));
    }
    if err.is_timeout() {
        return ApiError::Transport(format!("Connection to {url} timed out"));
    }
    if err.is_builder() {
        return ApiError::InvalidRequest(format!("Invalid seller backend URL: {url}"));
    }
    ApiError::Transport(format!("Network error communicating with {url}: {err}"))
}

/// Fallback message for a status code when the body carries none.
fn status_message(status: StatusCode) -> String {
    match status.as_u16() {
        400 => "Request was rejected by the seller backend".to_string(),
        401 => "Credentials are invalid or expired".to_string(),
        403 => "Seller is not authorized for this resource".to_string(),
        404 => "Seller backend endpoint not found".to_string(),
        409 => "Resource already exists".to_string(),
        s if s >= 500 => format!("Seller backend server error (HTTP {s})"),
        s => format!("Unexpected response from seller backend (HTTP {s})"),
    }
}

/// Pull the backend's `message` (or `error`) field out of an error body.
fn error_detail(status: StatusCode, body_text: &str) -> String {
    let trimmed = body_text.trim();
    if let Ok(json) = serde_json::from_str::<Value>(trimmed) {
        if let Some(message) = json
            .get("message")
            .or_else(|| json.get("error"))
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
        {
            return message.trim().to_string();
        }
        if let Some(s) = json.as_str().filter(|s| !s.trim().is_empty()) {
            return s.trim().to_string();
        }
    } else if !trimmed.is_empty() && trimmed.len() <= 512 && !trimmed.starts_with('<') {
        return trimmed.to_string();
    }
    status_message(status)
}

async fn check_status(resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body_text = resp.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status,
        message: error_detail(status, &body_text),
    })
}

/// Decode a JSON body.
pub async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
    let body_text = resp
        .text()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))?;
    serde_json::from_str(&body_text).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Read a message body. The backend answers with either a bare string or a
/// JSON-encoded string depending on the endpoint.
pub async fn read_message(resp: Response) -> Result<String, ApiError> {
    let body_text = resp
        .text()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))?;
    Ok(message_from_body(&body_text))
}

fn message_from_body(body_text: &str) -> String {
    let trimmed = body_text.trim();
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::String(s)) => s,
        Ok(json) => json
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| trimmed.to_string()),
        Err(_) => trimmed.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Token refresh
// ---------------------------------------------------------------------------

/// Obtains a new access token for a session whose token was rejected.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(
        &self,
        http: &Client,
        base_url: &str,
        session: &Session,
    ) -> Result<String, ApiError>;
}

/// Calls `POST /api/auth/token/refresh` with the current token pair.
pub struct BackendTokenRefresher;

#[async_trait]
impl TokenRefresher for BackendTokenRefresher {
    async fn refresh(
        &self,
        http: &Client,
        base_url: &str,
        session: &Session,
    ) -> Result<String, ApiError> {
        let (authorization, refresh_token) =
            session.auth_headers().ok_or(ApiError::SessionExpired)?;
        let url = format!("{base_url}{TOKEN_REFRESH_PATH}");
        let resp = http
            .post(&url)
            .header(AUTHORIZATION_HEADER, authorization)
            .header(REFRESH_TOKEN_HEADER, refresh_token)
            .send()
            .await
            .map_err(|e| friendly_error(base_url, &e))?;
        let resp = check_status(resp).await?;
        let token = read_message(resp).await?;
        if token.trim().is_empty() {
            return Err(ApiError::Decode("empty access token".into()));
        }
        Ok(token)
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct ApiClient {
    base_url: String,
    http: Client,
    session: Arc<Session>,
    refresher: Arc<dyn TokenRefresher>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration, session: Arc<Session>) -> Result<Self, ApiError> {
        Self::with_refresher(base_url, timeout, session, Arc::new(BackendTokenRefresher))
    }

    pub fn with_refresher(
        base_url: &str,
        timeout: Duration,
        session: Arc<Session>,
        refresher: Arc<dyn TokenRefresher>,
    ) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            base_url: normalize_api_url(base_url),
            http,
            session,
            refresher,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Absolute URL of a backend path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send one request, attaching auth headers when `authenticated`.
    async fn dispatch<F>(&self, authenticated: bool, build: &F) -> Result<Response, ApiError>
    where
        F: Fn(&Client) -> Result<RequestBuilder, ApiError>,
    {
        let mut req = build(&self.http)?.header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());
        if authenticated {
            let (authorization, refresh_token) =
                self.session.auth_headers().ok_or(ApiError::SessionExpired)?;
            req = req
                .header(AUTHORIZATION_HEADER, authorization)
                .header(REFRESH_TOKEN_HEADER, refresh_token);
        }
        req.send()
            .await
            .map_err(|e| friendly_error(&self.base_url, &e))
    }

    /// Run a request; on `403` refresh the access token once and replay it.
    ///
    /// The builder closure is invoked again for the replay so bodies that
    /// cannot be cloned (multipart forms) are rebuilt from scratch.
    pub async fn execute<F>(&self, authenticated: bool, build: F) -> Result<Response, ApiError>
    where
        F: Fn(&Client) -> Result<RequestBuilder, ApiError>,
    {
        let resp = self.dispatch(authenticated, &build).await?;
        if authenticated && resp.status() == StatusCode::FORBIDDEN {
            warn!(
                login_id = %self.session.login_id(),
                url = %resp.url(),
                "access token rejected, refreshing"
            );
            self.refresh_access_token().await?;
            let retried = self.dispatch(authenticated, &build).await?;
            return check_status(retried).await;
        }
        check_status(resp).await
    }

    async fn refresh_access_token(&self) -> Result<(), ApiError> {
        match self
            .refresher
            .refresh(&self.http, &self.base_url, &self.session)
            .await
        {
            Ok(token) => {
                self.session.set_access_token(&token);
                info!(login_id = %self.session.login_id(), "access token refreshed");
                Ok(())
            }
            Err(ApiError::Status { status, message }) if status == StatusCode::UNAUTHORIZED => {
                warn!(
                    login_id = %self.session.login_id(),
                    reason = %message,
                    "refresh token expired, clearing session"
                );
                self.session.clear();
                Err(ApiError::SessionExpired)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path);
        debug!(%url, "GET");
        let resp = self.execute(true, |http| Ok(http.get(&url))).await?;
        read_json(resp).await
    }

    /// Authenticated request whose response body is ignored.
    pub async fn send_empty(&self, method: Method, path: &str) -> Result<(), ApiError> {
        let url = self.endpoint(path);
        debug!(%url, %method, "request");
        self.execute(true, |http| Ok(http.request(method.clone(), &url)))
            .await?;
        Ok(())
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);
        debug!(%url, "PUT");
        let resp = self
            .execute(true, |http| Ok(http.put(&url).json(body)))
            .await?;
        read_json(resp).await
    }

    /// Unauthenticated JSON POST returning the backend's message string.
    pub async fn post_public<B>(&self, path: &str, body: &B) -> Result<String, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(path);
        debug!(%url, "POST (public)");
        let resp = self
            .execute(false, |http| Ok(http.post(&url).json(body)))
            .await?;
        read_message(resp).await
    }
}
