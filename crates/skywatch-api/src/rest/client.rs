// Ground-station REST client
//
// Wraps `reqwest::Client` with base-URL joining, bearer injection from the
// shared `Session`, and status classification. Endpoint groups (telemetry,
// reports, user, ...) are inherent methods in sibling modules so this file
// stays focused on transport mechanics.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::rest::models::ErrorBody;
use crate::session::Session;
use crate::transport::TransportConfig;

/// HTTP client for the ground-station backend.
///
/// Every request carries `Authorization: Bearer <token>` when the session
/// holds one. A 401 on any request clears the session credential and issues
/// the reauthentication signal before [`Error::Unauthorized`] is returned.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    session: Arc<Session>,
    /// Request timeout configured on `http`, when known.
    timeout: Option<Duration>,
}

impl ApiClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the API root, e.g. `http://127.0.0.1:5000/api`.
    pub fn new(base_url: Url, session: Arc<Session>, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            timeout: Some(transport.timeout),
            ..Self::with_client(http, base_url, session)
        })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, session: Arc<Session>) -> Self {
        Self {
            http,
            base_url,
            session,
            timeout: None,
        }
    }

    /// Parse a base URL string and build a client with a plain `reqwest::Client`.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client, session: Arc<Session>) -> Result<Self, Error> {
        let base_url = Url::parse(base_url)?;
        Ok(Self::with_client(http, base_url, session))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// The underlying HTTP client (for flows that must not carry the bearer).
    pub(crate) fn http_client(&self) -> &reqwest::Client {
        &self.http
    }

    /// Map a failed send or body read. Timeouts get their own variant.
    pub(crate) fn request_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            let timeout_ms = self
                .timeout
                .map_or(0, |t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX));
            return Error::Timeout { timeout_ms };
        }
        Error::Transport(err)
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/{path}`, tolerant of trailing/leading slashes on either side.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let full = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Ok(Url::parse(&full)?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.session.bearer() {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    /// Send a GET request and decode the JSON body.
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.api_url(path)?;
        debug!("GET {}", url);

        let resp = self
            .authorize(self.http.get(url))
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        self.parse_response(resp).await
    }

    /// Send a POST request with JSON body and decode the JSON response.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, Error> {
        let url = self.api_url(path)?;
        debug!("POST {}", url);

        let resp = self
            .authorize(self.http.post(url))
            .json(body)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        self.parse_response(resp).await
    }

    /// Send a PUT request with JSON body and decode the JSON response.
    pub(crate) async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, Error> {
        let url = self.api_url(path)?;
        debug!("PUT {}", url);

        let resp = self
            .authorize(self.http.put(url))
            .json(body)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        self.parse_response(resp).await
    }

    /// Classify the status and decode the body.
    ///
    /// 401 invalidates the session; any other non-2xx becomes
    /// [`Error::Api`] with the backend's `error` or `message` text.
    async fn parse_response<T: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED {
            self.session.invalidate();
            return Err(Error::Unauthorized);
        }

        let body = resp.text().await.map_err(|e| self.request_error(e))?;

        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}

/// Pull a human-readable message out of an error body.
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    parsed
        .error
        .or(parsed.message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map_or_else(|| format!("HTTP {status}"), str::to_owned)
        })
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
