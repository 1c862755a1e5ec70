use thiserror::Error;

/// Top-level error type for the `skywatch-api` crate.
///
/// Covers every failure mode of the ground-station backend:
/// login, transport, REST responses, the push channel, and payload decoding.
/// `skywatch-core` folds these into resource outcomes or user-facing errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected (wrong email or password).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The backend answered 401 to an authenticated request.
    /// The held credential has already been cleared when this is returned.
    #[error("Session rejected by backend -- re-authentication required")]
    Unauthorized,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or HTTP client construction failed.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Request timed out.
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    // ── Backend ─────────────────────────────────────────────────────
    /// Non-success response carrying the backend's `error`/`message` text.
    #[error("Backend error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Request rejected before it left the client.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // ── Push channel ────────────────────────────────────────────────
    /// Push connection could not be established or broke mid-stream.
    #[error("Push connection failed: {0}")]
    PushConnect(String),

    /// Push channel closed by the server.
    #[error("Push channel closed (code {code}): {reason}")]
    PushClosed { code: u16, reason: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the backend rejected the held credential.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
            || matches!(self, Self::Transport(e) if e.status() == Some(reqwest::StatusCode::UNAUTHORIZED))
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Timeout { .. } | Self::PushConnect(_) | Self::PushClosed { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }

    /// HTTP status attached to the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Unauthorized | Self::Authentication { .. } => Some(401),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
