// ── Core error types ──
//
// User-facing errors from skywatch-core. Resource fetches never surface
// these; they become outcomes and land in the store. `CoreError` covers the
// operations a caller awaits directly: login, profile, servo, registration.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach ground station at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Session expired -- log in again")]
    ReauthRequired,

    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    // ── Resource errors ──────────────────────────────────────────────
    #[error("Invalid resource '{name}': {reason}")]
    InvalidResource { name: String, reason: String },

    #[error("Resource already registered: {name}")]
    DuplicateResource { name: String },

    #[error("Unknown resource: {name}")]
    UnknownResource { name: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// `true` when the user has to log in (again) before retrying.
    pub fn needs_login(&self) -> bool {
        matches!(self, Self::ReauthRequired | Self::AuthenticationFailed { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<skywatch_api::Error> for CoreError {
    fn from(err: skywatch_api::Error) -> Self {
        use skywatch_api::Error as E;

        match err {
            E::Authentication { message } => CoreError::AuthenticationFailed { message },
            E::Unauthorized => CoreError::ReauthRequired,
            E::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_ms: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e.url().map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            E::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            E::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            E::Timeout { timeout_ms } => CoreError::Timeout { timeout_ms },
            E::Api { status: 404, message } => CoreError::NotFound { message },
            E::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            E::InvalidRequest(message) => CoreError::ValidationFailed { message },
            E::PushConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("push connection failed: {reason}"),
            },
            E::PushClosed { code, reason } => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("push channel closed (code {code}): {reason}"),
            },
            E::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
