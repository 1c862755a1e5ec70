//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use skywatch_config::ConfigError;
use skywatch_core::{CoreError, ErrorDescriptor, ErrorKind};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the ground station at {url}")]
    #[diagnostic(
        code(skywatch::connection_failed),
        help(
            "Check that the backend is running and reachable.\n\
             URL: {url}\n\
             Try: skywatch status --backend http://<host>:5000/api"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(skywatch::auth_failed),
        help(
            "Verify the email and password for profile '{profile}'.\n\
             Run: skywatch config set-password --profile {profile}"
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(skywatch::no_credentials),
        help(
            "Configure credentials with: skywatch config init\n\
             Or set SKYWATCH_EMAIL and SKYWATCH_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{what} not found: {message}")]
    #[diagnostic(code(skywatch::not_found))]
    NotFound { what: String, message: String },

    #[error("Unknown resource '{name}'")]
    #[diagnostic(
        code(skywatch::unknown_resource),
        help("Configured resources: {available}")
    )]
    UnknownResource { name: String, available: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Backend error ({code}): {message}")]
    #[diagnostic(code(skywatch::api_error))]
    ApiError { code: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(skywatch::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(skywatch::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: skywatch config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No backend configured")]
    #[diagnostic(
        code(skywatch::no_config),
        help(
            "Create a profile with: skywatch config init\n\
             Or pass --backend. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(skywatch::config))]
    Config(Box<ConfigError>),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(skywatch::timeout),
        help("Increase timeout with --timeout or check the drone link.")
    )]
    Timeout { seconds: u64 },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            other => Self::Config(Box::new(other)),
        }
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::UnknownResource { .. } | Self::ProfileNotFound { .. } => {
                exit_code::NOT_FOUND
            }
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NoConfig { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Error for a resource whose first cycle produced nothing to show.
    pub fn from_descriptor(resource: &str, err: &ErrorDescriptor, url: &str, profile: &str) -> Self {
        match err.kind {
            ErrorKind::Transport => Self::ConnectionFailed {
                url: url.into(),
                reason: err.message.clone(),
            },
            ErrorKind::Authorization => Self::AuthFailed {
                profile: profile.into(),
                message: err.message.clone(),
            },
            ErrorKind::Empty => Self::NotFound {
                what: resource.into(),
                message: err.message.clone(),
            },
            ErrorKind::Application | ErrorKind::DataShape => Self::ApiError {
                code: err.status.map_or_else(|| err.kind.to_string(), |s| s.to_string()),
                message: err.message.clone(),
            },
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed {
                profile: "current".into(),
                message,
            },

            CoreError::ReauthRequired => CliError::AuthFailed {
                profile: "current".into(),
                message: "session expired".into(),
            },

            CoreError::Timeout { timeout_ms } => CliError::Timeout {
                seconds: timeout_ms.div_ceil(1000),
            },

            CoreError::UnknownResource { name } => CliError::UnknownResource {
                name,
                available: String::new(),
            },

            CoreError::InvalidResource { name, reason } => CliError::Validation {
                field: format!("resource '{name}'"),
                reason,
            },

            CoreError::DuplicateResource { name } => CliError::Validation {
                field: format!("resource '{name}'"),
                reason: "already running".into(),
            },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::NotFound { message } => CliError::NotFound {
                what: "record".into(),
                message,
            },

            CoreError::Api { message, status } => CliError::ApiError {
                code: status.map_or_else(|| "unknown".into(), |s| s.to_string()),
                message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::ApiError {
                code: "internal".into(),
                message,
            },
        }
    }
}
