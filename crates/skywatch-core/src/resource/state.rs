// ── Resource state and fetch outcomes ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

use super::payload::Payload;

/// Provenance of the value a resource currently shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Origin {
    /// Fresh from the latest successful cycle.
    Live,
    /// An earlier live value kept after later cycles failed.
    Cached,
    /// A placeholder; no real value has ever arrived.
    Synthetic,
    /// Nothing to show.
    #[default]
    Absent,
}

impl Origin {
    /// `true` for values that came from the backend at some point.
    pub fn is_real(self) -> bool {
        matches!(self, Self::Live | Self::Cached)
    }
}

/// Failure classes a cycle can end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// No response or timeout. Retried by the scheduler.
    Transport,
    /// The backend answered with an error.
    Application,
    /// The backend rejected the credential.
    Authorization,
    /// The response could not be understood.
    DataShape,
    /// The backend had nothing to return.
    Empty,
}

/// What went wrong on the most recent failed cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    pub kind: ErrorKind,
    pub message: String,
    pub status: Option<u16>,
}

impl ErrorDescriptor {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), status: None }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    pub fn application(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Application, message)
    }

    pub fn empty() -> Self {
        Self::new(ErrorKind::Empty, "no data available")
    }
}

impl std::fmt::Display for ErrorDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (HTTP {status}): {}", self.kind, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl From<&skywatch_api::Error> for ErrorDescriptor {
    fn from(err: &skywatch_api::Error) -> Self {
        use skywatch_api::Error as E;

        let kind = match err {
            E::Unauthorized | E::Authentication { .. } => ErrorKind::Authorization,
            E::Api { .. } | E::InvalidRequest(_) => ErrorKind::Application,
            E::Deserialization { .. } => ErrorKind::DataShape,
            E::Transport(e) if e.status().is_some() => ErrorKind::Application,
            E::Transport(_)
            | E::InvalidUrl(_)
            | E::Tls(_)
            | E::Timeout { .. }
            | E::PushConnect(_)
            | E::PushClosed { .. } => ErrorKind::Transport,
        };
        let message = match err {
            E::Api { message, .. } => message.clone(),
            other => other.to_string(),
        };
        Self { kind, message, status: err.status() }
    }
}

/// Result of one fetch or push event, before fallback resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Payload),
    /// The backend answered but had nothing (404 on a collection, `data: null`).
    Empty,
    Failure(ErrorDescriptor),
}

/// Latest known state of one resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    pub value: Option<Payload>,
    pub origin: Origin,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub last_error: Option<ErrorDescriptor>,
}

impl ResourceState {
    /// The state of a resource nothing is known about.
    pub fn absent() -> Self {
        Self::default()
    }

    /// `true` when the value is fresh and the last cycle succeeded.
    pub fn is_healthy(&self) -> bool {
        self.origin == Origin::Live && self.last_error.is_none()
    }
}
