// ── Resource registration parameters ──

use std::borrow::Borrow;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::payload::Payload;
use crate::error::CoreError;
use crate::model::{SensorReading, VideoKind};

/// Unique name of a resource within a store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceName(String);

impl ResourceName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ResourceName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ResourceName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// How a resource is kept up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TransportKind {
    /// Fetch on a fixed cadence.
    Poll,
    /// Hold a push subscription open.
    Subscribe,
}

/// What to show when a cycle yields nothing usable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum FallbackPolicy {
    /// Record the error; leave the value alone.
    #[default]
    None,
    /// Keep the last real value, marked cached.
    LastKnownGood,
    /// Like `LastKnownGood`, but show a placeholder until a real value arrives.
    SyntheticDefault,
}

/// Backend data a resource is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceSource {
    /// `GET /telemetry/latest`
    Telemetry,
    /// The `telemetry` push event.
    TelemetryPush,
    /// `GET /sensors/latest`
    Sensors,
    /// `GET /reports`
    FireAlerts,
    /// `GET /video/latest/{folder}`
    VideoFrame(VideoKind),
}

impl ResourceSource {
    /// Push event name for subscription sources.
    pub fn push_event(self) -> Option<&'static str> {
        match self {
            Self::TelemetryPush => Some("telemetry"),
            _ => None,
        }
    }

    /// Placeholder used by `SyntheticDefault` before any real value arrives.
    pub fn placeholder(self, now: DateTime<Utc>) -> Option<Payload> {
        match self {
            Self::Sensors => Some(Payload::Sensors(SensorReading::placeholder(now))),
            Self::FireAlerts => Some(Payload::FireAlerts(Vec::new())),
            _ => None,
        }
    }
}

/// Everything the scheduler and resolver need to drive one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSpec {
    pub name: ResourceName,
    pub source: ResourceSource,
    pub refresh_interval: Duration,
    pub transport_kind: TransportKind,
    pub fallback_policy: FallbackPolicy,
    /// Per-fetch deadline; defaults to `min(request_timeout, refresh_interval)`.
    pub fetch_timeout: Option<Duration>,
}

impl ResourceSpec {
    pub fn poll(name: impl Into<ResourceName>, source: ResourceSource, refresh_interval: Duration) -> Self {
        Self {
            name: name.into(),
            source,
            refresh_interval,
            transport_kind: TransportKind::Poll,
            fallback_policy: FallbackPolicy::None,
            fetch_timeout: None,
        }
    }

    pub fn subscribe(name: impl Into<ResourceName>, source: ResourceSource, refresh_interval: Duration) -> Self {
        Self {
            transport_kind: TransportKind::Subscribe,
            ..Self::poll(name, source, refresh_interval)
        }
    }

    pub fn with_fallback(mut self, policy: FallbackPolicy) -> Self {
        self.fallback_policy = policy;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Deadline for one fetch given the client-wide request timeout.
    pub fn effective_timeout(&self, request_timeout: Duration) -> Duration {
        self.fetch_timeout
            .unwrap_or_else(|| request_timeout.min(self.refresh_interval))
    }

    /// Reject registrations the scheduler could not drive.
    pub fn validate(&self) -> Result<(), CoreError> {
        let invalid = |reason: &str| CoreError::InvalidResource {
            name: self.name.to_string(),
            reason: reason.to_owned(),
        };

        if self.name.as_str().trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if self.refresh_interval.is_zero() {
            return Err(invalid("refresh interval must be positive"));
        }
        if self.fetch_timeout.is_some_and(|t| t.is_zero()) {
            return Err(invalid("fetch timeout must be positive"));
        }
        match (self.transport_kind, self.source.push_event()) {
            (TransportKind::Subscribe, None) => Err(invalid("source has no push event to subscribe to")),
            (TransportKind::Poll, Some(_)) => Err(invalid("push-only source cannot be polled")),
            _ => Ok(()),
        }
    }
}
