// ── Runtime synchronizer configuration ──
//
// Describes *where* the backend lives and *which* resources to keep live.
// Core never reads config files: the CLI (via skywatch-config) builds a
// `SyncConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::resource::{ResourceSpec, default_resources};
use crate::scheduler::ReconnectConfig;

/// TLS verification strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Skip verification (self-signed ground-station certificates).
    DangerAcceptInvalid,
}

/// Login credentials used by [`Dashboard::connect`](crate::Dashboard::connect).
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

/// Configuration for one dashboard session against one backend.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// REST base URL, e.g. `http://localhost:5000/api`.
    pub base_url: Url,
    /// Push endpoint. `None` disables subscriptions; they report a
    /// transport error and keep retrying.
    pub push_url: Option<Url>,
    pub tls: TlsVerification,
    /// Upper bound on any single request.
    pub request_timeout: Duration,
    pub reconnect: ReconnectConfig,
    /// Resources started by [`Dashboard::start`](crate::Dashboard::start).
    pub resources: Vec<ResourceSpec>,
    pub credentials: Option<Credentials>,
}

impl SyncConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

    /// Defaults for `base_url`: derived push endpoint, the standard
    /// resource set, 8s request timeout.
    pub fn new(base_url: Url) -> Self {
        let push_url = derive_push_url(&base_url);
        Self {
            base_url,
            push_url,
            tls: TlsVerification::default(),
            request_timeout: Self::DEFAULT_TIMEOUT,
            reconnect: ReconnectConfig::default(),
            resources: default_resources(),
            credentials: None,
        }
    }
}

/// Socket.IO websocket endpoint served next to the REST API.
///
/// `http://host:5000/api` becomes
/// `ws://host:5000/socket.io/?EIO=4&transport=websocket`.
pub fn derive_push_url(base_url: &Url) -> Option<Url> {
    let scheme = match base_url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        _ => return None,
    };
    let mut url = base_url.clone();
    url.set_scheme(scheme).ok()?;
    url.set_path("/socket.io/");
    url.set_query(Some("EIO=4&transport=websocket"));
    url.set_fragment(None);
    Some(url)
}
