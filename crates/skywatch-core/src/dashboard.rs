// ── Dashboard facade ──
//
// Ties the synchronizer together for one backend: session, HTTP transport,
// scheduler, store and flight log. Consumers (the CLI) talk to this type
// and read resource state from the store it owns.

use std::sync::Arc;

use secrecy::SecretString;
use serde::Serialize;
use strum::Display;
use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use skywatch_api::models::{ProfileUpdate, ServoAck};
use skywatch_api::{ApiClient, AuthState, Identity, PWM_RANGE, Session, TlsMode, TransportConfig};

use crate::config::{SyncConfig, TlsVerification};
use crate::error::CoreError;
use crate::flight_log::{FlightLog, FlightLogSimulator};
use crate::model::{FireAlert, SensorReading, TelemetrySample, TelemetrySource, UserProfile, VideoFrame, VideoKind};
use crate::resource::{Payload, ResourceName, ResourceSpec, ResourceState, names};
use crate::scheduler::Scheduler;
use crate::store::{ObserverGuard, ResourceStore};
use crate::stream::ResourceStream;
use crate::transport::HttpTransport;

// ── LinkStatus ───────────────────────────────────────────────────────

/// Where live telemetry is currently coming from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LinkStatus {
    /// Direct MAVLink link to the flight controller.
    Pixhawk,
    /// The backend is relaying the last record from the cloud database.
    Firebase,
    /// Telemetry is flowing but the backend did not say from where.
    Online,
    Offline,
}

/// The freshest real telemetry state across the polled and pushed
/// resources.
pub(crate) fn freshest_telemetry_state(store: &ResourceStore) -> Option<Arc<ResourceState>> {
    [names::TELEMETRY, names::TELEMETRY_STREAM]
        .into_iter()
        .map(|name| store.get_state(name))
        .filter(|state| state.origin.is_real() && state.value.is_some())
        .max_by_key(|state| state.last_updated_at)
}

pub(crate) fn freshest_telemetry(store: &ResourceStore) -> Option<TelemetrySample> {
    freshest_telemetry_state(store)?
        .value
        .as_ref()
        .and_then(Payload::as_telemetry)
        .cloned()
}

// ── Dashboard ────────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<DashboardInner>`. Does nothing on creation;
/// call [`connect`](Self::connect) or [`start`](Self::start) to begin
/// synchronizing.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<DashboardInner>,
}

struct DashboardInner {
    config: SyncConfig,
    client: ApiClient,
    store: Arc<ResourceStore>,
    scheduler: Scheduler<HttpTransport>,
    flight_log: Arc<FlightLog>,
    simulator: Mutex<Option<FlightLogSimulator>>,
    cancel: CancellationToken,
}

impl Dashboard {
    /// Build a dashboard with a fresh anonymous session.
    pub fn new(config: SyncConfig) -> Result<Self, CoreError> {
        Self::with_session(config, Arc::new(Session::new()))
    }

    /// Build a dashboard sharing an existing session.
    pub fn with_session(config: SyncConfig, session: Arc<Session>) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: match config.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: config.request_timeout,
        };
        let client = ApiClient::new(config.base_url.clone(), session, &transport)?;
        Ok(Self::from_client(config, client))
    }

    /// Build a dashboard around a ready client.
    pub fn from_client(config: SyncConfig, client: ApiClient) -> Self {
        let store = Arc::new(ResourceStore::new());
        let transport = HttpTransport::new(client.clone(), config.push_url.clone());
        let scheduler = Scheduler::new(
            Arc::new(transport),
            Arc::clone(&store),
            config.request_timeout,
            config.reconnect.clone(),
        );

        Self {
            inner: Arc::new(DashboardInner {
                config,
                client,
                store,
                scheduler,
                flight_log: Arc::new(FlightLog::new()),
                simulator: Mutex::new(None),
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<ResourceStore> {
        &self.inner.store
    }

    pub fn session(&self) -> &Arc<Session> {
        self.inner.client.session()
    }

    pub fn client(&self) -> &ApiClient {
        &self.inner.client
    }

    pub fn flight_log(&self) -> &Arc<FlightLog> {
        &self.inner.flight_log
    }

    // ── Session ──────────────────────────────────────────────────────

    pub async fn login(&self, email: &str, password: &SecretString) -> Result<Identity, CoreError> {
        let identity = self.inner.client.login(email, password).await?;
        info!(email, "logged in");
        Ok(identity)
    }

    pub fn logout(&self) {
        self.inner.client.logout();
    }

    pub fn auth_state(&self) -> AuthState {
        self.session().state()
    }

    /// Watch for `ReauthRequired` and friends.
    pub fn auth_changes(&self) -> watch::Receiver<AuthState> {
        self.session().watch()
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Log in with the configured credentials (unless a session is already
    /// held), then start every configured resource.
    pub async fn connect(&self) -> Result<(), CoreError> {
        if !self.session().is_authenticated() {
            if let Some(creds) = &self.inner.config.credentials {
                self.login(&creds.email, &creds.password).await?;
            } else {
                debug!("no credentials configured, continuing anonymously");
            }
        }
        self.start()
    }

    /// Start every configured resource that is not already running.
    pub fn start(&self) -> Result<(), CoreError> {
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::Internal("dashboard has been shut down".into()));
        }
        for spec in &self.inner.config.resources {
            if !self.inner.scheduler.is_running(spec.name.as_str()) {
                self.inner.scheduler.start(spec.clone())?;
            }
        }
        Ok(())
    }

    /// Start one additional resource, e.g. when a panel appears.
    pub fn mount(&self, spec: ResourceSpec) -> Result<(), CoreError> {
        self.inner.scheduler.start(spec)
    }

    /// Stop a resource. Returns `false` if it was not running.
    pub fn unmount(&self, name: &str) -> bool {
        self.inner.scheduler.stop(name)
    }

    pub fn running(&self) -> Vec<ResourceName> {
        self.inner.scheduler.running()
    }

    /// Start the scripted flight-log feed if it is not already running.
    pub async fn start_flight_log(&self) {
        let mut simulator = self.inner.simulator.lock().await;
        if simulator.is_none() {
            *simulator = Some(FlightLogSimulator::spawn(
                Arc::clone(&self.inner.flight_log),
                Arc::clone(&self.inner.store),
                self.inner.cancel.child_token(),
            ));
        }
    }

    /// Stop every background task and wait for them to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let simulator = self.inner.simulator.lock().await.take();
        if let Some(simulator) = simulator {
            simulator.join().await;
        }
        self.inner.scheduler.shutdown().await;
        debug!("dashboard shut down");
    }

    // ── Resource state ───────────────────────────────────────────────

    pub fn state(&self, name: &str) -> Arc<ResourceState> {
        self.inner.store.get_state(name)
    }

    pub fn subscribe<F>(&self, name: impl Into<ResourceName>, observer: F) -> ObserverGuard
    where
        F: Fn(&ResourceName, &ResourceState) + Send + Sync + 'static,
    {
        self.inner.store.subscribe(name, observer)
    }

    pub fn watch(&self, name: &str) -> Option<ResourceStream> {
        self.inner.store.watch(name)
    }

    /// Latest telemetry, polled or pushed, whichever is newer.
    pub fn telemetry(&self) -> Option<TelemetrySample> {
        freshest_telemetry(&self.inner.store)
    }

    pub fn sensors(&self) -> Option<SensorReading> {
        self.state(names::SENSORS)
            .value
            .as_ref()
            .and_then(Payload::as_sensors)
            .cloned()
    }

    /// Newest first.
    pub fn fire_alerts(&self) -> Vec<FireAlert> {
        self.state(names::FIRE_ALERTS)
            .value
            .as_ref()
            .and_then(Payload::as_fire_alerts)
            .map(<[FireAlert]>::to_vec)
            .unwrap_or_default()
    }

    pub fn video_frame(&self, kind: VideoKind) -> Option<VideoFrame> {
        let name = match kind {
            VideoKind::Raw => names::VIDEO_RAW,
            VideoKind::Detection => names::VIDEO_DETECTION,
        };
        self.state(name)
            .value
            .as_ref()
            .and_then(Payload::as_video_frame)
            .cloned()
    }

    /// Connection indicator driven by the telemetry resources.
    pub fn link_status(&self) -> LinkStatus {
        let Some(state) = freshest_telemetry_state(&self.inner.store) else {
            return LinkStatus::Offline;
        };
        if !state.is_healthy() {
            return LinkStatus::Offline;
        }
        match state.value.as_ref().and_then(Payload::as_telemetry).and_then(|t| t.source) {
            Some(TelemetrySource::Pixhawk) => LinkStatus::Pixhawk,
            Some(TelemetrySource::Firebase) => LinkStatus::Firebase,
            None => LinkStatus::Online,
        }
    }

    // ── Actions ──────────────────────────────────────────────────────

    pub async fn profile(&self) -> Result<UserProfile, CoreError> {
        Ok(self.inner.client.get_profile().await?.into())
    }

    /// Send only the fields set in `update`.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, CoreError> {
        if update.is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "nothing to update".into(),
            });
        }
        Ok(self.inner.client.update_profile(update).await?.into())
    }

    /// Drive a servo output. Pulse widths outside 1000-2000 us are
    /// rejected without contacting the backend.
    pub async fn move_servo(&self, channel: u8, pwm: u16) -> Result<ServoAck, CoreError> {
        if !PWM_RANGE.contains(&pwm) {
            return Err(CoreError::ValidationFailed {
                message: format!(
                    "PWM {pwm} is outside {}-{} us",
                    PWM_RANGE.start(),
                    PWM_RANGE.end()
                ),
            });
        }
        Ok(self.inner.client.move_servo(channel, pwm).await?)
    }
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("base_url", &self.inner.config.base_url.as_str())
            .field("running", &self.inner.scheduler.running())
            .finish_non_exhaustive()
    }
}
