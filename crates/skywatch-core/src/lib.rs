// skywatch-core: Live resource synchronizer between skywatch-api and consumers (CLI).

pub mod config;
pub mod convert;
pub mod dashboard;
pub mod error;
pub mod flight_log;
pub mod model;
pub mod panel;
pub mod resolver;
pub mod resource;
pub mod scheduler;
pub mod store;
pub mod stream;
pub mod transport;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{Credentials, SyncConfig, TlsVerification};
pub use dashboard::{Dashboard, LinkStatus};
pub use error::CoreError;
pub use flight_log::{FlightLog, FlightLogSimulator, LogEntry};
pub use resolver::resolve;
pub use resource::{
    ErrorDescriptor, ErrorKind, FallbackPolicy, Origin, Outcome, Payload, ResourceName, ResourceSource,
    ResourceSpec, ResourceState, TransportKind, default_resources, names,
};
pub use scheduler::{ReconnectConfig, Scheduler};
pub use store::{ObserverGuard, ResourceStore};
pub use stream::ResourceStream;
pub use transport::{HttpTransport, SubscriptionEvent, SubscriptionHandle, SubscriptionSink, Transport};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Attitude, Confidence, FireAlert, GeoPoint, GpsFix, SensorReading, Severity, TelemetrySample,
    TelemetrySource, UserProfile, VideoFrame, VideoKind,
};

// API types consumers pass through the dashboard.
pub use skywatch_api::models::{ProfileUpdate, ServoAck};
pub use skywatch_api::{AuthState, Identity, Session};
