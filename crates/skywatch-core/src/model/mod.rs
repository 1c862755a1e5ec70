// ── Domain model ──
//
// Canonical types the rest of the crate and its consumers work with.
// Wire types from `skywatch_api` are converted in `crate::convert`.

pub mod alert;
pub mod profile;
pub mod sensor;
pub mod telemetry;
pub mod video;

pub use alert::{Confidence, FireAlert, GeoPoint, Severity, newest_first, sort_newest_first};
pub use profile::UserProfile;
pub use sensor::SensorReading;
pub use telemetry::{Attitude, GpsFix, TelemetrySample, TelemetrySource};
pub use video::{VideoFrame, VideoKind};
