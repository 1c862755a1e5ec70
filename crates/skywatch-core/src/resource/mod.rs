// ── Live resources ──
//
// A resource is a named, independently refreshed unit of live data. This
// module holds its registration parameters, its stored state, and the
// default resource set the ground-station dashboard runs with.

mod payload;
mod spec;
mod state;

use std::time::Duration;

pub use payload::Payload;
pub use spec::{FallbackPolicy, ResourceName, ResourceSource, ResourceSpec, TransportKind};
pub use state::{ErrorDescriptor, ErrorKind, Origin, Outcome, ResourceState};

use crate::model::VideoKind;

/// Names of the built-in resources.
pub mod names {
    pub const TELEMETRY: &str = "telemetry";
    pub const TELEMETRY_STREAM: &str = "telemetryStream";
    pub const SENSORS: &str = "sensors";
    pub const FIRE_ALERTS: &str = "fireAlerts";
    pub const VIDEO_RAW: &str = "videoFrame:raw";
    pub const VIDEO_DETECTION: &str = "videoFrame:detection";
}

const PANEL_REFRESH: Duration = Duration::from_secs(10);
const FRAME_REFRESH: Duration = Duration::from_secs(1);

/// The dashboard's resource set.
///
/// Telemetry is polled and pushed; sensors and alerts fall back to
/// placeholders; camera frames keep showing the last image.
pub fn default_resources() -> Vec<ResourceSpec> {
    vec![
        ResourceSpec::poll(names::TELEMETRY, ResourceSource::Telemetry, PANEL_REFRESH),
        ResourceSpec::subscribe(names::TELEMETRY_STREAM, ResourceSource::TelemetryPush, PANEL_REFRESH),
        ResourceSpec::poll(names::SENSORS, ResourceSource::Sensors, PANEL_REFRESH)
            .with_fallback(FallbackPolicy::SyntheticDefault),
        ResourceSpec::poll(names::FIRE_ALERTS, ResourceSource::FireAlerts, PANEL_REFRESH)
            .with_fallback(FallbackPolicy::SyntheticDefault),
        ResourceSpec::poll(names::VIDEO_RAW, ResourceSource::VideoFrame(VideoKind::Raw), FRAME_REFRESH)
            .with_fallback(FallbackPolicy::LastKnownGood),
        ResourceSpec::poll(
            names::VIDEO_DETECTION,
            ResourceSource::VideoFrame(VideoKind::Detection),
            FRAME_REFRESH,
        )
        .with_fallback(FallbackPolicy::LastKnownGood),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn defaults_are_valid_and_unique() {
        let specs = default_resources();
        let names: HashSet<_> = specs.iter().map(|s| s.name.clone()).collect();
        assert_eq!(names.len(), specs.len());
        for spec in &specs {
            assert!(spec.validate().is_ok(), "{} should validate", spec.name);
        }
    }
}
