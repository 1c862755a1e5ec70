// ── Resource payloads ──

use serde::{Deserialize, Serialize};

use crate::model::{FireAlert, SensorReading, TelemetrySample, VideoFrame, sort_newest_first};

/// The value a resource holds. Shape depends on the resource's source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Payload {
    Telemetry(TelemetrySample),
    Sensors(SensorReading),
    FireAlerts(Vec<FireAlert>),
    VideoFrame(VideoFrame),
}

impl Payload {
    /// Bring the payload into its stored form: alert collections newest first.
    pub fn normalized(self) -> Self {
        match self {
            Self::FireAlerts(mut alerts) => {
                sort_newest_first(&mut alerts);
                Self::FireAlerts(alerts)
            }
            other => other,
        }
    }

    pub fn as_telemetry(&self) -> Option<&TelemetrySample> {
        match self {
            Self::Telemetry(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_sensors(&self) -> Option<&SensorReading> {
        match self {
            Self::Sensors(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_fire_alerts(&self) -> Option<&[FireAlert]> {
        match self {
            Self::FireAlerts(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_video_frame(&self) -> Option<&VideoFrame> {
        match self {
            Self::VideoFrame(v) => Some(v),
            _ => None,
        }
    }
}
