// ── Drone telemetry domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::alert::GeoPoint;

/// Where the backend got the telemetry record from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TelemetrySource {
    /// Live MAVLink link to the flight controller.
    Pixhawk,
    /// Last record mirrored to the cloud database.
    Firebase,
}

/// Attitude in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Attitude {
    pub roll: Option<f64>,
    pub pitch: Option<f64>,
    pub yaw: Option<f64>,
}

impl Attitude {
    pub fn roll_deg(&self) -> Option<f64> {
        self.roll.map(f64::to_degrees)
    }

    pub fn pitch_deg(&self) -> Option<f64> {
        self.pitch.map(f64::to_degrees)
    }

    pub fn yaw_deg(&self) -> Option<f64> {
        self.yaw.map(f64::to_degrees)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
    pub satellites_visible: Option<u32>,
    /// MAVLink `GPS_FIX_TYPE`: 0-1 no fix, 2 = 2D, 3 = 3D, 4+ = DGPS/RTK.
    pub fix_type: Option<u32>,
}

impl GpsFix {
    pub fn position(&self) -> Option<GeoPoint> {
        GeoPoint::from_parts(self.latitude, self.longitude)
    }
}

/// One telemetry snapshot of the drone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Remaining battery, percent within `[0, 100]`.
    pub battery: Option<f64>,
    /// Altitude above ground in metres (rangefinder when available).
    pub altitude: Option<f64>,
    /// Compass heading in degrees within `[0, 360)`.
    pub heading: Option<f64>,
    pub airspeed: Option<f64>,
    pub groundspeed: Option<f64>,
    pub attitude: Attitude,
    pub gps: GpsFix,
    pub source: Option<TelemetrySource>,
    pub timestamp: Option<DateTime<Utc>>,
}
