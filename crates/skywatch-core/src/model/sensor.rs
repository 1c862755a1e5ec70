// ── Environmental sensor domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Onboard environmental sensor block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Relative humidity, percent.
    pub humidity: Option<f64>,
    /// Rangefinder distance, centimetres.
    pub distance: Option<f64>,
    /// Air temperature, °C.
    pub temperature: Option<f64>,
    /// Wind direction, degrees from north.
    pub wind_direction: Option<f64>,
    /// Wind speed, m/s.
    pub wind_speed: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl SensorReading {
    /// Stand-in shown while no sensor data has ever arrived.
    pub fn placeholder(now: DateTime<Utc>) -> Self {
        Self {
            humidity: Some(48.0),
            distance: Some(120.0),
            temperature: Some(26.0),
            wind_direction: Some(215.0),
            wind_speed: Some(8.0),
            timestamp: Some(now),
        }
    }
}
