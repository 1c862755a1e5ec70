// ── Fire alert domain types ──

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A WGS84 position. Both coordinates or neither.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Build from optional coordinates; `None` unless both are present and finite.
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(latitude), Some(longitude)) if latitude.is_finite() && longitude.is_finite() => {
                Some(Self { latitude, longitude })
            }
            _ => None,
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Severity {
    #[default]
    Unknown,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Parse the backend's free-form severity text; anything unrecognized is `Unknown`.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.trim().parse().ok()).unwrap_or_default()
    }
}

/// Detection confidence in percent, always within `[0, 100]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Confidence(f64);

impl Confidence {
    /// Clamp into range. NaN becomes 0.
    pub fn new(raw: f64) -> Self {
        if raw.is_nan() {
            return Self(0.0);
        }
        Self(raw.clamp(0.0, 100.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<Option<f64>> for Confidence {
    fn from(raw: Option<f64>) -> Self {
        raw.map_or_else(Self::default, Self::new)
    }
}

/// A reported fire detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireAlert {
    pub id: String,
    /// `None` when the report carried no parseable time; such alerts sort last.
    pub timestamp: Option<DateTime<Utc>>,
    pub location: Option<GeoPoint>,
    pub severity: Severity,
    pub confidence: Confidence,
    pub description: Option<String>,
    /// Surface temperature at the hotspot, °C.
    pub temperature: Option<f64>,
    pub image_url: Option<String>,
}

/// Newest first. Undated alerts go last; ties break on id for a stable order.
pub fn newest_first(a: &FireAlert, b: &FireAlert) -> Ordering {
    match (a.timestamp, b.timestamp) {
        (Some(ta), Some(tb)) => tb.cmp(&ta),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.id.cmp(&b.id))
}

pub fn sort_newest_first(alerts: &mut [FireAlert]) {
    alerts.sort_by(newest_first);
}
