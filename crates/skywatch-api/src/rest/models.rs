// Ground-station REST response types
//
// Wire models for the backend's JSON endpoints. The backend merges records
// from the flight controller and from a cloud database, so numbers sometimes
// arrive as strings and whole sub-objects may be `{}` or missing. Every field
// is optional and numeric fields go through the lenient deserializers below;
// a malformed field becomes `None` instead of failing the whole payload.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ── Lenient field parsing ────────────────────────────────────────────

/// Number or numeric string; anything else (null, bool, garbage) is `None`.
pub(crate) fn lenient_f64<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(de)?;
    Ok(value.as_ref().and_then(number_from_value))
}

/// Non-negative integer or integer string.
pub(crate) fn lenient_u32<'de, D>(de: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(de)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Strings pass through; numbers are rendered (report ids are sometimes numeric).
pub(crate) fn lenient_string<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(de)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

pub(crate) fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

// ── Envelopes ────────────────────────────────────────────────────────

/// `{ data, source?, message? }` wrapper used by telemetry, sensors and profile.
#[derive(Debug, Deserialize)]
pub struct DataEnvelope<T> {
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Error body shape: `{ "error": "..." }` or `{ "message": "..." }`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

// ── Auth ─────────────────────────────────────────────────────────────

/// Body returned by `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

// ── Telemetry ────────────────────────────────────────────────────────

/// One telemetry record, from the flight controller or the cloud fallback.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryRecord {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub battery: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub altitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub heading: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub airspeed: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub groundspeed: Option<f64>,
    #[serde(default)]
    pub attitude: Option<AttitudeRecord>,
    #[serde(default)]
    pub gps: Option<GpsRecord>,
    /// Flat position some producers write at the record root.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: Option<String>,
}

/// Attitude in radians.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttitudeRecord {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub roll: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub pitch: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub yaw: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GpsRecord {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub altitude: Option<f64>,
    /// MAVLink GPS fix type: 0-1 none, 2 = 2D, 3+ = 3D and better.
    #[serde(default, deserialize_with = "lenient_u32")]
    pub fix_type: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub satellites_visible: Option<u32>,
}

// ── Sensors ──────────────────────────────────────────────────────────

/// Environmental sensor block from `/sensors/latest`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorRecord {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub humidity: Option<f64>,
    /// Rangefinder distance in centimetres.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub distance: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub temperature: Option<f64>,
    #[serde(default, alias = "wind_direction", deserialize_with = "lenient_f64")]
    pub wind_direction: Option<f64>,
    #[serde(default, alias = "wind_speed", deserialize_with = "lenient_f64")]
    pub wind_speed: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: Option<String>,
}

// ── Fire reports ─────────────────────────────────────────────────────

/// One entry of the `/reports` map (keyed by report id).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub severity: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub confidence: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub location: Option<LocationRecord>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationRecord {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
}

/// A report keyed by its id, as returned from
/// [`ApiClient::list_reports`](crate::ApiClient::list_reports).
#[derive(Debug, Clone)]
pub struct KeyedReport {
    pub id: String,
    pub record: ReportRecord,
}

// ── User profile ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
}

/// Partial profile update. Unset fields are not sent and keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

// ── Servo ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ServoCommand {
    pub channel: u8,
    pub pwm: u16,
}

/// Body returned by `POST /servo/move`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServoAck {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub channel: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub pwm: Option<u32>,
}

// ── Video ────────────────────────────────────────────────────────────

/// Latest stored image in a camera folder (`/video/latest/{folder}`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoFrameRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub updated: Option<String>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub size: Option<u32>,
}
