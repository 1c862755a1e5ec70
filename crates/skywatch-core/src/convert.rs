// ── API-to-domain type conversions ──
//
// Bridges raw `skywatch_api` wire records into canonical `skywatch_core::model`
// types. Each conversion clamps ranges, parses timestamps and folds the
// backend's duplicated position fields; nothing here fails.

use chrono::{DateTime, NaiveDateTime, Utc};

use skywatch_api::models::{
    GpsRecord, KeyedReport, ProfileRecord, SensorRecord, TelemetryRecord, VideoFrameRecord,
};

use crate::model::{
    Attitude, Confidence, FireAlert, GeoPoint, GpsFix, SensorReading, Severity, TelemetrySample,
    TelemetrySource, UserProfile, VideoFrame, VideoKind,
};

// ── Helpers ────────────────────────────────────────────────────────

/// Parse a backend timestamp.
///
/// Accepts RFC 3339, naive ISO-8601 (the backend writes `datetime.isoformat()`
/// without an offset, which is UTC), and epoch seconds or milliseconds.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    let epoch: i64 = raw.parse().ok()?;
    // Anything past year 5138 in seconds is really milliseconds.
    if epoch > 100_000_000_000 {
        DateTime::from_timestamp_millis(epoch)
    } else {
        DateTime::from_timestamp(epoch, 0)
    }
}

fn parse_opt_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(parse_timestamp)
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

/// Wrap a heading into `[0, 360)`.
fn normalize_heading(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

// ── Telemetry ──────────────────────────────────────────────────────

fn gps_from_record(gps: Option<&GpsRecord>, root_lat: Option<f64>, root_lon: Option<f64>) -> GpsFix {
    let nested = gps.cloned().unwrap_or_default();
    GpsFix {
        latitude: finite(nested.latitude.or(root_lat)),
        longitude: finite(nested.longitude.or(root_lon)),
        altitude: finite(nested.altitude),
        satellites_visible: nested.satellites_visible,
        fix_type: nested.fix_type,
    }
}

impl From<TelemetryRecord> for TelemetrySample {
    fn from(r: TelemetryRecord) -> Self {
        let attitude = r.attitude.unwrap_or_default();
        Self {
            battery: finite(r.battery).map(|b| b.clamp(0.0, 100.0)),
            altitude: finite(r.altitude),
            heading: finite(r.heading).map(normalize_heading),
            airspeed: finite(r.airspeed),
            groundspeed: finite(r.groundspeed),
            attitude: Attitude {
                roll: finite(attitude.roll),
                pitch: finite(attitude.pitch),
                yaw: finite(attitude.yaw),
            },
            gps: gps_from_record(r.gps.as_ref(), r.latitude, r.longitude),
            source: r.source.as_deref().and_then(|s| s.parse::<TelemetrySource>().ok()),
            timestamp: parse_opt_timestamp(r.timestamp.as_deref()),
        }
    }
}

// ── Sensors ────────────────────────────────────────────────────────

impl From<SensorRecord> for SensorReading {
    fn from(r: SensorRecord) -> Self {
        Self {
            humidity: finite(r.humidity),
            distance: finite(r.distance),
            temperature: finite(r.temperature),
            wind_direction: finite(r.wind_direction).map(normalize_heading),
            wind_speed: finite(r.wind_speed),
            timestamp: parse_opt_timestamp(r.timestamp.as_deref()),
        }
    }
}

// ── Fire alerts ────────────────────────────────────────────────────

impl From<KeyedReport> for FireAlert {
    fn from(KeyedReport { id, record }: KeyedReport) -> Self {
        let location = record
            .location
            .and_then(|loc| GeoPoint::from_parts(loc.latitude, loc.longitude));
        Self {
            id,
            timestamp: parse_opt_timestamp(record.timestamp.as_deref()),
            location,
            severity: Severity::parse_lenient(record.severity.as_deref()),
            confidence: Confidence::from(record.confidence),
            description: record.description,
            temperature: finite(record.temperature),
            image_url: record.image_url,
        }
    }
}

// ── Video ──────────────────────────────────────────────────────────

/// `None` when the record has no URL to display.
pub fn video_frame_from_record(kind: VideoKind, r: VideoFrameRecord) -> Option<VideoFrame> {
    Some(VideoFrame {
        kind,
        url: r.url?,
        name: r.name,
        updated: parse_opt_timestamp(r.updated.as_deref()),
        size_bytes: r.size,
    })
}

// ── Profile ────────────────────────────────────────────────────────

impl From<ProfileRecord> for UserProfile {
    fn from(r: ProfileRecord) -> Self {
        let non_empty = |s: Option<String>| s.filter(|v| !v.trim().is_empty());
        Self {
            name: non_empty(r.name),
            email: non_empty(r.email),
            phone: non_empty(r.phone),
            role: non_empty(r.role),
            department: non_empty(r.department),
            profile_image: non_empty(r.profile_image),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use skywatch_api::models::{AttitudeRecord, LocationRecord, ReportRecord};

    use super::*;

    #[test]
    fn timestamps_in_every_backend_shape() {
        let expected = Utc.with_ymd_and_hms(2025, 1, 2, 10, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2025-01-02T10:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-02T17:00:00+07:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-02T10:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-02 10:00:00.000"), Some(expected));
        assert_eq!(parse_timestamp("1735812000"), Some(expected));
        assert_eq!(parse_timestamp("1735812000000"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn telemetry_conversion_clamps_and_folds() {
        let record = TelemetryRecord {
            battery: Some(104.0),
            heading: Some(-90.0),
            attitude: Some(AttitudeRecord { roll: Some(std::f64::consts::FRAC_PI_2), pitch: None, yaw: None }),
            latitude: Some(-7.025),
            longitude: Some(110.412),
            source: Some("Pixhawk".into()),
            ..TelemetryRecord::default()
        };
        let sample = TelemetrySample::from(record);
        assert_eq!(sample.battery, Some(100.0));
        assert_eq!(sample.heading, Some(270.0));
        assert_eq!(sample.attitude.roll_deg().map(f64::round), Some(90.0));
        assert_eq!(sample.gps.position(), Some(GeoPoint { latitude: -7.025, longitude: 110.412 }));
        assert_eq!(sample.source, Some(TelemetrySource::Pixhawk));
    }

    #[test]
    fn report_conversion_defaults() {
        let alert = FireAlert::from(KeyedReport {
            id: "r9".into(),
            record: ReportRecord {
                confidence: Some(250.0),
                location: Some(LocationRecord { latitude: Some(1.0), longitude: None }),
                ..ReportRecord::default()
            },
        });
        assert_eq!(alert.severity, Severity::Unknown);
        assert!((alert.confidence.value() - 100.0).abs() < f64::EPSILON);
        assert!(alert.location.is_none());
        assert!(alert.timestamp.is_none());
    }

    #[test]
    fn video_without_url_is_dropped() {
        assert!(video_frame_from_record(VideoKind::Raw, VideoFrameRecord::default()).is_none());
    }
}
