// ── Panel presentation tables ──
//
// Status colouring and labelling for dashboard readouts. Thresholds are
// data (`ThresholdScale`); a panel is a list of fields over one resource
// (`PanelConfig`). Consumers map `Tone` to whatever colours they render with.

use serde::Serialize;
use strum::Display;

use crate::model::{GpsFix, SensorReading, Severity, TelemetrySample};
use crate::resource::{Payload, ResourceState, names};

/// Placeholder shown for missing readings.
pub const MISSING: &str = "N/A";

/// Visual weight of a readout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Tone {
    Good,
    Warning,
    Elevated,
    Critical,
    /// A plain readout with no thresholds.
    Neutral,
    /// No value to judge.
    Muted,
}

/// How a band's bound is compared against the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// `value > bound`
    Above,
    /// `value >= bound`
    AtLeast,
    /// `value < bound`
    Below,
}

/// One row of a threshold table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub bound: f64,
    pub tone: Tone,
    pub label: &'static str,
}

/// Ordered bands: the first matching band wins, `otherwise` catches the rest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdScale {
    pub compare: Bound,
    pub bands: &'static [Band],
    pub otherwise: Band,
}

/// Outcome of classifying a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Level {
    pub tone: Tone,
    pub label: &'static str,
}

const fn band(bound: f64, tone: Tone, label: &'static str) -> Band {
    Band { bound, tone, label }
}

impl ThresholdScale {
    pub fn classify(&self, value: Option<f64>) -> Level {
        let Some(value) = value.filter(|v| v.is_finite()) else {
            return Level { tone: Tone::Muted, label: MISSING };
        };
        let hit = self.bands.iter().find(|b| match self.compare {
            Bound::Above => value > b.bound,
            Bound::AtLeast => value >= b.bound,
            Bound::Below => value < b.bound,
        });
        let b = hit.unwrap_or(&self.otherwise);
        Level { tone: b.tone, label: b.label }
    }

    pub fn tone(&self, value: Option<f64>) -> Tone {
        self.classify(value).tone
    }
}

// ── Tables ───────────────────────────────────────────────────────────

pub const BATTERY: ThresholdScale = ThresholdScale {
    compare: Bound::Above,
    bands: &[band(60.0, Tone::Good, "Good"), band(30.0, Tone::Warning, "Low")],
    otherwise: band(0.0, Tone::Critical, "Critical"),
};

pub const HUMIDITY: ThresholdScale = ThresholdScale {
    compare: Bound::Below,
    bands: &[band(30.0, Tone::Critical, "Dry"), band(60.0, Tone::Warning, "Moderate")],
    otherwise: band(0.0, Tone::Good, "Humid"),
};

pub const TEMPERATURE: ThresholdScale = ThresholdScale {
    compare: Bound::Above,
    bands: &[band(35.0, Tone::Critical, "Hot"), band(25.0, Tone::Warning, "Warm")],
    otherwise: band(0.0, Tone::Good, "Cool"),
};

pub const WIND_SPEED: ThresholdScale = ThresholdScale {
    compare: Bound::Below,
    bands: &[
        band(5.0, Tone::Good, "Calm"),
        band(15.0, Tone::Warning, "Moderate"),
        band(25.0, Tone::Elevated, "Strong"),
    ],
    otherwise: band(0.0, Tone::Critical, "Very Strong"),
};

pub const CONFIDENCE: ThresholdScale = ThresholdScale {
    compare: Bound::AtLeast,
    bands: &[band(80.0, Tone::Good, "High"), band(50.0, Tone::Warning, "Medium")],
    otherwise: band(0.0, Tone::Critical, "Low"),
};

pub fn severity_tone(severity: Severity) -> Tone {
    match severity {
        Severity::Critical => Tone::Critical,
        Severity::High => Tone::Elevated,
        Severity::Medium => Tone::Warning,
        Severity::Unknown => Tone::Muted,
    }
}

/// GPS fix quality from fix type and satellite count.
pub fn gps_status(gps: &GpsFix) -> Level {
    let (fix, sats) = match (gps.fix_type, gps.satellites_visible) {
        (Some(fix), Some(sats)) if sats > 0 => (fix, sats),
        _ => return Level { tone: Tone::Critical, label: "No Fix" },
    };
    if fix >= 3 && sats >= 4 {
        Level { tone: Tone::Good, label: "Good Fix" }
    } else if fix >= 2 {
        Level { tone: Tone::Warning, label: "2D Fix" }
    } else {
        Level { tone: Tone::Elevated, label: "Poor Fix" }
    }
}

const COMPASS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// Nearest of the eight compass points.
pub fn compass_point(degrees: f64) -> &'static str {
    if !degrees.is_finite() {
        return MISSING;
    }
    let degrees = degrees.rem_euclid(360.0);
    let mut sector = 0;
    let mut edge = 22.5;
    while sector < COMPASS.len() && degrees >= edge {
        sector += 1;
        edge += 45.0;
    }
    COMPASS[sector % COMPASS.len()]
}

/// `value` with `decimals` places and a unit suffix, or `N/A`.
pub fn format_reading(value: Option<f64>, decimals: usize, unit: &str) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(v) => format!("{v:.decimals$}{unit}"),
        None => MISSING.to_owned(),
    }
}

// ── Panels ───────────────────────────────────────────────────────────

type Extract = fn(&Payload) -> Option<f64>;

/// One readout of a panel.
#[derive(Clone, Copy)]
pub struct PanelField {
    pub label: &'static str,
    pub unit: &'static str,
    pub decimals: usize,
    pub scale: Option<&'static ThresholdScale>,
    pub extract: Extract,
}

impl std::fmt::Debug for PanelField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelField")
            .field("label", &self.label)
            .field("unit", &self.unit)
            .field("scale", &self.scale)
            .finish_non_exhaustive()
    }
}

/// A rendered readout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelRow {
    pub label: &'static str,
    pub value: String,
    pub tone: Tone,
    /// Band label, or a compass point for directions.
    pub note: Option<&'static str>,
}

/// A dashboard panel: a titled list of fields over one resource.
#[derive(Debug, Clone, Copy)]
pub struct PanelConfig {
    pub title: &'static str,
    pub resource: &'static str,
    pub fields: &'static [PanelField],
}

impl PanelConfig {
    /// Render every field from `state`. Missing values read `N/A`.
    pub fn rows(&self, state: &ResourceState) -> Vec<PanelRow> {
        self.fields
            .iter()
            .map(|field| {
                let value = state.value.as_ref().and_then(field.extract);
                let level = field.scale.map(|scale| scale.classify(value));
                let plain = if value.is_some() { Tone::Neutral } else { Tone::Muted };
                let is_direction = field.unit == "°";
                PanelRow {
                    label: field.label,
                    value: format_reading(value, field.decimals, field.unit),
                    tone: level.map_or(plain, |l| l.tone),
                    note: level
                        .map(|l| l.label)
                        .or_else(|| is_direction.then(|| value.map_or(MISSING, compass_point))),
                }
            })
            .collect()
    }
}

fn telemetry(p: &Payload) -> Option<&TelemetrySample> {
    p.as_telemetry()
}

fn sensors(p: &Payload) -> Option<&SensorReading> {
    p.as_sensors()
}

pub const TELEMETRY_PANEL: PanelConfig = PanelConfig {
    title: "Telemetry",
    resource: names::TELEMETRY,
    fields: &[
        PanelField {
            label: "Battery",
            unit: "%",
            decimals: 0,
            scale: Some(&BATTERY),
            extract: |p| telemetry(p).and_then(|t| t.battery),
        },
        PanelField {
            label: "Altitude",
            unit: " m",
            decimals: 1,
            scale: None,
            extract: |p| telemetry(p).and_then(|t| t.altitude),
        },
        PanelField {
            label: "Heading",
            unit: "°",
            decimals: 0,
            scale: None,
            extract: |p| telemetry(p).and_then(|t| t.heading),
        },
        PanelField {
            label: "Airspeed",
            unit: " m/s",
            decimals: 1,
            scale: None,
            extract: |p| telemetry(p).and_then(|t| t.airspeed),
        },
        PanelField {
            label: "Groundspeed",
            unit: " m/s",
            decimals: 1,
            scale: None,
            extract: |p| telemetry(p).and_then(|t| t.groundspeed),
        },
        PanelField {
            label: "Roll",
            unit: " deg",
            decimals: 2,
            scale: None,
            extract: |p| telemetry(p).and_then(|t| t.attitude.roll_deg()),
        },
        PanelField {
            label: "Pitch",
            unit: " deg",
            decimals: 2,
            scale: None,
            extract: |p| telemetry(p).and_then(|t| t.attitude.pitch_deg()),
        },
        PanelField {
            label: "Yaw",
            unit: " deg",
            decimals: 2,
            scale: None,
            extract: |p| telemetry(p).and_then(|t| t.attitude.yaw_deg()),
        },
    ],
};

pub const SENSOR_PANEL: PanelConfig = PanelConfig {
    title: "Sensors",
    resource: names::SENSORS,
    fields: &[
        PanelField {
            label: "Humidity",
            unit: "%",
            decimals: 0,
            scale: Some(&HUMIDITY),
            extract: |p| sensors(p).and_then(|s| s.humidity),
        },
        PanelField {
            label: "Temperature",
            unit: " °C",
            decimals: 1,
            scale: Some(&TEMPERATURE),
            extract: |p| sensors(p).and_then(|s| s.temperature),
        },
        PanelField {
            label: "Distance",
            unit: " cm",
            decimals: 0,
            scale: None,
            extract: |p| sensors(p).and_then(|s| s.distance),
        },
        PanelField {
            label: "Wind direction",
            unit: "°",
            decimals: 0,
            scale: None,
            extract: |p| sensors(p).and_then(|s| s.wind_direction),
        },
        PanelField {
            label: "Wind speed",
            unit: " m/s",
            decimals: 1,
            scale: Some(&WIND_SPEED),
            extract: |p| sensors(p).and_then(|s| s.wind_speed),
        },
    ],
};
