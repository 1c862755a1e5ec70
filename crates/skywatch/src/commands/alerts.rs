//! Fire alert handlers.

use tabled::Tabled;

use skywatch_core::panel::{CONFIDENCE, MISSING, format_reading, severity_tone};
use skywatch_core::{Dashboard, FireAlert, Payload, names};

use crate::cli::{AlertsArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct AlertRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Temp")]
    temperature: String,
    #[tabled(rename = "Description")]
    description: String,
}

fn alert_row(a: &FireAlert, color: bool) -> AlertRow {
    let confidence = Some(a.confidence.value());
    AlertRow {
        id: a.id.clone(),
        time: util::format_time(a.timestamp),
        severity: output::paint_tone(&a.severity.to_string(), severity_tone(a.severity), color),
        confidence: output::paint_tone(
            &format_reading(confidence, 0, "%"),
            CONFIDENCE.tone(confidence),
            color,
        ),
        location: a
            .location
            .map_or_else(|| MISSING.into(), |p| format!("{:.5}, {:.5}", p.latitude, p.longitude)),
        temperature: format_reading(a.temperature, 1, "°C"),
        description: a.description.clone().unwrap_or_else(|| MISSING.into()),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    dashboard: &Dashboard,
    args: AlertsArgs,
    profile: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::sign_in(dashboard, profile).await?;
    let state = util::first_cycle(dashboard, names::FIRE_ALERTS).await?;
    util::require_value(dashboard, names::FIRE_ALERTS, &state, profile)?;

    let mut alerts: Vec<FireAlert> = state
        .value
        .as_ref()
        .and_then(Payload::as_fire_alerts)
        .map(<[FireAlert]>::to_vec)
        .unwrap_or_default();
    if let Some(limit) = args.limit {
        alerts.truncate(limit);
    }

    let color = output::should_color(global.color);
    let out = output::render_list(global.output, &alerts, |a| alert_row(a, color), |a| a.id.clone());
    output::print_output(&out, global.quiet);

    if let Some(note) = util::degraded_note(names::FIRE_ALERTS, &state) {
        output::note(global, &note);
    }
    Ok(())
}
