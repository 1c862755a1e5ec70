//! Telemetry and sensor panel handlers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::Tabled;

use skywatch_core::panel::{PanelConfig, PanelRow, gps_status};
use skywatch_core::{Dashboard, ErrorDescriptor, LinkStatus, Origin, Payload, ResourceState};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ReadingRow {
    #[tabled(rename = "Reading")]
    label: &'static str,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Level")]
    note: String,
}

fn reading_row(row: &PanelRow, color: bool) -> ReadingRow {
    ReadingRow {
        label: row.label,
        value: output::paint_tone(&row.value, row.tone, color),
        note: row.note.map(|n| output::paint_tone(n, row.tone, color)).unwrap_or_default(),
    }
}

// ── Snapshot ────────────────────────────────────────────────────────

#[derive(Serialize)]
struct PanelSnapshot {
    panel: &'static str,
    origin: Origin,
    updated: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    link: Option<LinkStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorDescriptor>,
    rows: Vec<PanelRow>,
}

/// Extra rows that are not a single numeric field.
fn extra_rows(state: &ResourceState) -> Vec<PanelRow> {
    match state.value.as_ref() {
        Some(Payload::Telemetry(sample)) => {
            let fix = gps_status(&sample.gps);
            vec![PanelRow {
                label: "GPS",
                value: fix.label.into(),
                tone: fix.tone,
                note: None,
            }]
        }
        _ => Vec::new(),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    dashboard: &Dashboard,
    panel: &PanelConfig,
    profile: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::sign_in(dashboard, profile).await?;
    let state = util::first_cycle(dashboard, panel.resource).await?;
    util::require_value(dashboard, panel.resource, &state, profile)?;

    let mut rows = panel.rows(&state);
    rows.extend(extra_rows(&state));

    let snapshot = PanelSnapshot {
        panel: panel.title,
        origin: state.origin,
        updated: state.last_updated_at,
        link: matches!(state.value, Some(Payload::Telemetry(_))).then(|| dashboard.link_status()),
        error: state.last_error.clone(),
        rows,
    };

    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &snapshot,
        |s| {
            let table = output::render_table(&s.rows.iter().map(|r| reading_row(r, color)).collect::<Vec<_>>());
            let mut footer = format!(
                "{} · {} · updated {}",
                s.panel,
                output::paint_origin(s.origin, color),
                util::format_time(s.updated)
            );
            if let Some(link) = s.link {
                footer.push_str(&format!(" · link {link}"));
            }
            format!("{table}\n{footer}")
        },
        |s| s.rows.iter().map(|r| format!("{}={}", r.label, r.value)).collect::<Vec<_>>().join("\n"),
    );
    output::print_output(&out, global.quiet);

    if let Some(note) = util::degraded_note(panel.resource, &state) {
        output::note(global, &note);
    }
    Ok(())
}
