//! One-shot snapshot of every configured resource.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::Tabled;

use skywatch_core::{Dashboard, ErrorDescriptor, LinkStatus, Origin, TransportKind};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
struct ResourceSummary {
    name: String,
    transport: TransportKind,
    origin: Origin,
    updated: Option<DateTime<Utc>>,
    error: Option<ErrorDescriptor>,
}

#[derive(Serialize)]
struct StatusReport {
    link: LinkStatus,
    resources: Vec<ResourceSummary>,
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Resource")]
    name: String,
    #[tabled(rename = "Via")]
    transport: String,
    #[tabled(rename = "Origin")]
    origin: String,
    #[tabled(rename = "Updated")]
    updated: String,
    #[tabled(rename = "Last error")]
    error: String,
}

fn summary_row(s: &ResourceSummary, color: bool) -> SummaryRow {
    SummaryRow {
        name: s.name.clone(),
        transport: s.transport.to_string(),
        origin: output::paint_origin(s.origin, color),
        updated: util::format_time(s.updated),
        error: s.error.as_ref().map(ToString::to_string).unwrap_or_default(),
    }
}

pub async fn handle(dashboard: &Dashboard, profile: &str, global: &GlobalOpts) -> Result<(), CliError> {
    util::sign_in(dashboard, profile).await?;
    dashboard.start()?;

    // Every task is already running; each wait overlaps the others.
    let deadline = util::settle_deadline(dashboard);
    let started = tokio::time::Instant::now();
    let mut resources = Vec::new();
    for spec in &dashboard.config().resources {
        let Some(mut stream) = dashboard.watch(spec.name.as_str()) else {
            continue;
        };
        let remaining = deadline.saturating_sub(started.elapsed());
        let state = util::settle(&mut stream, remaining).await;
        resources.push(ResourceSummary {
            name: spec.name.to_string(),
            transport: spec.transport_kind,
            origin: state.origin,
            updated: state.last_updated_at,
            error: state.last_error.clone(),
        });
    }

    let report = StatusReport {
        link: dashboard.link_status(),
        resources,
    };

    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &report,
        |r| {
            let rows: Vec<_> = r.resources.iter().map(|s| summary_row(s, color)).collect();
            format!("{}\nlink: {}", output::render_table(&rows), r.link)
        },
        |r| r.link.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
