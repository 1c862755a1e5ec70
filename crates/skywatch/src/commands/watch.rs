//! Live resource feed.

use std::sync::Arc;

use chrono::Local;
use serde::Serialize;
use tokio::sync::mpsc;

use skywatch_core::panel::{MISSING, compass_point, format_reading};
use skywatch_core::{AuthState, Dashboard, Payload, ResourceName, ResourceState};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::util;

/// What woke the watch loop.
enum Wake {
    Update(Option<(ResourceName, Arc<ResourceState>)>),
    Auth,
}

#[derive(Serialize)]
struct Update<'a> {
    resource: &'a str,
    #[serde(flatten)]
    state: &'a ResourceState,
}

/// One-line digest of a payload.
pub(crate) fn summarize(payload: &Payload) -> String {
    match payload {
        Payload::Telemetry(t) => format!(
            "battery {} · alt {} · hdg {} ({}) · sats {}",
            format_reading(t.battery, 0, "%"),
            format_reading(t.altitude, 1, "m"),
            format_reading(t.heading, 0, "°"),
            t.heading.map_or(MISSING, compass_point),
            t.gps.satellites_visible.map_or_else(|| MISSING.into(), |s| s.to_string()),
        ),
        Payload::Sensors(s) => format!(
            "temp {} · humidity {} · wind {}",
            format_reading(s.temperature, 1, "°C"),
            format_reading(s.humidity, 0, "%"),
            format_reading(s.wind_speed, 1, "m/s"),
        ),
        Payload::FireAlerts(alerts) => match alerts.first() {
            Some(newest) => format!("{} alerts · newest {} ({})", alerts.len(), newest.id, newest.severity),
            None => "no alerts".into(),
        },
        Payload::VideoFrame(f) => f.url.clone(),
    }
}

fn render_update(name: &str, state: &ResourceState, global: &GlobalOpts, color: bool) -> String {
    match global.output {
        OutputFormat::Table | OutputFormat::Plain => {
            let body = state
                .value
                .as_ref()
                .map_or_else(|| MISSING.to_owned(), summarize);
            let mut line = format!(
                "{}  {:<22} {:<9} {body}",
                Local::now().format("%H:%M:%S"),
                name,
                output::paint_origin(state.origin, color),
            );
            if let Some(ref err) = state.last_error {
                line.push_str(&format!("  [{err}]"));
            }
            line
        }
        // One document per line regardless of pretty/compact.
        OutputFormat::Json | OutputFormat::JsonCompact => {
            output::render_json(&Update { resource: name, state }, true)
        }
        OutputFormat::Yaml => format!("---\n{}", output::render_yaml(&Update { resource: name, state })),
    }
}

pub async fn handle(
    dashboard: &Dashboard,
    args: WatchArgs,
    profile: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::sign_in(dashboard, profile).await?;

    let specs = if args.resources.is_empty() {
        dashboard.config().resources.clone()
    } else {
        args.resources
            .iter()
            .map(|name| util::resource_spec(dashboard, name))
            .collect::<Result<Vec<_>, _>>()?
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<(ResourceName, Arc<ResourceState>)>();
    let mut guards = Vec::with_capacity(specs.len());
    for spec in &specs {
        let tx = tx.clone();
        guards.push(dashboard.subscribe(spec.name.clone(), move |name, state| {
            let _ = tx.send((name.clone(), Arc::new(state.clone())));
        }));
    }
    drop(tx);

    // Subscribe before anything can be rejected.
    let mut auth = dashboard.auth_changes();
    for spec in specs {
        dashboard.mount(spec)?;
    }

    let color = output::should_color(global.color);
    let mut seen = 0usize;
    loop {
        let wake = tokio::select! {
            update = rx.recv() => Wake::Update(update),
            changed = auth.changed() => if changed.is_ok() { Wake::Auth } else { Wake::Update(None) },
            _ = tokio::signal::ctrl_c() => Wake::Update(None),
        };
        let update = match wake {
            Wake::Update(update) => update,
            Wake::Auth => {
                if *auth.borrow_and_update() == AuthState::ReauthRequired {
                    drop(guards);
                    dashboard.shutdown().await;
                    return Err(CliError::AuthFailed {
                        profile: profile.into(),
                        message: "backend rejected the session, log in again".into(),
                    });
                }
                continue;
            }
        };
        let Some((name, state)) = update else { break };
        output::print_output(&render_update(name.as_str(), &state, global, color), global.quiet);

        seen += 1;
        if args.count.is_some_and(|limit| seen >= limit) {
            break;
        }
    }

    drop(guards);
    Ok(())
}

#[cfg(test)]
mod tests {
    use skywatch_core::{SensorReading, TelemetrySample};

    use super::*;

    #[test]
    fn telemetry_digest() {
        let mut sample = TelemetrySample {
            battery: Some(76.0),
            altitude: Some(35.24),
            heading: Some(181.0),
            ..TelemetrySample::default()
        };
        sample.gps.satellites_visible = Some(11);
        assert_eq!(
            summarize(&Payload::Telemetry(sample)),
            "battery 76% · alt 35.2m · hdg 181° (S) · sats 11"
        );
    }

    #[test]
    fn missing_fields_read_na() {
        let digest = summarize(&Payload::Sensors(SensorReading::default()));
        assert_eq!(digest, "temp N/A · humidity N/A · wind N/A");
        assert_eq!(summarize(&Payload::FireAlerts(Vec::new())), "no alerts");
    }
}
