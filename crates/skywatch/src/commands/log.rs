//! Flight log feed.

use chrono::Local;

use skywatch_core::{Dashboard, LogEntry};

use crate::cli::{GlobalOpts, LogArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

/// Entries newer than `last`, oldest first. `entries` is newest first.
pub(crate) fn fresh_entries<'a>(entries: &'a [LogEntry], last: Option<&LogEntry>) -> Vec<&'a LogEntry> {
    let mut fresh: Vec<&LogEntry> = entries
        .iter()
        .take_while(|entry| Some(*entry) != last)
        .collect();
    fresh.reverse();
    fresh
}

fn render_entry(entry: &LogEntry, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json | OutputFormat::JsonCompact => output::render_json(entry, true),
        OutputFormat::Yaml => format!("---\n{}", output::render_yaml(entry)),
        OutputFormat::Table | OutputFormat::Plain => format!(
            "[{}] {}",
            entry.at.with_timezone(&Local).format("%H:%M:%S"),
            entry.message
        ),
    }
}

pub async fn handle(
    dashboard: &Dashboard,
    args: LogArgs,
    profile: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::sign_in(dashboard, profile).await?;
    // Status lines read the live store.
    dashboard.start()?;
    dashboard.start_flight_log().await;

    let mut rx = dashboard.flight_log().subscribe();
    let mut last: Option<LogEntry> = None;
    let mut printed = 0usize;

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }

        let entries: Vec<LogEntry> = rx.borrow_and_update().iter().cloned().collect();
        for entry in fresh_entries(&entries, last.as_ref()) {
            output::print_output(&render_entry(entry, global.output), global.quiet);
            printed += 1;
            if args.count.is_some_and(|limit| printed >= limit) {
                return Ok(());
            }
        }
        last = entries.first().cloned();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn entry(sec: u32, message: &str) -> LogEntry {
        LogEntry {
            at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, sec).single().unwrap_or_default(),
            message: message.into(),
        }
    }

    #[test]
    fn only_new_entries_in_arrival_order() {
        let log = [entry(3, "c"), entry(2, "b"), entry(1, "a")];
        let fresh: Vec<_> = fresh_entries(&log, Some(&entry(1, "a")))
            .into_iter()
            .map(|e| e.message.as_str())
            .collect();
        assert_eq!(fresh, ["b", "c"]);

        assert_eq!(fresh_entries(&log, None).len(), 3);
        assert!(fresh_entries(&log, Some(&entry(3, "c"))).is_empty());
    }
}
