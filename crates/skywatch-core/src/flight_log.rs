// ── Flight log feed ──
//
// Bounded newest-first log of flight events. `FlightLogSimulator` plays a
// scripted start-up sequence on a fixed cadence, then reports status lines
// read from the resource store. Pushed telemetry coming online is logged as
// it happens.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::dashboard::freshest_telemetry;
use crate::model::TelemetrySample;
use crate::panel::{MISSING, compass_point, format_reading};
use crate::resource::{Payload, names};
use crate::store::{ObserverGuard, ResourceStore};

/// Entries kept; older ones fall off the end.
pub const CAPACITY: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub message: String,
}

/// Newest-first log with change notification.
pub struct FlightLog {
    entries: watch::Sender<Arc<VecDeque<LogEntry>>>,
}

impl FlightLog {
    pub fn new() -> Self {
        let (entries, _) = watch::channel(Arc::new(VecDeque::with_capacity(CAPACITY)));
        Self { entries }
    }

    pub fn push(&self, message: impl Into<String>, at: DateTime<Utc>) {
        let entry = LogEntry { at, message: message.into() };
        self.entries.send_modify(|entries| {
            let entries = Arc::make_mut(entries);
            entries.push_front(entry);
            entries.truncate(CAPACITY);
        });
    }

    /// Log a one-line summary of a telemetry sample.
    pub fn record_telemetry(&self, sample: &TelemetrySample, at: DateTime<Utc>) {
        let message = format!(
            "Telemetry: battery {}, altitude {}, heading {}",
            format_reading(sample.battery, 0, "%"),
            format_reading(sample.altitude, 1, "m"),
            format_reading(sample.heading, 0, "°"),
        );
        self.push(message, at);
    }

    /// Newest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.borrow().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<VecDeque<LogEntry>>> {
        self.entries.subscribe()
    }
}

impl Default for FlightLog {
    fn default() -> Self {
        Self::new()
    }
}

// ── Simulator ────────────────────────────────────────────────────────

const STARTUP_SCRIPT: [&str; 12] = [
    "System initialized",
    "Checking GPS connection...",
    "GPS fix acquired (12 satellites)",
    "Mode: STABILIZE",
    "Battery 92%",
    "Takeoff initiated...",
    "Altitude: 15m",
    "Heading: 90° (East)",
    "Fire detected near coordinates (-7.025, 110.412)",
    "Switching to AUTO mode",
    "Sending fire report to GCS...",
    "Data synchronized successfully.",
];

/// Status lines cycled through once the script has played.
#[derive(Debug, Clone, Copy)]
enum StatusLine {
    Battery,
    Satellites,
    Temperature,
    Heading,
    Altitude,
}

const STATUS_ROTATION: [StatusLine; 5] = [
    StatusLine::Battery,
    StatusLine::Satellites,
    StatusLine::Temperature,
    StatusLine::Heading,
    StatusLine::Altitude,
];

fn status_message(line: StatusLine, store: &ResourceStore) -> String {
    let telemetry = freshest_telemetry(store);
    let telemetry = telemetry.as_ref();
    match line {
        StatusLine::Battery => format!(
            "Battery: {}",
            format_reading(telemetry.and_then(|t| t.battery), 0, "%")
        ),
        StatusLine::Satellites => match telemetry.and_then(|t| t.gps.satellites_visible) {
            Some(sats) => format!("GPS: {sats} satellites"),
            None => format!("GPS: {MISSING}"),
        },
        StatusLine::Temperature => {
            let state = store.get_state(names::SENSORS);
            let temp = state
                .value
                .as_ref()
                .and_then(Payload::as_sensors)
                .and_then(|s| s.temperature);
            format!("Temp: {}", format_reading(temp, 1, "°C"))
        }
        StatusLine::Heading => match telemetry.and_then(|t| t.heading) {
            Some(h) => format!("Heading: {h:.0}° ({})", compass_point(h)),
            None => format!("Heading: {MISSING}"),
        },
        StatusLine::Altitude => format!(
            "Altitude: {}",
            format_reading(telemetry.and_then(|t| t.altitude), 1, "m")
        ),
    }
}

/// Log a telemetry summary each time the push stream turns healthy.
fn link_observer(log: &Arc<FlightLog>, store: &ResourceStore) -> ObserverGuard {
    let log = Arc::clone(log);
    let online = AtomicBool::new(false);
    store.subscribe(names::TELEMETRY_STREAM, move |_, state| {
        let sample = state
            .is_healthy()
            .then(|| state.value.as_ref().and_then(Payload::as_telemetry))
            .flatten();
        match sample {
            Some(sample) => {
                if !online.swap(true, Ordering::Relaxed) {
                    log.record_telemetry(sample, state.last_updated_at.unwrap_or_else(Utc::now));
                }
            }
            None => online.store(false, Ordering::Relaxed),
        }
    })
}

/// Background task feeding a `FlightLog`.
pub struct FlightLogSimulator {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
    _link: ObserverGuard,
}

impl FlightLogSimulator {
    pub const CADENCE: Duration = Duration::from_millis(2500);

    /// Start feeding `log`. The first line appears one cadence from now.
    pub fn spawn(log: Arc<FlightLog>, store: Arc<ResourceStore>, cancel: CancellationToken) -> Self {
        let link = link_observer(&log, &store);
        let task_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            let mut ticks = tokio::time::interval_at(Instant::now() + Self::CADENCE, Self::CADENCE);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut script = STARTUP_SCRIPT.iter();
            let mut rotation = STATUS_ROTATION.iter().cycle();

            loop {
                tokio::select! {
                    biased;
                    () = task_cancel.cancelled() => break,
                    _ = ticks.tick() => {}
                }
                let message = match script.next() {
                    Some(line) => (*line).to_owned(),
                    None => rotation
                        .next()
                        .map_or_else(String::new, |line| status_message(*line, &store)),
                };
                log.push(message, Utc::now());
            }
            debug!("flight log simulator exiting");
        });
        Self {
            cancel,
            handle,
            _link: link,
        }
    }

    /// Stop and wait for the task to finish.
    pub async fn join(self) {
        self.cancel.cancel();
        let _ = self.handle.await;
    }
}
