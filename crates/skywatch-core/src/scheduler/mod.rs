// ── Poll/subscribe scheduler ──
//
// One background task per running resource. Poll tasks fetch, resolve and
// sleep for the refresh interval, strictly in sequence. Subscribe tasks hold
// one subscription open and reconnect with exponential backoff. Both exit
// promptly on cancellation and drop whatever was in flight.

mod backoff;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use backoff::ReconnectConfig;
use backoff::Backoff;

use crate::error::CoreError;
use crate::resource::{ErrorDescriptor, Outcome, ResourceName, ResourceSpec, TransportKind};
use crate::store::{Epoch, ResourceStore};
use crate::transport::{SubscriptionEvent, Transport};

/// Drives every running resource against a `Transport`.
///
/// Cheaply cloneable; clones share the same set of running resources.
pub struct Scheduler<T: Transport> {
    inner: Arc<SchedulerInner<T>>,
}

impl<T: Transport> Clone for Scheduler<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct SchedulerInner<T: Transport> {
    ctx: TaskContext<T>,
    root: CancellationToken,
    running: Arc<DashMap<ResourceName, Running>>,
}

impl<T: Transport> Drop for SchedulerInner<T> {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

struct Running {
    epoch: Epoch,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// What a resource task needs. Tasks never hold the scheduler itself, so
/// dropping the last `Scheduler` cancels them.
struct TaskContext<T> {
    transport: Arc<T>,
    store: Arc<ResourceStore>,
    running: Arc<DashMap<ResourceName, Running>>,
    request_timeout: Duration,
    reconnect: ReconnectConfig,
}

impl<T> Clone for TaskContext<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            store: Arc::clone(&self.store),
            running: Arc::clone(&self.running),
            request_timeout: self.request_timeout,
            reconnect: self.reconnect.clone(),
        }
    }
}

impl<T: Transport> Scheduler<T> {
    pub fn new(
        transport: Arc<T>,
        store: Arc<ResourceStore>,
        request_timeout: Duration,
        reconnect: ReconnectConfig,
    ) -> Self {
        let running = Arc::new(DashMap::new());
        Self {
            inner: Arc::new(SchedulerInner {
                ctx: TaskContext {
                    transport,
                    store,
                    running: Arc::clone(&running),
                    request_timeout,
                    reconnect,
                },
                root: CancellationToken::new(),
                running,
            }),
        }
    }

    pub fn store(&self) -> &Arc<ResourceStore> {
        &self.inner.ctx.store
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.inner.ctx.transport
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Register `spec` in the store and start driving it.
    ///
    /// Poll resources fetch immediately. A subscription that gave up
    /// reconnecting can be started again. Must be called within a tokio
    /// runtime.
    pub fn start(&self, spec: ResourceSpec) -> Result<(), CoreError> {
        spec.validate()?;
        if self.inner.root.is_cancelled() {
            return Err(CoreError::Internal("scheduler has been shut down".into()));
        }

        let Entry::Vacant(slot) = self.inner.running.entry(spec.name.clone()) else {
            return Err(CoreError::DuplicateResource {
                name: spec.name.to_string(),
            });
        };
        // Left behind by a subscription that exhausted its retries.
        if self.inner.ctx.store.unregister(spec.name.as_str()) {
            debug!(resource = %spec.name, "replacing stopped registration");
        }

        let epoch = self.inner.ctx.store.register(spec.clone())?;
        let cancel = self.inner.root.child_token();
        let ctx = self.inner.ctx.clone();
        let name = spec.name.clone();

        info!(
            resource = %name,
            kind = %spec.transport_kind,
            interval_ms = u64::try_from(spec.refresh_interval.as_millis()).unwrap_or(u64::MAX),
            fallback = %spec.fallback_policy,
            "starting resource"
        );

        let handle = match spec.transport_kind {
            TransportKind::Poll => tokio::spawn(poll_task(ctx, spec, epoch, cancel.clone())),
            TransportKind::Subscribe => tokio::spawn(subscribe_task(ctx, spec, epoch, cancel.clone())),
        };
        slot.insert(Running { epoch, cancel, handle });
        Ok(())
    }

    /// Stop driving `name` and drop it from the store.
    ///
    /// Idempotent: returns `false` if there was nothing to stop. A fetch in
    /// flight is abandoned and its result never reaches the store.
    pub fn stop(&self, name: &str) -> bool {
        let Some((name, running)) = self.inner.running.remove(name) else {
            return self.inner.ctx.store.unregister(name);
        };
        running.cancel.cancel();
        self.inner.ctx.store.unregister(name.as_str());
        debug!(resource = %name, "resource stopped");
        true
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.inner.running.contains_key(name)
    }

    /// Names of running resources, sorted.
    pub fn running(&self) -> Vec<ResourceName> {
        let mut names: Vec<ResourceName> = self.inner.running.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    /// Stop every resource and wait for the tasks to finish.
    ///
    /// No resource can be started afterwards.
    pub async fn shutdown(&self) {
        self.inner.root.cancel();

        let names: Vec<ResourceName> = self.inner.running.iter().map(|r| r.key().clone()).collect();
        let mut handles = Vec::with_capacity(names.len());
        for name in names {
            if let Some((name, running)) = self.inner.running.remove(name.as_str()) {
                self.inner.ctx.store.unregister(name.as_str());
                handles.push(running.handle);
            }
        }
        for handle in handles {
            let _ = handle.await;
        }
        debug!("scheduler shut down");
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Fetch, resolve, sleep. The interval runs from the end of each cycle.
async fn poll_task<T: Transport>(
    ctx: TaskContext<T>,
    spec: ResourceSpec,
    epoch: Epoch,
    cancel: CancellationToken,
) {
    let timeout = spec.effective_timeout(ctx.request_timeout);

    loop {
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = tokio::time::timeout(timeout, ctx.transport.fetch_once(&spec)) => match result {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(resource = %spec.name, timeout_ms = timeout.as_millis(), "fetch timed out");
                    Outcome::Failure(ErrorDescriptor::transport(format!(
                        "request timed out after {}ms",
                        timeout.as_millis()
                    )))
                }
            },
        };

        if cancel.is_cancelled() {
            break;
        }
        ctx.store.apply(spec.name.as_str(), epoch, outcome, Utc::now());

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(spec.refresh_interval) => {}
        }
    }

    debug!(resource = %spec.name, "poll loop exiting");
}

/// Hold one subscription open; reconnect with backoff when it fails.
///
/// The backoff starts over once a subscription has stayed up for a full
/// refresh interval.
async fn subscribe_task<T: Transport>(
    ctx: TaskContext<T>,
    spec: ResourceSpec,
    epoch: Epoch,
    cancel: CancellationToken,
) {
    let mut backoff = Backoff::new(ctx.reconnect.clone());

    loop {
        let mut handle = ctx.transport.open_subscription(&spec);
        let opened_at = Instant::now();
        debug!(resource = %spec.name, attempt = backoff.attempt(), "subscription opened");

        let failure = loop {
            let event = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                event = handle.next() => Some(event),
            };
            let Some(event) = event else {
                handle.close();
                debug!(resource = %spec.name, "subscribe loop exiting");
                return;
            };
            match event {
                SubscriptionEvent::Event(payload) => {
                    ctx.store.apply(spec.name.as_str(), epoch, Outcome::Success(payload), Utc::now());
                }
                SubscriptionEvent::Error(error) => break error,
                SubscriptionEvent::Closed => break ErrorDescriptor::transport("subscription closed"),
            }
        };
        handle.close();

        if cancel.is_cancelled() {
            break;
        }

        if opened_at.elapsed() >= spec.refresh_interval {
            backoff.reset();
        }
        let attempt = backoff.attempt();
        let Some(delay) = backoff.next_delay() else {
            warn!(resource = %spec.name, error = %failure, attempt, "reconnection limit reached, giving up");
            let exhausted = ErrorDescriptor {
                message: format!("reconnection limit reached: {}", failure.message),
                ..failure
            };
            ctx.store
                .apply(spec.name.as_str(), epoch, Outcome::Failure(exhausted), Utc::now());
            ctx.running
                .remove_if(spec.name.as_str(), |_, running| running.epoch == epoch);
            break;
        };
        ctx.store
            .apply(spec.name.as_str(), epoch, Outcome::Failure(failure.clone()), Utc::now());
        warn!(
            resource = %spec.name,
            error = %failure,
            attempt,
            delay_ms = delay.as_millis(),
            "subscription lost, reconnecting"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }
    }

    debug!(resource = %spec.name, "subscribe loop exiting");
}
