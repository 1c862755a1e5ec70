// ── Transport adapter ──
//
// One interface over request/response fetches and push subscriptions.
// Implementations do network I/O only and report what happened as an
// `Outcome` or a stream of `SubscriptionEvent`s; they never touch the store.

mod http;

use std::future::Future;

use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::trace;

pub use http::HttpTransport;

use crate::resource::{ErrorDescriptor, Outcome, Payload, ResourceSpec};

/// Backend access the scheduler drives.
pub trait Transport: Send + Sync + 'static {
    /// Perform one fetch for a `Poll` resource.
    fn fetch_once(&self, spec: &ResourceSpec) -> impl Future<Output = Outcome> + Send;

    /// Open the push subscription backing a `Subscribe` resource.
    ///
    /// Must be called from within a tokio runtime. Connection progress and
    /// failures are reported through the returned handle.
    fn open_subscription(&self, spec: &ResourceSpec) -> SubscriptionHandle;
}

/// What an open subscription reports.
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionEvent {
    Event(Payload),
    /// The subscription failed. Nothing follows.
    Error(ErrorDescriptor),
    /// The server ended the subscription. Nothing follows.
    Closed,
}

// ── Handle ───────────────────────────────────────────────────────────

/// Consumer end of a subscription.
///
/// Dropping the handle closes the subscription.
pub struct SubscriptionHandle {
    events: mpsc::Receiver<SubscriptionEvent>,
    cancel: CancellationToken,
    finished: bool,
}

impl SubscriptionHandle {
    /// A connected sink/handle pair. The sink side goes to the task doing
    /// the I/O.
    pub fn channel(capacity: usize) -> (SubscriptionSink, Self) {
        let (tx, events) = mpsc::channel(capacity);
        let cancel = CancellationToken::new();
        let sink = SubscriptionSink {
            tx,
            cancel: cancel.clone(),
        };
        (
            sink,
            Self {
                events,
                cancel,
                finished: false,
            },
        )
    }

    /// Next event. A sink dropped without a final event reads as `Closed`,
    /// and every call after `Error`/`Closed` returns `Closed`.
    pub async fn next(&mut self) -> SubscriptionEvent {
        if self.finished {
            return SubscriptionEvent::Closed;
        }
        let event = self.events.recv().await.unwrap_or(SubscriptionEvent::Closed);
        if !matches!(event, SubscriptionEvent::Event(_)) {
            self.finished = true;
        }
        event
    }

    /// Tear the subscription down. Safe to call any number of times.
    pub fn close(&self) {
        if !self.cancel.is_cancelled() {
            trace!("closing subscription");
            self.cancel.cancel();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("closed", &self.is_closed())
            .field("finished", &self.finished)
            .finish()
    }
}

// ── Sink ─────────────────────────────────────────────────────────────

/// Producer end of a subscription, owned by the I/O task.
#[derive(Debug)]
pub struct SubscriptionSink {
    tx: mpsc::Sender<SubscriptionEvent>,
    cancel: CancellationToken,
}

impl SubscriptionSink {
    /// Deliver a pushed payload. Returns `false` if the consumer is gone or
    /// lagging; lagging drops the payload, the next push supersedes it.
    pub fn event(&self, payload: Payload) -> bool {
        self.tx.try_send(SubscriptionEvent::Event(payload)).is_ok()
    }

    /// Report a failure and end the subscription.
    pub fn error(self, error: ErrorDescriptor) {
        let _ = self.tx.try_send(SubscriptionEvent::Error(error));
    }

    /// Report a server-side close and end the subscription.
    pub fn closed(self) {
        let _ = self.tx.try_send(SubscriptionEvent::Closed);
    }

    /// Token cancelled when the consumer closes the subscription.
    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::SensorReading;

    #[tokio::test]
    async fn events_then_error_then_closed_forever() {
        let (sink, mut handle) = SubscriptionHandle::channel(4);
        assert!(sink.event(Payload::Sensors(SensorReading::default())));
        sink.error(ErrorDescriptor::transport("reset"));

        assert!(matches!(handle.next().await, SubscriptionEvent::Event(_)));
        assert!(matches!(handle.next().await, SubscriptionEvent::Error(_)));
        assert_eq!(handle.next().await, SubscriptionEvent::Closed);
    }

    #[tokio::test]
    async fn dropped_sink_reads_as_closed() {
        let (sink, mut handle) = SubscriptionHandle::channel(1);
        drop(sink);
        assert_eq!(handle.next().await, SubscriptionEvent::Closed);
    }

    #[tokio::test]
    async fn close_is_idempotent_and_cancels_sink() {
        let (sink, handle) = SubscriptionHandle::channel(1);
        handle.close();
        handle.close();
        assert!(handle.is_closed());
        assert!(sink.is_cancelled());
        drop(handle);
        assert!(!sink.event(Payload::FireAlerts(Vec::new())));
    }
}
