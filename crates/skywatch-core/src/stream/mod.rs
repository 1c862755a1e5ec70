// ── Reactive resource streams ──
//
// Async counterpart to store observers: one stream per resource, backed by
// the store's watch channel.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::resource::ResourceState;

/// A subscription to one resource's state.
///
/// Gives point-in-time access via `current()`/`latest()` and change
/// notification via `changed()` or by converting into a `Stream`.
pub struct ResourceStream {
    current: Arc<ResourceState>,
    receiver: watch::Receiver<Arc<ResourceState>>,
}

impl ResourceStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<ResourceState>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// State captured at creation or at the last `changed()`.
    pub fn current(&self) -> &Arc<ResourceState> {
        &self.current
    }

    pub fn latest(&self) -> Arc<ResourceState> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change.
    /// Returns `None` once the resource has been unregistered.
    pub async fn changed(&mut self) -> Option<Arc<ResourceState>> {
        self.receiver.changed().await.ok()?;
        let state = self.receiver.borrow_and_update().clone();
        self.current = Arc::clone(&state);
        Some(state)
    }

    /// Convert into a `Stream`. The first item is the current state.
    pub fn into_stream(self) -> ResourceWatchStream {
        ResourceWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
pub struct ResourceWatchStream {
    inner: WatchStream<Arc<ResourceState>>,
}

impl Stream for ResourceWatchStream {
    type Item = Arc<ResourceState>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use futures_util::StreamExt;

    use crate::resource::{Origin, Outcome, Payload, ResourceSource, ResourceSpec};
    use crate::store::ResourceStore;

    #[tokio::test]
    async fn changed_follows_store_until_unregistered() {
        let store = ResourceStore::new();
        let spec = ResourceSpec::poll("fireAlerts", ResourceSource::FireAlerts, Duration::from_secs(10));
        let epoch = store.register(spec).unwrap();

        let mut stream = store.watch("fireAlerts").unwrap();
        assert_eq!(stream.current().origin, Origin::Absent);

        store.apply("fireAlerts", epoch, Outcome::Success(Payload::FireAlerts(vec![])), Utc::now());
        let next = stream.changed().await.unwrap();
        assert_eq!(next.origin, Origin::Live);
        assert_eq!(stream.current().origin, Origin::Live);

        store.unregister("fireAlerts");
        // Final absent state, then end of stream.
        assert_eq!(stream.changed().await.unwrap().origin, Origin::Absent);
        assert!(stream.changed().await.is_none());
    }

    #[tokio::test]
    async fn into_stream_yields_current_first() {
        let store = ResourceStore::new();
        let spec = ResourceSpec::poll("sensors", ResourceSource::Sensors, Duration::from_secs(10));
        store.register(spec).unwrap();

        let mut stream = store.watch("sensors").unwrap().into_stream();
        let first = stream.next().await.unwrap();
        assert_eq!(first.origin, Origin::Absent);
    }
}
