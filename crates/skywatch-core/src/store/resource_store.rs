// ── Resource store ──
//
// Latest state per registered resource. Each slot owns a `watch` channel for
// async consumers; synchronous observers live in a separate registry so they
// can be attached before a resource exists. Only `apply` mutates state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::watch;
use tracing::{debug, trace};

use super::observer::{Observer, ObserverGuard, ObserverRegistry};
use crate::error::CoreError;
use crate::resolver::resolve;
use crate::resource::{Outcome, ResourceName, ResourceSpec, ResourceState};
use crate::stream::ResourceStream;

/// Identifies one registration of a resource. A name registered, removed and
/// registered again gets a new epoch, so results from the old registration's
/// task are rejected.
pub type Epoch = u64;

struct Slot {
    epoch: Epoch,
    spec: ResourceSpec,
    state: watch::Sender<Arc<ResourceState>>,
    /// Held for every publish; `true` once the slot is unregistered.
    retired: Mutex<bool>,
}

impl Slot {
    fn writer(&self) -> MutexGuard<'_, bool> {
        self.retired.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Thread-safe map of resource name to latest state.
pub struct ResourceStore {
    slots: DashMap<ResourceName, Arc<Slot>>,
    observers: Arc<ObserverRegistry>,
    next_epoch: AtomicU64,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
            observers: Arc::new(ObserverRegistry::default()),
            next_epoch: AtomicU64::new(1),
        }
    }

    // ── Registration ─────────────────────────────────────────────────

    /// Create the slot for a resource in state `Absent`.
    pub fn register(&self, spec: ResourceSpec) -> Result<Epoch, CoreError> {
        match self.slots.entry(spec.name.clone()) {
            Entry::Occupied(_) => Err(CoreError::DuplicateResource {
                name: spec.name.to_string(),
            }),
            Entry::Vacant(vacant) => {
                let epoch = self.next_epoch.fetch_add(1, Ordering::Relaxed);
                let (state, _) = watch::channel(Arc::new(ResourceState::absent()));
                debug!(resource = %spec.name, epoch, "resource registered");
                vacant.insert(Arc::new(Slot {
                    epoch,
                    spec,
                    state,
                    retired: Mutex::new(false),
                }));
                Ok(epoch)
            }
        }
    }

    /// Drop a resource. Observers see a final `Absent` state if the resource
    /// had anything to show, and nothing after it. Returns `false` if the
    /// name was not registered.
    pub fn unregister(&self, name: &str) -> bool {
        let Some((name, slot)) = self.slots.remove(name) else {
            return false;
        };
        let mut retired = slot.writer();
        *retired = true;
        debug!(resource = %name, epoch = slot.epoch, "resource unregistered");

        let last = slot.state.borrow().clone();
        if *last != ResourceState::absent() {
            let gone = Arc::new(ResourceState::absent());
            slot.state.send_replace(Arc::clone(&gone));
            self.observers.notify(&name, &gone);
        }
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn spec(&self, name: &str) -> Option<ResourceSpec> {
        self.slots.get(name).map(|slot| slot.spec.clone())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<ResourceName> {
        let mut names: Vec<ResourceName> = self.slots.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Current state of `name`; `Absent` for unknown names. Never fails.
    pub fn get_state(&self, name: &str) -> Arc<ResourceState> {
        self.slots
            .get(name)
            .map_or_else(|| Arc::new(ResourceState::absent()), |slot| slot.state.borrow().clone())
    }

    /// Async view of one resource's state. `None` if not registered.
    ///
    /// The stream ends when the resource is unregistered.
    pub fn watch(&self, name: &str) -> Option<ResourceStream> {
        self.slots
            .get(name)
            .map(|slot| ResourceStream::new(slot.state.subscribe()))
    }

    // ── Observers ────────────────────────────────────────────────────

    /// Call `observer` synchronously after every change of `name`.
    ///
    /// The resource does not need to be registered yet.
    pub fn subscribe<F>(&self, name: impl Into<ResourceName>, observer: F) -> ObserverGuard
    where
        F: Fn(&ResourceName, &ResourceState) + Send + Sync + 'static,
    {
        let name = name.into();
        let observer: Arc<Observer> = Arc::new(observer);
        let id = self.observers.add(name.clone(), observer);
        ObserverGuard::new(&self.observers, name, id)
    }

    pub fn observer_count(&self, name: &str) -> usize {
        self.observers.count(name)
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Resolve `outcome` against the current state and publish the result.
    ///
    /// Rejected when `name` is not registered under `epoch`. Returns `true`
    /// if the state changed and observers were notified. Observers run with
    /// the slot's write lock held, so they must not `apply` to the same
    /// resource.
    pub fn apply(&self, name: &str, epoch: Epoch, outcome: Outcome, now: DateTime<Utc>) -> bool {
        let Some(slot) = self.slots.get(name).map(|r| Arc::clone(r.value())) else {
            trace!(resource = name, epoch, "dropping result for unregistered resource");
            return false;
        };
        if slot.epoch != epoch {
            debug!(resource = name, epoch, current = slot.epoch, "dropping stale result");
            return false;
        }

        let retired = slot.writer();
        if *retired {
            trace!(resource = name, epoch, "dropping result for resource unregistered mid-apply");
            return false;
        }

        let prev = slot.state.borrow().clone();
        let source = slot.spec.source;
        let next = resolve(&prev, outcome, slot.spec.fallback_policy, || source.placeholder(now), now);
        if next == *prev {
            return false;
        }

        trace!(resource = name, origin = %next.origin, "resource state changed");
        let next = Arc::new(next);
        slot.state.send_replace(Arc::clone(&next));
        self.observers.notify(&slot.spec.name, &next);
        drop(retired);
        true
    }
}

impl Default for ResourceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{Confidence, FireAlert, SensorReading, Severity};
    use crate::resource::{ErrorDescriptor, FallbackPolicy, Origin, Payload, ResourceSource};

    fn t(sec: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, sec).unwrap()
    }

    fn sensors_spec() -> ResourceSpec {
        ResourceSpec::poll("sensors", ResourceSource::Sensors, Duration::from_secs(10))
            .with_fallback(FallbackPolicy::SyntheticDefault)
    }

    fn alerts_spec() -> ResourceSpec {
        ResourceSpec::poll("fireAlerts", ResourceSource::FireAlerts, Duration::from_secs(10))
    }

    fn alert(id: &str, ts: DateTime<Utc>) -> FireAlert {
        FireAlert {
            id: id.into(),
            timestamp: Some(ts),
            location: None,
            severity: Severity::Medium,
            confidence: Confidence::new(60.0),
            description: None,
            temperature: None,
            image_url: None,
        }
    }

    #[test]
    fn unknown_names_are_absent() {
        let store = ResourceStore::new();
        assert_eq!(*store.get_state("nope"), ResourceState::absent());
        assert!(store.watch("nope").is_none());
        assert!(!store.apply("nope", 1, Outcome::Empty, t(0)));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let store = ResourceStore::new();
        store.register(sensors_spec()).unwrap();
        let err = store.register(sensors_spec()).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateResource { .. }));
    }

    #[test]
    fn alerts_are_stored_newest_first() {
        let store = ResourceStore::new();
        let epoch = store.register(alerts_spec()).unwrap();
        let jan1 = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        let jan2 = Utc.with_ymd_and_hms(2025, 1, 2, 10, 0, 0).unwrap();

        let order = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&order);
        let _guard = store.subscribe("fireAlerts", move |_, state| {
            let ids: Vec<String> = state
                .value
                .as_ref()
                .and_then(Payload::as_fire_alerts)
                .map(|a| a.iter().map(|x| x.id.clone()).collect())
                .unwrap_or_default();
            seen.lock().unwrap().push(ids);
        });

        store.apply(
            "fireAlerts",
            epoch,
            Outcome::Success(Payload::FireAlerts(vec![alert("1", jan1), alert("2", jan2)])),
            t(1),
        );
        assert_eq!(*order.lock().unwrap(), vec![vec!["2".to_owned(), "1".to_owned()]]);
    }

    #[test]
    fn stale_epoch_is_rejected() {
        let store = ResourceStore::new();
        let old = store.register(sensors_spec()).unwrap();
        assert!(store.unregister("sensors"));
        let new = store.register(sensors_spec()).unwrap();
        assert_ne!(old, new);

        let payload = Payload::Sensors(SensorReading::default());
        assert!(!store.apply("sensors", old, Outcome::Success(payload.clone()), t(1)));
        assert_eq!(store.get_state("sensors").origin, Origin::Absent);
        assert!(store.apply("sensors", new, Outcome::Success(payload), t(1)));
        assert_eq!(store.get_state("sensors").origin, Origin::Live);
    }

    #[test]
    fn observers_called_on_change_only() {
        let store = ResourceStore::new();
        let epoch = store.register(alerts_spec()).unwrap();
        let calls = Arc::new(Mutex::new(0_u32));
        let counter = Arc::clone(&calls);
        let guard = store.subscribe("fireAlerts", move |_, _| *counter.lock().unwrap() += 1);

        let failure = || Outcome::Failure(ErrorDescriptor::transport("down"));
        assert!(store.apply("fireAlerts", epoch, failure(), t(1)));
        // Same error on an absent resource: nothing changes.
        assert!(!store.apply("fireAlerts", epoch, failure(), t(2)));
        assert_eq!(*calls.lock().unwrap(), 1);

        guard.unsubscribe();
        guard.unsubscribe();
        assert_eq!(store.observer_count("fireAlerts"), 0);
        store.apply("fireAlerts", epoch, Outcome::Success(Payload::FireAlerts(vec![])), t(3));
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn many_observers_and_drop_unsubscribes() {
        let store = ResourceStore::new();
        let a = store.subscribe("sensors", |_, _| {});
        let b = store.subscribe("sensors", |_, _| {});
        assert_eq!(store.observer_count("sensors"), 2);
        drop(a);
        assert_eq!(store.observer_count("sensors"), 1);
        b.detach();
        assert_eq!(store.observer_count("sensors"), 1);
    }

    #[test]
    fn unregister_notifies_absent() {
        let store = ResourceStore::new();
        let epoch = store.register(sensors_spec()).unwrap();
        store.apply("sensors", epoch, Outcome::Empty, t(1));
        assert_eq!(store.get_state("sensors").origin, Origin::Synthetic);

        let last = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&last);
        let _guard = store.subscribe("sensors", move |_, state| {
            *sink.lock().unwrap() = Some(state.origin);
        });
        assert!(store.unregister("sensors"));
        assert!(!store.unregister("sensors"));
        assert_eq!(*last.lock().unwrap(), Some(Origin::Absent));
        assert_eq!(store.get_state("sensors").origin, Origin::Absent);
    }

    #[test]
    fn unregister_waits_for_apply_in_progress() {
        let store = Arc::new(ResourceStore::new());
        let epoch = store.register(sensors_spec()).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let remover = Arc::new(Mutex::new(None));
        let (inner, sink, pending) = (Arc::clone(&store), Arc::clone(&seen), Arc::clone(&remover));
        let _guard = store.subscribe("sensors", move |_, state| {
            if state.origin == Origin::Live {
                let store = Arc::clone(&inner);
                *pending.lock().unwrap() = Some(std::thread::spawn(move || store.unregister("sensors")));
                std::thread::sleep(Duration::from_millis(50));
            }
            sink.lock().unwrap().push(state.origin);
        });

        let payload = Payload::Sensors(SensorReading::default());
        assert!(store.apply("sensors", epoch, Outcome::Success(payload.clone()), t(1)));
        let handle = remover.lock().unwrap().take().unwrap();
        assert!(handle.join().unwrap());

        assert_eq!(*seen.lock().unwrap(), vec![Origin::Live, Origin::Absent]);
        assert!(!store.apply("sensors", epoch, Outcome::Success(payload), t(2)));
        assert_eq!(store.get_state("sensors").origin, Origin::Absent);
    }

    #[test]
    fn observer_may_reenter_store() {
        let store = Arc::new(ResourceStore::new());
        let epoch = store.register(alerts_spec()).unwrap();
        let inner = Arc::clone(&store);
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let _guard = store.subscribe("fireAlerts", move |name, _| {
            *sink.lock().unwrap() = Some(inner.get_state(name.as_str()).origin);
        });
        store.apply("fireAlerts", epoch, Outcome::Success(Payload::FireAlerts(vec![])), t(1));
        assert_eq!(*seen.lock().unwrap(), Some(Origin::Live));
    }
}
