// ── Synchronous change observers ──
//
// Observers are plain callbacks keyed by resource name. They may be added
// before the resource is registered and survive re-registration.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;

use crate::resource::{ResourceName, ResourceState};

/// Callback invoked with the new state after every change of a resource.
pub type Observer = dyn Fn(&ResourceName, &ResourceState) + Send + Sync + 'static;

#[derive(Default)]
pub(crate) struct ObserverRegistry {
    by_name: DashMap<ResourceName, Vec<(u64, Arc<Observer>)>>,
    next_id: AtomicU64,
}

impl ObserverRegistry {
    pub(crate) fn add(&self, name: ResourceName, observer: Arc<Observer>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.by_name.entry(name).or_default().push((id, observer));
        id
    }

    pub(crate) fn remove(&self, name: &str, id: u64) {
        let now_empty = match self.by_name.get_mut(name) {
            Some(mut list) => {
                list.retain(|(existing, _)| *existing != id);
                list.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.by_name.remove_if(name, |_, list| list.is_empty());
        }
    }

    /// Call every observer of `name`, outside the map lock so observers may
    /// subscribe or unsubscribe re-entrantly.
    pub(crate) fn notify(&self, name: &ResourceName, state: &ResourceState) {
        let snapshot: Vec<Arc<Observer>> = match self.by_name.get(name.as_str()) {
            Some(list) => list.iter().map(|(_, obs)| Arc::clone(obs)).collect(),
            None => return,
        };
        for observer in snapshot {
            observer(name, state);
        }
    }

    pub(crate) fn count(&self, name: &str) -> usize {
        self.by_name.get(name).map_or(0, |list| list.len())
    }
}

/// Keeps an observer registered. Dropping it unsubscribes.
#[must_use = "dropping the guard unsubscribes the observer immediately"]
pub struct ObserverGuard {
    registry: Weak<ObserverRegistry>,
    name: ResourceName,
    id: u64,
    active: AtomicBool,
}

impl ObserverGuard {
    pub(crate) fn new(registry: &Arc<ObserverRegistry>, name: ResourceName, id: u64) -> Self {
        Self {
            registry: Arc::downgrade(registry),
            name,
            id,
            active: AtomicBool::new(true),
        }
    }

    pub fn resource(&self) -> &ResourceName {
        &self.name
    }

    /// Stop receiving notifications. Safe to call any number of times.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.name.as_str(), self.id);
        }
    }

    /// Leave the observer registered for the lifetime of the store.
    pub fn detach(self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for ObserverGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverGuard")
            .field("resource", &self.name)
            .field("active", &self.active.load(Ordering::SeqCst))
            .finish()
    }
}
