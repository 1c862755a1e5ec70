// ── Resource store ──
//
// Shared state of every live resource plus the observers watching it.

mod observer;
mod resource_store;

pub use observer::{Observer, ObserverGuard};
pub use resource_store::{Epoch, ResourceStore};
