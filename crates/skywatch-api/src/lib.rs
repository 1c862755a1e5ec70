// skywatch-api: Async Rust client for the Skywatch ground-station backend (REST + push)

pub mod error;
pub mod push;
pub mod rest;
pub mod session;
pub mod transport;

pub use error::Error;
pub use push::PushEvent;
pub use rest::ApiClient;
pub use rest::models;
pub use rest::servo::PWM_RANGE;
pub use session::{AuthState, Identity, Session};
pub use transport::{TlsMode, TransportConfig};
