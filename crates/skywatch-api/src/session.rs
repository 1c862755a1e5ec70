// Credential holder shared by every request path.
//
// One `Session` is injected into the REST client and the push reader. It owns
// the bearer token, the identity the backend returned at login, and the
// authentication state observers watch for "log in again" prompts.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arc_swap::ArcSwapOption;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Authentication state as seen by the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    /// No credential held.
    Anonymous,
    /// A bearer token is held and has not been rejected.
    Authenticated,
    /// The backend rejected the token; the user must log in again.
    ReauthRequired,
}

/// Who the backend says we are, as returned by `/auth/login`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
}

/// Bearer credential store with a single reauthentication signal.
///
/// [`invalidate`](Self::invalidate) may be called concurrently from any number
/// of failing requests; only the first call after a credential was
/// established flips the state to [`AuthState::ReauthRequired`].
pub struct Session {
    token: ArcSwapOption<SecretString>,
    identity: ArcSwapOption<Identity>,
    reauth_signalled: AtomicBool,
    state: watch::Sender<AuthState>,
}

impl Session {
    /// An anonymous session.
    pub fn new() -> Self {
        let (state, _) = watch::channel(AuthState::Anonymous);
        Self {
            token: ArcSwapOption::empty(),
            identity: ArcSwapOption::empty(),
            reauth_signalled: AtomicBool::new(false),
            state,
        }
    }

    /// A session resuming from a token obtained earlier.
    pub fn with_token(token: SecretString) -> Self {
        let session = Self::new();
        session.establish(token, Identity::default());
        session
    }

    /// Store a freshly issued credential.
    pub fn establish(&self, token: SecretString, identity: Identity) {
        self.token.store(Some(Arc::new(token)));
        self.identity.store(Some(Arc::new(identity)));
        self.reauth_signalled.store(false, Ordering::SeqCst);
        self.state.send_replace(AuthState::Authenticated);
        debug!("session established");
    }

    /// The bearer token to attach to outgoing requests, if any.
    pub fn bearer(&self) -> Option<Arc<SecretString>> {
        self.token.load_full()
    }

    pub fn identity(&self) -> Option<Arc<Identity>> {
        self.identity.load_full()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.load().is_some()
    }

    /// Current authentication state.
    pub fn state(&self) -> AuthState {
        *self.state.borrow()
    }

    /// Subscribe to authentication state changes.
    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Drop the credential on explicit logout.
    pub fn clear(&self) {
        self.token.store(None);
        self.identity.store(None);
        self.reauth_signalled.store(false, Ordering::SeqCst);
        self.state.send_replace(AuthState::Anonymous);
        debug!("session cleared");
    }

    /// Drop the credential after the backend rejected it.
    ///
    /// Returns `true` for the one call that issued the reauthentication
    /// signal, `false` for every later call until a new credential is
    /// established.
    pub fn invalidate(&self) -> bool {
        self.token.store(None);
        self.identity.store(None);
        if self.reauth_signalled.swap(true, Ordering::SeqCst) {
            return false;
        }
        warn!("backend rejected credential, re-authentication required");
        self.state.send_replace(AuthState::ReauthRequired);
        true
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
