//! Shared helpers for command handlers.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};

use skywatch_core::{CoreError, Dashboard, Origin, ResourceSpec, ResourceState, ResourceStream};

use crate::error::CliError;

/// Extra time on top of the request timeout before a first cycle is
/// considered lost.
const SETTLE_GRACE: Duration = Duration::from_secs(2);

/// Map a core error, naming the active profile in auth failures.
pub fn core_err(err: CoreError, profile: &str) -> CliError {
    match err {
        CoreError::AuthenticationFailed { message } => CliError::AuthFailed {
            profile: profile.into(),
            message,
        },
        CoreError::ReauthRequired => CliError::AuthFailed {
            profile: profile.into(),
            message: "session expired".into(),
        },
        other => other.into(),
    }
}

/// Log in with the configured credentials, if any.
pub async fn sign_in(dashboard: &Dashboard, profile: &str) -> Result<(), CliError> {
    let Some(creds) = dashboard.config().credentials.clone() else {
        tracing::debug!(profile, "no credentials, continuing anonymously");
        return Ok(());
    };
    dashboard
        .login(&creds.email, &creds.password)
        .await
        .map(|_| ())
        .map_err(|e| core_err(e, profile))
}

/// Like [`sign_in`], but credentials are mandatory.
pub async fn require_sign_in(dashboard: &Dashboard, profile: &str) -> Result<(), CliError> {
    if dashboard.config().credentials.is_none() {
        return Err(CliError::NoCredentials {
            profile: profile.into(),
        });
    }
    sign_in(dashboard, profile).await
}

/// Configured `ResourceSpec` for `name`.
pub fn resource_spec(dashboard: &Dashboard, name: &str) -> Result<ResourceSpec, CliError> {
    let resources = &dashboard.config().resources;
    resources
        .iter()
        .find(|s| s.name.as_str() == name)
        .cloned()
        .ok_or_else(|| CliError::UnknownResource {
            name: name.into(),
            available: resources
                .iter()
                .map(|s| s.name.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
}

/// How long to wait for the first cycle of a resource.
pub fn settle_deadline(dashboard: &Dashboard) -> Duration {
    dashboard.config().request_timeout + SETTLE_GRACE
}

/// `true` once a resource has completed at least one cycle.
pub fn is_settled(state: &ResourceState) -> bool {
    state.origin != Origin::Absent || state.last_error.is_some()
}

/// Wait until `stream` settles or `deadline` passes; returns the latest
/// state either way.
pub async fn settle(stream: &mut ResourceStream, deadline: Duration) -> Arc<ResourceState> {
    if is_settled(stream.current()) {
        return Arc::clone(stream.current());
    }
    let wait = async {
        while let Some(state) = stream.changed().await {
            if is_settled(&state) {
                return;
            }
        }
    };
    let _ = tokio::time::timeout(deadline, wait).await;
    stream.latest()
}

/// Mount one configured resource and wait for its first cycle.
pub async fn first_cycle(dashboard: &Dashboard, name: &str) -> Result<Arc<ResourceState>, CliError> {
    let spec = resource_spec(dashboard, name)?;
    dashboard.mount(spec)?;
    let mut stream = dashboard.watch(name).ok_or_else(|| CliError::UnknownResource {
        name: name.into(),
        available: String::new(),
    })?;

    let deadline = settle_deadline(dashboard);
    let state = settle(&mut stream, deadline).await;
    if is_settled(&state) {
        Ok(state)
    } else {
        Err(CliError::Timeout {
            seconds: deadline.as_secs(),
        })
    }
}

/// Fail if a settled resource has nothing to show for a reason the user
/// must act on. Empty results and fallbacks pass through.
pub fn require_value(
    dashboard: &Dashboard,
    resource: &str,
    state: &ResourceState,
    profile: &str,
) -> Result<(), CliError> {
    if state.value.is_some() {
        return Ok(());
    }
    match &state.last_error {
        Some(err) if err.kind != skywatch_core::ErrorKind::Empty => Err(CliError::from_descriptor(
            resource,
            err,
            dashboard.config().base_url.as_str(),
            profile,
        )),
        _ => Ok(()),
    }
}

/// Tell the user when they are looking at fallback data.
pub fn degraded_note(resource: &str, state: &ResourceState) -> Option<String> {
    let err = state.last_error.as_ref()?;
    match state.origin {
        Origin::Live => Some(format!("{resource}: last refresh failed ({err})")),
        Origin::Cached => Some(format!("{resource}: showing cached data ({err})")),
        Origin::Synthetic => Some(format!("{resource}: showing placeholder data ({err})")),
        Origin::Absent => Some(format!("{resource}: {err}")),
    }
}

/// Local wall-clock time, or `N/A`.
pub fn format_time(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(
        || skywatch_core::panel::MISSING.into(),
        |t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}
