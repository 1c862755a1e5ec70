//! CLI configuration: thin wrapper around `skywatch_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--backend, --email, --insecure, --timeout, --output, --color).

use clap::ValueEnum;
use skywatch_core::SyncConfig;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use skywatch_config::{Config, Defaults, Profile, config_path, load_config_or_default, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names for help text.
pub fn available_profiles(config: &Config) -> String {
    if config.profiles.is_empty() {
        "(none)".into()
    } else {
        config.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Settle `global.output` and `global.color`: flags first, then the
/// config file's `[defaults]`. Unparseable defaults are ignored.
pub fn resolve_display(global: &mut GlobalOpts, defaults: &Defaults) {
    global.output = global
        .output_flag
        .or_else(|| parse_default::<OutputFormat>("output", &defaults.output))
        .unwrap_or(OutputFormat::Table);
    global.color = global
        .color_flag
        .or_else(|| parse_default::<ColorMode>("color", &defaults.color))
        .unwrap_or(ColorMode::Auto);
}

fn parse_default<T: ValueEnum>(key: &str, value: &str) -> Option<T> {
    let parsed = T::from_str(value, true).ok();
    if parsed.is_none() {
        tracing::warn!(key, value, "ignoring unrecognised config default");
    }
    parsed
}

/// Build a `SyncConfig` from the config file, active profile, and flags.
///
/// Flags override profile values. Without a profile, `--backend` alone is
/// enough to run anonymously.
pub fn build_sync_config(global: &GlobalOpts) -> Result<(SyncConfig, String), CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.backend.is_some() => Profile::default(),
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        None => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    apply_flags(&mut profile, global);
    let sync = skywatch_config::profile_to_sync_config(&profile, &profile_name, &cfg.defaults)?;
    Ok((sync, profile_name))
}

/// Overlay global flags onto a profile.
fn apply_flags(profile: &mut Profile, global: &GlobalOpts) {
    if let Some(ref backend) = global.backend {
        // A push URL from the file belongs to the file's backend.
        if *backend != profile.backend {
            profile.push_url = None;
        }
        profile.backend.clone_from(backend);
    }
    if let Some(ref email) = global.email {
        profile.email = Some(email.clone());
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
}
