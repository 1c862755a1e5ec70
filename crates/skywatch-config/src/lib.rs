//! Shared configuration for the Skywatch CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! per-resource overrides, and translation to `skywatch_core::SyncConfig`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use skywatch_core::{Credentials, FallbackPolicy, ResourceSpec, SyncConfig, TlsVerification, default_resources};

const KEYRING_SERVICE: &str = "skywatch";

/// Overrides the config file location.
pub const CONFIG_ENV: &str = "SKYWATCH_CONFIG";

/// Checked after a profile's `password_env`.
pub const PASSWORD_ENV: &str = "SKYWATCH_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Pick `name`, else the default profile.
    pub fn profile(&self, name: Option<&str>) -> Result<(String, &Profile), ConfigError> {
        let name = name
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into());
        match self.profiles.get(&name) {
            Some(profile) => Ok((name, profile)),
            None => Err(ConfigError::UnknownProfile { name }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    8
}

/// A named backend profile.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// REST base URL (e.g., "http://192.168.4.1:5000/api").
    pub backend: String,

    /// Push endpoint; derived from `backend` when unset.
    pub push_url: Option<String>,

    /// Login email.
    pub email: Option<String>,

    /// Password (plaintext; prefer keyring).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,

    /// Per-resource tweaks keyed by resource name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resources: BTreeMap<String, ResourceOverride>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ResourceOverride {
    /// Refresh interval in milliseconds.
    pub interval_ms: Option<u64>,
    /// `none`, `last_known_good`, or `synthetic_default`.
    pub fallback: Option<String>,
    /// `false` drops the resource from the started set.
    pub enabled: Option<bool>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `SKYWATCH_CONFIG`, else platform conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("id", "skywatch", "skywatch").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("skywatch");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path`, then `SKYWATCH_*` variables (`__` separates keys).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SKYWATCH_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))?)
}

/// Resolve the login password: `password_env`, `SKYWATCH_PASSWORD`,
/// system keyring, then plaintext.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. Global env var
    if let Ok(val) = std::env::var(PASSWORD_ENV) {
        return Ok(SecretString::from(val));
    }

    // 3. Keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a password in the system keyring for `profile_name`.
pub fn store_password(profile_name: &str, password: &SecretString) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(password.expose_secret())?;
    Ok(())
}

/// Email + password if the profile has both; `None` means anonymous.
pub fn resolve_credentials(profile: &Profile, profile_name: &str) -> Option<Credentials> {
    let email = profile.email.clone()?;
    let password = resolve_password(profile, profile_name).ok()?;
    Some(Credentials { email, password })
}

// ── Resource overrides ──────────────────────────────────────────────

/// Apply `overrides` to `specs`. Unknown names and bad values are rejected.
pub fn apply_overrides(
    specs: Vec<ResourceSpec>,
    overrides: &BTreeMap<String, ResourceOverride>,
) -> Result<Vec<ResourceSpec>, ConfigError> {
    for name in overrides.keys() {
        if !specs.iter().any(|s| s.name.as_str() == name) {
            return Err(ConfigError::Validation {
                field: format!("resources.{name}"),
                reason: "no such resource".into(),
            });
        }
    }

    let mut out = Vec::with_capacity(specs.len());
    for mut spec in specs {
        let Some(o) = overrides.get(spec.name.as_str()) else {
            out.push(spec);
            continue;
        };
        if o.enabled == Some(false) {
            continue;
        }
        if let Some(ms) = o.interval_ms {
            if ms == 0 {
                return Err(ConfigError::Validation {
                    field: format!("resources.{}.interval_ms", spec.name),
                    reason: "must be positive".into(),
                });
            }
            spec.refresh_interval = Duration::from_millis(ms);
        }
        if let Some(ref raw) = o.fallback {
            spec.fallback_policy = raw.parse::<FallbackPolicy>().map_err(|_| ConfigError::Validation {
                field: format!("resources.{}.fallback", spec.name),
                reason: format!("expected 'none', 'last_known_good', or 'synthetic_default', got '{raw}'"),
            })?;
        }
        out.push(spec);
    }
    Ok(out)
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `SyncConfig` from a profile, without CLI flag overrides.
pub fn profile_to_sync_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<SyncConfig, ConfigError> {
    let url: url::Url = profile.backend.parse().map_err(|_| ConfigError::Validation {
        field: "backend".into(),
        reason: format!("invalid URL: {}", profile.backend),
    })?;

    let mut config = SyncConfig::new(url);

    if let Some(ref raw) = profile.push_url {
        config.push_url = Some(raw.parse().map_err(|_| ConfigError::Validation {
            field: "push_url".into(),
            reason: format!("invalid URL: {raw}"),
        })?);
    }

    if profile.insecure.unwrap_or(defaults.insecure) {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }
    config.request_timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.resources = apply_overrides(default_resources(), &profile.resources)?;
    config.credentials = resolve_credentials(profile, profile_name);

    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use skywatch_core::names;

    use super::*;

    fn profile(backend: &str) -> Profile {
        Profile {
            backend: backend.into(),
            ..Profile::default()
        }
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert_eq!(cfg.defaults.timeout, 8);
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        let mut field = profile("http://192.168.4.1:5000/api");
        field.email = Some("pilot@skywatch.id".into());
        field.resources.insert(
            names::SENSORS.into(),
            ResourceOverride {
                interval_ms: Some(2_000),
                ..ResourceOverride::default()
            },
        );
        cfg.profiles.insert("field".into(), field);

        save_config_to(&cfg, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profiles, cfg.profiles);
    }

    #[test]
    fn parses_hand_written_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_profile = "gcs"

[defaults]
output = "json"

[profiles.gcs]
backend = "https://gcs.example.org/api"
insecure = true

[profiles.gcs.resources."videoFrame:raw"]
enabled = false
"#,
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.defaults.output, "json");
        let (name, gcs) = cfg.profile(None).unwrap();
        assert_eq!(name, "gcs");
        assert_eq!(gcs.insecure, Some(true));
        assert_eq!(gcs.resources[names::VIDEO_RAW].enabled, Some(false));
        assert!(matches!(cfg.profile(Some("other")), Err(ConfigError::UnknownProfile { .. })));
    }

    #[test]
    fn overrides_adjust_and_drop_resources() {
        let mut overrides = BTreeMap::new();
        overrides.insert(
            names::FIRE_ALERTS.to_owned(),
            ResourceOverride {
                interval_ms: Some(30_000),
                fallback: Some("last_known_good".into()),
                enabled: None,
            },
        );
        overrides.insert(
            names::VIDEO_DETECTION.to_owned(),
            ResourceOverride {
                enabled: Some(false),
                ..ResourceOverride::default()
            },
        );

        let specs = apply_overrides(default_resources(), &overrides).unwrap();
        assert_eq!(specs.len(), default_resources().len() - 1);
        assert!(specs.iter().all(|s| s.name.as_str() != names::VIDEO_DETECTION));

        let alerts = specs.iter().find(|s| s.name.as_str() == names::FIRE_ALERTS).unwrap();
        assert_eq!(alerts.refresh_interval, Duration::from_secs(30));
        assert_eq!(alerts.fallback_policy, FallbackPolicy::LastKnownGood);
    }

    #[test]
    fn overrides_reject_bad_input() {
        let unknown = BTreeMap::from([("radar".to_owned(), ResourceOverride::default())]);
        assert!(matches!(
            apply_overrides(default_resources(), &unknown),
            Err(ConfigError::Validation { .. })
        ));

        let zero = BTreeMap::from([(
            names::SENSORS.to_owned(),
            ResourceOverride {
                interval_ms: Some(0),
                ..ResourceOverride::default()
            },
        )]);
        assert!(apply_overrides(default_resources(), &zero).is_err());

        let policy = BTreeMap::from([(
            names::SENSORS.to_owned(),
            ResourceOverride {
                fallback: Some("sometimes".into()),
                ..ResourceOverride::default()
            },
        )]);
        let err = apply_overrides(default_resources(), &policy).unwrap_err();
        assert!(err.to_string().contains("sometimes"));
    }

    #[test]
    fn sync_config_from_profile() {
        let mut p = profile("https://gcs.example.org/api");
        p.timeout = Some(3);
        p.insecure = Some(true);
        let cfg = profile_to_sync_config(&p, "test-no-keyring", &Defaults::default()).unwrap();
        assert_eq!(cfg.base_url.as_str(), "https://gcs.example.org/api");
        assert_eq!(
            cfg.push_url.as_ref().map(url::Url::as_str),
            Some("wss://gcs.example.org/socket.io/?EIO=4&transport=websocket")
        );
        assert_eq!(cfg.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(cfg.request_timeout, Duration::from_secs(3));
        assert_eq!(cfg.resources.len(), default_resources().len());
        // No email configured: anonymous.
        assert!(cfg.credentials.is_none());
    }

    #[test]
    fn plaintext_password_is_last_resort() {
        let mut p = profile("http://localhost:5000/api");
        p.email = Some("pilot@skywatch.id".into());
        p.password = Some("from-file".into());
        p.password_env = Some("SKYWATCH_TEST_UNSET_PASSWORD_VAR".into());
        let creds = resolve_credentials(&p, "test-no-keyring").unwrap();
        assert_eq!(creds.email, "pilot@skywatch.id");
        // Env or keyring may shadow the file on a developer machine.
        assert!(!creds.password.expose_secret().is_empty());
    }

    #[test]
    fn bad_backend_url_is_a_validation_error() {
        let err = profile_to_sync_config(&profile("not a url"), "x", &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "backend"));
    }
}
