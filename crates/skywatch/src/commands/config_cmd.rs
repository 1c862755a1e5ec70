//! Config subcommand handlers.

use dialoguer::{Input, Select};
use secrecy::SecretString;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn parse_url(field: &str, value: &str) -> Result<(), CliError> {
    value.parse::<url::Url>().map(|_| ()).map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("invalid URL: {value}"),
    })
}

/// Apply `key = value` to a profile.
fn set_key(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "backend" => {
            parse_url("backend", &value)?;
            profile.backend = value;
        }
        "push_url" | "push-url" => {
            parse_url("push_url", &value)?;
            profile.push_url = Some(value);
        }
        "email" => profile.email = Some(value),
        "password_env" | "password-env" => profile.password_env = Some(value),
        "insecure" => {
            profile.insecure = Some(value.parse().map_err(|_| CliError::Validation {
                field: "insecure".into(),
                reason: "must be 'true' or 'false'".into(),
            })?);
        }
        "timeout" => {
            profile.timeout = Some(value.parse().map_err(|_| CliError::Validation {
                field: "timeout".into(),
                reason: "must be a number (seconds)".into(),
            })?);
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: backend, push_url, \
                     email, password_env, insecure, timeout"
                ),
            });
        }
    }
    Ok(())
}

fn read_password() -> Result<SecretString, CliError> {
    let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    Ok(SecretString::from(password))
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("Skywatch CLI configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let backend: String = Input::new()
                .with_prompt("Backend URL")
                .default("http://localhost:5000/api".into())
                .interact_text()
                .map_err(prompt_err)?;
            parse_url("backend", &backend)?;

            let email: String = Input::new()
                .with_prompt("Login email (empty for anonymous)")
                .allow_empty(true)
                .interact_text()
                .map_err(prompt_err)?;

            let mut password = None;
            if !email.is_empty() {
                let secret = read_password()?;
                let store_choices = &["Store in system keyring (recommended)", "Save to config file (plaintext)"];
                let store_selection = Select::new()
                    .with_prompt("Where to store the password?")
                    .items(store_choices)
                    .default(0)
                    .interact()
                    .map_err(prompt_err)?;

                if store_selection == 0 {
                    skywatch_config::store_password(&profile_name, &secret)?;
                    eprintln!("   ✓ Password stored in system keyring");
                } else {
                    use secrecy::ExposeSecret;
                    password = Some(secret.expose_secret().to_owned());
                }
            }

            let profile = Profile {
                backend,
                email: (!email.is_empty()).then_some(email),
                password,
                ..Profile::default()
            };

            let mut cfg = config::load_config_or_default();
            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());

            let path = config::save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: skywatch status");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = output::render_single(
                global.output,
                &redacted(cfg),
                |c| toml::to_string_pretty(c).unwrap_or_else(|e| format!("{c:#?}\n({e})")),
                |c| c.profiles.keys().cloned().collect::<Vec<_>>().join("\n"),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            set_key(profile, &key, value)?;

            config::save_config(&cfg)?;
            output::note(global, &format!("✓ Set {key} on profile '{profile_name}'"));
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: skywatch config init");
            } else {
                for name in cfg.profiles.keys() {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();

            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }

            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            output::note(global, &format!("✓ Default profile set to '{name}'"));
            Ok(())
        }

        // ── SetPassword ─────────────────────────────────────────────
        ConfigCommand::SetPassword { profile } => {
            let cfg = config::load_config_or_default();
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));

            if !cfg.profiles.contains_key(&profile_name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name: profile_name,
                });
            }

            let secret = read_password()?;
            skywatch_config::store_password(&profile_name, &secret)?;
            output::note(
                global,
                &format!("✓ Password stored in system keyring for profile '{profile_name}'"),
            );
            Ok(())
        }
    }
}

/// Hide plaintext passwords before printing.
fn redacted(mut cfg: Config) -> Config {
    for profile in cfg.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some("********".into());
        }
    }
    cfg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_key_validates_values() {
        let mut profile = Profile::default();
        assert!(set_key(&mut profile, "backend", "http://gcs:5000/api".into()).is_ok());
        assert_eq!(profile.backend, "http://gcs:5000/api");

        assert!(set_key(&mut profile, "timeout", "soon".into()).is_err());
        assert!(set_key(&mut profile, "backend", "not a url".into()).is_err());
        assert!(matches!(
            set_key(&mut profile, "api_key", "x".into()),
            Err(CliError::Validation { .. })
        ));
    }

    #[test]
    fn show_never_prints_passwords() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "field".into(),
            Profile {
                password: Some("hunter2".into()),
                ..Profile::default()
            },
        );
        let shown = redacted(cfg);
        assert_eq!(shown.profiles["field"].password.as_deref(), Some("********"));
    }
}
