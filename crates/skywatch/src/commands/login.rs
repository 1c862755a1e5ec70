//! Login handler.

use std::io::IsTerminal;

use dialoguer::Input;
use secrecy::SecretString;

use skywatch_core::{Dashboard, Identity};

use crate::cli::{GlobalOpts, LoginArgs};
use crate::error::CliError;
use crate::output;

use super::util;

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Configured credentials, or ask on an interactive terminal.
fn credentials(dashboard: &Dashboard, profile: &str, global: &GlobalOpts) -> Result<(String, SecretString), CliError> {
    if let Some(creds) = dashboard.config().credentials.clone() {
        return Ok((creds.email, creds.password));
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NoCredentials {
            profile: profile.into(),
        });
    }

    let email = match global.email.clone() {
        Some(email) => email,
        None => Input::new().with_prompt("Email").interact_text().map_err(prompt_err)?,
    };
    let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
    if email.is_empty() || password.is_empty() {
        return Err(CliError::Validation {
            field: "credentials".into(),
            reason: "email and password cannot be empty".into(),
        });
    }
    Ok((email, SecretString::from(password)))
}

fn identity_detail(identity: &Identity) -> String {
    let name = identity.name.as_deref().or(identity.email.as_deref()).unwrap_or("operator");
    match identity.role.as_deref() {
        Some(role) => format!("Logged in as {name} ({role})"),
        None => format!("Logged in as {name}"),
    }
}

pub async fn handle(
    dashboard: &Dashboard,
    args: LoginArgs,
    profile: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (email, password) = credentials(dashboard, profile, global)?;
    let identity = dashboard
        .login(&email, &password)
        .await
        .map_err(|e| util::core_err(e, profile))?;

    if args.store {
        skywatch_config::store_password(profile, &password)?;
        output::note(global, &format!("✓ Password stored in system keyring for profile '{profile}'"));
    }

    let out = output::render_single(
        global.output,
        &identity,
        identity_detail,
        |i| i.email.clone().unwrap_or_default(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
