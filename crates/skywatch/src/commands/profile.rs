//! Operator profile handlers.

use skywatch_core::panel::MISSING;
use skywatch_core::{Dashboard, ProfileUpdate, UserProfile};

use crate::cli::{GlobalOpts, ProfileArgs, ProfileCommand};
use crate::error::CliError;
use crate::output;

use super::util;

fn profile_detail(p: &UserProfile) -> String {
    let field = |v: &Option<String>| v.clone().unwrap_or_else(|| MISSING.into());
    [
        ("Name", field(&p.name)),
        ("Email", field(&p.email)),
        ("Phone", field(&p.phone)),
        ("Role", field(&p.role)),
        ("Department", field(&p.department)),
    ]
    .iter()
    .map(|(label, value)| format!("{label:<11} {value}"))
    .collect::<Vec<_>>()
    .join("\n")
}

pub async fn handle(
    dashboard: &Dashboard,
    args: ProfileArgs,
    profile: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::require_sign_in(dashboard, profile).await?;

    let user = match args.command {
        ProfileCommand::Show => dashboard.profile().await,
        ProfileCommand::Update {
            name,
            email,
            phone,
            role,
            department,
        } => {
            let update = ProfileUpdate {
                name,
                email,
                phone,
                role,
                department,
            };
            let updated = dashboard.update_profile(&update).await;
            if updated.is_ok() {
                output::note(global, "✓ Profile updated");
            }
            updated
        }
    }
    .map_err(|e| util::core_err(e, profile))?;

    let out = output::render_single(global.output, &user, profile_detail, |p| {
        p.email.clone().unwrap_or_default()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
