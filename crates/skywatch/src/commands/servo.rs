//! Servo control.

use skywatch_core::Dashboard;

use crate::cli::{GlobalOpts, ServoArgs};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    dashboard: &Dashboard,
    args: ServoArgs,
    profile: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::sign_in(dashboard, profile).await?;
    let ack = dashboard
        .move_servo(args.channel, args.pwm)
        .await
        .map_err(|e| util::core_err(e, profile))?;

    let out = output::render_single(
        global.output,
        &ack,
        |a| {
            format!(
                "✓ Servo {} → {} us ({})",
                a.channel.unwrap_or(u32::from(args.channel)),
                a.pwm.unwrap_or(u32::from(args.pwm)),
                a.status.as_deref().unwrap_or("sent")
            )
        },
        |a| a.status.clone().unwrap_or_default(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
