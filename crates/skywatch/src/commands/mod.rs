//! Command dispatch: bridges CLI args -> dashboard -> output formatting.

pub mod alerts;
pub mod config_cmd;
pub mod frames;
pub mod log;
pub mod login;
pub mod panels;
pub mod profile;
pub mod servo;
pub mod status;
pub mod util;
pub mod watch;

use skywatch_core::Dashboard;
use skywatch_core::panel::{SENSOR_PANEL, TELEMETRY_PANEL};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    dashboard: &Dashboard,
    profile: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Login(args) => login::handle(dashboard, args, profile, global).await,
        Command::Watch(args) => watch::handle(dashboard, args, profile, global).await,
        Command::Status => status::handle(dashboard, profile, global).await,
        Command::Telemetry => panels::handle(dashboard, &TELEMETRY_PANEL, profile, global).await,
        Command::Sensors => panels::handle(dashboard, &SENSOR_PANEL, profile, global).await,
        Command::Alerts(args) => alerts::handle(dashboard, args, profile, global).await,
        Command::Frames => frames::handle(dashboard, profile, global).await,
        Command::Log(args) => log::handle(dashboard, args, profile, global).await,
        Command::Profile(args) => profile::handle(dashboard, args, profile, global).await,
        Command::Servo(args) => servo::handle(dashboard, args, profile, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
