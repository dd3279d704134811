use std::process::Command;

use anyhow::{Context, Result};
use appupdater_core::UpdateLayout;
use tracing::info;

pub(crate) fn build_relaunch_command(
    layout: &UpdateLayout,
    forward_autostart: bool,
    forward_debug: bool,
) -> Command {
    let mut command = Command::new(layout.app_executable_path());
    command.arg("-noupdate");
    if forward_autostart {
        command.arg("-autostart");
    }
    if forward_debug {
        command.arg("-debug");
    }
    command.current_dir(layout.install_root());
    command
}

/// Starts the application and returns without waiting for it.
pub(crate) fn relaunch_application(
    layout: &UpdateLayout,
    forward_autostart: bool,
    forward_debug: bool,
) -> Result<()> {
    let executable = layout.app_executable_path();
    info!(
        path = %executable.display(),
        autostart = forward_autostart,
        debug_flag = forward_debug,
        "relaunching application"
    );
    build_relaunch_command(layout, forward_autostart, forward_debug)
        .spawn()
        .with_context(|| format!("failed to relaunch {}", executable.display()))?;
    Ok(())
}
