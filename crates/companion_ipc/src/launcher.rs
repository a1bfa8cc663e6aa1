use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::{IpcError, FALLBACK_RUNTIME_DIR};

/// Environment the flatpak Discord client needs when launched from the
/// game-mode session.
pub const FLATPAK_ENV: [(&str, &str); 5] = [
    ("XDG_RUNTIME_DIR", FALLBACK_RUNTIME_DIR),
    ("DBUS_SESSION_BUS_ADDRESS", "unix:path=/run/user/1000/bus"),
    ("XDG_SESSION_TYPE", "wayland"),
    ("WAYLAND_DISPLAY", "wayland-0"),
    ("DISPLAY", ":0"),
];

pub fn build_command(command_line: &str) -> Result<Command, IpcError> {
    let mut parts = command_line.split_whitespace();
    let program = parts.next().ok_or(IpcError::EmptyLaunchCommand)?;

    let mut command = Command::new(program);
    command
        .args(parts)
        .env_remove("LD_LIBRARY_PATH")
        .envs(FLATPAK_ENV)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null());
    Ok(command)
}

/// Starts Discord and returns its pid. The child is reaped by a background
/// task so it never lingers as a zombie.
pub fn spawn_discord(command_line: &str) -> Result<Option<u32>, IpcError> {
    let mut child = build_command(command_line)?.spawn()?;
    let pid = child.id();
    info!("launched discord pid={pid:?}");
    tokio::spawn(async move {
        match child.wait().await {
            Ok(status) => debug!("discord pid={pid:?} exited with {status}"),
            Err(err) => warn!("failed to wait for discord pid={pid:?}: {err}"),
        }
    });
    Ok(pid)
}
