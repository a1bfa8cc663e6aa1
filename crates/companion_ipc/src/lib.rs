//! Contract with the Discord companion process and its local IPC implementation.

use std::{path::PathBuf, time::Duration};

use async_trait::async_trait;
use shared::domain::Activity;
use tokio::sync::broadcast;

mod client;
pub mod error;
pub mod launcher;
pub mod pipe;

#[cfg(test)]
#[path = "tests/support.rs"]
mod tests_support;

pub use client::IpcCompanion;
pub use error::IpcError;

pub const DEFAULT_CLIENT_ID: &str = "1055680235682672682";
pub const DEFAULT_ACTIVITY_STATE: &str = "on Steam Deck";
pub const DEFAULT_SMALL_IMAGE_URL: &str =
    "https://cdn.discordapp.com/app-assets/1055680235682672682/1056080943783354388.png";
pub const DEFAULT_LAUNCH_COMMAND: &str = "flatpak run com.discordapp.Discord --start-minimized";
pub const FLATPAK_IPC_ROOT: &str = "/run/user/1000/app/com.discordapp.Discord";
pub const FALLBACK_RUNTIME_DIR: &str = "/run/user/1000";

/// Connection lifecycle and activity notifications published by a companion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanionEvent {
    Connect,
    Disconnect,
    Connecting,
    /// The activity list or the reported activity changed; read the
    /// snapshots for the new values.
    Update,
}

#[async_trait]
pub trait CompanionApi: Send + Sync {
    async fn check_connection(&self) -> anyhow::Result<bool>;
    async fn launch_discord(&self) -> anyhow::Result<()>;
    async fn update_activity(&self, activity: Option<Activity>) -> anyhow::Result<()>;
    async fn set_auto_start_discord(&self, enabled: bool) -> anyhow::Result<()>;
    async fn is_auto_start_discord_enabled(&self) -> anyhow::Result<bool>;
    fn connected(&self) -> bool;
    fn running_activity(&self) -> Option<Activity>;
    /// Known activities, in the order the companion first saw them.
    fn activities(&self) -> Vec<Activity>;
    /// Dropping the receiver ends the subscription.
    fn subscribe_events(&self) -> broadcast::Receiver<CompanionEvent>;
}

#[derive(Debug, Clone)]
pub struct CompanionConfig {
    pub client_id: String,
    /// Directories searched for `discord-ipc-N` sockets, in priority order.
    pub ipc_roots: Vec<PathBuf>,
    pub probe_attempts: u32,
    pub probe_interval: Duration,
    pub launch_command: String,
    pub auto_start_discord: bool,
    pub activity_state: String,
    pub small_image_url: String,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            client_id: DEFAULT_CLIENT_ID.into(),
            ipc_roots: default_ipc_roots(),
            probe_attempts: 5,
            probe_interval: Duration::from_secs(5),
            launch_command: DEFAULT_LAUNCH_COMMAND.into(),
            auto_start_discord: false,
            activity_state: DEFAULT_ACTIVITY_STATE.into(),
            small_image_url: DEFAULT_SMALL_IMAGE_URL.into(),
        }
    }
}

pub fn default_ipc_roots() -> Vec<PathBuf> {
    let runtime_dir =
        std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| FALLBACK_RUNTIME_DIR.to_string());
    vec![PathBuf::from(FLATPAK_IPC_ROOT), PathBuf::from(runtime_dir)]
}
