use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use companion_ipc::CompanionConfig;
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "presence.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub client_id: String,
    pub ipc_roots: Vec<PathBuf>,
    pub probe_attempts: u32,
    pub probe_interval_ms: u64,
    pub launch_command: String,
    pub auto_start_discord: bool,
    pub activity_state: String,
    pub small_image_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        let companion = CompanionConfig::default();
        Self {
            client_id: companion.client_id,
            ipc_roots: companion.ipc_roots,
            probe_attempts: companion.probe_attempts,
            probe_interval_ms: companion.probe_interval.as_millis() as u64,
            launch_command: companion.launch_command,
            auto_start_discord: companion.auto_start_discord,
            activity_state: companion.activity_state,
            small_image_url: companion.small_image_url,
        }
    }
}

impl Settings {
    pub fn companion_config(&self) -> CompanionConfig {
        CompanionConfig {
            client_id: self.client_id.clone(),
            ipc_roots: self.ipc_roots.clone(),
            probe_attempts: self.probe_attempts,
            probe_interval: Duration::from_millis(self.probe_interval_ms),
            launch_command: self.launch_command.clone(),
            auto_start_discord: self.auto_start_discord,
            activity_state: self.activity_state.clone(),
            small_image_url: self.small_image_url.clone(),
        }
    }
}

/// Defaults, then the TOML file, then `PRESENCE__*` environment variables.
///
/// An explicit `path` must exist; the default `presence.toml` is optional.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = match path {
        Some(path) => read_settings_file(path)?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            read_settings_file(Path::new(DEFAULT_CONFIG_PATH))?
        }
        None => Settings::default(),
    };

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn read_settings_file(path: &Path) -> anyhow::Result<Settings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file '{}'", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("invalid config file '{}'", path.display()))
}

fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("PRESENCE__CLIENT_ID") {
        settings.client_id = v;
    }
    if let Some(v) = lookup("PRESENCE__IPC_ROOTS") {
        settings.ipc_roots = std::env::split_paths(&v).collect();
    }
    if let Some(v) = lookup("PRESENCE__PROBE_ATTEMPTS") {
        match v.parse() {
            Ok(parsed) => settings.probe_attempts = parsed,
            Err(_) => warn!("ignoring PRESENCE__PROBE_ATTEMPTS={v}"),
        }
    }
    if let Some(v) = lookup("PRESENCE__PROBE_INTERVAL_MS") {
        match v.parse() {
            Ok(parsed) => settings.probe_interval_ms = parsed,
            Err(_) => warn!("ignoring PRESENCE__PROBE_INTERVAL_MS={v}"),
        }
    }
    if let Some(v) = lookup("PRESENCE__LAUNCH_COMMAND") {
        settings.launch_command = v;
    }
    if let Some(v) = lookup("PRESENCE__AUTO_START_DISCORD") {
        match parse_flag(&v) {
            Some(parsed) => settings.auto_start_discord = parsed,
            None => warn!("ignoring PRESENCE__AUTO_START_DISCORD={v}"),
        }
    }
    if let Some(v) = lookup("PRESENCE__ACTIVITY_STATE") {
        settings.activity_state = v;
    }
    if let Some(v) = lookup("PRESENCE__SMALL_IMAGE_URL") {
        settings.small_image_url = v;
    }
}

pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
