//! The closed vocabulary of actions the controller understands.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use shared::domain::{Activity, ConnectionStatus};
use thiserror::Error;

pub const ACTION_CHANGE_RUNNING_APP: &str = "action:change-running-app";
pub const ACTION_CONNECT: &str = "action:connect";
pub const ACTION_SET_CONNECTION_STATUS: &str = "action:set-connection-status";
pub const ACTION_SET_RUNNING_APP: &str = "action:set-running-app";
pub const ACTION_UPDATE_APPS: &str = "action:update-apps";
pub const ACTION_LAUNCH_DISCORD: &str = "action:launch-discord";
pub const ACTION_SET_AUTO_START_DISCORD: &str = "action:set-auto-start-discord";
pub const ACTION_FETCH_SETTINGS: &str = "action:fetch-settings";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    ChangeRunningApp,
    Connect,
    SetConnectionStatus,
    SetRunningApp,
    UpdateApps,
    LaunchDiscord,
    SetAutoStartDiscord,
    FetchSettings,
}

impl ActionKind {
    pub const ALL: [ActionKind; 8] = [
        ActionKind::ChangeRunningApp,
        ActionKind::Connect,
        ActionKind::SetConnectionStatus,
        ActionKind::SetRunningApp,
        ActionKind::UpdateApps,
        ActionKind::LaunchDiscord,
        ActionKind::SetAutoStartDiscord,
        ActionKind::FetchSettings,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::ChangeRunningApp => ACTION_CHANGE_RUNNING_APP,
            ActionKind::Connect => ACTION_CONNECT,
            ActionKind::SetConnectionStatus => ACTION_SET_CONNECTION_STATUS,
            ActionKind::SetRunningApp => ACTION_SET_RUNNING_APP,
            ActionKind::UpdateApps => ACTION_UPDATE_APPS,
            ActionKind::LaunchDiscord => ACTION_LAUNCH_DISCORD,
            ActionKind::SetAutoStartDiscord => ACTION_SET_AUTO_START_DISCORD,
            ActionKind::FetchSettings => ACTION_FETCH_SETTINGS,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown action kind '{0}'")]
pub struct UnknownActionKind(pub String);

impl FromStr for ActionKind {
    type Err = UnknownActionKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownActionKind(s.to_string()))
    }
}

/// An action as submitted to [`crate::Controller::dispatch`].
///
/// Serialized as `{"type": "<kind>", "payload": ...}`; payload-free kinds
/// omit `payload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Action {
    #[serde(rename = "action:change-running-app")]
    ChangeRunningApp(Option<Activity>),
    #[serde(rename = "action:connect")]
    Connect,
    #[serde(rename = "action:set-connection-status")]
    SetConnectionStatus(ConnectionStatus),
    #[serde(rename = "action:set-running-app")]
    SetRunningApp(Option<Activity>),
    #[serde(rename = "action:update-apps")]
    UpdateApps(Vec<Activity>),
    #[serde(rename = "action:launch-discord")]
    LaunchDiscord,
    #[serde(rename = "action:set-auto-start-discord")]
    SetAutoStartDiscord(bool),
    #[serde(rename = "action:fetch-settings")]
    FetchSettings,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::ChangeRunningApp(_) => ActionKind::ChangeRunningApp,
            Action::Connect => ActionKind::Connect,
            Action::SetConnectionStatus(_) => ActionKind::SetConnectionStatus,
            Action::SetRunningApp(_) => ActionKind::SetRunningApp,
            Action::UpdateApps(_) => ActionKind::UpdateApps,
            Action::LaunchDiscord => ActionKind::LaunchDiscord,
            Action::SetAutoStartDiscord(_) => ActionKind::SetAutoStartDiscord,
            Action::FetchSettings => ActionKind::FetchSettings,
        }
    }

    pub fn connect() -> Self {
        Action::Connect
    }

    pub fn launch_discord() -> Self {
        Action::LaunchDiscord
    }

    pub fn fetch_settings() -> Self {
        Action::FetchSettings
    }

    pub fn change_running_app(activity: Option<Activity>) -> Self {
        Action::ChangeRunningApp(activity)
    }

    pub fn set_connection_status(status: ConnectionStatus) -> Self {
        Action::SetConnectionStatus(status)
    }

    pub fn set_running_app(activity: Option<Activity>) -> Self {
        Action::SetRunningApp(activity)
    }

    pub fn update_apps(activities: Vec<Activity>) -> Self {
        Action::UpdateApps(activities)
    }

    pub fn set_auto_start_discord(enabled: bool) -> Self {
        Action::SetAutoStartDiscord(enabled)
    }
}

/// Factory for a payload-free kind, `None` when the kind needs a payload.
pub fn create_action(kind: ActionKind) -> Option<fn() -> Action> {
    match kind {
        ActionKind::Connect => Some(Action::connect),
        ActionKind::LaunchDiscord => Some(Action::launch_discord),
        ActionKind::FetchSettings => Some(Action::fetch_settings),
        ActionKind::ChangeRunningApp
        | ActionKind::SetConnectionStatus
        | ActionKind::SetRunningApp
        | ActionKind::UpdateApps
        | ActionKind::SetAutoStartDiscord => None,
    }
}
