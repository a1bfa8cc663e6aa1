use serde::Serialize;
use shared::domain::{Activity, ConnectionStatus};

use crate::actions::Action;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ControllerState {
    pub connection_status: ConnectionStatus,
    pub current_app: Option<Activity>,
    pub running_apps: Vec<Activity>,
    pub is_auto_start_enabled: bool,
}

impl ControllerState {
    /// Whether the reported app is one of the running apps. Nothing enforces
    /// this; companion updates can report an app that is not listed.
    pub fn current_app_is_listed(&self) -> bool {
        match &self.current_app {
            Some(current) => self.running_apps.contains(current),
            None => true,
        }
    }

    /// Compares every field of every activity, not just ids.
    pub fn is_identical_to(&self, other: &Self) -> bool {
        fn same_app(a: &Option<Activity>, b: &Option<Activity>) -> bool {
            match (a, b) {
                (Some(a), Some(b)) => a.is_identical_to(b),
                (None, None) => true,
                _ => false,
            }
        }

        self.connection_status == other.connection_status
            && self.is_auto_start_enabled == other.is_auto_start_enabled
            && same_app(&self.current_app, &other.current_app)
            && self.running_apps.len() == other.running_apps.len()
            && self
                .running_apps
                .iter()
                .zip(&other.running_apps)
                .all(|(a, b)| a.is_identical_to(b))
    }
}

/// Pure state transition. Kinds that only carry side effects return `state`
/// untouched.
pub fn reduce(state: ControllerState, action: &Action) -> ControllerState {
    match action {
        Action::SetConnectionStatus(status) => ControllerState {
            connection_status: *status,
            ..state
        },
        Action::SetRunningApp(activity) => ControllerState {
            current_app: activity.clone(),
            ..state
        },
        Action::UpdateApps(activities) => ControllerState {
            running_apps: activities.clone(),
            ..state
        },
        Action::SetAutoStartDiscord(enabled) => ControllerState {
            is_auto_start_enabled: *enabled,
            ..state
        },
        Action::Connect
        | Action::LaunchDiscord
        | Action::ChangeRunningApp(_)
        | Action::FetchSettings => state,
    }
}
