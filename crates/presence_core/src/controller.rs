use std::sync::Arc;

use companion_ipc::CompanionApi;
use shared::domain::ConnectionStatus;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::{
    actions::{Action, ActionKind},
    reducer::{reduce, ControllerState},
};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{kind} failed: {source}")]
    Companion {
        kind: ActionKind,
        source: anyhow::Error,
    },
}

impl DispatchError {
    fn companion(kind: ActionKind) -> impl FnOnce(anyhow::Error) -> Self {
        move |source| DispatchError::Companion { kind, source }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            DispatchError::Companion { kind, .. } => *kind,
        }
    }
}

/// Owns the controller state and is the only path to the companion.
///
/// Dispatches are not serialized: two in-flight dispatches interleave at
/// their companion calls, and within one field the last to resolve wins.
pub struct Controller {
    api: Arc<dyn CompanionApi>,
    state: watch::Sender<ControllerState>,
}

impl Controller {
    pub fn new(api: Arc<dyn CompanionApi>) -> Arc<Self> {
        let (state, _) = watch::channel(ControllerState::default());
        Arc::new(Self { api, state })
    }

    pub fn api(&self) -> &Arc<dyn CompanionApi> {
        &self.api
    }

    pub fn state(&self) -> ControllerState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        self.state.subscribe()
    }

    pub async fn dispatch(&self, action: Action) -> Result<(), DispatchError> {
        let kind = action.kind();
        debug!("controller: dispatch {kind}");

        match action {
            Action::ChangeRunningApp(activity) => {
                // The new current app arrives later through a companion update.
                self.api
                    .update_activity(activity)
                    .await
                    .map_err(DispatchError::companion(kind))?;
            }
            Action::Connect => {
                self.apply(Action::set_connection_status(ConnectionStatus::Connecting));
                let checked = self.api.check_connection().await;
                let connected = matches!(checked, Ok(true));
                self.apply(Action::set_connection_status(
                    ConnectionStatus::from_connected(connected),
                ));
                info!("controller: connection check finished connected={connected}");
                checked.map_err(DispatchError::companion(kind))?;
            }
            Action::LaunchDiscord => {
                self.api
                    .launch_discord()
                    .await
                    .map_err(DispatchError::companion(kind))?;
            }
            Action::SetAutoStartDiscord(enabled) => {
                self.api
                    .set_auto_start_discord(enabled)
                    .await
                    .map_err(DispatchError::companion(kind))?;
                self.apply(Action::set_auto_start_discord(enabled));
            }
            Action::FetchSettings => {
                let enabled = self
                    .api
                    .is_auto_start_discord_enabled()
                    .await
                    .map_err(DispatchError::companion(kind))?;
                self.apply(Action::set_auto_start_discord(enabled));
            }
            action @ (Action::SetConnectionStatus(_)
            | Action::SetRunningApp(_)
            | Action::UpdateApps(_)) => self.apply(action),
        }

        Ok(())
    }

    pub(crate) fn apply(&self, action: Action) {
        self.state.send_if_modified(|state| {
            let next = reduce(state.clone(), &action);
            let changed = !next.is_identical_to(state);
            if changed {
                debug!("controller: {} -> {next:?}", action.kind());
            }
            *state = next;
            changed
        });
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
