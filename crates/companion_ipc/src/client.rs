use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use shared::{
    domain::{Activity, ActivityId},
    protocol::{
        set_activity_command, ActivityAssets, ActivityPayload, ActivityTimestamps, IpcCommand,
    },
};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    launcher,
    pipe::{locate_ipc_socket, IpcPipe},
    CompanionApi, CompanionConfig, CompanionEvent, IpcError,
};

#[derive(Default)]
struct ActivityRegistry {
    activities: Vec<Activity>,
    running: Option<Activity>,
}

/// Companion backed by the Discord desktop client's local IPC socket.
pub struct IpcCompanion {
    config: CompanionConfig,
    pipe: Mutex<Option<IpcPipe>>,
    registry: RwLock<ActivityRegistry>,
    connected: AtomicBool,
    auto_start: AtomicBool,
    events: broadcast::Sender<CompanionEvent>,
}

impl IpcCompanion {
    pub fn new(config: CompanionConfig) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        let auto_start = AtomicBool::new(config.auto_start_discord);
        Arc::new(Self {
            config,
            pipe: Mutex::new(None),
            registry: RwLock::new(ActivityRegistry::default()),
            connected: AtomicBool::new(false),
            auto_start,
            events,
        })
    }

    pub async fn shutdown(&self) -> Result<()> {
        let pipe = self.pipe.lock().await.take();
        if let Some(pipe) = pipe {
            pipe.close().await.context("failed to close ipc pipe")?;
        }
        Ok(())
    }

    /// Adds or replaces an activity in the known list.
    pub fn track_activity(&self, activity: Activity) {
        {
            let mut registry = self.registry.write();
            match registry
                .activities
                .iter_mut()
                .find(|known| known.id == activity.id)
            {
                Some(known) => *known = activity,
                None => registry.activities.push(activity),
            }
        }
        self.emit(CompanionEvent::Update);
    }

    pub fn untrack_activity(&self, id: ActivityId) -> Option<Activity> {
        let removed = {
            let mut registry = self.registry.write();
            let index = registry.activities.iter().position(|known| known.id == id)?;
            registry.activities.remove(index)
        };
        self.emit(CompanionEvent::Update);
        Some(removed)
    }

    fn emit(&self, event: CompanionEvent) {
        let _ = self.events.send(event);
    }

    fn socket_present(&self) -> bool {
        locate_ipc_socket(&self.config.ipc_roots).is_some()
    }

    async fn probe(&self) -> Result<bool> {
        info!("companion: checking connection status");
        self.emit(CompanionEvent::Connecting);

        let attempts = self.config.probe_attempts.max(1);
        let mut connected = false;
        for attempt in 1..=attempts {
            connected = self.socket_present();
            if connected {
                break;
            }
            if attempt < attempts {
                warn!(
                    "companion: no ipc socket, retrying in {:?} ({attempt}/{attempts})",
                    self.config.probe_interval
                );
                tokio::time::sleep(self.config.probe_interval).await;
            }
        }

        self.connected.store(connected, Ordering::SeqCst);
        self.emit(if connected {
            CompanionEvent::Connect
        } else {
            CompanionEvent::Disconnect
        });
        Ok(connected)
    }

    fn activity_payload(&self, activity: &Activity) -> ActivityPayload {
        ActivityPayload {
            state: self.config.activity_state.clone(),
            details: activity
                .discord_app_id
                .is_none()
                .then(|| format!("Playing {}", activity.name)),
            assets: ActivityAssets {
                large_image: activity.image_url.clone(),
                small_image: self.config.small_image_url.clone(),
            },
            timestamps: activity
                .start_time
                .map(|start| ActivityTimestamps { start }),
        }
    }

    async fn report(&self, activity: Activity) -> Result<()> {
        let client_id = activity
            .discord_app_id
            .clone()
            .unwrap_or_else(|| self.config.client_id.clone());
        info!(
            "companion: updating activity {} ({client_id})",
            activity.name
        );

        let path = locate_ipc_socket(&self.config.ipc_roots).ok_or(IpcError::SocketNotFound)?;
        let command = set_activity_command(
            std::process::id(),
            Some(self.activity_payload(&activity)),
            Uuid::new_v4().to_string(),
        );

        let mut slot = self.pipe.lock().await;
        if let Some(previous) = slot.take() {
            if let Err(err) = previous.close().await {
                warn!("companion: failed to close previous pipe: {err}");
            }
        }

        // Closing the previous pipe already cleared whatever Discord showed.
        let opened = open_reporting_pipe(&path, client_id, &command).await;
        let result = match opened {
            Ok(pipe) => {
                *slot = Some(pipe);
                self.registry.write().running = Some(activity);
                Ok(())
            }
            Err(err) => {
                self.registry.write().running = None;
                Err(err.into())
            }
        };
        drop(slot);

        self.emit(CompanionEvent::Update);
        result
    }

    async fn clear(&self) -> Result<()> {
        let pipe = self.pipe.lock().await.take();
        if let Some(mut pipe) = pipe {
            info!("companion: clearing activity");
            let command = set_activity_command(std::process::id(), None, Uuid::new_v4().to_string());
            pipe.request(&command).await?;
            pipe.close().await?;
        }

        self.registry.write().running = None;
        self.emit(CompanionEvent::Update);
        Ok(())
    }
}

async fn open_reporting_pipe<A: Serialize>(
    path: &Path,
    client_id: String,
    command: &IpcCommand<A>,
) -> Result<IpcPipe, IpcError> {
    let mut pipe = IpcPipe::connect(path, client_id).await?;
    pipe.handshake().await?;
    pipe.request(command).await?;
    Ok(pipe)
}

#[async_trait]
impl CompanionApi for IpcCompanion {
    async fn check_connection(&self) -> Result<bool> {
        self.probe().await
    }

    async fn launch_discord(&self) -> Result<()> {
        info!("companion: launching discord");
        launcher::spawn_discord(&self.config.launch_command)
            .with_context(|| format!("failed to run '{}'", self.config.launch_command))?;
        if !self.probe().await? {
            warn!("companion: discord launched but no ipc socket appeared");
        }
        Ok(())
    }

    async fn update_activity(&self, activity: Option<Activity>) -> Result<()> {
        match activity {
            Some(activity) => self.report(activity).await,
            None => self.clear().await,
        }
    }

    async fn set_auto_start_discord(&self, enabled: bool) -> Result<()> {
        info!("companion: auto_start_discord={enabled}");
        self.auto_start.store(enabled, Ordering::SeqCst);
        Ok(())
    }

    async fn is_auto_start_discord_enabled(&self) -> Result<bool> {
        Ok(self.auto_start.load(Ordering::SeqCst))
    }

    fn connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn running_activity(&self) -> Option<Activity> {
        self.registry.read().running.clone()
    }

    fn activities(&self) -> Vec<Activity> {
        self.registry.read().activities.clone()
    }

    fn subscribe_events(&self) -> broadcast::Receiver<CompanionEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/client_tests.rs"]
mod tests;
