use std::sync::Arc;

use companion_ipc::CompanionEvent;
use shared::domain::ConnectionStatus;
use tokio::{
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};
use tracing::{info, warn};

use crate::{actions::Action, controller::Controller};

/// Signals from the host environment, outside the companion event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostSignal {
    /// The host came back online or into view; events may have been missed.
    Online,
}

/// Wires a controller to its companion for as long as the session lives.
///
/// Every listener and every dispatch the session started is aborted by
/// [`Session::end`] or on drop. A connect cut short that way still leaves the
/// controller with a terminal connection status.
pub struct Session {
    controller: Arc<Controller>,
    tasks: Vec<JoinHandle<()>>,
}

impl Session {
    pub async fn start(
        controller: Arc<Controller>,
        host_signals: broadcast::Receiver<HostSignal>,
    ) -> Self {
        let mut tasks = vec![spawn_dispatch(&controller, Action::fetch_settings())];

        let events = controller.api().subscribe_events();
        tasks.push(tokio::spawn(run_companion_events(
            Arc::clone(&controller),
            events,
        )));

        sync_from_snapshot(&controller).await;
        if !controller.api().connected() {
            tasks.push(spawn_dispatch(&controller, Action::connect()));
        }

        tasks.push(tokio::spawn(run_host_signals(
            Arc::clone(&controller),
            host_signals,
        )));

        info!("session: started");
        Self { controller, tasks }
    }

    pub fn controller(&self) -> &Arc<Controller> {
        &self.controller
    }

    pub async fn end(mut self) {
        for task in &self.tasks {
            task.abort();
        }
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
        settle_connection_status(&self.controller);
        info!("session: ended");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
        settle_connection_status(&self.controller);
    }
}

/// An aborted connect leaves `Connecting` behind; replace it with what the
/// companion currently reports.
fn settle_connection_status(controller: &Controller) {
    if controller.state().connection_status.is_terminal() {
        return;
    }
    let status = ConnectionStatus::from_connected(controller.api().connected());
    controller.apply(Action::set_connection_status(status));
}

fn spawn_dispatch(controller: &Arc<Controller>, action: Action) -> JoinHandle<()> {
    let controller = Arc::clone(controller);
    tokio::spawn(async move { dispatch_logged(&controller, action).await })
}

async fn dispatch_logged(controller: &Controller, action: Action) {
    if let Err(err) = controller.dispatch(action).await {
        warn!("session: {err:#}");
    }
}

async fn sync_from_snapshot(controller: &Controller) {
    let status = ConnectionStatus::from_connected(controller.api().connected());
    dispatch_logged(controller, Action::set_connection_status(status)).await;
    sync_activities(controller).await;
}

async fn sync_activities(controller: &Controller) {
    let api = controller.api();
    dispatch_logged(controller, Action::update_apps(api.activities())).await;
    dispatch_logged(controller, Action::set_running_app(api.running_activity())).await;
}

async fn run_companion_events(
    controller: Arc<Controller>,
    mut events: broadcast::Receiver<CompanionEvent>,
) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!("session: missed {skipped} companion events, resyncing");
                sync_from_snapshot(&controller).await;
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        match event {
            CompanionEvent::Connect => {
                dispatch_logged(
                    &controller,
                    Action::set_connection_status(ConnectionStatus::Connected),
                )
                .await;
            }
            CompanionEvent::Disconnect => {
                dispatch_logged(
                    &controller,
                    Action::set_connection_status(ConnectionStatus::Disconnected),
                )
                .await;
            }
            CompanionEvent::Connecting => {
                dispatch_logged(
                    &controller,
                    Action::set_connection_status(ConnectionStatus::Connecting),
                )
                .await;
            }
            CompanionEvent::Update => sync_activities(&controller).await,
        }
    }
}

async fn run_host_signals(
    controller: Arc<Controller>,
    mut signals: broadcast::Receiver<HostSignal>,
) {
    loop {
        match signals.recv().await {
            Ok(HostSignal::Online) => {
                if let Some(activity) = controller.api().running_activity() {
                    dispatch_logged(&controller, Action::set_running_app(Some(activity))).await;
                }
            }
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
