use shared::domain::{Activity, ActivityId};
use tokio::sync::broadcast;

use super::*;
use crate::{
    mock::{controller_for, wait_for_state, wait_until, MockCompanion},
    ControllerState,
};

fn activity(id: i64, name: &str) -> Activity {
    Activity::new(ActivityId(id), name)
}

async fn start(mock: &Arc<MockCompanion>) -> (Session, broadcast::Sender<HostSignal>) {
    let (host_tx, host_rx) = broadcast::channel(4);
    let session = Session::start(controller_for(mock), host_rx).await;
    (session, host_tx)
}

async fn settle(session: &Session) -> ControllerState {
    wait_for_state(session.controller(), |s| {
        s.connection_status != ConnectionStatus::Connecting
    })
    .await
}

#[tokio::test]
async fn disconnected_start_connects_and_adopts_the_snapshot() {
    let mock = MockCompanion::new();
    mock.set_connected(false);
    mock.set_check_result(true);
    mock.set_auto_start(true);
    let (a, b) = (activity(1, "A"), activity(2, "B"));
    mock.set_activities(vec![a.clone(), b.clone()]);
    mock.set_running(Some(b.clone()));

    let (session, _host) = start(&mock).await;
    let state = wait_for_state(session.controller(), |s| {
        s.connection_status == ConnectionStatus::Connected && s.is_auto_start_enabled
    })
    .await;

    assert_eq!(state.running_apps, vec![a, b.clone()]);
    assert_eq!(state.current_app, Some(b));
    assert_eq!(mock.count("check_connection"), 1);
    assert_eq!(mock.count("set_auto_start_discord"), 0);
    session.end().await;
}

#[tokio::test]
async fn connected_start_does_not_attempt_a_connection() {
    let mock = MockCompanion::new();
    mock.set_auto_start(true);

    let (session, _host) = start(&mock).await;
    let state = wait_for_state(session.controller(), |s| s.is_auto_start_enabled).await;

    assert_eq!(state.connection_status, ConnectionStatus::Connected);
    assert_eq!(mock.count("check_connection"), 0);
    session.end().await;
}

#[tokio::test]
async fn connection_events_map_to_statuses() {
    let mock = MockCompanion::new();
    let (session, _host) = start(&mock).await;
    let controller = session.controller();

    mock.emit(CompanionEvent::Disconnect);
    wait_for_state(controller, |s| {
        s.connection_status == ConnectionStatus::Disconnected
    })
    .await;
    mock.emit(CompanionEvent::Connecting);
    wait_for_state(controller, |s| {
        s.connection_status == ConnectionStatus::Connecting
    })
    .await;
    mock.emit(CompanionEvent::Connect);
    wait_for_state(controller, |s| {
        s.connection_status == ConnectionStatus::Connected
    })
    .await;
    session.end().await;
}

#[tokio::test]
async fn update_event_replaces_apps_in_order_then_current_app() {
    let mock = MockCompanion::new();
    let (session, _host) = start(&mock).await;
    settle(&session).await;

    let (a, b) = (activity(10, "A"), activity(20, "B"));
    mock.set_activities(vec![a.clone(), b.clone()]);
    mock.set_running(Some(b.clone()));
    mock.emit(CompanionEvent::Update);

    let state = wait_for_state(session.controller(), |s| s.current_app.is_some()).await;
    assert_eq!(state.running_apps, vec![a, b.clone()]);
    assert_eq!(state.current_app, Some(b));
    session.end().await;
}

#[tokio::test]
async fn changed_app_only_shows_up_after_the_update_event() {
    let mock = MockCompanion::new();
    let x = activity(42, "X");
    mock.set_activities(vec![x.clone()]);
    let (session, _host) = start(&mock).await;
    let controller = Arc::clone(session.controller());
    settle(&session).await;

    controller
        .dispatch(Action::change_running_app(Some(x.clone())))
        .await
        .expect("dispatch");
    assert_eq!(controller.state().current_app, None);
    assert_eq!(mock.reported(), vec![Some(x.clone())]);

    mock.report(Some(x.clone()));
    let state = wait_for_state(&controller, |s| s.current_app.is_some()).await;
    assert_eq!(state.current_app, Some(x));
    session.end().await;
}

#[tokio::test]
async fn online_signal_resyncs_the_running_app() {
    let mock = MockCompanion::new();
    let (session, host) = start(&mock).await;
    settle(&session).await;

    host.send(HostSignal::Online).expect("signal");
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
    assert_eq!(session.controller().state().current_app, None);

    let missed = activity(7, "Missed");
    mock.set_running(Some(missed.clone()));
    host.send(HostSignal::Online).expect("signal");

    let state = wait_for_state(session.controller(), |s| s.current_app.is_some()).await;
    assert_eq!(state.current_app, Some(missed));
    session.end().await;
}

#[tokio::test]
async fn ended_session_releases_listeners_and_stops_dispatching() {
    let mock = MockCompanion::new();
    let (session, _host) = start(&mock).await;
    let controller = Arc::clone(session.controller());
    settle(&session).await;
    assert_eq!(mock.listener_count(), 1);

    session.end().await;
    assert_eq!(mock.listener_count(), 0);

    mock.emit(CompanionEvent::Disconnect);
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
    assert_eq!(
        controller.state().connection_status,
        ConnectionStatus::Connected
    );
}

#[tokio::test]
async fn failed_initial_connect_is_logged_not_fatal() {
    let mock = MockCompanion::new();
    mock.set_connected(false);
    let release = mock.gate_connection_check();
    let (session, _host) = start(&mock).await;

    wait_until(|| mock.count("check_connection") == 1).await;
    release
        .send(Err(anyhow::anyhow!("no ipc socket")))
        .expect("release");

    let state = wait_for_state(session.controller(), |s| {
        s.connection_status == ConnectionStatus::Disconnected
    })
    .await;
    assert_eq!(state.connection_status, ConnectionStatus::Disconnected);

    mock.emit(CompanionEvent::Connect);
    wait_for_state(session.controller(), |s| {
        s.connection_status == ConnectionStatus::Connected
    })
    .await;
    session.end().await;
}

#[tokio::test]
async fn lagging_behind_companion_events_resyncs_from_the_snapshot() {
    let mock = MockCompanion::new();
    let (session, _host) = start(&mock).await;
    settle(&session).await;

    // Only the snapshot carries the new status; no Disconnect event is sent.
    let fresh = activity(3, "Fresh");
    mock.set_connected(false);
    mock.set_activities(vec![fresh.clone()]);
    for _ in 0..40 {
        mock.emit(CompanionEvent::Update);
    }

    let state = wait_for_state(session.controller(), |s| {
        s.connection_status == ConnectionStatus::Disconnected
    })
    .await;
    assert_eq!(state.running_apps, vec![fresh]);
    session.end().await;
}

#[tokio::test]
async fn ending_during_the_initial_connect_leaves_a_terminal_status() {
    let mock = MockCompanion::new();
    mock.set_connected(false);
    let release = mock.gate_connection_check();
    let (session, _host) = start(&mock).await;
    let controller = Arc::clone(session.controller());

    wait_until(|| mock.count("check_connection") == 1).await;
    assert_eq!(
        controller.state().connection_status,
        ConnectionStatus::Connecting
    );

    session.end().await;
    assert_eq!(
        controller.state().connection_status,
        ConnectionStatus::Disconnected
    );
    drop(release);
}
