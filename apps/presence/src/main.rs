use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::{Parser, Subcommand};
use companion_ipc::{CompanionApi, IpcCompanion};
use presence_core::{Action, Controller, HostSignal, Session};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    signal::unix::{signal, SignalKind},
    sync::broadcast,
    task::JoinHandle,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod console;

use config::load_settings;
use console::{parse_command, render_state, resolve_report, ConsoleCommand, ConsoleError, HELP};

#[derive(Parser, Debug)]
#[command(name = "deck-presence", about = "Report Steam Deck games as Discord activity")]
struct Cli {
    /// TOML config file; defaults to ./presence.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Start a session and read commands from stdin.
    Run,
    /// Check once whether the Discord IPC socket is reachable.
    Probe,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;
    let companion = IpcCompanion::new(settings.companion_config());

    match cli.command.unwrap_or(Command::Run) {
        Command::Probe => {
            let connected = companion.check_connection().await?;
            println!("connected={connected}");
        }
        Command::Run => run(companion, settings.auto_start_discord).await?,
    }

    Ok(())
}

async fn run(companion: Arc<IpcCompanion>, auto_start: bool) -> Result<()> {
    let controller = Controller::new(companion.clone());
    let (host_tx, host_rx) = broadcast::channel(8);
    let session = Session::start(Arc::clone(&controller), host_rx).await;

    if auto_start {
        spawn_dispatch(&controller, Action::launch_discord());
    }

    let printer = spawn_state_printer(&controller);
    let usr1 = forward_online_signal(host_tx.clone())?;

    println!("{}", render_state(&controller.state()));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line) {
                    Ok(ConsoleCommand::Quit) => break,
                    Ok(command) => execute(&companion, &controller, &host_tx, command),
                    Err(ConsoleError::Empty) => {}
                    Err(err) => println!("error: {err}"),
                }
            }
        }
    }

    usr1.abort();
    printer.abort();
    session.end().await;
    if let Err(err) = companion.shutdown().await {
        warn!("failed to close discord pipe: {err:#}");
    }
    info!("bye");
    Ok(())
}

fn execute(
    companion: &Arc<IpcCompanion>,
    controller: &Arc<Controller>,
    host_tx: &broadcast::Sender<HostSignal>,
    command: ConsoleCommand,
) {
    match command {
        ConsoleCommand::Dispatch(action) => spawn_dispatch(controller, action),
        ConsoleCommand::Report { id, name } => {
            match resolve_report(&companion.activities(), id, name) {
                Ok(activity) => {
                    spawn_dispatch(controller, Action::change_running_app(Some(activity)))
                }
                Err(err) => println!("error: {err}"),
            }
        }
        ConsoleCommand::Track(activity) => companion.track_activity(activity),
        ConsoleCommand::Untrack(id) => {
            if companion.untrack_activity(id).is_none() {
                println!("error: activity {id} is not running");
            }
        }
        ConsoleCommand::Online => {
            let _ = host_tx.send(HostSignal::Online);
        }
        ConsoleCommand::State => println!("{}", render_state(&controller.state())),
        ConsoleCommand::Help => println!("{HELP}"),
        ConsoleCommand::Quit => {}
    }
}

/// Console dispatches run in the background so a slow connection check does
/// not block input.
fn spawn_dispatch(controller: &Arc<Controller>, action: Action) {
    let controller = Arc::clone(controller);
    tokio::spawn(async move {
        let kind = action.kind();
        if let Err(err) = controller.dispatch(action).await {
            println!("error: {err}");
            warn!("console: {kind} failed: {err:#}");
        }
    });
}

fn spawn_state_printer(controller: &Controller) -> JoinHandle<()> {
    let mut rx = controller.subscribe();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let line = render_state(&rx.borrow_and_update());
            println!("{line}");
        }
    })
}

/// SIGUSR1 stands in for the host's "online" notification.
fn forward_online_signal(host_tx: broadcast::Sender<HostSignal>) -> Result<JoinHandle<()>> {
    let mut usr1 = signal(SignalKind::user_defined1())?;
    Ok(tokio::spawn(async move {
        while usr1.recv().await.is_some() {
            let _ = host_tx.send(HostSignal::Online);
        }
    }))
}
