//! Line-oriented commands for driving a presence session from a terminal.

use presence_core::{create_action, Action, ActionKind, ControllerState, UnknownActionKind};
use shared::domain::{Activity, ActivityId, ConnectionStatus};
use thiserror::Error;

use crate::config::parse_flag;

pub const HELP: &str = "\
commands:
  connect                  check the Discord connection
  launch                   start the Discord client
  settings                 reload the auto-start flag
  auto-start on|off        set the auto-start flag
  track <id> <name>        add a running app
  untrack <id>             remove a running app
  report <id> [name]       report an app as your activity
  clear                    clear the reported activity
  online                   resync the reported app
  state                    print the current state
  action:<kind>            dispatch a payload-free action by tag
  {\"type\": ...}            dispatch a raw JSON action
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Dispatch(Action),
    Report { id: ActivityId, name: Option<String> },
    Track(Activity),
    Untrack(ActivityId),
    Online,
    State,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}' (try 'help')")]
    UnknownCommand(String),
    #[error("{command} needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    #[error("invalid {argument} '{value}'")]
    InvalidArgument {
        argument: &'static str,
        value: String,
    },
    #[error("invalid action: {0}")]
    InvalidAction(String),
    #[error(transparent)]
    UnknownAction(#[from] UnknownActionKind),
    #[error("{0} needs a payload; send it as JSON")]
    PayloadRequired(ActionKind),
    #[error("activity {0} is not running; give it a name")]
    UnknownActivity(ActivityId),
}

pub fn parse_command(line: &str) -> Result<ConsoleCommand, ConsoleError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ConsoleError::Empty);
    }
    if line.starts_with('{') {
        return serde_json::from_str(line)
            .map(ConsoleCommand::Dispatch)
            .map_err(|err| ConsoleError::InvalidAction(err.to_string()));
    }

    if line.starts_with("action:") {
        return action_by_tag(line);
    }

    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command {
        "connect" => Ok(ConsoleCommand::Dispatch(Action::connect())),
        "launch" => Ok(ConsoleCommand::Dispatch(Action::launch_discord())),
        "settings" => Ok(ConsoleCommand::Dispatch(Action::fetch_settings())),
        "clear" => Ok(ConsoleCommand::Dispatch(Action::change_running_app(None))),
        "auto-start" => {
            let value = required(rest, "auto-start", "on|off")?;
            let enabled = parse_flag(value).ok_or_else(|| ConsoleError::InvalidArgument {
                argument: "flag",
                value: value.to_string(),
            })?;
            Ok(ConsoleCommand::Dispatch(Action::set_auto_start_discord(
                enabled,
            )))
        }
        "track" => {
            let (id, name) = id_and_name(rest, "track")?;
            let name = name.ok_or(ConsoleError::MissingArgument {
                command: "track",
                argument: "a name",
            })?;
            Ok(ConsoleCommand::Track(Activity::new(id, name)))
        }
        "untrack" => {
            let (id, _) = id_and_name(rest, "untrack")?;
            Ok(ConsoleCommand::Untrack(id))
        }
        "report" => {
            let (id, name) = id_and_name(rest, "report")?;
            Ok(ConsoleCommand::Report { id, name })
        }
        "online" => Ok(ConsoleCommand::Online),
        "state" => Ok(ConsoleCommand::State),
        "help" | "?" => Ok(ConsoleCommand::Help),
        "quit" | "exit" => Ok(ConsoleCommand::Quit),
        other => Err(ConsoleError::UnknownCommand(other.to_string())),
    }
}

fn action_by_tag(tag: &str) -> Result<ConsoleCommand, ConsoleError> {
    let kind: ActionKind = tag.parse()?;
    create_action(kind)
        .map(|factory| ConsoleCommand::Dispatch(factory()))
        .ok_or(ConsoleError::PayloadRequired(kind))
}

fn required<'a>(
    rest: &'a str,
    command: &'static str,
    argument: &'static str,
) -> Result<&'a str, ConsoleError> {
    if rest.is_empty() {
        return Err(ConsoleError::MissingArgument { command, argument });
    }
    Ok(rest)
}

fn id_and_name(
    rest: &str,
    command: &'static str,
) -> Result<(ActivityId, Option<String>), ConsoleError> {
    let rest = required(rest, command, "an app id")?;
    let (raw_id, name) = match rest.split_once(char::is_whitespace) {
        Some((raw_id, name)) => (raw_id, Some(name.trim().to_string())),
        None => (rest, None),
    };
    let id = raw_id
        .parse()
        .map(ActivityId)
        .map_err(|_| ConsoleError::InvalidArgument {
            argument: "app id",
            value: raw_id.to_string(),
        })?;
    Ok((id, name.filter(|name| !name.is_empty())))
}

/// Picks the running app with `id`, falling back to a fresh activity when a
/// name is given.
pub fn resolve_report(
    running: &[Activity],
    id: ActivityId,
    name: Option<String>,
) -> Result<Activity, ConsoleError> {
    if let Some(known) = running.iter().find(|activity| activity.id == id) {
        return Ok(known.clone());
    }
    name.map(|name| Activity::new(id, name))
        .ok_or(ConsoleError::UnknownActivity(id))
}

pub fn render_state(state: &ControllerState) -> String {
    let status = match state.connection_status {
        ConnectionStatus::Disconnected => "disconnected",
        ConnectionStatus::Connecting => "connecting",
        ConnectionStatus::Connected => "connected",
    };
    let current = state
        .current_app
        .as_ref()
        .map(|app| format!("{} ({})", app.name, app.id))
        .unwrap_or_else(|| "<none>".to_string());
    let running = state
        .running_apps
        .iter()
        .map(|app| format!("{} {}", app.id, app.name))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "status={status} auto_start={} current={current} running=[{running}]",
        if state.is_auto_start_enabled { "on" } else { "off" },
    )
}

#[cfg(test)]
#[path = "tests/console_tests.rs"]
mod tests;
