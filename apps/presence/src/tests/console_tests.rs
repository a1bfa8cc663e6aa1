use super::*;

#[test]
fn payload_free_commands_map_to_actions() {
    assert_eq!(
        parse_command("connect"),
        Ok(ConsoleCommand::Dispatch(Action::connect()))
    );
    assert_eq!(
        parse_command("  launch "),
        Ok(ConsoleCommand::Dispatch(Action::launch_discord()))
    );
    assert_eq!(
        parse_command("settings"),
        Ok(ConsoleCommand::Dispatch(Action::fetch_settings()))
    );
    assert_eq!(
        parse_command("clear"),
        Ok(ConsoleCommand::Dispatch(Action::change_running_app(None)))
    );
    assert_eq!(parse_command("exit"), Ok(ConsoleCommand::Quit));
    assert_eq!(parse_command(""), Err(ConsoleError::Empty));
}

#[test]
fn auto_start_requires_a_flag() {
    assert_eq!(
        parse_command("auto-start on"),
        Ok(ConsoleCommand::Dispatch(Action::set_auto_start_discord(
            true
        )))
    );
    assert_eq!(
        parse_command("auto-start"),
        Err(ConsoleError::MissingArgument {
            command: "auto-start",
            argument: "on|off",
        })
    );
    assert!(matches!(
        parse_command("auto-start sometimes"),
        Err(ConsoleError::InvalidArgument { .. })
    ));
}

#[test]
fn track_and_report_parse_ids_and_multi_word_names() {
    assert_eq!(
        parse_command("track 620 Portal 2"),
        Ok(ConsoleCommand::Track(Activity::new(ActivityId(620), "Portal 2")))
    );
    assert_eq!(
        parse_command("report 620"),
        Ok(ConsoleCommand::Report {
            id: ActivityId(620),
            name: None,
        })
    );
    assert_eq!(
        parse_command("untrack 620"),
        Ok(ConsoleCommand::Untrack(ActivityId(620)))
    );
    assert!(matches!(
        parse_command("track 620"),
        Err(ConsoleError::MissingArgument { .. })
    ));
    assert!(matches!(
        parse_command("report portal"),
        Err(ConsoleError::InvalidArgument { .. })
    ));
}

#[test]
fn json_lines_are_dispatched_verbatim() {
    assert_eq!(
        parse_command(r#"{"type": "action:set-connection-status", "payload": "connecting"}"#),
        Ok(ConsoleCommand::Dispatch(Action::set_connection_status(
            ConnectionStatus::Connecting
        )))
    );
    assert!(matches!(
        parse_command(r#"{"type": "action:reboot"}"#),
        Err(ConsoleError::InvalidAction(_))
    ));
}

#[test]
fn unknown_words_are_rejected() {
    assert_eq!(
        parse_command("dance"),
        Err(ConsoleError::UnknownCommand("dance".to_string()))
    );
}

#[test]
fn report_prefers_the_running_entry() {
    let running = vec![Activity::new(ActivityId(1), "Celeste").with_image_url("celeste.png")];

    let known = resolve_report(&running, ActivityId(1), None).expect("known");
    assert_eq!(known.image_url.as_deref(), Some("celeste.png"));

    let fresh = resolve_report(&running, ActivityId(2), Some("Hades".into())).expect("named");
    assert_eq!(fresh.name, "Hades");

    assert_eq!(
        resolve_report(&running, ActivityId(3), None),
        Err(ConsoleError::UnknownActivity(ActivityId(3)))
    );
}

#[test]
fn renders_a_one_line_summary() {
    let hades = Activity::new(ActivityId(5), "Hades");
    let state = ControllerState {
        connection_status: ConnectionStatus::Connected,
        current_app: Some(hades.clone()),
        running_apps: vec![Activity::new(ActivityId(4), "Celeste"), hades],
        is_auto_start_enabled: true,
    };
    assert_eq!(
        render_state(&state),
        "status=connected auto_start=on current=Hades (5) running=[4 Celeste, 5 Hades]"
    );
    assert_eq!(
        render_state(&ControllerState::default()),
        "status=disconnected auto_start=off current=<none> running=[]"
    );
}

#[test]
fn bare_action_tags_dispatch_payload_free_kinds() {
    assert_eq!(
        parse_command("action:fetch-settings"),
        Ok(ConsoleCommand::Dispatch(Action::fetch_settings()))
    );
    assert_eq!(
        parse_command("action:update-apps"),
        Err(ConsoleError::PayloadRequired(ActionKind::UpdateApps))
    );
    assert_eq!(
        parse_command("action:reboot"),
        Err(ConsoleError::UnknownAction(UnknownActionKind(
            "action:reboot".to_string()
        )))
    );
}

#[test]
fn help_describes_the_auto_start_flag_as_in_memory() {
    assert!(HELP.contains("auto-start on|off        set the auto-start flag"));
    assert!(!HELP.contains("persist"));
    assert!(HELP.contains("action:<kind>"));
}
