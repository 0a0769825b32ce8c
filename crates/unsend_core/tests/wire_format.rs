use pretty_assertions::assert_eq;
use serde_json::json;
use unsend_core::{HostCommand, HostEvent, Msg, Severity, StartRequest, StopCause};

#[test]
fn start_command_reads_camel_case_fields() {
    let raw = json!({
        "action": "start",
        "delay": 5,
        "keywordFiltersEnabled": true,
        "deleteKeywords": "party, dinner",
        "ignoreKeywords": "mom"
    });

    let command: HostCommand = serde_json::from_value(raw).unwrap();

    let HostCommand::Start(request) = command else {
        panic!("expected a start command");
    };
    assert_eq!(request.delay_ms(), Some(5));
    assert!(request.keyword_filters_enabled);
    assert_eq!(request.delete_list(), vec!["party", "dinner"]);
    assert_eq!(request.ignore_list(), vec!["mom"]);
}

#[test]
fn missing_start_fields_take_defaults() {
    let command: HostCommand = serde_json::from_value(json!({ "action": "start" })).unwrap();
    assert_eq!(command, HostCommand::Start(StartRequest::default()));

    let stop: HostCommand = serde_json::from_value(json!({ "action": "stop" })).unwrap();
    assert_eq!(stop.into_msg(), Msg::StopRequested);
}

#[test]
fn events_serialize_with_action_tag() {
    let status = HostEvent::Status {
        status: "Removed 2 message(s)...".to_string(),
        severity: Severity::Info,
    };
    assert_eq!(
        serde_json::to_value(&status).unwrap(),
        json!({ "action": "status", "status": "Removed 2 message(s)...", "type": "info" })
    );
    assert_eq!(
        serde_json::to_value(HostEvent::Complete).unwrap(),
        json!({ "action": "complete" })
    );
}

#[test]
fn engine_messages_map_to_host_events() {
    let stopped = HostEvent::for_msg(&Msg::RunStopped {
        run_id: 1,
        cause: StopCause::ChatChanged,
    });
    assert_eq!(
        stopped,
        Some(HostEvent::Stopped {
            status: "Stopped: chat changed".to_string()
        })
    );
    assert_eq!(
        HostEvent::for_msg(&Msg::RunCompleted { run_id: 1, removed: 3 }),
        Some(HostEvent::Complete)
    );
    assert_eq!(HostEvent::for_msg(&Msg::Tick), None);
}
