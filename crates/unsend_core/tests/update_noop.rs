use unsend_core::{update, AppState, Msg, RunEnd, Severity, StopCause};

#[test]
fn tick_and_noop_change_nothing() {
    let state = AppState::new();
    let (next, effects) = update(state.clone(), Msg::Tick);
    assert_eq!(next, state);
    assert!(effects.is_empty());

    let (next, effects) = update(state.clone(), Msg::NoOp);
    assert_eq!(next, state);
    assert!(effects.is_empty());
}

#[test]
fn stop_while_idle_is_ignored() {
    let state = AppState::new();
    let (next, effects) = update(state.clone(), Msg::StopRequested);
    assert_eq!(next, state);
    assert!(effects.is_empty());
    assert_eq!(next.status().text, "Ready to remove messages.");
}

#[test]
fn notifications_for_unknown_runs_are_ignored() {
    let state = AppState::new();
    let msgs = vec![
        Msg::EngineStatus {
            run_id: 9,
            message: "Removed 1 message(s)...".to_string(),
            severity: Severity::Info,
        },
        Msg::Progress { run_id: 9, removed: 1 },
        Msg::RunCompleted { run_id: 9, removed: 1 },
        Msg::RunStopped {
            run_id: 9,
            cause: StopCause::ChatChanged,
        },
        Msg::RunFinished {
            run_id: 9,
            removed: 1,
            end: RunEnd::Exhausted,
        },
    ];
    for msg in msgs {
        let (next, effects) = update(state.clone(), msg);
        assert_eq!(next, state);
        assert!(effects.is_empty());
    }
}

#[test]
fn dirty_flag_is_consumed_once() {
    let (mut state, _) = update(
        AppState::new(),
        Msg::StartRequested(unsend_core::StartRequest::with_delay(0)),
    );
    assert!(state.consume_dirty());
    assert!(!state.consume_dirty());
}
