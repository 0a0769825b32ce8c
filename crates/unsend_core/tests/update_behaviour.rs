use std::sync::Once;

use pretty_assertions::assert_eq;
use unsend_core::{
    update, AppState, Effect, Msg, RunEnd, RunState, Severity, StartRequest, StopCause,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn started() -> AppState {
    let (state, effects) = update(AppState::new(), Msg::StartRequested(StartRequest::with_delay(0)));
    assert_eq!(effects.len(), 1);
    state
}

#[test]
fn start_allocates_a_run_and_emits_effect() {
    init_logging();
    let request = StartRequest {
        delay: 1500,
        keyword_filters_enabled: true,
        delete_keywords: "party".to_string(),
        ignore_keywords: String::new(),
    };

    let (state, effects) = update(AppState::new(), Msg::StartRequested(request.clone()));

    assert_eq!(effects, vec![Effect::StartRun { run_id: 1, request }]);
    assert_eq!(state.run_state(), &RunState::Running);
    assert_eq!(state.active_run(), Some(1));
    let view = state.view();
    assert_eq!(view.status, "Removal started. Keep this tab open.");
    assert_eq!(view.severity, Severity::Info);
    assert!(view.can_stop);
    assert!(!view.can_start);
    assert!(view.dirty);
}

#[test]
fn second_start_is_rejected_without_effect() {
    init_logging();
    let state = started();

    let (state, effects) = update(state, Msg::StartRequested(StartRequest::with_delay(0)));

    assert!(effects.is_empty());
    assert_eq!(state.active_run(), Some(1));
    assert_eq!(state.status().text, "Already running.");
    assert_eq!(state.status().severity, Severity::Warning);
}

#[test]
fn negative_delay_is_rejected() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::StartRequested(StartRequest::with_delay(-5)));

    assert!(effects.is_empty());
    assert_eq!(state.run_state(), &RunState::Idle);
    assert_eq!(state.status().text, "Please enter a valid delay.");
}

#[test]
fn stop_moves_to_stopping_until_the_engine_finishes() {
    init_logging();
    let state = started();

    let (state, effects) = update(state, Msg::StopRequested);
    assert_eq!(effects, vec![Effect::StopRun { run_id: 1 }]);
    assert_eq!(state.run_state(), &RunState::Stopping);
    assert_eq!(
        state.status().text,
        "Stopping... Please wait for the current action to finish."
    );

    // A second stop while stopping does nothing.
    let (state, effects) = update(state, Msg::StopRequested);
    assert!(effects.is_empty());

    let (state, _) = update(
        state,
        Msg::EngineStatus {
            run_id: 1,
            message: "Stopped by user. Removed 2 message(s).".to_string(),
            severity: Severity::Warning,
        },
    );
    let (state, _) = update(
        state,
        Msg::RunFinished {
            run_id: 1,
            removed: 2,
            end: RunEnd::Stopped(StopCause::User),
        },
    );

    assert_eq!(state.run_state(), &RunState::Stopped(StopCause::User));
    assert_eq!(state.active_run(), None);
    assert_eq!(state.removed(), 2);
    assert_eq!(state.status().text, "Stopped by user. Removed 2 message(s).");
    assert!(state.view().can_start);
}

#[test]
fn completion_then_new_run() {
    init_logging();
    let state = started();
    let (state, _) = update(state, Msg::Progress { run_id: 1, removed: 1 });
    let (state, _) = update(state, Msg::RunCompleted { run_id: 1, removed: 1 });
    assert_eq!(state.run_state(), &RunState::Completed);
    // Still held until the engine's final notification.
    assert!(state.is_active());

    let (state, _) = update(
        state,
        Msg::RunFinished {
            run_id: 1,
            removed: 1,
            end: RunEnd::Exhausted,
        },
    );
    assert_eq!(state.run_state(), &RunState::Completed);
    assert!(!state.is_active());

    let (state, effects) = update(state, Msg::StartRequested(StartRequest::with_delay(0)));
    assert_eq!(
        effects,
        vec![Effect::StartRun {
            run_id: 2,
            request: StartRequest::with_delay(0),
        }]
    );
    assert_eq!(state.removed(), 0);
}

#[test]
fn chat_change_is_a_distinct_terminal_state() {
    init_logging();
    let state = started();
    let (state, _) = update(
        state,
        Msg::RunStopped {
            run_id: 1,
            cause: StopCause::ChatChanged,
        },
    );
    let (state, _) = update(
        state,
        Msg::RunFinished {
            run_id: 1,
            removed: 0,
            end: RunEnd::Stopped(StopCause::ChatChanged),
        },
    );

    assert_eq!(state.run_state(), &RunState::Stopped(StopCause::ChatChanged));
}

#[test]
fn unexpected_failure_ends_the_run() {
    init_logging();
    let state = started();
    let (state, _) = update(
        state,
        Msg::RunFinished {
            run_id: 1,
            removed: 0,
            end: RunEnd::Failed("host error: boom".to_string()),
        },
    );

    assert_eq!(
        state.run_state(),
        &RunState::Stopped(StopCause::Error("host error: boom".to_string()))
    );
    assert!(!state.is_active());
}
