use crate::{AppState, Effect, Msg, RunEnd, RunState, Severity, StopCause};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::StartRequested(request) => {
            // One run at a time; a second start is answered, never queued.
            if state.is_active() {
                state.set_status("Already running.", Severity::Warning);
                return (state, Vec::new());
            }
            if request.delay_ms().is_none() {
                state.set_status("Please enter a valid delay.", Severity::Warning);
                return (state, Vec::new());
            }
            let run_id = state.begin_run();
            state.set_status("Removal started. Keep this tab open.", Severity::Info);
            vec![Effect::StartRun { run_id, request }]
        }
        Msg::StopRequested => {
            let stoppable = *state.run_state() == RunState::Running;
            match state.active_run() {
                Some(run_id) if stoppable => {
                    state.set_run_state(RunState::Stopping);
                    state.set_status(
                        "Stopping... Please wait for the current action to finish.",
                        Severity::Warning,
                    );
                    vec![Effect::StopRun { run_id }]
                }
                _ => Vec::new(),
            }
        }
        Msg::EngineStatus {
            run_id,
            message,
            severity,
        } => {
            if state.is_current(run_id) {
                state.set_status(message, severity);
            }
            Vec::new()
        }
        Msg::Progress { run_id, removed } => {
            if state.is_current(run_id) {
                state.set_removed(removed);
            }
            Vec::new()
        }
        Msg::RunCompleted { run_id, removed } => {
            if state.is_current(run_id) {
                state.set_removed(removed);
                state.set_run_state(RunState::Completed);
            }
            Vec::new()
        }
        Msg::RunStopped { run_id, cause } => {
            if state.is_current(run_id) {
                state.set_run_state(RunState::Stopped(cause));
            }
            Vec::new()
        }
        Msg::RunFinished {
            run_id,
            removed,
            end,
        } => {
            if state.is_current(run_id) {
                state.set_removed(removed);
                if matches!(state.run_state(), RunState::Running | RunState::Stopping) {
                    state.set_run_state(terminal_state(end));
                }
                state.end_run();
            }
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn terminal_state(end: RunEnd) -> RunState {
    match end {
        RunEnd::Exhausted => RunState::Completed,
        RunEnd::Stopped(cause) => RunState::Stopped(cause),
        RunEnd::Failed(message) => RunState::Stopped(StopCause::Error(message)),
    }
}
