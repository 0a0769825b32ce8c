use crate::{RunId, Severity, StartRequest, StopCause};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Operator asked to start a run.
    StartRequested(StartRequest),
    /// Operator asked to stop the active run.
    StopRequested,
    /// Status line reported by the engine.
    EngineStatus {
        run_id: RunId,
        message: String,
        severity: Severity,
    },
    /// Running total of confirmed retractions.
    Progress { run_id: RunId, removed: usize },
    /// The engine ran out of candidates.
    RunCompleted { run_id: RunId, removed: usize },
    /// The engine cancelled the run on its own (conversation changed).
    RunStopped { run_id: RunId, cause: StopCause },
    /// Last notification of every run.
    RunFinished {
        run_id: RunId,
        removed: usize,
        end: RunEnd,
    },
    /// Render tick.
    Tick,
    NoOp,
}

/// How the engine says a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEnd {
    Exhausted,
    Stopped(StopCause),
    Failed(String),
}
