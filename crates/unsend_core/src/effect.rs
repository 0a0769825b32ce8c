use crate::{RunId, StartRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartRun { run_id: RunId, request: StartRequest },
    StopRun { run_id: RunId },
}
