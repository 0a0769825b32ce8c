use serde::{Deserialize, Serialize};

use crate::view_model::AppViewModel;

pub type RunId = u64;

const READY: &str = "Ready to remove messages.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopCause {
    User,
    ChatChanged,
    NoConversation,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Stopping,
    Stopped(StopCause),
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub severity: Severity,
}

impl Default for StatusLine {
    fn default() -> Self {
        Self {
            text: READY.to_string(),
            severity: Severity::Info,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    run: RunState,
    active_run: Option<RunId>,
    last_run_id: RunId,
    status: StatusLine,
    removed: usize,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run_state(&self) -> &RunState {
        &self.run
    }

    /// The run the engine is still working on, if any. Stays set until the
    /// engine reports the run finished, even after a terminal notification.
    pub fn active_run(&self) -> Option<RunId> {
        self.active_run
    }

    pub fn is_active(&self) -> bool {
        self.active_run.is_some()
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    pub fn removed(&self) -> usize {
        self.removed
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            run: self.run.clone(),
            status: self.status.text.clone(),
            severity: self.status.severity,
            removed: self.removed,
            can_start: !self.is_active(),
            can_stop: self.run == RunState::Running,
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn is_current(&self, run_id: RunId) -> bool {
        self.active_run == Some(run_id)
    }

    pub(crate) fn begin_run(&mut self) -> RunId {
        self.last_run_id += 1;
        self.active_run = Some(self.last_run_id);
        self.run = RunState::Running;
        self.removed = 0;
        self.dirty = true;
        self.last_run_id
    }

    pub(crate) fn set_run_state(&mut self, run: RunState) {
        if self.run != run {
            self.run = run;
            self.dirty = true;
        }
    }

    pub(crate) fn set_removed(&mut self, removed: usize) {
        if self.removed != removed {
            self.removed = removed;
            self.dirty = true;
        }
    }

    pub(crate) fn set_status(&mut self, text: impl Into<String>, severity: Severity) {
        self.status = StatusLine {
            text: text.into(),
            severity,
        };
        self.dirty = true;
    }

    pub(crate) fn end_run(&mut self) {
        self.active_run = None;
        self.dirty = true;
    }
}
