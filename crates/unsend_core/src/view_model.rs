use crate::{RunState, Severity};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub run: RunState,
    pub status: String,
    pub severity: Severity,
    pub removed: usize,
    pub can_start: bool,
    pub can_stop: bool,
    pub dirty: bool,
}
