//! Unsend core: pure run-state machine and view-model helpers.
mod command;
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use command::{parse_keywords, HostCommand, HostEvent, StartRequest};
pub use effect::Effect;
pub use msg::{Msg, RunEnd};
pub use state::{AppState, RunId, RunState, Severity, StatusLine, StopCause};
pub use update::update;
pub use view_model::AppViewModel;
