//! Unsend engine: finds the user's own messages in a conversation tree and
//! retracts them one at a time through the host's own UI.
mod classify;
mod clock;
mod config;
mod dom;
mod engine;
mod filter;
mod fixture;
mod identity;
mod invoke;
pub mod query;
mod removal;
mod scroll;
mod sim;
mod sink;
mod types;

pub use classify::{classify, Classification, ClassifyMode};
pub use clock::{Clock, Pause, StopSignal, TokioClock};
pub use config::{EngineConfig, Timings};
pub use dom::{
    Document, DomError, Listener, NavigationObserver, PointerKind, ScrollAlign, ScrollBehavior,
    Subscription,
};
pub use engine::EngineHandle;
pub use filter::KeywordFilter;
pub use fixture::{ConfirmShape, Conversation, MoreControl, Side, SimMessage};
pub use identity::{current_identity, thread_path, ThreadWatcher};
pub use invoke::{InvokeFailure, InvokeOutcome, InvokeReport};
pub use removal::{RemovalLoop, RunCounters, RunError};
pub use scroll::{reveal_older_content, RevealReport, RevealStrategy};
pub use sim::{SimDocument, SimJournal};
pub use sink::{ChannelEventSink, EventSink};
pub use types::{
    EngineEvent, Point, Rect, RunId, RunOptions, RunOutcome, Severity, StopReason,
};
