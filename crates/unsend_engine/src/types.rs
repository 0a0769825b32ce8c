use std::fmt;
use std::time::Duration;

use crate::filter::KeywordFilter;

pub type RunId = u64;

/// Viewport-relative bounding box of an element, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }

    /// Zero-width or zero-height boxes never count as rendered.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left()
            && point.x < self.right()
            && point.y >= self.top()
            && point.y < self.bottom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Success,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    User,
    ChatChanged,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::User => write!(f, "stopped by user"),
            StopReason::ChatChanged => write!(f, "chat changed"),
        }
    }
}

/// How a run ended. Only `Exhausted` is a successful completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Exhausted,
    Stopped(StopReason),
    NoConversation,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Status {
        run_id: RunId,
        message: String,
        severity: Severity,
    },
    Progress {
        run_id: RunId,
        removed: usize,
    },
    Complete {
        run_id: RunId,
        removed: usize,
    },
    Stopped {
        run_id: RunId,
        reason: StopReason,
    },
    /// Always the last event of a run.
    Finished {
        run_id: RunId,
        removed: usize,
        outcome: RunOutcome,
    },
}

impl EngineEvent {
    pub fn run_id(&self) -> RunId {
        match self {
            EngineEvent::Status { run_id, .. }
            | EngineEvent::Progress { run_id, .. }
            | EngineEvent::Complete { run_id, .. }
            | EngineEvent::Stopped { run_id, .. }
            | EngineEvent::Finished { run_id, .. } => *run_id,
        }
    }
}

/// Operator-supplied parameters of a single run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub delay: Duration,
    pub keywords: KeywordFilter,
}

impl RunOptions {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            keywords: KeywordFilter::default(),
        }
    }
}
