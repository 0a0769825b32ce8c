use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use engine_logging::engine_trace;
use tokio_util::sync::CancellationToken;

use crate::config::Timings;
use crate::types::StopReason;

/// Named suspension points of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pause {
    Initial,
    ScanSettle,
    Reveal,
    PostHover,
    PostMenuOpen,
    PostMenuItem,
    ConfirmPoll,
    Dismiss,
    AfterScroll,
    PostRemoval,
    InterRemoval,
}

#[async_trait::async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait::async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Shared stop flag of one run. The first recorded reason wins.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    token: CancellationToken,
    reason: Arc<Mutex<Option<StopReason>>>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when a stop had already been requested.
    pub fn request(&self, reason: StopReason) -> bool {
        let mut guard = self.reason.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.is_some() {
            return false;
        }
        *guard = Some(reason);
        self.token.cancel();
        true
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn reason(&self) -> Option<StopReason> {
        *self.reason.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}

/// Cancellable waits for the removal loop and the action invoker.
pub(crate) struct Pacer<'a> {
    clock: &'a dyn Clock,
    timings: &'a Timings,
    delay: Duration,
    signal: &'a StopSignal,
}

impl<'a> Pacer<'a> {
    pub(crate) fn new(
        clock: &'a dyn Clock,
        timings: &'a Timings,
        delay: Duration,
        signal: &'a StopSignal,
    ) -> Self {
        Self {
            clock,
            timings,
            delay,
            signal,
        }
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.signal.is_stopped()
    }

    /// Waits out `pause`. Returns `false` if the run was stopped before or during the wait.
    pub(crate) async fn pause(&self, pause: Pause) -> bool {
        if self.signal.is_stopped() {
            return false;
        }
        let duration = self.timings.duration(pause, self.delay);
        engine_trace!("pause {:?} for {:?}", pause, duration);
        tokio::select! {
            _ = self.clock.sleep(duration) => {}
            _ = self.signal.cancelled() => {}
        }
        !self.signal.is_stopped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_stop_reason_wins() {
        let signal = StopSignal::new();
        assert!(signal.request(StopReason::ChatChanged));
        assert!(!signal.request(StopReason::User));
        assert!(signal.is_stopped());
        assert_eq!(signal.reason(), Some(StopReason::ChatChanged));
    }

    #[tokio::test(start_paused = true)]
    async fn pause_returns_early_when_cancelled() {
        let signal = StopSignal::new();
        let timings = Timings::default();
        let clock = TokioClock;
        let pacer = Pacer::new(&clock, &timings, Duration::from_secs(3600), &signal);

        let stopper = signal.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            stopper.request(StopReason::User);
        });

        let start = tokio::time::Instant::now();
        assert!(!pacer.pause(Pause::InterRemoval).await);
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
