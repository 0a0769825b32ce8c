use std::sync::Arc;
use std::time::Duration;

use engine_logging::{engine_info, engine_warn};
use unsend_core::{Effect, Msg, RunEnd, Severity, StartRequest, StopCause};
use unsend_engine::{
    EngineConfig, EngineEvent, EngineHandle, KeywordFilter, RunOptions, RunOutcome, SimDocument,
    StopReason,
};

/// Executes core effects against the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(doc: Arc<SimDocument>, config: EngineConfig) -> Self {
        let engine = EngineHandle::new(doc.clone(), doc, config);
        Self { engine }
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartRun { run_id, request } => {
                    engine_info!(
                        "StartRun run_id={} delay_ms={} keyword_filters={}",
                        run_id,
                        request.delay,
                        request.keyword_filters_enabled
                    );
                    self.engine.start(run_id, run_options(&request));
                }
                Effect::StopRun { run_id } => {
                    engine_info!("StopRun run_id={}", run_id);
                    self.engine.stop();
                }
            }
        }
    }

    /// Waits up to `timeout` for the next engine event.
    pub fn next_msg(&self, timeout: Duration) -> Option<Msg> {
        self.engine.recv_timeout(timeout).map(map_event)
    }
}

fn run_options(request: &StartRequest) -> RunOptions {
    RunOptions {
        delay: Duration::from_millis(request.delay_ms().unwrap_or(0)),
        keywords: KeywordFilter::new(
            request.keyword_filters_enabled,
            request.delete_list(),
            request.ignore_list(),
        ),
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Status {
            run_id,
            message,
            severity,
        } => Msg::EngineStatus {
            run_id,
            message,
            severity: map_severity(severity),
        },
        EngineEvent::Progress { run_id, removed } => Msg::Progress { run_id, removed },
        EngineEvent::Complete { run_id, removed } => Msg::RunCompleted { run_id, removed },
        EngineEvent::Stopped { run_id, reason } => Msg::RunStopped {
            run_id,
            cause: map_reason(reason),
        },
        EngineEvent::Finished {
            run_id,
            removed,
            outcome,
        } => {
            let end = match outcome {
                RunOutcome::Exhausted => RunEnd::Exhausted,
                RunOutcome::Stopped(reason) => RunEnd::Stopped(map_reason(reason)),
                RunOutcome::NoConversation => RunEnd::Stopped(StopCause::NoConversation),
                RunOutcome::Failed(message) => {
                    engine_warn!("Run {} failed: {}", run_id, message);
                    RunEnd::Failed(message)
                }
            };
            Msg::RunFinished {
                run_id,
                removed,
                end,
            }
        }
    }
}

fn map_severity(severity: unsend_engine::Severity) -> Severity {
    match severity {
        unsend_engine::Severity::Info => Severity::Info,
        unsend_engine::Severity::Warning => Severity::Warning,
        unsend_engine::Severity::Success => Severity::Success,
    }
}

fn map_reason(reason: StopReason) -> StopCause {
    match reason {
        StopReason::User => StopCause::User,
        StopReason::ChatChanged => StopCause::ChatChanged,
    }
}
