use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread;

use engine_logging::{engine_error, engine_info, engine_warn};

use crate::clock::StopSignal;
use crate::config::EngineConfig;
use crate::dom::{Document, NavigationObserver};
use crate::removal::RemovalLoop;
use crate::sink::{ChannelEventSink, EventSink};
use crate::types::{EngineEvent, RunId, RunOptions, StopReason};

enum EngineCommand {
    Start { run_id: RunId, options: RunOptions },
    Stop,
}

/// The run currently holding the engine, if any.
type ActiveRun = Arc<Mutex<Option<RunId>>>;

/// Releases the active run before its `Finished` reaches the host, so a start
/// sent in reaction to that event is never mistaken for a concurrent one.
struct TrackingSink {
    inner: ChannelEventSink,
    active: ActiveRun,
}

impl EventSink for TrackingSink {
    fn emit(&self, event: EngineEvent) {
        if let EngineEvent::Finished { run_id, .. } = &event {
            let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
            if *active == Some(*run_id) {
                *active = None;
            }
        }
        self.inner.emit(event);
    }
}

/// Runs removal loops on a background tokio runtime, one at a time.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new<D: Document + 'static>(
        doc: Arc<D>,
        navigation: Arc<dyn NavigationObserver>,
        config: EngineConfig,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let active: ActiveRun = Arc::new(Mutex::new(None));
        let sink = Arc::new(TrackingSink {
            inner: ChannelEventSink::new(event_tx),
            active: active.clone(),
        });
        let removal = Arc::new(RemovalLoop::new(doc, navigation, Arc::new(config), sink));

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    engine_error!("failed to start engine runtime: {}", err);
                    return;
                }
            };
            let mut signal: Option<StopSignal> = None;
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Start { run_id, options } => {
                        {
                            let mut current = active.lock().unwrap_or_else(PoisonError::into_inner);
                            if let Some(running) = *current {
                                engine_warn!(
                                    "start for run {} ignored; run {} is still active",
                                    run_id,
                                    running
                                );
                                continue;
                            }
                            *current = Some(run_id);
                        }
                        let run_signal = StopSignal::new();
                        signal = Some(run_signal.clone());
                        let removal = removal.clone();
                        runtime.spawn(async move {
                            removal.run(run_id, options, run_signal).await;
                        });
                    }
                    EngineCommand::Stop => {
                        let running = active
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .is_some();
                        match signal.as_ref() {
                            Some(signal) if running => {
                                engine_info!("stop requested");
                                signal.request(StopReason::User);
                            }
                            _ => engine_info!("stop requested while idle"),
                        }
                    }
                }
            }
        });

        Self { cmd_tx, event_rx }
    }

    /// Starts a run unless one is already active, in which case this is a no-op.
    pub fn start(&self, run_id: RunId, options: RunOptions) {
        let _ = self.cmd_tx.send(EngineCommand::Start { run_id, options });
    }

    pub fn stop(&self) {
        let _ = self.cmd_tx.send(EngineCommand::Stop);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}
