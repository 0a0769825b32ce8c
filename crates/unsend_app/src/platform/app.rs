use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use engine_logging::engine_info;
use unsend_core::{update, AppState, AppViewModel, HostEvent, Msg, RunState, StartRequest};
use unsend_engine::SimDocument;

use super::config::{instant_timings, load_engine_config, load_fixture};
use super::effects::EffectRunner;
use super::logging;
use crate::Args;

/// How long to wait for an engine event before ticking.
const TICK: Duration = Duration::from_millis(75);

pub fn run_app(args: Args) -> Result<()> {
    logging::initialize(args.log);

    let mut config = load_engine_config(args.config.as_deref())?;
    if args.instant {
        config.timings = instant_timings();
    }
    let html = load_fixture(&args.fixture)?;
    let doc = Arc::new(SimDocument::from_html(&html));
    engine_info!("Loaded fixture {:?}", args.fixture);

    let mut app = App {
        state: AppState::new(),
        runner: EffectRunner::new(doc.clone(), config),
        json: args.json,
        stop_after: args.stop_after,
        last_status: None,
    };

    app.dispatch(Msg::StartRequested(StartRequest {
        delay: args.delay,
        keyword_filters_enabled: args.keywords,
        delete_keywords: args.delete,
        ignore_keywords: args.ignore,
    }));
    if !app.state.is_active() {
        bail!("run not started: {}", app.state.status().text);
    }

    while app.state.is_active() {
        let msg = app.runner.next_msg(TICK).unwrap_or(Msg::Tick);
        app.dispatch(msg);
    }

    let retracted = doc.journal().retracted;
    if app.json {
        println!(
            "{}",
            serde_json::json!({ "removed": app.state.removed(), "retracted": retracted })
        );
    } else {
        println!("Removed {} message(s).", app.state.removed());
        for text in &retracted {
            println!("  - {text}");
        }
    }
    Ok(())
}

struct App {
    state: AppState,
    runner: EffectRunner,
    json: bool,
    stop_after: Option<usize>,
    last_status: Option<String>,
}

impl App {
    fn dispatch(&mut self, msg: Msg) {
        let event = HostEvent::for_msg(&msg);
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            self.render(&state.view(), event);
        }
        self.state = state;
        self.runner.enqueue(effects);

        let limit_reached = self
            .stop_after
            .is_some_and(|limit| self.state.removed() >= limit);
        if limit_reached && *self.state.run_state() == RunState::Running {
            engine_info!("Stop limit of {:?} reached", self.stop_after);
            self.dispatch(Msg::StopRequested);
        }
    }

    fn render(&mut self, view: &AppViewModel, event: Option<HostEvent>) {
        if self.last_status.as_deref() != Some(view.status.as_str()) {
            self.last_status = Some(view.status.clone());
            if self.json {
                self.print_event(&HostEvent::Status {
                    status: view.status.clone(),
                    severity: view.severity,
                });
            } else {
                println!("[{:?}] {}", view.severity, view.status);
            }
        }
        if let Some(event @ (HostEvent::Complete | HostEvent::Stopped { .. })) = event {
            if self.json {
                self.print_event(&event);
            }
        }
    }

    fn print_event(&self, event: &HostEvent) {
        match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(err) => eprintln!("Warning: could not encode event: {err}"),
        }
    }
}
