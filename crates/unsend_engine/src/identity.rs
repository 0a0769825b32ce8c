//! Thread identity: which conversation is open, and cancellation when it changes.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use engine_logging::{engine_debug, engine_warn};
use url::Url;

use crate::clock::StopSignal;
use crate::dom::{Document, Listener, NavigationObserver, Subscription};
use crate::query;
use crate::sink::EventSink;
use crate::types::{EngineEvent, RunId, Severity, StopReason};

/// Identity of the open conversation, derived from the location or, failing
/// that, from a thread link in the conversation header.
pub fn current_identity<D: Document>(doc: &D, root: D::Node) -> Option<String> {
    if let Some(id) = thread_path(&doc.location_path()) {
        return Some(id);
    }
    query::union_all(doc, root, query::THREAD_LINK_SELECTORS)
        .into_iter()
        .filter_map(|link| doc.attr(link, "href"))
        .find_map(|href| thread_path(&href))
}

/// Extracts `/t/<id>` (keeping an `/e2ee` prefix) from a path or URL.
pub fn thread_path(location: &str) -> Option<String> {
    let url = Url::parse(location)
        .or_else(|_| Url::parse("https://host.invalid/").and_then(|base| base.join(location)))
        .ok()?;
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    let pos = segments.iter().position(|s| *s == "t")?;
    let id = segments.get(pos + 1)?;
    let prefix = if pos > 0 && segments[pos - 1] == "e2ee" {
        "/e2ee"
    } else {
        ""
    };
    Some(format!("{prefix}/t/{id}"))
}

struct WatchState<D: Document> {
    doc: Weak<D>,
    root: D::Node,
    baseline: Mutex<Option<String>>,
    run_id: RunId,
    signal: StopSignal,
    sink: Arc<dyn EventSink>,
}

impl<D: Document> WatchState<D> {
    fn check(&self) {
        if self.signal.is_stopped() {
            return;
        }
        let Some(doc) = self.doc.upgrade() else {
            return;
        };
        let Some(current) = current_identity(doc.as_ref(), self.root) else {
            return;
        };
        let mut baseline = self.baseline.lock().unwrap_or_else(PoisonError::into_inner);
        match baseline.as_deref() {
            None => {
                engine_debug!("thread identity resolved to {}", current);
                *baseline = Some(current);
            }
            Some(fixed) if fixed == current => {}
            Some(fixed) => {
                let fixed = fixed.to_string();
                drop(baseline);
                if self.signal.request(StopReason::ChatChanged) {
                    engine_warn!("conversation changed from {} to {}; stopping", fixed, current);
                    self.sink.emit(EngineEvent::Status {
                        run_id: self.run_id,
                        message: "Stopped: chat changed".to_string(),
                        severity: Severity::Warning,
                    });
                    self.sink.emit(EngineEvent::Stopped {
                        run_id: self.run_id,
                        reason: StopReason::ChatChanged,
                    });
                }
            }
        }
    }
}

/// Watches for the open conversation changing while a run is active.
///
/// Holds at most one mutation observer and one navigation subscription;
/// `start` replaces any previous pair.
pub struct ThreadWatcher<D: Document> {
    doc: Arc<D>,
    navigation: Arc<dyn NavigationObserver>,
    run_id: RunId,
    signal: StopSignal,
    sink: Arc<dyn EventSink>,
    mutations: Option<Subscription>,
    nav: Option<Subscription>,
}

impl<D: Document + 'static> ThreadWatcher<D> {
    pub fn new(
        doc: Arc<D>,
        navigation: Arc<dyn NavigationObserver>,
        run_id: RunId,
        signal: StopSignal,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            doc,
            navigation,
            run_id,
            signal,
            sink,
            mutations: None,
            nav: None,
        }
    }

    /// Captures the current identity and installs the observers.
    pub fn start(&mut self, root: D::Node) -> Option<String> {
        self.stop();
        let baseline = current_identity(self.doc.as_ref(), root);
        let state = Arc::new(WatchState {
            doc: Arc::downgrade(&self.doc),
            root,
            baseline: Mutex::new(baseline.clone()),
            run_id: self.run_id,
            signal: self.signal.clone(),
            sink: self.sink.clone(),
        });

        let on_mutation = state.clone();
        let listener: Listener = Arc::new(move || on_mutation.check());
        self.mutations = Some(self.doc.observe_mutations(root, listener));

        let listener: Listener = Arc::new(move || state.check());
        self.nav = Some(self.navigation.subscribe(listener));
        baseline
    }

    pub fn stop(&mut self) {
        self.mutations = None;
        self.nav = None;
    }
}
