//! The removal loop: scan, act, adjust the viewport, repeat.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

use engine_logging::{engine_debug, engine_info, engine_warn};
use thiserror::Error;

use crate::classify::{self, ClassifyMode};
use crate::clock::{Clock, Pacer, Pause, StopSignal, TokioClock};
use crate::config::EngineConfig;
use crate::dom::{Document, DomError, NavigationObserver};
use crate::identity::ThreadWatcher;
use crate::invoke::{ActionInvoker, InvokeOutcome};
use crate::query;
use crate::scroll;
use crate::sink::EventSink;
use crate::types::{EngineEvent, Rect, RunId, RunOptions, RunOutcome, Severity, StopReason};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("no conversation open")]
    NoConversation,
    #[error(transparent)]
    Dom(#[from] DomError),
}

/// Candidates known to be unremovable for the rest of one run.
///
/// Membership is by node identity and only ever grows.
#[derive(Debug, Clone)]
pub(crate) struct SkipSet<N> {
    members: HashSet<N>,
}

impl<N: Copy + Eq + Hash> SkipSet<N> {
    pub(crate) fn new() -> Self {
        Self {
            members: HashSet::new(),
        }
    }

    pub(crate) fn insert(&mut self, node: N) -> bool {
        self.members.insert(node)
    }

    pub(crate) fn contains(&self, node: &N) -> bool {
        self.members.contains(node)
    }

    pub(crate) fn len(&self) -> usize {
        self.members.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub attempts: u32,
    pub no_progress: u32,
    pub no_more_content_streak: u32,
    pub same_count_streak: u32,
    pub removed: usize,
    last_raw_count: Option<usize>,
}

impl RunCounters {
    fn observe_raw_count(&mut self, count: usize) {
        if self.last_raw_count == Some(count) {
            self.same_count_streak += 1;
        } else {
            self.same_count_streak = 0;
        }
        self.last_raw_count = Some(count);
    }
}

/// Everything scoped to one run; dropped when the run ends.
struct RunContext<N> {
    run_id: RunId,
    counters: RunCounters,
    skip: SkipSet<N>,
    /// The region currently believed to hold the history; replaced when a reveal escalates.
    region: Option<N>,
    topmost: Option<N>,
    mode: Option<ClassifyMode>,
}

enum Scan<N> {
    Empty,
    Target { node: N, fallback: bool },
}

enum Finish {
    Exhausted,
    Cancelled,
}

pub struct RemovalLoop<D: Document> {
    doc: Arc<D>,
    navigation: Arc<dyn NavigationObserver>,
    config: Arc<EngineConfig>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
}

impl<D: Document + 'static> RemovalLoop<D> {
    pub fn new(
        doc: Arc<D>,
        navigation: Arc<dyn NavigationObserver>,
        config: Arc<EngineConfig>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            doc,
            navigation,
            config,
            clock: Arc::new(TokioClock),
            sink,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Runs until candidates are exhausted, the run is stopped, or an unexpected error.
    /// Always ends with an [`EngineEvent::Finished`].
    pub async fn run(&self, run_id: RunId, options: RunOptions, signal: StopSignal) -> RunOutcome {
        engine_logging::set_run_id(run_id);
        engine_info!("run started (delay {:?}, keyword filter {})", options.delay, options.keywords.is_enabled());
        self.status(run_id, "Starting...", Severity::Info);

        let pacer = Pacer::new(
            self.clock.as_ref(),
            &self.config.timings,
            options.delay,
            &signal,
        );
        let mut watcher = ThreadWatcher::new(
            self.doc.clone(),
            self.navigation.clone(),
            run_id,
            signal.clone(),
            self.sink.clone(),
        );
        let mut ctx = RunContext {
            run_id,
            counters: RunCounters::default(),
            skip: SkipSet::new(),
            region: None,
            topmost: None,
            mode: None,
        };

        let result = self.drive(&mut ctx, &options, &pacer, &mut watcher).await;
        watcher.stop();

        let removed = ctx.counters.removed;
        let outcome = match result {
            Ok(Finish::Exhausted) => RunOutcome::Exhausted,
            Ok(Finish::Cancelled) => RunOutcome::Stopped(signal.reason().unwrap_or(StopReason::User)),
            Err(RunError::NoConversation) => RunOutcome::NoConversation,
            Err(RunError::Dom(err)) => RunOutcome::Failed(err.to_string()),
        };

        match &outcome {
            RunOutcome::Exhausted => {
                self.status(
                    run_id,
                    &format!("Complete! Removed {removed} message(s)."),
                    Severity::Success,
                );
                self.sink.emit(EngineEvent::Complete { run_id, removed });
            }
            RunOutcome::Stopped(StopReason::User) => {
                self.status(
                    run_id,
                    &format!("Stopped by user. Removed {removed} message(s)."),
                    Severity::Warning,
                );
            }
            // The watcher has already reported the change.
            RunOutcome::Stopped(StopReason::ChatChanged) => {}
            RunOutcome::NoConversation => {
                self.status(run_id, "No conversation open", Severity::Warning);
            }
            RunOutcome::Failed(message) => {
                engine_warn!("run aborted: {}", message);
                self.status(run_id, &format!("Error: {message}"), Severity::Warning);
            }
        }

        engine_info!(
            "run finished: {:?}, removed {}, attempts {}, skipped {}",
            outcome,
            removed,
            ctx.counters.attempts,
            ctx.skip.len()
        );
        self.sink.emit(EngineEvent::Finished {
            run_id,
            removed,
            outcome: outcome.clone(),
        });
        engine_logging::set_run_id(0);
        outcome
    }

    async fn drive(
        &self,
        ctx: &mut RunContext<D::Node>,
        options: &RunOptions,
        pacer: &Pacer<'_>,
        watcher: &mut ThreadWatcher<D>,
    ) -> Result<Finish, RunError> {
        let doc = self.doc.as_ref();
        let root = query::find_conversation_root(doc).ok_or(RunError::NoConversation)?;
        let identity = watcher.start(root);
        engine_info!("conversation identity {:?}", identity);

        let region = query::find_scrollable_region(doc, root);
        doc.set_scroll_top(region, doc.scroll_height(region))?;
        ctx.region = Some(region);
        if !pacer.pause(Pause::Initial).await {
            return Ok(Finish::Cancelled);
        }

        loop {
            if pacer.is_stopped() || !pacer.pause(Pause::ScanSettle).await {
                return Ok(Finish::Cancelled);
            }
            ctx.counters.attempts += 1;

            match self.scan(ctx, root, options) {
                Scan::Empty => {
                    ctx.counters.no_progress += 1;
                    let region = self.region(ctx, root);
                    let height_before = doc.scroll_height(region);
                    self.reveal(ctx, root)?;
                    if !pacer.pause(Pause::AfterScroll).await {
                        return Ok(Finish::Cancelled);
                    }

                    let region = self.region(ctx, root);
                    let at_top = doc.scroll_top(region) <= 0.5;
                    let grew = doc.scroll_height(region) > height_before + 0.5;
                    if at_top && !grew {
                        ctx.counters.no_more_content_streak += 1;
                    } else {
                        ctx.counters.no_more_content_streak = 0;
                    }
                    engine_debug!(
                        "no candidates (no progress {}, end of history {}/{})",
                        ctx.counters.no_progress,
                        ctx.counters.no_more_content_streak,
                        self.config.exhaustion_streak
                    );
                    if ctx.counters.no_more_content_streak >= self.config.exhaustion_streak {
                        return Ok(Finish::Exhausted);
                    }
                }
                Scan::Target { node, fallback } => {
                    ctx.counters.no_progress = 0;
                    ctx.counters.no_more_content_streak = 0;
                    if pacer.is_stopped() {
                        return Ok(Finish::Cancelled);
                    }

                    let invoker = ActionInvoker::new(doc, &self.config, pacer);
                    let report = invoker.invoke(node, fallback).await?;
                    match report.outcome {
                        InvokeOutcome::Removed => {
                            ctx.counters.removed += 1;
                            let removed = ctx.counters.removed;
                            self.status(
                                ctx.run_id,
                                &format!("Removed {removed} message(s)..."),
                                Severity::Info,
                            );
                            self.sink.emit(EngineEvent::Progress {
                                run_id: ctx.run_id,
                                removed,
                            });
                            if !pacer.pause(Pause::InterRemoval).await {
                                return Ok(Finish::Cancelled);
                            }
                        }
                        InvokeOutcome::Failed(failure) => {
                            engine_debug!("skipping {:?}: {:?}", node, failure);
                            ctx.skip.insert(node);
                        }
                        InvokeOutcome::Interrupted => return Ok(Finish::Cancelled),
                    }

                    self.adjust_after_action(ctx, root, report.target_rect)?;
                    if !pacer.pause(Pause::PostRemoval).await {
                        return Ok(Finish::Cancelled);
                    }
                }
            }
        }
    }

    fn scan(&self, ctx: &mut RunContext<D::Node>, root: D::Node, options: &RunOptions) -> Scan<D::Node> {
        let doc = self.doc.as_ref();
        let raw = query::find_message_elements(doc, root);
        ctx.counters.observe_raw_count(raw.len());
        ctx.topmost = raw.first().copied();

        let region = self.region(ctx, root);
        let pane = doc.rect(region).or_else(|| doc.rect(root)).unwrap_or_default();
        let classification = classify::classify(doc, pane, &raw, &self.config);
        if !raw.is_empty() && ctx.mode != Some(classification.mode) {
            engine_info!("classifying by {:?}", classification.mode);
            if classification.is_fallback() {
                self.status(
                    ctx.run_id,
                    "Could not tell which messages are yours; trying every message.",
                    Severity::Warning,
                );
            }
            ctx.mode = Some(classification.mode);
        }
        let fallback = classification.is_fallback();

        let candidates: Vec<_> = classification
            .own
            .into_iter()
            .filter(|node| !ctx.skip.contains(node))
            .filter(|node| options.keywords.allows(&doc.text(*node)))
            .collect();
        engine_debug!(
            "scan {}: {} raw, {} candidates, {} skipped",
            ctx.counters.attempts,
            raw.len(),
            candidates.len(),
            ctx.skip.len()
        );

        let target = if fallback {
            candidates.first().copied()
        } else {
            candidates
                .iter()
                .copied()
                .filter_map(|node| doc.rect(node).map(|r| (node, r.bottom())))
                .max_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(node, _)| node)
        };
        match target {
            Some(node) => Scan::Target { node, fallback },
            None => Scan::Empty,
        }
    }

    fn region(&self, ctx: &RunContext<D::Node>, root: D::Node) -> D::Node {
        ctx.region.unwrap_or(root)
    }

    fn reveal(&self, ctx: &mut RunContext<D::Node>, root: D::Node) -> Result<(), DomError> {
        let doc = self.doc.as_ref();
        let region = self.region(ctx, root);
        let report =
            scroll::reveal_older_content(doc, region, self.config.scroll_step_px, ctx.topmost)?;
        if report.region != region {
            engine_info!("scroll target replaced: {:?} -> {:?}", region, report.region);
        }
        ctx.region = Some(report.region);
        Ok(())
    }

    /// Keeps walking from newest toward oldest without skipping unseen candidates.
    fn adjust_after_action(
        &self,
        ctx: &mut RunContext<D::Node>,
        root: D::Node,
        target_rect: Option<Rect>,
    ) -> Result<(), DomError> {
        let doc = self.doc.as_ref();
        if ctx.counters.same_count_streak >= self.config.stuck_streak {
            engine_info!(
                "candidate set unchanged for {} scans; forcing reveal",
                ctx.counters.same_count_streak
            );
            ctx.counters.same_count_streak = 0;
            return self.reveal(ctx, root);
        }

        let region = self.region(ctx, root);
        let pane_top = doc.rect(region).map(|r| r.top()).unwrap_or(0.0);
        let near_top = target_rect
            .map(|r| r.top() - pane_top < self.config.near_top_px)
            .unwrap_or(true);
        let top = doc.scroll_top(region);
        if near_top || top <= self.config.nudge_px {
            return self.reveal(ctx, root);
        }
        doc.set_scroll_top(region, (top - self.config.nudge_px).max(0.0))?;
        Ok(())
    }

    fn status(&self, run_id: RunId, message: &str, severity: Severity) {
        self.sink.emit(EngineEvent::Status {
            run_id,
            message: message.to_string(),
            severity,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;
    use crate::fixture::Conversation;
    use crate::sim::SimDocument;
    use crate::sink::ChannelEventSink;

    #[test]
    fn repeated_raw_count_builds_a_streak() {
        let mut counters = RunCounters::default();
        for _ in 0..4 {
            counters.observe_raw_count(7);
        }
        assert_eq!(counters.same_count_streak, 3);

        counters.observe_raw_count(6);
        assert_eq!(counters.same_count_streak, 0);
    }

    #[test]
    fn stuck_streak_forces_a_full_reveal_and_resets() {
        let mut conversation = Conversation::new();
        for i in 0..30 {
            conversation = conversation.other(&format!("m{i}"));
        }
        let doc = Arc::new(conversation.build());
        let (tx, _rx) = mpsc::channel();
        let removal = RemovalLoop::new(
            doc.clone(),
            doc.clone(),
            Arc::new(EngineConfig::default()),
            Arc::new(ChannelEventSink::new(tx)),
        );
        let root = query::find_conversation_root(doc.as_ref()).unwrap();
        let region = query::find_scrollable_region(doc.as_ref(), root);
        doc.set_scroll_top(region, doc.scroll_height(region)).unwrap();
        let bottom = doc.scroll_top(region);
        assert_eq!(bottom, 1160.0);

        let mut ctx = RunContext {
            run_id: 1,
            counters: RunCounters {
                same_count_streak: 3,
                ..RunCounters::default()
            },
            skip: SkipSet::new(),
            region: Some(region),
            topmost: None,
            mode: None,
        };
        let well_below_top = Some(Rect::new(920.0, 600.0, 220.0, 40.0));

        removal.adjust_after_action(&mut ctx, root, well_below_top).unwrap();
        assert_eq!(ctx.counters.same_count_streak, 0);
        assert_eq!(doc.scroll_top(region), bottom - 1000.0);

        // Streak cleared: the next adjustment is the ordinary small nudge.
        removal.adjust_after_action(&mut ctx, root, well_below_top).unwrap();
        assert_eq!(doc.scroll_top(region), bottom - 1100.0);
    }
}
