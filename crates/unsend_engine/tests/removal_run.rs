mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use unsend_engine::{
    Clock, ConfirmShape, Conversation, EngineConfig, EngineEvent, KeywordFilter, RemovalLoop,
    RunOptions, RunOutcome, SimDocument, SimMessage, StopReason, StopSignal, Timings,
};

use common::{harness, TestSink};

fn options() -> RunOptions {
    RunOptions::with_delay(Duration::from_millis(1000))
}

fn last_event(sink: &TestSink) -> EngineEvent {
    sink.events().last().cloned().unwrap()
}

#[tokio::test(start_paused = true)]
async fn removes_every_own_message_newest_first() {
    let h = harness(
        Conversation::new()
            .other("hi")
            .own("one")
            .other("how are you")
            .own("two")
            .other("ok")
            .own("three")
            .other("bye")
            .own("four")
            .other("see you")
            .own("five"),
    );

    let outcome = h.removal.run(1, options(), StopSignal::new()).await;

    assert_eq!(outcome, RunOutcome::Exhausted);
    let journal = h.doc.journal();
    assert_eq!(journal.retracted, vec!["five", "four", "three", "two", "one"]);
    assert_eq!(
        h.doc.message_texts(),
        vec!["hi", "how are you", "ok", "bye", "see you"]
    );
    assert_eq!(h.sink.progress(), vec![1, 2, 3, 4, 5]);

    let statuses = h.sink.statuses();
    assert_eq!(statuses.first().map(String::as_str), Some("Starting..."));
    assert!(statuses.contains(&"Removed 3 message(s)...".to_string()));
    assert_eq!(
        statuses.last().map(String::as_str),
        Some("Complete! Removed 5 message(s).")
    );
    assert!(h
        .sink
        .events()
        .contains(&EngineEvent::Complete { run_id: 1, removed: 5 }));
    assert_eq!(
        last_event(&h.sink),
        EngineEvent::Finished {
            run_id: 1,
            removed: 5,
            outcome: RunOutcome::Exhausted,
        }
    );
}

#[tokio::test(start_paused = true)]
async fn message_without_retraction_item_is_tried_once() {
    let h = harness(
        Conversation::new()
            .own("first")
            .message(SimMessage::own("forwarded").actions(&["Reply", "Forward"]))
            .own("last"),
    );

    let outcome = h.removal.run(2, options(), StopSignal::new()).await;

    assert_eq!(outcome, RunOutcome::Exhausted);
    let journal = h.doc.journal();
    assert_eq!(journal.retracted, vec!["last", "first"]);
    let attempts = journal.hovered.iter().filter(|t| *t == "forwarded").count();
    assert_eq!(attempts, 1);
    assert!(journal.escapes >= 1);
    assert_eq!(h.doc.message_texts(), vec!["forwarded"]);
    assert_eq!(
        last_event(&h.sink),
        EngineEvent::Finished {
            run_id: 2,
            removed: 2,
            outcome: RunOutcome::Exhausted,
        }
    );
}

#[tokio::test(start_paused = true)]
async fn conversation_change_stops_the_run_once() {
    let h = harness(
        Conversation::new()
            .location("/t/111")
            .own("a")
            .own("b")
            .own("c"),
    );
    h.doc.navigate_after_removals(1, "/t/222");

    let outcome = h.removal.run(3, options(), StopSignal::new()).await;

    assert_eq!(outcome, RunOutcome::Stopped(StopReason::ChatChanged));
    assert_eq!(h.sink.stops(), vec![StopReason::ChatChanged]);
    let journal = h.doc.journal();
    assert_eq!(journal.retracted, vec!["c"]);
    assert_eq!(journal.menus_opened.len(), 1);
    assert!(h
        .sink
        .statuses()
        .contains(&"Stopped: chat changed".to_string()));
    assert!(!h.sink.statuses().iter().any(|s| s.starts_with("Complete!")));
    assert_eq!(
        last_event(&h.sink),
        EngineEvent::Finished {
            run_id: 3,
            removed: 1,
            outcome: RunOutcome::Stopped(StopReason::ChatChanged),
        }
    );
    // Observers are released when the run ends.
    assert_eq!(h.doc.listener_counts(), (0, 0));
}

#[tokio::test(start_paused = true)]
async fn user_stop_interrupts_a_long_delay() {
    let h = harness(Conversation::new().own("a").own("b").own("c"));
    let h = Arc::new(h);
    let signal = StopSignal::new();

    let run = {
        let h = h.clone();
        let signal = signal.clone();
        tokio::spawn(async move {
            let options = RunOptions::with_delay(Duration::from_secs(3600));
            h.removal.run(4, options, signal).await
        })
    };

    // Long enough for the first removal; the run is now in the operator delay.
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(h.doc.journal().retracted, vec!["c"]);
    assert!(signal.request(StopReason::User));

    let outcome = tokio::time::timeout(Duration::from_secs(1), run)
        .await
        .expect("run ends promptly after stop")
        .unwrap();

    assert_eq!(outcome, RunOutcome::Stopped(StopReason::User));
    assert_eq!(h.doc.journal().menus_opened.len(), 1);
    assert_eq!(
        h.sink.statuses().last().map(String::as_str),
        Some("Stopped by user. Removed 1 message(s).")
    );
    assert_eq!(
        last_event(&h.sink),
        EngineEvent::Finished {
            run_id: 4,
            removed: 1,
            outcome: RunOutcome::Stopped(StopReason::User),
        }
    );
}

#[tokio::test(start_paused = true)]
async fn keyword_filter_limits_what_is_removed() {
    let h = harness(
        Conversation::new()
            .own("Party tonight?")
            .own("groceries list")
            .own("party at mom's"),
    );
    let options = RunOptions {
        delay: Duration::from_millis(500),
        keywords: KeywordFilter::new(true, ["party"], ["mom"]),
    };

    let outcome = h.removal.run(5, options, StopSignal::new()).await;

    assert_eq!(outcome, RunOutcome::Exhausted);
    let journal = h.doc.journal();
    assert_eq!(journal.retracted, vec!["Party tonight?"]);
    assert!(!journal.hovered.iter().any(|t| t == "groceries list"));
    assert!(!journal.hovered.iter().any(|t| t == "party at mom's"));
}

#[tokio::test(start_paused = true)]
async fn audience_dialog_retracts_for_everyone() {
    let h = harness(
        Conversation::new()
            .other("hey")
            .message(SimMessage::own("oops").confirm(ConfirmShape::Dialog)),
    );

    let outcome = h.removal.run(6, options(), StopSignal::new()).await;

    assert_eq!(outcome, RunOutcome::Exhausted);
    let journal = h.doc.journal();
    assert_eq!(journal.retracted, vec!["oops"]);
    assert!(journal.removed_for_self.is_empty());
}

#[tokio::test(start_paused = true)]
async fn missing_confirmation_skips_the_message() {
    let h = harness(
        Conversation::new()
            .message(SimMessage::own("stuck").confirm(ConfirmShape::None))
            .own("fine"),
    );

    let outcome = h.removal.run(7, options(), StopSignal::new()).await;

    assert_eq!(outcome, RunOutcome::Exhausted);
    let journal = h.doc.journal();
    assert_eq!(journal.retracted, vec!["fine"]);
    assert_eq!(journal.hovered.iter().filter(|t| *t == "stuck").count(), 1);
    assert_eq!(h.doc.message_texts(), vec!["stuck"]);
}

#[tokio::test(start_paused = true)]
async fn older_history_is_loaded_and_cleared() {
    let h = harness(
        Conversation::new()
            .older_batch(vec![SimMessage::own("old 1"), SimMessage::own("old 2")])
            .own("new 1")
            .own("new 2"),
    );

    let outcome = h.removal.run(8, options(), StopSignal::new()).await;

    assert_eq!(outcome, RunOutcome::Exhausted);
    assert_eq!(
        h.doc.journal().retracted,
        vec!["new 2", "new 1", "old 2", "old 1"]
    );
    assert!(h.doc.message_texts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn unattributable_layout_falls_back_and_warns_once() {
    let h = harness(
        Conversation::new()
            .message(SimMessage::centered("mine 1"))
            .message(SimMessage::centered("theirs").actions(&["Reply"]))
            .message(SimMessage::centered("mine 2")),
    );

    let outcome = h.removal.run(9, options(), StopSignal::new()).await;

    assert_eq!(outcome, RunOutcome::Exhausted);
    // Document order, not bottom-most, when authorship is unknown.
    assert_eq!(h.doc.journal().retracted, vec!["mine 1", "mine 2"]);
    let warnings = h
        .sink
        .statuses()
        .into_iter()
        .filter(|s| s.starts_with("Could not tell which messages are yours"))
        .count();
    assert_eq!(warnings, 1);
}

#[tokio::test(start_paused = true)]
async fn labelled_rows_identify_own_messages() {
    let h = harness(
        Conversation::new()
            .message(SimMessage::centered("mine").labelled("You sent"))
            .message(
                SimMessage::centered("theirs")
                    .labelled("Alice sent")
                    .actions(&["Reply"]),
            ),
    );

    let outcome = h.removal.run(10, options(), StopSignal::new()).await;

    assert_eq!(outcome, RunOutcome::Exhausted);
    let journal = h.doc.journal();
    assert_eq!(journal.retracted, vec!["mine"]);
    // Labels picked the own message first; "theirs" only surfaces once nothing is attributable.
    assert_eq!(journal.hovered.first().map(String::as_str), Some("mine"));
}

#[tokio::test(start_paused = true)]
async fn unlabelled_menu_control_is_found_by_position() {
    let h = harness(Conversation::new().message(
        SimMessage::own("hidden menu").more(unsend_engine::MoreControl::Unlabelled),
    ));

    let outcome = h.removal.run(11, options(), StopSignal::new()).await;

    assert_eq!(outcome, RunOutcome::Exhausted);
    assert_eq!(h.doc.journal().retracted, vec!["hidden menu"]);
}

#[tokio::test(start_paused = true)]
async fn no_conversation_reports_and_finishes() {
    engine_logging::initialize_for_tests();
    let doc = Arc::new(SimDocument::from_html("<html><body></body></html>"));
    let sink = TestSink::new();
    let removal = RemovalLoop::new(
        doc.clone(),
        doc.clone(),
        Arc::new(EngineConfig::default()),
        Arc::new(sink.clone()),
    );

    let outcome = removal.run(12, options(), StopSignal::new()).await;

    assert_eq!(outcome, RunOutcome::NoConversation);
    assert_eq!(
        sink.statuses(),
        vec!["Starting...".to_string(), "No conversation open".to_string()]
    );
    assert_eq!(
        last_event(&sink),
        EngineEvent::Finished {
            run_id: 12,
            removed: 0,
            outcome: RunOutcome::NoConversation,
        }
    );
}

/// Real tokio sleeps, with every requested duration recorded.
#[derive(Default, Clone)]
struct RecordingClock {
    slept: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingClock {
    fn count(&self, duration: Duration) -> usize {
        self.slept
            .lock()
            .unwrap()
            .iter()
            .filter(|d| **d == duration)
            .count()
    }
}

#[async_trait::async_trait]
impl Clock for RecordingClock {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
        tokio::time::sleep(duration).await;
    }
}

/// Only the post-reveal pause lasts this long, so counting it counts empty scans.
const AFTER_SCROLL: Duration = Duration::from_millis(2345);

fn counted_run(
    conversation: Conversation,
) -> (Arc<SimDocument>, RecordingClock, RemovalLoop<SimDocument>) {
    engine_logging::initialize_for_tests();
    let doc = Arc::new(conversation.build());
    let clock = RecordingClock::default();
    let config = EngineConfig {
        timings: Timings {
            after_scroll_ms: AFTER_SCROLL.as_millis() as u64,
            ..Timings::default()
        },
        ..EngineConfig::default()
    };
    let removal = RemovalLoop::new(
        doc.clone(),
        doc.clone(),
        Arc::new(config),
        Arc::new(TestSink::new()),
    )
    .with_clock(Arc::new(clock.clone()));
    (doc, clock, removal)
}

#[tokio::test(start_paused = true)]
async fn three_empty_scans_at_the_top_complete_the_run() {
    let mut conversation = Conversation::new();
    for i in 0..15 {
        conversation = conversation.other(&format!("m{i}"));
    }
    let (_doc, clock, removal) = counted_run(conversation);

    let outcome = removal.run(13, options(), StopSignal::new()).await;

    assert_eq!(outcome, RunOutcome::Exhausted);
    assert_eq!(clock.count(AFTER_SCROLL), 3);
}

#[tokio::test(start_paused = true)]
async fn history_growth_resets_the_end_of_history_streak() {
    let mut conversation =
        Conversation::new().older_batch(vec![SimMessage::other("from last week")]);
    for i in 0..15 {
        conversation = conversation.other(&format!("m{i}"));
    }
    let (doc, clock, removal) = counted_run(conversation);

    let outcome = removal.run(14, options(), StopSignal::new()).await;

    assert_eq!(outcome, RunOutcome::Exhausted);
    // The first reveal loads a batch, so three more empty scans are needed.
    assert_eq!(clock.count(AFTER_SCROLL), 4);
    assert_eq!(doc.message_texts().len(), 16);
}

#[tokio::test(start_paused = true)]
async fn unremovable_messages_are_each_tried_once_while_stuck() {
    let mut conversation = Conversation::new();
    for i in 0..20 {
        conversation = conversation.other(&format!("m{i}"));
    }
    for i in 0..5 {
        conversation = conversation
            .message(SimMessage::own(&format!("forwarded {i}")).actions(&["Reply", "Forward"]));
    }
    let h = harness(conversation);

    let outcome = h.removal.run(15, options(), StopSignal::new()).await;

    assert_eq!(outcome, RunOutcome::Exhausted);
    let journal = h.doc.journal();
    assert!(journal.retracted.is_empty());
    for i in 0..5 {
        let text = format!("forwarded {i}");
        assert_eq!(journal.hovered.iter().filter(|t| **t == text).count(), 1);
    }
    assert_eq!(h.doc.message_texts().len(), 25);
}
