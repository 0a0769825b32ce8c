#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use unsend_engine::{
    Conversation, EngineConfig, EngineEvent, EventSink, RemovalLoop, SimDocument, StopReason,
};

#[derive(Default, Clone)]
pub struct TestSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl TestSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                EngineEvent::Status { message, .. } => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn progress(&self) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                EngineEvent::Progress { removed, .. } => Some(removed),
                _ => None,
            })
            .collect()
    }

    pub fn stops(&self) -> Vec<StopReason> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                EngineEvent::Stopped { reason, .. } => Some(reason),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub struct Harness {
    pub doc: Arc<SimDocument>,
    pub sink: TestSink,
    pub removal: RemovalLoop<SimDocument>,
}

pub fn harness(conversation: Conversation) -> Harness {
    engine_logging::initialize_for_tests();
    let doc = Arc::new(conversation.build());
    let sink = TestSink::new();
    let removal = RemovalLoop::new(
        doc.clone(),
        doc.clone(),
        Arc::new(EngineConfig::default()),
        Arc::new(sink.clone()),
    );
    Harness { doc, sink, removal }
}
