//! Event handler trait with no-op defaults, plus a buffering handler for
//! tests and polling consumers.

use std::sync::Mutex;

use super::types::*;

/// Receiver of pipeline progress events. All methods default to no-ops so
/// handlers implement only what they care about. Handlers must be cheap;
/// the executor calls them from async context without offloading.
pub trait PipelineEventHandler: Send + Sync {
    fn on_atom_state_change(&self, _event: &AtomStateChangeEvent) {}
    fn on_wave_started(&self, _event: &WaveStartedEvent) {}
    fn on_wave_completed(&self, _event: &WaveCompletedEvent) {}
    fn on_level_validation_passed(&self, _event: &LevelValidationEvent) {}
    fn on_level_validation_failed(&self, _event: &LevelValidationEvent) {}
    fn on_retry_started(&self, _event: &RetryStartedEvent) {}
    fn on_retry_exhausted(&self, _event: &RetryExhaustedEvent) {}
    fn on_review_queued(&self, _event: &ReviewQueuedEvent) {}
    fn on_plan_completed(&self, _event: &PlanCompletedEvent) {}
}

/// No-op handler for hosts that do not consume events.
pub struct NoOpEventHandler;

impl PipelineEventHandler for NoOpEventHandler {}

/// A recorded event, tagged for assertion convenience.
#[derive(Debug, Clone)]
pub enum RecordedEvent {
    AtomStateChange(AtomStateChangeEvent),
    WaveStarted(WaveStartedEvent),
    WaveCompleted(WaveCompletedEvent),
    LevelValidationPassed(LevelValidationEvent),
    LevelValidationFailed(LevelValidationEvent),
    RetryStarted(RetryStartedEvent),
    RetryExhausted(RetryExhaustedEvent),
    ReviewQueued(ReviewQueuedEvent),
    PlanCompleted(PlanCompletedEvent),
}

impl RecordedEvent {
    /// Event name per the controller's vocabulary.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AtomStateChange(_) => "atom_state_change",
            Self::WaveStarted(_) => "wave_started",
            Self::WaveCompleted(_) => "wave_completed",
            Self::LevelValidationPassed(_) => "level_validation_passed",
            Self::LevelValidationFailed(_) => "level_validation_failed",
            Self::RetryStarted(_) => "retry_started",
            Self::RetryExhausted(_) => "retry_exhausted",
            Self::ReviewQueued(_) => "review_queued",
            Self::PlanCompleted(_) => "plan_completed",
        }
    }
}

/// Buffers every event in arrival order. Capped to avoid unbounded growth
/// when a polling consumer stalls.
pub struct BufferingEventHandler {
    buffer: Mutex<Vec<RecordedEvent>>,
    capacity: usize,
}

impl BufferingEventHandler {
    pub fn new() -> Self {
        Self::with_capacity(100_000)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Mutex::new(Vec::new()),
            capacity,
        }
    }

    fn push(&self, event: RecordedEvent) {
        if let Ok(mut buf) = self.buffer.lock() {
            if buf.len() < self.capacity {
                buf.push(event);
            }
        }
    }

    /// Take all buffered events, leaving the buffer empty.
    pub fn drain(&self) -> Vec<RecordedEvent> {
        self.buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }

    /// Snapshot of buffered events without draining.
    pub fn snapshot(&self) -> Vec<RecordedEvent> {
        self.buffer
            .lock()
            .map(|buf| buf.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().map(|buf| buf.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for BufferingEventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineEventHandler for BufferingEventHandler {
    fn on_atom_state_change(&self, event: &AtomStateChangeEvent) {
        self.push(RecordedEvent::AtomStateChange(event.clone()));
    }
    fn on_wave_started(&self, event: &WaveStartedEvent) {
        self.push(RecordedEvent::WaveStarted(event.clone()));
    }
    fn on_wave_completed(&self, event: &WaveCompletedEvent) {
        self.push(RecordedEvent::WaveCompleted(event.clone()));
    }
    fn on_level_validation_passed(&self, event: &LevelValidationEvent) {
        self.push(RecordedEvent::LevelValidationPassed(event.clone()));
    }
    fn on_level_validation_failed(&self, event: &LevelValidationEvent) {
        self.push(RecordedEvent::LevelValidationFailed(event.clone()));
    }
    fn on_retry_started(&self, event: &RetryStartedEvent) {
        self.push(RecordedEvent::RetryStarted(event.clone()));
    }
    fn on_retry_exhausted(&self, event: &RetryExhaustedEvent) {
        self.push(RecordedEvent::RetryExhausted(event.clone()));
    }
    fn on_review_queued(&self, event: &ReviewQueuedEvent) {
        self.push(RecordedEvent::ReviewQueued(event.clone()));
    }
    fn on_plan_completed(&self, event: &PlanCompletedEvent) {
        self.push(RecordedEvent::PlanCompleted(event.clone()));
    }
}
