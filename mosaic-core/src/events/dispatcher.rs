//! Fan-out dispatcher over registered event handlers.

use std::sync::Arc;

use super::handler::PipelineEventHandler;
use super::types::*;

/// Dispatches each event to every registered handler in registration order.
/// Cloneable; clones share the same handler set.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn PipelineEventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Arc<dyn PipelineEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn atom_state_change(&self, event: &AtomStateChangeEvent) {
        for h in &self.handlers {
            h.on_atom_state_change(event);
        }
    }

    pub fn wave_started(&self, event: &WaveStartedEvent) {
        for h in &self.handlers {
            h.on_wave_started(event);
        }
    }

    pub fn wave_completed(&self, event: &WaveCompletedEvent) {
        for h in &self.handlers {
            h.on_wave_completed(event);
        }
    }

    pub fn level_validation_passed(&self, event: &LevelValidationEvent) {
        for h in &self.handlers {
            h.on_level_validation_passed(event);
        }
    }

    pub fn level_validation_failed(&self, event: &LevelValidationEvent) {
        for h in &self.handlers {
            h.on_level_validation_failed(event);
        }
    }

    pub fn retry_started(&self, event: &RetryStartedEvent) {
        for h in &self.handlers {
            h.on_retry_started(event);
        }
    }

    pub fn retry_exhausted(&self, event: &RetryExhaustedEvent) {
        for h in &self.handlers {
            h.on_retry_exhausted(event);
        }
    }

    pub fn review_queued(&self, event: &ReviewQueuedEvent) {
        for h in &self.handlers {
            h.on_review_queued(event);
        }
    }

    pub fn plan_completed(&self, event: &PlanCompletedEvent) {
        for h in &self.handlers {
            h.on_plan_completed(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::handler::BufferingEventHandler;
    use super::*;
    use crate::types::identifiers::AtomId;

    #[test]
    fn dispatcher_fans_out_to_all_handlers() {
        let first = Arc::new(BufferingEventHandler::new());
        let second = Arc::new(BufferingEventHandler::new());
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(first.clone());
        dispatcher.register(second.clone());

        dispatcher.retry_started(&RetryStartedEvent {
            atom_id: AtomId::from("a1"),
            wave_index: Some(0),
            attempt: 1,
            temperature: 0.7,
            timestamp: now_millis(),
            metadata: serde_json::json!({}),
        });

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(first.drain()[0].name(), "retry_started");
    }
}
