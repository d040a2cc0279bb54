//! ReviewQueue — FIFO by priority (1 − confidence, age tie-break).
//!
//! Mutations flow through a serialized channel: any thread may submit a
//! command, a single writer (the controller) pumps them into state.
//! Readers take snapshots.

use std::sync::Mutex;

use crossbeam_channel::{unbounded, Receiver, Sender};

use mosaic_core::events::types::{now_millis, ReviewQueuedEvent};
use mosaic_core::events::EventDispatcher;
use mosaic_core::model::atom::ReviewReason;
use mosaic_core::model::review::{HumanDecision, ReviewItem, ReviewStatus};
use mosaic_core::types::identifiers::AtomId;

/// A queue mutation.
#[derive(Debug)]
pub enum ReviewCommand {
    Enqueue {
        atom_id: AtomId,
        confidence: f64,
        reason: ReviewReason,
        hint: String,
    },
    MarkInReview(AtomId),
    Decide {
        atom_id: AtomId,
        decision: HumanDecision,
    },
}

#[derive(Default)]
struct ReviewState {
    items: Vec<ReviewItem>,
    next_seq: u64,
}

/// The review queue. Single-writer via [`ReviewQueue::pump`].
pub struct ReviewQueue {
    sender: Sender<ReviewCommand>,
    receiver: Receiver<ReviewCommand>,
    state: Mutex<ReviewState>,
    dispatcher: EventDispatcher,
}

impl ReviewQueue {
    pub fn new(dispatcher: EventDispatcher) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            state: Mutex::new(ReviewState::default()),
            dispatcher,
        }
    }

    /// Submit a mutation from any thread.
    pub fn submit(&self, command: ReviewCommand) {
        let _ = self.sender.send(command);
    }

    /// Drain submitted commands into state. Must be called from exactly
    /// one writer at a time; the controller owns this.
    pub fn pump(&self) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        while let Ok(command) = self.receiver.try_recv() {
            apply(&mut state, command, &self.dispatcher);
        }
    }

    /// Pending items in priority order: lowest confidence first, oldest
    /// first on ties.
    pub fn pending(&self) -> Vec<ReviewItem> {
        let Ok(state) = self.state.lock() else {
            return Vec::new();
        };
        let mut pending: Vec<ReviewItem> = state
            .items
            .iter()
            .filter(|item| item.status == ReviewStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by(|a, b| {
            b.priority()
                .total_cmp(&a.priority())
                .then_with(|| a.enqueued_seq.cmp(&b.enqueued_seq))
        });
        pending
    }

    /// Every item, in enqueue order.
    pub fn items(&self) -> Vec<ReviewItem> {
        self.state
            .lock()
            .map(|state| state.items.clone())
            .unwrap_or_default()
    }

    pub fn item_for(&self, atom_id: &AtomId) -> Option<ReviewItem> {
        self.state
            .lock()
            .ok()?
            .items
            .iter()
            .find(|item| &item.atom_id == atom_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().map(|state| state.items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn apply(state: &mut ReviewState, command: ReviewCommand, dispatcher: &EventDispatcher) {
    match command {
        ReviewCommand::Enqueue {
            atom_id,
            confidence,
            reason,
            hint,
        } => {
            // One live review item per atom; a re-enqueue refreshes it.
            if let Some(existing) = state
                .items
                .iter_mut()
                .find(|item| item.atom_id == atom_id && item.status == ReviewStatus::Pending)
            {
                existing.confidence = confidence;
                existing.reason = reason;
                existing.hint = hint;
                return;
            }
            let seq = state.next_seq;
            state.next_seq += 1;
            state.items.push(ReviewItem {
                atom_id: atom_id.clone(),
                confidence,
                reason,
                hint,
                status: ReviewStatus::Pending,
                enqueued_seq: seq,
                decision: None,
            });
            dispatcher.review_queued(&ReviewQueuedEvent {
                atom_id,
                confidence,
                reason: reason.name().to_string(),
                timestamp: now_millis(),
                metadata: serde_json::json!({}),
            });
        }
        ReviewCommand::MarkInReview(atom_id) => {
            if let Some(item) = state
                .items
                .iter_mut()
                .find(|item| item.atom_id == atom_id && item.status == ReviewStatus::Pending)
            {
                item.status = ReviewStatus::InReview;
            }
        }
        ReviewCommand::Decide { atom_id, decision } => {
            let Some(item) = state.items.iter_mut().find(|item| {
                item.atom_id == atom_id
                    && matches!(item.status, ReviewStatus::Pending | ReviewStatus::InReview)
            }) else {
                tracing::warn!(atom = %atom_id, "decision for an atom not under review");
                return;
            };
            item.status = match decision {
                HumanDecision::Approve | HumanDecision::Edit { .. } => ReviewStatus::Approved,
                HumanDecision::Regenerate { .. } => ReviewStatus::Regenerated,
                HumanDecision::Reject => ReviewStatus::Rejected,
            };
            item.decision = Some(decision);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue() -> ReviewQueue {
        ReviewQueue::new(EventDispatcher::new())
    }

    fn enqueue(q: &ReviewQueue, atom: &str, confidence: f64) {
        q.submit(ReviewCommand::Enqueue {
            atom_id: AtomId::from(atom),
            confidence,
            reason: ReviewReason::LowConfidence,
            hint: String::new(),
        });
    }

    #[test]
    fn lowest_confidence_comes_first() {
        let q = queue();
        enqueue(&q, "a1", 0.6);
        enqueue(&q, "a2", 0.2);
        enqueue(&q, "a3", 0.4);
        q.pump();

        let pending = q.pending();
        let order: Vec<&str> = pending.iter().map(|i| i.atom_id.as_str()).collect();
        assert_eq!(order, vec!["a2", "a3", "a1"]);
    }

    #[test]
    fn equal_confidence_breaks_ties_by_age() {
        let q = queue();
        enqueue(&q, "a2", 0.5);
        enqueue(&q, "a1", 0.5);
        q.pump();

        let pending = q.pending();
        let order: Vec<&str> = pending.iter().map(|i| i.atom_id.as_str()).collect();
        assert_eq!(order, vec!["a2", "a1"]);
    }

    #[test]
    fn decisions_settle_items() {
        let q = queue();
        enqueue(&q, "a1", 0.5);
        q.pump();
        q.submit(ReviewCommand::Decide {
            atom_id: AtomId::from("a1"),
            decision: HumanDecision::Approve,
        });
        q.pump();

        let item = q.item_for(&AtomId::from("a1")).unwrap();
        assert_eq!(item.status, ReviewStatus::Approved);
        assert!(q.pending().is_empty());
    }
}
