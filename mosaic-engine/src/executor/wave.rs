//! WaveExecutor — bounded parallel execution of one wave, with strict
//! wave-to-wave happens-before, failure-ratio abort, and cancellation at
//! safe points.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use mosaic_core::config::{ExecutorConfig, ReviewConfig};
use mosaic_core::events::types::{now_millis, WaveCompletedEvent, WaveStartedEvent};
use mosaic_core::events::EventDispatcher;
use mosaic_core::model::atom::{AtomStatus, ReviewReason};
use mosaic_core::model::wave::Wave;
use mosaic_core::traits::{ArtifactSink, EmittedArtifact};
use mosaic_core::types::identifiers::{AtomId, TaskId};
use mosaic_core::FxHashMap;

use super::store::AtomStore;
use crate::confidence::{ConfidenceScorer, IntegrationSignal};
use crate::retry::{AttemptOutcome, RetryOrchestrator};
use crate::review::hints::compose_hint;
use crate::review::{ReviewCommand, ReviewQueue};
use crate::validate::ledger::{EscalationLedger, SubjectHierarchy};

/// What happened to one wave.
#[derive(Debug, Clone, Default)]
pub struct WaveOutcome {
    pub index: usize,
    /// Atoms that actually entered execution.
    pub scheduled: usize,
    pub accepted: usize,
    pub needs_review: usize,
    /// True when the failure ratio tripped and the wave was cancelled.
    pub aborted: bool,
    /// True when the wave deadline expired.
    pub timed_out: bool,
}

/// Executes the atoms of one wave under the concurrency bound.
#[derive(Clone)]
pub struct WaveExecutor {
    config: ExecutorConfig,
    review_config: ReviewConfig,
    scorer: ConfidenceScorer,
    store: Arc<AtomStore>,
    retry: Arc<RetryOrchestrator>,
    dispatcher: EventDispatcher,
    sink: Arc<dyn ArtifactSink>,
    review: Arc<ReviewQueue>,
    ledger: Arc<EscalationLedger>,
    hierarchy: Arc<SubjectHierarchy>,
    task_descriptions: Arc<FxHashMap<TaskId, String>>,
}

impl WaveExecutor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: ExecutorConfig,
        review_config: ReviewConfig,
        scorer: ConfidenceScorer,
        store: Arc<AtomStore>,
        retry: Arc<RetryOrchestrator>,
        dispatcher: EventDispatcher,
        sink: Arc<dyn ArtifactSink>,
        review: Arc<ReviewQueue>,
        ledger: Arc<EscalationLedger>,
        hierarchy: Arc<SubjectHierarchy>,
        task_descriptions: Arc<FxHashMap<TaskId, String>>,
    ) -> Self {
        Self {
            config,
            review_config,
            scorer,
            store,
            retry,
            dispatcher,
            sink,
            review,
            ledger,
            hierarchy,
            task_descriptions,
        }
    }

    /// Run one wave to completion. All member atoms reach a settled state
    /// (accepted, needs-review, or still pending because blocked) before
    /// this returns — the strict happens-before between waves.
    pub async fn run_wave(&self, wave: &Wave, plan_cancel: &CancellationToken) -> WaveOutcome {
        let accepted_before = self.store.accepted_ids();
        let mut ready: Vec<AtomId> = Vec::new();

        for atom_id in &wave.atoms {
            match self.store.status(atom_id) {
                Some(AtomStatus::Pending) => {
                    let Some(atom) = self.store.get(atom_id) else { continue };
                    if atom.dependencies_satisfied(&accepted_before) {
                        if self
                            .store
                            .transition(atom_id, AtomStatus::Pending, AtomStatus::Ready, Some(wave.index))
                            .is_ok()
                        {
                            ready.push(atom_id.clone());
                        }
                    }
                    // Otherwise a dependency ended badly; the atom stays
                    // pending and is reported blocked at plan end.
                }
                // Resumption path: a human decision already staged it.
                Some(AtomStatus::Ready) => ready.push(atom_id.clone()),
                _ => {}
            }
        }

        self.dispatcher.wave_started(&WaveStartedEvent {
            wave_index: wave.index,
            atom_count: ready.len(),
            timestamp: now_millis(),
            metadata: serde_json::json!({}),
        });

        let outcome = self.execute_ready(wave.index, &ready, plan_cancel).await;

        let accepted_after = self.store.accepted_ids();
        let accepted = wave
            .atoms
            .iter()
            .filter(|id| accepted_after.contains(*id) && !accepted_before.contains(*id))
            .count();
        let needs_review = wave
            .atoms
            .iter()
            .filter(|id| self.store.status(id) == Some(AtomStatus::NeedsReview))
            .count();

        self.dispatcher.wave_completed(&WaveCompletedEvent {
            wave_index: wave.index,
            accepted,
            needs_review,
            timestamp: now_millis(),
            metadata: serde_json::json!({ "aborted": outcome.aborted }),
        });

        WaveOutcome {
            index: wave.index,
            scheduled: ready.len(),
            accepted,
            needs_review,
            ..outcome
        }
    }

    async fn execute_ready(
        &self,
        wave_index: usize,
        ready: &[AtomId],
        plan_cancel: &CancellationToken,
    ) -> WaveOutcome {
        let mut outcome = WaveOutcome {
            index: wave_index,
            ..Default::default()
        };
        if ready.is_empty() {
            return outcome;
        }

        let wave_cancel = plan_cancel.child_token();
        let semaphore = Arc::new(Semaphore::new(
            self.config.effective_max_concurrency_per_wave(),
        ));
        let failures = Arc::new(AtomicUsize::new(0));
        let aborted = Arc::new(AtomicBool::new(false));
        let wave_size = ready.len();

        let mut tasks: JoinSet<()> = JoinSet::new();
        for atom_id in ready {
            let executor = self.clone();
            let atom_id = atom_id.clone();
            let semaphore = Arc::clone(&semaphore);
            let wave_cancel = wave_cancel.clone();
            let failures = Arc::clone(&failures);
            let aborted = Arc::clone(&aborted);

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                if wave_cancel.is_cancelled() {
                    let _ = executor.store.route_to_review(
                        &atom_id,
                        ReviewReason::Cancelled,
                        Some(wave_index),
                    );
                    return;
                }
                executor
                    .execute_atom(&atom_id, wave_index, &wave_cancel, &failures, &aborted, wave_size)
                    .await;
            });
        }

        let deadline = self.config.effective_wave_timeout(wave_size);
        let drained = tokio::time::timeout(deadline, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            outcome.timed_out = true;
            wave_cancel.cancel();
            tracing::warn!(wave = wave_index, ?deadline, "wave deadline expired, cancelling");
            let grace = self.config.effective_cancel_grace();
            let settled = tokio::time::timeout(grace, async {
                while tasks.join_next().await.is_some() {}
            })
            .await;
            if settled.is_err() {
                tasks.abort_all();
            }
            // Anything not settled ends in review with the deadline reason.
            for atom_id in ready {
                if matches!(
                    self.store.status(atom_id),
                    Some(AtomStatus::Ready | AtomStatus::InFlight | AtomStatus::Failed)
                ) {
                    let _ = self.store.route_to_review(
                        atom_id,
                        ReviewReason::DeadlineExceeded,
                        Some(wave_index),
                    );
                }
            }
        }

        outcome.aborted = aborted.load(Ordering::SeqCst);
        outcome
    }

    async fn execute_atom(
        &self,
        atom_id: &AtomId,
        wave_index: usize,
        wave_cancel: &CancellationToken,
        failures: &AtomicUsize,
        aborted: &AtomicBool,
        wave_size: usize,
    ) {
        if self
            .store
            .transition(atom_id, AtomStatus::Ready, AtomStatus::InFlight, Some(wave_index))
            .is_err()
        {
            return;
        }

        let task_description = self
            .store
            .get(atom_id)
            .and_then(|atom| self.task_descriptions.get(&atom.task_id).cloned())
            .unwrap_or_default();

        let attempt_outcome = self
            .retry
            .run_atom(
                &self.store,
                &self.ledger,
                &self.hierarchy,
                atom_id,
                &task_description,
                Some(wave_index),
                wave_cancel,
                None,
            )
            .await;

        let failed = self.settle_outcome(atom_id, Some(wave_index), attempt_outcome);

        if failed {
            let failed_so_far = failures.fetch_add(1, Ordering::SeqCst) + 1;
            let ratio = failed_so_far as f64 / wave_size.max(1) as f64;
            if ratio > self.config.effective_wave_failure_abort_ratio()
                && !aborted.swap(true, Ordering::SeqCst)
            {
                tracing::warn!(
                    wave = wave_index,
                    ratio,
                    "wave failure ratio exceeded, cancelling in-flight atoms"
                );
                wave_cancel.cancel();
            }
        }
    }

    /// Apply a retry-loop outcome to the store, queue, and sink. Returns
    /// true when the outcome counts toward the wave failure ratio.
    pub fn settle_outcome(
        &self,
        atom_id: &AtomId,
        wave_index: Option<usize>,
        outcome: AttemptOutcome,
    ) -> bool {
        match outcome {
            AttemptOutcome::Success {
                code,
                attempts,
                result: _,
            } => {
                let Some(atom) = self.store.get(atom_id) else {
                    return false;
                };
                self.store.set_code(atom_id, code.clone());
                let _ = self.store.transition(
                    atom_id,
                    AtomStatus::InFlight,
                    AtomStatus::Validated,
                    wave_index,
                );

                let confidence =
                    self.scorer
                        .score(true, attempts, atom.complexity, IntegrationSignal::None);
                self.store.set_confidence(atom_id, confidence);

                if self.scorer.needs_review(confidence) {
                    let _ = self.store.route_to_review(
                        atom_id,
                        ReviewReason::LowConfidence,
                        wave_index,
                    );
                    self.enqueue_review(atom_id, confidence, ReviewReason::LowConfidence);
                    false
                } else {
                    let _ = self.store.transition(
                        atom_id,
                        AtomStatus::Validated,
                        AtomStatus::Accepted,
                        wave_index,
                    );
                    self.sink.emit(EmittedArtifact {
                        atom_id: atom_id.clone(),
                        target_path: atom.target_path.clone(),
                        code,
                    });
                    false
                }
            }
            AttemptOutcome::Exhausted {
                attempts,
                last_result: _,
            } => {
                let complexity = self
                    .store
                    .get(atom_id)
                    .map(|atom| atom.complexity)
                    .unwrap_or(0.0);
                let confidence =
                    self.scorer
                        .score(false, attempts, complexity, IntegrationSignal::None);
                self.store.set_confidence(atom_id, confidence);
                let _ = self.store.route_to_review(
                    atom_id,
                    ReviewReason::RetryExhausted,
                    wave_index,
                );
                self.enqueue_review(atom_id, confidence, ReviewReason::RetryExhausted);
                true
            }
            AttemptOutcome::LevelError { error, .. } => {
                tracing::warn!(atom = %atom_id, error = %error, "validator level error");
                let _ = self
                    .store
                    .route_to_review(atom_id, ReviewReason::ValidatorError, wave_index);
                self.enqueue_review(atom_id, 0.0, ReviewReason::ValidatorError);
                true
            }
            AttemptOutcome::Cancelled { .. } => {
                let _ = self
                    .store
                    .route_to_review(atom_id, ReviewReason::Cancelled, wave_index);
                false
            }
        }
    }

    fn enqueue_review(&self, atom_id: &AtomId, confidence: f64, reason: ReviewReason) {
        let hint = {
            let log = self.retry.retry_log();
            let log = log.lock();
            match log {
                Ok(log) => {
                    let records: Vec<_> = log.for_atom(atom_id).collect();
                    compose_hint(
                        self.ledger.last_for_atom(atom_id).as_ref(),
                        &records,
                        self.review_config.effective_max_hint_fixes(),
                    )
                }
                Err(_) => String::new(),
            }
        };
        self.review.submit(ReviewCommand::Enqueue {
            atom_id: atom_id.clone(),
            confidence,
            reason,
            hint,
        });
    }
}
