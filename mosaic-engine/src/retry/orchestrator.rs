//! RetryOrchestrator — drives the bounded per-atom attempt loop.
//!
//! Each attempt is one oracle call plus one Level 1 evaluation; attempts
//! are strictly sequential, temperatures descend, and every attempt is
//! recorded in the append-only retry log.

use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use mosaic_core::config::RetryConfig;
use mosaic_core::errors::ValidateError;
use mosaic_core::events::types::{
    now_millis, LevelValidationEvent, RetryExhaustedEvent, RetryStartedEvent,
};
use mosaic_core::events::EventDispatcher;
use mosaic_core::model::atom::AtomStatus;
use mosaic_core::model::retry::{RetryLog, RetryRecord};
use mosaic_core::model::validation::ValidationResult;
use mosaic_core::traits::PatternRetriever;
use mosaic_core::types::identifiers::AtomId;

use super::feedback;
use crate::executor::cancel::OrCancelExt;
use crate::executor::AtomStore;
use crate::oracle::client::OracleClient;
use crate::validate::ledger::{EscalationLedger, SubjectHierarchy};
use crate::validate::Level1Validator;

/// Terminal outcome of one atom's attempt loop.
#[derive(Debug)]
pub enum AttemptOutcome {
    /// An attempt passed Level 1.
    Success {
        code: String,
        attempts: u8,
        result: ValidationResult,
    },
    /// All attempts failed Level 1 (or produced no usable code).
    Exhausted {
        attempts: u8,
        last_result: Option<ValidationResult>,
    },
    /// The validator malfunctioned; the atom was never judged.
    LevelError {
        attempts: u8,
        error: ValidateError,
    },
    /// Cancellation interrupted the loop at a safe point.
    Cancelled { attempts: u8 },
}

/// Runs the ≤ N attempt loop for individual atoms.
pub struct RetryOrchestrator {
    config: RetryConfig,
    oracle: Arc<OracleClient>,
    level1: Arc<Level1Validator>,
    retriever: Arc<dyn PatternRetriever>,
    dispatcher: EventDispatcher,
    retry_log: Arc<Mutex<RetryLog>>,
}

impl RetryOrchestrator {
    pub fn new(
        config: RetryConfig,
        oracle: Arc<OracleClient>,
        level1: Arc<Level1Validator>,
        retriever: Arc<dyn PatternRetriever>,
        dispatcher: EventDispatcher,
        retry_log: Arc<Mutex<RetryLog>>,
    ) -> Self {
        Self {
            config,
            oracle,
            level1,
            retriever,
            dispatcher,
            retry_log,
        }
    }

    pub fn retry_log(&self) -> Arc<Mutex<RetryLog>> {
        Arc::clone(&self.retry_log)
    }

    /// Drive the attempt loop for one in-flight atom. The caller owns the
    /// surrounding status transitions into and out of the loop; this
    /// method handles the in-flight ↔ failed oscillation between
    /// attempts.
    #[allow(clippy::too_many_arguments)]
    pub async fn run_atom(
        &self,
        store: &AtomStore,
        ledger: &EscalationLedger,
        hierarchy: &SubjectHierarchy,
        atom_id: &AtomId,
        task_description: &str,
        wave_index: Option<usize>,
        cancel: &CancellationToken,
        human_hint: Option<&str>,
    ) -> AttemptOutcome {
        let Some(atom) = store.get(atom_id) else {
            return AttemptOutcome::LevelError {
                attempts: 0,
                error: ValidateError::ToolchainCrashed {
                    check: "scheduling".to_string(),
                    message: format!("atom {atom_id} missing from store"),
                },
            };
        };

        let snippets = self.retriever.retrieve(
            &format!("{} {} {}", atom.language.name(), atom.name, task_description),
            3,
        );
        let base_prompt = feedback::initial_prompt(&atom, task_description, &snippets, human_hint);

        let max_attempts = self.config.effective_max_attempts();
        let context_lines = self.config.effective_feedback_context_lines();
        let mut prompt = base_prompt.clone();
        let mut prev_failure = String::new();
        let mut last_result: Option<ValidationResult> = None;

        for attempt in 1..=max_attempts {
            if cancel.is_cancelled() {
                return AttemptOutcome::Cancelled {
                    attempts: attempt - 1,
                };
            }

            // Attempt 2+ resumes from failed.
            if attempt > 1 {
                let _ = store.transition(
                    atom_id,
                    AtomStatus::Failed,
                    AtomStatus::InFlight,
                    wave_index,
                );
            }

            let temperature = self.config.temperature_for_attempt(attempt);
            store.record_attempt(atom_id);
            self.dispatcher.retry_started(&RetryStartedEvent {
                atom_id: atom_id.clone(),
                wave_index,
                attempt,
                temperature,
                timestamp: now_millis(),
                metadata: serde_json::json!({}),
            });

            let generated = match self.oracle.generate(&prompt, temperature).or_cancel(cancel).await
            {
                Err(_) => {
                    return AttemptOutcome::Cancelled {
                        attempts: attempt,
                    }
                }
                Ok(result) => result,
            };

            match generated {
                Ok(code) => {
                    // Safe point: a cancel landing after the oracle reply
                    // aborts before Level 1 starts.
                    if cancel.is_cancelled() {
                        return AttemptOutcome::Cancelled { attempts: attempt };
                    }

                    match self.level1.validate(&atom, &code).await {
                        Ok(result) => {
                            ledger.record(&result, hierarchy);
                            let event = LevelValidationEvent {
                                level: result.level,
                                subject: result.subject.label(),
                                wave_index,
                                timestamp: now_millis(),
                                metadata: serde_json::json!({ "attempt": attempt }),
                            };
                            if result.passed {
                                self.dispatcher.level_validation_passed(&event);
                            } else {
                                self.dispatcher.level_validation_failed(&event);
                            }
                            self.append_record(RetryRecord {
                                atom_id: atom_id.clone(),
                                attempt,
                                failure_summary: std::mem::take(&mut prev_failure),
                                prompt: prompt.clone(),
                                temperature,
                                success: result.passed,
                                code: Some(code.clone()),
                            });

                            if result.passed {
                                return AttemptOutcome::Success {
                                    code,
                                    attempts: attempt,
                                    result,
                                };
                            }

                            prev_failure = result.failure_summary();
                            prompt = feedback::feedback_prompt(
                                &base_prompt,
                                &result,
                                &code,
                                context_lines,
                            );
                            last_result = Some(result);
                            let _ = store.transition(
                                atom_id,
                                AtomStatus::InFlight,
                                AtomStatus::Failed,
                                wave_index,
                            );
                        }
                        Err(error) => {
                            tracing::warn!(atom = %atom_id, error = %error, "level error during validation");
                            return AttemptOutcome::LevelError {
                                attempts: attempt,
                                error,
                            };
                        }
                    }
                }
                Err(oracle_error) => {
                    tracing::debug!(
                        atom = %atom_id,
                        attempt,
                        error = %oracle_error,
                        "oracle attempt produced no usable code"
                    );
                    self.append_record(RetryRecord {
                        atom_id: atom_id.clone(),
                        attempt,
                        failure_summary: std::mem::take(&mut prev_failure),
                        prompt: prompt.clone(),
                        temperature,
                        success: false,
                        code: None,
                    });
                    prev_failure = oracle_error.to_string();
                    prompt = feedback::oracle_failure_prompt(&base_prompt, &prev_failure);
                    let _ = store.transition(
                        atom_id,
                        AtomStatus::InFlight,
                        AtomStatus::Failed,
                        wave_index,
                    );
                }
            }
        }

        self.dispatcher.retry_exhausted(&RetryExhaustedEvent {
            atom_id: atom_id.clone(),
            wave_index,
            attempts: max_attempts,
            timestamp: now_millis(),
            metadata: serde_json::json!({}),
        });
        AttemptOutcome::Exhausted {
            attempts: max_attempts,
            last_result,
        }
    }

    fn append_record(&self, record: RetryRecord) {
        if let Ok(mut log) = self.retry_log.lock() {
            log.append(record);
        }
    }
}
