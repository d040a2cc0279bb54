//! PipelineController — decompose, build the graph, drive the waves,
//! validate progressively, score, route review, and summarize.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use mosaic_analysis::decompose::Decomposer;
use mosaic_analysis::deps::DependencyAnalyzer;
use mosaic_analysis::graph::builder::GraphStats;
use mosaic_analysis::graph::{DependencyGraph, GraphBuilder};
use mosaic_analysis::parsers::ParserManager;
use mosaic_core::config::MosaicConfig;
use mosaic_core::errors::EngineError;
use mosaic_core::events::types::{now_millis, LevelValidationEvent, PlanCompletedEvent};
use mosaic_core::events::{EventDispatcher, PipelineEventHandler};
use mosaic_core::model::atom::{AtomStatus, AtomicUnit, ReviewReason};
use mosaic_core::model::retry::RetryLog;
use mosaic_core::model::review::HumanDecision;
use mosaic_core::model::summary::{
    NeedsReviewEntry, PlanStatus, PlanSummary, StageDurations,
};
use mosaic_core::model::task::Task;
use mosaic_core::model::validation::{ValidationLevel, ValidationResult, ValidationSubject};
use mosaic_core::model::wave::{Wave, WaveStatus};
use mosaic_core::traits::{
    ArtifactSink, CollectingSink, EmittedArtifact, NoOpPatternFeedback, NoOpPatternRetriever,
    PatternFeedback, PatternRetriever, PlanStore,
};
use mosaic_core::types::identifiers::{AtomId, PlanId, TaskId};
use mosaic_core::FxHashMap;

use crate::confidence::{ConfidenceScorer, IntegrationSignal};
use crate::executor::{AtomStore, WaveExecutor};
use crate::oracle::client::OracleClient;
use crate::oracle::CodeOracle;
use crate::retry::RetryOrchestrator;
use crate::review::{ReviewCommand, ReviewQueue};
use crate::validate::ledger::{EscalationLedger, SubjectHierarchy};
use crate::validate::{
    ComponentMap, Level1Validator, Level2Validator, Level3Validator, Level4Validator,
    ToolchainRegistry,
};

/// Everything a finished (or paused) plan run exposes: the summary plus
/// the live handles human review needs to keep working the plan.
pub struct PlanRun {
    pub plan_id: PlanId,
    pub summary: PlanSummary,
    pub store: Arc<AtomStore>,
    pub review: Arc<ReviewQueue>,
    pub ledger: Arc<EscalationLedger>,
    pub graph: DependencyGraph,
    pub graph_stats: GraphStats,
    /// Wave copies with execution status; the graph's own partition stays
    /// immutable.
    pub waves: Vec<Wave>,
    pub executor: WaveExecutor,
    pub level1: Arc<Level1Validator>,
    pub retry: Arc<RetryOrchestrator>,
    pub hierarchy: Arc<SubjectHierarchy>,
    task_descriptions: Arc<FxHashMap<TaskId, String>>,
    durations: StageDurations,
    failed_tasks: Vec<(TaskId, String)>,
    started: Instant,
}

/// Orchestrates the full pipeline for one plan at a time.
pub struct PipelineController {
    config: MosaicConfig,
    parsers: Arc<ParserManager>,
    oracle_client: Arc<OracleClient>,
    toolchains: Arc<ToolchainRegistry>,
    retriever: Arc<dyn PatternRetriever>,
    pattern_feedback: Arc<dyn PatternFeedback>,
    sink: Arc<dyn ArtifactSink>,
    dispatcher: EventDispatcher,
    component_map: ComponentMap,
    plan_store: Option<Arc<dyn PlanStore>>,
    cancel: CancellationToken,
}

impl PipelineController {
    pub fn new(config: MosaicConfig, oracle: Arc<dyn CodeOracle>) -> Self {
        let parsers = Arc::new(ParserManager::new());
        let toolchains = Arc::new(ToolchainRegistry::structural(Arc::clone(&parsers)));
        let oracle_client = Arc::new(OracleClient::new(oracle, config.oracle.clone()));
        Self {
            config,
            parsers,
            oracle_client,
            toolchains,
            retriever: Arc::new(NoOpPatternRetriever),
            pattern_feedback: Arc::new(NoOpPatternFeedback),
            sink: Arc::new(CollectingSink::new()),
            dispatcher: EventDispatcher::new(),
            component_map: ComponentMap::default(),
            plan_store: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_toolchains(mut self, toolchains: ToolchainRegistry) -> Self {
        self.toolchains = Arc::new(toolchains);
        self
    }

    pub fn with_retriever(mut self, retriever: Arc<dyn PatternRetriever>) -> Self {
        self.retriever = retriever;
        self
    }

    pub fn with_pattern_feedback(mut self, feedback: Arc<dyn PatternFeedback>) -> Self {
        self.pattern_feedback = feedback;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn ArtifactSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_component_map(mut self, component_map: ComponentMap) -> Self {
        self.component_map = component_map;
        self
    }

    pub fn with_event_handler(mut self, handler: Arc<dyn PipelineEventHandler>) -> Self {
        self.dispatcher.register(handler);
        self
    }

    pub fn with_plan_store(mut self, store: Arc<dyn PlanStore>) -> Self {
        self.plan_store = Some(store);
        self
    }

    /// Token for plan-level cancellation; cancel it from any thread.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run a plan end to end.
    pub async fn run(&self, plan_id: PlanId, tasks: Vec<Task>) -> Result<PlanRun, EngineError> {
        let started = Instant::now();
        let mut durations = StageDurations::default();

        // Decompose every task; structural failures sink the task only.
        let decompose_start = Instant::now();
        let decomposer = Decomposer::new(
            &self.config.decompose,
            &self.parsers,
            self.retriever.as_ref(),
        );
        let (decomposed, failures) = decomposer.decompose_plan(&tasks);
        durations.decompose = decompose_start.elapsed();

        let failed_tasks: Vec<(TaskId, String)> = failures
            .into_iter()
            .map(|(task_id, error)| (task_id, error.to_string()))
            .collect();

        let mut atoms: Vec<AtomicUnit> = Vec::new();
        let mut analyses = FxHashMap::default();
        for task in decomposed {
            atoms.extend(task.atoms);
            analyses.extend(task.analyses);
        }

        // Dependency multigraph → normalized DAG → waves.
        let graph_start = Instant::now();
        let analyzer = DependencyAnalyzer::new();
        let (raw_edges, _) = analyzer.analyze(&atoms, &analyses);
        let builder = GraphBuilder::new(&self.config.graph);
        let node_ids: Vec<AtomId> = atoms.iter().map(|a| a.id.clone()).collect();
        let (graph, graph_stats) = builder.build(node_ids, raw_edges)?;
        durations.graph_build = graph_start.elapsed();

        if graph_stats.degraded {
            tracing::warn!(
                plan = %plan_id,
                broken = graph_stats.broken_edges.len(),
                "plan degraded by cycle breaking"
            );
        }

        // Freeze structural dependency sets before execution begins.
        for atom in &mut atoms {
            atom.depends_on = graph.dependencies_of(&atom.id).cloned().collect();
        }

        let store = Arc::new(AtomStore::new(atoms, self.dispatcher.clone()));
        let ledger = Arc::new(EscalationLedger::new());
        let retry_log = Arc::new(Mutex::new(RetryLog::new()));
        let hierarchy = Arc::new(self.build_hierarchy(&plan_id, &store));
        let review = Arc::new(ReviewQueue::new(self.dispatcher.clone()));

        let level1 = Arc::new(Level1Validator::new(
            Arc::clone(&self.toolchains),
            self.config.validation.clone(),
            self.config.decompose.clone(),
        ));
        let retry = Arc::new(RetryOrchestrator::new(
            self.config.retry.clone(),
            Arc::clone(&self.oracle_client),
            Arc::clone(&level1),
            Arc::clone(&self.retriever),
            self.dispatcher.clone(),
            Arc::clone(&retry_log),
        ));
        let scorer = ConfidenceScorer::new(
            &self.config.review,
            self.config.decompose.effective_complexity_cap(),
        );
        let task_descriptions: Arc<FxHashMap<TaskId, String>> = Arc::new(
            tasks
                .iter()
                .map(|task| (task.id.clone(), task.description.clone()))
                .collect(),
        );
        let executor = WaveExecutor::new(
            self.config.executor.clone(),
            self.config.review.clone(),
            scorer.clone(),
            Arc::clone(&store),
            Arc::clone(&retry),
            self.dispatcher.clone(),
            Arc::clone(&self.sink),
            Arc::clone(&review),
            Arc::clone(&ledger),
            Arc::clone(&hierarchy),
            Arc::clone(&task_descriptions),
        );

        // Atoms flagged during decomposition go straight to the queue.
        for atom in store.snapshot() {
            if atom.status == AtomStatus::NeedsReview {
                review.submit(ReviewCommand::Enqueue {
                    atom_id: atom.id.clone(),
                    confidence: atom.confidence.unwrap_or(0.0),
                    reason: atom.review_reason.unwrap_or(ReviewReason::DynamicSource),
                    hint: String::new(),
                });
            }
        }
        review.pump();

        // Wave-by-wave execution under the plan deadline.
        let exec_start = Instant::now();
        let plan_deadline = self.config.executor.effective_plan_deadline();
        let mut plan_status = PlanStatus::Completed;

        let mut plan_waves: Vec<Wave> = graph.waves().to_vec();
        for wave in plan_waves.iter_mut() {
            if self.cancel.is_cancelled() {
                plan_status = PlanStatus::Cancelled;
                break;
            }
            if exec_start.elapsed() > plan_deadline {
                tracing::warn!(plan = %plan_id, "plan deadline exceeded");
                self.mark_unsettled(&store, ReviewReason::DeadlineExceeded);
                plan_status = PlanStatus::Aborted;
                break;
            }

            wave.status = WaveStatus::Running;
            let outcome = executor.run_wave(wave, &self.cancel).await;
            wave.status = if outcome.aborted || outcome.timed_out {
                WaveStatus::Failed
            } else {
                WaveStatus::Done
            };
            review.pump();
            self.progressive_validation(&store, &ledger, &hierarchy, &scorer, Some(wave.index));

            if outcome.aborted {
                plan_status = PlanStatus::Aborted;
                break;
            }
        }

        if self.cancel.is_cancelled() && plan_status == PlanStatus::Completed {
            plan_status = PlanStatus::Cancelled;
        }
        if plan_status == PlanStatus::Cancelled {
            self.mark_unsettled(&store, ReviewReason::Cancelled);
            let unsettled = store.count_with_status(AtomStatus::InFlight)
                + store.count_with_status(AtomStatus::Ready);
            if unsettled > 0 {
                plan_status = PlanStatus::DegradedShutdown;
            }
        }
        durations.execution = exec_start.elapsed();

        // Dependants of failed atoms never ran; they end blocked.
        for atom in store.snapshot() {
            if atom.status == AtomStatus::Pending {
                let _ = store.route_to_review(&atom.id, ReviewReason::Blocked, None);
            }
        }
        review.pump();

        // Level 4 runs once, only over a fully accepted plan.
        let level_4_passed = if plan_status == PlanStatus::Completed
            && store.count_with_status(AtomStatus::Accepted) == store.len()
            && !store.is_empty()
        {
            let validator = Level4Validator::new(&self.component_map);
            let result = validator.validate(&plan_id, &store.snapshot(), &ledger);
            ledger.record(&result, &hierarchy);
            self.emit_level_event(&result, None);
            result.passed
        } else {
            false
        };

        durations.total = started.elapsed();

        let mut run = PlanRun {
            plan_id: plan_id.clone(),
            summary: PlanSummary {
                plan_id,
                status: plan_status,
                total_atoms: store.len(),
                accepted: 0,
                needs_review: Vec::new(),
                level_4_passed,
                durations: durations.clone(),
                attempts_histogram: Default::default(),
                broken_edges: Vec::new(),
                failed_tasks: failed_tasks.clone(),
            },
            store,
            review,
            ledger,
            graph,
            graph_stats,
            waves: plan_waves,
            executor,
            level1,
            retry,
            hierarchy,
            task_descriptions,
            durations,
            failed_tasks,
            started,
        };
        self.refresh_summary(&mut run, plan_status, level_4_passed);

        self.dispatcher.plan_completed(&PlanCompletedEvent {
            plan_id: run.plan_id.clone(),
            status: format!("{plan_status:?}").to_lowercase(),
            total_atoms: run.summary.total_atoms,
            accepted: run.summary.accepted,
            needs_review: run.summary.needs_review.len(),
            timestamp: now_millis(),
            metadata: serde_json::json!({}),
        });

        self.persist(&run);
        self.report_patterns(&run);

        Ok(run)
    }

    /// Apply a human decision to a reviewed atom and, where it unblocks
    /// work, resume execution of the dependants.
    pub async fn apply_decision(
        &self,
        run: &mut PlanRun,
        atom_id: &AtomId,
        decision: HumanDecision,
    ) -> Result<(), EngineError> {
        // Edits record their decision only after Level 1 accepts the new
        // code; everything else settles the queue item immediately.
        if !matches!(decision, HumanDecision::Edit { .. }) {
            run.review.submit(ReviewCommand::Decide {
                atom_id: atom_id.clone(),
                decision: decision.clone(),
            });
            run.review.pump();
        }

        match decision {
            HumanDecision::Approve => {
                let atom = run.store.get(atom_id);
                let code = atom
                    .as_ref()
                    .and_then(|a| a.code.clone())
                    .or_else(|| self.latest_attempt_code(run, atom_id));
                if let Some(code) = code {
                    run.store.set_code(atom_id, code.clone());
                    let _ = run.store.transition(
                        atom_id,
                        AtomStatus::NeedsReview,
                        AtomStatus::Accepted,
                        None,
                    );
                    if let Some(atom) = run.store.get(atom_id) {
                        self.sink.emit(EmittedArtifact {
                            atom_id: atom_id.clone(),
                            target_path: atom.target_path,
                            code,
                        });
                    }
                    self.unblock_dependants(run, atom_id);
                    self.resume(run).await;
                }
            }
            HumanDecision::Edit { code } => {
                if let Some(atom) = run.store.get(atom_id) {
                    match run.level1.validate(&atom, &code).await {
                        Ok(result) => {
                            run.ledger.record(&result, &run.hierarchy);
                            self.emit_level_event(&result, None);
                            if result.passed {
                                run.review.submit(ReviewCommand::Decide {
                                    atom_id: atom_id.clone(),
                                    decision: HumanDecision::Edit { code: code.clone() },
                                });
                                run.review.pump();
                                run.store.set_code(atom_id, code.clone());
                                let _ = run.store.transition(
                                    atom_id,
                                    AtomStatus::NeedsReview,
                                    AtomStatus::Accepted,
                                    None,
                                );
                                self.sink.emit(EmittedArtifact {
                                    atom_id: atom_id.clone(),
                                    target_path: atom.target_path,
                                    code,
                                });
                                self.unblock_dependants(run, atom_id);
                                self.resume(run).await;
                            }
                        }
                        Err(error) => {
                            tracing::warn!(atom = %atom_id, error = %error, "level error validating human edit");
                        }
                    }
                }
            }
            HumanDecision::Regenerate { hint } => {
                run.store.reset_attempts(atom_id);
                if run
                    .store
                    .transition(atom_id, AtomStatus::NeedsReview, AtomStatus::Ready, None)
                    .is_ok()
                    && run
                        .store
                        .transition(atom_id, AtomStatus::Ready, AtomStatus::InFlight, None)
                        .is_ok()
                {
                    let task_description = run
                        .store
                        .get(atom_id)
                        .and_then(|atom| run.task_descriptions.get(&atom.task_id).cloned())
                        .unwrap_or_default();
                    let outcome = run
                        .retry
                        .run_atom(
                            &run.store,
                            &run.ledger,
                            &run.hierarchy,
                            atom_id,
                            &task_description,
                            None,
                            &self.cancel,
                            Some(&hint),
                        )
                        .await;
                    run.executor.settle_outcome(atom_id, None, outcome);
                    run.review.pump();
                    if run.store.status(atom_id) == Some(AtomStatus::Accepted) {
                        self.unblock_dependants(run, atom_id);
                        self.resume(run).await;
                    }
                }
            }
            HumanDecision::Reject => {
                let _ = run
                    .store
                    .transition(atom_id, AtomStatus::NeedsReview, AtomStatus::Rejected, None);
                for dependant in run.graph.transitive_dependants(atom_id) {
                    if run.store.status(&dependant) == Some(AtomStatus::Pending) {
                        let _ = run
                            .store
                            .route_to_review(&dependant, ReviewReason::Blocked, None);
                    }
                }
            }
        }

        let status = run.summary.status;
        let level4 = run.summary.level_4_passed;
        self.refresh_summary(run, status, level4);
        Ok(())
    }

    /// Re-run waves that gained ready atoms after a human decision.
    async fn resume(&self, run: &mut PlanRun) {
        let waves: Vec<_> = run.graph.waves().to_vec();
        let scorer = ConfidenceScorer::new(
            &self.config.review,
            self.config.decompose.effective_complexity_cap(),
        );
        for wave in &waves {
            let has_runnable = wave.atoms.iter().any(|id| {
                matches!(
                    run.store.status(id),
                    Some(AtomStatus::Ready | AtomStatus::Pending)
                )
            });
            if !has_runnable {
                continue;
            }
            run.executor.run_wave(wave, &self.cancel).await;
            run.review.pump();
            self.progressive_validation(
                &run.store,
                &run.ledger,
                &run.hierarchy,
                &scorer,
                Some(wave.index),
            );
        }
    }

    /// After a review approval, stage dependants whose needs are now met.
    fn unblock_dependants(&self, run: &PlanRun, atom_id: &AtomId) {
        let accepted = run.store.accepted_ids();
        for dependant in run.graph.transitive_dependants(atom_id) {
            let Some(atom) = run.store.get(&dependant) else {
                continue;
            };
            let blocked_in_review = atom.status == AtomStatus::NeedsReview
                && atom.review_reason == Some(ReviewReason::Blocked);
            if blocked_in_review && atom.dependencies_satisfied(&accepted) {
                let _ = run.store.transition(
                    &dependant,
                    AtomStatus::NeedsReview,
                    AtomStatus::Ready,
                    None,
                );
            }
        }
    }

    /// Level 2 for every newly complete module, then Level 3 for every
    /// component whose modules all hold a pass. Confidence integration
    /// factors update as results land.
    fn progressive_validation(
        &self,
        store: &Arc<AtomStore>,
        ledger: &Arc<EscalationLedger>,
        hierarchy: &Arc<SubjectHierarchy>,
        scorer: &ConfidenceScorer,
        wave_index: Option<usize>,
    ) {
        let atoms = store.snapshot();

        let mut modules: FxHashMap<&str, Vec<&AtomicUnit>> = FxHashMap::default();
        for atom in &atoms {
            modules.entry(atom.target_path.as_str()).or_default().push(atom);
        }
        let mut module_paths: Vec<&str> = modules.keys().copied().collect();
        module_paths.sort();

        for module_path in module_paths {
            let members = &modules[module_path];
            let all_accepted = members.iter().all(|a| a.status == AtomStatus::Accepted);
            let subject = ValidationSubject::Module(module_path.to_string());
            if !all_accepted || ledger.has_passed(&subject, ValidationLevel::Module) {
                continue;
            }

            let validator = Level2Validator::new(&self.component_map);
            let result = validator.validate(module_path, members, &atoms);
            ledger.record(&result, hierarchy);
            self.emit_level_event(&result, wave_index);

            if result.passed {
                for member in members {
                    let confidence = scorer.score(
                        true,
                        member.attempts,
                        member.complexity,
                        IntegrationSignal::ModulePassed,
                    );
                    store.set_confidence(&member.id, confidence);
                }
            }
        }

        for component in &self.component_map.components {
            let subject = ValidationSubject::Component(component.name.clone());
            if ledger.has_passed(&subject, ValidationLevel::Component) {
                continue;
            }
            let all_modules_passed = component.modules.iter().all(|module| {
                ledger.has_passed(
                    &ValidationSubject::Module(module.clone()),
                    ValidationLevel::Module,
                )
            });
            if !all_modules_passed {
                continue;
            }

            let validator = Level3Validator::new(&self.component_map);
            let result = validator.validate(component, &atoms, ledger);
            ledger.record(&result, hierarchy);
            self.emit_level_event(&result, wave_index);

            if result.passed {
                for atom in atoms
                    .iter()
                    .filter(|a| component.modules.iter().any(|m| *m == a.target_path))
                {
                    let confidence = scorer.score(
                        true,
                        atom.attempts,
                        atom.complexity,
                        IntegrationSignal::ComponentPassed,
                    );
                    store.set_confidence(&atom.id, confidence);
                }
            }
        }
    }

    fn emit_level_event(&self, result: &ValidationResult, wave_index: Option<usize>) {
        let event = LevelValidationEvent {
            level: result.level,
            subject: result.subject.label(),
            wave_index,
            timestamp: now_millis(),
            metadata: serde_json::json!({
                "checks_passed": result.checks_passed,
                "checks_failed": result.checks_failed,
            }),
        };
        if result.passed {
            self.dispatcher.level_validation_passed(&event);
        } else {
            self.dispatcher.level_validation_failed(&event);
        }
    }

    /// Route every atom still in a live execution state to review with the
    /// given reason (cancellation and deadline paths).
    fn mark_unsettled(&self, store: &Arc<AtomStore>, reason: ReviewReason) {
        for atom in store.snapshot() {
            if matches!(
                atom.status,
                AtomStatus::Ready | AtomStatus::InFlight | AtomStatus::Failed
            ) {
                let _ = store.route_to_review(&atom.id, reason, None);
            }
        }
    }

    fn latest_attempt_code(&self, run: &PlanRun, atom_id: &AtomId) -> Option<String> {
        let log = run.retry.retry_log();
        let log = log.lock().ok()?;
        log.for_atom(atom_id)
            .filter_map(|record| record.code.clone())
            .last()
    }

    /// Recompute the summary from current store state.
    pub fn refresh_summary(&self, run: &mut PlanRun, status: PlanStatus, level_4_passed: bool) {
        run.durations.total = run.started.elapsed();
        let atoms = run.store.snapshot();

        let mut histogram: std::collections::BTreeMap<u8, usize> = Default::default();
        for atom in atoms.iter().filter(|a| a.status == AtomStatus::Accepted) {
            *histogram.entry(atom.attempts.max(1)).or_insert(0) += 1;
        }

        let needs_review: Vec<NeedsReviewEntry> = atoms
            .iter()
            .filter(|atom| {
                matches!(atom.status, AtomStatus::NeedsReview | AtomStatus::Rejected)
            })
            .map(|atom| NeedsReviewEntry {
                atom_id: atom.id.clone(),
                reason: atom.review_reason.unwrap_or(ReviewReason::LowConfidence),
                attempts: atom.attempts,
                last_validation: run.ledger.last_for_atom(&atom.id),
            })
            .collect();

        run.summary = PlanSummary {
            plan_id: run.plan_id.clone(),
            status,
            total_atoms: atoms.len(),
            accepted: atoms
                .iter()
                .filter(|a| a.status == AtomStatus::Accepted)
                .count(),
            needs_review,
            level_4_passed,
            durations: run.durations.clone(),
            attempts_histogram: histogram,
            broken_edges: run
                .graph_stats
                .broken_edges
                .iter()
                .map(|edge| (edge.from.clone(), edge.to.clone(), edge.kind.name().to_string()))
                .collect(),
            failed_tasks: run.failed_tasks.clone(),
        };
    }

    fn build_hierarchy(&self, plan_id: &PlanId, store: &Arc<AtomStore>) -> SubjectHierarchy {
        let mut hierarchy = SubjectHierarchy {
            plan_id: Some(plan_id.clone()),
            ..Default::default()
        };
        for atom in store.snapshot() {
            hierarchy
                .module_of_atom
                .insert(atom.id.clone(), atom.target_path.clone());
            if let Some(component) = self.component_map.component_of_module(&atom.target_path) {
                hierarchy
                    .component_of_module
                    .insert(atom.target_path.clone(), component.name.clone());
            }
        }
        hierarchy
    }

    fn persist(&self, run: &PlanRun) {
        let Some(plan_store) = &self.plan_store else {
            return;
        };
        for atom in run.store.snapshot() {
            plan_store.upsert_atom(&atom);
        }
        if let Ok(log) = run.retry.retry_log().lock() {
            for record in log.all() {
                plan_store.upsert_retry(record);
            }
        }
        let mut seen: FxHashMap<(String, u8), u8> = FxHashMap::default();
        for result in run.ledger.snapshot() {
            let key = (result.subject.label(), result.level.number());
            let attempt = seen.entry(key).and_modify(|n| *n += 1).or_insert(1);
            plan_store.upsert_validation(*attempt, &result);
        }
        for item in run.review.items() {
            plan_store.upsert_review(&item);
        }
    }

    fn report_patterns(&self, run: &PlanRun) {
        for atom in run.store.snapshot() {
            if atom.status == AtomStatus::Accepted {
                if let Some(code) = &atom.code {
                    self.pattern_feedback.report_accepted(&atom.id, code);
                }
            }
        }
    }
}
