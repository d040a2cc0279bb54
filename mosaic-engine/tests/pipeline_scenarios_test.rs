//! End-to-end pipeline scenarios driven by scripted oracles and
//! toolchains: the linear chain, semantic retries, exhaustion with
//! blocked dependants, wave abort, and human review decisions.

use std::sync::Arc;

use mosaic_core::config::MosaicConfig;
use mosaic_core::events::handler::{BufferingEventHandler, RecordedEvent};
use mosaic_core::model::atom::{AtomStatus, ReviewReason};
use mosaic_core::model::review::HumanDecision;
use mosaic_core::model::summary::PlanStatus;
use mosaic_core::model::task::{Language, Task};
use mosaic_core::traits::CollectingSink;
use mosaic_core::types::identifiers::AtomId;
use mosaic_engine::controller::PipelineController;
use mosaic_engine::oracle::CodeOracle;
use mosaic_engine::retry::feedback::FEEDBACK_SUFFIX;
use mosaic_engine::testing::{
    OracleErrorKind, ScriptedOracle, ScriptedReply, ScriptedToolchain, FAIL_TESTS_MARKER,
    FAIL_TYPES_MARKER,
};
use mosaic_engine::validate::ToolchainRegistry;

// ─── Helpers ───────────────────────────────────────────────────────────────

struct Harness {
    controller: PipelineController,
    events: Arc<BufferingEventHandler>,
    sink: Arc<CollectingSink>,
}

fn harness(oracle: Arc<dyn CodeOracle>, mut config: MosaicConfig) -> Harness {
    // Keep transport backoff out of test wall-clock.
    config.oracle.backoff_initial_ms = Some(1);
    config.oracle.backoff_max_ms = Some(2);

    let mut toolchains = ToolchainRegistry::new();
    for language in [Language::Python, Language::TypeScript, Language::Rust] {
        toolchains.register(Arc::new(ScriptedToolchain::new(language)));
    }

    let events = Arc::new(BufferingEventHandler::new());
    let sink = Arc::new(CollectingSink::new());
    let controller = PipelineController::new(config, oracle)
        .with_toolchains(toolchains)
        .with_event_handler(events.clone())
        .with_sink(sink.clone());
    Harness {
        controller,
        events,
        sink,
    }
}

fn python_task(id: &str, name: &str, target: &str, scaffold: &str) -> Task {
    Task::new(id, Language::Python, format!("{name} stage"), target, 10).with_scaffold(scaffold)
}

fn atom(id: &str) -> AtomId {
    AtomId::from(id)
}

// ─── Scenario: linear chain ────────────────────────────────────────────────

#[tokio::test]
async fn linear_chain_accepts_everything_in_three_waves() {
    let oracle = Arc::new(ScriptedOracle::uniform("def generated():\n    return 1\n"));
    let h = harness(oracle, MosaicConfig::default());

    let tasks = vec![
        python_task("t1", "load", "src/load.py", "def load():\n    return 1\n"),
        python_task(
            "t2",
            "transform",
            "src/transform.py",
            "def transform():\n    return load() + 1\n",
        ),
        python_task(
            "t3",
            "emit_result",
            "src/emit.py",
            "def emit_result():\n    return transform() + 1\n",
        ),
    ];

    let run = h.controller.run("plan-a".into(), tasks).await.unwrap();

    assert_eq!(run.summary.status, PlanStatus::Completed);
    assert_eq!(run.summary.total_atoms, 3);
    assert_eq!(run.summary.accepted, 3);
    assert!(run.summary.needs_review.is_empty());
    assert!(run.summary.level_4_passed);
    assert_eq!(
        run.summary.attempts_histogram,
        [(1u8, 3usize)].into_iter().collect()
    );

    // Three waves of one atom each, one per chain link.
    assert_eq!(run.graph.waves().len(), 3);
    for wave in run.graph.waves() {
        assert_eq!(wave.len(), 1);
    }

    // Acceptance order follows the chain.
    let artifacts = h.sink.artifacts();
    let emitted: Vec<&str> = artifacts.iter().map(|a| a.atom_id.as_str()).collect();
    assert_eq!(emitted, vec!["t1-a001", "t2-a001", "t3-a001"]);

    let wave_starts = h
        .events
        .snapshot()
        .iter()
        .filter(|e| e.name() == "wave_started")
        .count();
    assert_eq!(wave_starts, 3);
}

// ─── Scenario: retry success on the third attempt ──────────────────────────

#[tokio::test]
async fn third_attempt_success_lands_in_review_on_low_confidence() {
    let oracle = Arc::new(ScriptedOracle::uniform("def fallback():\n    return 0\n").script(
        "risky",
        vec![
            ScriptedReply::Text(format!("{FAIL_TYPES_MARKER} attempt one")),
            ScriptedReply::Text(format!("{FAIL_TESTS_MARKER} attempt two")),
            ScriptedReply::Text("def risky(flag):\n    return 1\n".to_string()),
        ],
    ));
    let h = harness(oracle, MosaicConfig::default());

    let scaffold = "def risky(flag):\n    if flag:\n        return 2\n    return 1\n";
    let tasks = vec![python_task("t1", "risky", "src/risky.py", scaffold)];

    let run = h.controller.run("plan-c".into(), tasks).await.unwrap();
    let id = atom("t1-a001");

    let unit = run.store.get(&id).unwrap();
    assert_eq!(unit.status, AtomStatus::NeedsReview);
    assert_eq!(unit.review_reason, Some(ReviewReason::LowConfidence));
    assert_eq!(unit.attempts, 3);
    // 0.4·1 + 0.3·0.33 + 0.2·(1 − 2/3) ≈ 0.566, below the 0.7 threshold.
    let confidence = unit.confidence.unwrap();
    assert!(confidence < 0.7 && confidence > 0.5, "{confidence}");

    // Three retry records with the descending temperature schedule.
    let log = run.retry.retry_log();
    let log = log.lock().unwrap();
    let records: Vec<_> = log.for_atom(&id).collect();
    assert_eq!(records.len(), 3);
    let temperatures: Vec<f64> = records.iter().map(|r| r.temperature).collect();
    assert_eq!(temperatures, vec![0.7, 0.5, 0.3]);
    assert!(!records[0].success && !records[1].success && records[2].success);

    // The second prompt is feedback-conditioned on the first failure.
    assert!(records[1].prompt.contains(FEEDBACK_SUFFIX));
    assert!(records[1].prompt.contains("TYPECHECK_FAILED"));
    assert!(records[2].prompt.contains("TEST_FAILED"));
    // The record carries the failure that triggered it.
    assert!(records[1].failure_summary.contains("TYPECHECK_FAILED"));

    assert_eq!(run.summary.needs_review.len(), 1);
    assert!(!run.summary.level_4_passed);
    assert!(run.review.item_for(&id).is_some());
}

// ─── Scenario: exhaustion blocks dependants ────────────────────────────────

fn exhaustion_tasks() -> Vec<Task> {
    vec![
        python_task("t1", "alpha", "src/alpha.py", "def alpha():\n    return 1\n"),
        python_task(
            "t2",
            "beta",
            "src/beta.py",
            "def beta():\n    return alpha() * 2\n",
        ),
    ]
}

fn failing_alpha_oracle() -> Arc<ScriptedOracle> {
    Arc::new(
        ScriptedOracle::uniform("def generated():\n    return 3\n").script(
            "alpha",
            vec![
                ScriptedReply::Text(format!("{FAIL_TESTS_MARKER} one")),
                ScriptedReply::Text(format!("{FAIL_TESTS_MARKER} two")),
                ScriptedReply::Text(format!("{FAIL_TESTS_MARKER} three")),
            ],
        ),
    )
}

fn no_abort_config() -> MosaicConfig {
    let mut config = MosaicConfig::default();
    // A one-atom wave would otherwise trip the abort ratio on a single
    // exhaustion; these scenarios want the plan to keep going.
    config.executor.wave_failure_abort_ratio = Some(2.0);
    config
}

#[tokio::test]
async fn exhausted_atom_blocks_its_dependants() {
    let h = harness(failing_alpha_oracle(), no_abort_config());

    let run = h.controller.run("plan-d".into(), exhaustion_tasks()).await.unwrap();

    let alpha = run.store.get(&atom("t1-a001")).unwrap();
    assert_eq!(alpha.status, AtomStatus::NeedsReview);
    assert_eq!(alpha.review_reason, Some(ReviewReason::RetryExhausted));
    assert_eq!(alpha.attempts, 3);

    let beta = run.store.get(&atom("t2-a001")).unwrap();
    assert_eq!(beta.status, AtomStatus::NeedsReview);
    assert_eq!(beta.review_reason, Some(ReviewReason::Blocked));
    assert_eq!(beta.attempts, 0, "blocked atoms never execute speculatively");

    assert_eq!(run.summary.accepted, 0);
    assert_eq!(run.summary.needs_review.len(), 2);
    assert!(!run.summary.level_4_passed);
    assert!(run.summary.attempts_histogram.is_empty());

    // No module ever completed, so Level 2 never ran.
    let level2_events = h
        .events
        .snapshot()
        .iter()
        .filter(|e| {
            matches!(
                e,
                RecordedEvent::LevelValidationPassed(ev) | RecordedEvent::LevelValidationFailed(ev)
                    if ev.level.number() == 2
            )
        })
        .count();
    assert_eq!(level2_events, 0);

    let exhausted_events = h
        .events
        .snapshot()
        .iter()
        .filter(|e| e.name() == "retry_exhausted")
        .count();
    assert_eq!(exhausted_events, 1);
}

// ─── Scenario: human approval unblocks the chain ───────────────────────────

#[tokio::test]
async fn approval_after_review_resumes_dependants() {
    let h = harness(failing_alpha_oracle(), no_abort_config());

    let mut run = h.controller.run("plan-f".into(), exhaustion_tasks()).await.unwrap();
    assert_eq!(run.summary.accepted, 0);

    h.controller
        .apply_decision(&mut run, &atom("t1-a001"), HumanDecision::Approve)
        .await
        .unwrap();

    let alpha = run.store.get(&atom("t1-a001")).unwrap();
    assert_eq!(alpha.status, AtomStatus::Accepted);
    assert!(alpha.code.is_some(), "approval adopts the latest attempt");

    let beta = run.store.get(&atom("t2-a001")).unwrap();
    assert_eq!(beta.status, AtomStatus::Accepted, "dependant resumed and passed");

    assert_eq!(run.summary.accepted, 2);
    assert!(run.summary.needs_review.is_empty());

    let artifacts = h.sink.artifacts();
    let emitted: Vec<&str> = artifacts.iter().map(|a| a.atom_id.as_str()).collect();
    assert_eq!(emitted, vec!["t1-a001", "t2-a001"]);
}

#[tokio::test]
async fn rejection_keeps_dependants_blocked() {
    let h = harness(failing_alpha_oracle(), no_abort_config());

    let mut run = h.controller.run("plan-r".into(), exhaustion_tasks()).await.unwrap();
    h.controller
        .apply_decision(&mut run, &atom("t1-a001"), HumanDecision::Reject)
        .await
        .unwrap();

    assert_eq!(run.store.status(&atom("t1-a001")), Some(AtomStatus::Rejected));
    assert_eq!(run.store.status(&atom("t2-a001")), Some(AtomStatus::NeedsReview));
    assert_eq!(run.summary.accepted, 0);
}

#[tokio::test]
async fn human_edit_revalidates_before_acceptance() {
    let h = harness(failing_alpha_oracle(), no_abort_config());

    let mut run = h.controller.run("plan-e".into(), exhaustion_tasks()).await.unwrap();

    // A bad edit stays in review.
    h.controller
        .apply_decision(
            &mut run,
            &atom("t1-a001"),
            HumanDecision::Edit {
                code: format!("{} broken", mosaic_engine::testing::FAIL_SYNTAX_MARKER),
            },
        )
        .await
        .unwrap();
    assert_eq!(
        run.store.status(&atom("t1-a001")),
        Some(AtomStatus::NeedsReview)
    );

    // A good edit passes Level 1 and is accepted.
    h.controller
        .apply_decision(
            &mut run,
            &atom("t1-a001"),
            HumanDecision::Edit {
                code: "def alpha():\n    return 7\n".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(run.store.status(&atom("t1-a001")), Some(AtomStatus::Accepted));
    assert_eq!(
        run.store.get(&atom("t1-a001")).unwrap().code.as_deref(),
        Some("def alpha():\n    return 7\n")
    );
}

#[tokio::test]
async fn regeneration_resets_attempts_and_prepends_the_hint() {
    let h = harness(failing_alpha_oracle(), no_abort_config());

    let mut run = h.controller.run("plan-g".into(), exhaustion_tasks()).await.unwrap();
    assert_eq!(run.store.get(&atom("t1-a001")).unwrap().attempts, 3);

    h.controller
        .apply_decision(
            &mut run,
            &atom("t1-a001"),
            HumanDecision::Regenerate {
                hint: "return a constant, keep it trivial".to_string(),
            },
        )
        .await
        .unwrap();

    let alpha = run.store.get(&atom("t1-a001")).unwrap();
    assert_eq!(alpha.status, AtomStatus::Accepted);
    assert_eq!(alpha.attempts, 1, "attempt counter restarted");

    let log = run.retry.retry_log();
    let log = log.lock().unwrap();
    let atom_t1_a001 = atom("t1-a001");
    let last = log.for_atom(&atom_t1_a001).last().unwrap();
    assert!(last.prompt.contains("Reviewer guidance"));
    assert!(last.prompt.contains("keep it trivial"));
}

// ─── Scenario: wave abort on failure ratio ─────────────────────────────────

#[tokio::test]
async fn failure_ratio_aborts_the_wave_and_plan() {
    let mut oracle = ScriptedOracle::uniform("def generated():\n    return 1\n");
    for i in 1..=4 {
        oracle = oracle.script(
            format!("failing_stage_{i}"),
            vec![
                ScriptedReply::Text(format!("{FAIL_TESTS_MARKER} a")),
                ScriptedReply::Text(format!("{FAIL_TESTS_MARKER} b")),
                ScriptedReply::Text(format!("{FAIL_TESTS_MARKER} c")),
            ],
        );
    }
    for i in 5..=10 {
        oracle = oracle.script(
            format!("slow_stage_{i}"),
            vec![ScriptedReply::Slow {
                delay_ms: 500,
                text: "def generated():\n    return 1\n".to_string(),
            }],
        );
    }
    let h = harness(Arc::new(oracle), MosaicConfig::default());

    let mut tasks = Vec::new();
    for i in 1..=4 {
        let name = format!("failing_stage_{i}");
        tasks.push(python_task(
            &format!("t{i}"),
            &name,
            &format!("src/f{i}.py"),
            &format!("def {name}():\n    return {i}\n"),
        ));
    }
    for i in 5..=10 {
        let name = format!("slow_stage_{i}");
        tasks.push(python_task(
            &format!("t{i}"),
            &name,
            &format!("src/s{i}.py"),
            &format!("def {name}():\n    return {i}\n"),
        ));
    }

    let run = h.controller.run("plan-abort".into(), tasks).await.unwrap();

    assert_eq!(run.graph.waves().len(), 1, "all atoms are independent");
    assert_eq!(run.summary.status, PlanStatus::Aborted);

    let exhausted = run
        .summary
        .needs_review
        .iter()
        .filter(|entry| entry.reason == ReviewReason::RetryExhausted)
        .count();
    assert_eq!(exhausted, 4);

    let cancelled = run
        .summary
        .needs_review
        .iter()
        .filter(|entry| entry.reason == ReviewReason::Cancelled)
        .count();
    assert!(cancelled >= 1, "in-flight atoms were cancelled");
    assert_eq!(run.summary.accepted + exhausted + cancelled, 10);

    // Cancellation safety: nothing ever left needs-review for in-flight.
    for event in h.events.snapshot() {
        if let RecordedEvent::AtomStateChange(change) = event {
            assert!(
                !(change.from == AtomStatus::NeedsReview && change.to == AtomStatus::InFlight),
                "needs-review atom re-entered flight"
            );
        }
    }
}

// ─── Scenario: transport flakiness is invisible to attempts ────────────────

#[tokio::test]
async fn transient_oracle_errors_do_not_consume_attempts() {
    let oracle = Arc::new(
        ScriptedOracle::uniform("def generated():\n    return 1\n").script(
            "load",
            vec![
                ScriptedReply::Fail(OracleErrorKind::Transport),
                ScriptedReply::Fail(OracleErrorKind::Server),
                ScriptedReply::Text("def load():\n    return 1\n".to_string()),
            ],
        ),
    );
    let h = harness(oracle, MosaicConfig::default());

    let tasks = vec![python_task("t1", "load", "src/load.py", "def load():\n    return 1\n")];
    let run = h.controller.run("plan-t".into(), tasks).await.unwrap();

    let unit = run.store.get(&atom("t1-a001")).unwrap();
    assert_eq!(unit.status, AtomStatus::Accepted);
    assert_eq!(unit.attempts, 1, "transport retries are not attempts");
    assert_eq!(run.summary.attempts_histogram, [(1u8, 1usize)].into_iter().collect());
}
