//! Executor behavior: concurrency bound saturation, single-atom plans,
//! and wave structure for independent atoms.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use mosaic_core::config::MosaicConfig;
use mosaic_core::errors::OracleError;
use mosaic_core::model::summary::PlanStatus;
use mosaic_core::model::task::{Language, Task};
use mosaic_core::traits::CollectingSink;
use mosaic_engine::controller::PipelineController;
use mosaic_engine::oracle::CodeOracle;
use mosaic_engine::testing::ScriptedToolchain;
use mosaic_engine::validate::ToolchainRegistry;

/// Oracle tracking how many calls run concurrently.
struct CountingOracle {
    current: AtomicUsize,
    peak: AtomicUsize,
    delay: Duration,
}

impl CountingOracle {
    fn new(delay: Duration) -> Self {
        Self {
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            delay,
        }
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CodeOracle for CountingOracle {
    async fn generate(
        &self,
        _prompt: &str,
        _temperature: f64,
        _deadline: Duration,
    ) -> Result<String, OracleError> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok("def generated():\n    return 1\n".to_string())
    }
}

fn scripted_registry() -> ToolchainRegistry {
    let mut registry = ToolchainRegistry::new();
    for language in [Language::Python, Language::TypeScript, Language::Rust] {
        registry.register(Arc::new(ScriptedToolchain::new(language)));
    }
    registry
}

fn independent_tasks(count: usize) -> Vec<Task> {
    (1..=count)
        .map(|i| {
            let name = format!("stage_{i:02}");
            Task::new(
                format!("t{i:02}"),
                Language::Python,
                format!("{name} work"),
                format!("src/{name}.py"),
                10,
            )
            .with_scaffold(format!("def {name}():\n    return {i}\n"))
        })
        .collect()
}

#[tokio::test]
async fn concurrency_saturates_but_never_exceeds_the_bound() {
    let oracle = Arc::new(CountingOracle::new(Duration::from_millis(40)));
    let mut config = MosaicConfig::default();
    config.executor.max_concurrency_per_wave = Some(2);

    let controller = PipelineController::new(config, oracle.clone())
        .with_toolchains(scripted_registry());

    let run = controller
        .run("plan-bound".into(), independent_tasks(6))
        .await
        .unwrap();

    // Independent atoms share exactly one wave.
    assert_eq!(run.graph.waves().len(), 1);
    assert_eq!(run.summary.accepted, 6);
    assert!(oracle.peak() <= 2, "observed {} concurrent calls", oracle.peak());
    assert!(oracle.peak() >= 2, "parallelism never saturated the bound");
}

#[tokio::test]
async fn single_atom_plan_runs_all_levels() {
    let oracle = Arc::new(CountingOracle::new(Duration::from_millis(1)));
    let sink = Arc::new(CollectingSink::new());
    let controller = PipelineController::new(MosaicConfig::default(), oracle)
        .with_toolchains(scripted_registry())
        .with_sink(sink.clone());

    let run = controller
        .run("plan-one".into(), independent_tasks(1))
        .await
        .unwrap();

    assert_eq!(run.summary.status, PlanStatus::Completed);
    assert_eq!(run.summary.total_atoms, 1);
    assert_eq!(run.summary.accepted, 1);
    assert!(run.summary.level_4_passed);
    assert_eq!(run.graph.waves().len(), 1);
    assert_eq!(sink.len(), 1);
}

#[tokio::test]
async fn oracle_backpressure_caps_in_flight_calls() {
    let oracle = Arc::new(CountingOracle::new(Duration::from_millis(20)));
    let mut config = MosaicConfig::default();
    // The executor would run 8 wide, but the oracle pool is narrower.
    config.executor.max_concurrency_per_wave = Some(8);
    config.oracle.max_in_flight = Some(3);

    let controller = PipelineController::new(config, oracle.clone())
        .with_toolchains(scripted_registry());

    let run = controller
        .run("plan-pool".into(), independent_tasks(8))
        .await
        .unwrap();

    assert_eq!(run.summary.accepted, 8);
    assert!(oracle.peak() <= 3, "oracle pool leaked: {}", oracle.peak());
}
