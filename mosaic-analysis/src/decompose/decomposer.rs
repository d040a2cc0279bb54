//! Decomposer — turns one coarse task into atomic units with context
//! bundles, and whole plans into unit sets via rayon.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use mosaic_core::config::DecomposeConfig;
use mosaic_core::errors::DecomposeError;
use mosaic_core::model::atom::{AtomStatus, AtomicUnit, ReviewReason};
use mosaic_core::model::task::Task;
use mosaic_core::traits::PatternRetriever;
use mosaic_core::types::identifiers::{AtomId, TaskId};
use mosaic_core::{FxHashMap, FxHashSet};

use super::atomicity::AtomicityValidator;
use super::context::ContextInjector;
use super::splitter::Splitter;
use crate::parsers::types::AstNodeKind;
use crate::parsers::ParserManager;

/// Analysis facts per atom, consumed by the dependency analyzer.
#[derive(Debug, Clone)]
pub struct AtomAnalysis {
    pub declared: Vec<String>,
    pub declared_types: Vec<String>,
    pub referenced: Vec<String>,
    pub calls: Vec<String>,
    /// Mean atomicity score from the ten-criteria check.
    pub atomicity_score: f64,
}

/// Stats for one decomposed task.
#[derive(Debug, Clone, Default)]
pub struct DecomposeStats {
    pub atoms_emitted: usize,
    pub irreducible: usize,
    pub flagged_dynamic: bool,
    pub duration: Duration,
}

/// Output of decomposing one task.
#[derive(Debug, Clone)]
pub struct DecomposedTask {
    pub task_id: TaskId,
    pub atoms: Vec<AtomicUnit>,
    pub analyses: FxHashMap<AtomId, AtomAnalysis>,
    pub stats: DecomposeStats,
}

/// Splits tasks into atoms satisfying the atomicity contract.
pub struct Decomposer<'a> {
    config: &'a DecomposeConfig,
    parsers: &'a ParserManager,
    retriever: &'a dyn PatternRetriever,
}

impl<'a> Decomposer<'a> {
    pub fn new(
        config: &'a DecomposeConfig,
        parsers: &'a ParserManager,
        retriever: &'a dyn PatternRetriever,
    ) -> Self {
        Self {
            config,
            parsers,
            retriever,
        }
    }

    /// Decompose every task of a plan in parallel. Tasks that fail
    /// structurally (no scaffold, parse error) are reported individually;
    /// the rest of the plan proceeds.
    pub fn decompose_plan(
        &self,
        tasks: &[Task],
    ) -> (Vec<DecomposedTask>, Vec<(TaskId, DecomposeError)>) {
        let results: Vec<(TaskId, Result<DecomposedTask, DecomposeError>)> = tasks
            .par_iter()
            .map(|task| (task.id.clone(), self.decompose_task(task)))
            .collect();

        let mut decomposed = Vec::new();
        let mut failed = Vec::new();
        for (task_id, result) in results {
            match result {
                Ok(output) => decomposed.push(output),
                Err(error) => {
                    tracing::warn!(task = %task_id, error = %error, "task failed to decompose");
                    failed.push((task_id, error));
                }
            }
        }
        (decomposed, failed)
    }

    /// Decompose a single task.
    pub fn decompose_task(&self, task: &Task) -> Result<DecomposedTask, DecomposeError> {
        let start = Instant::now();

        let scaffold = self.scaffold_for(task)?;
        let ast = self.parsers.parse(&scaffold, task.language)?;

        let flagged_dynamic =
            ast.dynamic_marker_count >= self.config.effective_dynamic_marker_threshold();
        if flagged_dynamic {
            tracing::warn!(
                task = %task.id,
                markers = ast.dynamic_marker_count,
                "reflection-heavy source, atoms flagged for review"
            );
        }

        let splitter = Splitter::new(self.config, &scaffold);
        let drafts = splitter.split(&ast.root);

        // Module-level imports feed reference resolution.
        let module_imports: Vec<String> = ast
            .root
            .children
            .iter()
            .filter(|node| node.kind == AstNodeKind::Import)
            .flat_map(|node| node.referenced.iter().cloned())
            .collect();

        // First declarer in document order owns a symbol.
        let ids: Vec<AtomId> = (0..drafts.len())
            .map(|i| AtomId::new(format!("{}-a{:03}", task.id, i + 1)))
            .collect();
        let mut declared_by: FxHashMap<String, AtomId> = FxHashMap::default();
        for (draft, id) in drafts.iter().zip(&ids) {
            for symbol in &draft.declared {
                declared_by.entry(symbol.clone()).or_insert_with(|| id.clone());
            }
        }

        let injector = ContextInjector::new(task, &declared_by, &module_imports);
        let gate = AtomicityValidator::new(self.config, self.parsers);

        let mut atoms = Vec::with_capacity(drafts.len());
        let mut analyses = FxHashMap::default();
        let mut irreducible = 0usize;

        for (draft, id) in drafts.iter().zip(&ids) {
            let bundle = injector.inject(id, draft);

            let taken: FxHashSet<String> = declared_by
                .iter()
                .filter(|(_, owner)| *owner != id)
                .map(|(symbol, _)| symbol.clone())
                .collect();
            let report = gate.check(draft, &bundle, &taken, task.language);
            if !report.ok {
                tracing::debug!(
                    atom = %id,
                    score = report.score,
                    failures = ?report.failures,
                    "atomicity violations recorded"
                );
            }

            if !draft.reducible {
                irreducible += 1;
            }

            let oversized =
                !draft.reducible && draft.loc > self.config.effective_irreducible_loc_cap();
            let (status, review_reason, confidence) = if flagged_dynamic {
                (AtomStatus::NeedsReview, Some(ReviewReason::DynamicSource), Some(0.0))
            } else if oversized {
                (AtomStatus::NeedsReview, Some(ReviewReason::Irreducible), Some(0.0))
            } else {
                (AtomStatus::Pending, None, None)
            };

            atoms.push(AtomicUnit {
                id: id.clone(),
                task_id: task.id.clone(),
                name: draft.name.clone(),
                language: task.language,
                estimated_loc: draft.loc,
                complexity: draft.complexity,
                context: bundle,
                depends_on: BTreeSet::new(),
                status,
                attempts: 0,
                code: None,
                confidence,
                reducible: draft.reducible,
                target_path: task.target_path.clone(),
                review_reason,
            });

            analyses.insert(
                id.clone(),
                AtomAnalysis {
                    declared: draft.declared.clone(),
                    declared_types: draft.declared_types.clone(),
                    referenced: draft.referenced.clone(),
                    calls: draft.calls.clone(),
                    atomicity_score: report.score,
                },
            );
        }

        let stats = DecomposeStats {
            atoms_emitted: atoms.len(),
            irreducible,
            flagged_dynamic,
            duration: start.elapsed(),
        };
        tracing::debug!(
            task = %task.id,
            atoms = stats.atoms_emitted,
            irreducible = stats.irreducible,
            "task decomposed"
        );

        Ok(DecomposedTask {
            task_id: task.id.clone(),
            atoms,
            analyses,
            stats,
        })
    }

    /// The task's stated scaffold, or the closest retrieved pattern.
    fn scaffold_for(&self, task: &Task) -> Result<String, DecomposeError> {
        if let Some(scaffold) = &task.scaffold {
            return Ok(scaffold.clone());
        }
        let snippets = self.retriever.retrieve(&task.description, 3);
        snippets
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .map(|snippet| snippet.content)
            .ok_or_else(|| DecomposeError::ScaffoldMissing {
                task_id: task.id.to_string(),
            })
    }
}
