//! Decomposer coverage: emission, shape gating, context injection, and
//! the edge cases that route straight to review.

use mosaic_analysis::decompose::Decomposer;
use mosaic_analysis::parsers::ParserManager;
use mosaic_core::config::DecomposeConfig;
use mosaic_core::errors::DecomposeError;
use mosaic_core::model::atom::{AtomStatus, ReviewReason};
use mosaic_core::model::context::ImportSource;
use mosaic_core::model::task::{Language, Task};
use mosaic_core::traits::NoOpPatternRetriever;

fn decompose(scaffold: &str) -> mosaic_analysis::decompose::DecomposedTask {
    let config = DecomposeConfig::default();
    let parsers = ParserManager::new();
    let decomposer = Decomposer::new(&config, &parsers, &NoOpPatternRetriever);
    let task = Task::new("t1", Language::Python, "build the parser stage", "src/parse.py", 30)
        .with_scaffold(scaffold);
    decomposer.decompose_task(&task).unwrap()
}

#[test]
fn small_function_becomes_one_pending_atom() {
    let output = decompose("def load():\n    return 1\n");

    assert_eq!(output.atoms.len(), 1);
    let atom = &output.atoms[0];
    assert_eq!(atom.id.as_str(), "t1-a001");
    assert_eq!(atom.name, "load");
    assert_eq!(atom.status, AtomStatus::Pending);
    assert!(atom.reducible);
    assert!(atom.estimated_loc <= 10);
    assert!(atom.complexity < 3.0);
    assert!(atom.context.completeness >= 0.95);
    assert!(atom.context.has_happy_and_boundary_tests());
}

#[test]
fn module_with_two_functions_yields_two_atoms() {
    let output = decompose(
        "def first():\n    return 1\n\ndef second():\n    return first() + 1\n",
    );

    assert_eq!(output.atoms.len(), 2);
    let ids: Vec<&str> = output.atoms.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["t1-a001", "t1-a002"]);

    // `second` references `first`; the bundle resolves it to the atom.
    let second = &output.atoms[1];
    let binding = second
        .context
        .imports
        .iter()
        .find(|b| b.symbol == "first")
        .expect("cross-atom reference resolved");
    assert_eq!(binding.source, ImportSource::Atom("t1-a001".into()));
}

#[test]
fn complex_function_splits_along_block_boundaries() {
    // for + while + two ifs pushes the function past the complexity cap,
    // so the splitter descends into its blocks.
    let scaffold = "\
def crunch(values):
    total = 0
    for value in values:
        if value > 0:
            total += value
    while total > 100:
        total -= 10
    if total < 0:
        total = 0
    return total
";
    let output = decompose(scaffold);

    assert!(output.atoms.len() > 1, "expected a split, got one atom");
    for atom in &output.atoms {
        assert!(atom.reducible);
        assert!(atom.estimated_loc <= 10);
        assert!(atom.complexity < 3.0, "atom {} at {}", atom.name, atom.complexity);
    }
}

#[test]
fn oversized_single_statement_is_irreducible() {
    let scaffold = "\
CONFIG = {
    \"a\": 1,
    \"b\": 2,
    \"c\": 3,
    \"d\": 4,
    \"e\": 5,
    \"f\": 6,
    \"g\": 7,
    \"h\": 8,
    \"i\": 9,
    \"j\": 10,
}
";
    let output = decompose(scaffold);

    assert_eq!(output.atoms.len(), 1);
    let atom = &output.atoms[0];
    assert!(!atom.reducible);
    assert!(atom.estimated_loc > 10 && atom.estimated_loc <= 15);
    // Tolerated at the relaxed cap, so it still executes.
    assert_eq!(atom.status, AtomStatus::Pending);
    assert_eq!(output.stats.irreducible, 1);
}

#[test]
fn reflection_heavy_source_routes_to_review() {
    let scaffold = "\
def sneaky(name):
    handler = eval(name)
    exec(handler)
    return handler
";
    let output = decompose(scaffold);

    assert!(output.stats.flagged_dynamic);
    for atom in &output.atoms {
        assert_eq!(atom.status, AtomStatus::NeedsReview);
        assert_eq!(atom.review_reason, Some(ReviewReason::DynamicSource));
        assert_eq!(atom.confidence, Some(0.0));
        assert!(atom.code.is_none());
    }
}

#[test]
fn missing_scaffold_fails_the_task_only() {
    let config = DecomposeConfig::default();
    let parsers = ParserManager::new();
    let decomposer = Decomposer::new(&config, &parsers, &NoOpPatternRetriever);

    let good = Task::new("t1", Language::Python, "ok", "src/a.py", 10)
        .with_scaffold("def ok():\n    return 1\n");
    let bad = Task::new("t2", Language::Python, "no scaffold anywhere", "src/b.py", 10);

    let (decomposed, failed) = decomposer.decompose_plan(&[good, bad]);
    assert_eq!(decomposed.len(), 1);
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0.as_str(), "t2");
    assert!(matches!(failed[0].1, DecomposeError::ScaffoldMissing { .. }));
}

#[test]
fn parse_failure_is_fatal_for_the_task() {
    let config = DecomposeConfig::default();
    let parsers = ParserManager::new();
    let decomposer = Decomposer::new(&config, &parsers, &NoOpPatternRetriever);
    let task = Task::new("t1", Language::Python, "broken", "src/a.py", 10).with_scaffold("   ");

    let error = decomposer.decompose_task(&task).unwrap_err();
    assert!(matches!(error, DecomposeError::Parse(_)));
}

#[test]
fn analyses_cover_every_emitted_atom() {
    let output = decompose(
        "def first():\n    return 1\n\ndef second():\n    return first() + 1\n",
    );
    for atom in &output.atoms {
        let analysis = output.analyses.get(&atom.id).expect("analysis recorded");
        assert!(analysis.atomicity_score > 0.0);
    }
    let second = output.analyses.get(&output.atoms[1].id).unwrap();
    assert!(second.calls.contains(&"first".to_string()));
}
