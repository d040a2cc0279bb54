//! The atomicity gate: ten criteria every accepted atom must satisfy.

use mosaic_core::config::DecomposeConfig;
use mosaic_core::model::context::ContextBundle;
use mosaic_core::model::task::Language;
use mosaic_core::FxHashSet;

use super::splitter::AtomDraft;
use crate::parsers::ParserManager;

/// Markers that disqualify a draft as a finished atom.
const PLACEHOLDER_MARKERS: &[&str] = &[
    "TODO",
    "FIXME",
    "XXX",
    "unimplemented!",
    "todo!",
    "NotImplementedError",
];

/// Call names treated as observable side effects.
const EFFECT_MARKERS: &[&str] = &[
    "print", "println", "eprintln", "write", "writeln", "open", "save", "send", "post",
    "delete", "remove", "insert", "update", "emit", "log", "warn", "error", "commit",
    "flush", "append",
];

/// One violated criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomicityViolation {
    /// Criterion name, stable across releases.
    pub criterion: &'static str,
    pub detail: String,
}

/// Outcome of the ten-criteria check.
#[derive(Debug, Clone)]
pub struct AtomicityReport {
    pub ok: bool,
    /// Mean of the real-valued criterion scores, in [0, 1].
    pub score: f64,
    pub failures: Vec<AtomicityViolation>,
}

/// Scores a candidate atom against the atomicity contract.
pub struct AtomicityValidator<'a> {
    config: &'a DecomposeConfig,
    parsers: &'a ParserManager,
}

impl<'a> AtomicityValidator<'a> {
    pub fn new(config: &'a DecomposeConfig, parsers: &'a ParserManager) -> Self {
        Self { config, parsers }
    }

    /// Check a draft with its bundle. `taken` holds declarations claimed by
    /// every other atom of the plan.
    pub fn check(
        &self,
        draft: &AtomDraft,
        bundle: &ContextBundle,
        taken: &FxHashSet<String>,
        language: Language,
    ) -> AtomicityReport {
        let mut scores: Vec<f64> = Vec::with_capacity(10);
        let mut failures = Vec::new();

        // 1. LOC cap (relaxed for irreducible leaves).
        let loc_cap = if draft.reducible {
            self.config.effective_loc_cap()
        } else {
            self.config.effective_irreducible_loc_cap()
        };
        scores.push((loc_cap as f64 / draft.loc.max(1) as f64).min(1.0));
        if draft.loc > loc_cap {
            failures.push(AtomicityViolation {
                criterion: "loc-cap",
                detail: format!("{} LOC exceeds cap {}", draft.loc, loc_cap),
            });
        }

        // 2. Cyclomatic complexity.
        let complexity_cap = self.config.effective_complexity_cap();
        scores.push((1.0 - draft.complexity / complexity_cap).max(0.0));
        if draft.complexity >= complexity_cap {
            failures.push(AtomicityViolation {
                criterion: "complexity-cap",
                detail: format!("complexity {:.1} ≥ cap {:.1}", draft.complexity, complexity_cap),
            });
        }

        // 3. Single primary side effect or pure.
        let effects = draft
            .calls
            .iter()
            .filter(|call| EFFECT_MARKERS.contains(&call.as_str()))
            .count();
        scores.push(1.0 / (1.0 + effects.saturating_sub(1) as f64));
        if effects > 1 {
            failures.push(AtomicityViolation {
                criterion: "single-side-effect",
                detail: format!("{effects} effectful calls"),
            });
        }

        // 4. All referenced symbols resolvable from the bundle.
        let resolvable: FxHashSet<&str> = bundle
            .resolvable_symbols()
            .chain(draft.declared.iter().map(String::as_str))
            .collect();
        let unresolved: Vec<&String> = draft
            .referenced
            .iter()
            .filter(|symbol| !resolvable.contains(symbol.as_str()))
            .collect();
        let total = draft.referenced.len().max(1);
        scores.push((total - unresolved.len()) as f64 / total as f64);
        if !unresolved.is_empty() {
            failures.push(AtomicityViolation {
                criterion: "unresolved-references",
                detail: format!("{unresolved:?} not covered by the context bundle"),
            });
        }

        // 5. No declaration shared with another atom.
        let shared: Vec<&String> = draft
            .declared
            .iter()
            .filter(|symbol| taken.contains(symbol.as_str()))
            .collect();
        let declared_total = draft.declared.len().max(1);
        scores.push((declared_total - shared.len()) as f64 / declared_total as f64);
        if !shared.is_empty() {
            failures.push(AtomicityViolation {
                criterion: "shared-declaration",
                detail: format!("{shared:?} also declared elsewhere"),
            });
        }

        // 6. At least one test case.
        scores.push((bundle.test_cases.len() as f64 / 2.0).min(1.0));
        if bundle.test_cases.is_empty() {
            failures.push(AtomicityViolation {
                criterion: "missing-tests",
                detail: "no test cases in bundle".to_string(),
            });
        }

        // 7. Conditions present when behavior is non-trivial.
        let trivial = draft.complexity <= 1.0 && draft.calls.is_empty();
        let conditions_ok =
            trivial || (!bundle.preconditions.is_empty() && !bundle.postconditions.is_empty());
        scores.push(if conditions_ok { 1.0 } else { 0.0 });
        if !conditions_ok {
            failures.push(AtomicityViolation {
                criterion: "missing-conditions",
                detail: "non-trivial atom lacks pre/postconditions".to_string(),
            });
        }

        // 8. No TODO/placeholder markers.
        let placeholders: Vec<&str> = PLACEHOLDER_MARKERS
            .iter()
            .copied()
            .filter(|marker| draft.source_text.contains(marker))
            .collect();
        scores.push(if placeholders.is_empty() { 1.0 } else { 0.0 });
        if !placeholders.is_empty() {
            failures.push(AtomicityViolation {
                criterion: "placeholder-markers",
                detail: format!("{placeholders:?} present"),
            });
        }

        // 9. Bundle completeness.
        scores.push(bundle.completeness.clamp(0.0, 1.0));
        let floor = self.config.effective_completeness_floor();
        if bundle.completeness < floor {
            failures.push(AtomicityViolation {
                criterion: "incomplete-context",
                detail: format!("completeness {:.2} < {:.2}", bundle.completeness, floor),
            });
        }

        // 10. Parseable in isolation.
        let parses = self.parses_in_isolation(&draft.source_text, language);
        scores.push(if parses { 1.0 } else { 0.0 });
        if !parses {
            failures.push(AtomicityViolation {
                criterion: "not-parseable",
                detail: "draft does not parse standalone".to_string(),
            });
        }

        let score = scores.iter().sum::<f64>() / scores.len() as f64;
        AtomicityReport {
            ok: failures.is_empty(),
            score,
            failures,
        }
    }

    /// TypeScript class methods only parse inside a class body; probe with
    /// a wrapper before giving up.
    fn parses_in_isolation(&self, source: &str, language: Language) -> bool {
        if self.parsers.parses_cleanly(source, language) {
            return true;
        }
        if language == Language::TypeScript {
            let wrapped = format!("class __Probe {{\n{source}\n}}");
            return self.parsers.parses_cleanly(&wrapped, language);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::types::AstNodeKind;
    use mosaic_core::model::context::{ImportBinding, ImportSource, TestCase};

    fn bundle_for(draft: &AtomDraft) -> ContextBundle {
        let mut bundle = ContextBundle {
            imports: draft
                .referenced
                .iter()
                .map(|symbol| ImportBinding {
                    symbol: symbol.clone(),
                    source: ImportSource::External(symbol.clone()),
                })
                .collect(),
            test_cases: vec![
                TestCase { name: "h".into(), body: "assert True".into(), is_boundary: false },
                TestCase { name: "b".into(), body: "assert True".into(), is_boundary: true },
            ],
            preconditions: vec!["input `x` is int".into()],
            postconditions: vec!["declares `f`".into()],
            ..Default::default()
        };
        bundle.score_completeness(false);
        bundle
    }

    fn atomic_draft() -> AtomDraft {
        AtomDraft {
            name: "f".into(),
            kind: AstNodeKind::Function,
            start_line: 1,
            end_line: 2,
            loc: 2,
            complexity: 1.0,
            declared: vec!["f".into()],
            declared_types: Vec::new(),
            referenced: vec!["x".into()],
            calls: Vec::new(),
            reducible: true,
            source_text: "def f(x):\n    return x + 1".into(),
        }
    }

    #[test]
    fn clean_draft_passes_all_criteria() {
        let config = DecomposeConfig::default();
        let parsers = ParserManager::new();
        let validator = AtomicityValidator::new(&config, &parsers);
        let draft = atomic_draft();
        let bundle = bundle_for(&draft);

        let report = validator.check(&draft, &bundle, &FxHashSet::default(), Language::Python);
        assert!(report.ok, "failures: {:?}", report.failures);
        assert!(report.score > 0.8);
    }

    #[test]
    fn oversized_draft_fails_loc_cap() {
        let config = DecomposeConfig::default();
        let parsers = ParserManager::new();
        let validator = AtomicityValidator::new(&config, &parsers);
        let mut draft = atomic_draft();
        draft.loc = 14;

        let report = validator.check(&draft, &bundle_for(&draft), &FxHashSet::default(), Language::Python);
        assert!(!report.ok);
        assert!(report.failures.iter().any(|f| f.criterion == "loc-cap"));
    }

    #[test]
    fn shared_declarations_are_flagged() {
        let config = DecomposeConfig::default();
        let parsers = ParserManager::new();
        let validator = AtomicityValidator::new(&config, &parsers);
        let draft = atomic_draft();
        let mut taken = FxHashSet::default();
        taken.insert("f".to_string());

        let report = validator.check(&draft, &bundle_for(&draft), &taken, Language::Python);
        assert!(report
            .failures
            .iter()
            .any(|f| f.criterion == "shared-declaration"));
    }

    #[test]
    fn placeholder_markers_are_flagged() {
        let config = DecomposeConfig::default();
        let parsers = ParserManager::new();
        let validator = AtomicityValidator::new(&config, &parsers);
        let mut draft = atomic_draft();
        draft.source_text = "def f(x):\n    # TODO finish\n    return x".into();

        let report = validator.check(&draft, &bundle_for(&draft), &FxHashSet::default(), Language::Python);
        assert!(report
            .failures
            .iter()
            .any(|f| f.criterion == "placeholder-markers"));
    }
}
