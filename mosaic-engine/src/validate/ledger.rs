//! Escalation ledger: retained validation results plus the pass/fail state
//! driving level escalation and invalidation.

use std::sync::Mutex;

use mosaic_core::model::validation::{ValidationLevel, ValidationResult, ValidationSubject};
use mosaic_core::types::identifiers::{AtomId, PlanId};
use mosaic_core::FxHashMap;

/// Subject containment for invalidation: atom → module → component → plan.
#[derive(Debug, Clone, Default)]
pub struct SubjectHierarchy {
    pub module_of_atom: FxHashMap<AtomId, String>,
    pub component_of_module: FxHashMap<String, String>,
    pub plan_id: Option<PlanId>,
}

impl SubjectHierarchy {
    /// Subjects at levels strictly above the given subject's own level.
    fn enclosing(&self, subject: &ValidationSubject) -> Vec<(String, ValidationLevel)> {
        let mut out = Vec::new();
        let plan_label = self
            .plan_id
            .as_ref()
            .map(|id| ValidationSubject::Plan(id.to_string()).label());

        match subject {
            ValidationSubject::Atom(atom) => {
                if let Some(module) = self.module_of_atom.get(atom) {
                    out.push((
                        ValidationSubject::Module(module.clone()).label(),
                        ValidationLevel::Module,
                    ));
                    if let Some(component) = self.component_of_module.get(module) {
                        out.push((
                            ValidationSubject::Component(component.clone()).label(),
                            ValidationLevel::Component,
                        ));
                    }
                }
            }
            ValidationSubject::Module(module) => {
                if let Some(component) = self.component_of_module.get(module) {
                    out.push((
                        ValidationSubject::Component(component.clone()).label(),
                        ValidationLevel::Component,
                    ));
                }
            }
            ValidationSubject::Component(_) => {}
            ValidationSubject::Plan(_) => return out,
        }
        if let Some(label) = plan_label {
            out.push((label, ValidationLevel::System));
        }
        out
    }
}

/// Append-only result log plus the current pass map. Concurrent appends
/// are safe; readers take snapshots.
#[derive(Default)]
pub struct EscalationLedger {
    results: Mutex<Vec<ValidationResult>>,
    passed: Mutex<FxHashMap<(String, ValidationLevel), bool>>,
}

impl EscalationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a result. A failure at level k clears recorded passes at
    /// levels above k for every enclosing subject.
    pub fn record(&self, result: &ValidationResult, hierarchy: &SubjectHierarchy) {
        let label = result.subject.label();

        if let Ok(mut results) = self.results.lock() {
            results.push(result.clone());
        }
        if let Ok(mut passed) = self.passed.lock() {
            passed.insert((label, result.level), result.passed);

            if !result.passed {
                for (enclosing_label, enclosing_level) in hierarchy.enclosing(&result.subject) {
                    if passed.remove(&(enclosing_label.clone(), enclosing_level)).is_some() {
                        tracing::debug!(
                            subject = %enclosing_label,
                            level = enclosing_level.number(),
                            "pass invalidated by lower-level failure"
                        );
                    }
                }
            }
        }
    }

    /// Whether the subject currently holds a pass at the level.
    pub fn has_passed(&self, subject: &ValidationSubject, level: ValidationLevel) -> bool {
        self.passed
            .lock()
            .map(|passed| passed.get(&(subject.label(), level)).copied().unwrap_or(false))
            .unwrap_or(false)
    }

    /// 1-based attempt number for the next run of (subject, level).
    pub fn next_attempt(&self, subject: &ValidationSubject, level: ValidationLevel) -> u8 {
        let label = subject.label();
        self.results
            .lock()
            .map(|results| {
                results
                    .iter()
                    .filter(|r| r.level == level && r.subject.label() == label)
                    .count() as u8
                    + 1
            })
            .unwrap_or(1)
    }

    /// Most recent result for an atom subject, if any.
    pub fn last_for_atom(&self, atom: &AtomId) -> Option<ValidationResult> {
        let label = ValidationSubject::Atom(atom.clone()).label();
        self.results
            .lock()
            .ok()?
            .iter()
            .rev()
            .find(|r| r.subject.label() == label)
            .cloned()
    }

    pub fn snapshot(&self) -> Vec<ValidationResult> {
        self.results
            .lock()
            .map(|results| results.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use mosaic_core::model::validation::ValidationResultBuilder;

    fn passing(subject: ValidationSubject, level: ValidationLevel) -> ValidationResult {
        let mut builder = ValidationResultBuilder::new(subject, level);
        builder.check_passed("x");
        builder.finish(Duration::ZERO, None)
    }

    fn failing(subject: ValidationSubject, level: ValidationLevel) -> ValidationResult {
        let mut builder = ValidationResultBuilder::new(subject, level);
        builder.check_failed(
            "x",
            mosaic_core::model::validation::CheckError {
                code: "X".into(),
                message: "failed".into(),
                source_atoms: Vec::new(),
                span: None,
            },
        );
        builder.finish(Duration::ZERO, None)
    }

    #[test]
    fn lower_level_failure_invalidates_enclosing_passes() {
        let ledger = EscalationLedger::new();
        let mut hierarchy = SubjectHierarchy::default();
        hierarchy
            .module_of_atom
            .insert(AtomId::from("a1"), "src/auth.py".to_string());
        hierarchy
            .component_of_module
            .insert("src/auth.py".to_string(), "auth".to_string());
        hierarchy.plan_id = Some(PlanId::from("p1"));

        let module = ValidationSubject::Module("src/auth.py".to_string());
        ledger.record(&passing(module.clone(), ValidationLevel::Module), &hierarchy);
        assert!(ledger.has_passed(&module, ValidationLevel::Module));

        let atom = ValidationSubject::Atom(AtomId::from("a1"));
        ledger.record(&failing(atom, ValidationLevel::Atomic), &hierarchy);
        assert!(!ledger.has_passed(&module, ValidationLevel::Module));
    }

    #[test]
    fn attempt_numbers_increase_per_subject_and_level() {
        let ledger = EscalationLedger::new();
        let hierarchy = SubjectHierarchy::default();
        let atom = ValidationSubject::Atom(AtomId::from("a1"));

        assert_eq!(ledger.next_attempt(&atom, ValidationLevel::Atomic), 1);
        ledger.record(&failing(atom.clone(), ValidationLevel::Atomic), &hierarchy);
        assert_eq!(ledger.next_attempt(&atom, ValidationLevel::Atomic), 2);
    }
}
