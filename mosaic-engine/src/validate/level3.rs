//! Level 3 — component validation: end-to-end coverage, architecture
//! compliance (layering), and the declared performance budget.

use std::time::{Duration, Instant};

use mosaic_core::model::atom::AtomicUnit;
use mosaic_core::model::context::ImportSource;
use mosaic_core::model::validation::{
    CheckError, ValidationLevel, ValidationResult, ValidationResultBuilder, ValidationSubject,
};
use mosaic_core::types::identifiers::AtomId;

use super::ledger::EscalationLedger;
use super::{ComponentMap, ComponentSpec};

/// Validates one component (a cluster of modules per the host's map) once
/// all of its modules hold a Level 2 pass.
pub struct Level3Validator<'a> {
    component_map: &'a ComponentMap,
}

impl<'a> Level3Validator<'a> {
    pub fn new(component_map: &'a ComponentMap) -> Self {
        Self { component_map }
    }

    pub fn validate(
        &self,
        component: &ComponentSpec,
        plan_atoms: &[AtomicUnit],
        ledger: &EscalationLedger,
    ) -> ValidationResult {
        let start = Instant::now();
        let mut builder = ValidationResultBuilder::new(
            ValidationSubject::Component(component.name.clone()),
            ValidationLevel::Component,
        );

        let members: Vec<&AtomicUnit> = plan_atoms
            .iter()
            .filter(|atom| component.modules.iter().any(|m| *m == atom.target_path))
            .collect();

        // End-to-end: every member module holds a current Level 2 pass.
        let mut e2e_errors = Vec::new();
        for module in &component.modules {
            let subject = ValidationSubject::Module(module.clone());
            if !ledger.has_passed(&subject, ValidationLevel::Module) {
                e2e_errors.push(CheckError {
                    code: "E2E_MODULE_NOT_VALIDATED".to_string(),
                    message: format!("module {module} lacks a Level 2 pass"),
                    source_atoms: Vec::new(),
                    span: None,
                });
            }
        }
        finish_check(&mut builder, "component-e2e", e2e_errors);

        // Architecture: imports must respect the layer allowlist.
        let mut layering_errors = Vec::new();
        for atom in &members {
            for binding in &atom.context.imports {
                let ImportSource::Atom(owner) = &binding.source else {
                    continue;
                };
                let owner_id = AtomId::new(owner.clone());
                let Some(owner_atom) = plan_atoms.iter().find(|a| a.id == owner_id) else {
                    continue;
                };
                let Some(owner_component) =
                    self.component_map.component_of_module(&owner_atom.target_path)
                else {
                    continue;
                };
                if owner_component.name == component.name {
                    continue;
                }
                let allowed = component.allowed_layers.is_empty()
                    || owner_component
                        .layer
                        .as_ref()
                        .map(|layer| component.allowed_layers.contains(layer))
                        .unwrap_or(false);
                if !allowed {
                    layering_errors.push(CheckError {
                        code: "ARCH_LAYER_VIOLATION".to_string(),
                        message: format!(
                            "{} (layer {:?}) must not import from {} (layer {:?})",
                            component.name,
                            component.layer,
                            owner_component.name,
                            owner_component.layer
                        ),
                        source_atoms: vec![atom.id.clone()],
                        span: None,
                    });
                }
            }
        }
        finish_check(&mut builder, "architecture-compliance", layering_errors);

        // Performance: observed Level 1 validation cost against the
        // declared budget. A stand-in for host-measured runtime cost.
        let mut perf_errors = Vec::new();
        if let Some(budget_ms) = component.performance_budget_ms {
            let spent: Duration = ledger
                .snapshot()
                .iter()
                .filter(|result| result.level == ValidationLevel::Atomic)
                .filter(|result| match &result.subject {
                    ValidationSubject::Atom(id) => members.iter().any(|a| &a.id == id),
                    _ => false,
                })
                .map(|result| result.duration)
                .sum();
            if spent > Duration::from_millis(budget_ms) {
                perf_errors.push(CheckError {
                    code: "PERF_BUDGET_EXCEEDED".to_string(),
                    message: format!(
                        "validation spent {spent:?}, budget is {budget_ms} ms"
                    ),
                    source_atoms: Vec::new(),
                    span: None,
                });
            }
        }
        finish_check(&mut builder, "performance-budget", perf_errors);

        builder.finish(start.elapsed(), None)
    }
}

fn finish_check(builder: &mut ValidationResultBuilder, name: &str, errors: Vec<CheckError>) {
    if errors.is_empty() {
        builder.check_passed(name);
    } else {
        builder.check_failed_many(name, errors);
    }
}
