//! Level 4 — system validation, once per plan: full-plan coverage,
//! acceptance criteria, and production-readiness checks.

use std::time::Instant;

use mosaic_core::model::atom::{AtomStatus, AtomicUnit};
use mosaic_core::model::validation::{
    CheckError, ValidationLevel, ValidationResult, ValidationResultBuilder, ValidationSubject,
};
use mosaic_core::types::identifiers::PlanId;

use super::ledger::EscalationLedger;
use super::ComponentMap;

/// Substrings that disqualify accepted code from shipping.
const SECRET_MARKERS: &[&str] = &[
    "BEGIN PRIVATE KEY",
    "BEGIN RSA PRIVATE KEY",
    "aws_secret_access_key",
    "api_key = \"",
    "password = \"",
];

/// Validates the whole plan after every wave has completed.
pub struct Level4Validator<'a> {
    component_map: &'a ComponentMap,
}

impl<'a> Level4Validator<'a> {
    pub fn new(component_map: &'a ComponentMap) -> Self {
        Self { component_map }
    }

    pub fn validate(
        &self,
        plan_id: &PlanId,
        atoms: &[AtomicUnit],
        ledger: &EscalationLedger,
    ) -> ValidationResult {
        let start = Instant::now();
        let mut builder = ValidationResultBuilder::new(
            ValidationSubject::Plan(plan_id.to_string()),
            ValidationLevel::System,
        );

        // System E2E: every mapped component holds a Level 3 pass.
        let mut e2e_errors = Vec::new();
        for component in &self.component_map.components {
            let subject = ValidationSubject::Component(component.name.clone());
            if !ledger.has_passed(&subject, ValidationLevel::Component) {
                e2e_errors.push(CheckError {
                    code: "SYSTEM_COMPONENT_NOT_VALIDATED".to_string(),
                    message: format!("component {} lacks a Level 3 pass", component.name),
                    source_atoms: Vec::new(),
                    span: None,
                });
            }
        }
        finish_check(&mut builder, "system-e2e", e2e_errors);

        // Acceptance: every atom reached a terminal accepted state.
        let unaccepted: Vec<CheckError> = atoms
            .iter()
            .filter(|atom| atom.status != AtomStatus::Accepted)
            .map(|atom| CheckError {
                code: "ACCEPTANCE_ATOM_NOT_ACCEPTED".to_string(),
                message: format!("{} ended in {}", atom.id, atom.status.name()),
                source_atoms: vec![atom.id.clone()],
                span: None,
            })
            .collect();
        finish_check(&mut builder, "acceptance-criteria", unaccepted);

        // Production readiness: artifacts exist and carry no secrets.
        let mut readiness_errors = Vec::new();
        for atom in atoms.iter().filter(|a| a.status == AtomStatus::Accepted) {
            match atom.code.as_deref() {
                None | Some("") => readiness_errors.push(CheckError {
                    code: "READINESS_MISSING_ARTIFACT".to_string(),
                    message: format!("{} accepted without code", atom.id),
                    source_atoms: vec![atom.id.clone()],
                    span: None,
                }),
                Some(code) => {
                    for marker in SECRET_MARKERS {
                        if code.contains(marker) {
                            readiness_errors.push(CheckError {
                                code: "READINESS_SECRET_MATERIAL".to_string(),
                                message: format!("{} contains `{marker}`", atom.id),
                                source_atoms: vec![atom.id.clone()],
                                span: None,
                            });
                        }
                    }
                }
            }
        }
        finish_check(&mut builder, "production-readiness", readiness_errors);

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
