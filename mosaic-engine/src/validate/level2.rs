//! Level 2 — module validation: cross-atom integration, signature
//! consistency, and internal cohesion for the cluster of atoms sharing a
//! target path.

use std::time::Instant;

use mosaic_core::model::atom::AtomicUnit;
use mosaic_core::model::context::ImportSource;
use mosaic_core::model::validation::{
    CheckError, ValidationLevel, ValidationResult, ValidationResultBuilder, ValidationSubject,
};
use mosaic_core::types::identifiers::AtomId;
use mosaic_core::FxHashSet;

use super::ComponentMap;

/// Validates one module (a cluster of atoms sharing a target path) once
/// all of its atoms are accepted.
pub struct Level2Validator<'a> {
    component_map: &'a ComponentMap,
}

impl<'a> Level2Validator<'a> {
    pub fn new(component_map: &'a ComponentMap) -> Self {
        Self { component_map }
    }

    /// `atoms` are the accepted members of the module, code present.
    /// `plan_atoms` is every atom of the plan, for resolving cross-module
    /// references.
    pub fn validate(
        &self,
        module_path: &str,
        atoms: &[&AtomicUnit],
        plan_atoms: &[AtomicUnit],
    ) -> ValidationResult {
        let start = Instant::now();
        let mut builder = ValidationResultBuilder::new(
            ValidationSubject::Module(module_path.to_string()),
            ValidationLevel::Module,
        );

        let member_ids: FxHashSet<&AtomId> = atoms.iter().map(|a| &a.id).collect();
        let combined_code: String = atoms
            .iter()
            .filter_map(|a| a.code.as_deref())
            .collect::<Vec<_>>()
            .join("\n");

        // Integration: every cross-atom import binding within the module
        // resolves to code that actually declares the symbol.
        let mut integration_errors = Vec::new();
        for atom in atoms {
            for binding in &atom.context.imports {
                let ImportSource::Atom(owner) = &binding.source else {
                    continue;
                };
                let owner_id = AtomId::new(owner.clone());
                let Some(owner_atom) = plan_atoms.iter().find(|a| a.id == owner_id) else {
                    continue;
                };
                let declares = owner_atom
                    .code
                    .as_deref()
                    .map(|code| code.contains(binding.symbol.as_str()))
                    .unwrap_or(false);
                if !declares {
                    integration_errors.push(CheckError {
                        code: "INTEGRATION_MISSING_PROVIDER".to_string(),
                        message: format!(
                            "`{}` imported from {owner_id} is not present in its code",
                            binding.symbol
                        ),
                        source_atoms: vec![atom.id.clone(), owner_id.clone()],
                        span: None,
                    });
                }
            }
        }
        finish_check(&mut builder, "integration-tests", integration_errors);

        // Signature consistency: every symbol a member atom exports to a
        // sibling appears in the combined module code.
        let mut signature_errors = Vec::new();
        for atom in atoms {
            for binding in &atom.context.imports {
                let ImportSource::Atom(owner) = &binding.source else {
                    continue;
                };
                if member_ids.contains(&AtomId::new(owner.clone()))
                    && !combined_code.contains(binding.symbol.as_str())
                {
                    signature_errors.push(CheckError {
                        code: "SIGNATURE_UNRESOLVED_CALL".to_string(),
                        message: format!(
                            "cross-atom reference `{}` does not resolve inside the module",
                            binding.symbol
                        ),
                        source_atoms: vec![atom.id.clone()],
                        span: None,
                    });
                }
            }
        }
        finish_check(&mut builder, "signature-consistency", signature_errors);

        // Cohesion: internal modules must not import atoms outside
        // themselves.
        let mut cohesion_errors = Vec::new();
        if self.component_map.is_internal_module(module_path) {
            for atom in atoms {
                for binding in &atom.context.imports {
                    let ImportSource::Atom(owner) = &binding.source else {
                        continue;
                    };
                    if !member_ids.contains(&AtomId::new(owner.clone())) {
                        cohesion_errors.push(CheckError {
                            code: "COHESION_EXTERNAL_IMPORT".to_string(),
                            message: format!(
                                "internal module imports `{}` from outside ({owner})",
                                binding.symbol
                            ),
                            source_atoms: vec![atom.id.clone()],
                            span: None,
                        });
                    }
                }
            }
        }
        finish_check(&mut builder, "internal-cohesion", cohesion_errors);

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
