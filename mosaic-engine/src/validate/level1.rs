//! Level 1 — atomic validation: syntax, types, unit tests, atomicity.
//!
//! Checks run in order and stop at the first failing group so feedback
//! points at the earliest broken layer.

use std::sync::Arc;
use std::time::Instant;

use mosaic_analysis::parsers::hash_content;
use mosaic_core::config::{DecomposeConfig, ValidationConfig};
use mosaic_core::errors::ValidateError;
use mosaic_core::model::atom::AtomicUnit;
use mosaic_core::model::validation::{
    CheckError, ValidationLevel, ValidationResult, ValidationResultBuilder, ValidationSubject,
};

use super::toolchain::ToolchainRegistry;

const PLACEHOLDER_MARKERS: &[&str] = &["TODO", "FIXME", "XXX", "unimplemented!", "todo!"];

/// Validates freshly produced code for one atom.
pub struct Level1Validator {
    toolchains: Arc<ToolchainRegistry>,
    validation: ValidationConfig,
    decompose: DecomposeConfig,
}

impl Level1Validator {
    pub fn new(
        toolchains: Arc<ToolchainRegistry>,
        validation: ValidationConfig,
        decompose: DecomposeConfig,
    ) -> Self {
        Self {
            toolchains,
            validation,
            decompose,
        }
    }

    /// Run Level 1 for an atom's candidate code.
    ///
    /// `Err` means the validator itself malfunctioned (level-error); code
    /// failures come back as `Ok` with `passed = false`.
    pub async fn validate(
        &self,
        atom: &AtomicUnit,
        code: &str,
    ) -> Result<ValidationResult, ValidateError> {
        let timeout = self.validation.effective_level1_timeout();
        match tokio::time::timeout(timeout, self.validate_inner(atom, code)).await {
            Ok(result) => result,
            Err(_) => Err(ValidateError::Timeout { timeout }),
        }
    }

    async fn validate_inner(
        &self,
        atom: &AtomicUnit,
        code: &str,
    ) -> Result<ValidationResult, ValidateError> {
        let start = Instant::now();
        let toolchain = self.toolchains.get(atom.language)?;
        let mut builder = ValidationResultBuilder::new(
            ValidationSubject::Atom(atom.id.clone()),
            ValidationLevel::Atomic,
        );

        let syntax = toolchain.parse(code).await?;
        record(&mut builder, "syntax", syntax, atom);

        if !builder.has_failures() {
            let types = toolchain.typecheck(code, &atom.context).await?;
            record(&mut builder, "types", types, atom);
        }

        if !builder.has_failures() {
            let tests = toolchain.run_tests(code, &atom.context.test_cases).await?;
            record(&mut builder, "unit-tests", tests, atom);
        }

        if !builder.has_failures() {
            let atomicity = self.check_atomicity(atom, code);
            record(&mut builder, "atomicity", atomicity, atom);
        }

        Ok(builder.finish(start.elapsed(), Some(hash_content(code.as_bytes()))))
    }

    /// Re-check the shape criteria on the produced code: LOC cap and the
    /// absence of placeholder markers.
    fn check_atomicity(&self, atom: &AtomicUnit, code: &str) -> super::toolchain::CheckOutcome {
        use super::toolchain::CheckOutcome;

        let cap = atom.loc_cap(
            self.decompose.effective_loc_cap(),
            self.decompose.effective_irreducible_loc_cap(),
        );
        let loc = code.lines().filter(|line| !line.trim().is_empty()).count() as u32;

        let mut errors = Vec::new();
        if loc > cap {
            errors.push(CheckError {
                code: "ATOMICITY_LOC_EXCEEDED".to_string(),
                message: format!("produced {loc} LOC, cap is {cap}"),
                source_atoms: vec![atom.id.clone()],
                span: None,
            });
        }
        for marker in PLACEHOLDER_MARKERS {
            if code.contains(marker) {
                errors.push(CheckError {
                    code: "ATOMICITY_PLACEHOLDER".to_string(),
                    message: format!("placeholder marker `{marker}` present"),
                    source_atoms: vec![atom.id.clone()],
                    span: None,
                });
            }
        }

        if errors.is_empty() {
            CheckOutcome::pass()
        } else {
            CheckOutcome::fail(errors)
        }
    }
}

fn record(
    builder: &mut ValidationResultBuilder,
    check: &str,
    outcome: super::toolchain::CheckOutcome,
    atom: &AtomicUnit,
) {
    if outcome.passed {
        builder.check_passed(check);
        return;
    }
    // Attribute errors to the atom under validation unless the toolchain
    // already named sources.
    let mut errors: Vec<CheckError> = outcome.errors;
    for error in &mut errors {
        if error.source_atoms.is_empty() {
            error.source_atoms = vec![atom.id.clone()];
        }
    }
    if errors.is_empty() {
        errors.push(CheckError {
            code: "CHECK_FAILED".to_string(),
            message: format!("{check} failed"),
            source_atoms: vec![atom.id.clone()],
            span: None,
        });
    }
    builder.check_failed_many(check, errors);
}
