//! Validation results across the four hierarchical levels.
//!
//! Validators never raise on code-under-test failures; a failing check is
//! data (`passed = false`), and only validator malfunction surfaces as a
//! level error.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::identifiers::AtomId;

/// The four escalating validation scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ValidationLevel {
    /// Per atom: syntax, types, unit tests, atomicity.
    Atomic,
    /// Per module: integration, signature consistency, cohesion.
    Module,
    /// Per component: end-to-end, layering, performance budget.
    Component,
    /// Once per plan: system E2E, acceptance, production readiness.
    System,
}

impl ValidationLevel {
    pub fn number(&self) -> u8 {
        match self {
            Self::Atomic => 1,
            Self::Module => 2,
            Self::Component => 3,
            Self::System => 4,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Atomic),
            2 => Some(Self::Module),
            3 => Some(Self::Component),
            4 => Some(Self::System),
            _ => None,
        }
    }
}

/// What a validation run was applied to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "name")]
pub enum ValidationSubject {
    Atom(AtomId),
    /// Module = target path shared by a cluster of atoms.
    Module(String),
    /// Component = named cluster of modules from the host's component map.
    Component(String),
    Plan(String),
}

impl ValidationSubject {
    pub fn label(&self) -> String {
        match self {
            Self::Atom(id) => format!("atom:{id}"),
            Self::Module(path) => format!("module:{path}"),
            Self::Component(name) => format!("component:{name}"),
            Self::Plan(id) => format!("plan:{id}"),
        }
    }
}

/// Source span of a structured error, 1-based lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start_line: u32,
    pub end_line: u32,
}

/// One structured error from a failed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckError {
    /// Stable machine code, e.g. `SYNTAX_PARSE_FAILED`.
    pub code: String,
    pub message: String,
    /// Atoms implicated by the failure; one for Level 1, possibly several
    /// for cross-atom checks.
    pub source_atoms: Vec<AtomId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
}

/// Result of one validation run for one subject at one level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub subject: ValidationSubject,
    pub level: ValidationLevel,
    pub passed: bool,
    /// Names of the checks that ran.
    pub checks_run: Vec<String>,
    pub checks_passed: u32,
    pub checks_failed: u32,
    pub errors: Vec<CheckError>,
    pub duration: Duration,
    /// Code under validation at the time of the run (Level 1 only); retained
    /// so acceptance can be tied to the exact validated text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_hash: Option<u64>,
}

impl ValidationResult {
    /// Counts must partition the set of checks run.
    pub fn counts_consistent(&self) -> bool {
        (self.checks_passed + self.checks_failed) as usize == self.checks_run.len()
    }

    /// Short failure summary for feedback prompts and review hints.
    pub fn failure_summary(&self) -> String {
        if self.passed {
            return String::from("all checks passed");
        }
        let mut parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| match e.span {
                Some(span) => format!("{} at lines {}-{}: {}", e.code, span.start_line, span.end_line, e.message),
                None => format!("{}: {}", e.code, e.message),
            })
            .collect();
        if parts.is_empty() {
            parts.push(format!("{} of {} checks failed", self.checks_failed, self.checks_run.len()));
        }
        parts.join("; ")
    }
}

/// Accumulates check outcomes and produces a consistent result.
#[derive(Debug)]
pub struct ValidationResultBuilder {
    subject: ValidationSubject,
    level: ValidationLevel,
    checks_run: Vec<String>,
    checks_passed: u32,
    checks_failed: u32,
    errors: Vec<CheckError>,
}

impl ValidationResultBuilder {
    pub fn new(subject: ValidationSubject, level: ValidationLevel) -> Self {
        Self {
            subject,
            level,
            checks_run: Vec::new(),
            checks_passed: 0,
            checks_failed: 0,
            errors: Vec::new(),
        }
    }

    pub fn check_passed(&mut self, name: impl Into<String>) {
        self.checks_run.push(name.into());
        self.checks_passed += 1;
    }

    pub fn check_failed(&mut self, name: impl Into<String>, error: CheckError) {
        self.check_failed_many(name, vec![error]);
    }

    /// One failed check carrying several structured errors.
    pub fn check_failed_many(&mut self, name: impl Into<String>, errors: Vec<CheckError>) {
        self.checks_run.push(name.into());
        self.checks_failed += 1;
        self.errors.extend(errors);
    }

    pub fn has_failures(&self) -> bool {
        self.checks_failed > 0
    }

    pub fn finish(self, duration: Duration, code_hash: Option<u64>) -> ValidationResult {
        ValidationResult {
            subject: self.subject,
            level: self.level,
            passed: self.checks_failed == 0,
            checks_run: self.checks_run,
            checks_passed: self.checks_passed,
            checks_failed: self.checks_failed,
            errors: self.errors,
            duration,
            code_hash,
        }
    }
}
