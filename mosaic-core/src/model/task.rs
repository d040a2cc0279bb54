//! Coarse tasks from the external planner, and the language tag shared by
//! tasks, atoms, and parser routing.

use serde::{Deserialize, Serialize};

use crate::types::identifiers::TaskId;

/// Target language of a task and its atoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    TypeScript,
    Rust,
}

impl Language {
    /// Lowercase display name, also the serde form.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::TypeScript => "typescript",
            Self::Rust => "rust",
        }
    }

    /// Parse a language tag as produced by the planner.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "python" | "py" => Some(Self::Python),
            "typescript" | "ts" => Some(Self::TypeScript),
            "rust" | "rs" => Some(Self::Rust),
            _ => None,
        }
    }
}

/// Per-task constraints from the planner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConstraints {
    /// Performance budget for the enclosing component, in milliseconds.
    pub performance_budget_ms: Option<u64>,
    /// Allowed dependency edge kinds; empty means all kinds allowed.
    pub allowed_dependency_kinds: Vec<String>,
}

/// A coarse coding task. Immutable after plan freeze.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub language: Language,
    /// Source-level description of what the task should implement.
    pub description: String,
    /// Target file path the task's atoms will be emitted into.
    pub target_path: String,
    /// Planner's estimate of the implementation size.
    pub estimated_loc: u32,
    /// Optional implementation scaffold to decompose. When absent the
    /// decomposer falls back to the closest retrieved pattern scaffold.
    #[serde(default)]
    pub scaffold: Option<String>,
    /// External modules the task states it depends on; reference
    /// resolution consults these after the plan's own atoms.
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub constraints: TaskConstraints,
}

impl Task {
    pub fn new(
        id: impl Into<TaskId>,
        language: Language,
        description: impl Into<String>,
        target_path: impl Into<String>,
        estimated_loc: u32,
    ) -> Self {
        Self {
            id: id.into(),
            language,
            description: description.into(),
            target_path: target_path.into(),
            estimated_loc,
            scaffold: None,
            dependencies: Vec::new(),
            constraints: TaskConstraints::default(),
        }
    }

    pub fn with_scaffold(mut self, scaffold: impl Into<String>) -> Self {
        self.scaffold = Some(scaffold.into());
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }
}
