//! Hierarchical validation: one interface, four escalating levels.
//!
//! Level k runs only when level k−1 passed for the relevant subject, and a
//! level-k failure invalidates recorded passes above k. Validators never
//! raise on code-under-test failures; only validator malfunction surfaces
//! as an error.

pub mod ledger;
pub mod level1;
pub mod level2;
pub mod level3;
pub mod level4;
pub mod toolchain;

pub use ledger::EscalationLedger;
pub use level1::Level1Validator;
pub use level2::Level2Validator;
pub use level3::Level3Validator;
pub use level4::Level4Validator;
pub use toolchain::{CheckOutcome, LanguageToolchain, StructuralToolchain, ToolchainRegistry};

use serde::{Deserialize, Serialize};

/// One architectural component: a named cluster of modules.
///
/// The grouping is supplied by the host as plain data; the engine never
/// infers it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentSpec {
    pub name: String,
    /// Module paths (atom target paths) belonging to the component.
    pub modules: Vec<String>,
    /// Architectural layer, e.g. `domain` or `transport`.
    #[serde(default)]
    pub layer: Option<String>,
    /// Layers this component may import from; empty means any.
    #[serde(default)]
    pub allowed_layers: Vec<String>,
    /// Performance budget for the component, in milliseconds.
    #[serde(default)]
    pub performance_budget_ms: Option<u64>,
    /// Module paths whose declared purpose is internal: their atoms must
    /// not import from outside the module.
    #[serde(default)]
    pub internal_modules: Vec<String>,
}

/// The host-supplied module → component mapping consumed by Level 3.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentMap {
    pub components: Vec<ComponentSpec>,
}

impl ComponentMap {
    pub fn new(components: Vec<ComponentSpec>) -> Self {
        Self { components }
    }

    /// Component owning a module path, if mapped.
    pub fn component_of_module(&self, module_path: &str) -> Option<&ComponentSpec> {
        self.components
            .iter()
            .find(|c| c.modules.iter().any(|m| m == module_path))
    }

    pub fn component_named(&self, name: &str) -> Option<&ComponentSpec> {
        self.components.iter().find(|c| c.name == name)
    }

    /// True when the module is declared internal by its component.
    pub fn is_internal_module(&self, module_path: &str) -> bool {
        self.components
            .iter()
            .any(|c| c.internal_modules.iter().any(|m| m == module_path))
    }
}
