//! Context bundles: everything an atom needs to be generated and tested in
//! isolation.

use serde::{Deserialize, Serialize};

/// An import the atom needs, resolved against upstream atoms or the task's
/// stated dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportBinding {
    /// Symbol name as referenced by the atom.
    pub symbol: String,
    /// Where the symbol comes from: an upstream atom id or an external
    /// module path from the task's dependency list.
    pub source: ImportSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "value")]
pub enum ImportSource {
    /// Declared by another atom in the same plan.
    Atom(String),
    /// External module stated by the task.
    External(String),
}

/// Inferred type schema for one input or output symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSchema {
    pub symbol: String,
    /// Language-level type expression, e.g. `list[int]` or `Vec<u32>`.
    pub type_expr: String,
    /// True for the atom's outputs, false for inputs.
    pub is_output: bool,
}

/// One generated test case, derived from the atom's postconditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    /// Source of the test in the atom's language.
    pub body: String,
    /// Boundary tests probe edge values; every atom carries at least one
    /// happy-path and one boundary case.
    pub is_boundary: bool,
}

/// The complete, code-adjacent context an atom carries.
///
/// Referenced by the executor, never copied; contents derive only from
/// upstream atoms and the task spec.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextBundle {
    pub imports: Vec<ImportBinding>,
    pub types: Vec<TypeSchema>,
    pub preconditions: Vec<String>,
    pub postconditions: Vec<String>,
    pub test_cases: Vec<TestCase>,
    /// Fraction of expected fields populated; acceptance requires ≥ 0.95.
    pub completeness: f64,
}

impl ContextBundle {
    /// Recompute the completeness score: the fraction of expected field
    /// groups that are populated.
    ///
    /// Imports are only expected when the atom consumes inputs; pre- and
    /// postconditions only when the behavior is non-trivial; tests always.
    pub fn score_completeness(&mut self, trivial: bool) {
        let mut expected = 0usize;
        let mut populated = 0usize;

        let has_inputs = self.types.iter().any(|schema| !schema.is_output);
        if has_inputs {
            expected += 1;
            if !self.imports.is_empty() {
                populated += 1;
            }
        }
        if has_inputs || !self.types.is_empty() {
            expected += 1;
            if !self.types.is_empty() {
                populated += 1;
            }
        }
        if !trivial {
            expected += 2;
            if !self.preconditions.is_empty() {
                populated += 1;
            }
            if !self.postconditions.is_empty() {
                populated += 1;
            }
        }
        expected += 1;
        if self.has_happy_and_boundary_tests() {
            populated += 1;
        }

        self.completeness = if expected == 0 {
            1.0
        } else {
            populated as f64 / expected as f64
        };
    }

    /// True when at least one happy-path and one boundary test are present.
    pub fn has_happy_and_boundary_tests(&self) -> bool {
        self.test_cases.iter().any(|t| !t.is_boundary)
            && self.test_cases.iter().any(|t| t.is_boundary)
    }

    /// Symbols this bundle can resolve (all import bindings).
    pub fn resolvable_symbols(&self) -> impl Iterator<Item = &str> {
        self.imports.iter().map(|i| i.symbol.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_bundle() -> ContextBundle {
        ContextBundle {
            imports: vec![ImportBinding {
                symbol: "parse".into(),
                source: ImportSource::Atom("a1".into()),
            }],
            types: vec![TypeSchema {
                symbol: "x".into(),
                type_expr: "int".into(),
                is_output: false,
            }],
            preconditions: vec!["x >= 0".into()],
            postconditions: vec!["result > x".into()],
            test_cases: vec![
                TestCase { name: "happy".into(), body: "assert f(1) == 2".into(), is_boundary: false },
                TestCase { name: "boundary".into(), body: "assert f(0) == 1".into(), is_boundary: true },
            ],
            completeness: 0.0,
        }
    }

    #[test]
    fn fully_populated_bundle_scores_one() {
        let mut bundle = full_bundle();
        bundle.score_completeness(false);
        assert_eq!(bundle.completeness, 1.0);
    }

    #[test]
    fn missing_conditions_lower_the_score() {
        let mut bundle = full_bundle();
        bundle.preconditions.clear();
        bundle.postconditions.clear();
        bundle.score_completeness(false);
        assert!(bundle.completeness < 0.95);
    }

    #[test]
    fn trivial_atoms_do_not_expect_conditions() {
        let mut bundle = full_bundle();
        bundle.preconditions.clear();
        bundle.postconditions.clear();
        bundle.score_completeness(true);
        assert_eq!(bundle.completeness, 1.0);
    }

    #[test]
    fn single_test_kind_is_incomplete() {
        let mut bundle = full_bundle();
        bundle.test_cases.retain(|t| !t.is_boundary);
        assert!(!bundle.has_happy_and_boundary_tests());
    }
}
