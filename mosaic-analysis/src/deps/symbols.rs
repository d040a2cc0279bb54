//! Symbol index: declared names → declaring atom, across one plan.

use mosaic_core::types::identifiers::AtomId;
use mosaic_core::FxHashMap;

use crate::decompose::decomposer::AtomAnalysis;

/// Lookup tables for dependency resolution. First declarer in atom-id
/// order wins on conflicts; the conflict is logged.
pub struct SymbolIndex {
    values: FxHashMap<String, AtomId>,
    types: FxHashMap<String, AtomId>,
}

impl SymbolIndex {
    /// Build the index from the analyses of every atom in the plan.
    /// `analyses` iteration order does not matter; ties resolve by atom id.
    pub fn build(analyses: &FxHashMap<AtomId, AtomAnalysis>) -> Self {
        let mut ordered: Vec<(&AtomId, &AtomAnalysis)> = analyses.iter().collect();
        ordered.sort_by(|a, b| a.0.cmp(b.0));

        let mut values: FxHashMap<String, AtomId> = FxHashMap::default();
        let mut types: FxHashMap<String, AtomId> = FxHashMap::default();

        for (atom_id, analysis) in ordered {
            for symbol in &analysis.declared {
                if let Some(existing) = values.get(symbol) {
                    if existing != atom_id {
                        tracing::debug!(
                            symbol = %symbol,
                            first = %existing,
                            duplicate = %atom_id,
                            "duplicate declaration, first declarer wins"
                        );
                    }
                    continue;
                }
                values.insert(symbol.clone(), atom_id.clone());
            }
            for type_name in &analysis.declared_types {
                types.entry(type_name.clone()).or_insert_with(|| atom_id.clone());
            }
        }

        Self { values, types }
    }

    /// Atom declaring a value symbol.
    pub fn declarer_of(&self, symbol: &str) -> Option<&AtomId> {
        self.values.get(symbol)
    }

    /// Atom holding the authoritative definition of a type.
    pub fn type_declarer_of(&self, type_name: &str) -> Option<&AtomId> {
        self.types.get(type_name)
    }

    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}
