//! Dependency edges between atoms.

use serde::{Deserialize, Serialize};

use crate::types::identifiers::AtomId;

/// Kind of a dependency edge, in cycle-break priority order: when weights
/// tie, import outranks type outranks call outranks data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Import,
    Type,
    Call,
    Data,
}

impl EdgeKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Type => "type",
            Self::Call => "call",
            Self::Data => "data",
        }
    }

    /// Fixed edge weight per kind.
    pub fn weight(&self) -> f64 {
        match self {
            Self::Import => 1.0,
            Self::Type => 0.9,
            Self::Call => 0.8,
            Self::Data => 0.7,
        }
    }
}

/// A directed dependency, producer → consumer: `from` declares something
/// `to` needs, so `from` must be accepted before `to` can run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub from: AtomId,
    pub to: AtomId,
    pub kind: EdgeKind,
    /// Weight in (0, 1]; fixed per kind, kept on the edge because cycle
    /// breaking compares weights across kinds.
    pub weight: f64,
}

impl DependencyEdge {
    /// Build an edge with the kind's canonical weight. Self-loops are the
    /// analyzer's bug; they are dropped during normalization regardless.
    pub fn new(from: impl Into<AtomId>, to: impl Into<AtomId>, kind: EdgeKind) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind,
            weight: kind.weight(),
        }
    }

    /// Identity triple used for deduplication.
    pub fn key(&self) -> (&AtomId, &AtomId, EdgeKind) {
        (&self.from, &self.to, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_order_matches_break_priority() {
        assert!(EdgeKind::Import < EdgeKind::Type);
        assert!(EdgeKind::Type < EdgeKind::Call);
        assert!(EdgeKind::Call < EdgeKind::Data);
    }

    #[test]
    fn weights_are_fixed_per_kind() {
        assert_eq!(DependencyEdge::new("a", "b", EdgeKind::Data).weight, 0.7);
        assert_eq!(DependencyEdge::new("a", "b", EdgeKind::Import).weight, 1.0);
    }
}
