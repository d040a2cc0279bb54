//! Confidence scoring: `0.4·v + 0.3·a + 0.2·c + 0.1·i`, clamped to [0, 1].

use mosaic_core::config::ReviewConfig;

/// Highest integration level the atom's surroundings have passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationSignal {
    /// No higher-level validation has run yet.
    None,
    /// The enclosing module passed Level 2.
    ModulePassed,
    /// The enclosing component passed Level 3.
    ComponentPassed,
}

impl IntegrationSignal {
    fn factor(self) -> f64 {
        match self {
            Self::None => 0.0,
            Self::ModulePassed => 0.5,
            Self::ComponentPassed => 1.0,
        }
    }
}

/// Pure confidence scorer; recomputed whenever higher-level outcomes land.
#[derive(Debug, Clone)]
pub struct ConfidenceScorer {
    threshold: f64,
    complexity_cap: f64,
}

impl ConfidenceScorer {
    pub fn new(review: &ReviewConfig, complexity_cap: f64) -> Self {
        Self {
            threshold: review.effective_confidence_threshold(),
            complexity_cap,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Score one atom from its validation outcome, attempts used,
    /// complexity, and integration signal.
    pub fn score(
        &self,
        level1_passed: bool,
        attempts: u8,
        complexity: f64,
        integration: IntegrationSignal,
    ) -> f64 {
        let v = if level1_passed { 1.0 } else { 0.0 };
        let a = attempt_factor(attempts);
        let c = (1.0 - complexity / self.complexity_cap).max(0.0);
        let i = integration.factor();
        (0.4 * v + 0.3 * a + 0.2 * c + 0.1 * i).clamp(0.0, 1.0)
    }

    /// Whether the score routes the atom to human review.
    pub fn needs_review(&self, confidence: f64) -> bool {
        confidence < self.threshold
    }
}

/// 1.0 for first-attempt success, 0.67 for second, 0.33 for third.
fn attempt_factor(attempts: u8) -> f64 {
    match attempts {
        0 | 1 => 1.0,
        2 => 0.67,
        _ => 0.33,
    }
}
