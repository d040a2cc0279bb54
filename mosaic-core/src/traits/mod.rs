//! Collaborator seams: pattern retrieval/feedback, artifact sink, and the
//! optional persistence contract. All have no-op or in-memory defaults so
//! the core runs standalone.

pub mod patterns;
pub mod sink;
pub mod store;

pub use patterns::{NoOpPatternFeedback, NoOpPatternRetriever, PatternFeedback, PatternRetriever, PatternSnippet};
pub use sink::{ArtifactSink, CollectingSink, EmittedArtifact};
pub use store::{MemoryPlanStore, PlanStore};
