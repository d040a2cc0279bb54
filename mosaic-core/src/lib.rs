//! # mosaic-core
//!
//! Foundation crate for the Mosaic generation pipeline.
//! Defines the domain model, identifiers, config, errors, events, and the
//! collaborator traits (oracle-adjacent seams, pattern retrieval, sinks,
//! optional persistence). Every other crate in the workspace depends on this.

pub mod config;
pub mod errors;
pub mod events;
pub mod logging;
pub mod model;
pub mod traits;
pub mod types;

// Re-export the most commonly used types at the crate root.
pub use config::MosaicConfig;
pub use errors::error_code::MosaicErrorCode;
pub use events::dispatcher::EventDispatcher;
pub use events::handler::PipelineEventHandler;
pub use model::atom::{AtomStatus, AtomicUnit};
pub use model::task::{Language, Task};
pub use types::collections::{FxHashMap, FxHashSet};
pub use types::identifiers::{AtomId, PlanId, TaskId};
