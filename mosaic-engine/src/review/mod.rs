//! Human review: the priority queue of low-confidence atoms and the AI
//! hint composer.

pub mod hints;
pub mod queue;

pub use queue::{ReviewCommand, ReviewQueue};
