//! Progress events emitted by the pipeline controller.

pub mod dispatcher;
pub mod handler;
pub mod types;

pub use dispatcher::EventDispatcher;
pub use handler::{BufferingEventHandler, PipelineEventHandler};
