//! Wave execution: the shared atom store with CAS status transitions and
//! the bounded, cancellable wave executor.

pub mod cancel;
pub mod store;
pub mod wave;

pub use cancel::OrCancelExt;
pub use store::AtomStore;
pub use wave::{WaveExecutor, WaveOutcome};
