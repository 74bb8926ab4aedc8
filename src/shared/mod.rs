//! Shared state and messaging between the UI thread and the worker
//!
//! The worker only ever sends owned outcomes back; the UI thread is the
//! single writer of the display state.

pub mod messages;
pub mod state;

pub use messages::{ClassifyOutcome, ClassifyRequest, ToWorker};
pub use state::{DisplayResult, DisplayState, Phase, Previews};
