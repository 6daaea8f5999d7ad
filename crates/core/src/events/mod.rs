//! Push-only pipeline event stream.
//!
//! Components never pull state from each other; they publish typed events
//! through an [`EventHandle`] and whoever cares (a UI transport, a test
//! harness) subscribes. Emission never blocks and never fails the emitter:
//! with no subscribers the event is simply dropped.

mod handle;
mod types;

pub use handle::{EventEnvelope, EventHandle};
pub use types::{LogLevel, PipelineEvent};
