//! Batch orchestration of the full pipeline.
//!
//! The [`Generator`] repeatedly captures samples, extracts raw bits and
//! mixes them until the mixed stream holds at least `target_bits` bits,
//! then persists the raw and mixed streams and whitens the persisted
//! mixed bytes down to exactly `target_bits` bits.
//!
//! ```text
//! source → extract → mix ─┐ (repeat until target)
//!                         ↓
//!            save raw, save mixed → whiten → save whitened
//! ```

mod observer;
mod orchestrator;
mod report;

pub use observer::{NullObserver, PipelineObserver, TracingObserver};
pub use orchestrator::{Generator, GeneratorError, RunOutput, MIX_INPUT_FACTOR, OVERSAMPLING};
pub use report::{BatchReport, RunReport};
