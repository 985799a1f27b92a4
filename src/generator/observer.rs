//! Progress reporting hooks for the orchestrator.

use super::report::{BatchReport, RunReport};
use crate::config::GeneratorConfig;

/// Receives orchestrator events.
///
/// All methods default to no-ops so observers only implement what they
/// care about.
pub trait PipelineObserver {
    /// Called once before the first batch.
    fn on_start(&mut self, _config: &GeneratorConfig) {}

    /// Called after every batch, including ones that produced nothing.
    fn on_batch(&mut self, _batch: &BatchReport, _target_bits: usize) {}

    /// Called once after all artifacts are written.
    fn on_complete(&mut self, _report: &RunReport) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl PipelineObserver for NullObserver {}

/// Observer that logs progress through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_start(&mut self, config: &GeneratorConfig) {
        tracing::info!(
            target_bits = config.target_bits,
            batch_size = config.batch_size,
            mixer = config.mixer.as_str(),
            extraction = %config.extraction,
            "Starting generation"
        );
    }

    fn on_batch(&mut self, batch: &BatchReport, target_bits: usize) {
        if batch.chunks_dropped > 0 {
            tracing::warn!(
                batch = batch.index,
                dropped = batch.chunks_dropped,
                requested = batch.chunks_requested,
                "Sample chunks lost during capture"
            );
        }

        let percent = batch.total_generated as f64 / target_bits as f64 * 100.0;
        tracing::info!(
            batch = batch.index,
            mixed_bits = batch.mixed_bits,
            "Progress: {:.1}% ({}/{} bits)",
            percent.min(100.0),
            batch.total_generated,
            target_bits
        );
    }

    fn on_complete(&mut self, report: &RunReport) {
        tracing::info!(
            elapsed_seconds = report.elapsed_seconds,
            bits_per_second = report.bits_per_second(),
            batches = report.batches.len(),
            dropped_chunks = report.chunks_dropped,
            "Generation completed"
        );
        tracing::info!(
            raw = %report.paths.raw.display(),
            raw_bits = report.raw.bit_count,
            mixed = %report.paths.mixed.display(),
            mixed_bits = report.mixed.bit_count,
            whitened = %report.paths.whitened.display(),
            whitened_bits = report.whitened.bit_count,
            "Artifacts written"
        );
    }
}
