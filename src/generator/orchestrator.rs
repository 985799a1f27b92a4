//! Batch loop driving capture, extraction, mixing and whitening.
//!
//! Each batch captures enough audio for the bits still missing (with
//! 1.5x oversampling), extracts and mixes it, and keeps at most the
//! missing number of mixed bits. A batch may come up short; the loop
//! simply runs again. Once the target is reached, raw and mixed streams
//! are written out and the persisted mixed bytes are whitened once.

use super::observer::{PipelineObserver, TracingObserver};
use super::report::{BatchReport, RunReport};
use crate::analysis::BitStatistics;
use crate::capture::{Capture, CaptureConfig, CaptureError, SampleSource};
use crate::conditioning::{WhitenError, Whitener};
use crate::config::{ConfigError, GeneratorConfig};
use crate::extraction::{BitExtractor, BitStream, ExtractionError};
use crate::mixing::MixingEngine;
use crate::storage::{self, OutputPaths, StorageError};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Capture duration multiplier over the bare bit requirement.
pub const OVERSAMPLING: f64 = 1.5;

/// Cap on raw bits fed to the mixer, as a multiple of the bits needed.
pub const MIX_INPUT_FACTOR: usize = 2;

/// Errors that end a generation run.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error("sample source failed: {0}")]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("whitening failed: {0}")]
    Whiten(#[from] WhitenError),
    #[error("sample source stalled: {batches} consecutive batches produced no bits")]
    SourceStalled { batches: u32 },
    #[error("interrupted after generating {generated} bits")]
    Interrupted { generated: usize },
}

/// Streams and diagnostics of a finished run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// All raw extracted bits.
    pub raw: BitStream,
    /// All mixed bits (at least `target_bits`).
    pub mixed: BitStream,
    /// Whitened bits (exactly `target_bits`).
    pub whitened: BitStream,
    pub report: RunReport,
}

/// Keeps a source open for one run and closes it on every exit path.
struct OpenSource<'a, S: SampleSource + ?Sized> {
    source: &'a mut S,
}

impl<'a, S: SampleSource + ?Sized> OpenSource<'a, S> {
    fn open(source: &'a mut S, config: &CaptureConfig) -> Result<Self, CaptureError> {
        source.open(config)?;
        Ok(Self { source })
    }

    fn capture(&mut self, duration_seconds: f64) -> Result<Capture, CaptureError> {
        self.source.capture(duration_seconds)
    }

    fn sample_rate(&self) -> u32 {
        self.source.sample_rate()
    }
}

impl<S: SampleSource + ?Sized> Drop for OpenSource<'_, S> {
    fn drop(&mut self) {
        self.source.close();
    }
}

/// Drives the fetch, extract, mix loop and the final whitening.
pub struct Generator {
    config: GeneratorConfig,
    extractor: BitExtractor,
    engine: MixingEngine,
    whitener: Whitener,
    paths: OutputPaths,
    stop: Option<Arc<AtomicBool>>,
}

impl Generator {
    /// Creates a generator after validating `config`.
    pub fn new(config: GeneratorConfig) -> Result<Self, GeneratorError> {
        config.validate()?;

        let paths = OutputPaths::from_base(&config.output_base, config.whitening);
        tracing::info!(
            raw = %paths.raw.display(),
            mixed = %paths.mixed.display(),
            whitened = %paths.whitened.display(),
            "Initializing generator"
        );

        Ok(Self {
            extractor: BitExtractor::new(config.extraction, config.bits_per_sample),
            engine: MixingEngine::new(config.mixer),
            whitener: Whitener::new(config.whitening),
            paths,
            config,
            stop: None,
        })
    }

    /// Aborts the run before the next batch once `flag` is set.
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop = Some(flag);
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Returns the artifact paths.
    pub fn paths(&self) -> &OutputPaths {
        &self.paths
    }

    /// Runs to completion, logging progress through `tracing`.
    pub fn run<S: SampleSource + ?Sized>(
        &self,
        source: &mut S,
        capture: &CaptureConfig,
    ) -> Result<RunOutput, GeneratorError> {
        self.run_with_observer(source, capture, &mut TracingObserver)
    }

    /// Runs to completion, reporting progress to `observer`.
    pub fn run_with_observer<S: SampleSource + ?Sized>(
        &self,
        source: &mut S,
        capture: &CaptureConfig,
        observer: &mut dyn PipelineObserver,
    ) -> Result<RunOutput, GeneratorError> {
        let started_at = Utc::now();
        let started = Instant::now();
        let target_bits = self.config.target_bits;

        self.paths.remove_existing()?;
        observer.on_start(&self.config);

        let mut raw = BitStream::new();
        let mut mixed = BitStream::with_capacity(target_bits);
        let mut batches: Vec<BatchReport> = Vec::new();
        let mut total_generated = 0;
        let mut empty_streak = 0;

        let mut source = OpenSource::open(source, capture)?;
        while total_generated < target_bits {
            if self.stop_requested() {
                tracing::warn!(generated = total_generated, "Generation interrupted");
                return Err(GeneratorError::Interrupted {
                    generated: total_generated,
                });
            }

            let bits_needed = self.config.batch_size.min(target_bits - total_generated);
            let duration = bits_needed as f64 / source.sample_rate() as f64 * OVERSAMPLING;
            let captured = source.capture(duration)?;

            let new_raw = self.extractor.extract(captured.samples());
            raw.append(&new_raw);

            // No samples means no entropy; never mix an empty batch.
            let new_mixed = if new_raw.is_empty() {
                BitStream::new()
            } else {
                let mut out = self
                    .engine
                    .process(&new_raw, Some(bits_needed * MIX_INPUT_FACTOR));
                out.truncate(bits_needed);
                out
            };
            mixed.append(&new_mixed);
            total_generated += new_mixed.len();

            let batch = BatchReport {
                index: batches.len(),
                bits_needed,
                samples: captured.len(),
                chunks_requested: captured.chunks_requested(),
                chunks_dropped: captured.chunks_dropped(),
                raw_bits: new_raw.len(),
                mixed_bits: new_mixed.len(),
                total_generated,
            };
            observer.on_batch(&batch, target_bits);
            batches.push(batch);

            if new_mixed.is_empty() {
                empty_streak += 1;
                if empty_streak >= self.config.max_empty_batches {
                    return Err(GeneratorError::SourceStalled {
                        batches: empty_streak,
                    });
                }
            } else {
                empty_streak = 0;
            }
        }
        drop(source);

        storage::save_bits(&self.paths.raw, &raw)?;
        storage::save_bits(&self.paths.mixed, &mixed)?;

        let persisted = storage::read_bytes(&self.paths.mixed)?;
        let whitened = self.whitener.whiten(&persisted, target_bits)?;
        storage::save_bits(&self.paths.whitened, &whitened)?;

        let report = RunReport {
            started_at,
            elapsed_seconds: started.elapsed().as_secs_f64(),
            target_bits,
            mixer: self.config.mixer,
            extraction: self.config.extraction,
            whitening: self.config.whitening,
            samples_captured: batches.iter().map(|b| b.samples).sum(),
            chunks_requested: batches.iter().map(|b| b.chunks_requested).sum(),
            chunks_dropped: batches.iter().map(|b| b.chunks_dropped).sum(),
            paths: self.paths.clone(),
            raw: BitStatistics::analyze(&raw),
            mixed: BitStatistics::analyze(&mixed),
            whitened: BitStatistics::analyze(&whitened),
            batches,
        };
        observer.on_complete(&report);

        Ok(RunOutput {
            raw,
            mixed,
            whitened,
            report,
        })
    }

    fn stop_requested(&self) -> bool {
        self.stop
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}
