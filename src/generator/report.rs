//! Per-batch and per-run diagnostics.

use crate::analysis::BitStatistics;
use crate::conditioning::HashAlgorithm;
use crate::extraction::ExtractionMethod;
use crate::mixing::MixerMode;
use crate::storage::OutputPaths;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of one fetch-extract-mix iteration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    /// Zero-based batch index.
    pub index: usize,
    /// Mixed bits requested from this batch.
    pub bits_needed: usize,
    /// Samples delivered by the source.
    pub samples: usize,
    /// Chunk reads attempted.
    pub chunks_requested: usize,
    /// Chunk reads dropped after a failure.
    pub chunks_dropped: usize,
    /// Raw bits extracted.
    pub raw_bits: usize,
    /// Mixed bits kept after truncation.
    pub mixed_bits: usize,
    /// Mixed bits accumulated so far, including this batch.
    pub total_generated: usize,
}

impl BatchReport {
    /// True when the batch yielded fewer bits than requested.
    pub fn under_produced(&self) -> bool {
        self.mixed_bits < self.bits_needed
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Wall-clock start of the run.
    pub started_at: DateTime<Utc>,
    /// Total run time in seconds.
    pub elapsed_seconds: f64,
    /// Requested whitened bit count.
    pub target_bits: usize,
    pub mixer: MixerMode,
    pub extraction: ExtractionMethod,
    pub whitening: HashAlgorithm,
    /// Samples captured across all batches.
    pub samples_captured: usize,
    /// Chunk reads attempted across all batches.
    pub chunks_requested: usize,
    /// Chunk reads dropped across all batches.
    pub chunks_dropped: usize,
    /// Artifact locations.
    pub paths: OutputPaths,
    pub raw: BitStatistics,
    pub mixed: BitStatistics,
    pub whitened: BitStatistics,
    pub batches: Vec<BatchReport>,
}

impl RunReport {
    /// Mixed bits produced per second of run time.
    pub fn bits_per_second(&self) -> f64 {
        if self.elapsed_seconds > 0.0 {
            self.mixed.bit_count as f64 / self.elapsed_seconds
        } else {
            0.0
        }
    }

    /// Batches that delivered fewer bits than requested.
    pub fn under_produced_batches(&self) -> usize {
        self.batches.iter().filter(|b| b.under_produced()).count()
    }

    /// Serializes the report as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
