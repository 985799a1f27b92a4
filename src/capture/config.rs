//! Sample capture configuration.
//!
//! Sample rate and chunk size are fixed for the lifetime of an open
//! source. The orchestrator derives capture durations from the rate, so
//! changing it mid-run would skew every batch.

use serde::{Deserialize, Serialize};

/// Configuration for a sample source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Samples per second.
    pub sample_rate: u32,
    /// Samples per read; a failed read drops exactly this many samples.
    pub chunk_size: usize,
    /// Interleaved input channels. Only the first channel is kept.
    pub channels: u16,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            chunk_size: 1024,
            channels: 1,
        }
    }
}

impl CaptureConfig {
    /// Creates a configuration with the given sample rate.
    pub fn with_sample_rate(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ..Default::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), CaptureConfigError> {
        if self.sample_rate == 0 {
            return Err(CaptureConfigError::InvalidSampleRate);
        }
        if self.chunk_size == 0 {
            return Err(CaptureConfigError::InvalidChunkSize);
        }
        if self.channels == 0 || self.channels > 8 {
            return Err(CaptureConfigError::InvalidChannels(self.channels));
        }
        Ok(())
    }

    /// Number of whole chunks needed to cover `duration_seconds`.
    ///
    /// Rounds up so that any positive duration reads at least one chunk.
    pub fn chunks_for(&self, duration_seconds: f64) -> usize {
        if duration_seconds.is_nan() || duration_seconds <= 0.0 {
            return 0;
        }
        // Absorb float noise so an exact multiple of the chunk size stays exact.
        let samples = (self.sample_rate as f64 * duration_seconds - 1e-6).ceil() as usize;
        samples.div_ceil(self.chunk_size)
    }
}

/// Capture configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CaptureConfigError {
    #[error("sample rate must be positive")]
    InvalidSampleRate,
    #[error("chunk size must be positive")]
    InvalidChunkSize,
    #[error("invalid channel count {0} (must be 1-8)")]
    InvalidChannels(u16),
}
