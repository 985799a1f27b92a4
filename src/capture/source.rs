//! Sample source abstraction.
//!
//! This module provides a trait-based abstraction over the noise
//! source, allowing for both a real microphone and mock
//! implementations for testing.

use super::{Capture, CaptureConfig};
use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};
use thiserror::Error;

/// Errors that can occur during sample source operations.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("input device not found: {0}")]
    DeviceNotFound(String),
    #[error("failed to open input stream: {0}")]
    OpenFailed(String),
    #[error("failed to configure input stream: {0}")]
    ConfigFailed(String),
    #[error("failed to capture samples: {0}")]
    CaptureFailed(String),
    #[error("sample source not initialized")]
    NotInitialized,
}

/// Trait for sample source implementations.
///
/// A source is opened once, captured from repeatedly and then closed.
/// Individual chunk read failures are reported through
/// [`Capture::chunks_dropped`], not as errors.
pub trait SampleSource {
    /// Opens and initializes the source with the given configuration.
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CaptureError>;

    /// Captures roughly `duration_seconds` worth of samples.
    ///
    /// Blocks until every chunk has been read or has failed.
    fn capture(&mut self, duration_seconds: f64) -> Result<Capture, CaptureError>;

    /// Sample rate of the open source, in samples per second.
    fn sample_rate(&self) -> u32;

    /// Checks if the source is currently open.
    fn is_open(&self) -> bool;

    /// Closes the source and releases resources.
    fn close(&mut self);
}

/// Mock source that generates synthetic noise.
///
/// Samples come from a ChaCha20 stream, so a seeded mock is fully
/// reproducible. Read failures can be injected to exercise the
/// dropped-chunk path.
pub struct MockSource {
    config: Option<CaptureConfig>,
    rng: ChaCha20Rng,
    /// Fail every n-th chunk read (1 = every read fails).
    fail_every: Option<u64>,
    reads: u64,
}

impl MockSource {
    /// Creates a mock source seeded from the OS entropy source.
    pub fn new() -> Self {
        Self::from_rng(ChaCha20Rng::from_entropy())
    }

    /// Creates a reproducible mock source.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(ChaCha20Rng::seed_from_u64(seed))
    }

    /// Makes every `n`-th chunk read fail.
    pub fn failing_every(mut self, n: u64) -> Self {
        self.fail_every = Some(n.max(1));
        self
    }

    fn from_rng(rng: ChaCha20Rng) -> Self {
        Self {
            config: None,
            rng,
            fail_every: None,
            reads: 0,
        }
    }

    fn read_fails(&self) -> bool {
        self.fail_every.is_some_and(|n| self.reads % n == 0)
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleSource for MockSource {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CaptureError> {
        config
            .validate()
            .map_err(|e| CaptureError::ConfigFailed(e.to_string()))?;
        self.config = Some(config.clone());
        self.reads = 0;
        tracing::info!(
            sample_rate = config.sample_rate,
            chunk_size = config.chunk_size,
            "MockSource opened"
        );
        Ok(())
    }

    fn capture(&mut self, duration_seconds: f64) -> Result<Capture, CaptureError> {
        let config = self.config.clone().ok_or(CaptureError::NotInitialized)?;
        let chunks = config.chunks_for(duration_seconds);

        let mut samples = Vec::with_capacity(chunks * config.chunk_size);
        let mut dropped = 0;

        for _ in 0..chunks {
            self.reads += 1;
            if self.read_fails() {
                tracing::error!(read = self.reads, "Injected chunk read failure");
                dropped += 1;
                continue;
            }
            // NOT for entropy - only for exercising the pipeline
            samples.extend((0..config.chunk_size).map(|_| self.rng.next_u32() as i16));
        }

        tracing::debug!(
            duration_seconds,
            samples = samples.len(),
            dropped_chunks = dropped,
            "MockSource captured"
        );

        Ok(Capture::new(samples, chunks, dropped))
    }

    fn sample_rate(&self) -> u32 {
        self.config
            .as_ref()
            .map_or_else(|| CaptureConfig::default().sample_rate, |c| c.sample_rate)
    }

    fn is_open(&self) -> bool {
        self.config.is_some()
    }

    fn close(&mut self) {
        self.config = None;
        tracing::info!("MockSource closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_source_lifecycle() {
        let mut source = MockSource::with_seed(1);
        let config = CaptureConfig::default();

        assert!(!source.is_open());

        source.open(&config).unwrap();
        assert!(source.is_open());

        let capture = source.capture(2048.0 / 44_100.0).unwrap();
        assert_eq!(capture.len(), 2048);
        assert!(capture.is_complete());

        source.close();
        assert!(!source.is_open());
    }

    #[test]
    fn test_capture_without_open() {
        let mut source = MockSource::with_seed(1);
        assert!(matches!(
            source.capture(0.1),
            Err(CaptureError::NotInitialized)
        ));
    }

    #[test]
    fn test_seeded_sources_agree() {
        let config = CaptureConfig::default();
        let mut a = MockSource::with_seed(42);
        let mut b = MockSource::with_seed(42);
        a.open(&config).unwrap();
        b.open(&config).unwrap();

        let ca = a.capture(0.05).unwrap();
        let cb = b.capture(0.05).unwrap();
        assert_eq!(ca.samples(), cb.samples());
    }

    #[test]
    fn test_injected_failures_drop_chunks() {
        let mut source = MockSource::with_seed(3).failing_every(2);
        source.open(&CaptureConfig::default()).unwrap();

        let capture = source.capture(4096.0 / 44_100.0).unwrap();
        assert_eq!(capture.chunks_requested(), 4);
        assert_eq!(capture.chunks_dropped(), 2);
        assert_eq!(capture.len(), 2048);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut source = MockSource::with_seed(1);
        let config = CaptureConfig {
            chunk_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            source.open(&config),
            Err(CaptureError::ConfigFailed(_))
        ));
    }
}
