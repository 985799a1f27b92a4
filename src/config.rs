//! Generator configuration and TOML file loading.

use crate::capture::{CaptureConfig, CaptureConfigError};
use crate::conditioning::HashAlgorithm;
use crate::extraction::ExtractionMethod;
use crate::mixing::MixerMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings consumed by the batch orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Number of final whitened bits to produce.
    pub target_bits: usize,
    /// Upper bound on mixed bits produced per batch.
    pub batch_size: usize,
    /// Single or dual mixer.
    pub mixer: MixerMode,
    /// Bit extraction strategy.
    pub extraction: ExtractionMethod,
    /// Bits per sample for the optimized strategy (clamped to 1-4).
    pub bits_per_sample: u8,
    /// Whitening digest.
    pub whitening: HashAlgorithm,
    /// Base path for the three artifact files.
    pub output_base: PathBuf,
    /// Consecutive zero-output batches tolerated before giving up.
    pub max_empty_batches: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            target_bits: 13_000_000,
            batch_size: 1_048_576,
            mixer: MixerMode::Dual,
            extraction: ExtractionMethod::Optimized,
            bits_per_sample: 4,
            whitening: HashAlgorithm::Sha3_256,
            output_base: PathBuf::from("random_bits"),
            max_empty_batches: 16,
        }
    }
}

impl GeneratorConfig {
    /// Creates a configuration targeting `target_bits` output bits.
    pub fn with_target(target_bits: usize) -> Self {
        Self {
            target_bits,
            ..Default::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_bits == 0 {
            return Err(ConfigError::InvalidTarget);
        }
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        if self.max_empty_batches == 0 {
            return Err(ConfigError::InvalidStallLimit);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("target bit count must be positive")]
    InvalidTarget,
    #[error("batch size must be positive")]
    InvalidBatchSize,
    #[error("max_empty_batches must be positive")]
    InvalidStallLimit,
    #[error("invalid capture configuration: {0}")]
    Capture(#[from] CaptureConfigError),
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct FileConfig {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.capture.validate()?;
        config.generator.validate()?;
        Ok(config)
    }
}
