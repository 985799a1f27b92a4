//! Bit harvesting from raw samples.
//!
//! This module converts signed 16-bit samples into a bitstream. The
//! strategy is selected by name; an unknown name is rejected before
//! any sample is touched.

mod bitstream;

pub use bitstream::BitStream;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest bits-per-sample the optimized strategy will take.
pub const MAX_BITS_PER_SAMPLE: u8 = 4;

/// Errors raised while configuring extraction.
#[derive(Debug, Clone, Error)]
pub enum ExtractionError {
    #[error("invalid extraction configuration: {0}")]
    InvalidConfiguration(String),
}

/// Rule mapping a raw sample to one or more output bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    /// Bit 0 of each sample.
    Lsb,
    /// 1 when the sample is strictly positive.
    Threshold,
    /// Several low-order bit planes per sample, skipping bits 2 and 3.
    #[default]
    Optimized,
}

impl ExtractionMethod {
    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lsb => "lsb",
            Self::Threshold => "threshold",
            Self::Optimized => "optimized",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractionMethod {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lsb" => Ok(Self::Lsb),
            "threshold" => Ok(Self::Threshold),
            "optimized" => Ok(Self::Optimized),
            other => Err(ExtractionError::InvalidConfiguration(format!(
                "unknown bit extraction method: {other}"
            ))),
        }
    }
}

/// Converts raw samples into bits with a fixed strategy.
#[derive(Debug, Clone)]
pub struct BitExtractor {
    method: ExtractionMethod,
    bits_per_sample: u8,
}

impl BitExtractor {
    /// Creates an extractor. `bits_per_sample` only affects the
    /// optimized strategy.
    pub fn new(method: ExtractionMethod, bits_per_sample: u8) -> Self {
        tracing::info!(
            method = %method,
            bits_per_sample,
            "Initializing bit extractor"
        );
        Self {
            method,
            bits_per_sample,
        }
    }

    /// Creates an extractor from a method name.
    pub fn from_name(name: &str, bits_per_sample: u8) -> Result<Self, ExtractionError> {
        Ok(Self::new(name.parse()?, bits_per_sample))
    }

    /// Returns the configured strategy.
    pub fn method(&self) -> ExtractionMethod {
        self.method
    }

    /// Bits produced per input sample.
    pub fn bits_per_sample(&self) -> usize {
        match self.method {
            ExtractionMethod::Lsb | ExtractionMethod::Threshold => 1,
            ExtractionMethod::Optimized => clamp_bits_per_sample(self.bits_per_sample) as usize,
        }
    }

    /// Extracts bits from `samples`.
    pub fn extract(&self, samples: &[i16]) -> BitStream {
        let bits = match self.method {
            ExtractionMethod::Lsb => extract_lsb(samples),
            ExtractionMethod::Threshold => extract_threshold(samples),
            ExtractionMethod::Optimized => extract_optimized(samples, self.bits_per_sample),
        };

        tracing::debug!(
            bits = bits.len(),
            samples = samples.len(),
            "Extracted bits from audio samples"
        );

        bits
    }
}

impl Default for BitExtractor {
    fn default() -> Self {
        Self::new(ExtractionMethod::default(), MAX_BITS_PER_SAMPLE)
    }
}

/// Bit 0 of every sample.
pub fn extract_lsb(samples: &[i16]) -> BitStream {
    samples.iter().map(|&s| s & 1 == 1).collect()
}

/// One bit per sample: set when the sample is above zero.
pub fn extract_threshold(samples: &[i16]) -> BitStream {
    samples.iter().map(|&s| s > 0).collect()
}

/// Interleaves `bits_per_sample` bit planes per sample.
///
/// Planes 0 and 1 come from bits 0 and 1; plane `i >= 2` comes from bit
/// `i + 2`, so bits 2 and 3 are never used. Bit plane `i` of sample `j`
/// lands at output index `i + j * k`.
pub fn extract_optimized(samples: &[i16], bits_per_sample: u8) -> BitStream {
    let k = clamp_bits_per_sample(bits_per_sample);
    if k == 1 {
        return extract_lsb(samples);
    }

    let positions: Vec<u32> = (0..k as u32).map(source_bit_position).collect();
    let mut bits = BitStream::with_capacity(samples.len() * k as usize);
    for &sample in samples {
        let raw = sample as u16;
        bits.extend(positions.iter().map(|&p| (raw >> p) & 1 == 1));
    }
    bits
}

fn clamp_bits_per_sample(bits_per_sample: u8) -> u8 {
    bits_per_sample.clamp(1, MAX_BITS_PER_SAMPLE)
}

/// Source bit for output plane `i`.
fn source_bit_position(i: u32) -> u32 {
    if i < 2 {
        i
    } else {
        i + 2
    }
}
