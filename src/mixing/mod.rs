//! MiBiS&XOR decorrelation.
//!
//! This module scatters raw bits across a bisection buffer and
//! XOR-compresses neighbouring slots. In dual mode the input is split
//! in half and each half is mixed on its own; the two results are
//! always concatenated first half first.

mod mibis;

pub use mibis::{buffer_size, mix, mix_and_compress, mixing_steps, xor_compress, MixBuffer};

use crate::extraction::BitStream;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Number of independent mixers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MixerMode {
    /// One mixer over the whole input.
    Single,
    /// Two mixers over contiguous halves.
    #[default]
    Dual,
}

impl MixerMode {
    /// Human-readable name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single mixer",
            Self::Dual => "dual mixers",
        }
    }
}

/// Applies MiBiS mixing and XOR compression in a fixed mode.
#[derive(Debug, Clone)]
pub struct MixingEngine {
    mode: MixerMode,
}

impl MixingEngine {
    /// Creates an engine running in `mode`.
    pub fn new(mode: MixerMode) -> Self {
        tracing::info!(mode = mode.as_str(), "Initializing MiBiS&XOR engine");
        Self { mode }
    }

    /// Returns the configured mode.
    pub fn mode(&self) -> MixerMode {
        self.mode
    }

    /// Mixes and compresses `bits`.
    ///
    /// When `max_bits` is given, only the first `max_bits` input bits
    /// are used.
    pub fn process(&self, bits: &BitStream, max_bits: Option<usize>) -> BitStream {
        let input = match max_bits {
            Some(max) if max < bits.len() => &bits.as_slice()[..max],
            _ => bits.as_slice(),
        };

        let started = Instant::now();
        let output = match self.mode {
            MixerMode::Single => process_single(input),
            MixerMode::Dual => process_dual(input),
        };

        tracing::debug!(
            mode = self.mode.as_str(),
            input_bits = input.len(),
            output_bits = output.len(),
            elapsed_ms = started.elapsed().as_secs_f64() * 1e3,
            "Processed bits"
        );

        output
    }
}

impl Default for MixingEngine {
    fn default() -> Self {
        Self::new(MixerMode::default())
    }
}

/// One mixer over the whole input.
pub fn process_single(bits: &[bool]) -> BitStream {
    mix_and_compress(bits)
}

/// Two mixers over the halves `[..len/2]` and `[len/2..]`.
///
/// The halves share nothing, so they run as a `rayon` fork-join; the
/// output is first-half result followed by second-half result.
pub fn process_dual(bits: &[bool]) -> BitStream {
    let (first, second) = bits.split_at(bits.len() / 2);
    let (mut output, tail) = rayon::join(|| mix_and_compress(first), || mix_and_compress(second));
    output.append(&tail);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(len: usize) -> BitStream {
        (0..len).map(|i| (i * 7 + i / 3) % 5 < 2).collect()
    }

    #[test]
    fn test_single_matches_pipeline() {
        let input = BitStream::from_binary(&[0, 1, 1, 0, 1, 1, 0, 1]);
        let engine = MixingEngine::new(MixerMode::Single);
        assert_eq!(engine.process(&input, None).to_binary(), vec![0, 0]);
    }

    #[test]
    fn test_dual_concatenates_halves_in_order() {
        let input = pattern(301);
        let (first, second) = input.as_slice().split_at(150);

        let mut expected = process_single(first);
        expected.append(&process_single(second));

        let engine = MixingEngine::new(MixerMode::Dual);
        assert_eq!(engine.process(&input, None), expected);
    }

    #[test]
    fn test_dual_odd_split_lengths() {
        // 17 bits -> halves of 8 (steps 3) and 9 (steps 4)
        let output = process_dual(pattern(17).as_slice());
        assert_eq!(output.len(), buffer_size(3) / 2 + buffer_size(4) / 2);
    }

    #[test]
    fn test_max_bits_truncates_input() {
        let input = pattern(1000);
        let engine = MixingEngine::new(MixerMode::Single);

        let capped = engine.process(&input, Some(100));
        let manual = process_single(&input.as_slice()[..100]);
        assert_eq!(capped, manual);

        // A cap above the length is a no-op
        assert_eq!(
            engine.process(&input, Some(5000)),
            engine.process(&input, None)
        );
    }

    #[test]
    fn test_empty_input_does_not_fail() {
        let engine = MixingEngine::new(MixerMode::Dual);
        let output = engine.process(&BitStream::new(), None);
        // Each empty half compresses a 2-slot buffer into one zero bit.
        assert_eq!(output.to_binary(), vec![0, 0]);
    }
}
