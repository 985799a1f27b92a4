//! Sanity statistics for bitstreams.
//!
//! These numbers catch obvious problems such as a stuck input or a
//! constant stream. They are not randomness tests and passing them
//! says nothing about entropy.

use crate::extraction::BitStream;
use serde::Serialize;

/// Summary statistics of one bitstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BitStatistics {
    /// Number of bits analyzed.
    pub bit_count: usize,
    /// Number of set bits.
    pub ones: usize,
    /// Bit bias (deviation from 0.5).
    pub bit_bias: f64,
    /// Lag-1 serial correlation between consecutive bits.
    pub serial_correlation: f64,
    /// Longest run of identical bits.
    pub longest_run: usize,
}

impl BitStatistics {
    /// Computes all statistics for `bits`.
    pub fn analyze(bits: &BitStream) -> Self {
        Self {
            bit_count: bits.len(),
            ones: bits.popcount(),
            bit_bias: bits.bit_bias(),
            serial_correlation: Self::compute_serial_correlation(bits.as_slice()),
            longest_run: Self::compute_longest_run(bits.as_slice()),
        }
    }

    /// Computes lag-1 serial correlation.
    ///
    /// Constant input has no variance and reports 1.0.
    fn compute_serial_correlation(bits: &[bool]) -> f64 {
        if bits.len() < 2 {
            return 0.0;
        }

        let n = bits.len() as f64;
        let value = |b: bool| if b { 1.0 } else { 0.0 };
        let mean = bits.iter().map(|&b| value(b)).sum::<f64>() / n;

        let variance: f64 = bits.iter().map(|&b| (value(b) - mean).powi(2)).sum();
        if variance == 0.0 {
            return 1.0;
        }

        let covariance: f64 = bits
            .windows(2)
            .map(|w| (value(w[0]) - mean) * (value(w[1]) - mean))
            .sum();

        covariance / variance
    }

    fn compute_longest_run(bits: &[bool]) -> usize {
        let mut longest = 0;
        let mut current = 0;
        let mut previous = None;

        for &bit in bits {
            current = if previous == Some(bit) { current + 1 } else { 1 };
            longest = longest.max(current);
            previous = Some(bit);
        }

        longest
    }

    /// Returns true if results look reasonable (not proof of quality).
    pub fn looks_reasonable(&self) -> bool {
        // Loose sanity checks only
        let bias_ok = self.bit_bias.abs() < 0.1;
        let correlation_ok = self.serial_correlation.abs() < 0.5;

        self.bit_count > 0 && bias_ok && correlation_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alternating_bits() {
        let bits: BitStream = (0..1000).map(|i| i % 2 == 0).collect();
        let stats = BitStatistics::analyze(&bits);

        assert_eq!(stats.ones, 500);
        assert!(stats.bit_bias.abs() < 1e-9);
        // Perfect alternation is perfectly anti-correlated
        assert!(stats.serial_correlation < -0.99);
        assert_eq!(stats.longest_run, 1);
        assert!(!stats.looks_reasonable());
    }

    #[test]
    fn test_constant_data_fails() {
        let bits = BitStream::from(vec![true; 1000]);
        let stats = BitStatistics::analyze(&bits);

        assert_eq!(stats.serial_correlation, 1.0);
        assert_eq!(stats.longest_run, 1000);
        assert!(!stats.looks_reasonable());
    }

    #[test]
    fn test_mixed_pattern_passes() {
        // Period-4 pattern 1100: balanced, lag-1 correlation is 0
        let bits: BitStream = (0..1000).map(|i| i % 4 < 2).collect();
        let stats = BitStatistics::analyze(&bits);

        assert!(stats.serial_correlation.abs() < 0.01);
        assert_eq!(stats.longest_run, 2);
        assert!(stats.looks_reasonable());
    }

    #[test]
    fn test_empty_stream() {
        let stats = BitStatistics::analyze(&BitStream::new());
        assert_eq!(stats, BitStatistics::default());
        assert!(!stats.looks_reasonable());
    }
}
