//! Bitstream diagnostics.
//!
//! This module provides summary statistics used in run reports and
//! metrics. These are sanity checks, not randomness certification.

mod statistics;

pub use statistics::BitStatistics;
