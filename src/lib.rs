//! MiBiS TRNG Library
//!
//! Post-processing pipeline for a true random bit generator fed by
//! microphone noise. Raw audio samples are reduced to bits, decorrelated
//! with MiBiS&XOR mixing and finally whitened with a cryptographic hash.
//!
//! # Architecture
//!
//! The system follows an explicit data flow:
//!
//! ```text
//! capture → extraction → mixing → storage → conditioning
//!                ↓          ↓                    ↓
//!                  analysis / metrics (diagnostics)
//! ```
//!
//! `generator` drives the stages in batches until the requested number of
//! bits is reached.
//!
//! # Design Principles
//!
//! - **Raw input is not entropy**: bits are always mixed before use
//! - **Deterministic post-processing**: mixing and whitening are pure
//!   functions of their input
//! - **Uses standard primitives**: SHA3-256 by default, SHA-256 and BLAKE3
//!   as alternatives
//! - **No cryptographic claims**: statistics are sanity checks, not proofs
//!
//! # Example
//!
//! ```no_run
//! use mibis_trng::{
//!     capture::{CaptureConfig, MockSource, SampleSource},
//!     conditioning::{HashAlgorithm, Whitener},
//!     extraction::{BitExtractor, ExtractionMethod},
//!     mixing::{MixerMode, MixingEngine},
//!     storage,
//! };
//!
//! let mut source = MockSource::new();
//! source.open(&CaptureConfig::default()).unwrap();
//! let capture = source.capture(0.5).unwrap();
//!
//! let raw = BitExtractor::new(ExtractionMethod::Optimized, 4).extract(capture.samples());
//! let mixed = MixingEngine::new(MixerMode::Dual).process(&raw, None);
//!
//! let whitened = Whitener::new(HashAlgorithm::Sha3_256)
//!     .whiten(&storage::pack(&mixed), 4096)
//!     .unwrap();
//! assert_eq!(whitened.len(), 4096);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod analysis;
pub mod capture;
pub mod conditioning;
pub mod config;
pub mod extraction;
pub mod generator;
pub mod metrics;
pub mod mixing;
pub mod storage;

// Re-export commonly used types at crate root
pub use analysis::BitStatistics;
pub use capture::{Capture, CaptureConfig, MockSource, SampleSource};
pub use conditioning::{HashAlgorithm, Whitener};
pub use config::{FileConfig, GeneratorConfig};
pub use extraction::{BitExtractor, BitStream, ExtractionMethod};
pub use generator::{Generator, GeneratorError, RunOutput, RunReport};
pub use mixing::{MixerMode, MixingEngine};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
