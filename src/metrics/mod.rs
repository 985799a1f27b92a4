//! Prometheus metrics export for generator runs.
//!
//! Metrics are rendered in the Prometheus text format and written to a
//! file after each run, suitable for a node-exporter textfile collector.
//!
//! # Metrics Exposed
//!
//! ## Run Metrics
//! - `mibis_trng_target_bits` - Requested whitened bit count
//! - `mibis_trng_elapsed_seconds` - Duration of the last run
//! - `mibis_trng_bits_per_second` - Mixed-bit throughput of the last run
//! - `mibis_trng_batches_total` - Batches executed
//! - `mibis_trng_under_produced_batches_total` - Batches that came up short
//!
//! ## Capture Metrics
//! - `mibis_trng_samples_total` - Samples captured
//! - `mibis_trng_chunks_requested_total` - Chunk reads attempted
//! - `mibis_trng_chunks_dropped_total` - Chunk reads dropped
//!
//! ## Stream Metrics (label `stage` = raw, mixed, whitened)
//! - `mibis_trng_stream_bits`
//! - `mibis_trng_stream_bit_bias`
//! - `mibis_trng_stream_serial_correlation`
//! - `mibis_trng_stream_longest_run`
//!
//! # Example
//!
//! ```no_run
//! use mibis_trng::capture::{CaptureConfig, MockSource};
//! use mibis_trng::config::GeneratorConfig;
//! use mibis_trng::generator::Generator;
//! use mibis_trng::metrics::MetricsRegistry;
//!
//! let generator = Generator::new(GeneratorConfig::with_target(4096)).unwrap();
//! let output = generator
//!     .run(&mut MockSource::new(), &CaptureConfig::default())
//!     .unwrap();
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//! registry.record_run(&output.report);
//! std::fs::write("mibis_trng.prom", registry.encode().unwrap()).unwrap();
//! ```

mod collector;

pub use collector::{MetricsError, MetricsRegistry};
