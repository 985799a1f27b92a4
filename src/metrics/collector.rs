//! Metrics collection and registry.

use crate::analysis::BitStatistics;
use crate::generator::RunReport;
use prometheus::{Encoder, Gauge, GaugeVec, IntCounter, IntGauge, Opts, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Prometheus metrics registry for generator runs.
pub struct MetricsRegistry {
    registry: Registry,

    // Run metrics
    target_bits: IntGauge,
    elapsed_seconds: Gauge,
    bits_per_second: Gauge,
    batches_total: IntCounter,
    under_produced_batches_total: IntCounter,

    // Capture metrics
    samples_total: IntCounter,
    chunks_requested_total: IntCounter,
    chunks_dropped_total: IntCounter,

    // Per-stream statistics, labelled by stage
    stream_bits: GaugeVec,
    stream_bit_bias: GaugeVec,
    stream_serial_correlation: GaugeVec,
    stream_longest_run: GaugeVec,
}

impl MetricsRegistry {
    /// Creates a new registry with all generator metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let target_bits = IntGauge::new(
            "mibis_trng_target_bits",
            "Requested number of whitened output bits",
        )?;
        let elapsed_seconds = Gauge::new(
            "mibis_trng_elapsed_seconds",
            "Wall-clock duration of the last run",
        )?;
        let bits_per_second = Gauge::new(
            "mibis_trng_bits_per_second",
            "Mixed bits produced per second in the last run",
        )?;
        let batches_total = IntCounter::new(
            "mibis_trng_batches_total",
            "Total fetch-extract-mix batches executed",
        )?;
        let under_produced_batches_total = IntCounter::new(
            "mibis_trng_under_produced_batches_total",
            "Batches that yielded fewer mixed bits than requested",
        )?;

        let samples_total = IntCounter::new(
            "mibis_trng_samples_total",
            "Total audio samples captured",
        )?;
        let chunks_requested_total = IntCounter::new(
            "mibis_trng_chunks_requested_total",
            "Total sample chunk reads attempted",
        )?;
        let chunks_dropped_total = IntCounter::new(
            "mibis_trng_chunks_dropped_total",
            "Total sample chunk reads dropped after a failure",
        )?;

        let stream_bits = GaugeVec::new(
            Opts::new("mibis_trng_stream_bits", "Bits in each pipeline stream"),
            &["stage"],
        )?;
        let stream_bit_bias = GaugeVec::new(
            Opts::new(
                "mibis_trng_stream_bit_bias",
                "Ones ratio minus 0.5 for each pipeline stream",
            ),
            &["stage"],
        )?;
        let stream_serial_correlation = GaugeVec::new(
            Opts::new(
                "mibis_trng_stream_serial_correlation",
                "Lag-1 serial correlation for each pipeline stream",
            ),
            &["stage"],
        )?;
        let stream_longest_run = GaugeVec::new(
            Opts::new(
                "mibis_trng_stream_longest_run",
                "Longest run of identical bits for each pipeline stream",
            ),
            &["stage"],
        )?;

        registry.register(Box::new(target_bits.clone()))?;
        registry.register(Box::new(elapsed_seconds.clone()))?;
        registry.register(Box::new(bits_per_second.clone()))?;
        registry.register(Box::new(batches_total.clone()))?;
        registry.register(Box::new(under_produced_batches_total.clone()))?;
        registry.register(Box::new(samples_total.clone()))?;
        registry.register(Box::new(chunks_requested_total.clone()))?;
        registry.register(Box::new(chunks_dropped_total.clone()))?;
        registry.register(Box::new(stream_bits.clone()))?;
        registry.register(Box::new(stream_bit_bias.clone()))?;
        registry.register(Box::new(stream_serial_correlation.clone()))?;
        registry.register(Box::new(stream_longest_run.clone()))?;

        Ok(Self {
            registry,
            target_bits,
            elapsed_seconds,
            bits_per_second,
            batches_total,
            under_produced_batches_total,
            samples_total,
            chunks_requested_total,
            chunks_dropped_total,
            stream_bits,
            stream_bit_bias,
            stream_serial_correlation,
            stream_longest_run,
        })
    }

    /// Records a completed run.
    ///
    /// Counters accumulate across calls; gauges reflect the latest run.
    pub fn record_run(&self, report: &RunReport) {
        self.target_bits.set(report.target_bits as i64);
        self.elapsed_seconds.set(report.elapsed_seconds);
        self.bits_per_second.set(report.bits_per_second());

        self.batches_total.inc_by(report.batches.len() as u64);
        self.under_produced_batches_total
            .inc_by(report.under_produced_batches() as u64);

        self.samples_total.inc_by(report.samples_captured as u64);
        self.chunks_requested_total
            .inc_by(report.chunks_requested as u64);
        self.chunks_dropped_total.inc_by(report.chunks_dropped as u64);

        self.record_stream("raw", &report.raw);
        self.record_stream("mixed", &report.mixed);
        self.record_stream("whitened", &report.whitened);
    }

    fn record_stream(&self, stage: &str, stats: &BitStatistics) {
        self.stream_bits
            .with_label_values(&[stage])
            .set(stats.bit_count as f64);
        self.stream_bit_bias
            .with_label_values(&[stage])
            .set(stats.bit_bias);
        self.stream_serial_correlation
            .with_label_values(&[stage])
            .set(stats.serial_correlation);
        self.stream_longest_run
            .with_label_values(&[stage])
            .set(stats.longest_run as f64);
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
