//! End-to-end runs against the synthetic source.

use mibis_trng::capture::{CaptureConfig, MockSource, SampleSource};
use mibis_trng::conditioning::{HashAlgorithm, Whitener};
use mibis_trng::config::{FileConfig, GeneratorConfig};
use mibis_trng::extraction::{BitStream, ExtractionMethod};
use mibis_trng::generator::{
    BatchReport, Generator, GeneratorError, NullObserver, PipelineObserver,
};
use mibis_trng::metrics::MetricsRegistry;
use mibis_trng::mixing::{MixerMode, MixingEngine};
use mibis_trng::storage::{self, packed_len};
use std::fs;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::TempDir;

fn config(dir: &TempDir, target_bits: usize) -> GeneratorConfig {
    GeneratorConfig {
        target_bits,
        batch_size: 8192,
        output_base: dir.path().join("random_bits.bin"),
        ..Default::default()
    }
}

#[test]
fn test_full_run_writes_three_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let generator = Generator::new(config(&dir, 20_000)).unwrap();
    let mut source = MockSource::with_seed(42);

    let output = generator
        .run(&mut source, &CaptureConfig::default())
        .unwrap();
    let paths = generator.paths();

    assert_eq!(paths.raw, dir.path().join("random_bits_raw.bin"));
    assert_eq!(paths.mixed, dir.path().join("random_bits_mibis.bin"));
    assert_eq!(paths.whitened, dir.path().join("random_bits_sha3.bin"));

    let size = |p: &std::path::Path| fs::metadata(p).unwrap().len() as usize;
    assert_eq!(size(&paths.raw), packed_len(output.raw.len()));
    assert_eq!(size(&paths.mixed), packed_len(output.mixed.len()));
    assert_eq!(size(&paths.whitened), packed_len(20_000));

    assert_eq!(output.whitened.len(), 20_000);
    assert!(output.mixed.len() >= 20_000);
    // Raw input outnumbers mixed output
    assert!(output.raw.len() > output.mixed.len());
}

#[test]
fn test_whitened_file_matches_persisted_mixed_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let generator = Generator::new(config(&dir, 3000)).unwrap();
    let output = generator
        .run(&mut MockSource::with_seed(3), &CaptureConfig::default())
        .unwrap();

    let mixed_bytes = storage::read_bytes(&generator.paths().mixed).unwrap();
    let expected = Whitener::new(HashAlgorithm::Sha3_256)
        .whiten(&mixed_bytes, 3000)
        .unwrap();
    assert_eq!(output.whitened, expected);

    let on_disk = storage::load_bits(&generator.paths().whitened, Some(3000)).unwrap();
    assert_eq!(on_disk, expected);
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let run = |seed| {
        let dir = tempfile::tempdir().unwrap();
        let generator = Generator::new(config(&dir, 4096)).unwrap();
        generator
            .run_with_observer(
                &mut MockSource::with_seed(seed),
                &CaptureConfig::default(),
                &mut NullObserver,
            )
            .unwrap()
            .whitened
    };

    assert_eq!(run(9), run(9));
    assert_ne!(run(9), run(10));
}

#[test]
fn test_every_mode_combination_hits_target() {
    for mixer in [MixerMode::Single, MixerMode::Dual] {
        for extraction in [
            ExtractionMethod::Lsb,
            ExtractionMethod::Threshold,
            ExtractionMethod::Optimized,
        ] {
            let dir = tempfile::tempdir().unwrap();
            let config = GeneratorConfig {
                mixer,
                extraction,
                whitening: HashAlgorithm::Blake3,
                ..config(&dir, 5000)
            };
            let generator = Generator::new(config).unwrap();
            let output = generator
                .run(&mut MockSource::with_seed(5), &CaptureConfig::default())
                .unwrap();

            assert_eq!(output.whitened.len(), 5000, "{mixer:?}/{extraction:?}");
            assert!(generator.paths().whitened.ends_with("random_bits_blake3.bin"));
        }
    }
}

#[test]
fn test_previous_artifacts_are_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let generator = Generator::new(config(&dir, 1000)).unwrap();
    fs::write(&generator.paths().raw, vec![0xFF; 1_000_000]).unwrap();

    let output = generator
        .run(&mut MockSource::with_seed(1), &CaptureConfig::default())
        .unwrap();
    let raw_size = fs::metadata(&generator.paths().raw).unwrap().len() as usize;
    assert_eq!(raw_size, packed_len(output.raw.len()));
}

#[test]
fn test_dropped_chunks_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let generator = Generator::new(config(&dir, 6000)).unwrap();
    let mut source = MockSource::with_seed(8).failing_every(3);

    let output = generator
        .run(&mut source, &CaptureConfig::default())
        .unwrap();
    let report = &output.report;

    assert_eq!(output.whitened.len(), 6000);
    assert!(report.chunks_dropped > 0);
    assert!(report.chunks_dropped < report.chunks_requested);
    assert_eq!(
        report.samples_captured,
        (report.chunks_requested - report.chunks_dropped) * 1024
    );
}

#[test]
fn test_silent_source_stalls() {
    let dir = tempfile::tempdir().unwrap();
    let generator = Generator::new(config(&dir, 1000)).unwrap();
    let mut source = MockSource::with_seed(2).failing_every(1);

    let result = generator.run(&mut source, &CaptureConfig::default());
    assert!(matches!(
        result,
        Err(GeneratorError::SourceStalled { batches: 16 })
    ));
    assert!(!source.is_open());
}

#[test]
fn test_stop_flag_aborts_before_capture() {
    let dir = tempfile::tempdir().unwrap();
    let generator = Generator::new(config(&dir, 1000))
        .unwrap()
        .with_stop_flag(Arc::new(AtomicBool::new(true)));

    let result = generator.run(&mut MockSource::with_seed(2), &CaptureConfig::default());
    assert!(matches!(result, Err(GeneratorError::Interrupted { .. })));
    assert!(generator.paths().iter().all(|p| !p.exists()));
}

#[test]
fn test_invalid_capture_config_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let generator = Generator::new(config(&dir, 1000)).unwrap();
    let capture = CaptureConfig {
        chunk_size: 0,
        ..Default::default()
    };

    let result = generator.run(&mut MockSource::with_seed(2), &capture);
    assert!(matches!(result, Err(GeneratorError::Capture(_))));
}

#[test]
fn test_config_file_drives_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trng.toml");
    let base = dir.path().join("from_file");
    fs::write(
        &path,
        format!(
            "[capture]\nsample_rate = 8000\n\n[generator]\ntarget_bits = 2048\nmixer = \"single\"\nwhitening = \"sha256\"\noutput_base = {:?}\n",
            base.to_string_lossy()
        ),
    )
    .unwrap();

    let file = FileConfig::from_file(&path).unwrap();
    let generator = Generator::new(file.generator).unwrap();
    let output = generator
        .run(&mut MockSource::with_seed(4), &file.capture)
        .unwrap();

    assert_eq!(output.whitened.len(), 2048);
    assert!(dir.path().join("from_file_sha256.bin").exists());
}

#[test]
fn test_report_and_metrics_export() {
    let dir = tempfile::tempdir().unwrap();
    let generator = Generator::new(config(&dir, 2048)).unwrap();
    let output = generator
        .run(&mut MockSource::with_seed(6), &CaptureConfig::default())
        .unwrap();

    let report = output.report.to_toml().unwrap();
    assert!(report.contains("target_bits = 2048"));
    assert!(report.contains("[whitened]"));

    let registry = MetricsRegistry::new().unwrap();
    registry.record_run(&output.report);
    let text = registry.encode().unwrap();
    assert!(text.contains("mibis_trng_stream_bits{stage=\"whitened\"} 2048"));
}

#[derive(Default)]
struct BatchLog(Vec<BatchReport>);

impl PipelineObserver for BatchLog {
    fn on_batch(&mut self, batch: &BatchReport, _target_bits: usize) {
        self.0.push(batch.clone());
    }
}

#[test]
fn test_batches_follow_capture_and_mix_sizing() {
    let dir = tempfile::tempdir().unwrap();
    let capture = CaptureConfig::default();
    let config = GeneratorConfig {
        batch_size: 3000,
        ..config(&dir, 10_000)
    };
    let mixer = config.mixer;
    let generator = Generator::new(config).unwrap();
    let mut log = BatchLog::default();

    let output = generator
        .run_with_observer(&mut MockSource::with_seed(17), &capture, &mut log)
        .unwrap();
    assert!(log.0.len() >= 4);

    let engine = MixingEngine::new(mixer);
    let mut expected = BitStream::new();
    let mut offset = 0;
    for batch in &log.0 {
        // 1.5x oversampled capture, rounded up to whole chunks
        let seconds = batch.bits_needed as f64 / capture.sample_rate as f64 * 1.5;
        assert_eq!(
            batch.samples,
            capture.chunks_for(seconds) * capture.chunk_size,
            "batch {}",
            batch.index
        );

        // Mixer sees at most twice the bits still needed
        let raw_batch =
            BitStream::from(output.raw.as_slice()[offset..offset + batch.raw_bits].to_vec());
        offset += batch.raw_bits;
        let mut mixed = engine.process(&raw_batch, Some(2 * batch.bits_needed));
        mixed.truncate(batch.bits_needed);
        assert_eq!(mixed.len(), batch.mixed_bits);
        expected.append(&mixed);
    }

    assert_eq!(offset, output.raw.len());
    assert_eq!(output.mixed, expected);
}
