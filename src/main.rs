//! MiBiS TRNG CLI
//!
//! Captures microphone noise (or mock noise), runs the MiBiS&XOR
//! pipeline and writes the raw, mixed and whitened bit files.

use clap::Parser;
use mibis_trng::{
    capture::{CaptureConfig, MockSource, SampleSource},
    conditioning::HashAlgorithm,
    config::{FileConfig, GeneratorConfig},
    extraction::ExtractionMethod,
    generator::{Generator, GeneratorError, RunOutput},
    metrics::MetricsRegistry,
    mixing::MixerMode,
};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Generate random bits from microphone noise with MiBiS&XOR mixing.
#[derive(Debug, Parser)]
#[command(name = "mibis-trng", version, about)]
struct Cli {
    /// Base name for output files (`<base>_raw.bin`, `<base>_mibis.bin`, ...)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of whitened bits to generate
    #[arg(short = 'n', long)]
    bits: Option<usize>,

    /// Upper bound on mixed bits produced per batch
    #[arg(short, long)]
    batch: Option<usize>,

    /// Use a single mixer instead of dual mixers
    #[arg(short, long)]
    single_mixer: bool,

    /// Bit extraction method (lsb, threshold, optimized)
    #[arg(short, long)]
    extraction: Option<String>,

    /// Bits per sample for the optimized method (1-4)
    #[arg(short = 'p', long)]
    bits_per_sample: Option<u8>,

    /// Whitening digest (sha3, sha256, blake3)
    #[arg(long)]
    whitening: Option<HashAlgorithm>,

    /// TOML configuration file; command-line values take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use synthetic noise instead of the microphone
    #[arg(long)]
    mock: bool,

    /// Seed for the synthetic noise source
    #[arg(long, requires = "mock")]
    seed: Option<u64>,

    /// Write a TOML run report to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Write Prometheus text-format metrics to this path
    #[arg(long)]
    metrics_out: Option<PathBuf>,

    /// Append log records to this file as well as the console
    #[arg(long, default_value = "trng.log")]
    log_file: PathBuf,

    /// Log to the console only
    #[arg(long)]
    no_log_file: bool,
}

impl Cli {
    /// Layers command-line overrides on top of the file configuration.
    fn resolve(&self) -> Result<(CaptureConfig, GeneratorConfig), GeneratorError> {
        let file = match &self.config {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };
        let capture = file.capture;
        let mut generator = file.generator;

        if let Some(output) = &self.output {
            generator.output_base = output.clone();
        }
        if let Some(bits) = self.bits {
            generator.target_bits = bits;
        }
        if let Some(batch) = self.batch {
            generator.batch_size = batch;
        }
        if self.single_mixer {
            generator.mixer = MixerMode::Single;
        }
        if let Some(name) = &self.extraction {
            generator.extraction = name.parse::<ExtractionMethod>()?;
        }
        if let Some(bps) = self.bits_per_sample {
            generator.bits_per_sample = bps;
        }
        if let Some(whitening) = self.whitening {
            generator.whitening = whitening;
        }

        Ok((capture, generator))
    }

    fn source(&self) -> Result<Box<dyn SampleSource>, GeneratorError> {
        if self.mock {
            info!("Using synthetic noise source");
            return Ok(Box::new(match self.seed {
                Some(seed) => MockSource::with_seed(seed),
                None => MockSource::new(),
            }));
        }

        #[cfg(feature = "audio")]
        {
            Ok(Box::new(mibis_trng::capture::MicrophoneSource::new()))
        }

        #[cfg(not(feature = "audio"))]
        {
            Err(mibis_trng::capture::CaptureError::DeviceNotFound(
                "built without the `audio` feature; rerun with --mock".to_string(),
            )
            .into())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);
    info!("MiBiS TRNG v{}", mibis_trng::VERSION);

    match run(&cli) {
        Ok(output) => {
            write_artifacts(&cli, &output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Installs a console layer and, unless disabled, a plain-text file layer.
fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let mut file_error = None;
    let file_layer = if cli.no_log_file {
        None
    } else {
        match open_log(&cli.log_file) {
            Ok(writer) => Some(fmt::layer().with_ansi(false).with_writer(writer)),
            Err(e) => {
                file_error = Some(e);
                None
            }
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    if let Some(e) = file_error {
        warn!(path = %cli.log_file.display(), "Failed to open log file: {}", e);
    }
}

/// Opens `path` for appending, creating it if needed.
fn open_log(path: &Path) -> io::Result<Mutex<File>> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(Mutex::new)
}

fn run(cli: &Cli) -> Result<RunOutput, GeneratorError> {
    let (capture, config) = cli.resolve()?;

    let stop = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&stop);
    if let Err(e) = ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst)) {
        warn!("Failed to install Ctrl-C handler: {}", e);
    }

    let generator = Generator::new(config)?.with_stop_flag(stop);
    let mut source = cli.source()?;
    generator.run(source.as_mut(), &capture)
}

/// Writes the optional report and metrics files.
///
/// Failures here are logged but do not fail the run; the bit files are
/// already on disk.
fn write_artifacts(cli: &Cli, output: &RunOutput) {
    if let Some(path) = &cli.report {
        match output.report.to_toml() {
            Ok(text) => match std::fs::write(path, text) {
                Ok(()) => info!(path = %path.display(), "Run report written"),
                Err(e) => warn!(path = %path.display(), "Failed to write run report: {}", e),
            },
            Err(e) => warn!("Failed to serialize run report: {}", e),
        }
    }

    if let Some(path) = &cli.metrics_out {
        let encoded = MetricsRegistry::new().and_then(|registry| {
            registry.record_run(&output.report);
            registry.encode()
        });
        match encoded {
            Ok(text) => match std::fs::write(path, text) {
                Ok(()) => info!(path = %path.display(), "Metrics written"),
                Err(e) => warn!(path = %path.display(), "Failed to write metrics: {}", e),
            },
            Err(e) => warn!("Failed to encode metrics: {}", e),
        }
    }

    let whitened = &output.report.whitened;
    println!(
        "Generated {} bits -> {} (bias {:+.4}, longest run {})",
        whitened.bit_count,
        output.report.paths.whitened.display(),
        whitened.bit_bias,
        whitened.longest_run
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_log_file_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trng.log");

        writeln!(open_log(&path).unwrap().lock().unwrap(), "first").unwrap();
        writeln!(open_log(&path).unwrap().lock().unwrap(), "second").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_log_file_defaults() {
        let cli = Cli::parse_from(["mibis-trng", "--mock"]);
        assert_eq!(cli.log_file, PathBuf::from("trng.log"));
        assert!(!cli.no_log_file);

        let cli = Cli::parse_from(["mibis-trng", "--no-log-file", "--log-file", "run.log"]);
        assert!(cli.no_log_file);
        assert_eq!(cli.log_file, PathBuf::from("run.log"));
    }
}
