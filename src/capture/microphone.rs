//! Microphone capture via `cpal`.
//!
//! [`SampleSource::open`] builds and starts one input stream on the
//! default input device; it keeps running until [`SampleSource::close`].
//! The stream callback forwards sample buffers over a channel, and each
//! capture call assembles whole chunks from it. Samples left over from one
//! capture carry into the next, so no audio is lost between batches.
//! Stream errors are logged and each one costs a chunk, mirroring a
//! failed blocking read.

use super::{Capture, CaptureConfig, CaptureError, SampleSource};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::Sample;
use std::sync::mpsc;

enum StreamEvent {
    Samples(Vec<i16>),
    Error(String),
}

/// Sample source backed by the system default input device.
pub struct MicrophoneSource {
    stream: Option<cpal::Stream>,
    events: Option<mpsc::Receiver<StreamEvent>>,
    /// Samples received but not yet handed out as a full chunk.
    pending: Vec<i16>,
    config: CaptureConfig,
}

impl MicrophoneSource {
    /// Creates a closed source; call [`SampleSource::open`] before capturing.
    pub fn new() -> Self {
        Self {
            stream: None,
            events: None,
            pending: Vec::new(),
            config: CaptureConfig::default(),
        }
    }

    fn build_stream<T>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        tx: mpsc::Sender<StreamEvent>,
    ) -> Result<cpal::Stream, CaptureError>
    where
        T: cpal::SizedSample,
        i16: cpal::FromSample<T>,
    {
        let channels = config.channels.max(1) as usize;
        let err_tx = tx.clone();

        device
            .build_input_stream(
                config,
                move |data: &[T], _: &cpal::InputCallbackInfo| {
                    // Keep the first channel only.
                    let mono = data
                        .iter()
                        .step_by(channels)
                        .map(|&s| i16::from_sample(s))
                        .collect();
                    // The receiver is gone once the source is closed.
                    let _ = tx.send(StreamEvent::Samples(mono));
                },
                move |err: cpal::StreamError| {
                    let _ = err_tx.send(StreamEvent::Error(err.to_string()));
                },
                None,
            )
            .map_err(|e| CaptureError::OpenFailed(e.to_string()))
    }
}

impl Default for MicrophoneSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Assembles `chunks` chunks of `chunk_size` samples from `events`.
///
/// Returns the samples and the number of chunks lost to stream errors.
/// Surplus samples stay in `pending` for the next call.
fn collect_chunks(
    events: &mpsc::Receiver<StreamEvent>,
    pending: &mut Vec<i16>,
    chunks: usize,
    chunk_size: usize,
) -> Result<(Vec<i16>, usize), CaptureError> {
    let mut samples = Vec::with_capacity(chunks * chunk_size);
    let mut dropped = 0;

    for _ in 0..chunks {
        loop {
            if pending.len() >= chunk_size {
                samples.extend(pending.drain(..chunk_size));
                break;
            }
            match events.recv() {
                Ok(StreamEvent::Samples(buf)) => pending.extend(buf),
                Ok(StreamEvent::Error(e)) => {
                    tracing::error!(error = %e, "Error capturing audio, dropping chunk");
                    dropped += 1;
                    break;
                }
                Err(_) => {
                    return Err(CaptureError::CaptureFailed(
                        "input stream closed unexpectedly".into(),
                    ))
                }
            }
        }
    }

    Ok((samples, dropped))
}

impl SampleSource for MicrophoneSource {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CaptureError> {
        config
            .validate()
            .map_err(|e| CaptureError::ConfigFailed(e.to_string()))?;
        if self.is_open() {
            self.close();
        }

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| CaptureError::DeviceNotFound("no default input device".into()))?;
        let supported = device
            .default_input_config()
            .map_err(|e| CaptureError::ConfigFailed(e.to_string()))?;

        let stream_config = cpal::StreamConfig {
            channels: supported.channels(),
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let (tx, rx) = mpsc::channel();
        let stream = match supported.sample_format() {
            cpal::SampleFormat::I16 => Self::build_stream::<i16>(&device, &stream_config, tx)?,
            cpal::SampleFormat::U16 => Self::build_stream::<u16>(&device, &stream_config, tx)?,
            cpal::SampleFormat::F32 => Self::build_stream::<f32>(&device, &stream_config, tx)?,
            other => {
                return Err(CaptureError::ConfigFailed(format!(
                    "unsupported sample format {other:?}"
                )))
            }
        };
        stream
            .play()
            .map_err(|e| CaptureError::OpenFailed(e.to_string()))?;

        tracing::info!(
            device = %device.name().unwrap_or_else(|_| "<unknown>".into()),
            sample_rate = config.sample_rate,
            device_channels = stream_config.channels,
            format = ?supported.sample_format(),
            "Opened microphone input"
        );

        self.stream = Some(stream);
        self.events = Some(rx);
        self.pending.clear();
        self.config = config.clone();
        Ok(())
    }

    fn capture(&mut self, duration_seconds: f64) -> Result<Capture, CaptureError> {
        let events = self.events.as_ref().ok_or(CaptureError::NotInitialized)?;

        let chunks = self.config.chunks_for(duration_seconds);
        tracing::info!(duration_seconds, chunks, "Capturing audio");
        let started = std::time::Instant::now();

        let (samples, dropped) =
            collect_chunks(events, &mut self.pending, chunks, self.config.chunk_size)?;

        tracing::info!(
            elapsed_seconds = started.elapsed().as_secs_f64(),
            samples = samples.len(),
            "Captured audio"
        );

        Ok(Capture::new(samples, chunks, dropped))
    }

    fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn close(&mut self) {
        // Dropping the stream stops the device; the receiver goes with it.
        self.stream = None;
        self.events = None;
        self.pending.clear();
        tracing::info!("Closed audio input and released resources");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_without_open() {
        let mut source = MicrophoneSource::new();
        assert!(!source.is_open());
        assert!(matches!(
            source.capture(0.1),
            Err(CaptureError::NotInitialized)
        ));
    }

    #[test]
    fn test_surplus_samples_carry_over() {
        let (tx, rx) = mpsc::channel();
        let mut pending = Vec::new();

        tx.send(StreamEvent::Samples((0..6).collect())).unwrap();
        let (first, dropped) = collect_chunks(&rx, &mut pending, 1, 4).unwrap();
        assert_eq!(first, vec![0, 1, 2, 3]);
        assert_eq!(dropped, 0);
        assert_eq!(pending, vec![4, 5]);

        tx.send(StreamEvent::Samples((6..10).collect())).unwrap();
        let (second, _) = collect_chunks(&rx, &mut pending, 1, 4).unwrap();
        assert_eq!(second, vec![4, 5, 6, 7]);
    }

    #[test]
    fn test_stream_error_drops_one_chunk() {
        let (tx, rx) = mpsc::channel();
        let mut pending = Vec::new();

        tx.send(StreamEvent::Error("overrun".into())).unwrap();
        tx.send(StreamEvent::Samples(vec![1; 4])).unwrap();
        let (samples, dropped) = collect_chunks(&rx, &mut pending, 2, 4).unwrap();
        assert_eq!(dropped, 1);
        assert_eq!(samples, vec![1; 4]);
    }

    #[test]
    fn test_closed_channel_is_capture_failure() {
        let (tx, rx) = mpsc::channel::<StreamEvent>();
        drop(tx);
        let mut pending = Vec::new();
        assert!(matches!(
            collect_chunks(&rx, &mut pending, 1, 4),
            Err(CaptureError::CaptureFailed(_))
        ));
    }
}
