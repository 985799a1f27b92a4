//! Noise input and sample handling.
//!
//! This module provides abstractions for capturing signed 16-bit
//! samples from a noise source and managing capture configuration.
//! The source is treated as raw physical data, not as entropy directly.

mod config;
#[cfg(feature = "audio")]
mod microphone;
mod samples;
mod source;

pub use config::{CaptureConfig, CaptureConfigError};
#[cfg(feature = "audio")]
pub use microphone::MicrophoneSource;
pub use samples::Capture;
pub use source::{CaptureError, MockSource, SampleSource};
