//! Flat binary artifact files.
//!
//! Every artifact is a bare MSB-first packed bit stream with no header.
//! A missing file is an error, never an empty stream.

use super::packing::{pack, unpack};
use crate::conditioning::HashAlgorithm;
use crate::extraction::BitStream;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while reading or writing artifacts.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("file {0} does not exist")]
    NotFound(PathBuf),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound(path.to_path_buf())
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Writes `bits` packed MSB-first to `path`, replacing any existing file.
///
/// Returns the number of meaningful (pre-padding) bits written.
pub fn save_bits(path: impl AsRef<Path>, bits: &BitStream) -> Result<usize, StorageError> {
    let path = path.as_ref();
    let bytes = pack(bits);
    fs::write(path, &bytes).map_err(|e| StorageError::from_io(path, e))?;

    tracing::info!(
        path = %path.display(),
        bits = bits.len(),
        bytes = bytes.len(),
        "Saved bits to file"
    );
    Ok(bits.len())
}

/// Reads the raw bytes of an artifact.
pub fn read_bytes(path: impl AsRef<Path>) -> Result<Vec<u8>, StorageError> {
    let path = path.as_ref();
    fs::read(path).map_err(|e| StorageError::from_io(path, e))
}

/// Loads an artifact as bits, optionally truncated to `max_bits`.
pub fn load_bits(path: impl AsRef<Path>, max_bits: Option<usize>) -> Result<BitStream, StorageError> {
    let path = path.as_ref();
    let bits = unpack(&read_bytes(path)?, max_bits);

    tracing::info!(path = %path.display(), bits = bits.len(), "Loaded bits from file");
    Ok(bits)
}

/// The three artifact paths of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputPaths {
    /// Raw extracted bits.
    pub raw: PathBuf,
    /// MiBiS&XOR output.
    pub mixed: PathBuf,
    /// Whitened output.
    pub whitened: PathBuf,
}

impl OutputPaths {
    /// Derives artifact paths from a base name.
    ///
    /// A trailing `.bin` on the base is dropped, so `out.bin` and `out`
    /// give the same paths: `out_raw.bin`, `out_mibis.bin` and
    /// `out_<digest>.bin`.
    pub fn from_base(base: impl AsRef<Path>, algorithm: HashAlgorithm) -> Self {
        let base = base.as_ref().to_string_lossy();
        let base = base.strip_suffix(".bin").unwrap_or(&base);

        Self {
            raw: PathBuf::from(format!("{base}_raw.bin")),
            mixed: PathBuf::from(format!("{base}_mibis.bin")),
            whitened: PathBuf::from(format!("{base}_{}.bin", algorithm.as_str())),
        }
    }

    /// Iterates over the three paths.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        [&self.raw, &self.mixed, &self.whitened]
            .into_iter()
            .map(PathBuf::as_path)
    }

    /// Deletes any artifacts left over from a previous run.
    pub fn remove_existing(&self) -> Result<(), StorageError> {
        for path in self.iter() {
            match fs::remove_file(path) {
                Ok(()) => tracing::info!(path = %path.display(), "Removed existing file"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(StorageError::from_io(path, e)),
            }
        }
        Ok(())
    }
}
