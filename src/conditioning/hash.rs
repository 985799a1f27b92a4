//! Salted-hash whitening to an exact bit length.
//!
//! The mixed stream is cut into equal chunks, each chunk is hashed with
//! its index as a big-endian salt, and the digests are concatenated. If
//! the input is too short for the requested length, extra digests are
//! taken over the whole input with a continuing counter.

use crate::extraction::BitStream;
use crate::storage::unpack;
use blake3::Hasher as Blake3Hasher;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use sha3::{Digest, Sha3_256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Bits produced per digest.
pub const DIGEST_BITS: usize = 256;
/// Smallest chunk hashed, in bytes.
pub const MIN_CHUNK_BYTES: usize = 64;
/// Cap on the divisor used to size chunks.
pub const MAX_CHUNK_DIVISOR: usize = 1000;

/// Supported hash algorithms for whitening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA3-256 - the reference whitening digest.
    #[default]
    #[serde(rename = "sha3")]
    Sha3_256,
    /// SHA-256 - widely deployed, conservative choice.
    Sha256,
    /// BLAKE3 - fast, secure.
    Blake3,
}

impl HashAlgorithm {
    /// Short name, also used as the whitened file suffix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha3_256 => "sha3",
            Self::Sha256 => "sha256",
            Self::Blake3 => "blake3",
        }
    }

    /// Hashes `data || salt` (salt as big-endian u32).
    pub fn digest_salted(&self, data: &[u8], salt: u32) -> [u8; 32] {
        let salt = salt.to_be_bytes();
        match self {
            Self::Sha3_256 => {
                let mut hasher = Sha3_256::new();
                hasher.update(data);
                hasher.update(salt);
                let result = hasher.finalize();
                let mut out = [0u8; 32];
                out.copy_from_slice(&result);
                out
            }
            Self::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(data);
                hasher.update(salt);
                let result = hasher.finalize();
                let mut out = [0u8; 32];
                out.copy_from_slice(&result);
                out
            }
            Self::Blake3 => {
                let mut hasher = Blake3Hasher::new();
                hasher.update(data);
                hasher.update(&salt);
                *hasher.finalize().as_bytes()
            }
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = WhitenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha3" | "sha3-256" => Ok(Self::Sha3_256),
            "sha256" | "sha2" => Ok(Self::Sha256),
            "blake3" => Ok(Self::Blake3),
            other => Err(WhitenError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Errors raised by the whitener.
#[derive(Debug, Clone, Error)]
pub enum WhitenError {
    #[error("cannot whiten empty input")]
    EmptyInput,
    #[error("unknown hash algorithm: {0}")]
    UnknownAlgorithm(String),
}

/// How an input is split for whitening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WhiteningPlan {
    /// Digests needed to cover the target length.
    pub num_hashes: usize,
    /// Bytes per hashed chunk.
    pub chunk_size: usize,
    /// Digests taken over individual chunks.
    pub chunk_hashes: usize,
    /// Digests taken over the whole input with a counter salt.
    pub extra_hashes: usize,
}

impl WhiteningPlan {
    /// Computes the plan for `data_len` input bytes and `target_bits`.
    pub fn new(data_len: usize, target_bits: usize) -> Self {
        let num_hashes = target_bits.div_ceil(DIGEST_BITS);
        let divisor = num_hashes.clamp(1, MAX_CHUNK_DIVISOR);
        let chunk_size = (data_len / divisor).max(MIN_CHUNK_BYTES);
        let chunk_hashes = num_hashes.min(data_len / chunk_size);

        Self {
            num_hashes,
            chunk_size,
            chunk_hashes,
            extra_hashes: num_hashes - chunk_hashes,
        }
    }
}

/// Whitens arbitrary bytes into an exact-length bitstream.
#[derive(Debug, Clone, Default)]
pub struct Whitener {
    algorithm: HashAlgorithm,
}

impl Whitener {
    /// Creates a whitener with the specified algorithm.
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Returns the configured algorithm.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Produces exactly `target_bits` whitened bits from `data`.
    ///
    /// A zero target yields an empty stream.
    pub fn whiten(&self, data: &[u8], target_bits: usize) -> Result<BitStream, WhitenError> {
        if target_bits == 0 {
            return Ok(BitStream::new());
        }
        if data.is_empty() {
            return Err(WhitenError::EmptyInput);
        }

        let plan = WhiteningPlan::new(data.len(), target_bits);
        let mut output = BitStream::with_capacity(plan.num_hashes * DIGEST_BITS);

        for (i, chunk) in data
            .chunks_exact(plan.chunk_size)
            .take(plan.chunk_hashes)
            .enumerate()
        {
            let digest = self.algorithm.digest_salted(chunk, i as u32);
            push_digest_bits(&mut output, &digest);
        }

        if plan.extra_hashes > 0 {
            tracing::debug!(
                extra_hashes = plan.extra_hashes,
                algorithm = %self.algorithm,
                "Generating additional whole-input digests"
            );
        }
        for i in 0..plan.extra_hashes {
            let counter = (plan.chunk_hashes + i) as u32;
            let digest = self.algorithm.digest_salted(data, counter);
            push_digest_bits(&mut output, &digest);
        }

        output.truncate(target_bits);

        tracing::debug!(
            input_bytes = data.len(),
            chunk_size = plan.chunk_size,
            chunk_hashes = plan.chunk_hashes,
            output_bits = output.len(),
            "Whitened input"
        );

        Ok(output)
    }
}

/// Appends digest bits, most significant bit of each byte first.
fn push_digest_bits(output: &mut BitStream, digest: &[u8]) {
    output.append(&unpack(digest, None));
}
