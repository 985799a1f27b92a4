//! Entropy whitening via cryptographic hashing.
//!
//! This module turns the mixed bitstream into an exact-length output
//! using salted SHA3-256 (or another 256-bit digest). Hashing removes
//! residual bias and stretches or shrinks the input as needed.

mod hash;

pub use hash::{
    HashAlgorithm, WhitenError, Whitener, WhiteningPlan, DIGEST_BITS, MAX_CHUNK_DIVISOR,
    MIN_CHUNK_BYTES,
};
