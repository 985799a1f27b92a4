//! Bit packing and artifact persistence.
//!
//! Raw, mixed and whitened streams are stored as flat MSB-first packed
//! files. Lengths that are not a multiple of eight are zero-padded and
//! the true length is only known to the caller.

mod files;
mod packing;

pub use files::{load_bits, read_bytes, save_bits, OutputPaths, StorageError};
pub use packing::{pack, packed_len, unpack};
