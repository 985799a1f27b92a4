//! MSB-first bit packing.

use crate::extraction::BitStream;

/// Packs bits into bytes, most significant bit first.
///
/// The last byte is zero-padded on the right. The number of meaningful
/// bits is not recorded in the output.
pub fn pack(bits: &BitStream) -> Vec<u8> {
    bits.as_slice()
        .chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |byte, (j, &bit)| byte | ((bit as u8) << (7 - j)))
        })
        .collect()
}

/// Unpacks bytes into bits, most significant bit first.
///
/// When `max_bits` is smaller than `8 * bytes.len()`, the result is
/// truncated to it.
pub fn unpack(bytes: &[u8], max_bits: Option<usize>) -> BitStream {
    let total = bytes.len() * 8;
    let len = max_bits.map_or(total, |max| max.min(total));

    bytes
        .iter()
        .flat_map(|&byte| (0..8).rev().map(move |shift| (byte >> shift) & 1 == 1))
        .take(len)
        .collect()
}

/// Bytes needed to hold `bits` bits.
pub fn packed_len(bits: usize) -> usize {
    bits.div_ceil(8)
}
