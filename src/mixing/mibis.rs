//! Middle-bisection placement and XOR compression.
//!
//! Temporally adjacent raw bits tend to be correlated. MiBiS scatters
//! them across a buffer by always writing the next bit halfway between
//! two bits that are already placed; XOR of neighbouring slots then
//! cancels first-order bias.

use crate::extraction::BitStream;

/// Number of bisection rounds needed for `n` input bits.
///
/// `1` for `n <= 1`, otherwise `floor(log2(n - 1)) + 1`.
pub fn mixing_steps(n: usize) -> u32 {
    if n <= 1 {
        return 1;
    }
    (n - 1).ilog2() + 1
}

/// Slot count of a mix buffer built with `steps` rounds.
pub fn buffer_size(steps: u32) -> usize {
    (1usize << steps.saturating_sub(1)) + 1
}

/// Fixed-size slot array filled by bisection.
///
/// Fill state lives beside the values: a slot holding `false` may be a
/// placed zero bit or an unreached slot, and only `filled` tells them
/// apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixBuffer {
    values: Vec<bool>,
    filled: Vec<bool>,
}

impl MixBuffer {
    /// Creates an empty buffer of `size` slots.
    pub fn new(size: usize) -> Self {
        Self {
            values: vec![false; size],
            filled: vec![false; size],
        }
    }

    /// Creates an empty buffer sized for `steps` rounds.
    pub fn for_steps(steps: u32) -> Self {
        Self::new(buffer_size(steps))
    }

    /// Number of slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the buffer has no slots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Slot values, unreached slots reading as `false`.
    #[inline]
    pub fn values(&self) -> &[bool] {
        &self.values
    }

    /// Returns true if a bit was placed at `index`.
    #[inline]
    pub fn is_filled(&self, index: usize) -> bool {
        self.filled.get(index).copied().unwrap_or(false)
    }

    /// Indices of placed bits, ascending.
    pub fn filled_positions(&self) -> Vec<usize> {
        self.filled
            .iter()
            .enumerate()
            .filter_map(|(i, &f)| f.then_some(i))
            .collect()
    }

    /// Number of placed bits.
    pub fn filled_count(&self) -> usize {
        self.filled.iter().filter(|&&f| f).count()
    }

    fn place(&mut self, index: usize, bit: bool) {
        self.values[index] = bit;
        self.filled[index] = true;
    }
}

/// Places `bits` into a fresh buffer by repeated middle bisection.
///
/// Input beyond what `steps` rounds can reach is ignored; slots never
/// reached keep the value `false` and stay unfilled.
pub fn mix(bits: &[bool], steps: u32) -> MixBuffer {
    let mut buffer = MixBuffer::for_steps(steps);
    let last = buffer.len() - 1;
    let mut input = bits.iter().copied();

    if steps == 1 {
        if let Some(bit) = input.next() {
            buffer.place(0, bit);
        }
        if let Some(bit) = input.next() {
            buffer.place(1, bit);
        }
        return buffer;
    }

    match (input.next(), input.next()) {
        (Some(first), Some(second)) => {
            buffer.place(0, first);
            buffer.place(last, second);
        }
        (Some(first), None) => {
            buffer.place(0, first);
            return buffer;
        }
        _ => return buffer,
    }

    let mut positions = vec![0, last];
    let mut input = input.peekable();

    for _round in 2..=steps {
        // Each midpoint lies strictly between its pair, so interleaving
        // keeps the list sorted without a separate merge.
        let mut next_positions = Vec::with_capacity(positions.len() * 2);

        for pair in positions.windows(2) {
            let (left, right) = (pair[0], pair[1]);
            next_positions.push(left);

            let mid = left + (right - left) / 2;
            if buffer.is_filled(mid) {
                continue;
            }
            if let Some(bit) = input.next() {
                buffer.place(mid, bit);
                next_positions.push(mid);
            }
        }
        next_positions.push(last);
        positions = next_positions;

        if input.peek().is_none() {
            break;
        }
    }

    buffer
}

/// XORs slot pairs `(0,1), (2,3), ...`; an odd trailing slot is dropped.
pub fn xor_compress(buffer: &MixBuffer) -> BitStream {
    buffer
        .values()
        .chunks_exact(2)
        .map(|pair| pair[0] ^ pair[1])
        .collect()
}

/// Single-mixer processing: mix with the minimal depth, then compress.
pub fn mix_and_compress(bits: &[bool]) -> BitStream {
    let steps = mixing_steps(bits.len());
    xor_compress(&mix(bits, steps))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(values: &[u8]) -> Vec<bool> {
        values.iter().map(|&v| v != 0).collect()
    }

    #[test]
    fn test_mixing_steps_formula() {
        assert_eq!(mixing_steps(0), 1);
        assert_eq!(mixing_steps(1), 1);
        assert_eq!(mixing_steps(2), 1);
        assert_eq!(mixing_steps(3), 2);
        assert_eq!(mixing_steps(5), 3);
        assert_eq!(mixing_steps(8), 3);
        assert_eq!(mixing_steps(9), 4);
        assert_eq!(mixing_steps(1025), 11);
    }

    #[test]
    fn test_buffer_size() {
        assert_eq!(buffer_size(1), 2);
        assert_eq!(buffer_size(2), 3);
        assert_eq!(buffer_size(3), 5);
        assert_eq!(buffer_size(11), 1025);
    }

    #[test]
    fn test_worked_example() {
        let input = bits(&[0, 1, 1, 0, 1, 1, 0, 1]);
        let steps = mixing_steps(input.len());
        assert_eq!(steps, 3);

        let buffer = mix(&input, steps);
        assert_eq!(buffer.len(), 5);
        // slot 0 <- b0, 4 <- b1, 2 <- b2, 1 <- b3, 3 <- b4
        assert_eq!(buffer.values(), bits(&[0, 0, 1, 1, 1]).as_slice());
        assert_eq!(buffer.filled_positions(), vec![0, 1, 2, 3, 4]);

        let output = xor_compress(&buffer);
        assert_eq!(output.to_binary(), vec![0, 0]);
    }

    #[test]
    fn test_placement_order() {
        // Distinct marker per input index: only bit 3 is set.
        let input = bits(&[0, 0, 0, 1, 0]);
        let buffer = mix(&input, 3);
        assert_eq!(buffer.values(), bits(&[0, 1, 0, 0, 0]).as_slice());

        // Only bit 4 is set: it lands at slot 3.
        let input = bits(&[0, 0, 0, 0, 1]);
        let buffer = mix(&input, 3);
        assert_eq!(buffer.values(), bits(&[0, 0, 0, 1, 0]).as_slice());
    }

    #[test]
    fn test_zero_bits_still_count_as_filled() {
        let input = vec![false; 5];
        let buffer = mix(&input, 3);
        assert_eq!(buffer.filled_count(), 5);
    }

    #[test]
    fn test_early_stop_leaves_slots_unfilled() {
        // 3 bits in a 9-slot buffer: 0, 8, then midpoint 4.
        let input = bits(&[1, 1, 1]);
        let buffer = mix(&input, 4);
        assert_eq!(buffer.len(), 9);
        assert_eq!(buffer.filled_positions(), vec![0, 4, 8]);
        assert!(!buffer.is_filled(2));
    }

    #[test]
    fn test_degenerate_inputs() {
        let empty = mix(&[], mixing_steps(0));
        assert_eq!(empty.len(), 2);
        assert_eq!(empty.filled_count(), 0);
        assert_eq!(xor_compress(&empty).to_binary(), vec![0]);

        let single = mix(&[true], mixing_steps(1));
        assert_eq!(single.filled_positions(), vec![0]);
        assert_eq!(xor_compress(&single).to_binary(), vec![1]);

        // A lone bit in a deeper buffer goes to slot 0 only.
        let lone = mix(&[true], 3);
        assert_eq!(lone.filled_positions(), vec![0]);
    }

    #[test]
    fn test_two_bits_single_step() {
        let buffer = mix(&[true, false], 1);
        assert_eq!(buffer.values(), &[true, false]);
        assert_eq!(xor_compress(&buffer).to_binary(), vec![1]);
    }

    #[test]
    fn test_xor_compress_drops_trailing_slot() {
        let mut buffer = MixBuffer::new(5);
        for i in 0..5 {
            buffer.place(i, true);
        }
        let output = xor_compress(&buffer);
        assert_eq!(output.len(), 2);
        assert_eq!(output.to_binary(), vec![0, 0]);
    }

    #[test]
    fn test_all_zero_buffer_compresses_to_zero() {
        let buffer = MixBuffer::new(17);
        let output = xor_compress(&buffer);
        assert_eq!(output.len(), 8);
        assert_eq!(output.popcount(), 0);
    }

    #[test]
    fn test_full_capacity_fills_every_slot() {
        // 2^(steps-1)+1 bits exactly fill the buffer.
        let input: Vec<bool> = (0..17).map(|i| i % 3 == 0).collect();
        let steps = mixing_steps(input.len());
        let buffer = mix(&input, steps);
        assert_eq!(buffer.len(), 17);
        assert_eq!(buffer.filled_count(), 17);
    }
}
