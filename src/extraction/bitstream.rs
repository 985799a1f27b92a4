//! Ordered bit sequence shared by every pipeline stage.

/// An ordered sequence of single bits.
///
/// Order is significant: it defines XOR pairing in the mixer and the
/// MSB-first layout when packed into bytes.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct BitStream {
    bits: Vec<bool>,
}

impl BitStream {
    /// Creates an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty stream with room for `capacity` bits.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bits: Vec::with_capacity(capacity),
        }
    }

    /// Creates a stream from `0`/`1` values; any non-zero value is a one.
    pub fn from_binary(values: &[u8]) -> Self {
        values.iter().map(|&v| v != 0).collect()
    }

    /// Returns the bits as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }

    /// Returns the number of bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Returns true if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Returns the bit at `index`, if present.
    #[inline]
    pub fn get(&self, index: usize) -> Option<bool> {
        self.bits.get(index).copied()
    }

    /// Appends one bit.
    #[inline]
    pub fn push(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    /// Appends all bits of `other`, preserving order.
    pub fn append(&mut self, other: &BitStream) {
        self.bits.extend_from_slice(&other.bits);
    }

    /// Shortens the stream to at most `len` bits.
    pub fn truncate(&mut self, len: usize) {
        self.bits.truncate(len);
    }

    /// Iterates over the bits in order.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().copied()
    }

    /// Returns the bits as `0`/`1` bytes, one per bit.
    pub fn to_binary(&self) -> Vec<u8> {
        self.bits.iter().map(|&b| b as u8).collect()
    }

    /// Counts the number of set bits (for bias analysis).
    pub fn popcount(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Calculates bit bias as deviation from 0.5.
    ///
    /// Returns a value in [-0.5, 0.5] where 0.0 is unbiased.
    pub fn bit_bias(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        (self.popcount() as f64 / self.len() as f64) - 0.5
    }
}

impl From<Vec<bool>> for BitStream {
    fn from(bits: Vec<bool>) -> Self {
        Self { bits }
    }
}

impl FromIterator<bool> for BitStream {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self {
            bits: iter.into_iter().collect(),
        }
    }
}

impl Extend<bool> for BitStream {
    fn extend<I: IntoIterator<Item = bool>>(&mut self, iter: I) {
        self.bits.extend(iter);
    }
}

impl std::fmt::Debug for BitStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Short streams print in full; long ones only summarize.
        if self.len() <= 64 {
            let rendered: String = self.bits.iter().map(|&b| if b { '1' } else { '0' }).collect();
            return f.debug_tuple("BitStream").field(&rendered).finish();
        }
        f.debug_struct("BitStream")
            .field("bits", &self.len())
            .field("bit_bias", &format!("{:.4}", self.bit_bias()))
            .finish()
    }
}
