//! Captured sample buffer with read-loss accounting.

/// Samples returned by a single capture call.
///
/// Alongside the signed 16-bit samples it records how many chunk reads
/// were attempted and how many failed. Failed chunks are simply missing
/// from `samples`, so the counts are the only trace of the lost entropy.
#[derive(Clone, Default)]
pub struct Capture {
    /// Signed 16-bit samples, in capture order.
    samples: Vec<i16>,
    /// Number of chunk reads attempted.
    chunks_requested: usize,
    /// Number of chunk reads that failed and were dropped.
    chunks_dropped: usize,
}

impl Capture {
    /// Creates a capture from samples and read accounting.
    pub fn new(samples: Vec<i16>, chunks_requested: usize, chunks_dropped: usize) -> Self {
        Self {
            samples,
            chunks_requested,
            chunks_dropped,
        }
    }

    /// Creates a loss-free capture from a sample vector.
    pub fn from_samples(samples: Vec<i16>) -> Self {
        Self {
            samples,
            chunks_requested: 1,
            chunks_dropped: 0,
        }
    }

    /// Returns the captured samples.
    #[inline]
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Returns the number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if no samples were captured.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the number of chunk reads attempted.
    #[inline]
    pub fn chunks_requested(&self) -> usize {
        self.chunks_requested
    }

    /// Returns the number of chunk reads that were dropped.
    #[inline]
    pub fn chunks_dropped(&self) -> usize {
        self.chunks_dropped
    }

    /// Returns true if every requested chunk was read.
    pub fn is_complete(&self) -> bool {
        self.chunks_dropped == 0
    }
}

impl std::fmt::Debug for Capture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capture")
            .field("samples", &self.samples.len())
            .field("chunks_requested", &self.chunks_requested)
            .field("chunks_dropped", &self.chunks_dropped)
            .finish()
    }
}
