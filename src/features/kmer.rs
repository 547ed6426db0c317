use crate::error::Result;

use super::SparseVector;

/// Largest window length for which a spectrum is computed
pub const MAX_K: usize = 5;

/// Which window start positions contribute to a k-mer spectrum
///
/// The normalisation denominator is `L - k + 1` under both conventions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WindowConvention {
    /// Only starts with `pos + k < L`; the final window of every length is skipped.
    ///
    /// This reproduces the feature files the pretrained models were built from.
    #[default]
    LookAhead,
    /// Every start with `pos + k <= L`
    Full,
}
impl WindowConvention {
    /// Number of windows of length `k` counted over a sequence of length `len`
    #[must_use]
    pub fn num_windows(self, len: usize, k: usize) -> usize {
        match self {
            Self::LookAhead => len.saturating_sub(k),
            Self::Full => (len + 1).saturating_sub(k),
        }
    }
}

/// Base-4 index of a window, where the symbol at offset `i` contributes `rank * 4^i`
///
/// Ranks are `A=0, C=1, G=2, T=3`, which is exactly the 2-bit packing used by `bitnuc`.
pub fn kmer_index(window: &[u8]) -> Result<usize> {
    Ok(bitnuc::as_2bit(window)? as usize)
}

/// Raw occurrence counts for every k-mer of a single length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmerCounts {
    k: usize,
    counts: Vec<u64>,
}
impl KmerCounts {
    /// Counts the windows of length `k` in `sequence`
    ///
    /// The sequence must consist of `ACGT` only.
    pub fn count(sequence: &[u8], k: usize, convention: WindowConvention) -> Result<Self> {
        let mut counts = vec![0u64; 1 << (2 * k)];
        let n_windows = convention.num_windows(sequence.len(), k);
        for window in sequence.windows(k).take(n_windows) {
            counts[kmer_index(window)?] += 1;
        }
        Ok(Self { k, counts })
    }

    #[must_use]
    pub fn k(&self) -> usize {
        self.k
    }

    #[must_use]
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Scales every count by `1 / (4^(5-k) * (L - k + 1))`
    ///
    /// The `4^(5-k)` factor puts the five spectra on a common scale.
    #[must_use]
    pub fn normalize(&self, len: usize) -> SparseVector {
        if len < self.k {
            return SparseVector::default();
        }
        let weight = 1.0 / 4f64.powi((MAX_K - self.k) as i32);
        let windows = (len - self.k + 1) as f64;
        let factor = weight / windows;
        SparseVector::from_dense(self.counts.iter().map(|&count| count as f64 * factor))
    }
}
