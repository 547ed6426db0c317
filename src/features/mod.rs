//! Feature extraction
//!
//! Maps one [`Record`] to six sparse vectors: the normalised k-mer spectra for `k = 1..=5`
//! and the 199-lag mismatch ("order") profile. Extraction is a pure function of the
//! sequence content, so results do not depend on which worker computes them.

mod kmer;
mod order;
mod sparse;

pub use kmer::{kmer_index, KmerCounts, WindowConvention, MAX_K};
pub use order::{mismatch_counts, order_profile, MAX_LAG};
pub use sparse::{SparseVector, PLACEHOLDER_LABEL};

use crate::error::{ExtractError, Result};
use crate::Record;

/// The six feature types, in stream order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    Kmer(usize),
    Order,
}
impl FeatureKind {
    pub const ALL: [FeatureKind; 6] = [
        FeatureKind::Kmer(1),
        FeatureKind::Kmer(2),
        FeatureKind::Kmer(3),
        FeatureKind::Kmer(4),
        FeatureKind::Kmer(5),
        FeatureKind::Order,
    ];

    /// Base name shared by the feature, range, and model files
    #[must_use]
    pub fn name(self) -> String {
        match self {
            Self::Kmer(k) => format!("{k}mer"),
            Self::Order => "order".to_string(),
        }
    }
}

/// The feature vectors of one record, together with the record itself
#[derive(Debug, Clone)]
pub struct FeatureRecord {
    record: Record,
    kmers: [SparseVector; MAX_K],
    order: SparseVector,
}
impl FeatureRecord {
    #[must_use]
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Spectrum for window length `k`, or `None` outside `1..=MAX_K`
    #[must_use]
    pub fn kmer(&self, k: usize) -> Option<&SparseVector> {
        self.kmers.get(k.checked_sub(1)?)
    }

    #[must_use]
    pub fn order(&self) -> &SparseVector {
        &self.order
    }

    /// Vector of the given kind, or `None` for a k-mer length outside `1..=MAX_K`
    #[must_use]
    pub fn vector(&self, kind: FeatureKind) -> Option<&SparseVector> {
        match kind {
            FeatureKind::Kmer(k) => self.kmer(k),
            FeatureKind::Order => Some(self.order()),
        }
    }

    /// All six vectors in [`FeatureKind::ALL`] order
    #[must_use]
    pub fn vectors(&self) -> impl Iterator<Item = &SparseVector> {
        self.kmers.iter().chain(std::iter::once(&self.order))
    }
}

/// Returns the first symbol outside of `ACGT`, if any
pub fn validate_sequence(sequence: &[u8]) -> std::result::Result<(), ExtractError> {
    match sequence
        .iter()
        .position(|b| !matches!(b, b'A' | b'C' | b'G' | b'T'))
    {
        Some(position) => Err(ExtractError::InvalidNucleotide {
            symbol: char::from(sequence[position]),
            position,
        }),
        None => Ok(()),
    }
}

/// Computes the six feature vectors of a record
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor {
    convention: WindowConvention,
}
impl FeatureExtractor {
    #[must_use]
    pub fn new(convention: WindowConvention) -> Self {
        Self { convention }
    }

    pub fn extract(&self, record: Record) -> Result<FeatureRecord> {
        let sequence = record.sequence();
        validate_sequence(sequence)?;

        let len = sequence.len();
        let mut kmers: [SparseVector; MAX_K] = Default::default();
        for (k, slot) in (1..=MAX_K).zip(kmers.iter_mut()) {
            *slot = KmerCounts::count(sequence, k, self.convention)?.normalize(len);
        }
        let order = order_profile(sequence);

        Ok(FeatureRecord {
            record,
            kmers,
            order,
        })
    }
}
