use super::SparseVector;

/// Number of lags in the order profile
pub const MAX_LAG: usize = 199;

/// Counts, for each lag `i` in `1..=MAX_LAG`, the positions `p` with `S[p] != S[p + i]`
///
/// Entry `i - 1` holds the count for lag `i`; lags reaching past the end count nothing.
#[must_use]
pub fn mismatch_counts(sequence: &[u8]) -> [u64; MAX_LAG] {
    let mut counts = [0u64; MAX_LAG];
    for (lag, count) in (1..=MAX_LAG).zip(counts.iter_mut()) {
        if lag >= sequence.len() {
            break;
        }
        *count = sequence
            .iter()
            .zip(&sequence[lag..])
            .filter(|(a, b)| a != b)
            .count() as u64;
    }
    counts
}

/// Per-lag mismatch ratio: the count at lag `i` divided by the `L - i` compared pairs
///
/// Every value lies in `[0, 1]`.
#[must_use]
pub fn order_profile(sequence: &[u8]) -> SparseVector {
    let len = sequence.len();
    let counts = mismatch_counts(sequence);
    SparseVector::from_dense((1..=MAX_LAG).zip(counts).map(|(lag, count)| {
        if lag < len {
            count as f64 / (len - lag) as f64
        } else {
            0.0
        }
    }))
}
