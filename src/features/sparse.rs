use std::io::Write;

use crate::error::{FormatError, Result};

/// Placeholder label written at the start of every feature line
pub const PLACEHOLDER_LABEL: &str = "0";

/// A sparse feature vector with 1-based, strictly ascending indices
///
/// Zero-valued entries are never stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}
impl SparseVector {
    /// Builds a sparse vector from dense values, numbering them from 1
    #[must_use]
    pub fn from_dense<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let entries = values
            .into_iter()
            .enumerate()
            .filter(|(_, value)| *value != 0.0)
            .map(|(idx, value)| (idx + 1, value))
            .collect();
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value at a 1-based index, `0.0` when the entry is not materialised
    #[must_use]
    pub fn get(&self, index: usize) -> f64 {
        self.entries
            .binary_search_by_key(&index, |(idx, _)| *idx)
            .map_or(0.0, |pos| self.entries[pos].1)
    }

    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &(usize, f64)> {
        self.entries.iter()
    }

    /// Writes `0 idx:value idx:value ...` followed by a newline
    pub fn write_line<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let mut translater = itoa::Buffer::new();
        writer.write_all(PLACEHOLDER_LABEL.as_bytes())?;
        for (idx, value) in &self.entries {
            writer.write_all(b" ")?;
            writer.write_all(translater.format(*idx).as_bytes())?;
            write!(writer, ":{value}")?;
        }
        writer.write_all(b"\n")
    }

    /// Parses a line produced by [`SparseVector::write_line`] (or any `label idx:value` line)
    ///
    /// The label is discarded.
    pub fn parse_line(line: &str) -> Result<Self> {
        let mut tokens = line.split_whitespace();
        if tokens.next().is_none() {
            return Err(FormatError::MissingLabel.into());
        }

        let mut entries = Vec::new();
        let mut last = 0;
        for token in tokens {
            let (idx, value) = token
                .split_once(':')
                .ok_or_else(|| FormatError::InvalidToken(token.to_string()))?;
            let idx: usize = idx
                .parse()
                .map_err(|_| FormatError::InvalidToken(token.to_string()))?;
            let value: f64 = value
                .parse()
                .map_err(|_| FormatError::InvalidToken(token.to_string()))?;
            if idx <= last {
                return Err(FormatError::UnorderedIndex(idx).into());
            }
            last = idx;
            if value != 0.0 {
                entries.push((idx, value));
            }
        }
        Ok(Self { entries })
    }
}
