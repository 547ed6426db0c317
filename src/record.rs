use std::io::Write;

/// Byte that opens a record header line
pub const RECORD_MARKER: u8 = b'>';

/// Symbol marking an ambiguous base; any record containing it is rejected
pub const AMBIGUOUS: u8 = b'N';

/// A single header/sequence record as accepted by the loader
///
/// The record keeps the original body text (line breaks included) so that it can be
/// echoed verbatim into the sequence log, alongside the contiguous nucleotide sequence
/// used for feature extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Marker line, including the leading `>` but without the line terminator
    header: String,
    /// Original body text
    body: Vec<u8>,
    /// Body with all line terminators removed
    sequence: Vec<u8>,
}
impl Record {
    #[must_use]
    pub fn new(header: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        let sequence = body
            .split(|&b| b == b'\n')
            .flat_map(|line| line.strip_suffix(b"\r").unwrap_or(line))
            .copied()
            .collect();
        Self {
            header: header.into(),
            body,
            sequence,
        }
    }

    /// Build a record from a bare sequence, using it as its own single-line body
    #[must_use]
    pub fn from_sequence(header: impl Into<String>, sequence: &[u8]) -> Self {
        let mut body = sequence.to_vec();
        body.push(b'\n');
        Self::new(header, body)
    }

    #[must_use]
    pub fn header(&self) -> &str {
        &self.header
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    #[must_use]
    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    /// Number of nucleotides (line terminators excluded)
    #[must_use]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    #[must_use]
    pub fn contains_ambiguous(&self) -> bool {
        memchr::memchr(AMBIGUOUS, &self.sequence).is_some()
    }

    /// Write the marker line followed by the original body text
    ///
    /// A terminating newline is appended if the body does not end with one, so that
    /// consecutive records never share a line.
    pub fn write_fasta<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(self.header.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.write_all(&self.body)?;
        if !self.body.is_empty() && !self.body.ends_with(b"\n") {
            writer.write_all(b"\n")?;
        }
        Ok(())
    }
}
