//! Aligned output streams
//!
//! Six sparse feature streams plus the sequence log. A record's seven writes happen under
//! a single lock acquisition, so no other record can interleave between them and line `i`
//! of every stream always belongs to the same record.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::Result;
use crate::features::{FeatureKind, FeatureRecord};

/// Number of feature streams
pub const NUM_FEATURE_STREAMS: usize = FeatureKind::ALL.len();

/// File name of the sequence log
pub const SEQUENCE_LOG: &str = "sequences";

/// Extension of the raw feature files
pub const FEATURE_EXTENSION: &str = "svmtest";

/// Path of the feature stream for `kind` inside `dir`
#[must_use]
pub fn feature_path(dir: &Path, kind: FeatureKind) -> PathBuf {
    dir.join(format!("{}.{FEATURE_EXTENSION}", kind.name()))
}

struct Streams<W> {
    features: [W; NUM_FEATURE_STREAMS],
    sequences: W,
    records_written: usize,
}

/// The shared set of seven append-only output streams
pub struct AlignedSink<W: Write> {
    streams: Mutex<Streams<W>>,
}
impl AlignedSink<BufWriter<File>> {
    /// Creates (truncating) the seven output files inside `dir`
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let open = |path: PathBuf| File::create(path).map(BufWriter::new);
        let [one, two, three, four, five, order] =
            FeatureKind::ALL.map(|kind| feature_path(dir, kind));
        let features = [
            open(one)?,
            open(two)?,
            open(three)?,
            open(four)?,
            open(five)?,
            open(order)?,
        ];
        let sequences = open(dir.join(SEQUENCE_LOG))?;
        Ok(Self::new(features, sequences))
    }
}
impl<W: Write> AlignedSink<W> {
    #[must_use]
    pub fn new(features: [W; NUM_FEATURE_STREAMS], sequences: W) -> Self {
        Self {
            streams: Mutex::new(Streams {
                features,
                sequences,
                records_written: 0,
            }),
        }
    }

    /// Appends one record's six feature lines and its sequence log entry as a single unit
    ///
    /// Lines are serialised before the lock is taken; every stream is flushed after its
    /// write.
    pub fn write_record(&self, record: &FeatureRecord) -> Result<()> {
        let mut lines: [Vec<u8>; NUM_FEATURE_STREAMS] = Default::default();
        for (line, vector) in lines.iter_mut().zip(record.vectors()) {
            vector.write_line(line)?;
        }
        let mut fasta = Vec::with_capacity(record.record().body().len() + 64);
        record.record().write_fasta(&mut fasta)?;

        let mut streams = self.streams.lock();
        for (stream, line) in streams.features.iter_mut().zip(&lines) {
            stream.write_all(line)?;
            stream.flush()?;
        }
        streams.sequences.write_all(&fasta)?;
        streams.sequences.flush()?;
        streams.records_written += 1;
        Ok(())
    }

    /// Number of records appended so far
    #[must_use]
    pub fn records_written(&self) -> usize {
        self.streams.lock().records_written
    }

    /// Flushes every stream and returns the inner writers
    pub fn finish(self) -> Result<([W; NUM_FEATURE_STREAMS], W)> {
        let mut streams = self.streams.into_inner();
        for stream in &mut streams.features {
            stream.flush()?;
        }
        streams.sequences.flush()?;
        Ok((streams.features, streams.sequences))
    }
}
