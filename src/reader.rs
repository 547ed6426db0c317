//! Record loader
//!
//! Parses a multi-record sequence file into [`Record`]s, keeping only those that are long
//! enough and free of ambiguous bases. The whole file is memory mapped and materialised up
//! front; there is no streaming mode.

use std::fs::File;
use std::path::Path;

use log::{debug, warn};
use memmap2::Mmap;

use crate::error::Result;
use crate::record::{Record, RECORD_MARKER};

/// Smallest accepted length threshold
pub const MIN_THRESHOLD: usize = 200;

/// Raise a threshold below [`MIN_THRESHOLD`] to the minimum, warning when it does so
#[must_use]
pub fn clamp_threshold(threshold: usize) -> usize {
    if threshold < MIN_THRESHOLD {
        warn!("t must be at least {MIN_THRESHOLD}, defaulted to {MIN_THRESHOLD}");
        MIN_THRESHOLD
    } else {
        threshold
    }
}

/// Loads and filters records from a sequence file
///
/// A record is retained iff its nucleotide count is at least the threshold and none of its
/// body lines contain an `N`. Rejected records and text preceding the first marker line
/// are dropped silently.
#[derive(Debug, Clone, Copy)]
pub struct RecordLoader {
    threshold: usize,
}
impl Default for RecordLoader {
    fn default() -> Self {
        Self {
            threshold: MIN_THRESHOLD,
        }
    }
}
impl RecordLoader {
    /// Creates a loader with the given threshold, clamped to [`MIN_THRESHOLD`]
    #[must_use]
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold: clamp_threshold(threshold),
        }
    }

    #[must_use]
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Memory maps `path` and parses all accepted records in file order
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Record>> {
        let file = File::open(path.as_ref())?;
        if file.metadata()?.len() == 0 {
            return Ok(Vec::new());
        }

        // Safety: the file is only read for the lifetime of the map
        let mmap = unsafe { Mmap::map(&file)? };
        let records = self.parse(&mmap);
        debug!(
            "Loaded {} records from {}",
            records.len(),
            path.as_ref().display()
        );
        Ok(records)
    }

    /// Parses records out of an in-memory buffer
    #[must_use]
    pub fn parse(&self, bytes: &[u8]) -> Vec<Record> {
        let mut records = Vec::new();
        let mut current: Option<Span> = None;
        let mut n_rejected = 0;

        for line in Lines::new(bytes) {
            if line.first() == Some(&RECORD_MARKER) {
                if let Some(span) = current.take() {
                    match span.finish(self.threshold) {
                        Some(record) => records.push(record),
                        None => n_rejected += 1,
                    }
                }
                current = Some(Span::new(line));
            } else if let Some(span) = current.as_mut() {
                span.push(line);
            }
        }
        if let Some(span) = current {
            match span.finish(self.threshold) {
                Some(record) => records.push(record),
                None => n_rejected += 1,
            }
        }

        debug!("Accepted {} records, rejected {n_rejected}", records.len());
        records
    }
}

/// A marker line and the body lines collected after it
struct Span<'a> {
    header: &'a [u8],
    body: Vec<u8>,
}
impl<'a> Span<'a> {
    fn new(header: &'a [u8]) -> Self {
        Self {
            header: trim_terminator(header),
            body: Vec::new(),
        }
    }

    /// Appends one body line (terminator included)
    fn push(&mut self, line: &[u8]) {
        self.body.extend_from_slice(line);
    }

    fn finish(self, threshold: usize) -> Option<Record> {
        let header = String::from_utf8_lossy(self.header).into_owned();
        let record = Record::new(header, self.body);
        (record.len() >= threshold && !record.contains_ambiguous()).then_some(record)
    }
}

fn trim_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Iterator over lines of a buffer, each including its trailing `\n` if present
struct Lines<'a> {
    bytes: &'a [u8],
    pos: usize,
}
impl<'a> Lines<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }
}
impl<'a> Iterator for Lines<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.bytes.len() {
            return None;
        }
        let rest = &self.bytes[self.pos..];
        let end = memchr::memchr(b'\n', rest).map_or(rest.len(), |idx| idx + 1);
        self.pos += end;
        Some(&rest[..end])
    }
}

#[cfg(test)]
mod testing {
    use std::io::Write;

    use super::*;

    fn long_line(n: usize) -> String {
        "ACGT".repeat(n.div_ceil(4))[..n].to_string()
    }

    #[test]
    fn test_threshold_clamped() {
        assert_eq!(RecordLoader::new(50).threshold(), MIN_THRESHOLD);
        assert_eq!(RecordLoader::new(0).threshold(), MIN_THRESHOLD);
        assert_eq!(RecordLoader::new(500).threshold(), 500);
    }

    /// Collects warnings together with the name of the thread that emitted them
    struct Capture {
        records: parking_lot::Mutex<Vec<(Option<String>, String)>>,
    }
    impl log::Log for Capture {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            metadata.level() <= log::Level::Warn
        }

        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                let thread = std::thread::current().name().map(str::to_string);
                self.records.lock().push((thread, record.args().to_string()));
            }
        }

        fn flush(&self) {}
    }

    static CAPTURE: Capture = Capture {
        records: parking_lot::const_mutex(Vec::new()),
    };

    /// Warnings emitted by the current thread while running `f`
    fn warnings_during(f: impl FnOnce()) -> Vec<String> {
        let _ = log::set_logger(&CAPTURE);
        log::set_max_level(log::LevelFilter::Warn);
        let thread = std::thread::current().name().map(str::to_string);
        CAPTURE.records.lock().retain(|(t, _)| *t != thread);
        f();
        CAPTURE
            .records
            .lock()
            .iter()
            .filter(|(t, _)| *t == thread)
            .map(|(_, message)| message.clone())
            .collect()
    }

    #[test]
    fn test_clamp_warns_once() {
        let warnings = warnings_during(|| {
            assert_eq!(clamp_threshold(50), MIN_THRESHOLD);
        });
        assert_eq!(warnings, vec!["t must be at least 200, defaulted to 200"]);

        let warnings = warnings_during(|| {
            assert_eq!(clamp_threshold(MIN_THRESHOLD), MIN_THRESHOLD);
            assert_eq!(clamp_threshold(300), 300);
        });
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_length_filter() {
        let input = format!(
            ">short\n{}\n>exact\n{}\n{}\n>long\n{}\n",
            long_line(199),
            long_line(100),
            long_line(100),
            long_line(300)
        );
        let records = RecordLoader::default().parse(input.as_bytes());
        let headers: Vec<_> = records.iter().map(Record::header).collect();
        assert_eq!(headers, vec![">exact", ">long"]);
        assert_eq!(records[0].len(), 200);
        assert_eq!(records[1].len(), 300);
    }

    #[test]
    fn test_ambiguous_rejected_anywhere() {
        let clean = long_line(400);
        let mut dirty = long_line(400);
        dirty.replace_range(399..400, "N");
        let input = format!(">a\n{clean}\n>b\n{clean}\n{dirty}\n{clean}\n>c\n{clean}\n");
        let records = RecordLoader::default().parse(input.as_bytes());
        let headers: Vec<_> = records.iter().map(Record::header).collect();
        assert_eq!(headers, vec![">a", ">c"]);
    }

    #[test]
    fn test_headerless_span_ignored() {
        let input = format!("{}\n{}\n", long_line(300), long_line(300));
        let records = RecordLoader::default().parse(input.as_bytes());
        assert!(records.is_empty());
    }

    #[test]
    fn test_preamble_then_record() {
        let input = format!("preamble text\n{}\n>rec\n{}\n", long_line(300), long_line(250));
        let records = RecordLoader::default().parse(input.as_bytes());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].header(), ">rec");
        assert_eq!(records[0].len(), 250);
    }

    #[test]
    fn test_body_preserved_verbatim() {
        let a = long_line(120);
        let b = long_line(90);
        let input = format!(">rec one\r\n{a}\r\n{b}");
        let records = RecordLoader::default().parse(input.as_bytes());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].header(), ">rec one");
        assert_eq!(records[0].body(), format!("{a}\r\n{b}").as_bytes());
        assert_eq!(records[0].len(), 210);
    }

    #[test]
    fn test_load_from_file() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, ">first")?;
        writeln!(file, "{}", long_line(250))?;
        writeln!(file, ">second")?;
        writeln!(file, "{}", long_line(150))?;
        file.flush()?;

        let records = RecordLoader::default().load(file.path())?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].header(), ">first");
        Ok(())
    }

    #[test]
    fn test_load_empty_file() -> anyhow::Result<()> {
        let file = tempfile::NamedTempFile::new()?;
        let records = RecordLoader::default().load(file.path())?;
        assert!(records.is_empty());
        Ok(())
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = RecordLoader::default().load("/definitely/not/here.fa");
        assert!(matches!(result, Err(crate::Error::IoError(_))));
    }
}
