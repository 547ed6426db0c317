use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, ToolError};
use crate::features::FeatureKind;
use crate::sink::NUM_FEATURE_STREAMS;

use super::prediction_path;

/// File name of the combined relation table
pub const RELATION_FILE: &str = "wekatest.arff";

const RELATION_NAME: &str = "LNCvsMRNA";
const TARGET_ATTRIBUTE: &str = "LNC";
const BINARY_DOMAIN: &str = "{-1,1}";

/// Reads the predicted label (first token) of every non-blank line
pub fn read_predictions<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)?;
    Ok(text
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect())
}

/// Writes the relation header followed by one row per record
///
/// Columns are the six feature predictions in [`FeatureKind::ALL`] order; the target
/// class is left unknown (`?`).
pub fn write_relation<W: Write>(
    writer: &mut W,
    columns: &[Vec<String>; NUM_FEATURE_STREAMS],
) -> Result<()> {
    writeln!(writer, "@RELATION {RELATION_NAME}")?;
    writeln!(writer)?;
    for kind in FeatureKind::ALL {
        writeln!(writer, "@ATTRIBUTE {} {BINARY_DOMAIN}", kind.name())?;
    }
    writeln!(writer, "@ATTRIBUTE {TARGET_ATTRIBUTE} {BINARY_DOMAIN}")?;
    writeln!(writer)?;
    writeln!(writer, "@DATA")?;

    let n_rows = columns[0].len();
    for row in 0..n_rows {
        for column in columns {
            write!(writer, "{},", column[row])?;
        }
        writeln!(writer, "?")?;
    }
    Ok(())
}

/// Merges the six prediction files in `dir` by line position into [`RELATION_FILE`]
///
/// Returns the path of the relation and its number of data rows.
pub fn build_relation(dir: &Path) -> Result<(PathBuf, usize)> {
    let mut columns: [Vec<String>; NUM_FEATURE_STREAMS] = Default::default();
    for (column, kind) in columns.iter_mut().zip(FeatureKind::ALL) {
        *column = read_predictions(prediction_path(dir, kind))?;
    }

    let expected = columns[0].len();
    for (column, kind) in columns.iter().zip(FeatureKind::ALL) {
        if column.len() != expected {
            return Err(ToolError::Misaligned {
                path: prediction_path(dir, kind),
                expected,
                found: column.len(),
            }
            .into());
        }
    }

    let path = dir.join(RELATION_FILE);
    let mut writer = File::create(&path).map(BufWriter::new)?;
    write_relation(&mut writer, &columns)?;
    writer.flush()?;
    Ok((path, expected))
}
