use std::ffi::OsStr;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::run_tool;
use crate::config::ToolConfig;
use crate::error::{Result, ToolError};

/// File name of the final label report
pub const LABEL_REPORT: &str = "predictions";

const NAIVE_BAYES: &str = "weka.classifiers.bayes.NaiveBayes";

/// Final per-record class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Coding,
    LongNonCoding,
}
impl Label {
    /// Maps a 1-based Weka class index onto a label (`1` is `-1`, `2` is `1`)
    #[must_use]
    pub fn from_class_index(index: u32) -> Option<Self> {
        match index {
            1 => Some(Self::Coding),
            2 => Some(Self::LongNonCoding),
            _ => None,
        }
    }
}
impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coding => write!(f, "coding"),
            Self::LongNonCoding => write!(f, "long-non-coding"),
        }
    }
}

/// Parses the prediction listing printed by Weka's `-p 0` option
///
/// Each data row reads `inst# actual predicted [error] prediction`, where `predicted` is
/// `<class index>:<class value>`. Header and blank lines are skipped.
pub fn parse_predictions(output: &str) -> Result<Vec<Label>> {
    let mut labels = Vec::new();
    for line in output.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 3 || tokens[0].parse::<usize>().is_err() {
            continue;
        }
        let label = tokens[2]
            .split_once(':')
            .and_then(|(index, _)| index.parse().ok())
            .and_then(Label::from_class_index)
            .ok_or_else(|| ToolError::UnparsableOutput(line.to_string()))?;
        labels.push(label);
    }
    Ok(labels)
}

/// Writes one label per line
pub fn write_labels<W: Write>(writer: &mut W, labels: &[Label]) -> Result<()> {
    for label in labels {
        writeln!(writer, "{label}")?;
    }
    Ok(())
}

/// Naive Bayes classification of the combined relation with Weka
#[derive(Debug, Clone)]
pub struct Classifier<'a> {
    tools: &'a ToolConfig,
}
impl<'a> Classifier<'a> {
    #[must_use]
    pub fn new(tools: &'a ToolConfig) -> Self {
        Self { tools }
    }

    /// Classifies `relation` against the training relation and returns one label per row
    pub fn classify(&self, relation: &Path) -> Result<Vec<Label>> {
        let training = self.tools.training_relation();
        let output = run_tool(
            "weka",
            &self.tools.java,
            [
                OsStr::new("-cp"),
                self.tools.weka_jar.as_os_str(),
                OsStr::new(NAIVE_BAYES),
                OsStr::new("-t"),
                training.as_os_str(),
                OsStr::new("-T"),
                relation.as_os_str(),
                OsStr::new("-p"),
                OsStr::new("0"),
            ],
            None,
        )?;
        parse_predictions(&String::from_utf8_lossy(&output.stdout))
    }

    /// Classifies `relation` and writes the label report into `dir`
    pub fn classify_into(&self, relation: &Path, dir: &Path) -> Result<(PathBuf, Vec<Label>)> {
        let labels = self.classify(relation)?;
        let path = dir.join(LABEL_REPORT);
        let mut writer = File::create(&path).map(BufWriter::new)?;
        write_labels(&mut writer, &labels)?;
        writer.flush()?;
        Ok((path, labels))
    }
}

#[cfg(test)]
mod testing {
    use super::*;

    const WEKA_OUTPUT: &str = "
=== Predictions on test data ===

 inst#     actual  predicted error prediction
     1        1:?       2:1       0.871
     2        1:?      1:-1       0.993
     3        1:?       2:1       0.6

";

    #[test]
    fn test_parse_weka_listing() -> anyhow::Result<()> {
        let labels = parse_predictions(WEKA_OUTPUT)?;
        assert_eq!(
            labels,
            vec![Label::LongNonCoding, Label::Coding, Label::LongNonCoding]
        );
        Ok(())
    }

    #[test]
    fn test_unparsable_row() {
        let err = parse_predictions("  1   1:?   x   0.5\n").unwrap_err();
        assert!(matches!(
            err,
            crate::Error::ToolError(ToolError::UnparsableOutput(_))
        ));
    }

    #[test]
    fn test_label_report() -> anyhow::Result<()> {
        let mut out = Vec::new();
        write_labels(&mut out, &[Label::Coding, Label::LongNonCoding])?;
        assert_eq!(String::from_utf8(out)?, "coding\nlong-non-coding\n");
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_classify_with_stub_runtime() -> anyhow::Result<()> {
        use crate::toolchain::testing::script;

        let dir = tempfile::tempdir()?;
        let listing = dir.path().join("listing.txt");
        std::fs::write(&listing, WEKA_OUTPUT)?;
        let java = script(
            dir.path(),
            "java",
            &format!(
                "[ \"$3\" = \"{NAIVE_BAYES}\" ] || exit 2\ncat '{}'",
                listing.display()
            ),
        )?;
        let tools = ToolConfig {
            java,
            ..ToolConfig::default()
        };

        let relation = dir.path().join("wekatest.arff");
        let (path, labels) = Classifier::new(&tools).classify_into(&relation, dir.path())?;
        assert_eq!(labels.len(), 3);
        assert_eq!(
            std::fs::read_to_string(path)?,
            "long-non-coding\ncoding\nlong-non-coding\n"
        );
        Ok(())
    }
}
