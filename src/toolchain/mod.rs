//! External toolchain
//!
//! Thin wrappers around the LIBSVM and Weka command-line tools that consume the feature
//! files. Every invocation captures its exit status and standard error; a non-zero exit
//! becomes a [`ToolError::Failed`].

mod classify;
mod predict;
mod relation;
mod scale;

pub use classify::{parse_predictions, write_labels, Classifier, Label, LABEL_REPORT};
pub use predict::{prediction_path, PredictStage, PREDICTION_EXTENSION};
pub use relation::{build_relation, read_predictions, write_relation, RELATION_FILE};
pub use scale::ScaleStage;

use std::ffi::OsStr;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use log::debug;

use crate::error::{Result, ToolError};

/// Runs an external tool to completion, optionally redirecting its stdout into a file
///
/// Returns the captured output (stdout is empty when redirected).
pub(crate) fn run_tool<I, S>(
    tool: &str,
    executable: &Path,
    args: I,
    stdout: Option<&Path>,
) -> Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(executable);
    command.args(args).stdin(Stdio::null());
    if let Some(path) = stdout {
        command.stdout(File::create(path)?);
    }
    debug!("Running {tool}: {command:?}");

    let output = command.output().map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            ToolError::NotFound {
                executable: executable.to_path_buf(),
            }
            .into()
        } else {
            crate::Error::from(e)
        }
    })?;

    if !output.status.success() {
        return Err(ToolError::Failed {
            tool: tool.to_string(),
            status: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
        .into());
    }
    Ok(output)
}
