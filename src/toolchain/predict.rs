use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::run_tool;
use crate::config::ToolConfig;
use crate::error::Result;
use crate::features::FeatureKind;
use crate::parallel::ParallelProcessor;
use crate::sink::feature_path;

/// Extension of the per-feature prediction files
pub const PREDICTION_EXTENSION: &str = "wekatest";

/// Path of the prediction file for `kind` inside `dir`
#[must_use]
pub fn prediction_path(dir: &Path, kind: FeatureKind) -> PathBuf {
    dir.join(format!("{}.{PREDICTION_EXTENSION}", kind.name()))
}

/// Runs `svm-predict` on a scaled feature file with the pretrained model for its type
#[derive(Debug, Clone)]
pub struct PredictStage {
    tools: Arc<ToolConfig>,
    dir: PathBuf,
}
impl PredictStage {
    #[must_use]
    pub fn new(tools: Arc<ToolConfig>, dir: impl Into<PathBuf>) -> Self {
        Self {
            tools,
            dir: dir.into(),
        }
    }

    pub fn predict(&self, kind: FeatureKind) -> Result<PathBuf> {
        let input = feature_path(&self.dir, kind);
        let model = self.tools.model_path(kind);
        let output = prediction_path(&self.dir, kind);
        run_tool(
            "svm-predict",
            &self.tools.svm_predict,
            [
                OsStr::new("-q"),
                input.as_os_str(),
                model.as_os_str(),
                output.as_os_str(),
            ],
            None,
        )?;
        Ok(output)
    }
}

impl ParallelProcessor<FeatureKind> for PredictStage {
    type Output = PathBuf;

    fn process(&mut self, kind: FeatureKind) -> Result<PathBuf> {
        self.predict(kind)
    }

    fn label(&self, kind: &FeatureKind) -> String {
        format!("svm-predict {}", kind.name())
    }
}
