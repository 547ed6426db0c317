use std::ffi::OsStr;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use log::debug;

use super::run_tool;
use crate::config::ToolConfig;
use crate::error::Result;
use crate::features::FeatureKind;
use crate::parallel::ParallelProcessor;
use crate::sink::feature_path;

/// Rescales a raw feature file in place with `svm-scale` and the reference range for its type
#[derive(Debug, Clone)]
pub struct ScaleStage {
    tools: Arc<ToolConfig>,
    dir: PathBuf,
}
impl ScaleStage {
    #[must_use]
    pub fn new(tools: Arc<ToolConfig>, dir: impl Into<PathBuf>) -> Self {
        Self {
            tools,
            dir: dir.into(),
        }
    }

    pub fn scale(&self, kind: FeatureKind) -> Result<()> {
        let input = feature_path(&self.dir, kind);
        let mut scaled = input.clone().into_os_string();
        scaled.push(".scale");
        let scaled = PathBuf::from(scaled);

        let range = self.tools.range_path(kind);
        run_tool(
            "svm-scale",
            &self.tools.svm_scale,
            [OsStr::new("-r"), range.as_os_str(), input.as_os_str()],
            Some(&scaled),
        )?;
        fs::rename(&scaled, &input)?;
        debug!("Scaled {}", input.display());
        Ok(())
    }
}

impl ParallelProcessor<FeatureKind> for ScaleStage {
    type Output = ();

    fn process(&mut self, kind: FeatureKind) -> Result<()> {
        self.scale(kind)
    }

    fn label(&self, kind: &FeatureKind) -> String {
        format!("svm-scale {}", kind.name())
    }
}
