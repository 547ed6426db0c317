use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::features::{FeatureKind, WindowConvention};
use crate::reader::{clamp_threshold, MIN_THRESHOLD};

/// Default LIBSVM installation directory
pub const DEFAULT_LIBSVM_DIR: &str = "/libsvm-3.20";

/// Default Weka jar
pub const DEFAULT_WEKA_JAR: &str = "/weka-3-6-11/weka.jar";

/// Default directory holding range files, models, and the training relation
pub const DEFAULT_DATA_DIR: &str = "data";

/// Locations of the external toolchain and its reference files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    /// `svm-scale` executable
    pub svm_scale: PathBuf,
    /// `svm-predict` executable
    pub svm_predict: PathBuf,
    /// Java runtime used to launch Weka
    pub java: PathBuf,
    /// Weka jar placed on the classpath
    pub weka_jar: PathBuf,
    /// Directory with `<feature>.range`, `<feature>.model` and `wekatrain.arff`
    pub data_dir: PathBuf,
}
impl Default for ToolConfig {
    fn default() -> Self {
        Self::with_libsvm_dir(DEFAULT_LIBSVM_DIR)
    }
}
impl ToolConfig {
    /// Defaults with both LIBSVM executables taken from `dir`
    #[must_use]
    pub fn with_libsvm_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            svm_scale: dir.join("svm-scale"),
            svm_predict: dir.join("svm-predict"),
            java: PathBuf::from("java"),
            weka_jar: PathBuf::from(DEFAULT_WEKA_JAR),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }

    /// Reference scaling range for a feature type
    #[must_use]
    pub fn range_path(&self, kind: FeatureKind) -> PathBuf {
        self.data_dir.join(format!("{}.range", kind.name()))
    }

    /// Pretrained SVM model for a feature type
    #[must_use]
    pub fn model_path(&self, kind: FeatureKind) -> PathBuf {
        self.data_dir.join(format!("{}.model", kind.name()))
    }

    /// Labelled relation the Naive Bayes classifier is trained on
    #[must_use]
    pub fn training_relation(&self) -> PathBuf {
        self.data_dir.join("wekatrain.arff")
    }
}

/// Settings for a complete pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Input sequence file
    pub input: PathBuf,
    /// Minimum accepted sequence length (at least [`MIN_THRESHOLD`])
    pub threshold: usize,
    /// Maximum number of concurrent workers
    pub workers: NonZeroUsize,
    /// Directory receiving every output and intermediate file
    pub out_dir: PathBuf,
    /// Window start convention for the k-mer spectra
    pub convention: WindowConvention,
    /// Keep the feature, prediction, and relation files after the run
    pub keep_intermediates: bool,
    /// Stop once the feature files are written
    pub extract_only: bool,
    /// External toolchain locations
    pub tools: ToolConfig,
}
impl PipelineConfig {
    #[must_use]
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }
}

/// A builder for [`PipelineConfig`]
///
/// ```rust,no_run
/// use lncfeat::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .input("transcripts.fa")
///     .threshold(300)
///     .workers(4)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    input: Option<PathBuf>,
    threshold: Option<usize>,
    workers: Option<usize>,
    out_dir: Option<PathBuf>,
    convention: Option<WindowConvention>,
    keep_intermediates: Option<bool>,
    extract_only: Option<bool>,
    tools: Option<ToolConfig>,
}
impl PipelineConfigBuilder {
    #[must_use]
    pub fn input<P: Into<PathBuf>>(mut self, input: P) -> Self {
        self.input = Some(input.into());
        self
    }

    /// Values below [`MIN_THRESHOLD`] are raised with a warning at build time
    #[must_use]
    pub fn threshold(mut self, threshold: usize) -> Self {
        self.threshold = Some(threshold);
        self
    }

    #[must_use]
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    #[must_use]
    pub fn out_dir<P: Into<PathBuf>>(mut self, out_dir: P) -> Self {
        self.out_dir = Some(out_dir.into());
        self
    }

    #[must_use]
    pub fn convention(mut self, convention: WindowConvention) -> Self {
        self.convention = Some(convention);
        self
    }

    #[must_use]
    pub fn keep_intermediates(mut self, keep: bool) -> Self {
        self.keep_intermediates = Some(keep);
        self
    }

    #[must_use]
    pub fn extract_only(mut self, extract_only: bool) -> Self {
        self.extract_only = Some(extract_only);
        self
    }

    #[must_use]
    pub fn tools(mut self, tools: ToolConfig) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn build(self) -> Result<PipelineConfig> {
        let input = self.input.ok_or(ConfigError::MissingInput)?;
        let workers =
            NonZeroUsize::new(self.workers.unwrap_or(1)).ok_or(ConfigError::ZeroWorkers)?;
        Ok(PipelineConfig {
            input,
            threshold: clamp_threshold(self.threshold.unwrap_or(MIN_THRESHOLD)),
            workers,
            out_dir: self.out_dir.unwrap_or_else(|| PathBuf::from(".")),
            convention: self.convention.unwrap_or_default(),
            keep_intermediates: self.keep_intermediates.unwrap_or(false),
            extract_only: self.extract_only.unwrap_or(false),
            tools: self.tools.unwrap_or_default(),
        })
    }
}
