//! Pipeline orchestration
//!
//! Loads and filters the input records, fans feature extraction out across workers into
//! the aligned sink, then drives the external toolchain: scaling, per-feature SVM
//! prediction, relation assembly, and Naive Bayes classification.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::features::{FeatureExtractor, FeatureKind};
use crate::parallel::Dispatcher;
use crate::reader::RecordLoader;
use crate::sink::{feature_path, AlignedSink};
use crate::toolchain::{
    build_relation, prediction_path, Classifier, Label, PredictStage, ScaleStage, RELATION_FILE,
};

/// Outcome of the extraction stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Records accepted by the loader
    pub accepted: usize,
    /// Records written to every output stream
    pub written: usize,
}

/// Outcome of a full pipeline run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub extract: ExtractSummary,
    /// Per-record labels; `None` in extract-only mode
    pub labels: Option<Vec<Label>>,
    /// Path of the label report, if one was written
    pub report: Option<PathBuf>,
}

pub struct Pipeline {
    config: PipelineConfig,
}
impl Pipeline {
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn dispatcher(&self) -> Result<Dispatcher> {
        Dispatcher::new(self.config.workers.get())
    }

    /// Writes the six feature files and the sequence log into the output directory
    ///
    /// Line `i` of every stream belongs to the `i`-th accepted record. Fails if any record
    /// could not be processed.
    pub fn extract(&self) -> Result<ExtractSummary> {
        let out_dir = &self.config.out_dir;
        fs::create_dir_all(out_dir)?;

        let records = RecordLoader::new(self.config.threshold).load(&self.config.input)?;
        let accepted = records.len();
        info!(
            "Accepted {accepted} records from {}",
            self.config.input.display()
        );

        let sink = AlignedSink::create(out_dir)?;
        let report = self.dispatcher()?.process_parallel(
            records,
            FeatureExtractor::new(self.config.convention),
            |_, features| sink.write_record(&features),
        )?;
        let written = sink.records_written();
        sink.finish()?;
        debug!("Wrote {written} records to {}", out_dir.display());

        report.into_result()?;
        Ok(ExtractSummary { accepted, written })
    }

    /// Runs every stage and writes the label report
    pub fn run(&self) -> Result<RunSummary> {
        info!("extracting data");
        let extract = self.extract()?;
        if self.config.extract_only {
            info!("done");
            return Ok(RunSummary {
                extract,
                labels: None,
                report: None,
            });
        }

        let out_dir = self.config.out_dir.as_path();
        let tools = Arc::new(self.config.tools.clone());
        let dispatcher = self.dispatcher()?;

        info!("scaling data");
        dispatcher
            .process_parallel(
                FeatureKind::ALL.to_vec(),
                ScaleStage::new(Arc::clone(&tools), out_dir),
                |_, ()| Ok(()),
            )?
            .into_first_error()?;

        info!("svm-classification");
        dispatcher
            .process_parallel(
                FeatureKind::ALL.to_vec(),
                PredictStage::new(Arc::clone(&tools), out_dir),
                |_, path| {
                    debug!("Wrote {}", path.display());
                    Ok(())
                },
            )?
            .into_first_error()?;

        info!("combining data");
        let (relation, rows) = build_relation(out_dir)?;
        debug!("Relation has {rows} rows");

        info!("naivebayes-classification");
        let (report, labels) = Classifier::new(&tools).classify_into(&relation, out_dir)?;

        if !self.config.keep_intermediates {
            remove_intermediates(out_dir)?;
        }
        info!("done");

        Ok(RunSummary {
            extract,
            labels: Some(labels),
            report: Some(report),
        })
    }
}

/// Deletes the feature, prediction, and relation files, ignoring ones that do not exist
pub fn remove_intermediates(dir: &Path) -> Result<()> {
    let mut paths: Vec<PathBuf> = FeatureKind::ALL
        .iter()
        .flat_map(|&kind| [feature_path(dir, kind), prediction_path(dir, kind)])
        .collect();
    paths.push(dir.join(RELATION_FILE));

    for path in paths {
        match fs::remove_file(&path) {
            Ok(()) => debug!("Removed {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
