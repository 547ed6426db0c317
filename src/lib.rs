//! # lncfeat
//!
//! Sequence-composition features for separating coding from long non-coding transcripts.
//!
//! Records are loaded from a multi-record sequence file, filtered by length and the absence
//! of ambiguous bases, and turned into six sparse feature vectors each: normalised k-mer
//! spectra for `k = 1..=5` and a 199-lag mismatch profile. Extraction runs on a bounded
//! number of worker threads and is written into seven aligned output streams in input
//! order. The resulting files drive an external LIBSVM / Weka toolchain that produces a
//! `coding` / `long-non-coding` label per record.

mod config;
mod error;
pub mod features;
pub mod parallel;
mod pipeline;
mod reader;
mod record;
pub mod sink;
pub mod toolchain;

pub use config::{PipelineConfig, PipelineConfigBuilder, ToolConfig};
pub use error::{
    ConfigError, DispatchError, Error, ExtractError, FormatError, Result, ToolError,
};
pub use features::{FeatureExtractor, FeatureKind, FeatureRecord, SparseVector, WindowConvention};
pub use parallel::{DispatchReport, Dispatcher, ParallelProcessor};
pub use pipeline::{remove_intermediates, ExtractSummary, Pipeline, RunSummary};
pub use reader::{clamp_threshold, RecordLoader, MIN_THRESHOLD};
pub use record::Record;
pub use sink::AlignedSink;
