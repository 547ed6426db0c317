use std::path::PathBuf;

/// Custom Result type for lncfeat operations, wrapping the custom [`Error`] type
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the lncfeat library, encompassing all possible error cases
/// that can occur while loading records, extracting features, and running the toolchain.
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    /// Errors raised while configuring a pipeline run
    ConfigError(#[from] ConfigError),
    /// Errors raised while extracting features from a single record
    ExtractError(#[from] ExtractError),
    /// Errors raised while parsing a sparse feature line
    FormatError(#[from] FormatError),
    /// Errors raised by the bounded dispatcher
    DispatchError(#[from] DispatchError),
    /// Errors raised by an external tool invocation
    ToolError(#[from] ToolError),
    /// Standard I/O errors from the Rust standard library
    IoError(#[from] std::io::Error),
    /// Errors from the bitnuc nucleotide processing library
    BitnucError(#[from] bitnuc::Error),
    /// Generic errors that can occur in any part of the system
    AnyhowError(#[from] anyhow::Error),
}

/// Errors describing an invalid pipeline configuration
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// No input path was provided
    #[error("No input sequence file was provided")]
    MissingInput,

    /// The worker count must be at least one
    #[error("Number of workers must be at least 1")]
    ZeroWorkers,
}

/// Errors that can occur while computing the feature vectors of a record
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    /// The sequence contains a symbol outside of the `ACGT` alphabet
    ///
    /// # Fields
    /// * `symbol` - The offending symbol
    /// * `position` - Zero-based position of the symbol in the sequence
    #[error("Invalid nucleotide '{symbol}' at position {position}")]
    InvalidNucleotide { symbol: char, position: usize },
}

/// Errors that can occur while parsing a sparse `label idx:value ...` line
#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    /// The line holds no label token
    #[error("Sparse line is missing its label")]
    MissingLabel,

    /// A token is not of the form `idx:value`
    ///
    /// # Arguments
    /// * `String` - The offending token
    #[error("Invalid sparse token: {0}")]
    InvalidToken(String),

    /// Indices must be 1-based and strictly ascending
    ///
    /// # Arguments
    /// * `usize` - The out-of-order index
    #[error("Sparse index {0} is zero or not strictly ascending")]
    UnorderedIndex(usize),
}

/// Errors raised while fanning extraction out across workers
#[derive(thiserror::Error, Debug)]
pub enum DispatchError {
    /// A worker thread panicked while processing a record
    ///
    /// # Arguments
    /// * `usize` - Submission index of the record
    #[error("Worker panicked while processing record {0}")]
    WorkerPanicked(usize),

    /// A worker returned an error for a record
    ///
    /// # Fields
    /// * `index` - Submission index of the record
    /// * `label` - Description of the item, e.g. the record's marker line
    /// * `source` - The underlying failure
    #[error("Failed to process record {index} ({label}): {source}")]
    TaskFailed {
        index: usize,
        label: String,
        #[source]
        source: Box<Error>,
    },

    /// One or more records could not be processed
    ///
    /// # Arguments
    /// * `usize` - Number of failed records
    /// * `usize` - Total number of submitted records
    #[error("{0} of {1} records failed feature extraction")]
    IncompleteRun(usize, usize),

    /// All result senders hung up before every record was accounted for
    #[error("Result channel closed after {0} of {1} records")]
    ChannelClosed(usize, usize),
}

/// Errors raised while driving the external scaling / prediction / classification tools
#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    /// The executable could not be located
    #[error("External tool not found: {}", .executable.display())]
    NotFound { executable: PathBuf },

    /// The tool exited with a non-zero status
    ///
    /// # Fields
    /// * `tool` - Human readable name of the stage
    /// * `status` - Exit code if the process was not killed by a signal
    /// * `stderr` - Captured standard error
    #[error("External tool '{tool}' failed with status {status:?}: {stderr}")]
    Failed {
        tool: String,
        status: Option<i32>,
        stderr: String,
    },

    /// Per-feature prediction files disagree on the number of records
    #[error("Prediction file {} has {found} lines, expected {expected}", .path.display())]
    Misaligned {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    /// A classifier output line could not be interpreted
    #[error("Unparsable classifier output line: {0}")]
    UnparsableOutput(String),
}
