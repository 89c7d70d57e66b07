//! Error types for batch scans.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use tessel_syntax::SyntaxError;

/// A failure confined to a single file.
///
/// Recorded in the report alongside successful files unless the scan runs
/// in fail-fast mode.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FileError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// The file that failed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The file exceeds the configured size limit.
    #[error("{} is {size} bytes, above the {limit} byte limit", path.display())]
    TooLarge {
        /// The file that failed.
        path: PathBuf,
        /// Size of the file on disk.
        size: u64,
        /// The configured limit.
        limit: u64,
    },

    /// No language is configured and none can be inferred from the path.
    #[error("could not determine language for {}", path.display())]
    UnknownLanguage {
        /// The file that failed.
        path: PathBuf,
    },

    /// The parser failed on the file.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        /// The file that failed.
        path: PathBuf,
        /// The parser error.
        #[source]
        source: SyntaxError,
    },
}

impl FileError {
    /// Returns the file the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Read { path, .. }
            | Self::TooLarge { path, .. }
            | Self::UnknownLanguage { path }
            | Self::Parse { path, .. } => path,
        }
    }

    /// Returns whether the parser could not be set up at all. Such failures
    /// affect every file of the language and abort the scan.
    #[must_use]
    pub const fn is_setup_failure(&self) -> bool {
        matches!(self, Self::Parse { source, .. } if source.is_setup_failure())
    }
}

/// A failure of the batch as a whole.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScanError {
    /// The worker pool could not be built.
    #[error("failed to build scan worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A directory walk failed during discovery.
    #[error("failed to discover files: {0}")]
    Discovery(#[from] ignore::Error),

    /// A file failed while the scan ran in fail-fast mode.
    #[error("scan stopped at input {index}: {source}")]
    FileFailed {
        /// Position of the file in the input list.
        index: usize,
        /// The file's error.
        #[source]
        source: Box<FileError>,
    },

    /// A grammar could not be loaded.
    #[error("parser setup failed: {source}")]
    ParserSetup {
        /// The first file that hit the failure.
        #[source]
        source: Box<FileError>,
    },

    /// The background scan thread panicked.
    #[error("background scan thread panicked")]
    WorkerPanicked,
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(tracing::subscriber::SetGlobalDefaultError),
}
