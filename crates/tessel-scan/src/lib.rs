//! Batch structural search over files.
//!
//! A [`Scanner`] runs one compiled matcher, either a bare
//! [`tessel_syntax::Pattern`] or a [`tessel_rule::RuleCore`], over a list of
//! files in parallel:
//!
//! - every file is read, parsed and searched on its own worker
//! - per-file failures are recorded in the [`ScanReport`] without stopping
//!   the batch, unless [`ScanConfig::fail_fast`] is set
//! - outcomes come back in input order whatever order workers finish in
//! - a [`CancellationToken`] stops the batch between files
//!
//! [`discover_files`] turns directories into a file list. Hosts that want
//! the scan's structured logs call [`telemetry::initialise`] once, or scope
//! a [`telemetry::subscriber`] around a scan.
//!
//! # Example
//!
//! ```no_run
//! use tessel_scan::{ScanConfig, Scanner, TelemetryConfig, discover_files, telemetry};
//! use tessel_syntax::{Pattern, SupportedLanguage};
//!
//! telemetry::initialise(&TelemetryConfig::default())?;
//! let pattern = Pattern::compile("console.log($$$ARGS)", SupportedLanguage::JavaScript)?;
//! let files = discover_files(&["src"], Some(SupportedLanguage::JavaScript))?;
//! let report = Scanner::new(pattern, ScanConfig::default()).scan(&files)?;
//! for record in report.records() {
//!     println!("{}:{}", record.file, record.range.start.line);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod cancel;
mod config;
mod discover;
mod error;
mod report;
mod scanner;
pub mod telemetry;

pub use cancel::CancellationToken;
pub use config::{DEFAULT_LOG_FILTER, DEFAULT_MAX_FILE_BYTES, LogFormat, ScanConfig, TelemetryConfig};
pub use discover::discover_files;
pub use error::{FileError, ScanError, TelemetryError};
pub use report::{CaptureRecord, FileMatches, FileOutcome, MatchRecord, ScanReport};
pub use scanner::{ScanHandle, Scanner};
