//! Configuration for batch scans and telemetry.

use std::num::NonZeroUsize;
use std::thread;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use tessel_syntax::{OverlapPolicy, SupportedLanguage};

/// Default upper bound on the size of a scanned file.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 8 * 1024 * 1024;

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Options for a [`Scanner`](crate::Scanner).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ScanConfig {
    /// Worker count. `None` uses the available parallelism.
    pub threads: Option<NonZeroUsize>,
    /// Stop at the first failing file instead of recording it.
    pub fail_fast: bool,
    /// Parse every file as this language instead of inferring it from the
    /// path.
    pub language: Option<SupportedLanguage>,
    /// Whether matches nested inside other matches are reported.
    pub overlap: OverlapPolicy,
    /// Files larger than this are reported as too large, never truncated.
    pub max_file_bytes: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            threads: None,
            fail_fast: false,
            language: None,
            overlap: OverlapPolicy::default(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

impl ScanConfig {
    /// Sets the worker count.
    #[must_use]
    pub const fn with_threads(mut self, threads: NonZeroUsize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Enables or disables fail-fast mode.
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Forces every file to be parsed as `language`.
    #[must_use]
    pub const fn with_language(mut self, language: SupportedLanguage) -> Self {
        self.language = Some(language);
        self
    }

    /// Sets the overlap policy.
    #[must_use]
    pub const fn with_overlap(mut self, overlap: OverlapPolicy) -> Self {
        self.overlap = overlap;
        self
    }

    /// Sets the file size limit.
    #[must_use]
    pub const fn with_max_file_bytes(mut self, max_file_bytes: u64) -> Self {
        self.max_file_bytes = max_file_bytes;
        self
    }

    /// Returns the number of workers the scan will use.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.threads
            .or_else(|| thread::available_parallelism().ok())
            .map_or(1, NonZeroUsize::get)
    }
}

/// Supported logging output formats.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON, one object per event.
    #[default]
    Json,
    /// Human-readable single line output.
    Compact,
}

/// Options for [`telemetry::initialise`](crate::telemetry::initialise) and
/// [`telemetry::subscriber`](crate::telemetry::subscriber).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct TelemetryConfig {
    /// `EnvFilter` directive, e.g. `info,tessel_scan=debug`.
    pub log_filter: String,
    /// Output format.
    pub log_format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            log_format: LogFormat::default(),
        }
    }
}

impl TelemetryConfig {
    /// Sets the filter directive.
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Sets the output format.
    #[must_use]
    pub const fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn scan_defaults_are_applied_to_missing_fields() {
        let config: ScanConfig = serde_json::from_value(json!({ "failFast": true })).expect("decode");
        assert!(config.fail_fast);
        assert_eq!(config.max_file_bytes, DEFAULT_MAX_FILE_BYTES);
        assert_eq!(config.overlap, OverlapPolicy::All);
        assert!(config.worker_count() >= 1);
    }

    #[test]
    fn scan_config_decodes_every_field() {
        let config: ScanConfig = serde_json::from_value(json!({
            "threads": 3,
            "language": "tsx",
            "overlap": "outermost",
            "maxFileBytes": 1024,
        }))
        .expect("decode");

        assert_eq!(config.worker_count(), 3);
        assert_eq!(config.language, Some(SupportedLanguage::Tsx));
        assert_eq!(config.overlap, OverlapPolicy::Outermost);
        assert_eq!(config.max_file_bytes, 1024);
    }

    #[test]
    fn unknown_scan_fields_are_rejected() {
        let result = serde_json::from_value::<ScanConfig>(json!({ "thread": 3 }));
        assert!(result.is_err());
    }

    #[test]
    fn zero_threads_is_rejected() {
        let result = serde_json::from_value::<ScanConfig>(json!({ "threads": 0 }));
        assert!(result.is_err());
    }

    #[rstest]
    #[case("json", LogFormat::Json)]
    #[case("COMPACT", LogFormat::Compact)]
    fn log_format_parses_case_insensitively(#[case] input: &str, #[case] expected: LogFormat) {
        assert_eq!(input.parse::<LogFormat>(), Ok(expected));
    }

    #[test]
    fn telemetry_builders_override_defaults() {
        let config = TelemetryConfig::default()
            .with_log_filter("debug")
            .with_log_format(LogFormat::Compact);
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.log_format.to_string(), "compact");
    }
}
