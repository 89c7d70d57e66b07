//! Structured logging for scan hosts.
//!
//! The scanner only emits `tracing` events. A host either installs a
//! process-wide subscriber once with [`initialise`], or builds one with
//! [`subscriber`] and scopes it around a scan with
//! `tracing::subscriber::with_default`. The batch summary is emitted on the
//! calling thread, so a scoped subscriber sees it; per-file events come from
//! pool workers and only reach a global subscriber.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::Subscriber;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{self, MakeWriter, time::UtcTime};
use tracing_subscriber::prelude::*;

use crate::config::{LogFormat, TelemetryConfig};
use crate::error::TelemetryError;

static INSTALLED: OnceCell<()> = OnceCell::new();

/// A subscriber built by [`subscriber`].
pub type ScanSubscriber = Box<dyn Subscriber + Send + Sync>;

/// Handle returned when telemetry has been initialised.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Installs a stderr subscriber as the global default on the first call.
///
/// Later calls return a fresh [`TelemetryHandle`] without touching the
/// global state, whatever configuration they pass.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for an invalid filter directive and
/// [`TelemetryError::Subscriber`] when another subscriber is already
/// installed globally.
pub fn initialise(config: &TelemetryConfig) -> Result<TelemetryHandle, TelemetryError> {
    INSTALLED
        .get_or_try_init(|| {
            let built = subscriber(config, io::stderr)?;
            tracing::subscriber::set_global_default(built).map_err(TelemetryError::Subscriber)
        })
        .map(|_| TelemetryHandle)
}

/// Builds a subscriber that writes scan events to `writer` in the
/// configured format, without installing it.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for an invalid filter directive.
pub fn subscriber<W>(config: &TelemetryConfig, writer: W) -> Result<ScanSubscriber, TelemetryError>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_new(&config.log_filter)
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let registry = tracing_subscriber::registry().with(filter);
    let layer = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_thread_names(true)
        .with_timer(UtcTime::rfc_3339());

    let built: ScanSubscriber = match config.log_format {
        LogFormat::Json => Box::new(registry.with(layer.json().flatten_event(true).with_ansi(false))),
        LogFormat::Compact => Box::new(
            registry.with(layer.compact().with_ansi(io::stderr().is_terminal())),
        ),
    };
    Ok(built)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_filter_is_reported() {
        let config = TelemetryConfig::default().with_log_filter("tessel_scan=notalevel");
        let result = subscriber(&config, io::sink);
        assert!(matches!(result, Err(TelemetryError::Filter(_))));
    }

    #[test]
    fn both_formats_build() {
        for format in [LogFormat::Json, LogFormat::Compact] {
            let config = TelemetryConfig::default().with_log_format(format);
            assert!(subscriber(&config, io::sink).is_ok());
        }
    }

    #[test]
    fn initialise_is_idempotent() {
        let config = TelemetryConfig::default().with_log_format(LogFormat::Compact);
        initialise(&config).expect("first initialisation");
        initialise(&config).expect("second initialisation");
    }
}
