//! Global `tracing` subscriber installation.

use thiserror::Error;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Layer, Registry};

use crate::config::{LogFormat, LogOutput, LoggerConfig};

/// Errors raised while setting up logging.
#[derive(Error, Debug)]
pub enum LoggerError {
    /// A global subscriber is already installed
    #[error("failed to install tracing subscriber: {0}")]
    AlreadyInstalled(#[from] TryInitError),
}

/// Installs a global subscriber built from `config`.
///
/// `RUST_LOG` takes precedence over `config.level` when set. Timestamps are
/// RFC 3339 in UTC. Every event carries its caller (target, file and line);
/// JSON output also carries the current span and the full span list for
/// correlation. Returns an error instead of panicking if a subscriber is
/// already installed.
pub fn init_tracing(config: &LoggerConfig) -> Result<(), LoggerError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.filter_directive()));

    tracing_subscriber::registry()
        .with(fmt_layer(config, writer_for(config.output)))
        .with(filter)
        .try_init()?;

    Ok(())
}

fn writer_for(output: LogOutput) -> BoxMakeWriter {
    match output {
        LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
    }
}

fn fmt_layer(
    config: &LoggerConfig,
    writer: BoxMakeWriter,
) -> Box<dyn Layer<Registry> + Send + Sync> {
    let layer = tracing_subscriber::fmt::layer()
        .with_timer(ChronoUtc::rfc_3339())
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(writer);

    match config.format {
        LogFormat::Json => layer
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .boxed(),
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    }
}
