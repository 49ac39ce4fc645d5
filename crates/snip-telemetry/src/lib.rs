//! Tracing setup for Snip binaries.
//!
//! [`init`] installs a `tracing-subscriber` registry with a formatted
//! stderr layer and, optionally, a [`JournalLayer`] that keeps the most
//! recent events in a [`LogJournal`] so they can be persisted next to the
//! URL records.

pub mod error;
pub mod journal;

pub use error::TelemetryError;
pub use journal::{JournalLayer, LogEntry, LogJournal, LOGS_KEY};

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};
use typed_builder::TypedBuilder;

/// Stderr filter when neither `RUST_LOG` nor a directive is given. The
/// journal keeps capturing `info` regardless.
pub const DEFAULT_FILTER: &str = "warn";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(TelemetryError::UnknownFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, TypedBuilder)]
pub struct TelemetryConfig {
    #[builder(default)]
    pub format: LogFormat,
    /// Directive for the stderr layer, used when `RUST_LOG` is unset.
    #[builder(default = DEFAULT_FILTER.to_string(), setter(into))]
    pub filter: String,
    /// Journal that receives every event at `info` and above, regardless of
    /// the stderr filter.
    #[builder(default, setter(strip_option))]
    pub journal: Option<LogJournal>,
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter)?,
    };

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Pretty => fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed(),
    };

    let journal_layer = config
        .journal
        .clone()
        .map(|journal| JournalLayer::new(journal).with_filter(LevelFilter::INFO));

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(journal_layer)
        .try_init()?;

    Ok(())
}
