use clap::{Parser, Subcommand, ValueEnum};
use snip_core::shortener::DEFAULT_CLICK_SOURCE;
use snip_telemetry::LogFormat;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const STORAGE_BACKEND_ENV: &str = "SNIP_STORAGE_BACKEND";
pub const DATA_DIR_ENV: &str = "SNIP_DATA_DIR";
pub const BASE_URL_ENV: &str = "SNIP_BASE_URL";
pub const LOG_FORMAT_ENV: &str = "SNIP_LOG_FORMAT";
pub const LOG_FILTER_ENV: &str = "SNIP_LOG";

pub const DEFAULT_DATA_DIR: &str = ".snip";
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_VALIDITY: &str = "30";
/// Most URLs a single `shorten` accepts.
pub const MAX_BATCH: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "file")]
    File,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::File => write!(f, "file"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "snip", about = "Shorten URLs and inspect their clicks")]
pub struct CLI {
    #[arg(
        long,
        global = true,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::File
    )]
    pub storage: StorageBackendArg,

    /// Directory holding the record set and the persisted logs.
    #[arg(long, global = true, env = DATA_DIR_ENV, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Prefix used to display full short URLs.
    #[arg(long, global = true, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(
        long,
        global = true,
        env = LOG_FORMAT_ENV,
        value_enum,
        default_value_t = LogFormatArg::Pretty
    )]
    pub log_format: LogFormatArg,

    /// Filter directive for log output on stderr; `RUST_LOG` wins if set.
    #[arg(long, global = true, env = LOG_FILTER_ENV, default_value = snip_telemetry::DEFAULT_FILTER)]
    pub log_filter: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Create up to five short URLs.
    ///
    /// `--validity` and `--code` may be repeated; the n-th value applies to
    /// the n-th URL. URLs without one get 30 minutes and a generated code.
    Shorten {
        /// Long URLs, http or https.
        #[arg(value_name = "URL", required = true, num_args = 1..=MAX_BATCH)]
        urls: Vec<String>,
        /// Minutes a short URL stays active (1-10080).
        #[arg(long)]
        validity: Vec<String>,
        /// Custom shortcode, 3-10 alphanumeric characters.
        #[arg(long)]
        code: Vec<String>,
    },
    /// Follow a short URL: records a redirect click if it is active.
    Open { code: String },
    /// Record a click without following the URL.
    Click {
        code: String,
        #[arg(long, default_value = DEFAULT_CLICK_SOURCE)]
        source: String,
    },
    /// Show one short URL with its clicks.
    Show { code: String },
    /// List every short URL.
    List,
    /// Summarize every short URL and its clicks.
    Stats {
        /// Print machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show persisted application logs.
    Logs {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Read commands from stdin, one per line, against the same store.
    Session,
}

/// One line of a `session`, parsed without a binary name.
#[derive(Debug, Parser)]
#[command(no_binary_name = true)]
pub struct SessionLine {
    #[command(subcommand)]
    pub command: Command,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        CLI::command().debug_assert();
    }

    #[test]
    fn shorten_defaults() {
        let cli = CLI::try_parse_from(["snip", "shorten", "https://example.com"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Shorten {
                urls: vec!["https://example.com".to_string()],
                validity: vec![],
                code: vec![],
            }
        );
        assert_eq!(cli.storage, StorageBackendArg::File);
    }

    #[test]
    fn shorten_takes_repeated_options_per_url() {
        let cli = CLI::try_parse_from([
            "snip",
            "shorten",
            "https://a.com",
            "https://b.com",
            "--validity",
            "10",
            "--code",
            "abc123",
            "--validity",
            "5",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Command::Shorten {
                urls: vec!["https://a.com".to_string(), "https://b.com".to_string()],
                validity: vec!["10".to_string(), "5".to_string()],
                code: vec!["abc123".to_string()],
            }
        );
    }

    #[test]
    fn shorten_accepts_at_most_five_urls() {
        let six: Vec<String> = (0..6).map(|i| format!("https://{i}.com")).collect();
        let args = ["snip", "shorten"].into_iter().map(String::from).chain(six);
        assert!(CLI::try_parse_from(args).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = CLI::try_parse_from(["snip", "list", "--storage", "in-memory"]).unwrap();
        assert_eq!(cli.storage, StorageBackendArg::InMemory);
        assert_eq!(cli.command, Command::List);
    }

    #[test]
    fn session_line_parses_without_binary_name() {
        let line = SessionLine::try_parse_from(["click", "abc123", "--source", "qr"]).unwrap();
        assert_eq!(
            line.command,
            Command::Click {
                code: "abc123".to_string(),
                source: "qr".to_string(),
            }
        );
    }
}
