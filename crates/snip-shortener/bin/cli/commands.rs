use crate::cli::{Command, SessionLine, DEFAULT_VALIDITY};
use anyhow::{bail, Context};
use clap::Parser;
use snip_core::{
    validate_url, Resolution, ShortCode, ShortenParams, Shortener, UrlRecord, ValidationError,
    ValidityPeriod,
};
use snip_storage::KeyValueStore;
use snip_telemetry::LogJournal;
use std::fmt::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

/// Runs CLI commands against a shortener and renders their output.
pub struct App {
    shortener: Arc<dyn Shortener>,
    kv: Arc<dyn KeyValueStore>,
    base_url: String,
}

impl App {
    pub fn new(
        shortener: Arc<dyn Shortener>,
        kv: Arc<dyn KeyValueStore>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            shortener,
            kv,
            base_url: base_url.into(),
        }
    }

    /// Executes one command and returns what should be printed.
    pub async fn run(&self, command: Command) -> anyhow::Result<String> {
        match command {
            Command::Shorten {
                urls,
                validity,
                code,
            } => self.shorten(&urls, &validity, &code).await,
            Command::Open { code } => self.open(&code).await,
            Command::Click { code, source } => {
                match self.shortener.record_click(&code, &source).await? {
                    Some(record) => Ok(format!(
                        "recorded {} click for {} ({} total)\n",
                        source,
                        record.shortcode,
                        record.clicks().len()
                    )),
                    None => bail!("short URL not found: {code}"),
                }
            }
            Command::Show { code } => match self.shortener.get_url_by_shortcode(&code).await? {
                Some(record) => Ok(self.render_record(&record)),
                None => bail!("short URL not found: {code}"),
            },
            Command::List => self.list().await,
            Command::Stats { json } => self.stats(json).await,
            Command::Logs { limit } => self.logs(limit).await,
            Command::Session => bail!("session cannot be nested"),
        }
    }

    /// Reads commands from stdin until EOF. A failing line is reported and
    /// the session continues.
    pub async fn session(&self) -> anyhow::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
            let words: Vec<&str> = line.split_whitespace().collect();
            if words.is_empty() {
                continue;
            }
            if matches!(words[0], "exit" | "quit") {
                break;
            }

            let command = match SessionLine::try_parse_from(words) {
                Ok(parsed) => parsed.command,
                Err(e) => {
                    eprintln!("{e}");
                    continue;
                }
            };

            match self.run(command).await {
                Ok(output) => print!("{output}"),
                Err(e) => eprintln!("error: {e:#}"),
            }
        }

        Ok(())
    }

    /// Shortens every URL. All entries are validated before any is created;
    /// once creation starts a failing entry does not stop the others.
    async fn shorten(
        &self,
        urls: &[String],
        validities: &[String],
        codes: &[String],
    ) -> anyhow::Result<String> {
        info!(count = urls.len(), "starting url shortening");

        if validities.len() > urls.len() || codes.len() > urls.len() {
            bail!(
                "got {} URLs but {} validity values and {} codes",
                urls.len(),
                validities.len(),
                codes.len()
            );
        }

        let label = |i: usize| match urls.len() {
            1 => String::new(),
            _ => format!("entry {} ", i + 1),
        };

        let mut entries = Vec::with_capacity(urls.len());
        let mut problems = Vec::new();
        for (i, url) in urls.iter().enumerate() {
            let validity = validities.get(i).map_or(DEFAULT_VALIDITY, String::as_str);
            let code = codes.get(i).map_or("", String::as_str);
            match parse_entry(url, validity, code) {
                Ok(params) => entries.push(params),
                Err(errors) => problems.extend(
                    errors
                        .iter()
                        .map(|e| format!("  {}{}: {}", label(i), e.field(), e)),
                ),
            }
        }
        if !problems.is_empty() {
            bail!("invalid input:\n{}", problems.join("\n"));
        }

        let mut out = String::new();
        let mut failures = Vec::new();
        for (i, params) in entries.into_iter().enumerate() {
            match self.shortener.create_short_url(params).await {
                Ok(record) => out.push_str(&self.render_record(&record)),
                Err(e) => match e.field() {
                    Some(field) => failures.push(format!("  {}{field}: {e}", label(i))),
                    None => failures.push(format!("  {}{e}", label(i))),
                },
            }
        }
        info!(created = urls.len() - failures.len(), "url shortening completed");

        match (failures.is_empty(), out.is_empty()) {
            (true, _) => Ok(out),
            (false, true) => bail!("failed to shorten:\n{}", failures.join("\n")),
            (false, false) => Ok(format!("{out}\nfailed to shorten:\n{}\n", failures.join("\n"))),
        }
    }

    async fn open(&self, code: &str) -> anyhow::Result<String> {
        match self.shortener.resolve(code).await? {
            Resolution::Redirect(record) => Ok(format!("Redirecting to {}\n", record.long_url)),
            Resolution::Expired(record) => {
                bail!("this short URL has expired (at {})", record.expires_at)
            }
            Resolution::NotFound => bail!("short URL not found: {code}"),
        }
    }

    async fn list(&self) -> anyhow::Result<String> {
        let records = self.shortener.get_all_urls().await?;
        if records.is_empty() {
            return Ok("No URLs have been shortened yet.\n".to_string());
        }

        let mut out = String::new();
        for record in &records {
            let status = if self.shortener.is_expired(record) {
                "Expired"
            } else {
                "Active"
            };
            writeln!(
                out,
                "{:<10} {:<8} {:>4} clicks  {}",
                record.shortcode,
                status,
                record.clicks().len(),
                record.long_url
            )?;
        }
        Ok(out)
    }

    async fn stats(&self, json: bool) -> anyhow::Result<String> {
        let stats = self.shortener.stats().await?;
        if json {
            return Ok(serde_json::to_string_pretty(&stats)? + "\n");
        }

        let mut out = String::new();
        writeln!(
            out,
            "{} URLs ({} active, {} expired), {} clicks",
            stats.total_urls, stats.active_urls, stats.expired_urls, stats.total_clicks
        )?;
        for url in &stats.urls {
            writeln!(
                out,
                "\n{}  [{}]  {}",
                url.shortcode.to_url(&self.base_url),
                url.status,
                url.long_url
            )?;
            writeln!(out, "  created {}  expires {}", url.created_at, url.expires_at)?;
            if url.clicks.is_empty() {
                writeln!(out, "  No clicks yet")?;
            }
            for click in &url.clicks {
                writeln!(
                    out,
                    "  - {}  {}  {}",
                    click.timestamp, click.source, click.location
                )?;
            }
        }
        Ok(out)
    }

    async fn logs(&self, limit: usize) -> anyhow::Result<String> {
        let entries = LogJournal::load(self.kv.as_ref()).await?;
        let skip = entries.len().saturating_sub(limit);

        let mut out = String::new();
        for entry in entries.iter().skip(skip) {
            write!(
                out,
                "[{}] {}: {}",
                entry.timestamp,
                entry.level.to_uppercase(),
                entry.message
            )?;
            if !entry.data.is_empty() {
                write!(out, " {}", serde_json::Value::Object(entry.data.clone()))?;
            }
            writeln!(out)?;
        }
        Ok(out)
    }

    fn render_record(&self, record: &UrlRecord) -> String {
        let status = if self.shortener.is_expired(record) {
            "Expired"
        } else {
            "Active"
        };
        format!(
            "short url:  {}\nlong url:   {}\ncreated:    {}\nexpires:    {}\nstatus:     {}\nclicks:     {}\n",
            record.shortcode.to_url(&self.base_url),
            record.long_url,
            record.created_at,
            record.expires_at,
            status,
            record.clicks().len()
        )
    }
}

/// Validates one entry, reporting every invalid field at once.
fn parse_entry(
    url: &str,
    validity: &str,
    code: &str,
) -> Result<ShortenParams, Vec<ValidationError>> {
    let mut problems = Vec::new();
    if let Err(e) = validate_url(url) {
        problems.push(e);
    }
    let custom_code = ShortCode::parse_optional(code)
        .map_err(|e| problems.push(e))
        .ok()
        .flatten();
    let validity = validity
        .parse::<ValidityPeriod>()
        .map_err(|e| problems.push(e))
        .ok();

    match validity {
        Some(validity) if problems.is_empty() => Ok(ShortenParams {
            long_url: url.to_string(),
            validity,
            custom_code,
        }),
        _ => Err(problems),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::{SignedDuration, Timestamp};
    use snip_core::ManualClock;
    use snip_generator::SeqGenerator;
    use snip_shortener::ShortenerService;
    use snip_storage::{InMemoryStore, KvRecordStore};

    fn app() -> (App, ManualClock) {
        let kv: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
        let clock = ManualClock::new(Timestamp::from_second(1_700_000_000).unwrap());
        let service = ShortenerService::with_clock(
            KvRecordStore::new(Arc::clone(&kv)),
            SeqGenerator::with_prefix("sn"),
            clock.clone(),
        );
        (App::new(Arc::new(service), kv, "http://localhost:3000"), clock)
    }

    fn shorten(url: &str, validity: &str, code: &str) -> Command {
        Command::Shorten {
            urls: vec![url.to_string()],
            validity: vec![validity.to_string()],
            code: vec![code.to_string()],
        }
    }

    fn shorten_all(urls: &[&str], codes: &[&str]) -> Command {
        Command::Shorten {
            urls: urls.iter().map(|u| u.to_string()).collect(),
            validity: vec![],
            code: codes.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn shorten_prints_the_short_url() {
        let (app, _) = app();

        let out = app.run(shorten("https://example.com", "30", "")).await.unwrap();

        assert!(out.contains("http://localhost:3000/sn0000"));
        assert!(out.contains("status:     Active"));
    }

    #[tokio::test]
    async fn shorten_reports_every_invalid_field() {
        let (app, _) = app();

        let err = app
            .run(shorten("ftp://example.com", "0", "a!"))
            .await
            .unwrap_err()
            .to_string();

        assert!(err.contains("long_url:"));
        assert!(err.contains("shortcode:"));
        assert!(err.contains("validity:"));
    }

    #[tokio::test]
    async fn duplicate_code_is_reported_against_the_shortcode_field() {
        let (app, _) = app();
        app.run(shorten("https://a.com", "10", "abc123")).await.unwrap();

        let err = app
            .run(shorten("https://b.com", "5", "abc123"))
            .await
            .unwrap_err()
            .to_string();

        assert!(err.contains("shortcode: shortcode already exists: abc123"));
    }

    #[tokio::test]
    async fn shorten_creates_every_url() {
        let (app, _) = app();

        let out = app
            .run(shorten_all(&["https://a.com", "https://b.com", "https://c.com"], &[]))
            .await
            .unwrap();

        assert_eq!(out.matches("short url:").count(), 3);
        assert_eq!(app.shortener.get_all_urls().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn invalid_entry_stops_the_whole_batch() {
        let (app, _) = app();

        let err = app
            .run(shorten_all(&["https://a.com", "not a url"], &[]))
            .await
            .unwrap_err()
            .to_string();

        assert!(err.contains("entry 2 long_url:"));
        assert!(!err.contains("entry 1"));
        assert!(app.shortener.get_all_urls().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_entry_does_not_stop_the_others() {
        let (app, _) = app();
        app.run(shorten("https://a.com", "10", "abc123")).await.unwrap();

        let out = app
            .run(shorten_all(&["https://b.com", "https://c.com"], &["abc123"]))
            .await
            .unwrap();

        assert!(out.contains("long url:   https://c.com"));
        assert!(out.contains("entry 1 shortcode: shortcode already exists: abc123"));
        assert_eq!(app.shortener.get_all_urls().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn more_codes_than_urls_is_rejected() {
        let (app, _) = app();
        let err = app
            .run(shorten_all(&["https://a.com"], &["abc", "def"]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("1 URLs but 0 validity values and 2 codes"));
    }

    #[tokio::test]
    async fn open_follows_active_and_rejects_expired() {
        let (app, clock) = app();
        app.run(shorten("https://a.com", "1", "abc123")).await.unwrap();

        let out = app.run(Command::Open { code: "abc123".into() }).await.unwrap();
        assert_eq!(out, "Redirecting to https://a.com\n");

        clock.advance(SignedDuration::from_mins(2));
        let err = app
            .run(Command::Open { code: "abc123".into() })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("expired"));

        let err = app
            .run(Command::Open { code: "nothere".into() })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn stats_lists_clicks() {
        let (app, _) = app();
        app.run(shorten("https://a.com", "30", "abc123")).await.unwrap();
        app.run(Command::Click {
            code: "abc123".into(),
            source: "direct".into(),
        })
        .await
        .unwrap();

        let out = app.run(Command::Stats { json: false }).await.unwrap();
        assert!(out.starts_with("1 URLs (1 active, 0 expired), 1 clicks"));
        assert!(out.contains("direct  Unknown"));

        let json = app.run(Command::Stats { json: true }).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["totalClicks"], 1);
        assert_eq!(value["urls"][0]["status"], "active");
    }

    #[tokio::test]
    async fn list_on_empty_store() {
        let (app, _) = app();
        let out = app.run(Command::List).await.unwrap();
        assert_eq!(out, "No URLs have been shortened yet.\n");
    }

    #[tokio::test]
    async fn logs_show_persisted_entries() {
        let (app, _) = app();
        let journal = LogJournal::new();
        journal.push(snip_telemetry::LogEntry {
            timestamp: Timestamp::UNIX_EPOCH,
            level: "info".to_string(),
            message: "application started".to_string(),
            data: Default::default(),
            source: "snip".to_string(),
        });
        journal.persist(app.kv.as_ref()).await.unwrap();

        let out = app.run(Command::Logs { limit: 5 }).await.unwrap();
        assert_eq!(out, "[1970-01-01T00:00:00Z] INFO: application started\n");
    }

    #[tokio::test]
    async fn nested_session_is_rejected() {
        let (app, _) = app();
        assert!(app.run(Command::Session).await.is_err());
    }
}
