use async_trait::async_trait;
use jiff::Timestamp;
use snip_core::clock::{Clock, SystemClock};
use snip_core::shortener::REDIRECT_CLICK_SOURCE;
use snip_core::{
    ClickRecord, RecordId, RecordStore, Resolution, ShortCode, ShortenParams, Shortener,
    ShortenerError, UrlRecord, UrlStats,
};
use snip_generator::Generator;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use typed_builder::TypedBuilder;

type Result<T> = std::result::Result<T, ShortenerError>;

pub const DEFAULT_MAX_GENERATE_ATTEMPTS: usize = 1000;

#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct ServiceSettings {
    /// Candidates drawn from the generator before giving up with
    /// [`ShortenerError::Exhausted`].
    #[builder(default = DEFAULT_MAX_GENERATE_ATTEMPTS)]
    pub max_generate_attempts: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A concrete implementation of the `Shortener` trait.
///
/// Holds no record state of its own: every operation reads the full record
/// set from the `RecordStore`, works on it in memory and, if anything
/// changed, writes the full set back. Two services sharing a store from
/// different tasks can therefore overwrite each other's changes.
#[derive(Debug, Clone)]
pub struct ShortenerService<S, G, C = SystemClock> {
    store: Arc<S>,
    generator: Arc<G>,
    clock: C,
    settings: ServiceSettings,
}

impl<S: RecordStore, G: Generator> ShortenerService<S, G, SystemClock> {
    /// Creates a service backed by the system clock.
    pub fn new(store: S, generator: G) -> Self {
        Self::with_clock(store, generator, SystemClock)
    }
}

impl<S: RecordStore, G: Generator, C: Clock> ShortenerService<S, G, C> {
    pub fn with_clock(store: S, generator: G, clock: C) -> Self {
        Self {
            store: Arc::new(store),
            generator: Arc::new(generator),
            clock,
            settings: ServiceSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ServiceSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Draws candidates from the generator until one is not used by any of
    /// `existing`, up to the configured attempt cap.
    pub fn generate_shortcode(&self, existing: &[UrlRecord]) -> Result<ShortCode> {
        let attempts = self.settings.max_generate_attempts;
        for attempt in 1..=attempts {
            let candidate: ShortCode = self.generator.generate().into();
            if !existing.iter().any(|r| r.shortcode == candidate) {
                return Ok(candidate);
            }
            debug!(attempt, candidate = %candidate, "generated shortcode collides, retrying");
        }
        Err(ShortenerError::Exhausted { attempts })
    }

    fn next_id(created_at: Timestamp) -> RecordId {
        RecordId::new(created_at, rand::random::<u16>())
    }

    async fn create(&self, params: ShortenParams) -> Result<UrlRecord> {
        let mut records = self.store.read_all().await?;

        let shortcode = match params.custom_code {
            Some(code) => {
                if records.iter().any(|r| r.shortcode == code) {
                    return Err(ShortenerError::DuplicateShortcode(code.to_string()));
                }
                code
            }
            None => self.generate_shortcode(&records)?,
        };

        let created_at = self.clock.now();
        let expires_at = created_at
            .checked_add(params.validity.as_duration())
            .map_err(|e| ShortenerError::Timestamp(e.to_string()))?;

        let record = UrlRecord::new(
            Self::next_id(created_at),
            shortcode,
            params.long_url,
            created_at,
            expires_at,
        );

        records.push(record.clone());
        self.store.write_all(&records).await?;

        Ok(record)
    }

    async fn click(&self, shortcode: &str, source: &str) -> Result<Option<UrlRecord>> {
        let mut records = self.store.read_all().await?;

        let Some(record) = records.iter_mut().find(|r| r.shortcode == *shortcode) else {
            return Ok(None);
        };
        record.push_click(ClickRecord::new(self.clock.now(), source));
        let updated = record.clone();

        self.store.write_all(&records).await?;
        Ok(Some(updated))
    }
}

#[async_trait]
impl<S: RecordStore, G: Generator, C: Clock> Shortener for ShortenerService<S, G, C> {
    async fn create_short_url(&self, params: ShortenParams) -> Result<UrlRecord> {
        info!(
            long_url = %params.long_url,
            validity = %params.validity,
            custom_code = params.custom_code.as_ref().map(ShortCode::as_str).unwrap_or(""),
            "creating short url"
        );

        self.create(params)
            .await
            .inspect(|record| {
                info!(
                    shortcode = %record.shortcode,
                    expires_at = %record.expires_at,
                    "short url created"
                )
            })
            .inspect_err(|e| error!(error = %e, "failed to create short url"))
    }

    async fn get_url_by_shortcode(&self, shortcode: &str) -> Result<Option<UrlRecord>> {
        let records = self
            .store
            .read_all()
            .await
            .inspect_err(|e| error!(shortcode, error = %e, "failed to read records"))?;
        let found = records.into_iter().find(|r| r.shortcode == *shortcode);
        debug!(shortcode, found = found.is_some(), "looked up shortcode");
        Ok(found)
    }

    async fn get_all_urls(&self) -> Result<Vec<UrlRecord>> {
        let records = self
            .store
            .read_all()
            .await
            .inspect_err(|e| error!(error = %e, "failed to read records"))?;
        debug!(count = records.len(), "listed records");
        Ok(records)
    }

    async fn record_click(&self, shortcode: &str, source: &str) -> Result<Option<UrlRecord>> {
        info!(shortcode, source, "recording click");

        match self.click(shortcode, source).await {
            Ok(Some(record)) => {
                debug!(shortcode, clicks = record.clicks().len(), "click recorded");
                Ok(Some(record))
            }
            Ok(None) => {
                debug!(shortcode, "no record for shortcode, click not recorded");
                Ok(None)
            }
            Err(e) => {
                error!(shortcode, error = %e, "failed to record click");
                Err(e)
            }
        }
    }

    fn is_expired(&self, record: &UrlRecord) -> bool {
        record.is_expired_at(self.clock.now())
    }

    async fn resolve(&self, shortcode: &str) -> Result<Resolution> {
        info!(shortcode, "handling redirect request");

        let Some(record) = self.get_url_by_shortcode(shortcode).await? else {
            warn!(shortcode, "short url not found");
            return Ok(Resolution::NotFound);
        };

        if self.is_expired(&record) {
            warn!(shortcode, expires_at = %record.expires_at, "short url expired");
            return Ok(Resolution::Expired(record));
        }

        match self.record_click(shortcode, REDIRECT_CLICK_SOURCE).await? {
            Some(updated) => {
                info!(shortcode, long_url = %updated.long_url, "redirect successful");
                Ok(Resolution::Redirect(updated))
            }
            // removed between the lookup and the click by another writer
            None => {
                warn!(shortcode, "short url disappeared during redirect");
                Ok(Resolution::NotFound)
            }
        }
    }

    async fn stats(&self) -> Result<UrlStats> {
        info!("loading statistics");
        let records = self.get_all_urls().await?;
        Ok(UrlStats::compute(&records, self.clock.now()))
    }
}
