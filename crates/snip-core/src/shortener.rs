use crate::repository::UrlRecord;
use crate::shortcode::ShortCode;
use crate::stats::UrlStats;
use crate::validation::ValidityPeriod;
use async_trait::async_trait;

type Result<T> = std::result::Result<T, crate::error::ShortenerError>;

/// Source tag used when a click is recorded without one.
pub const DEFAULT_CLICK_SOURCE: &str = "direct";
/// Source tag used for clicks recorded while resolving a redirect.
pub const REDIRECT_CLICK_SOURCE: &str = "redirect";

/// Parameters for creating a shortened URL.
#[derive(Debug, Clone)]
pub struct ShortenParams {
    /// The original URL to be shortened. Must already have passed
    /// [`validate_url`](crate::validation::validate_url).
    pub long_url: String,
    /// How long the short URL stays active.
    pub validity: ValidityPeriod,
    /// Optional custom shortcode; a generated one is used when absent.
    pub custom_code: Option<ShortCode>,
}

impl ShortenParams {
    /// Parameters with the default validity and a generated shortcode.
    pub fn new(long_url: impl Into<String>) -> Self {
        Self {
            long_url: long_url.into(),
            validity: ValidityPeriod::default(),
            custom_code: None,
        }
    }

    pub fn validity(mut self, validity: ValidityPeriod) -> Self {
        self.validity = validity;
        self
    }

    pub fn custom_code(mut self, code: ShortCode) -> Self {
        self.custom_code = Some(code);
        self
    }
}

/// Outcome of following a short URL.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The record is active; a `redirect` click has been recorded.
    Redirect(UrlRecord),
    /// The record exists but is past its expiry. No click is recorded.
    Expired(UrlRecord),
    NotFound,
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Creates a shortened URL and returns the stored record.
    async fn create_short_url(&self, params: ShortenParams) -> Result<UrlRecord>;

    /// Looks up a record by exact, case-sensitive shortcode.
    /// Returns `None` if the code does not exist.
    async fn get_url_by_shortcode(&self, shortcode: &str) -> Result<Option<UrlRecord>>;

    /// Returns every stored record, expired ones included.
    async fn get_all_urls(&self) -> Result<Vec<UrlRecord>>;

    /// Appends a click to the record and returns the updated record.
    /// Returns `None` without writing anything if the code does not exist.
    async fn record_click(&self, shortcode: &str, source: &str) -> Result<Option<UrlRecord>>;

    /// Whether the record is expired at the current time.
    fn is_expired(&self, record: &UrlRecord) -> bool;

    /// Looks up a shortcode and, if it is active, records a redirect click.
    async fn resolve(&self, shortcode: &str) -> Result<Resolution>;

    /// Summarizes every stored record at the current time.
    async fn stats(&self) -> Result<UrlStats>;
}
