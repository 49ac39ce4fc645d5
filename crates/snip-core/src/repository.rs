use crate::error::StorageError;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub type Result<T> = std::result::Result<T, StorageError>;

/// Location recorded for every click; no geolocation lookup is performed.
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// Identifier assigned to a record at creation.
///
/// Records created here get a [`RecordId::Salted`] id: the creation instant
/// in milliseconds with a random salt in the low bits, so ids grow with time
/// and rarely collide. Records written by other tools sharing the store may
/// carry a fractional millisecond id, which is kept as-is. Nothing relies on
/// id uniqueness; the shortcode is the lookup key.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Salted(u64),
    Fractional(f64),
}

impl RecordId {
    pub const SALT_BITS: u32 = 10;

    pub fn new(created_at: Timestamp, salt: u16) -> Self {
        let millis = created_at.as_millisecond().max(0) as u64;
        let salt = u64::from(salt) & ((1 << Self::SALT_BITS) - 1);
        Self::Salted((millis << Self::SALT_BITS) | salt)
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordId::Salted(id) => write!(f, "{id}"),
            RecordId::Fractional(id) => write!(f, "{id}"),
        }
    }
}

/// One resolution event for a shortcode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickRecord {
    pub timestamp: Timestamp,
    /// Free-text origin tag, e.g. "redirect" or "direct".
    pub source: String,
    pub location: String,
}

impl ClickRecord {
    pub fn new(timestamp: Timestamp, source: impl Into<String>) -> Self {
        Self {
            timestamp,
            source: source.into(),
            location: UNKNOWN_LOCATION.to_string(),
        }
    }
}

/// A stored short URL together with its click log.
///
/// Serialized with camelCase keys so the stored blob keeps the
/// `shortcode`/`longUrl`/`createdAt`/`expiresAt`/`clicks` layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlRecord {
    pub id: RecordId,
    pub shortcode: ShortCode,
    /// The original URL that was shortened.
    pub long_url: String,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    #[serde(default)]
    clicks: Vec<ClickRecord>,
}

impl UrlRecord {
    /// Creates a record with an empty click log.
    pub fn new(
        id: RecordId,
        shortcode: ShortCode,
        long_url: impl Into<String>,
        created_at: Timestamp,
        expires_at: Timestamp,
    ) -> Self {
        Self {
            id,
            shortcode,
            long_url: long_url.into(),
            created_at,
            expires_at,
            clicks: Vec::new(),
        }
    }

    /// Clicks in the order they were recorded.
    pub fn clicks(&self) -> &[ClickRecord] {
        &self.clicks
    }

    /// Appends a click. Existing clicks are never modified or reordered.
    pub fn push_click(&mut self, click: ClickRecord) {
        self.clicks.push(click);
    }

    /// Whether the record is expired at `now`: strictly past `expires_at`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now > self.expires_at
    }
}

/// Durable storage of the full record set as a single unit.
///
/// There is no partial update primitive: callers read everything, change it
/// in memory and write everything back. Concurrent read-modify-write cycles
/// from two callers are last-write-wins.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Returns every stored record. A missing or undecodable blob yields an
    /// empty list rather than an error.
    async fn read_all(&self) -> Result<Vec<UrlRecord>>;

    /// Replaces the stored record set with `records`.
    async fn write_all(&self, records: &[UrlRecord]) -> Result<()>;
}
